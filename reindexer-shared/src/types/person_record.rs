//! Source record type produced by a record source.

/// One person record as read from the source stream.
///
/// A record is immutable once read. It has no identity beyond its
/// 1-based position in the stream, which is carried so that a record
/// rejected later in the pipeline can be pointed at precisely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonRecord {
    /// 1-based position of the record in the source stream.
    pub position: u64,
    /// The person's identifier as it appears in the source.
    pub id: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
}

impl PersonRecord {
    /// Create a new record at the given stream position.
    pub fn new(
        position: u64,
        id: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            position,
            id: id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record() {
        let record = PersonRecord::new(1, "42", "Ada", "Lovelace");

        assert_eq!(record.position, 1);
        assert_eq!(record.id, "42");
        assert_eq!(record.first_name, "Ada");
        assert_eq!(record.last_name, "Lovelace");
    }
}
