//! The key/value record exchanged between pipeline phases.
//!
//! Records travel as single text lines of the form `key<TAB>value`. The key is
//! everything before the first delimiter, so values may themselves contain
//! tabs while keys may not.

/// Separates the key from the value in a serialized record.
pub const DELIMITER: char = '\t';

/// One key/value pair emitted by a mapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedRecord {
    pub key: String,
    pub value: String,
}

impl MappedRecord {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Serialize as `key<TAB>value`.
    pub fn encode(&self) -> String {
        format!("{}{DELIMITER}{}", self.key, self.value)
    }

    /// Split a serialized record at its first delimiter.
    ///
    /// Returns `None` for lines with no delimiter.
    pub fn parse(line: &str) -> Option<Self> {
        line.split_once(DELIMITER)
            .map(|(key, value)| Self::new(key, value))
    }
}

/// The key of a serialized record, without allocating.
pub fn key_of(line: &str) -> Option<&str> {
    line.split_once(DELIMITER).map(|(key, _)| key)
}
