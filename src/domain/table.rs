use std::fmt;

use serde::Deserialize;
use thiserror::Error;

/// Postgres truncates identifiers past this many bytes
pub const MAX_IDENTIFIER_LENGTH: usize = 63;

/// Name of a table holding cache rows, optionally schema-qualified (`schema.table`).
///
/// Safe to interpolate into SQL: every segment is a plain identifier.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct TableName(String);

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TableNameError {
    #[error("empty")]
    Empty,
    #[error("segment longer than {MAX_IDENTIFIER_LENGTH} bytes")]
    TooLong,
    #[error("too many segments")]
    TooManySegments,
    #[error("contains invalid characters")]
    InvalidCharacters,
}

impl TableName {
    pub fn parse(input: &str) -> Result<Self, TableNameError> {
        if input.is_empty() {
            return Err(TableNameError::Empty);
        }

        let segments: Vec<&str> = input.split('.').collect();
        if segments.len() > 2 {
            return Err(TableNameError::TooManySegments);
        }

        for segment in segments {
            if segment.is_empty() {
                return Err(TableNameError::Empty);
            }
            if segment.len() > MAX_IDENTIFIER_LENGTH {
                return Err(TableNameError::TooLong);
            }

            let mut chars = segment.chars();
            let starts_ok = chars
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
            if !starts_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(TableNameError::InvalidCharacters);
            }
        }

        Ok(Self(input.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TableName {
    type Error = TableNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn allowed_table_names() {
        let names = ["cache", "page_cache", "_tmp", "cache.pages", "Cache2"];
        for name in names {
            let result = TableName::parse(name);
            assert!(
                result.is_ok(),
                "{} should be allowed, instead: {:?}",
                name,
                result
            );
        }
    }

    #[test]
    fn disallowed_table_names() {
        let names = [
            "",
            ".",
            "cache.",
            "a.b.c",
            "2cache",
            "cache-pages",
            "cache pages",
            "cache;drop table companies",
            "cache\"",
        ];
        for name in names {
            let result = TableName::parse(name);
            assert!(
                result.is_err(),
                "{} should not be allowed, instead: {:?}",
                name,
                result
            );
        }
    }

    #[test]
    fn segment_length_is_bounded() {
        let long = "a".repeat(MAX_IDENTIFIER_LENGTH + 1);
        assert_eq!(TableName::parse(&long), Err(TableNameError::TooLong));

        let max = "a".repeat(MAX_IDENTIFIER_LENGTH);
        assert!(TableName::parse(&max).is_ok());
    }
}
