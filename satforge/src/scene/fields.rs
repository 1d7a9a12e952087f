//! Payload field extraction shared by the scene value types.

use std::collections::HashMap;
use std::str::FromStr;

use thiserror::Error;

/// Error raised when a notification payload cannot supply a complete
/// acquisition time or platform identity.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// A required payload field was absent.
    #[error("missing payload field '{0}'")]
    Missing(&'static str),

    /// A payload field was present but could not be parsed.
    #[error("payload field '{field}' has invalid value '{value}'")]
    Invalid {
        /// Field name.
        field: &'static str,
        /// Raw value as received.
        value: String,
    },

    /// The time fields parsed individually but do not form a valid
    /// calendar time.
    #[error("payload fields do not form a valid calendar time: {0}")]
    InvalidTimestamp(String),
}

/// Looks up a required field by name.
pub(crate) fn require<'a>(
    fields: &'a HashMap<String, String>,
    name: &'static str,
) -> Result<&'a str, FieldError> {
    match fields.get(name) {
        Some(value) => Ok(value.as_str()),
        None => Err(FieldError::Missing(name)),
    }
}

/// Looks up a required field and parses it.
pub(crate) fn parse_field<T: FromStr>(
    fields: &HashMap<String, String>,
    name: &'static str,
) -> Result<T, FieldError> {
    let raw = require(fields, name)?;
    raw.trim().parse().map_err(|_| FieldError::Invalid {
        field: name,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_require_present() {
        let map = fields(&[("satellite", "Meteosat")]);
        assert_eq!(require(&map, "satellite").unwrap(), "Meteosat");
    }

    #[test]
    fn test_require_missing() {
        let map = fields(&[]);
        assert_eq!(
            require(&map, "satellite").unwrap_err(),
            FieldError::Missing("satellite")
        );
    }

    #[test]
    fn test_parse_field_number() {
        let map = fields(&[("year", "2014")]);
        assert_eq!(parse_field::<i32>(&map, "year").unwrap(), 2014);
    }

    #[test]
    fn test_parse_field_tolerates_whitespace() {
        let map = fields(&[("hour", " 09 ")]);
        assert_eq!(parse_field::<u32>(&map, "hour").unwrap(), 9);
    }

    #[test]
    fn test_parse_field_invalid() {
        let map = fields(&[("year", "twenty-fourteen")]);
        let err = parse_field::<i32>(&map, "year").unwrap_err();
        assert_eq!(
            err,
            FieldError::Invalid {
                field: "year",
                value: "twenty-fourteen".to_string()
            }
        );
    }
}
