//! Required-field accumulation for configuration builders.

use stackforge_core::{Error, Result};

/// Collects the names of required fields a builder was finalized without,
/// so that `build()` reports every missing field in one
/// `ConfigurationIncomplete` error instead of stopping at the first.
///
/// Usage inside a builder's `build()`: take each required field through the
/// accumulator, then call [`MissingFields::check`] before constructing the
/// configuration value. `check` fails whenever a placeholder was
/// substituted, so no placeholder ever escapes the builder.
#[derive(Debug, Default)]
pub struct MissingFields {
    fields: Vec<String>,
}

impl MissingFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a required field, substituting `T::default()` and recording the
    /// field name when the value is absent.
    pub fn take<T: Default>(&mut self, name: &str, value: Option<T>) -> T {
        self.take_or(name, value, T::default)
    }

    /// Take a required string field. Empty strings count as missing.
    pub fn take_str(&mut self, name: &str, value: Option<String>) -> String {
        match value {
            Some(s) if !s.is_empty() => s,
            _ => {
                self.fields.push(name.to_string());
                String::new()
            }
        }
    }

    /// Take a required field with an explicit placeholder for the missing
    /// case.
    pub fn take_or<T>(
        &mut self,
        name: &str,
        value: Option<T>,
        placeholder: impl FnOnce() -> T,
    ) -> T {
        match value {
            Some(v) => v,
            None => {
                self.fields.push(name.to_string());
                placeholder()
            }
        }
    }

    /// Record a missing field directly.
    pub fn push(&mut self, name: &str) {
        self.fields.push(name.to_string());
    }

    /// Fail with `ConfigurationIncomplete` naming every missing field, or
    /// succeed when all required fields were present.
    pub fn check(self, scope: impl Into<String>) -> Result<()> {
        if self.fields.is_empty() {
            Ok(())
        } else {
            Err(Error::ConfigurationIncomplete {
                scope: scope.into(),
                fields: self.fields,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_present_passes() {
        let mut missing = MissingFields::new();
        let port = missing.take("port", Some(8080u16));
        let name = missing.take_str("name", Some("api".to_string()));
        assert_eq!(port, 8080);
        assert_eq!(name, "api");
        assert!(missing.check("app/service").is_ok());
    }

    #[test]
    fn test_reports_every_missing_field() {
        let mut missing = MissingFields::new();
        let _ = missing.take::<u16>("port", None);
        let _ = missing.take_str("name", None);
        let err = missing.check("app/service").unwrap_err();
        match err {
            Error::ConfigurationIncomplete { scope, fields } => {
                assert_eq!(scope, "app/service");
                assert_eq!(fields, vec!["port".to_string(), "name".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_string_counts_as_missing() {
        let mut missing = MissingFields::new();
        let _ = missing.take_str("name", Some(String::new()));
        assert!(missing.check("app").is_err());
    }
}
