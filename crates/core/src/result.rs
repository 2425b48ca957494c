//! Diagnostics and the result containers returned by importers and exporters.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Error;
use crate::schema::Schema;

/// Diagnostic codes shared by every importer and exporter.
pub mod codes {
    pub const UNKNOWN_TYPE: &str = "unknown_type";
    pub const AMBIGUOUS_ALLOWED_VALUES: &str = "ambiguous_allowed_values";
    pub const INVALID_DEFAULT: &str = "invalid_default";
    pub const UNSUPPORTED_TYPE: &str = "unsupported_type";
    pub const DEGRADED_TYPE: &str = "degraded_type";
    pub const INVALID_NAME: &str = "invalid_name";
    pub const UNSUPPORTED_BOUND: &str = "unsupported_bound";
    pub const READ_ERROR: &str = "read_error";
    pub const PARSE_ERROR: &str = "parse_error";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// One recorded problem, tied to the property it was found on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Name of the offending property (not a full pointer).
    pub path: String,
    pub code: String,
    pub message: String,
    pub level: Severity,
}

impl Diagnostic {
    pub fn warning(path: impl Into<String>, code: &str, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            code: code.to_string(),
            message: message.into(),
            level: Severity::Warning,
        }
    }

    pub fn error(path: impl Into<String>, code: &str, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            code: code.to_string(),
            message: message.into(),
            level: Severity::Error,
        }
    }
}

/// Output of every importer: a best-effort schema plus what went wrong building it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaResult {
    pub schema: Schema,
    pub diags: Vec<Diagnostic>,
}

impl SchemaResult {
    /// Fold a fatal error into a zero-value schema and a single error diagnostic.
    pub fn from_error(err: &Error) -> Self {
        Self {
            schema: Schema::default(),
            diags: vec![Diagnostic::error("", err.code(), err.to_string())],
        }
    }

    pub fn has_errors(&self) -> bool {
        self.diags.iter().any(|d| d.level == Severity::Error)
    }
}

/// Output of every exporter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeResult {
    pub code: String,
    pub diags: Vec<Diagnostic>,
}

/// Accumulates diagnostics during a single import or export call.
#[derive(Debug, Default)]
pub(crate) struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub(crate) fn warn(&mut self, path: &str, code: &str, message: impl Into<String>) {
        let diag = Diagnostic::warning(path, code, message);
        warn!(path = %diag.path, code = %diag.code, "{}", diag.message);
        self.0.push(diag);
    }

    pub(crate) fn error(&mut self, path: &str, code: &str, message: impl Into<String>) {
        let diag = Diagnostic::error(path, code, message);
        warn!(path = %diag.path, code = %diag.code, "{}", diag.message);
        self.0.push(diag);
    }

    pub(crate) fn into_vec(self) -> Vec<Diagnostic> {
        self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_from_error_has_single_error_diag() {
        let err = Error::parse(Path::new("values.yaml"), Some(2), "bad indentation");
        let result = SchemaResult::from_error(&err);
        assert_eq!(result.schema, Schema::default());
        assert_eq!(result.diags.len(), 1);
        assert_eq!(result.diags[0].level, Severity::Error);
        assert_eq!(result.diags[0].code, codes::PARSE_ERROR);
        assert!(result.has_errors());
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        let diag = Diagnostic::warning("replicas", codes::UNKNOWN_TYPE, "type is indeterminate");
        let json = serde_json::to_value(&diag).unwrap();
        assert_eq!(json["level"], "warning");
        assert_eq!(json["path"], "replicas");
    }

    #[test]
    fn test_warnings_are_not_errors() {
        let mut diags = Diagnostics::default();
        diags.warn("a", codes::UNKNOWN_TYPE, "empty");
        let result = SchemaResult {
            schema: Schema::default(),
            diags: diags.into_vec(),
        };
        assert!(!result.has_errors());
    }
}
