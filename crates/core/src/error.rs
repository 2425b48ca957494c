//! Fatal errors raised while reading sources or rendering code.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Everything that stops an import or export outright.
///
/// Recoverable problems never become an `Error`; they are recorded as
/// [`Diagnostic`](crate::result::Diagnostic)s instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid schema document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{}: {message}", location(path, *line))]
    Parse {
        path: PathBuf,
        line: Option<usize>,
        message: String,
    },

    #[error("{0}")]
    Unsupported(String),

    #[error("unknown type: {0}")]
    UnknownType(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn read(path: &Path, source: std::io::Error) -> Self {
        Self::Read {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn parse(path: &Path, line: Option<usize>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.to_path_buf(),
            line,
            message: message.into(),
        }
    }

    /// Diagnostic code reported when this error is folded into a result.
    pub fn code(&self) -> &'static str {
        use crate::result::codes;
        match self {
            Self::Read { .. } | Self::Io(_) => codes::READ_ERROR,
            Self::Json(_) | Self::Parse { .. } => codes::PARSE_ERROR,
            Self::Unsupported(_) | Self::UnknownType(_) => codes::UNSUPPORTED_TYPE,
        }
    }
}

fn location(path: &Path, line: Option<usize>) -> String {
    match line {
        Some(line) => format!("{}:{line}", path.display()),
        None => path.display().to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_includes_line() {
        let err = Error::parse(Path::new("main.bicep"), Some(4), "unexpected token");
        assert_eq!(err.to_string(), "main.bicep:4: unexpected token");
        assert_eq!(err.code(), "parse_error");
    }

    #[test]
    fn test_parse_error_without_line() {
        let err = Error::parse(Path::new("values.yaml"), None, "root must be a mapping");
        assert_eq!(err.to_string(), "values.yaml: root must be a mapping");
    }
}
