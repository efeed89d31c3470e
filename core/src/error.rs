use std::time::Duration;
use thiserror::Error;

/// A requirements line that could not be classified.
///
/// Local to a single line: the rest of the file is still parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid format: '{line}'")]
    InvalidFormat { line: String },
    #[error("line {line_number}: {source}")]
    AtLine {
        line_number: usize,
        #[source]
        source: Box<ParseError>,
    },
}

impl ParseError {
    /// Attach a 1-based line number to this error
    pub fn at_line(self, line_number: usize) -> Self {
        match self {
            ParseError::AtLine { source, .. } => ParseError::AtLine {
                line_number,
                source,
            },
            other => ParseError::AtLine {
                line_number,
                source: Box::new(other),
            },
        }
    }
}

/// A registry lookup that failed or returned an unexpected shape.
///
/// Downgrades the affected declaration to unverified.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("package '{package}' not found on the registry")]
    NotFound { package: String },
    #[error("registry request for '{package}' failed: {message}")]
    Http { package: String, message: String },
    #[error("malformed registry response for '{package}': {message}")]
    Malformed { package: String, message: String },
    #[error("registry lookup for '{package}' timed out after {timeout:?}")]
    Timeout { package: String, timeout: Duration },
    #[error("verification deadline exceeded while looking up '{package}'")]
    DeadlineExceeded { package: String },
}

/// An unusable version constraint or version string.
///
/// Downgrades only the candidate it was evaluated against.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstraintError {
    #[error("invalid version specifier: {0}")]
    UnknownOperator(String),
    #[error("invalid version string: {0}")]
    InvalidVersion(String),
    #[error("compatible release '~={0}' needs at least two release components")]
    InvalidCompatibleRelease(String),
    #[error("wildcard version '{target}' is not allowed with '{operator}'")]
    UnsupportedWildcard { operator: String, target: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_line_wraps_once() {
        let err = ParseError::InvalidFormat {
            line: "@@bad".to_string(),
        }
        .at_line(3)
        .at_line(4);

        assert_eq!(err.to_string(), "line 4: invalid format: '@@bad'");
        assert!(matches!(
            err,
            ParseError::AtLine { line_number: 4, ref source }
                if matches!(**source, ParseError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_registry_error_messages() {
        let err = RegistryError::Timeout {
            package: "flask".to_string(),
            timeout: Duration::from_secs(5),
        };
        assert_eq!(
            err.to_string(),
            "registry lookup for 'flask' timed out after 5s"
        );

        let err = RegistryError::Timeout {
            package: "flask".to_string(),
            timeout: Duration::from_millis(250),
        };
        assert_eq!(
            err.to_string(),
            "registry lookup for 'flask' timed out after 250ms"
        );
    }
}
