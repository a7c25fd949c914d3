//! Structured configuration issues.
//!
//! Loaders report problems as a list of [`ConfigIssue`]s instead of failing on
//! the first one, so the CLI can print every problem at once and refuse to
//! start only when an issue has [`Severity::Error`].

use std::fmt;

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: the configuration works but may not behave as expected.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// No API key configured at all.
    NoCredentials,
    /// The provider endpoint is not an http(s) URL.
    InvalidEndpoint,
    /// No model name configured.
    EmptyModel,
    /// A timeout is zero.
    ZeroTimeout,
    /// An attempt ceiling is zero.
    ZeroAttempts,
    /// The initial backoff exceeds the backoff cap.
    BackoffInverted,
    /// No history would be sent with requests.
    ZeroHistory,
    /// The configured catalog file does not exist.
    CatalogMissing,
}

/// A detected issue in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{level}: {}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_set_severity() {
        assert!(ConfigIssue::error(ConfigIssueCode::EmptyModel, "x").is_error());
        assert!(!ConfigIssue::warning(ConfigIssueCode::ZeroHistory, "x").is_error());
    }

    #[test]
    fn test_display() {
        let issue = ConfigIssue::warning(ConfigIssueCode::CatalogMissing, "catalog not found");
        assert_eq!(issue.to_string(), "warning: catalog not found");
    }
}
