//! Error types for fleet operations.
//!
//! Per-host failures (transport, parse, resolution) are values that end up
//! inside a [`ResultSet`](crate::ResultSet) or a plan's error map, so they are
//! `Clone` and carry only owned strings.

use std::fmt;

/// Result type alias for fleet operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of fleet errors.
///
/// Categories decide how a failure is presented and whether a caller may
/// reasonably retry it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Remote execution failed (connection refused, timeout, non-zero exit).
    Transport,
    /// The remote answered but the payload was not what we expected.
    Parse,
    /// No version satisfies the compatibility constraints.
    Compatibility,
    /// The round could not start at all.
    Precondition,
    /// An upgrade step failed on a host.
    Upgrade,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Transport => "Remote execution failed",
            Self::Parse => "Unexpected node response",
            Self::Compatibility => "No compatible version",
            Self::Precondition => "Dispatch could not start",
            Self::Upgrade => "Upgrade step failed",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Transport => "Check that the host is reachable over SSH and try again",
            Self::Parse => "Check that the node process is running and its API is enabled",
            Self::Compatibility => "Check the compatibility tables or pin an older plugin version",
            Self::Precondition => "Check the cluster inventory",
            Self::Upgrade => "Inspect the node with `nodefleet ssh` before retrying",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur during fleet operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Running the remote operation failed.
    #[error("transport failure: {message}")]
    Transport {
        /// Opaque cause reported by the transport.
        message: String,
    },

    /// The remote payload was missing expected fields or was malformed.
    #[error("malformed response: {message}")]
    Parse {
        /// What was wrong with the payload.
        message: String,
    },

    /// No runtime version in the table supports the protocol.
    #[error("no runtime version supports protocol version {protocol}")]
    NoCompatibleVersion {
        /// Protocol version that was looked up.
        protocol: u32,
    },

    /// The plugin version has no entry in the compatibility table.
    #[error("plugin version {version} is not in the compatibility table")]
    UnknownPluginVersion {
        /// Plugin version that was looked up.
        version: String,
    },

    /// A version string is not a semantic version.
    #[error("invalid version {version:?}: {message}")]
    InvalidVersion {
        /// The offending version string.
        version: String,
        /// Parser message.
        message: String,
    },

    /// The same host id was submitted twice to one dispatch round.
    #[error("host {0} appears more than once in the dispatch round")]
    DuplicateHost(String),

    /// The worker pool for a dispatch round could not be created.
    #[error("failed to start dispatch workers: {0}")]
    WorkerPool(String),

    /// An upgrade step failed on a host.
    #[error("{step} failed: {message}")]
    StepFailed {
        /// Human-readable step name.
        step: String,
        /// Underlying failure.
        message: String,
    },
}

impl Error {
    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Transport { .. } => ErrorCategory::Transport,
            Error::Parse { .. } => ErrorCategory::Parse,
            Error::NoCompatibleVersion { .. }
            | Error::UnknownPluginVersion { .. }
            | Error::InvalidVersion { .. } => ErrorCategory::Compatibility,
            Error::DuplicateHost(_) | Error::WorkerPool(_) => ErrorCategory::Precondition,
            Error::StepFailed { .. } => ErrorCategory::Upgrade,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_retryable() {
        assert!(ErrorCategory::Transport.is_retryable());
        assert!(!ErrorCategory::Parse.is_retryable());
        assert!(!ErrorCategory::Compatibility.is_retryable());
        assert!(!ErrorCategory::Precondition.is_retryable());
        assert!(!ErrorCategory::Upgrade.is_retryable());
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(
            Error::transport("connection refused").category(),
            ErrorCategory::Transport
        );
        assert_eq!(Error::parse("no result").category(), ErrorCategory::Parse);
        assert_eq!(
            Error::NoCompatibleVersion { protocol: 20 }.category(),
            ErrorCategory::Compatibility
        );
        assert_eq!(
            Error::DuplicateHost("node-1".into()).category(),
            ErrorCategory::Precondition
        );
    }

    #[test]
    fn test_error_display() {
        let err = Error::NoCompatibleVersion { protocol: 20 };
        assert!(err.to_string().contains("20"));

        let err = Error::StepFailed {
            step: "stop runtime".into(),
            message: "exit status 1".into(),
        };
        assert_eq!(err.to_string(), "stop runtime failed: exit status 1");
    }

    #[test]
    fn test_error_category_advice() {
        assert!(!ErrorCategory::Transport.advice().is_empty());
        assert!(!ErrorCategory::Compatibility.advice().is_empty());
        assert!(format!("{}", ErrorCategory::Parse).contains("response"));
    }
}
