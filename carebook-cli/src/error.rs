//! CLI-specific error types with exit codes.
//!
//! Library errors are wrapped rather than flattened so the stable error kind
//! survives to the final message.

use carebook::Error as LibError;
use std::fmt;
use std::path::PathBuf;

/// CLI-specific error type with exit code mapping.
#[derive(Debug)]
pub enum CliError {
    /// Library error (wrapped).
    Library(LibError),

    /// Invalid command-line arguments.
    InvalidArguments(String),

    /// I/O error.
    Io(std::io::Error),

    /// Timeout waiting for database lock.
    Timeout(u64),

    /// The database does not exist yet; `carebook init` creates it.
    NoDataDirectory(PathBuf),

    /// Configuration error.
    Config(String),

    /// Semantic failure reported by the command itself.
    SemanticFailure(String),
}

impl CliError {
    /// Get the appropriate exit code for this error.
    ///
    /// Exit codes:
    /// - 0: Success (not an error)
    /// - 1: Business rule failure (illegal transition, ineligible caregiver,
    ///   unknown reservation)
    /// - 2: Timeout waiting for database lock
    /// - 3: No data directory found
    /// - 4: Invalid arguments
    /// - 5: I/O error
    /// - 6: Storage or other library error
    /// - 7: Configuration error (including an incomplete state catalog)
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::SemanticFailure(_) => 1,
            CliError::Library(lib_err) => match lib_err {
                LibError::InvalidTransition { .. }
                | LibError::CaregiverNotEligible { .. }
                | LibError::NotFound { .. } => 1,
                LibError::LockTimeout { .. } => 2,
                LibError::Validation { .. } => 4,
                LibError::Io(_) => 5,
                LibError::StateNotFound { .. } | LibError::Configuration(_) => 7,
                _ => 6,
            },
            CliError::Timeout(_) => 2,
            CliError::NoDataDirectory(_) => 3,
            CliError::InvalidArguments(_) => 4,
            CliError::Io(_) => 5,
            CliError::Config(_) => 7,
        }
    }

    /// Stable identifier printed in `error[<kind>]`.
    pub fn kind(&self) -> &'static str {
        match self {
            CliError::Library(e) => e.kind().as_str(),
            CliError::InvalidArguments(_) => "invalid_arguments",
            CliError::Io(_) => "io",
            CliError::Timeout(_) => "lock_timeout",
            CliError::NoDataDirectory(_) => "no_data_directory",
            CliError::Config(_) => "configuration",
            CliError::SemanticFailure(_) => "failure",
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Library(e) => write!(f, "{e}"),
            CliError::InvalidArguments(msg) => write!(f, "Invalid arguments: {msg}"),
            CliError::Io(e) => write!(f, "I/O error: {e}"),
            CliError::Timeout(seconds) => {
                write!(f, "Timeout waiting for database lock after {seconds}s")
            }
            CliError::NoDataDirectory(path) => write!(
                f,
                "No database at {} (run `carebook init` or pass --data-dir)",
                path.display()
            ),
            CliError::Config(msg) => write!(f, "Configuration error: {msg}"),
            CliError::SemanticFailure(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Library(e) => Some(e),
            CliError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LibError> for CliError {
    fn from(e: LibError) -> Self {
        if let LibError::LockTimeout { seconds } = e {
            CliError::Timeout(seconds)
        } else {
            CliError::Library(e)
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}

impl From<csv::Error> for CliError {
    fn from(e: csv::Error) -> Self {
        CliError::Io(std::io::Error::other(e))
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Io(std::io::Error::other(e))
    }
}
