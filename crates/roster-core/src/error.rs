use std::fmt;
use std::path::PathBuf;

/// Machine-readable error codes for scripts and agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    DataFileMissing,
    DataParseError,
    StateWriteFailed,
    InvalidArgument,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::DataFileMissing => "E2001",
            Self::DataParseError => "E2002",
            Self::StateWriteFailed => "E3001",
            Self::InvalidArgument => "E4001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::DataFileMissing => "Data file not found",
            Self::DataParseError => "Data file is not valid JSON for its collection",
            Self::StateWriteFailed => "Could not save the view state",
            Self::InvalidArgument => "Invalid argument",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .roster/config.toml and retry."),
            Self::DataFileMissing => {
                Some("Point [data] subscriptions/users in .roster/config.toml at existing files.")
            }
            Self::DataParseError => Some("Each data file must hold a JSON array of records."),
            Self::StateWriteFailed => Some("Check write permissions for the [state] file, or pass --no-save."),
            Self::InvalidArgument => Some("Run with --help to see accepted values."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }

    /// Snake-case identifier used in JSON error payloads.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::ConfigParseError => "config_parse_error",
            Self::DataFileMissing => "data_file_missing",
            Self::DataParseError => "data_parse_error",
            Self::StateWriteFailed => "state_write_failed",
            Self::InvalidArgument => "invalid_argument",
            Self::InternalUnexpected => "internal_unexpected",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Failure to load one of the two input collections.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("{} not found", path.display())]
    Missing { path: PathBuf },
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl LoadError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Missing { .. } => ErrorCode::DataFileMissing,
            Self::Read { .. } => ErrorCode::InternalUnexpected,
            Self::Parse { .. } => ErrorCode::DataParseError,
        }
    }
}
