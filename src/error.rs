use std::fmt;

/// Error types for portscope.
///
/// Parsing anomalies never show up here: malformed rows are dropped by the
/// parser. Everything in this enum is a query-level or signal-level failure
/// that is surfaced to the caller as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Port number outside 1-65535 or not a number
    InvalidPort(String),
    /// PID that cannot address a single process
    InvalidPid(String),
    /// External query could not be run, timed out, or produced unreadable output
    IoFailure(String),
    /// Failed to parse data
    ParseError(String),
    /// Process with the specified PID was not found
    ProcessNotFound(u32),
    /// Operation requires elevated privileges
    PermissionDenied(String),
    /// The requested signal mode is not available on this platform
    Unsupported(String),
    /// System command or signal was rejected for any other reason
    CommandFailed(String),
    /// Other generic error
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidPort(msg) => {
                write!(f, "Invalid port: {msg}. Port must be between 1 and 65535")
            }
            Error::InvalidPid(msg) => write!(f, "Invalid PID format: {msg}"),
            Error::IoFailure(msg) => {
                if msg.contains("lsof") || msg.contains("netstat") || msg.contains("tasklist") {
                    write!(
                        f,
                        "Query failed: {msg}. Make sure required system tools are installed"
                    )
                } else {
                    write!(f, "Query failed: {msg}")
                }
            }
            Error::ParseError(msg) => write!(f, "Parse error: {msg}"),
            Error::ProcessNotFound(pid) => write!(f, "Process with PID {pid} not found"),
            Error::PermissionDenied(msg) => {
                write!(
                    f,
                    "Permission denied: {msg}. Try running with 'sudo' for system processes"
                )
            }
            Error::Unsupported(msg) => write!(f, "Unsupported: {msg}"),
            Error::CommandFailed(msg) => write!(f, "Command execution failed: {msg}"),
            Error::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IoFailure(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::ParseError(e.to_string())
    }
}

impl From<dialoguer::Error> for Error {
    fn from(e: dialoguer::Error) -> Self {
        Error::Other(e.to_string())
    }
}

#[cfg(unix)]
impl From<nix::errno::Errno> for Error {
    fn from(e: nix::errno::Errno) -> Self {
        match e {
            nix::errno::Errno::EPERM => Error::PermissionDenied(e.desc().to_string()),
            _ => Error::CommandFailed(e.desc().to_string()),
        }
    }
}

/// A specialized `Result` type for portscope operations.
pub type Result<T> = std::result::Result<T, Error>;
