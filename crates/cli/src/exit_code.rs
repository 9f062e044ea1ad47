//! Process exit codes

use bls_core::{Error, ErrorKind};

/// Exit codes returned by every command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    /// Anything without a more specific code
    GeneralError = 1,
    /// Bad arguments, malformed locations, unknown sub-commands, help shown
    UsageError = 2,
    /// Connection failures and exhausted retries
    NetworkError = 3,
    AuthError = 4,
    /// Unknown alias or host, missing bucket or path
    NotFound = 5,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Exit code for a fatal error
    pub fn from_error(error: &Error) -> Self {
        match (error.kind(), error.root()) {
            (ErrorKind::UrlParse, _) => ExitCode::UsageError,
            (ErrorKind::ConfigLookup, Error::Config(_)) => ExitCode::GeneralError,
            (ErrorKind::ConfigLookup, _) => ExitCode::NotFound,
            (ErrorKind::Connection | ErrorKind::TransientList, _) => ExitCode::NetworkError,
            (ErrorKind::TerminalList, Error::Auth(_)) => ExitCode::AuthError,
            (ErrorKind::TerminalList, Error::NotFound(_)) => ExitCode::NotFound,
            (ErrorKind::TerminalList, _) => ExitCode::GeneralError,
        }
    }
}
