//! Error types for dirauth

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// LDAP result codes the engine interprets
pub mod result_code {
    pub const SUCCESS: u32 = 0;
    pub const SIZE_LIMIT_EXCEEDED: u32 = 4;
    pub const NO_SUCH_OBJECT: u32 = 32;
    pub const INVALID_CREDENTIALS: u32 = 49;
    pub const UNWILLING_TO_PERFORM: u32 = 53;
    pub const FILTER_ERROR: u32 = 87;
    /// Client-side code for a failed connection attempt
    pub const CONNECT_ERROR: u32 = 91;
}

#[derive(Error, Debug)]
pub enum Error {
    // Configuration Errors
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    // Authentication Errors
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Bad credentials")]
    BadCredentials,

    // Account State Errors
    #[error("Account is disabled")]
    AccountDisabled,

    #[error("Account is locked")]
    AccountLocked,

    #[error("Account is expired")]
    AccountExpired,

    #[error("Credentials are expired")]
    CredentialsExpired,

    // Directory Errors
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    // Internal Errors
    #[error("Internal error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::Configuration(_) => "ConfigurationError",
            Error::UserNotFound(_) => "UserNotFound",
            Error::BadCredentials => "BadCredentials",
            Error::AccountDisabled => "AccountDisabled",
            Error::AccountLocked => "AccountLocked",
            Error::AccountExpired => "AccountExpired",
            Error::CredentialsExpired => "CredentialsExpired",
            Error::Directory(_) => "DirectoryError",
            Error::InternalError(_) => "InternalError",
            Error::Io(_) => "InternalError",
            Error::Other(_) => "InternalError",
        }
    }

    /// Failures a login form reports as a generic "invalid login".
    ///
    /// Unknown users and wrong passwords are deliberately indistinguishable
    /// to the end user.
    pub fn is_invalid_login(&self) -> bool {
        matches!(self, Error::UserNotFound(_) | Error::BadCredentials)
    }

    /// Account state rejections, only ever raised after the password was proven.
    pub fn is_account_state(&self) -> bool {
        matches!(
            self,
            Error::AccountDisabled
                | Error::AccountLocked
                | Error::AccountExpired
                | Error::CredentialsExpired
        )
    }

    /// Process exit status used by the command line tool
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Configuration(_) => 78,
            Error::UserNotFound(_) | Error::BadCredentials => 2,
            Error::AccountDisabled
            | Error::AccountLocked
            | Error::AccountExpired
            | Error::CredentialsExpired => 3,
            Error::Directory(_) => 69,
            _ => 1,
        }
    }
}

/// Failure reported by a directory session.
///
/// Carries the protocol result code when the directory produced one and an
/// optional nested cause, e.g. a bind failure wrapped in a connection error.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct DirectoryError {
    pub result_code: Option<u32>,
    pub message: String,
    #[source]
    pub cause: Option<Box<DirectoryError>>,
}

impl DirectoryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            result_code: None,
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_code(result_code: u32, message: impl Into<String>) -> Self {
        Self {
            result_code: Some(result_code),
            message: message.into(),
            cause: None,
        }
    }

    pub fn caused_by(mut self, cause: DirectoryError) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Whether this error, or any nested cause, reports invalid credentials.
    ///
    /// Connection-level errors whose message embeds
    /// `resultCode=INVALID_CREDENTIALS` count as well.
    pub fn is_invalid_credentials(&self) -> bool {
        if self.result_code == Some(result_code::INVALID_CREDENTIALS) {
            return true;
        }
        if self.result_code == Some(result_code::CONNECT_ERROR)
            && self
                .message
                .to_lowercase()
                .contains("resultcode=invalid_credentials")
        {
            return true;
        }
        self.cause
            .as_deref()
            .is_some_and(DirectoryError::is_invalid_credentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_credentials_direct() {
        let err = DirectoryError::with_code(result_code::INVALID_CREDENTIALS, "bind failed");
        assert!(err.is_invalid_credentials());

        let err = DirectoryError::with_code(result_code::NO_SUCH_OBJECT, "no such object");
        assert!(!err.is_invalid_credentials());
    }

    #[test]
    fn test_invalid_credentials_nested() {
        let err = DirectoryError::new("could not open connection").caused_by(
            DirectoryError::new("connection initializer failed").caused_by(
                DirectoryError::with_code(result_code::INVALID_CREDENTIALS, "bind failed"),
            ),
        );
        assert!(err.is_invalid_credentials());

        let err = DirectoryError::new("could not open connection")
            .caused_by(DirectoryError::new("connection refused"));
        assert!(!err.is_invalid_credentials());
    }

    #[test]
    fn test_invalid_credentials_in_connect_error_message() {
        let err = DirectoryError::with_code(
            result_code::CONNECT_ERROR,
            "Bind failed: resultCode=INVALID_CREDENTIALS, diagnosticMessage=...",
        );
        assert!(err.is_invalid_credentials());

        let err = DirectoryError::with_code(result_code::CONNECT_ERROR, "connection refused");
        assert!(!err.is_invalid_credentials());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::BadCredentials.code(), "BadCredentials");
        assert_eq!(Error::AccountLocked.code(), "AccountLocked");
        assert_eq!(
            Error::from(DirectoryError::new("timeout")).code(),
            "DirectoryError"
        );
        assert!(Error::UserNotFound("alice".into()).is_invalid_login());
        assert!(Error::CredentialsExpired.is_account_state());
        assert!(!Error::BadCredentials.is_account_state());
    }
}
