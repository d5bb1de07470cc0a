//! Error types for the Satchel core crate.

use thiserror::Error;

/// Top-level error type for all Satchel core operations.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("reconcile error: {0}")]
    Reconcile(String),
}

impl From<reqwest::Error> for SyncError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            SyncError::Parse(e.to_string())
        } else {
            SyncError::Transport(e.to_string())
        }
    }
}

impl SyncError {
    /// A fatal error aborts every remaining endpoint of the profile pass.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SyncError::Auth(_))
    }

    /// A retryable error earns the endpoint another place in the pass queue.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::Transport(_) | SyncError::Parse(_))
    }
}

/// A convenience Result alias that defaults to [`SyncError`].
pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = SyncError::Config("missing field".into());
        assert_eq!(err.to_string(), "configuration error: missing field");
    }

    #[test]
    fn io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = SyncError::from(io_err);
        assert!(matches!(err, SyncError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn auth_is_fatal_not_retryable() {
        let err = SyncError::Auth("account locked".into());
        assert!(err.is_fatal());
        assert!(!err.is_retryable());
    }

    #[test]
    fn transport_and_parse_are_retryable() {
        assert!(SyncError::Transport("timeout".into()).is_retryable());
        assert!(SyncError::Parse("unexpected shape".into()).is_retryable());
        assert!(!SyncError::Transport("timeout".into()).is_fatal());
    }

    #[test]
    fn reconcile_is_neither_fatal_nor_retryable() {
        let err = SyncError::Reconcile("dictionary row missing".into());
        assert!(!err.is_fatal());
        assert!(!err.is_retryable());
    }

    #[test]
    fn result_alias_works() {
        let ok: Result<i32> = Ok(42);
        assert!(ok.is_ok());

        let err: Result<i32> = Err(SyncError::Config("bad".into()));
        assert!(err.is_err());
    }
}
