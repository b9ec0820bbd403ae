//! Error taxonomy for the attendance console core.
//!
//! Guarded clicks and blocked month navigation are deliberately not errors;
//! they report `applied: false` / `moved: false` at the IPC surface.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A snapshot or selector fetch failed. The previous snapshot is kept.
    #[error("backend fetch failed: {0}")]
    Fetch(String),

    /// One attendance upsert failed.
    #[error("attendance upsert failed: {0}")]
    Upsert(String),

    /// A backend call exceeded the configured deadline.
    #[error("backend request timed out after {0} ms")]
    Timeout(u64),

    /// Aggregate save failure. Some requests may have committed on the
    /// backend; the overlay is preserved so the whole batch can be retried.
    #[error("{failed} of {total} attendance upserts failed")]
    Sync { failed: usize, total: usize },

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn fetch(message: impl Into<String>) -> Error {
        Error::Fetch(message.into())
    }

    pub fn upsert(message: impl Into<String>) -> Error {
        Error::Upsert(message.into())
    }

    /// Stable IPC error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Fetch(_) | Error::Timeout(_) => "fetch_failed",
            Error::Upsert(_) | Error::Sync { .. } => "sync_failed",
            Error::Config(_) => "bad_config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_failure_reports_counts() {
        let err = Error::Sync {
            failed: 2,
            total: 5,
        };
        assert_eq!(err.to_string(), "2 of 5 attendance upserts failed");
        assert_eq!(err.code(), "sync_failed");
    }

    #[test]
    fn fetch_errors_share_a_code() {
        assert_eq!(Error::fetch("boom").code(), "fetch_failed");
        assert_eq!(Error::Timeout(5000).code(), "fetch_failed");
    }
}
