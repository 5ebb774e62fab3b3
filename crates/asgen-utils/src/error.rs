//! Error taxonomy for asgen (spec §7).
//!
//! `spec.md` distinguishes kinds, not concrete types: configuration
//! errors, backend errors, storage errors, and internal errors. Only
//! the first and the third ever terminate the process (§7 "Propagation
//! policy"); everything else is converted into a hint or logged by the
//! caller and the pipeline continues.

use crate::exit_codes::ExitCode;
use thiserror::Error;

/// Top-level error type returned by asgen library operations.
#[derive(Error, Debug)]
pub enum AsgenError {
    /// Invalid JSON, unknown backend, forbidden suite name, malformed
    /// icon-policy key, etc. Surfaced at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// Unreadable archive, missing index, failed subprocess. The
    /// failing package is skipped, never the whole section.
    #[error("backend error for {package_id}: {message}")]
    Backend { package_id: String, message: String },

    /// Transaction abort, map-size exhaustion, key-not-found on an
    /// expected key. Aborts the transaction and propagates to the
    /// orchestrator; the worker fails its unit and continues.
    #[error("storage error in {store}: {message}")]
    Storage { store: &'static str, message: String },

    #[error("lock held: {0}")]
    Lock(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Caught exceptions from callback capabilities (composer, icon
    /// renderer, backend) that escape as a hard error rather than a
    /// per-component hint.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AsgenError {
    /// Map to one of the three exit codes spec §6 defines.
    #[must_use]
    pub fn to_exit_code(&self) -> ExitCode {
        match self {
            AsgenError::Config(_) => ExitCode::ConfigError,
            AsgenError::Backend { .. }
            | AsgenError::Storage { .. }
            | AsgenError::Lock(_)
            | AsgenError::Io(_)
            | AsgenError::Internal(_) => ExitCode::UserError,
        }
    }
}

pub type Result<T> = std::result::Result<T, AsgenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_map_to_config_exit_code() {
        let err = AsgenError::Config("Suites.pool is forbidden".into());
        assert_eq!(err.to_exit_code(), ExitCode::ConfigError);
    }

    #[test]
    fn storage_errors_map_to_user_error_exit_code() {
        let err = AsgenError::Storage {
            store: "contents",
            message: "map full".into(),
        };
        assert_eq!(err.to_exit_code(), ExitCode::UserError);
    }
}
