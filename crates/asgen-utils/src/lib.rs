//! Shared low-level plumbing for the asgen workspace.
//!
//! Every higher-level crate (`asgen-contents-store`, `asgen-data-store`,
//! `asgen-engine`, ...) depends on this crate for paths, atomic file
//! writes, the single-writer file-per-key store primitive, error types,
//! exit codes and logging setup, rather than reimplementing them.

pub mod atomic_write;
pub mod error;
pub mod exit_codes;
pub mod hash;
pub mod kvstore;
pub mod lock;
pub mod logging;
pub mod paths;
pub mod types;
