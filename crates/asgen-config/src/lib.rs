//! Configuration (C-ambient): the JSON config document, discovery, and
//! validation (spec §6 "Configuration file").
//!
//! The spec requires a JSON file at the workspace root, which is the
//! one deliberate point of departure from the teacher's TOML-based
//! `xchecker-config`; everything else — CLI-over-file-over-defaults
//! precedence, typed validation errors — follows the teacher's model.

pub mod discovery;
pub mod error;
pub mod model;
pub mod validation;

pub use discovery::ConfigOverrides;
pub use error::ConfigError;
pub use model::{Backend, Config, Features, IconPolicyConfig, SuiteConfig};
