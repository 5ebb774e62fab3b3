use thiserror::Error;

/// Typed configuration errors (grounded on the teacher's
/// `ConfigError::InvalidValue { key, value }` shape).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path} as JSON")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{key} has an invalid value {value:?}")]
    InvalidValue { key: String, value: String },

    #[error("Suites.{0} is a forbidden suite name")]
    ForbiddenSuiteName(String),

    #[error("Suites.{suite}.baseSuite references undefined suite {base:?}")]
    UnknownBaseSuite { suite: String, base: String },

    #[error("Icons.{0} is the mandatory default icon size and must have cached=true")]
    DefaultIconNotCached(String),
}
