//! Typed records stored in the `statistics` and `repository` sub-stores,
//! encoded with [`crate::binary`] (SPEC_FULL.md §3 SUPPLEMENT: field
//! sets fixed to exactly the counters the Engine already accumulates).

use crate::binary::{self, Value};
use anyhow::{Context, Result};

/// One run's counters for a `(suite, section, architecture)` triple
/// (SPEC_FULL.md §3 SUPPLEMENT: "StatisticsEntry fields").
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsEntry {
    pub suite: String,
    pub section: String,
    pub architecture: String,
    pub packages_total: i64,
    pub packages_ignored: i64,
    pub packages_with_hints: i64,
    pub components_total: i64,
    pub gcids_active: i64,
    pub duration_secs: f64,
}

impl StatisticsEntry {
    #[must_use]
    pub fn encode(&self, timestamp: i64) -> Vec<u8> {
        binary::encode(
            Some(timestamp),
            &[
                ("suite", Value::Str(self.suite.clone())),
                ("section", Value::Str(self.section.clone())),
                ("architecture", Value::Str(self.architecture.clone())),
                ("packages_total", Value::Int64(self.packages_total)),
                ("packages_ignored", Value::Int64(self.packages_ignored)),
                ("packages_with_hints", Value::Int64(self.packages_with_hints)),
                ("components_total", Value::Int64(self.components_total)),
                ("gcids_active", Value::Int64(self.gcids_active)),
                ("duration_secs", Value::Float64(self.duration_secs)),
            ],
        )
    }

    pub fn decode(bytes: &[u8]) -> Result<(i64, Self)> {
        let (timestamp, fields) = binary::decode(bytes, true)?;
        let timestamp = timestamp.context("statistics record missing timestamp")?;
        let get_str = |name: &str| -> Result<String> {
            fields
                .iter()
                .find(|(k, _)| k == name)
                .and_then(|(_, v)| v.as_str())
                .map(str::to_string)
                .with_context(|| format!("missing field {name}"))
        };
        let get_i64 = |name: &str| -> Result<i64> {
            fields
                .iter()
                .find(|(k, _)| k == name)
                .and_then(|(_, v)| v.as_i64())
                .with_context(|| format!("missing field {name}"))
        };
        let get_f64 = |name: &str| -> Result<f64> {
            fields
                .iter()
                .find(|(k, _)| k == name)
                .and_then(|(_, v)| v.as_f64())
                .with_context(|| format!("missing field {name}"))
        };
        let entry = Self {
            suite: get_str("suite")?,
            section: get_str("section")?,
            architecture: get_str("architecture")?,
            packages_total: get_i64("packages_total")?,
            packages_ignored: get_i64("packages_ignored")?,
            packages_with_hints: get_i64("packages_with_hints")?,
            components_total: get_i64("components_total")?,
            gcids_active: get_i64("gcids_active")?,
            duration_secs: get_f64("duration_secs")?,
        };
        Ok((timestamp, entry))
    }
}

/// Per-`{suite}-{section}-{arch}` repository summary
/// (SPEC_FULL.md §3 SUPPLEMENT: "RepositoryInfo fields").
#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryInfo {
    pub package_count: i64,
    pub component_count: i64,
    pub hint_count: i64,
    pub generated_at: i64,
    pub data_priority: i64,
}

impl RepositoryInfo {
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        binary::encode(
            None,
            &[
                ("package_count", Value::Int64(self.package_count)),
                ("component_count", Value::Int64(self.component_count)),
                ("hint_count", Value::Int64(self.hint_count)),
                ("generated_at", Value::Int64(self.generated_at)),
                ("data_priority", Value::Int64(self.data_priority)),
            ],
        )
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let (_, fields) = binary::decode(bytes, false)?;
        let get_i64 = |name: &str| -> Result<i64> {
            fields
                .iter()
                .find(|(k, _)| k == name)
                .and_then(|(_, v)| v.as_i64())
                .with_context(|| format!("missing field {name}"))
        };
        Ok(Self {
            package_count: get_i64("package_count")?,
            component_count: get_i64("component_count")?,
            hint_count: get_i64("hint_count")?,
            generated_at: get_i64("generated_at")?,
            data_priority: get_i64("data_priority")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statistics_entry_round_trips() {
        let entry = StatisticsEntry {
            suite: "stable".into(),
            section: "main".into(),
            architecture: "amd64".into(),
            packages_total: 100,
            packages_ignored: 10,
            packages_with_hints: 5,
            components_total: 42,
            gcids_active: 42,
            duration_secs: 12.5,
        };
        let encoded = entry.encode(1_700_000_000);
        let (ts, decoded) = StatisticsEntry::decode(&encoded).unwrap();
        assert_eq!(ts, 1_700_000_000);
        assert_eq!(decoded, entry);
    }

    #[test]
    fn repository_info_round_trips() {
        let info = RepositoryInfo {
            package_count: 10,
            component_count: 20,
            hint_count: 1,
            generated_at: 1_700_000_000,
            data_priority: 0,
        };
        assert_eq!(RepositoryInfo::decode(&info.encode()).unwrap(), info);
    }
}
