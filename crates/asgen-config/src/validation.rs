//! Cross-field validation and icon-policy resolution for `Config`.

use crate::error::ConfigError;
use crate::model::{Config, IconPolicyConfig};
use asgen_icons::policy::{IconPolicyState, IconSizePolicy};

/// Suite names the store layout already uses for something else (spec
/// §4.1 on-disk layout reserves `pool/` for the content-addressed
/// package pool).
const RESERVED_SUITE_NAMES: &[&str] = &["pool"];

impl Config {
    /// Run every cross-field check spec §6 requires. Per-field shape
    /// (unknown backend, bad enum) is already rejected by `serde` at
    /// parse time; this covers invariants serde can't express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for name in self.suites.keys() {
            if RESERVED_SUITE_NAMES.contains(&name.as_str()) {
                return Err(ConfigError::ForbiddenSuiteName(name.clone()));
            }
        }
        for (name, suite) in &self.suites {
            if let Some(base) = &suite.base_suite {
                if !self.suites.contains_key(base) {
                    return Err(ConfigError::UnknownBaseSuite { suite: name.clone(), base: base.clone() });
                }
            }
        }
        for (key, policy) in &self.icons {
            if is_default_icon_key(key) && !policy.cached {
                return Err(ConfigError::DefaultIconNotCached(key.clone()));
            }
        }
        Ok(())
    }

    /// `Config.Icons` translated into the policy list `IconHandler`
    /// consumes, plus the mandatory 64x64 default (spec §4.3) if the
    /// config did not declare it explicitly.
    pub fn icon_policies(&self) -> Result<Vec<IconSizePolicy>, ConfigError> {
        let mut policies = Vec::new();
        let mut has_default = false;
        for (key, policy) in &self.icons {
            let (width, height, scale) = parse_icon_key(key)
                .ok_or_else(|| ConfigError::InvalidValue { key: format!("Icons.{key}"), value: key.clone() })?;
            if width == 64 && height == 64 && scale == 1 {
                has_default = true;
            }
            policies.push(IconSizePolicy::new(width, height, scale, state_for(*policy)));
        }
        if !has_default {
            policies.extend(asgen_icons::policy::default_policy());
        }
        Ok(policies)
    }
}

fn state_for(policy: IconPolicyConfig) -> IconPolicyState {
    match (policy.cached, policy.remote) {
        (true, true) => IconPolicyState::CachedRemote,
        (true, false) => IconPolicyState::CachedOnly,
        (false, true) => IconPolicyState::RemoteOnly,
        (false, false) => IconPolicyState::Ignored,
    }
}

fn is_default_icon_key(key: &str) -> bool {
    parse_icon_key(key).is_some_and(|(w, h, s)| w == 64 && h == 64 && s == 1)
}

/// Parses a `"WxH"` or `"WxH@scale"` icon-policy key (spec §6).
fn parse_icon_key(key: &str) -> Option<(u32, u32, u32)> {
    let (dims, scale) = match key.split_once('@') {
        Some((dims, scale)) => (dims, scale.parse().ok()?),
        None => (key, 1),
    };
    let (w, h) = dims.split_once('x')?;
    Some((w.parse().ok()?, h.parse().ok()?, scale))
}
