//! `CID-Index-<arch>.json.gz` (spec §6 "On-disk layout"): a component-id
//! -> gcid lookup table, so external tools can resolve a component's
//! gcid without parsing the full catalog.

use std::collections::BTreeMap;

/// Serialize `entries` as a sorted JSON object (component-id -> gcid
/// string), rendered with JCS (RFC 8785) via `serde_json_canonicalizer`
/// so byte output is deterministic across runs regardless of insertion
/// order or platform.
pub fn render(entries: &[(String, String)]) -> anyhow::Result<Vec<u8>> {
    let map: BTreeMap<&str, &str> = entries.iter().map(|(cid, gcid)| (cid.as_str(), gcid.as_str())).collect();
    let value = serde_json::to_value(&map)?;
    Ok(serde_json_canonicalizer::to_vec(&value)?)
}
