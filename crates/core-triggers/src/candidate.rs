//! The normalized shape every detector produces (§4.4).

use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct TriggerCandidate {
    /// Stable, collision-free within (workflow, trigger_type).
    pub external_id: String,
    /// Always of shape `{"trigger": {...flattened fields...}}` — the
    /// `trigger` key is what template paths like `{{trigger.from}}` resolve
    /// against once this reaches the interpreter.
    pub data: serde_json::Value,
    pub occurred_at: DateTime<Utc>,
}

/// Sort newest-first, the ordering rule every detector applies before
/// handing candidates to the dedup filter (§4.4).
pub fn sort_newest_first(candidates: &mut [TriggerCandidate]) {
    candidates.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
}

/// Pull a required string config key; `None` signals "detector can't run",
/// which callers turn into an empty list rather than an error.
pub fn required_str<'a>(config: &'a std::collections::HashMap<String, serde_json::Value>, key: &str) -> Option<&'a str> {
    config.get(key)?.as_str()
}

pub fn optional_str<'a>(config: &'a std::collections::HashMap<String, serde_json::Value>, key: &str) -> Option<&'a str> {
    config.get(key).and_then(|v| v.as_str())
}
