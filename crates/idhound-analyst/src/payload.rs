//! Evidence payload construction.
//!
//! Shapes the aggregate into a bounded JSON document the provider can
//! digest on a tight token budget. Every free-text field is truncated with
//! a single-character ellipsis; the profile list is capped at 30 objects.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{json, Map, Value};

use idhound::{PersonEntity, SocialProfile};

const MAX_PROFILES: usize = 30;
const MAX_BIO: usize = 420;
const MAX_LOCATION: usize = 140;
const MAX_TIMESTAMPS: usize = 60;
const MAX_TEXT_SAMPLES: usize = 16;
const MAX_TEXT_SAMPLE_LEN: usize = 320;
const MAX_URLS: usize = 60;
const MAX_EMAILS: usize = 20;
const MAX_HANDLES: usize = 40;
const MAX_REUSED_HANDLES: usize = 20;
const MAX_BREACH_SUMMARY: usize = 10;

/// Derived facts the confidence clamp needs after the payload is built.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvidenceStats {
    /// At least one profile shipped text samples.
    pub has_text_samples: bool,
    /// At least one profile shipped activity timestamps.
    pub has_activity_timestamps: bool,
    /// Number of profile objects shipped (after the cap).
    pub profile_count: usize,
}

/// Truncate to `max` characters, appending `…` when something was cut.
#[must_use]
pub fn truncate_chars(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((byte_idx, _)) => {
            let mut out = value[..byte_idx].to_string();
            out.push('…');
            out
        }
        None => value.to_string(),
    }
}

fn stripped_url(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

fn meta_first<'a>(profile: &'a SocialProfile, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| profile.metadata.get(*key))
}

fn meta_first_str<'a>(profile: &'a SocialProfile, keys: &[&str]) -> Option<&'a str> {
    meta_first(profile, keys).and_then(Value::as_str)
}

fn signals_object(profile: &SocialProfile) -> Map<String, Value> {
    let mut signals = Map::new();
    let string_signals: &[(&str, &[&str])] = &[
        ("name", &["name", "display_name"]),
        ("company", &["company"]),
        ("blog", &["blog", "website"]),
    ];
    for (key, candidates) in string_signals {
        if let Some(value) = meta_first_str(profile, candidates) {
            signals.insert((*key).to_string(), json!(value));
        }
    }
    if let Some(created) = meta_first(profile, &["created_at", "created_utc"]) {
        signals.insert("created_at".into(), created.clone());
    }
    for key in ["followers", "following"] {
        if let Some(value) = profile.metadata.get(key) {
            signals.insert(key.into(), value.clone());
        }
    }
    if let Some(repos) = meta_first(profile, &["public_repos", "repos"]) {
        signals.insert("public_repos".into(), repos.clone());
    }
    if let Some(languages) = meta_first(profile, &["languages", "tech_stack"]) {
        signals.insert("languages".into(), languages.clone());
    }
    signals
}

fn activity_timestamps(profile: &SocialProfile) -> Vec<Value> {
    let Some(commits) = meta_first(profile, &["commits", "timestamps"]).and_then(Value::as_array)
    else {
        return Vec::new();
    };
    commits
        .iter()
        .filter_map(|entry| match entry {
            Value::Object(obj) => obj.get("timestamp").cloned(),
            Value::String(s) => Some(json!(s)),
            _ => None,
        })
        .take(MAX_TIMESTAMPS)
        .collect()
}

fn text_samples(profile: &SocialProfile) -> Vec<Value> {
    let Some(comments) = meta_first(profile, &["comments", "texts"]).and_then(Value::as_array)
    else {
        return Vec::new();
    };
    comments
        .iter()
        .filter_map(|entry| match entry {
            Value::Object(obj) => obj.get("body").and_then(Value::as_str),
            Value::String(s) => Some(s.as_str()),
            _ => None,
        })
        .map(|text| json!(truncate_chars(text, MAX_TEXT_SAMPLE_LEN)))
        .take(MAX_TEXT_SAMPLES)
        .collect()
}

fn breach_entries(profile: &SocialProfile) -> Vec<Value> {
    profile
        .metadata
        .get("breaches")
        .and_then(|b| b.get("breaches"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// Build the bounded evidence payload and its derived stats.
///
/// Profiles whose source did not confirm existence are dropped before
/// shaping; callers pass the raw aggregate.
#[must_use]
pub fn build_evidence_payload(person: &PersonEntity) -> (Value, EvidenceStats) {
    let confirmed: Vec<&SocialProfile> = person.profiles.iter().filter(|p| p.existe).collect();

    let mut stats = EvidenceStats::default();
    let mut profiles_data = Vec::new();
    let mut networks = BTreeSet::new();
    let mut urls = Vec::new();
    let mut emails = BTreeSet::new();
    let mut handles = BTreeSet::new();
    let mut handle_networks: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut breach_summary = Vec::new();

    for profile in &confirmed {
        networks.insert(profile.network_name.to_lowercase());
        if urls.len() < MAX_URLS {
            urls.push(json!(stripped_url(&profile.url)));
        }
        if profile.username.contains('@') {
            emails.insert(profile.username.to_lowercase());
        } else if !profile.username.is_empty() {
            handles.insert(profile.username.clone());
            handle_networks
                .entry(profile.username.to_lowercase())
                .or_default()
                .insert(profile.network_name.to_lowercase());
        }
        for entry in breach_entries(profile) {
            if breach_summary.len() < MAX_BREACH_SUMMARY {
                breach_summary.push(json!({
                    "email": profile.username,
                    "title": entry.get("title").cloned().unwrap_or(Value::Null),
                    "domain": entry.get("domain").cloned().unwrap_or(Value::Null),
                    "breach_date": entry.get("breach_date").cloned().unwrap_or(Value::Null),
                    "pwn_count": entry.get("pwn_count").cloned().unwrap_or(Value::Null),
                }));
            }
        }
    }

    for profile in confirmed.iter().take(MAX_PROFILES) {
        let mut object = Map::new();
        object.insert("network".into(), json!(profile.network_name));
        object.insert("username".into(), json!(profile.username));
        object.insert("url".into(), json!(stripped_url(&profile.url)));

        let bio = profile
            .bio
            .as_deref()
            .or_else(|| profile.meta_str("bio"))
            .map(str::trim)
            .filter(|b| !b.is_empty());
        if let Some(bio) = bio {
            object.insert("bio".into(), json!(truncate_chars(bio, MAX_BIO)));
        }
        if let Some(location) = profile.meta_str("location") {
            object.insert(
                "location".into(),
                json!(truncate_chars(location, MAX_LOCATION)),
            );
        }

        let signals = signals_object(profile);
        if !signals.is_empty() {
            object.insert("signals".into(), Value::Object(signals));
        }

        let timestamps = activity_timestamps(profile);
        if !timestamps.is_empty() {
            stats.has_activity_timestamps = true;
            object.insert("activity_timestamps".into(), json!(timestamps));
        }
        let samples = text_samples(profile);
        if !samples.is_empty() {
            stats.has_text_samples = true;
            object.insert("text_samples".into(), json!(samples));
        }
        let breaches = breach_entries(profile);
        if !breaches.is_empty() {
            object.insert("breaches".into(), json!(breaches));
        }
        if let Some(communities) = profile.metadata.get("subreddits") {
            object.insert("communities".into(), communities.clone());
        }

        profiles_data.push(Value::Object(object));
    }
    stats.profile_count = profiles_data.len();

    let reused_handles: Vec<String> = handle_networks
        .iter()
        .filter(|(_, networks)| networks.len() > 1)
        .map(|(handle, _)| handle.clone())
        .take(MAX_REUSED_HANDLES)
        .collect();

    let payload = json!({
        "target_query": person.target,
        "evidence_count": profiles_data.len(),
        "confirmed_networks": networks.into_iter().collect::<Vec<_>>(),
        "confirmed_urls": urls,
        "signals": {
            "has_text_samples": stats.has_text_samples,
            "has_activity_timestamps": stats.has_activity_timestamps,
            "emails": emails.into_iter().take(MAX_EMAILS).collect::<Vec<_>>(),
            "handles": handles.into_iter().take(MAX_HANDLES).collect::<Vec<_>>(),
            "reused_handles": reused_handles,
        },
        "breach_summary": breach_summary,
        "raw_evidence": profiles_data,
    });

    (payload, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn confirmed(network: &str, username: &str, url: &str) -> SocialProfile {
        let mut profile = SocialProfile::new(url, username, network);
        profile.existe = true;
        profile
    }

    #[test]
    fn test_truncate_chars_appends_single_ellipsis() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdef", 3), "abc…");
        // multi-byte safety
        assert_eq!(truncate_chars("ééééé", 2), "éé…");
    }

    #[test]
    fn test_nonexistent_profiles_are_dropped() {
        let mut person = PersonEntity::new("t");
        person
            .profiles
            .push(SocialProfile::new("https://a/x", "x", "a"));
        person.profiles.push(confirmed("b", "x", "https://b/x"));

        let (payload, stats) = build_evidence_payload(&person);
        assert_eq!(payload["evidence_count"], 1);
        assert_eq!(stats.profile_count, 1);
        assert_eq!(payload["confirmed_networks"], json!(["b"]));
    }

    #[test]
    fn test_profile_cap_at_30() {
        let mut person = PersonEntity::new("t");
        for i in 0..40 {
            person.profiles.push(confirmed(
                &format!("net{i}"),
                "user",
                &format!("https://net{i}.example/user"),
            ));
        }
        let (payload, stats) = build_evidence_payload(&person);
        assert_eq!(stats.profile_count, 30);
        assert_eq!(payload["raw_evidence"].as_array().unwrap().len(), 30);
        // networks reflect everything confirmed, not just shipped objects
        assert_eq!(payload["confirmed_networks"].as_array().unwrap().len(), 40);
    }

    #[test]
    fn test_url_query_strings_are_stripped() {
        let mut person = PersonEntity::new("t");
        person.profiles.push(confirmed(
            "a",
            "user",
            "https://a.example/user?utm_source=share&x=1",
        ));
        let (payload, _) = build_evidence_payload(&person);
        assert_eq!(payload["raw_evidence"][0]["url"], "https://a.example/user");
        assert_eq!(payload["confirmed_urls"][0], "https://a.example/user");
    }

    #[test]
    fn test_signals_and_caps() {
        let mut profile = confirmed("github", "dev", "https://github.com/dev");
        profile.bio = Some("b".repeat(1000));
        profile.set_meta("location", "x".repeat(500));
        profile.set_meta("name", "Dev Person");
        profile.set_meta("followers", 10);
        profile.set_meta("public_repos", 3);
        let commits: Vec<_> = (0..100)
            .map(|i| json!({"message": format!("m{i}"), "timestamp": format!("2024-01-{:02}T00:00:00Z", (i % 27) + 1)}))
            .collect();
        profile.set_meta("commits", commits);
        let comments: Vec<_> = (0..40)
            .map(|i| json!({"body": format!("comment {i} {}", "y".repeat(600))}))
            .collect();
        profile.set_meta("comments", comments);

        let mut person = PersonEntity::new("dev");
        person.profiles.push(profile);

        let (payload, stats) = build_evidence_payload(&person);
        let object = &payload["raw_evidence"][0];
        assert_eq!(object["bio"].as_str().unwrap().chars().count(), 421);
        assert!(object["bio"].as_str().unwrap().ends_with('…'));
        assert_eq!(object["location"].as_str().unwrap().chars().count(), 141);
        assert_eq!(object["signals"]["name"], "Dev Person");
        assert_eq!(object["signals"]["public_repos"], 3);
        assert_eq!(object["activity_timestamps"].as_array().unwrap().len(), 60);
        assert_eq!(object["text_samples"].as_array().unwrap().len(), 16);
        assert!(stats.has_text_samples);
        assert!(stats.has_activity_timestamps);
    }

    #[test]
    fn test_reused_handles_are_cross_network_case_insensitive() {
        let mut person = PersonEntity::new("t");
        person.profiles.push(confirmed("a", "Alice", "https://a/alice"));
        person.profiles.push(confirmed("b", "alice", "https://b/alice"));
        person.profiles.push(confirmed("c", "unique", "https://c/unique"));

        let (payload, _) = build_evidence_payload(&person);
        assert_eq!(payload["signals"]["reused_handles"], json!(["alice"]));
        let handles = payload["signals"]["handles"].as_array().unwrap();
        assert_eq!(handles.len(), 3);
    }

    #[test]
    fn test_breach_summary_capped() {
        let mut profile = confirmed("hibp", "bob@example.com", "https://hibp/x");
        let breaches: Vec<_> = (0..15)
            .map(|i| {
                json!({"title": format!("Breach{i}"), "domain": "d", "breach_date": "2020-01-01", "pwn_count": i})
            })
            .collect();
        profile.set_meta("breaches", json!({"email": "bob@example.com", "breaches": breaches}));
        let mut person = PersonEntity::new("t");
        person.profiles.push(profile);

        let (payload, _) = build_evidence_payload(&person);
        assert_eq!(payload["breach_summary"].as_array().unwrap().len(), 10);
        assert_eq!(payload["signals"]["emails"], json!(["bob@example.com"]));
    }
}
