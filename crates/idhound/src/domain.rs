//! Domain model for the identity pipeline.
//!
//! These types describe *what* the evidence is, not how it was obtained.
//! `SocialProfile` unifies the verdicts of heterogeneous scanners into one
//! record with an open-schema metadata bag; `PersonEntity` aggregates the
//! investigation state for export and analysis.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Open-schema evidence bag attached to every profile.
///
/// Downstream consumers look up known keys (`status_code`, `final_url`,
/// `bio`, `commits`, ...); unknown keys pass through untouched.
pub type Metadata = serde_json::Map<String, Value>;

/// One scanner's verdict on one identifier for one source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialProfile {
    /// Canonical public URL of the profile, or the endpoint used to check it.
    pub url: String,
    /// Identifier probed. For email-keyed sources this holds the email.
    pub username: String,
    /// Short stable network key, e.g. `"github"`, `"reddit"`, `"hibp"`.
    pub network_name: String,
    /// Whether the source resolved the identifier to a real public presence.
    #[serde(default)]
    pub existe: bool,
    /// Arbitrary evidence (headers, signals, errors, ...).
    #[serde(default)]
    pub metadata: Metadata,
    /// Public bio/description, when a source provided one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    /// Public avatar/image URL, when a source provided one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imagen_url: Option<String>,
}

impl SocialProfile {
    /// Profile skeleton with empty metadata and `existe = false`.
    #[must_use]
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        network_name: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            username: username.into(),
            network_name: network_name.into(),
            existe: false,
            metadata: Metadata::new(),
            bio: None,
            imagen_url: None,
        }
    }

    /// String value of a metadata key, when present.
    #[must_use]
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    /// Insert a metadata key, serializing any serde-compatible value.
    pub fn set_meta(&mut self, key: impl Into<String>, value: impl Serialize) {
        if let Ok(v) = serde_json::to_value(value) {
            self.metadata.insert(key.into(), v);
        }
    }

    /// Deduplication key: `(network_name, username, url)`.
    #[must_use]
    pub fn identity_key(&self) -> (String, String, String) {
        (
            self.network_name.clone(),
            self.username.clone(),
            self.url.clone(),
        )
    }
}

/// One breach a queried email appeared in, as reported by the breach index.
///
/// The provider uses PascalCase keys on the wire; the aliases accept both
/// spellings so re-ingested metadata round-trips.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreachEntry {
    /// Breach title.
    #[serde(alias = "Title")]
    pub title: String,
    /// Domain associated with the breach.
    #[serde(alias = "Domain", default)]
    pub domain: String,
    /// Date the breach occurred (provider-formatted string).
    #[serde(alias = "BreachDate", default)]
    pub breach_date: String,
    /// Number of accounts compromised.
    #[serde(alias = "PwnCount", default)]
    pub pwn_count: u64,
    /// Provider description (may contain HTML).
    #[serde(alias = "Description", default)]
    pub description: String,
    /// Kinds of data compromised.
    #[serde(alias = "DataClasses", default)]
    pub data_classes: Vec<String>,
}

/// Breach evidence for one email address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreachProfile {
    /// Email address that was queried.
    pub email: String,
    /// Breaches the address appeared in.
    #[serde(default)]
    pub breaches: Vec<BreachEntry>,
}

/// Report produced by the AI analysis layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Markdown summary carrying the six enumerated report sections.
    pub summary: String,
    /// 3-5 grounded bullet deductions.
    #[serde(default)]
    pub highlights: Vec<String>,
    /// Normalized confidence in [0, 1].
    pub confidence: f64,
    /// Report generation time (UTC).
    pub generated_at: DateTime<Utc>,
    /// Provider model actually used, or `"heuristic"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Full provider envelope, kept for audit.
    #[serde(default)]
    pub raw: Metadata,
}

/// Aggregate for one investigated identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonEntity {
    /// Human label, typically slash-joined identifiers.
    pub target: String,
    /// Profiles found/checked across networks, deduplicated.
    #[serde(default)]
    pub profiles: Vec<SocialProfile>,
    /// AI report, present only after the analysis stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisReport>,
}

impl PersonEntity {
    /// Aggregate with no profiles and no analysis.
    #[must_use]
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            profiles: Vec::new(),
            analysis: None,
        }
    }

    /// Count of profiles whose source confirmed existence.
    #[must_use]
    pub fn confirmed_count(&self) -> usize {
        self.profiles.iter().filter(|p| p.existe).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_defaults() {
        let profile = SocialProfile::new("https://github.com/octocat", "octocat", "github");
        assert!(!profile.existe);
        assert!(profile.metadata.is_empty());
        assert!(profile.bio.is_none());
        assert!(profile.imagen_url.is_none());
    }

    #[test]
    fn test_profile_metadata_helpers() {
        let mut profile = SocialProfile::new("https://x.com/u", "u", "x");
        profile.set_meta("status_code", 200);
        profile.set_meta("final_url", "https://x.com/u");
        assert_eq!(profile.meta_str("final_url"), Some("https://x.com/u"));
        assert_eq!(profile.metadata["status_code"], json!(200));
        assert_eq!(profile.meta_str("missing"), None);
    }

    #[test]
    fn test_profile_deserializes_with_missing_optionals() {
        let profile: SocialProfile = serde_json::from_value(json!({
            "url": "https://gitlab.com/u",
            "username": "u",
            "network_name": "gitlab"
        }))
        .unwrap();
        assert!(!profile.existe);
        assert!(profile.metadata.is_empty());
    }

    #[test]
    fn test_breach_entry_accepts_provider_casing() {
        let entry: BreachEntry = serde_json::from_value(json!({
            "Title": "Twitter (200M)",
            "Domain": "twitter.com",
            "BreachDate": "2021-01-01",
            "PwnCount": 211_524_284u64,
            "Description": "scraped",
            "DataClasses": ["Email addresses", "Names"],
            "IsVerified": true
        }))
        .unwrap();
        assert_eq!(entry.title, "Twitter (200M)");
        assert_eq!(entry.pwn_count, 211_524_284);
        assert_eq!(entry.data_classes.len(), 2);

        // Serializes snake_case so it round-trips through metadata.
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["breach_date"], "2021-01-01");
        let back: BreachEntry = serde_json::from_value(value).unwrap();
        assert_eq!(back.domain, "twitter.com");
    }

    #[test]
    fn test_person_confirmed_count() {
        let mut person = PersonEntity::new("octocat");
        let mut found = SocialProfile::new("https://github.com/octocat", "octocat", "github");
        found.existe = true;
        person.profiles.push(found);
        person
            .profiles
            .push(SocialProfile::new("https://x.com/octocat", "octocat", "x"));
        assert_eq!(person.confirmed_count(), 1);
    }
}
