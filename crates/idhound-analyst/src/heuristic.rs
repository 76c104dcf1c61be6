//! Deterministic fallback report.
//!
//! Produced when the AI path cannot deliver a trustworthy result: missing
//! key, exhausted retries, or a terminal provider failure. The structure
//! mirrors the provider contract (six numbered sections) so downstream
//! renderers need no special case; sections without computable content
//! state the lack of evidence explicitly.

use chrono::Utc;
use serde_json::json;

use idhound::{AnalysisReport, Language, Metadata, PersonEntity};

const MAX_BREACH_TITLES: usize = 6;

/// Marker model identifier for fallback reports.
pub const HEURISTIC_MODEL: &str = "heuristic";

struct Texts {
    sections: [&'static str; 6],
    insufficient: &'static str,
    confirmed_line: &'static str,
    networks_line: &'static str,
    emails_line: &'static str,
    no_emails: &'static str,
    breaches_word: &'static str,
    more_suffix: &'static str,
    highlight_profiles: &'static str,
    highlight_networks: &'static str,
    highlight_breaches: &'static str,
}

const EN: Texts = Texts {
    sections: [
        "## 1. Identity & demographics",
        "## 2. Geo-temporal analysis",
        "## 3. Psychological profile (OCEAN)",
        "## 4. Technical & professional profile",
        "## 5. Ideology & values",
        "## 6. Attack surface",
    ],
    insufficient: "Insufficient evidence for automated inference.",
    confirmed_line: "Confirmed profiles",
    networks_line: "Networks",
    emails_line: "Observed emails",
    no_emails: "No email evidence collected.",
    breaches_word: "breaches",
    more_suffix: "more",
    highlight_profiles: "confirmed profiles",
    highlight_networks: "Networks",
    highlight_breaches: "Breach evidence present for at least one email",
};

const ES: Texts = Texts {
    sections: [
        "## 1. Identidad y demografía",
        "## 2. Análisis geo-temporal",
        "## 3. Perfil psicológico (OCEAN)",
        "## 4. Perfil técnico y profesional",
        "## 5. Ideología y valores",
        "## 6. Vectores de ataque",
    ],
    insufficient: "Evidencia insuficiente para inferencia automática.",
    confirmed_line: "Perfiles confirmados",
    networks_line: "Redes",
    emails_line: "Correos observados",
    no_emails: "No se recolectó evidencia de correos.",
    breaches_word: "brechas",
    more_suffix: "más",
    highlight_profiles: "perfiles confirmados",
    highlight_networks: "Redes",
    highlight_breaches: "Hay evidencia de brechas para al menos un correo",
};

struct BreachLine {
    email: String,
    count: usize,
    titles: Vec<String>,
}

fn breach_lines(person: &PersonEntity) -> Vec<BreachLine> {
    person
        .profiles
        .iter()
        .filter(|p| p.existe && p.network_name == "hibp")
        .map(|p| {
            let titles: Vec<String> = p
                .metadata
                .get("breaches")
                .and_then(|b| b.get("breaches"))
                .and_then(serde_json::Value::as_array)
                .map(|entries| {
                    entries
                        .iter()
                        .filter_map(|e| e.get("title").and_then(serde_json::Value::as_str))
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            let count = p
                .metadata
                .get("breach_count")
                .and_then(serde_json::Value::as_u64)
                .map_or(titles.len(), |c| c as usize);
            BreachLine {
                email: p.username.clone(),
                count,
                titles,
            }
        })
        .collect()
}

/// Build the deterministic report for an aggregate.
///
/// `reason` is a machine-readable cause recorded under `raw.reason`.
#[must_use]
pub fn heuristic_report(person: &PersonEntity, language: Language, reason: &str) -> AnalysisReport {
    let texts = match language {
        Language::English => EN,
        Language::Spanish => ES,
    };

    let confirmed = person.confirmed_count();
    let total = person.profiles.len();
    let mut networks: Vec<String> = person
        .profiles
        .iter()
        .filter(|p| p.existe)
        .map(|p| p.network_name.to_lowercase())
        .collect();
    networks.sort();
    networks.dedup();

    let mut emails: Vec<String> = person
        .profiles
        .iter()
        .filter(|p| p.existe && p.username.contains('@'))
        .map(|p| p.username.to_lowercase())
        .collect();
    emails.sort();
    emails.dedup();

    let breaches = breach_lines(person);

    let mut summary = String::new();
    for (index, heading) in texts.sections.iter().enumerate() {
        summary.push_str(heading);
        summary.push('\n');
        match index {
            3 => {
                summary.push_str(&format!(
                    "- {}: {confirmed} / {total}\n- {}: {}\n",
                    texts.confirmed_line,
                    texts.networks_line,
                    if networks.is_empty() {
                        "-".to_string()
                    } else {
                        networks.join(", ")
                    }
                ));
            }
            5 => {
                if emails.is_empty() {
                    summary.push_str(&format!("{}\n", texts.no_emails));
                } else {
                    summary.push_str(&format!(
                        "- {}: {}\n",
                        texts.emails_line,
                        emails.join(", ")
                    ));
                }
                for line in &breaches {
                    let shown: Vec<&str> = line
                        .titles
                        .iter()
                        .take(MAX_BREACH_TITLES)
                        .map(String::as_str)
                        .collect();
                    let overflow = line.titles.len().saturating_sub(MAX_BREACH_TITLES);
                    let mut titles = shown.join(", ");
                    if overflow > 0 {
                        titles.push_str(&format!(" +{overflow} {}", texts.more_suffix));
                    }
                    if titles.is_empty() {
                        summary.push_str(&format!(
                            "- {}: {} {}\n",
                            line.email, line.count, texts.breaches_word
                        ));
                    } else {
                        summary.push_str(&format!(
                            "- {}: {} {} ({titles})\n",
                            line.email, line.count, texts.breaches_word
                        ));
                    }
                }
            }
            _ => {
                summary.push_str(texts.insufficient);
                summary.push('\n');
            }
        }
        summary.push('\n');
    }

    let mut highlights = vec![format!("{confirmed} {}", texts.highlight_profiles)];
    if !networks.is_empty() {
        highlights.push(format!(
            "{}: {}",
            texts.highlight_networks,
            networks.join(", ")
        ));
    }
    if breaches.iter().any(|line| line.count > 0) {
        highlights.push(texts.highlight_breaches.to_string());
    }

    let mut raw = Metadata::new();
    raw.insert("reason".into(), json!(reason));

    AnalysisReport {
        summary: summary.trim_end().to_string(),
        highlights,
        confidence: 0.25,
        generated_at: Utc::now(),
        model: Some(HEURISTIC_MODEL.to_string()),
        raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use idhound::SocialProfile;

    fn person_with_evidence() -> PersonEntity {
        let mut person = PersonEntity::new("alice/bob@example.com");
        let mut github = SocialProfile::new("https://github.com/alice", "alice", "github");
        github.existe = true;
        person.profiles.push(github);

        let mut hibp = SocialProfile::new(
            "https://haveibeenpwned.com/unifiedsearch/bob@example.com",
            "bob@example.com",
            "hibp",
        );
        hibp.existe = true;
        hibp.set_meta("breach_count", 8);
        let titles: Vec<_> = (0..8).map(|i| json!({"title": format!("B{i}")})).collect();
        hibp.set_meta("breaches", json!({"email": "bob@example.com", "breaches": titles}));
        person.profiles.push(hibp);

        person
            .profiles
            .push(SocialProfile::new("https://x.com/alice", "alice", "x"));
        person
    }

    #[test]
    fn test_structure_has_six_sections_and_fixed_confidence() {
        let report = heuristic_report(&person_with_evidence(), Language::English, "test_reason");
        for n in 1..=6 {
            assert!(report.summary.contains(&format!("## {n}.")), "missing {n}");
        }
        assert!((report.confidence - 0.25).abs() < f64::EPSILON);
        assert_eq!(report.model.as_deref(), Some(HEURISTIC_MODEL));
        assert_eq!(report.raw["reason"], "test_reason");
    }

    #[test]
    fn test_section_four_counts_and_section_six_breaches() {
        let report = heuristic_report(&person_with_evidence(), Language::English, "r");
        assert!(report.summary.contains("Confirmed profiles: 2 / 3"));
        assert!(report.summary.contains("github, hibp"));
        assert!(report.summary.contains("bob@example.com: 8 breaches"));
        // 8 titles, 6 shown, 2 overflow
        assert!(report.summary.contains("+2 more"));
    }

    #[test]
    fn test_highlights_include_breach_indicator() {
        let report = heuristic_report(&person_with_evidence(), Language::English, "r");
        assert!(report.highlights[0].contains("2 confirmed profiles"));
        assert!(report
            .highlights
            .iter()
            .any(|h| h.contains("Breach evidence")));
    }

    #[test]
    fn test_spanish_rendition() {
        let report = heuristic_report(&person_with_evidence(), Language::Spanish, "r");
        assert!(report.summary.contains("## 1. Identidad"));
        assert!(report.summary.contains("Perfiles confirmados"));
        assert!(report.summary.contains("brechas"));
    }

    #[test]
    fn test_empty_aggregate_still_well_formed() {
        let person = PersonEntity::new("target");
        let report = heuristic_report(&person, Language::English, "missing_ai_api_key");
        assert!(report.summary.contains("## 6."));
        assert!(report.summary.contains("No email evidence"));
        assert_eq!(report.highlights[0], "0 confirmed profiles");
    }
}
