//! Response post-processing: JSON extraction, envelope validation,
//! template detection, summary sanitisation and the confidence clamp.
//!
//! Providers wrap their JSON in fences, prose or both. Extraction tries the
//! cheapest reading first: a fenced ```json block, then the whole trimmed
//! body, then the widest `{...}` span that parses.

use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

use idhound::{Error, Result};

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        #[allow(clippy::unwrap_used)] // static pattern, verified by tests
        Regex::new(r"(?si)```(?:json)?\s*(\{.*?\})\s*```").unwrap()
    })
}

fn section_one_regex() -> &'static Regex {
    static ANCHOR: OnceLock<Regex> = OnceLock::new();
    ANCHOR.get_or_init(|| {
        #[allow(clippy::unwrap_used)] // static pattern, verified by tests
        Regex::new(r"(?m)^## 1\.").unwrap()
    })
}

fn section_six_regex() -> &'static Regex {
    static ANCHOR: OnceLock<Regex> = OnceLock::new();
    ANCHOR.get_or_init(|| {
        #[allow(clippy::unwrap_used)] // static pattern, verified by tests
        Regex::new(r"(?m)^## 6\.").unwrap()
    })
}

/// Extract the first JSON object from a provider reply.
pub fn extract_json_object(text: &str) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::parse("empty provider reply"));
    }

    if let Some(captures) = fence_regex().captures(trimmed) {
        if let Some(body) = captures.get(1) {
            return Ok(body.as_str().trim().to_string());
        }
    }

    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Ok(trimmed.to_string());
    }

    let start = trimmed.find('{');
    let end = trimmed.rfind('}');
    if let (Some(start), Some(end)) = (start, end) {
        if end > start {
            let candidate = trimmed[start..=end].trim();
            if serde_json::from_str::<serde_json::Value>(candidate).is_ok() {
                return Ok(candidate.to_string());
            }
        }
    }

    Err(Error::parse("no JSON object found in provider reply"))
}

/// The strict envelope the provider must return.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportEnvelope {
    /// Markdown summary with the six numbered sections.
    pub summary: String,
    /// Grounded bullet deductions.
    #[serde(default)]
    pub highlights: Vec<String>,
    /// Confidence in [0, 1].
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_confidence() -> f64 {
    0.5
}

/// Parse and validate the envelope out of extracted JSON text.
pub fn parse_envelope(json_text: &str) -> Result<ReportEnvelope> {
    let envelope: ReportEnvelope = serde_json::from_str(json_text)
        .map_err(|e| Error::parse(format!("envelope does not match contract: {e}")))?;
    if envelope.summary.trim().is_empty() {
        return Err(Error::parse("envelope summary is empty"));
    }
    if !(0.0..=1.0).contains(&envelope.confidence) {
        return Err(Error::parse(format!(
            "confidence {} outside [0, 1]",
            envelope.confidence
        )));
    }
    Ok(envelope)
}

const BOILERPLATE_SUMMARIES: &[&str] = &[
    "Texto largo en Markdown con las 6 secciones detalladas arriba.",
    "Texto largo en Markdown con EXACTAMENTE seis secciones encabezadas '## 1.' a '## 6.' según lo descrito arriba.",
    "Markdown text with the six sections above.",
    "Long Markdown text containing EXACTLY six sections headed '## 1.' through '## 6.' as described above.",
];

const PLACEHOLDER_HIGHLIGHTS: &[&str] = &[
    "Lista de 3-5 deducciones rápidas y de alto impacto (Bullet points)",
    "3-5 deducciones breves, de alto impacto y basadas en la evidencia",
    "3-5 high-impact deductions.",
    "3-5 short, high-impact, evidence-grounded deductions",
    "...",
];

/// Detect a reply that parrots the output contract instead of analysing.
#[must_use]
pub fn is_template_response(envelope: &ReportEnvelope) -> bool {
    let summary = envelope.summary.trim();
    if BOILERPLATE_SUMMARIES.iter().any(|b| summary == *b) {
        return true;
    }
    if envelope.highlights.is_empty() {
        return true;
    }
    if envelope.highlights.iter().all(|h| {
        let h = h.trim();
        PLACEHOLDER_HIGHLIGHTS.iter().any(|p| h == *p)
    }) {
        return true;
    }
    // The section anchors must start a line; "## 1." buried mid-sentence is
    // not a heading.
    !(section_one_regex().is_match(summary) && section_six_regex().is_match(summary))
}

/// Trim the summary to the end of section "## 6.".
///
/// Models sometimes append echo sections ("## Highlights", "## Confidence")
/// or keep rambling past the contract; everything after the sixth section's
/// next heading is cut, and a junk heading anywhere cuts earlier.
#[must_use]
pub fn sanitize_summary(summary: &str) -> String {
    let mut view = summary;

    if let Some(pos) = view.find("## 6.") {
        let after = pos + "## 6.".len();
        if let Some(next_heading) = view[after..].find("\n## ") {
            view = &view[..after + next_heading];
        }
    }

    for junk in ["## Highlights", "## Confidence"] {
        if let Some(pos) = view.find(junk) {
            view = &view[..pos];
        }
    }

    view.trim().to_string()
}

/// Clamp confidence when the evidence carried neither text samples nor
/// activity timestamps: such reports cannot be trusted far.
#[must_use]
pub fn clamp_confidence(
    confidence: f64,
    has_text_samples: bool,
    has_activity_timestamps: bool,
    profile_count: usize,
) -> f64 {
    if has_text_samples || has_activity_timestamps {
        return confidence;
    }
    let ceiling = if profile_count >= 3 { 0.55 } else { 0.35 };
    confidence.min(ceiling)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r###"{"summary": "## 1. a\n## 6. b", "highlights": ["x"], "confidence": 0.8}"###;

    #[test]
    fn test_extract_from_json_fence() {
        let text = format!("Here you go:\n```json\n{VALID}\n```\nDone.");
        let extracted = extract_json_object(&text).unwrap();
        assert_eq!(extracted, VALID);
    }

    #[test]
    fn test_extract_from_plain_fence() {
        let text = format!("```\n{VALID}\n```");
        assert_eq!(extract_json_object(&text).unwrap(), VALID);
    }

    #[test]
    fn test_extract_whole_body_is_a_retraction() {
        // Already exactly one top-level object: extraction returns it as-is.
        assert_eq!(extract_json_object(VALID).unwrap(), VALID);
        assert_eq!(
            extract_json_object(&format!("  {VALID}  ")).unwrap(),
            VALID
        );
    }

    #[test]
    fn test_extract_brace_span_must_parse() {
        let text = format!("The report follows. {VALID} That is all.");
        assert_eq!(extract_json_object(&text).unwrap(), VALID);

        let broken = "prefix { not json } suffix";
        assert!(extract_json_object(broken).is_err());
    }

    #[test]
    fn test_extract_empty_is_parse_error() {
        assert!(matches!(extract_json_object("  "), Err(Error::Parse(_))));
        assert!(extract_json_object("no braces here").is_err());
    }

    #[test]
    fn test_envelope_validation() {
        let envelope = parse_envelope(VALID).unwrap();
        assert!((envelope.confidence - 0.8).abs() < f64::EPSILON);

        let defaulted = parse_envelope(r#"{"summary": "s"}"#).unwrap();
        assert!((defaulted.confidence - 0.5).abs() < f64::EPSILON);
        assert!(defaulted.highlights.is_empty());

        assert!(parse_envelope(r#"{"summary": "  "}"#).is_err());
        assert!(parse_envelope(r#"{"summary": "s", "confidence": 1.5}"#).is_err());
        assert!(parse_envelope("{").is_err());
    }

    fn envelope(summary: &str, highlights: &[&str]) -> ReportEnvelope {
        ReportEnvelope {
            summary: summary.to_string(),
            highlights: highlights.iter().map(|h| (*h).to_string()).collect(),
            confidence: 0.7,
        }
    }

    #[test]
    fn test_template_detection() {
        // Boilerplate summary echoed back verbatim.
        assert!(is_template_response(&envelope(
            "Markdown text with the six sections above.",
            &["x"]
        )));
        // No highlights at all.
        assert!(is_template_response(&envelope("## 1. a\n## 6. b", &[])));
        // Only placeholder highlights.
        assert!(is_template_response(&envelope(
            "## 1. a\n## 6. b",
            &["3-5 high-impact deductions."]
        )));
        // Missing section anchors.
        assert!(is_template_response(&envelope("free-form text", &["x"])));
        // Anchors buried mid-sentence are not headings.
        assert!(is_template_response(&envelope(
            "intro ## 1. foo\n## 6. bar",
            &["x"]
        )));
        assert!(is_template_response(&envelope(
            "## 1. a\nmid ## 6. b",
            &["x"]
        )));
        // A grounded reply passes.
        assert!(!is_template_response(&envelope(
            "## 1. a\n## 2. b\n## 6. c",
            &["uses rust", "UTC+2 sleep pattern"]
        )));
    }

    #[test]
    fn test_sanitize_cuts_after_section_six() {
        let summary = "## 1. a\n## 6. final section\nmore text\n## 7. bonus\nnoise";
        assert_eq!(
            sanitize_summary(summary),
            "## 1. a\n## 6. final section\nmore text"
        );
    }

    #[test]
    fn test_sanitize_cuts_junk_headings() {
        let summary = "## 1. a\n## Highlights\n- echoed";
        assert_eq!(sanitize_summary(summary), "## 1. a");

        let with_conf = "## 1. a\n## 6. b\n## Confidence\n0.9";
        assert_eq!(sanitize_summary(with_conf), "## 1. a\n## 6. b");
    }

    #[test]
    fn test_sanitize_keeps_well_formed_summaries() {
        let summary = "## 1. a\n## 2. b\n## 6. c\nclosing thoughts";
        assert_eq!(sanitize_summary(summary), summary);
    }

    #[test]
    fn test_confidence_clamp() {
        // Rich evidence passes through.
        assert!((clamp_confidence(0.9, true, false, 1) - 0.9).abs() < f64::EPSILON);
        assert!((clamp_confidence(0.9, false, true, 1) - 0.9).abs() < f64::EPSILON);
        // Thin evidence is capped.
        assert!((clamp_confidence(0.9, false, false, 1) - 0.35).abs() < f64::EPSILON);
        assert!((clamp_confidence(0.9, false, false, 3) - 0.55).abs() < f64::EPSILON);
        // Already-low confidence stays.
        assert!((clamp_confidence(0.2, false, false, 1) - 0.2).abs() < f64::EPSILON);
    }
}
