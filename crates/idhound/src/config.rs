//! Pipeline settings and language selection.
//!
//! `AppSettings` is a plain value passed explicitly through the pipeline;
//! loading it from files or environment variables is the front-end's job.

use serde::{Deserialize, Serialize};

/// Natural-language choices for prompts and generated reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English output (default).
    #[default]
    #[serde(rename = "en")]
    English,
    /// Spanish output.
    #[serde(rename = "es")]
    Spanish,
}

impl Language {
    /// Derive a language from a "spanish?" flag.
    #[must_use]
    pub fn from_spanish_flag(spanish: bool) -> Self {
        if spanish {
            Self::Spanish
        } else {
            Self::English
        }
    }

    /// Two-letter code ("en"/"es").
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Spanish => "es",
        }
    }

    /// Human readable label for prompts and logging.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Spanish => "Spanish",
        }
    }
}

/// Central application settings consumed by the pipeline and its adapters.
///
/// Every outbound HTTP request is bounded by `http_timeout_seconds`; AI
/// calls by `ai_timeout_seconds` and at most `ai_max_retries` retries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Per-request timeout in seconds for OSINT probes.
    pub http_timeout_seconds: f64,
    /// User-Agent presented to scanned sources.
    pub user_agent: String,

    /// API key for the OpenAI-compatible provider. `None` triggers the
    /// heuristic fallback unless the base URL is a loopback address.
    pub ai_api_key: Option<String>,
    /// OpenAI-compatible base URL.
    pub ai_base_url: String,
    /// Model used for analysis.
    pub ai_model: String,
    /// Model to switch to once when the provider rejects `ai_model`.
    pub ai_fallback_model: Option<String>,
    /// Timeout in seconds for provider calls.
    pub ai_timeout_seconds: f64,
    /// Maximum retries for transient provider failures (0-10).
    pub ai_max_retries: u32,

    /// Concurrency cap for the data-driven site-list engine.
    pub sites_max_concurrency: usize,
    /// Exclude NSFW-categorised entries from site lists.
    pub sites_no_nsfw: bool,

    /// Default language for prompts and reports.
    pub default_language: Language,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            http_timeout_seconds: 20.0,
            user_agent: "idhound/0.1 (+https://local)".to_string(),
            ai_api_key: None,
            ai_base_url: "https://api.deepseek.com".to_string(),
            ai_model: "deepseek-chat".to_string(),
            ai_fallback_model: None,
            ai_timeout_seconds: 45.0,
            ai_max_retries: 3,
            sites_max_concurrency: 30,
            sites_no_nsfw: true,
            default_language: Language::English,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = AppSettings::default();
        assert!((settings.http_timeout_seconds - 20.0).abs() < f64::EPSILON);
        assert_eq!(settings.ai_max_retries, 3);
        assert_eq!(settings.sites_max_concurrency, 30);
        assert!(settings.sites_no_nsfw);
        assert_eq!(settings.default_language, Language::English);
        assert!(settings.ai_api_key.is_none());
    }

    #[test]
    fn test_language_codes_and_labels() {
        assert_eq!(Language::English.code(), "en");
        assert_eq!(Language::Spanish.code(), "es");
        assert_eq!(Language::Spanish.label(), "Spanish");
        assert_eq!(Language::from_spanish_flag(true), Language::Spanish);
        assert_eq!(Language::from_spanish_flag(false), Language::English);
    }

    #[test]
    fn test_language_serde_uses_two_letter_codes() {
        assert_eq!(serde_json::to_string(&Language::Spanish).unwrap(), "\"es\"");
        let back: Language = serde_json::from_str("\"en\"").unwrap();
        assert_eq!(back, Language::English);
    }
}
