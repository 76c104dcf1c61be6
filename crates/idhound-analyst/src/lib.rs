//! # idhound-analyst
//!
//! The AI analyst adapter: shapes the aggregate's evidence into a bounded
//! payload, calls an OpenAI-compatible chat-completions endpoint, and
//! recovers from the provider's many failure modes — malformed JSON,
//! boilerplate template replies, rate limits, rejected models — before
//! falling back to a deterministic heuristic report.
//!
//! [`analyze_person`] never fails: every terminal condition degrades into
//! the heuristic report with a machine-readable reason in `raw.reason`.
//!
//! ## Example
//!
//! ```no_run
//! use idhound::{AppSettings, Language, PersonEntity};
//!
//! # async fn example() {
//! let settings = AppSettings {
//!     ai_api_key: Some("sk-...".into()),
//!     ..AppSettings::default()
//! };
//! let person = PersonEntity::new("octocat");
//! let report = idhound_analyst::analyze_person(&person, Language::English, &settings).await;
//! println!("confidence {}", report.confidence);
//! # }
//! ```

use std::time::Duration;

use chrono::Utc;
use rand::Rng as _;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use idhound::{AnalysisReport, AppSettings, Error, Language, Metadata, PersonEntity};

pub mod client;
pub mod extract;
pub mod heuristic;
pub mod payload;
pub mod prompts;

pub use client::{ChatClient, ChatMessage, Completion};
pub use extract::{
    clamp_confidence, extract_json_object, is_template_response, parse_envelope, sanitize_summary,
    ReportEnvelope,
};
pub use heuristic::{heuristic_report, HEURISTIC_MODEL};
pub use payload::{build_evidence_payload, EvidenceStats};
pub use prompts::{correction_message, system_prompt, PromptKind};

const TEMPERATURE: f32 = 0.2;
const MAX_TOKENS_SMALL_HOST: u32 = 1100;
const MAX_TOKENS_DEFAULT: u32 = 1800;
const CORRECTION_SLEEP: Duration = Duration::from_millis(500);
const BACKOFF_BASE: f64 = 1.25;
const JITTER_MAX: f64 = 0.35;

/// Hosts known to enforce tight token-per-minute budgets.
fn is_low_tpm_host(base_url: &str) -> bool {
    base_url.to_lowercase().contains("groq")
}

/// Model names signalling a small model (`8b`, `instant`).
fn is_small_model(model: &str) -> bool {
    let lowered = model.to_lowercase();
    lowered.contains("8b") || lowered.contains("instant")
}

fn prompt_kind_for(base_url: &str, model: &str) -> PromptKind {
    if is_low_tpm_host(base_url) && is_small_model(model) {
        PromptKind::Compact
    } else {
        PromptKind::Full
    }
}

fn max_tokens_for(base_url: &str) -> u32 {
    if is_low_tpm_host(base_url) {
        MAX_TOKENS_SMALL_HOST
    } else {
        MAX_TOKENS_DEFAULT
    }
}

fn is_loopback_base(base_url: &str) -> bool {
    Url::parse(base_url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .is_some_and(|host| {
            matches!(host.as_str(), "localhost" | "127.0.0.1" | "0.0.0.0")
        })
}

fn backoff_delay(attempt: u32, retry_after: Option<f64>) -> Duration {
    if let Some(seconds) = retry_after.filter(|s| *s >= 0.0) {
        return Duration::from_secs_f64(seconds);
    }
    let base = BACKOFF_BASE * 2f64.powi(attempt as i32);
    let jitter = rand::thread_rng().gen_range(0.0..JITTER_MAX);
    Duration::from_secs_f64(base + jitter)
}

fn raw_from_value(value: Value) -> Metadata {
    match value {
        Value::Object(map) => map,
        other => {
            let mut map = Metadata::new();
            map.insert("raw_text".into(), other);
            map
        }
    }
}

/// Analyse the aggregate and produce a report, falling back to the
/// deterministic heuristic when the provider path cannot deliver.
pub async fn analyze_person(
    person: &PersonEntity,
    language: Language,
    settings: &AppSettings,
) -> AnalysisReport {
    let mut clean = person.clone();
    clean.profiles.retain(|p| p.existe);

    let api_key = match settings.ai_api_key.as_deref().filter(|k| !k.is_empty()) {
        Some(key) => key.to_string(),
        None if is_loopback_base(&settings.ai_base_url) => "local".to_string(),
        None => {
            warn!("no AI API key configured for a non-loopback provider");
            return heuristic_report(&clean, language, "missing_ai_api_key");
        }
    };

    let client = match ChatClient::new(&settings.ai_base_url, api_key, settings.ai_timeout_seconds)
    {
        Ok(client) => client,
        Err(err) => {
            warn!(error = %err, "cannot build provider client");
            return heuristic_report(&clean, language, "provider_client_error");
        }
    };

    let (payload, stats) = build_evidence_payload(&clean);
    let payload_text = payload.to_string();

    let mut model = settings.ai_model.clone();
    let max_tokens = max_tokens_for(&settings.ai_base_url);
    let mut messages = vec![
        ChatMessage::system(system_prompt(
            language,
            prompt_kind_for(&settings.ai_base_url, &model),
        )),
        ChatMessage::user(payload_text),
    ];

    let mut fallback_taken = false;
    let mut last_error: Option<String> = None;
    let mut aborted = false;
    let mut attempt: u32 = 0;

    while attempt <= settings.ai_max_retries {
        debug!(attempt, model = %model, "requesting analysis");
        match client
            .complete(&model, &messages, TEMPERATURE, max_tokens)
            .await
        {
            Ok(completion) => {
                match interpret_completion(&completion, &stats) {
                    Ok(mut report) => {
                        report.model = Some(model);
                        return report;
                    }
                    Err(err) => {
                        last_error = Some(err.to_string());
                        if attempt >= settings.ai_max_retries {
                            break;
                        }
                        // Self-correction: keep the conversation and demand
                        // strictly valid, grounded JSON.
                        messages.push(ChatMessage::assistant(completion.content.clone()));
                        messages.push(ChatMessage::user(correction_message(language)));
                        tokio::time::sleep(CORRECTION_SLEEP).await;
                        attempt += 1;
                    }
                }
            }
            Err(Error::ProviderModelRejected { message, .. }) => {
                let fallback = settings.ai_fallback_model.as_deref().unwrap_or_default();
                if !fallback_taken && !fallback.is_empty() && fallback != model {
                    warn!(rejected = %model, fallback, "provider rejected model, switching");
                    model = fallback.to_string();
                    fallback_taken = true;
                    messages[0] = ChatMessage::system(system_prompt(
                        language,
                        prompt_kind_for(&settings.ai_base_url, &model),
                    ));
                    // Model fallback does not consume the retry budget.
                    continue;
                }
                last_error = Some(message);
                aborted = true;
                break;
            }
            Err(Error::ProviderRateLimit {
                message,
                retry_after,
            }) => {
                last_error = Some(message);
                if attempt >= settings.ai_max_retries {
                    break;
                }
                tokio::time::sleep(backoff_delay(attempt, retry_after)).await;
                attempt += 1;
            }
            Err(err @ (Error::Transport(_) | Error::Timeout(_))) => {
                last_error = Some(err.to_string());
                if attempt >= settings.ai_max_retries {
                    break;
                }
                tokio::time::sleep(backoff_delay(attempt, None)).await;
                attempt += 1;
            }
            Err(err @ Error::Parse(_)) => {
                // 0-byte or non-JSON provider bodies count against the budget.
                last_error = Some(err.to_string());
                if attempt >= settings.ai_max_retries {
                    break;
                }
                tokio::time::sleep(CORRECTION_SLEEP).await;
                attempt += 1;
            }
            Err(err) => {
                warn!(error = %err, "provider failure is not recoverable");
                last_error = Some(err.to_string());
                aborted = true;
                break;
            }
        }
    }

    let detail = last_error.unwrap_or_else(|| "unknown".to_string());
    let reason = if aborted {
        format!("provider_error:{detail}")
    } else {
        format!("retries_exhausted:{detail}")
    };
    warn!(%detail, "analysis fell back to the heuristic report");
    heuristic_report(&clean, language, &reason)
}

fn interpret_completion(
    completion: &Completion,
    stats: &payload::EvidenceStats,
) -> idhound::Result<AnalysisReport> {
    let json_text = extract_json_object(&completion.content)?;
    let envelope = parse_envelope(&json_text)?;
    if is_template_response(&envelope) {
        return Err(Error::TemplateResponse);
    }

    let summary = sanitize_summary(&envelope.summary);
    let confidence = clamp_confidence(
        envelope.confidence,
        stats.has_text_samples,
        stats.has_activity_timestamps,
        stats.profile_count,
    );

    Ok(AnalysisReport {
        summary,
        highlights: envelope.highlights,
        confidence,
        generated_at: Utc::now(),
        model: None,
        raw: raw_from_value(completion.raw.clone()),
    })
}
