//! Error taxonomy shared by every stage of the identity pipeline.
//!
//! Scanner-level failures are recovered locally into non-existent profiles,
//! so most of these variants never cross a public API boundary. The AI
//! analyst is the exception: its retry state machine dispatches on the
//! provider variants (`ProviderRateLimit`, `ProviderModelRejected`,
//! `TemplateResponse`) to pick the next transition.

use thiserror::Error;

/// Result alias used across the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure kinds produced by scanners, the site-list engine and the AI
/// analyst adapter.
#[derive(Debug, Error)]
pub enum Error {
    /// Network I/O, TLS handshake or DNS failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The configured deadline elapsed before a response arrived.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// A source answered with a status the caller considers fatal.
    #[error("unexpected HTTP status {code}: {message}")]
    HttpStatus {
        /// Status code returned by the source.
        code: u16,
        /// Short human-readable context.
        message: String,
    },

    /// Malformed HTML/JSON from a source or from the AI provider.
    #[error("parse error: {0}")]
    Parse(String),

    /// 429 from the AI provider.
    #[error("provider rate limited: {message}")]
    ProviderRateLimit {
        /// Provider error context.
        message: String,
        /// Numeric `Retry-After` header value, when the provider sent one.
        retry_after: Option<f64>,
    },

    /// 400/404 whose body carries model-not-found semantics.
    #[error("provider rejected model {model:?}: {message}")]
    ProviderModelRejected {
        /// Model identifier the provider refused.
        model: String,
        /// Provider error context.
        message: String,
    },

    /// Any other AI provider failure.
    #[error("provider error: {0}")]
    ProviderUnknown(String),

    /// The provider returned the example skeleton instead of grounded
    /// content.
    #[error("provider returned a template response")]
    TemplateResponse,

    /// A required setting is absent (e.g. AI key for a non-loopback host).
    #[error("missing configuration: {0}")]
    ConfigMissing(String),
}

impl Error {
    /// Transport-kind error from any displayable cause.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Timeout-kind error from any displayable cause.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout(message.into())
    }

    /// Parse-kind error from any displayable cause.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Status-kind error with context.
    pub fn http_status(code: u16, message: impl Into<String>) -> Self {
        Self::HttpStatus {
            code,
            message: message.into(),
        }
    }

    /// Short machine-readable tag for metadata `error` fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Timeout(_) => "timeout",
            Self::HttpStatus { .. } => "http_status",
            Self::Parse(_) => "parse",
            Self::ProviderRateLimit { .. } => "provider_rate_limit",
            Self::ProviderModelRejected { .. } => "provider_model_rejected",
            Self::ProviderUnknown(_) => "provider_unknown",
            Self::TemplateResponse => "template_response",
            Self::ConfigMissing(_) => "config_missing",
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
