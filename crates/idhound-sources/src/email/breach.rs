//! Breach-check adapter against the public unified-search endpoint.
//!
//! The endpoint sits behind bot protection tuned to browser traffic, so the
//! request presents a realistic browser header set. The transport is an
//! injectable seam: deployments with a TLS-fingerprint-capable client can
//! supply one, and everything degrades to the standard factory client
//! otherwise. The adapter never fails the pipeline; every outcome becomes a
//! profile row.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use tracing::debug;

use idhound::{build_client, AppSettings, BreachEntry, BreachProfile, Result, Scanner, SocialProfile};

const HIBP_BASE: &str = "https://haveibeenpwned.com";
const SOURCE_TAG: &str = "haveibeenpwned_unifiedsearch";

/// Transport seam for the breach endpoint.
///
/// Returns the response status and, when the body is JSON, the parsed
/// value. Implementations must follow redirects and apply the caller's
/// headers verbatim.
#[async_trait]
pub trait BreachTransport: Send + Sync {
    /// Issue the GET and parse the body as JSON when possible.
    async fn get_json(&self, url: &str, headers: HeaderMap) -> Result<(u16, Option<Value>)>;
}

/// Default transport: the pipeline's standard client factory.
#[derive(Debug, Clone)]
pub struct PlainTransport {
    settings: AppSettings,
}

impl PlainTransport {
    /// Transport configured from the pipeline settings.
    #[must_use]
    pub fn new(settings: AppSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl BreachTransport for PlainTransport {
    async fn get_json(&self, url: &str, headers: HeaderMap) -> Result<(u16, Option<Value>)> {
        let client = build_client(&self.settings, Some(headers))?;
        let response = client.get(url).send().await?;
        let status = response.status().as_u16();
        let payload = if status == 200 {
            response.json::<Value>().await.ok()
        } else {
            None
        };
        Ok((status, payload))
    }
}

fn browser_headers() -> HeaderMap {
    // Header set mirroring a desktop Chromium-family browser; the endpoint
    // rejects obviously synthetic clients.
    let pairs: &[(&str, &str)] = &[
        ("accept", "*/*"),
        ("priority", "u=1, i"),
        ("referer", "https://haveibeenpwned.com/"),
        (
            "request-id",
            "|ab766925a29d41a7ade9eeeb057ee8e9.babb405ff61f4ee3",
        ),
        (
            "sec-ch-ua",
            "\"Not(A:Brand\";v=\"8\", \"Chromium\";v=\"144\", \"Microsoft Edge\";v=\"144\"",
        ),
        ("sec-ch-ua-mobile", "?0"),
        ("sec-ch-ua-platform", "\"Windows\""),
        ("sec-fetch-dest", "empty"),
        ("sec-fetch-mode", "cors"),
        ("sec-fetch-site", "same-origin"),
        (
            "traceparent",
            "00-ab766925a29d41a7ade9eeeb057ee8e9-babb405ff61f4ee3-01",
        ),
        (
            "user-agent",
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/144.0.0.0 Safari/537.36 Edg/144.0.0.0",
        ),
    ];

    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            headers.insert(name, value);
        }
    }
    headers
}

/// Email scanner reporting breach-index evidence as `hibp` profiles.
#[derive(Clone)]
pub struct HibpScanner {
    transport: Arc<dyn BreachTransport>,
    base_url: String,
}

impl HibpScanner {
    /// Scanner using the plain transport against the public endpoint.
    #[must_use]
    pub fn new(settings: AppSettings) -> Self {
        Self {
            transport: Arc::new(PlainTransport::new(settings)),
            base_url: HIBP_BASE.to_string(),
        }
    }

    /// Swap in a different transport (TLS-impersonating client, test stub).
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn BreachTransport>) -> Self {
        self.transport = transport;
        self
    }

    /// Point the scanner at a different host (tests).
    #[must_use]
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.base_url = base.into();
        self
    }

    fn parse_breaches(payload: &Value) -> Vec<BreachEntry> {
        let Some(raw) = payload.get("Breaches").and_then(Value::as_array) else {
            return Vec::new();
        };
        raw.iter()
            .filter_map(|entry| serde_json::from_value::<BreachEntry>(entry.clone()).ok())
            .collect()
    }
}

#[async_trait]
impl Scanner for HibpScanner {
    fn network(&self) -> &'static str {
        "hibp"
    }

    fn fallback_url(&self, value: &str) -> String {
        format!("{HIBP_BASE}/unifiedsearch/{value}")
    }

    async fn scan(&self, value: &str) -> Result<Vec<SocialProfile>> {
        let email = value.trim().to_lowercase();
        let url = format!("{}/unifiedsearch/{}", self.base_url, email);

        let mut profile = SocialProfile::new(&url, &email, self.network());
        profile.set_meta("source", SOURCE_TAG);

        let outcome = self.transport.get_json(&url, browser_headers()).await;
        match outcome {
            Ok((200, Some(payload))) if payload.is_object() => {
                let breaches = Self::parse_breaches(&payload);
                debug!(email = %email, count = breaches.len(), "breach index answered");
                profile.existe = true;
                profile.set_meta("status_code", 200);
                profile.set_meta("breach_count", breaches.len());
                profile.set_meta(
                    "breaches",
                    BreachProfile {
                        email: email.clone(),
                        breaches,
                    },
                );
            }
            Ok((status, _)) => {
                profile.set_meta("status_code", status);
                let error = if status == 0 {
                    "hibp_no_response".to_string()
                } else {
                    format!("hibp_http_{status}")
                };
                profile.set_meta("error", error);
            }
            Err(err) => {
                profile.set_meta("error", "hibp_request_failed");
                profile.set_meta("error_detail", err.to_string());
            }
        }

        Ok(vec![profile])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_breaches_parsed_into_profile() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/unifiedsearch/bob@example.com"))
            .and(header("sec-fetch-mode", "cors"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Breaches": [
                    {
                        "Title": "Twitter (200M)",
                        "Domain": "twitter.com",
                        "BreachDate": "2021-01-01",
                        "PwnCount": 211524284u64,
                        "Description": "scraped",
                        "DataClasses": ["Email addresses"]
                    },
                    {"NotABreach": true}
                ],
                "Pastes": null
            })))
            .mount(&server)
            .await;

        let scanner = HibpScanner::new(AppSettings::default()).with_base_url(server.uri());
        let profiles = scanner.scan("Bob@Example.com").await.unwrap();
        let profile = &profiles[0];
        assert!(profile.existe);
        assert_eq!(profile.network_name, "hibp");
        assert_eq!(profile.metadata["breach_count"], 1);
        assert_eq!(
            profile.metadata["breaches"]["breaches"][0]["title"],
            "Twitter (200M)"
        );
        assert_eq!(profile.metadata["source"], SOURCE_TAG);
    }

    #[tokio::test]
    async fn test_non_200_is_error_row() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/unifiedsearch/ghost@example.com"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let scanner = HibpScanner::new(AppSettings::default()).with_base_url(server.uri());
        let profiles = scanner.scan("ghost@example.com").await.unwrap();
        let profile = &profiles[0];
        assert!(!profile.existe);
        assert_eq!(profile.metadata["status_code"], 403);
        assert_eq!(profile.metadata["error"], "hibp_http_403");
    }

    #[tokio::test]
    async fn test_non_json_200_is_error_row() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/unifiedsearch/odd@example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<html>", "text/html"))
            .mount(&server)
            .await;

        let scanner = HibpScanner::new(AppSettings::default()).with_base_url(server.uri());
        let profiles = scanner.scan("odd@example.com").await.unwrap();
        assert!(!profiles[0].existe);
        assert_eq!(profiles[0].metadata["error"], "hibp_http_200");
    }
}
