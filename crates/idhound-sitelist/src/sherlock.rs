//! Runner for Sherlock-format site manifests.
//!
//! The manifest is a JSON object keyed by site name, each entry describing
//! how to probe one site (`url` with a `{}` placeholder) and how to read
//! the answer (`errorType`). The runner consumes a pre-loaded manifest;
//! fetching/caching it is a collaborator concern.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::debug;

use idhound::{build_client, AppSettings, SocialProfile};

/// Shared progress callback `(done, total, site_name)`.
pub type ProgressCallback = Arc<dyn Fn(usize, usize, &str) + Send + Sync>;

/// One manifest entry in the Sherlock data format.
#[derive(Debug, Clone, Deserialize)]
pub struct SherlockSite {
    /// Profile URL template with a `{}` placeholder.
    pub url: String,
    /// Alternative URL to probe instead of `url`.
    #[serde(default, rename = "urlProbe")]
    pub url_probe: Option<String>,
    /// How to decide existence: `status_code`, `message` or `response_url`.
    #[serde(rename = "errorType")]
    pub error_type: String,
    /// Non-existence marker(s) for `message` sites (string or array).
    #[serde(default, rename = "errorMsg")]
    pub error_msg: Option<Value>,
    /// Usernames not matching this pattern skip the site.
    #[serde(default, rename = "regexCheck")]
    pub regex_check: Option<String>,
    /// NSFW flag honoured by the engine filter.
    #[serde(default, rename = "isNSFW")]
    pub is_nsfw: bool,
}

impl SherlockSite {
    fn error_markers(&self) -> Vec<String> {
        match &self.error_msg {
            Some(Value::String(s)) => vec![s.clone()],
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    fn accepts(&self, username: &str) -> bool {
        match self.regex_check.as_deref() {
            Some(pattern) => Regex::new(pattern).map_or(true, |re| re.is_match(username)),
            None => true,
        }
    }
}

/// Parse a manifest object into named entries, honouring the NSFW filter.
///
/// The `$schema` entry and malformed values are skipped.
#[must_use]
pub fn manifest_sites(manifest: &Value, no_nsfw: bool) -> Vec<(String, SherlockSite)> {
    let Some(object) = manifest.as_object() else {
        return Vec::new();
    };
    object
        .iter()
        .filter(|(name, _)| name.as_str() != "$schema")
        .filter_map(|(name, value)| {
            serde_json::from_value::<SherlockSite>(value.clone())
                .ok()
                .map(|site| (name.clone(), site))
        })
        .filter(|(_, site)| !(no_nsfw && site.is_nsfw))
        .collect()
}

/// Count the checks `run_sherlock` would perform, for progress reporting.
#[must_use]
pub fn count_checks(usernames: &[String], manifest: &Value, no_nsfw: bool) -> usize {
    let sites = manifest_sites(manifest, no_nsfw);
    usernames
        .iter()
        .map(|username| sites.iter().filter(|(_, s)| s.accepts(username)).count())
        .sum()
}

async fn check_site(
    settings: AppSettings,
    site_name: String,
    site: SherlockSite,
    username: String,
) -> SocialProfile {
    let profile_url = site.url.replace("{}", &username);
    let probe_url = site
        .url_probe
        .as_deref()
        .map_or_else(|| profile_url.clone(), |p| p.replace("{}", &username));

    let mut profile = SocialProfile::new(&profile_url, &username, &site_name);
    profile.set_meta("source", "sherlock");

    let client = match build_client(&settings, None) {
        Ok(client) => client,
        Err(err) => {
            profile.set_meta("error", err.to_string());
            return profile;
        }
    };

    match client.get(&probe_url).send().await {
        Ok(response) => {
            let status = response.status().as_u16();
            let final_url = response.url().to_string();
            profile.set_meta("status_code", status);
            profile.set_meta("final_url", final_url);

            profile.existe = match site.error_type.as_str() {
                "status_code" | "response_url" => (200..300).contains(&status),
                "message" => {
                    let body = response.text().await.unwrap_or_default();
                    status == 200 && !site.error_markers().iter().any(|m| body.contains(m))
                }
                other => {
                    profile.set_meta("error", format!("unsupported errorType {other:?}"));
                    false
                }
            };
        }
        Err(err) => {
            profile.set_meta("error", err.to_string());
        }
    }
    profile
}

/// Probe every username against every manifest site.
pub async fn run_sherlock(
    usernames: &[String],
    manifest: &Value,
    settings: &AppSettings,
    max_concurrency: usize,
    no_nsfw: bool,
    progress: Option<ProgressCallback>,
) -> Vec<SocialProfile> {
    let sites = manifest_sites(manifest, no_nsfw);
    let total = usernames
        .iter()
        .map(|username| sites.iter().filter(|(_, s)| s.accepts(username)).count())
        .sum::<usize>();
    debug!(sites = sites.len(), total, "running sherlock manifest");

    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let done = Arc::new(AtomicUsize::new(0));

    let mut tasks = Vec::with_capacity(total);
    for username in usernames {
        for (site_name, site) in sites.iter().filter(|(_, s)| s.accepts(username)) {
            let semaphore = Arc::clone(&semaphore);
            let done = Arc::clone(&done);
            let progress = progress.clone();
            let settings = settings.clone();
            let site_name = site_name.clone();
            let site = site.clone();
            let username = username.clone();
            tasks.push(async move {
                let _permit = semaphore.acquire_owned().await;
                let profile = check_site(settings, site_name.clone(), site, username).await;
                if let Some(progress) = progress {
                    let finished = done.fetch_add(1, Ordering::SeqCst) + 1;
                    progress(finished, total, &site_name);
                }
                profile
            });
        }
    }
    join_all(tasks).await
}
