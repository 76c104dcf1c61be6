//! Generic evaluation engine for catalogue entries.
//!
//! Schedules the Cartesian product of identifiers × sites through a bounded
//! semaphore. Each in-flight check builds its own short-lived client;
//! clients are never shared across the pool. Per-check failures are
//! recovered locally into non-existent profiles carrying the error.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::future::join_all;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::debug;

use idhound::{build_client, AppSettings, SocialProfile};

use crate::model::{EmailSite, UsernameSite, ACCOUNT_PLACEHOLDER};
use crate::ops::apply_input_operation;

const SOURCE_TAG: &str = "site_list";

fn category_allowed(cat: Option<&str>, categories: Option<&BTreeSet<String>>, no_nsfw: bool) -> bool {
    if no_nsfw && cat.is_some_and(|c| c.eq_ignore_ascii_case("nsfw")) {
        return false;
    }
    match categories {
        Some(allowed) if !allowed.is_empty() => {
            cat.is_some_and(|c| allowed.contains(&c.to_lowercase()))
        }
        _ => true,
    }
}

fn decide(status: u16, body: &str, e_code: u16, e_string: &str, m_code: Option<u16>, m_string: Option<&str>) -> bool {
    let negative = m_code.is_some_and(|c| c == status)
        || m_string.is_some_and(|s| !s.is_empty() && body.contains(s));
    if negative {
        return false;
    }
    status == e_code && body.contains(e_string)
}

fn base_profile(url: &str, identifier: &str, site_name: &str) -> SocialProfile {
    let mut profile = SocialProfile::new(url, identifier, site_name);
    profile.set_meta("source", SOURCE_TAG);
    profile
}

async fn check_username_site(
    settings: AppSettings,
    site: UsernameSite,
    username: String,
) -> SocialProfile {
    let url = site.uri_check.replace(ACCOUNT_PLACEHOLDER, &username);
    let mut profile = base_profile(&url, &username, &site.name);

    let client = match build_client(&settings, None) {
        Ok(client) => client,
        Err(err) => {
            profile.set_meta("error", err.to_string());
            return profile;
        }
    };

    match client.get(&url).send().await {
        Ok(response) => {
            let status = response.status().as_u16();
            let final_url = response.url().to_string();
            let body = response.text().await.unwrap_or_default();
            profile.existe = decide(
                status,
                &body,
                site.e_code,
                &site.e_string,
                site.m_code,
                site.m_string.as_deref(),
            );
            profile.set_meta("status_code", status);
            profile.set_meta("final_url", final_url);
        }
        Err(err) => {
            profile.set_meta("error", err.to_string());
        }
    }
    profile
}

async fn check_email_site(settings: AppSettings, site: EmailSite, email: String) -> SocialProfile {
    let identifier = apply_input_operation(&email, site.input_operation.as_deref());
    let url = site.uri_check.replace(ACCOUNT_PLACEHOLDER, &identifier);
    // Profile rows keep the raw email as the probed identifier even when the
    // request used a digest.
    let mut profile = base_profile(&url, &email, &site.name);

    let extra_headers = site.headers.as_ref().map(|headers| {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            let rendered = match value {
                Value::String(s) => s.replace(ACCOUNT_PLACEHOLDER, &identifier),
                other => other.to_string(),
            };
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(&rendered),
            ) {
                map.insert(name, value);
            }
        }
        map
    });

    let client = match build_client(&settings, extra_headers) {
        Ok(client) => client,
        Err(err) => {
            profile.set_meta("error", err.to_string());
            return profile;
        }
    };

    let request = if site.method.eq_ignore_ascii_case("post") {
        let body = site
            .data
            .as_deref()
            .unwrap_or_default()
            .replace(ACCOUNT_PLACEHOLDER, &identifier);
        client.post(&url).body(body)
    } else {
        client.get(&url)
    };

    match request.send().await {
        Ok(response) => {
            let status = response.status().as_u16();
            let final_url = response.url().to_string();
            let body = response.text().await.unwrap_or_default();
            profile.existe = decide(
                status,
                &body,
                site.e_code,
                &site.e_string,
                site.m_code,
                site.m_string.as_deref(),
            );
            profile.set_meta("status_code", status);
            profile.set_meta("final_url", final_url);
        }
        Err(err) => {
            profile.set_meta("error", err.to_string());
        }
    }
    profile
}

/// Evaluate every username against every (filtered) catalogue entry.
pub async fn run_username_sites(
    usernames: &[String],
    sites: &[UsernameSite],
    settings: &AppSettings,
    max_concurrency: usize,
    categories: Option<&BTreeSet<String>>,
    no_nsfw: bool,
) -> Vec<SocialProfile> {
    let sites: Vec<_> = sites
        .iter()
        .filter(|s| category_allowed(s.cat.as_deref(), categories, no_nsfw))
        .cloned()
        .collect();
    debug!(
        sites = sites.len(),
        usernames = usernames.len(),
        "running username site list"
    );

    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut tasks = Vec::with_capacity(usernames.len() * sites.len());
    for username in usernames {
        for site in &sites {
            let semaphore = Arc::clone(&semaphore);
            let settings = settings.clone();
            let site = site.clone();
            let username = username.clone();
            tasks.push(async move {
                let _permit = semaphore.acquire_owned().await;
                check_username_site(settings, site, username).await
            });
        }
    }
    join_all(tasks).await
}

/// Evaluate every email against every (filtered) catalogue entry.
pub async fn run_email_sites(
    emails: &[String],
    sites: &[EmailSite],
    settings: &AppSettings,
    max_concurrency: usize,
    categories: Option<&BTreeSet<String>>,
    no_nsfw: bool,
) -> Vec<SocialProfile> {
    let sites: Vec<_> = sites
        .iter()
        .filter(|s| category_allowed(s.cat.as_deref(), categories, no_nsfw))
        .cloned()
        .collect();
    debug!(
        sites = sites.len(),
        emails = emails.len(),
        "running email site list"
    );

    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut tasks = Vec::with_capacity(emails.len() * sites.len());
    for email in emails {
        for site in &sites {
            let semaphore = Arc::clone(&semaphore);
            let settings = settings.clone();
            let site = site.clone();
            let email = email.clone();
            tasks.push(async move {
                let _permit = semaphore.acquire_owned().await;
                check_email_site(settings, site, email).await
            });
        }
    }
    join_all(tasks).await
}
