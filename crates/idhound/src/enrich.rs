//! Generic HTML enrichment for confirmed profiles.
//!
//! Fallback used when a scanner only verified existence (a 200) without
//! extracting a bio or avatar: fetch the public page once and harvest
//! `<title>`, the meta description and the og:image. Everything here is
//! best-effort; transport and parse failures are swallowed silently.

use futures::stream::{self, StreamExt};
use reqwest::Client;
use tracing::debug;

use crate::config::AppSettings;
use crate::domain::SocialProfile;
use crate::http::{build_client, extract_html_metadata, HtmlMetadata};

/// Enrich eligible profiles in place, with at most `max_concurrency`
/// requests in flight.
///
/// A profile is eligible when its source confirmed existence, it has
/// neither a bio nor an image yet, and its URL is http(s). Extracted keys
/// are merged into metadata unconditionally; `bio` and `imagen_url` are
/// only set when previously absent.
pub async fn enrich_profiles_from_html(
    profiles: &mut [SocialProfile],
    settings: &AppSettings,
    max_concurrency: usize,
) {
    let Ok(client) = build_client(settings, None) else {
        return;
    };

    let candidates: Vec<(usize, String)> = profiles
        .iter()
        .enumerate()
        .filter(|(_, p)| is_eligible(p))
        .map(|(idx, p)| (idx, p.url.clone()))
        .collect();
    if candidates.is_empty() {
        return;
    }
    debug!(candidates = candidates.len(), "enriching profiles from HTML");

    let harvested: Vec<(usize, HtmlMetadata)> = stream::iter(candidates)
        .map(|(idx, url)| {
            let client = client.clone();
            async move { fetch_metadata(&client, &url).await.map(|meta| (idx, meta)) }
        })
        .buffer_unordered(max_concurrency.max(1))
        .filter_map(|item| async move { item })
        .collect()
        .await;

    for (idx, meta) in harvested {
        let Some(profile) = profiles.get_mut(idx) else {
            continue;
        };
        meta.merge_into(&mut profile.metadata);
        if profile.bio.is_none() {
            if let Some(description) = meta.meta_description.as_deref() {
                let trimmed = description.trim();
                if !trimmed.is_empty() {
                    profile.bio = Some(trimmed.to_string());
                }
            }
        }
        if profile.imagen_url.is_none() {
            if let Some(image) = meta.og_image.as_deref() {
                let trimmed = image.trim();
                if !trimmed.is_empty() {
                    profile.imagen_url = Some(trimmed.to_string());
                }
            }
        }
    }
}

fn is_eligible(profile: &SocialProfile) -> bool {
    profile.existe
        && profile.bio.is_none()
        && profile.imagen_url.is_none()
        && (profile.url.starts_with("http://") || profile.url.starts_with("https://"))
}

async fn fetch_metadata(client: &Client, url: &str) -> Option<HtmlMetadata> {
    let response = client.get(url).send().await.ok()?;
    let status = response.status().as_u16();
    if !(200..400).contains(&status) {
        return None;
    }
    let final_url = response.url().to_string();
    let html = response.text().await.ok()?;
    let meta = extract_html_metadata(&html, Some(&final_url));
    if meta.is_empty() {
        None
    } else {
        Some(meta)
    }
}
