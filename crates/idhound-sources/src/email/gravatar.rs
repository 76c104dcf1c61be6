//! Gravatar scanners (email-keyed).
//!
//! Gravatar requires the MD5 of the normalized (trimmed, lowercased)
//! address. Two probes compose: the avatar endpoint with `d=404` decides
//! existence cheaply, and the public profile JSON harvests display name,
//! about-me text, advertised URLs and the thumbnail.

use async_trait::async_trait;
use md5::{Digest, Md5};
use serde::Deserialize;

use idhound::{build_client, AppSettings, Result, Scanner, SocialProfile};

const GRAVATAR_BASE: &str = "https://www.gravatar.com";
const GRAVATAR_PROFILE_BASE: &str = "https://en.gravatar.com";

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn email_md5(email: &str) -> String {
    hex::encode(Md5::digest(email.as_bytes()))
}

/// Avatar-endpoint scanner: `d=404` turns a missing avatar into a 404.
#[derive(Debug, Clone)]
pub struct GravatarScanner {
    settings: AppSettings,
    base_url: String,
}

impl GravatarScanner {
    /// Scanner against the public Gravatar host.
    #[must_use]
    pub fn new(settings: AppSettings) -> Self {
        Self {
            settings,
            base_url: GRAVATAR_BASE.to_string(),
        }
    }

    /// Point the scanner at a different host (tests).
    #[must_use]
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.base_url = base.into();
        self
    }
}

#[async_trait]
impl Scanner for GravatarScanner {
    fn network(&self) -> &'static str {
        "gravatar"
    }

    fn fallback_url(&self, value: &str) -> String {
        format!("{GRAVATAR_BASE}/avatar/{}", email_md5(&normalize_email(value)))
    }

    async fn scan(&self, value: &str) -> Result<Vec<SocialProfile>> {
        let email = normalize_email(value);
        let digest = email_md5(&email);
        let avatar_url = format!("{}/avatar/{}?s=200&d=404", self.base_url, digest);

        let client = build_client(&self.settings, None)?;
        let response = client.get(&avatar_url).send().await?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();

        let mut profile = SocialProfile::new(final_url.clone(), &email, self.network());
        profile.existe = status == 200;
        profile.set_meta("status_code", status);
        profile.set_meta("final_url", &final_url);
        profile.set_meta("email_md5", &digest);
        profile.set_meta("normalized_email", &email);
        if profile.existe {
            profile.imagen_url = Some(final_url);
        }

        Ok(vec![profile])
    }
}

#[derive(Debug, Deserialize)]
struct GravatarProfilePayload {
    #[serde(default)]
    entry: Vec<GravatarEntry>,
}

#[derive(Debug, Deserialize)]
struct GravatarEntry {
    #[serde(default, rename = "aboutMe")]
    about_me: Option<String>,
    #[serde(default, rename = "thumbnailUrl")]
    thumbnail_url: Option<String>,
    #[serde(default, rename = "displayName")]
    display_name: Option<String>,
    #[serde(default, rename = "preferredUsername")]
    preferred_username: Option<String>,
    #[serde(default)]
    urls: Vec<serde_json::Value>,
}

/// Profile-JSON scanner: `/<md5>.json` exposes the public Gravatar profile.
#[derive(Debug, Clone)]
pub struct GravatarProfileScanner {
    settings: AppSettings,
    base_url: String,
}

impl GravatarProfileScanner {
    /// Scanner against the public Gravatar profile host.
    #[must_use]
    pub fn new(settings: AppSettings) -> Self {
        Self {
            settings,
            base_url: GRAVATAR_PROFILE_BASE.to_string(),
        }
    }

    /// Point the scanner at a different host (tests).
    #[must_use]
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.base_url = base.into();
        self
    }
}

#[async_trait]
impl Scanner for GravatarProfileScanner {
    fn network(&self) -> &'static str {
        "gravatar_profile"
    }

    fn fallback_url(&self, value: &str) -> String {
        format!(
            "{GRAVATAR_PROFILE_BASE}/{}.json",
            email_md5(&normalize_email(value))
        )
    }

    async fn scan(&self, value: &str) -> Result<Vec<SocialProfile>> {
        let email = normalize_email(value);
        let digest = email_md5(&email);
        let url = format!("{}/{}.json", self.base_url, digest);

        let client = build_client(&self.settings, None)?;
        let response = client.get(&url).send().await?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();

        let mut profile = SocialProfile::new(final_url.clone(), &email, self.network());
        profile.existe = status == 200;
        profile.set_meta("status_code", status);
        profile.set_meta("final_url", &final_url);
        profile.set_meta("email_md5", &digest);
        profile.set_meta("normalized_email", &email);

        if profile.existe {
            let body = response.text().await.unwrap_or_default();
            match serde_json::from_str::<GravatarProfilePayload>(&body) {
                Ok(payload) => {
                    if let Some(entry) = payload.entry.first() {
                        profile.bio = entry.about_me.clone().filter(|b| !b.trim().is_empty());
                        profile.imagen_url = entry.thumbnail_url.clone();
                        if let Some(display) = entry.display_name.as_deref() {
                            profile.set_meta("display_name", display);
                        }
                        if let Some(preferred) = entry.preferred_username.as_deref() {
                            profile.set_meta("preferred_username", preferred);
                        }
                        if !entry.urls.is_empty() {
                            profile.set_meta("urls", &entry.urls);
                        }
                    }
                }
                Err(err) => {
                    profile.set_meta("parse_error", err.to_string());
                }
            }
        }

        Ok(vec![profile])
    }
}
