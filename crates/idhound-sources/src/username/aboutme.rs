//! about.me scanner.
//!
//! about.me pages answer 200 even for some placeholder content, so
//! existence additionally requires a parseable `<title>`. The page embeds a
//! JSON-LD fragment advertising the person's outbound social links
//! (`sameAs`); each advertised link is emitted as a derived profile so the
//! pipeline can correlate handles across networks.

use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::json;

use idhound::{build_client, AppSettings, Result, Scanner, SocialProfile};

const ABOUTME_BASE: &str = "https://about.me";

/// Multi-result scanner for about.me pages.
#[derive(Debug, Clone)]
pub struct AboutMeScanner {
    settings: AppSettings,
    base_url: String,
}

impl AboutMeScanner {
    /// Scanner against the public about.me host.
    #[must_use]
    pub fn new(settings: AppSettings) -> Self {
        Self {
            settings,
            base_url: ABOUTME_BASE.to_string(),
        }
    }

    /// Point the scanner at a different host (tests).
    #[must_use]
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.base_url = base.into();
        self
    }
}

fn meta_content(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn title_text(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn jsonld_string(html: &str, key: &str) -> Option<String> {
    let pattern = Regex::new(&format!(r#""{key}":"(.*?)""#)).ok()?;
    pattern
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|v| !v.is_empty())
}

fn jsonld_string_array(html: &str, key: &str) -> Vec<String> {
    let Ok(pattern) = Regex::new(&format!(r#""{key}":\s*\[(.*?)\]"#)) else {
        return Vec::new();
    };
    let Some(captures) = pattern.captures(html) else {
        return Vec::new();
    };
    let Ok(items) = Regex::new(r#""(.*?)""#) else {
        return Vec::new();
    };
    items
        .captures_iter(captures.get(1).map_or("", |m| m.as_str()))
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

#[async_trait]
impl Scanner for AboutMeScanner {
    fn network(&self) -> &'static str {
        "aboutme"
    }

    fn fallback_url(&self, value: &str) -> String {
        format!("{ABOUTME_BASE}/{value}")
    }

    async fn scan(&self, username: &str) -> Result<Vec<SocialProfile>> {
        let url = format!("{}/{}", self.base_url, username);
        let client = build_client(&self.settings, None)?;
        let response = client.get(&url).send().await?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();

        let mut profile = SocialProfile::new(final_url.clone(), username, self.network());
        profile.set_meta("status_code", status);
        profile.set_meta("final_url", &final_url);

        if status != 200 {
            return Ok(vec![profile]);
        }

        let html = response.text().await.unwrap_or_default();
        let document = Html::parse_document(&html);

        // A real profile page always has a title of the form
        // "First Last - City, State | about.me".
        let Some(title) = title_text(&document) else {
            return Ok(vec![profile]);
        };
        let who = title
            .replace("| about.me", "")
            .trim_matches(&[' ', '·', '-'][..])
            .to_string();
        let mut parts = who.splitn(2, " - ");
        let name = parts.next().unwrap_or_default().trim().to_string();
        let title_location = parts.next().map(|l| l.trim().to_string());

        if name.is_empty() {
            return Ok(vec![profile]);
        }

        profile.existe = true;
        profile.set_meta("name", &name);
        if let Some(bio) = meta_content(&document, r#"meta[property="og:description"]"#) {
            profile.set_meta("bio", &bio);
            profile.bio = Some(bio);
        }
        if let Some(avatar) = meta_content(&document, r#"meta[property="og:image"]"#) {
            profile.set_meta("avatar_url", &avatar);
            profile.imagen_url = Some(avatar);
        }

        let location = jsonld_string(&html, "address").or(title_location);
        if let Some(location) = location {
            profile.set_meta("location", location);
        }
        if let Some(job) = jsonld_string(&html, "jobTitle") {
            profile.set_meta("job_title", job);
        }
        let interests = jsonld_string_array(&html, "knowsAbout");
        if !interests.is_empty() {
            profile.set_meta("interests", interests);
        }

        let social_links = jsonld_string_array(&html, "sameAs");
        let mut profiles = Vec::with_capacity(1 + social_links.len());
        if !social_links.is_empty() {
            profile.set_meta("social_links", &social_links);
        }
        profiles.push(profile);

        for link in social_links {
            let handle = link.rsplit('/').next().unwrap_or_default().to_string();
            let mut derived = SocialProfile::new(&link, handle, "aboutme_social_link");
            derived.existe = true;
            derived.metadata.insert("source".into(), json!("aboutme"));
            derived
                .metadata
                .insert("from_username".into(), json!(username));
            profiles.push(derived);
        }

        Ok(profiles)
    }
}
