//! Medium scanner.
//!
//! Medium answers 200 with a generic page for unknown handles, so the
//! og:title is the existence marker: a real profile renders
//! "<name> – Medium", the fallback renders just "Medium". Recent story
//! headings are harvested as light activity evidence.

use async_trait::async_trait;
use scraper::{Html, Selector};
use serde_json::json;

use idhound::{build_client, AppSettings, Result, Scanner, SocialProfile};

const MEDIUM_BASE: &str = "https://medium.com";

/// Scanner for Medium author pages.
#[derive(Debug, Clone)]
pub struct MediumScanner {
    settings: AppSettings,
    base_url: String,
}

impl MediumScanner {
    /// Scanner against the public Medium host.
    #[must_use]
    pub fn new(settings: AppSettings) -> Self {
        Self {
            settings,
            base_url: MEDIUM_BASE.to_string(),
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

fn heading_texts(document: &Html, tag: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(tag) else {
        return Vec::new();
    };
    document
        .select(&selector)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

#[async_trait]
impl Scanner for MediumScanner {
    fn network(&self) -> &'static str {
        "medium"
    }

    fn fallback_url(&self, value: &str) -> String {
        format!("{MEDIUM_BASE}/@{value}")
    }

    async fn scan(&self, username: &str) -> Result<Vec<SocialProfile>> {
        let url = format!("{}/@{}", self.base_url, username);
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

        let og_title = meta_content(&document, r#"meta[property="og:title"]"#);
        let name = og_title
            .filter(|t| t != "Medium")
            .map(|t| t.replace("– Medium", "").trim().to_string());
        let Some(name) = name.filter(|n| !n.is_empty()) else {
            return Ok(vec![profile]);
        };

        profile.existe = true;
        profile.set_meta("name", &name);
        if let Some(description) = meta_content(&document, r#"meta[name="description"]"#) {
            profile.set_meta("description", description);
        }
        if let Some(avatar) = meta_content(&document, r#"meta[property="og:image"]"#) {
            profile.set_meta("avatar_url", avatar);
        }

        let titles = heading_texts(&document, "h2");
        let snippets = heading_texts(&document, "h3");
        let posts: Vec<_> = titles
            .iter()
            .zip(snippets.iter())
            .map(|(title, content)| json!({"title": title, "content": content}))
            .collect();
        if !posts.is_empty() {
            profile.set_meta("recent_posts", posts);
        }

        Ok(vec![profile])
    }
}
