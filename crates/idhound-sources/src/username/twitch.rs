//! Twitch scanner.
//!
//! Twitch renders channel pages client-side but ships og tags server-side;
//! the og:title doubles as the existence marker on a 200.

use async_trait::async_trait;
use scraper::{Html, Selector};

use idhound::{build_client, AppSettings, Result, Scanner, SocialProfile};

const TWITCH_BASE: &str = "https://www.twitch.tv";

/// Scanner for Twitch channels.
#[derive(Debug, Clone)]
pub struct TwitchScanner {
    settings: AppSettings,
    base_url: String,
}

impl TwitchScanner {
    /// Scanner against the public Twitch host.
    #[must_use]
    pub fn new(settings: AppSettings) -> Self {
        Self {
            settings,
            base_url: TWITCH_BASE.to_string(),
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

#[async_trait]
impl Scanner for TwitchScanner {
    fn network(&self) -> &'static str {
        "twitch"
    }

    fn fallback_url(&self, value: &str) -> String {
        format!("{TWITCH_BASE}/{value}")
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

        let Some(og_title) = meta_content(&document, r#"meta[property="og:title"]"#) else {
            return Ok(vec![profile]);
        };

        profile.existe = true;
        let name = og_title
            .replace("Twitch", "")
            .trim_matches(&[' ', '·', '-'][..])
            .to_string();
        if !name.is_empty() {
            profile.set_meta("name", name);
        }
        if let Some(description) = meta_content(&document, r#"meta[name="description"]"#) {
            profile.set_meta("description", description);
        }
        if let Some(avatar) = meta_content(&document, r#"meta[property="og:image"]"#) {
            profile.set_meta("avatar_url", avatar);
        }

        Ok(vec![profile])
    }
}
