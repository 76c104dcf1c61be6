//! Pinterest scanner.
//!
//! Pinterest answers 200 with an interstitial for unknown handles; the
//! `data-test-id="profile-name"` node only renders on real profiles, so it
//! is the existence marker. The class names on the page are obfuscated and
//! unstable, the test ids are not.

use async_trait::async_trait;
use scraper::{Html, Selector};

use idhound::{build_client, AppSettings, Result, Scanner, SocialProfile};

const PINTEREST_BASE: &str = "https://www.pinterest.com";

/// Scanner for Pinterest profiles.
#[derive(Debug, Clone)]
pub struct PinterestScanner {
    settings: AppSettings,
    base_url: String,
}

impl PinterestScanner {
    /// Scanner against the public Pinterest host.
    #[must_use]
    pub fn new(settings: AppSettings) -> Self {
        Self {
            settings,
            base_url: PINTEREST_BASE.to_string(),
        }
    }

    /// Point the scanner at a different host (tests).
    #[must_use]
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.base_url = base.into();
        self
    }
}

fn select_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl Scanner for PinterestScanner {
    fn network(&self) -> &'static str {
        "pinterest"
    }

    fn fallback_url(&self, value: &str) -> String {
        format!("{PINTEREST_BASE}/{value}/")
    }

    async fn scan(&self, username: &str) -> Result<Vec<SocialProfile>> {
        let url = format!("{}/{}/", self.base_url, username);
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

        let Some(name) = select_text(&document, r#"div[data-test-id="profile-name"] div"#) else {
            return Ok(vec![profile]);
        };

        profile.existe = true;
        profile.set_meta("name", name);
        if let Some(description) =
            select_text(&document, r#"span[data-test-id="main-user-description-text"]"#)
        {
            profile.set_meta("description", description);
        }
        if let Some(website) =
            select_text(&document, r#"div[data-test-id="website-icon-and-url"] span"#)
        {
            profile.set_meta("other_websites", website);
        }

        Ok(vec![profile])
    }
}
