//! Telegram scanner.
//!
//! `t.me/<username>` answers 200 for unknown handles too; the og:title of
//! that placeholder page starts with "Telegram: Contact @", which is the
//! non-existence marker.

use async_trait::async_trait;
use scraper::{Html, Selector};

use idhound::{build_client, AppSettings, Result, Scanner, SocialProfile};

const TELEGRAM_BASE: &str = "https://t.me";

/// Scanner for public Telegram usernames.
#[derive(Debug, Clone)]
pub struct TelegramScanner {
    settings: AppSettings,
    base_url: String,
}

impl TelegramScanner {
    /// Scanner against the public t.me host.
    #[must_use]
    pub fn new(settings: AppSettings) -> Self {
        Self {
            settings,
            base_url: TELEGRAM_BASE.to_string(),
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
impl Scanner for TelegramScanner {
    fn network(&self) -> &'static str {
        "telegram"
    }

    fn fallback_url(&self, value: &str) -> String {
        format!("{TELEGRAM_BASE}/{value}")
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

        let og_title = meta_content(&document, r#"meta[property="og:title"]"#).unwrap_or_default();
        if og_title.starts_with("Telegram: Contact @") {
            return Ok(vec![profile]);
        }

        profile.existe = true;
        let name = Selector::parse("div.tgme_page_title span")
            .ok()
            .and_then(|sel| {
                document
                    .select(&sel)
                    .next()
                    .map(|el| el.text().collect::<String>().trim().to_string())
            })
            .filter(|n| !n.is_empty());
        if let Some(name) = name {
            profile.set_meta("name", name);
        }
        if let Some(avatar) = meta_content(&document, r#"meta[property="og:image"]"#) {
            profile.set_meta("avatar_url", avatar);
        }

        Ok(vec![profile])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_known_channel_extracts_name_and_avatar() {
        let page = r#"<html><head>
            <meta property="og:title" content="Chad Fowler">
            <meta property="og:image" content="https://cdn.example/cf.jpg">
        </head><body>
            <div class="tgme_page_title"><span dir="auto">Chad Fowler</span></div>
        </body></html>"#;
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/chadfowler"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(page, "text/html"))
            .mount(&server)
            .await;

        let scanner = TelegramScanner::new(AppSettings::default()).with_base_url(server.uri());
        let profiles = scanner.scan("chadfowler").await.unwrap();
        assert!(profiles[0].existe);
        assert_eq!(profiles[0].metadata["name"], "Chad Fowler");
        assert_eq!(profiles[0].metadata["avatar_url"], "https://cdn.example/cf.jpg");
    }

    #[tokio::test]
    async fn test_contact_placeholder_means_nonexistent() {
        let page = r#"<html><head>
            <meta property="og:title" content="Telegram: Contact @ghosthandle">
        </head></html>"#;
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ghosthandle"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(page, "text/html"))
            .mount(&server)
            .await;

        let scanner = TelegramScanner::new(AppSettings::default()).with_base_url(server.uri());
        let profiles = scanner.scan("ghosthandle").await.unwrap();
        assert!(!profiles[0].existe);
    }
}
