//! GitLab scanner.
//!
//! A plain status probe of the public profile; on a 200 the page `<title>`
//! carries the display name.

use async_trait::async_trait;
use scraper::{Html, Selector};

use idhound::{build_client, AppSettings, Result, Scanner, SocialProfile};

const GITLAB_BASE: &str = "https://gitlab.com";

/// Scanner for GitLab user profiles.
#[derive(Debug, Clone)]
pub struct GitLabScanner {
    settings: AppSettings,
    base_url: String,
}

impl GitLabScanner {
    /// Scanner against the public GitLab host.
    #[must_use]
    pub fn new(settings: AppSettings) -> Self {
        Self {
            settings,
            base_url: GITLAB_BASE.to_string(),
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
impl Scanner for GitLabScanner {
    fn network(&self) -> &'static str {
        "gitlab"
    }

    fn fallback_url(&self, value: &str) -> String {
        format!("{GITLAB_BASE}/{value}")
    }

    async fn scan(&self, username: &str) -> Result<Vec<SocialProfile>> {
        let url = format!("{}/{}", self.base_url, username);
        let client = build_client(&self.settings, None)?;
        let response = client.get(&url).send().await?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let server_header = response
            .headers()
            .get("server")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let mut profile = SocialProfile::new(final_url.clone(), username, self.network());
        profile.existe = status == 200;
        profile.set_meta("status_code", status);
        profile.set_meta("final_url", &final_url);
        if let Some(server) = server_header {
            profile.set_meta("server", server);
        }

        if profile.existe {
            let html = response.text().await.unwrap_or_default();
            let document = Html::parse_document(&html);
            let name = Selector::parse("title").ok().and_then(|sel| {
                document
                    .select(&sel)
                    .next()
                    .map(|el| el.text().collect::<String>())
            });
            if let Some(name) = name {
                let name = name
                    .replace("· GitLab", "")
                    .trim_matches(&[' ', '·', '-'][..])
                    .to_string();
                if !name.is_empty() {
                    profile.set_meta("name", name);
                }
            }
        }

        Ok(vec![profile])
    }
}
