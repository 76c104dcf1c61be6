//! Reddit scanner backed by the public JSON API.
//!
//! `about.json` supplies account metadata; `comments.json` supplies recent
//! comment bodies and the set of subreddits touched, which feed the
//! analyst's psychological/ideological evidence. Reddit blocks exotic
//! User-Agents, so the requests present a browser-compatible one.

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeSet;

use idhound::{build_client, AppSettings, Result, Scanner, SocialProfile};

const REDDIT_BASE: &str = "https://www.reddit.com";
const COMMENT_LIMIT: usize = 10;
const COMPAT_USER_AGENT: &str = "Mozilla/5.0 (compatible; idhound/1.0)";

#[derive(Debug, Deserialize)]
struct AboutResponse {
    data: AboutData,
}

#[derive(Debug, Deserialize)]
struct AboutData {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    created_utc: Option<f64>,
    #[serde(default)]
    subreddit: Option<AboutSubreddit>,
}

#[derive(Debug, Deserialize)]
struct AboutSubreddit {
    #[serde(default)]
    public_description: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    icon_img: Option<String>,
    #[serde(default)]
    subscribers: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<ListingChild>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    data: CommentData,
}

#[derive(Debug, Deserialize)]
struct CommentData {
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    subreddit: Option<String>,
    #[serde(default)]
    created_utc: Option<f64>,
    #[serde(default)]
    permalink: Option<String>,
}

/// Deep scanner for Reddit accounts.
#[derive(Debug, Clone)]
pub struct RedditScanner {
    settings: AppSettings,
    base_url: String,
}

impl RedditScanner {
    /// Scanner against the public Reddit JSON API.
    #[must_use]
    pub fn new(settings: AppSettings) -> Self {
        Self {
            settings,
            base_url: REDDIT_BASE.to_string(),
        }
    }

    /// Point the scanner at a different host (tests).
    #[must_use]
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.base_url = base.into();
        self
    }

    fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(COMPAT_USER_AGENT));
        headers
    }

    async fn fetch_about(&self, username: &str) -> Result<(u16, Option<AboutData>)> {
        let client = build_client(&self.settings, Some(Self::json_headers()))?;
        let url = format!("{}/user/{}/about.json", self.base_url, username);
        let response = client.get(&url).send().await?;
        let status = response.status().as_u16();
        if status != 200 {
            return Ok((status, None));
        }
        let about = response.json::<AboutResponse>().await?;
        Ok((status, Some(about.data)))
    }

    /// Recent comment evidence, best-effort (Reddit may answer 403/429).
    async fn fetch_recent_comments(&self, username: &str) -> Option<(Vec<serde_json::Value>, Vec<String>)> {
        let client = build_client(&self.settings, Some(Self::json_headers())).ok()?;
        let url = format!(
            "{}/user/{}/comments.json?limit={}",
            self.base_url, username, COMMENT_LIMIT
        );
        let response = client.get(&url).send().await.ok()?;
        if response.status().as_u16() != 200 {
            return None;
        }
        let listing = response.json::<Listing>().await.ok()?;

        let mut comments = Vec::new();
        let mut subreddits = BTreeSet::new();
        for child in listing.data.children {
            let comment = child.data;
            let Some(body) = comment.body.as_deref().map(str::trim).filter(|b| !b.is_empty())
            else {
                continue;
            };
            if let Some(sr) = comment.subreddit.as_deref().filter(|s| !s.is_empty()) {
                subreddits.insert(sr.to_string());
            }
            comments.push(json!({
                "body": body,
                "subreddit": comment.subreddit,
                "created_utc": comment.created_utc,
                "permalink": comment.permalink,
            }));
        }
        Some((comments, subreddits.into_iter().collect()))
    }
}

#[async_trait]
impl Scanner for RedditScanner {
    fn network(&self) -> &'static str {
        "reddit"
    }

    fn fallback_url(&self, value: &str) -> String {
        format!("{REDDIT_BASE}/user/{value}/")
    }

    async fn scan(&self, username: &str) -> Result<Vec<SocialProfile>> {
        let public_url = format!("{}/user/{}/", self.base_url, username);
        let mut profile = SocialProfile::new(public_url, username, self.network());
        profile.set_meta("source", "reddit_about_json");

        let (status, about) = self.fetch_about(username).await?;
        profile.set_meta("status_code", status);
        profile.set_meta(
            "final_url",
            format!("{}/user/{}/about.json", self.base_url, username),
        );

        let Some(about) = about else {
            return Ok(vec![profile]);
        };

        profile.existe = true;
        if let Some(name) = about.name.as_deref() {
            profile.set_meta("name", name);
        }
        if let Some(id) = about.id.as_deref() {
            profile.set_meta("id", id);
        }
        if let Some(created_utc) = about.created_utc {
            profile.set_meta("created_utc", created_utc);
            if let Some(created) = DateTime::from_timestamp(created_utc as i64, 0) {
                profile.set_meta("created_at", created.to_rfc3339());
            }
        }
        if let Some(subreddit) = &about.subreddit {
            if let Some(description) = subreddit
                .public_description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
            {
                profile.set_meta("public_description", description);
                profile.bio = Some(description.to_string());
            }
            if let Some(title) = subreddit.title.as_deref().filter(|t| !t.is_empty()) {
                profile.set_meta("title", title);
            }
            if let Some(icon) = subreddit.icon_img.as_deref().filter(|i| !i.is_empty()) {
                profile.set_meta("icon_img", icon);
                profile.imagen_url = Some(icon.to_string());
            }
            if let Some(subscribers) = subreddit.subscribers {
                profile.set_meta("subscribers", subscribers);
            }
        }

        if let Some((comments, subreddits)) = self.fetch_recent_comments(username).await {
            if !comments.is_empty() {
                profile.set_meta("comments", comments);
            }
            if !subreddits.is_empty() {
                profile.set_meta("subreddits", subreddits);
            }
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
    async fn test_existing_account_collects_about_and_comments() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user/spez/about.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {
                    "name": "spez",
                    "id": "1w72",
                    "created_utc": 1118030400.0,
                    "subreddit": {
                        "public_description": "Reddit CEO",
                        "title": "spez",
                        "icon_img": "https://styles.example/icon.png",
                        "subscribers": 900000
                    }
                }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/user/spez/comments.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {"children": [
                    {"data": {"body": "hello", "subreddit": "announcements",
                              "created_utc": 1714550000.0, "permalink": "/r/announcements/x"}},
                    {"data": {"body": "", "subreddit": "ignored"}},
                    {"data": {"body": "again", "subreddit": "announcements"}}
                ]}
            })))
            .mount(&server)
            .await;

        let scanner = RedditScanner::new(AppSettings::default()).with_base_url(server.uri());
        let profiles = scanner.scan("spez").await.unwrap();
        let profile = &profiles[0];
        assert!(profile.existe);
        assert_eq!(profile.bio.as_deref(), Some("Reddit CEO"));
        assert_eq!(
            profile.imagen_url.as_deref(),
            Some("https://styles.example/icon.png")
        );
        assert_eq!(profile.metadata["subscribers"], 900_000);
        assert_eq!(profile.metadata["comments"].as_array().unwrap().len(), 2);
        assert_eq!(
            profile.metadata["subreddits"],
            serde_json::json!(["announcements"])
        );
        assert!(profile.metadata["created_at"]
            .as_str()
            .unwrap()
            .starts_with("2005-06-06"));
    }

    #[tokio::test]
    async fn test_missing_account_is_nonexistent_with_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user/ghost/about.json"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let scanner = RedditScanner::new(AppSettings::default()).with_base_url(server.uri());
        let profiles = scanner.scan("ghost").await.unwrap();
        assert!(!profiles[0].existe);
        assert_eq!(profiles[0].metadata["status_code"], 404);
    }

    #[tokio::test]
    async fn test_comment_failures_do_not_erase_about_evidence() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user/quiet/about.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {"name": "quiet", "id": "abc", "created_utc": 1500000000.0}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/user/quiet/comments.json"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let scanner = RedditScanner::new(AppSettings::default()).with_base_url(server.uri());
        let profiles = scanner.scan("quiet").await.unwrap();
        assert!(profiles[0].existe);
        assert!(!profiles[0].metadata.contains_key("comments"));
    }
}
