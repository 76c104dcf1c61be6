//! GitHub scanner backed by the official JSON API.
//!
//! Uses the user endpoint for profile metadata and the public-events
//! endpoint for recent push-event commit messages, which give the analyst
//! timestamped activity evidence. The canonical profile URL stays the
//! public page, not the API endpoint.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::Deserialize;
use serde_json::{json, Value};

use idhound::{build_client, AppSettings, Result, Scanner, SocialProfile};

const GITHUB_API_BASE: &str = "https://api.github.com";
const GITHUB_WEB_BASE: &str = "https://github.com";
const MAX_COMMITS: usize = 20;

#[derive(Debug, Deserialize)]
struct GitHubUser {
    login: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    bio: Option<String>,
    #[serde(default)]
    company: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    blog: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    twitter_username: Option<String>,
    #[serde(default)]
    avatar_url: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    public_repos: Option<u64>,
    #[serde(default)]
    followers: Option<u64>,
    #[serde(default)]
    following: Option<u64>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubEvent {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    payload: Option<GitHubEventPayload>,
}

#[derive(Debug, Deserialize)]
struct GitHubEventPayload {
    #[serde(default)]
    commits: Vec<GitHubCommit>,
}

#[derive(Debug, Deserialize)]
struct GitHubCommit {
    #[serde(default)]
    message: Option<String>,
}

/// Deep scanner for GitHub user profiles.
#[derive(Debug, Clone)]
pub struct GitHubScanner {
    settings: AppSettings,
    api_base: String,
    web_base: String,
}

impl GitHubScanner {
    /// Scanner against the public GitHub API.
    #[must_use]
    pub fn new(settings: AppSettings) -> Self {
        Self {
            settings,
            api_base: GITHUB_API_BASE.to_string(),
            web_base: GITHUB_WEB_BASE.to_string(),
        }
    }

    /// Point the scanner at a different API host (tests).
    #[must_use]
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers
    }

    async fn fetch_user(&self, username: &str) -> Result<(u16, Option<GitHubUser>)> {
        let client = build_client(&self.settings, Some(Self::json_headers()))?;
        let url = format!("{}/users/{}", self.api_base, username);
        let response = client.get(&url).send().await?;
        let status = response.status().as_u16();
        if status != 200 {
            return Ok((status, None));
        }
        let user = response.json::<GitHubUser>().await?;
        Ok((status, Some(user)))
    }

    /// Recent push-event commit messages with event timestamps, best-effort.
    async fn fetch_recent_commits(&self, username: &str) -> Vec<Value> {
        let Ok(client) = build_client(&self.settings, Some(Self::json_headers())) else {
            return Vec::new();
        };
        let url = format!("{}/users/{}/events/public", self.api_base, username);
        let Ok(response) = client.get(&url).send().await else {
            return Vec::new();
        };
        if response.status().as_u16() != 200 {
            return Vec::new();
        }
        let Ok(events) = response.json::<Vec<GitHubEvent>>().await else {
            return Vec::new();
        };

        let mut commits = Vec::new();
        for event in events {
            if event.event_type != "PushEvent" {
                continue;
            }
            let Some(payload) = event.payload else {
                continue;
            };
            for commit in payload.commits {
                let Some(message) = commit.message.as_deref() else {
                    continue;
                };
                let message = message.trim();
                if message.is_empty() {
                    continue;
                }
                commits.push(json!({
                    "message": message,
                    "timestamp": event.created_at,
                }));
                if commits.len() >= MAX_COMMITS {
                    return commits;
                }
            }
        }
        commits
    }
}

#[async_trait]
impl Scanner for GitHubScanner {
    fn network(&self) -> &'static str {
        "github"
    }

    async fn scan(&self, username: &str) -> Result<Vec<SocialProfile>> {
        let public_url = format!("{}/{}", self.web_base, username);
        let mut profile = SocialProfile::new(public_url, username, self.network());
        profile.set_meta("source", "github_api");

        let (status, user) = self.fetch_user(username).await?;
        profile.set_meta("status_code", status);
        profile.set_meta("final_url", format!("{}/users/{}", self.api_base, username));

        let Some(user) = user else {
            return Ok(vec![profile]);
        };

        profile.existe = true;
        profile.set_meta("login", &user.login);
        let optional_strings = [
            ("name", &user.name),
            ("bio", &user.bio),
            ("company", &user.company),
            ("location", &user.location),
            ("blog", &user.blog),
            ("email", &user.email),
            ("twitter_username", &user.twitter_username),
            ("avatar_url", &user.avatar_url),
            ("html_url", &user.html_url),
            ("created_at", &user.created_at),
            ("updated_at", &user.updated_at),
        ];
        for (key, value) in optional_strings {
            if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                profile.set_meta(key, value);
            }
        }
        if let Some(repos) = user.public_repos {
            profile.set_meta("public_repos", repos);
        }
        if let Some(followers) = user.followers {
            profile.set_meta("followers", followers);
        }
        if let Some(following) = user.following {
            profile.set_meta("following", following);
        }

        profile.bio = user.bio.clone().filter(|b| !b.trim().is_empty());
        profile.imagen_url = user.avatar_url.clone();

        let commits = self.fetch_recent_commits(username).await;
        if !commits.is_empty() {
            profile.set_meta("commits", commits);
        }

        Ok(vec![profile])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn scanner_for(server: &MockServer) -> GitHubScanner {
        GitHubScanner::new(AppSettings::default()).with_api_base(server.uri())
    }

    #[tokio::test]
    async fn test_existing_user_copies_profile_signals() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/octocat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "login": "octocat",
                "name": "The Octocat",
                "bio": "B",
                "location": "San Francisco",
                "followers": 4000,
                "following": 9,
                "public_repos": 8,
                "avatar_url": "https://avatars.example/octocat.png",
                "created_at": "2011-01-25T18:44:36Z"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/octocat/events/public"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {
                    "type": "PushEvent",
                    "created_at": "2024-05-01T10:00:00Z",
                    "payload": {"commits": [{"message": "fix parser"}, {"message": "  "}]}
                },
                {"type": "WatchEvent", "created_at": "2024-05-02T10:00:00Z"}
            ])))
            .mount(&server)
            .await;

        let profiles = scanner_for(&server).await.scan("octocat").await.unwrap();
        assert_eq!(profiles.len(), 1);
        let profile = &profiles[0];
        assert!(profile.existe);
        assert_eq!(profile.network_name, "github");
        assert_eq!(profile.url, "https://github.com/octocat");
        assert_eq!(profile.bio.as_deref(), Some("B"));
        assert_eq!(
            profile.imagen_url.as_deref(),
            Some("https://avatars.example/octocat.png")
        );
        assert_eq!(profile.metadata["followers"], 4000);
        let commits = profile.metadata["commits"].as_array().unwrap();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0]["message"], "fix parser");
    }

    #[tokio::test]
    async fn test_missing_user_records_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/ghost"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let profiles = scanner_for(&server).await.scan("ghost").await.unwrap();
        let profile = &profiles[0];
        assert!(!profile.existe);
        assert_eq!(profile.metadata["status_code"], 404);
        assert!(profile.metadata.contains_key("final_url"));
    }

    #[tokio::test]
    async fn test_commit_cap_is_enforced() {
        let server = MockServer::start().await;
        let commits: Vec<_> = (0..30)
            .map(|i| serde_json::json!({"message": format!("commit {i}")}))
            .collect();
        Mock::given(method("GET"))
            .and(path("/users/busy"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"login": "busy"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/busy/events/public"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
                "type": "PushEvent",
                "created_at": "2024-05-01T10:00:00Z",
                "payload": {"commits": commits}
            }])))
            .mount(&server)
            .await;

        let profiles = scanner_for(&server).await.scan("busy").await.unwrap();
        let commits = profiles[0].metadata["commits"].as_array().unwrap();
        assert_eq!(commits.len(), 20);
    }
}
