//! PGP key-server scanners (email-keyed).
//!
//! Both key servers answer 200 whether or not the search matched, so
//! existence is decided by content: the "no results" marker must be absent.

use async_trait::async_trait;

use idhound::{build_client, AppSettings, Result, Scanner, SocialProfile};

const OPENPGP_BASE: &str = "https://keys.openpgp.org";
const UBUNTU_BASE: &str = "https://keyserver.ubuntu.com";

const OPENPGP_NOT_FOUND: &[&str] = &["No results", "No keys found", "No matching keys"];

/// Scanner for keys.openpgp.org email search.
#[derive(Debug, Clone)]
pub struct OpenPgpKeysScanner {
    settings: AppSettings,
    base_url: String,
}

impl OpenPgpKeysScanner {
    /// Scanner against the public keys.openpgp.org host.
    #[must_use]
    pub fn new(settings: AppSettings) -> Self {
        Self {
            settings,
            base_url: OPENPGP_BASE.to_string(),
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
impl Scanner for OpenPgpKeysScanner {
    fn network(&self) -> &'static str {
        "openpgp_keys"
    }

    fn fallback_url(&self, value: &str) -> String {
        format!("{OPENPGP_BASE}/search?q={}", urlencoding::encode(value))
    }

    async fn scan(&self, value: &str) -> Result<Vec<SocialProfile>> {
        let email = value.trim().to_lowercase();
        let url = format!("{}/search?q={}", self.base_url, urlencoding::encode(&email));

        let client = build_client(&self.settings, None)?;
        let response = client.get(&url).send().await?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response.text().await.unwrap_or_default();

        let found = status == 200 && !OPENPGP_NOT_FOUND.iter().any(|m| body.contains(m));

        let mut profile = SocialProfile::new(final_url.clone(), &email, self.network());
        profile.existe = found;
        profile.set_meta("status_code", status);
        profile.set_meta("final_url", final_url);
        profile.set_meta("heuristic", "content");

        Ok(vec![profile])
    }
}

/// Scanner for the Ubuntu HKP keyserver index search.
#[derive(Debug, Clone)]
pub struct UbuntuKeyserverScanner {
    settings: AppSettings,
    base_url: String,
}

impl UbuntuKeyserverScanner {
    /// Scanner against the public Ubuntu keyserver.
    #[must_use]
    pub fn new(settings: AppSettings) -> Self {
        Self {
            settings,
            base_url: UBUNTU_BASE.to_string(),
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
impl Scanner for UbuntuKeyserverScanner {
    fn network(&self) -> &'static str {
        "ubuntu_keyserver"
    }

    fn fallback_url(&self, value: &str) -> String {
        format!(
            "{UBUNTU_BASE}/pks/lookup?op=index&search={}",
            urlencoding::encode(value)
        )
    }

    async fn scan(&self, value: &str) -> Result<Vec<SocialProfile>> {
        let email = value.trim().to_lowercase();
        let url = format!(
            "{}/pks/lookup?op=index&search={}",
            self.base_url,
            urlencoding::encode(&email)
        );

        let client = build_client(&self.settings, None)?;
        let response = client.get(&url).send().await?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response.text().await.unwrap_or_default();

        let found = status == 200 && !body.contains("No results");

        let mut profile = SocialProfile::new(final_url.clone(), &email, self.network());
        profile.existe = found;
        profile.set_meta("status_code", status);
        profile.set_meta("final_url", final_url);
        profile.set_meta("heuristic", "content");

        Ok(vec![profile])
    }
}
