//! Status-probe scanners.
//!
//! These sources answer 404 (or an equivalent non-200) for unknown handles,
//! so one GET and the status code decide existence. Each scanner keeps its
//! own type so registries, fallbacks and future per-source extraction stay
//! independent; the probe itself is shared.

use async_trait::async_trait;

use idhound::{build_client, AppSettings, Result, Scanner, SocialProfile};

async fn probe_status(
    settings: &AppSettings,
    url: &str,
    value: &str,
    network: &'static str,
) -> Result<Vec<SocialProfile>> {
    let client = build_client(settings, None)?;
    let response = client.get(url).send().await?;
    let status = response.status().as_u16();
    let final_url = response.url().to_string();

    let mut profile = SocialProfile::new(final_url.clone(), value, network);
    profile.existe = status == 200;
    profile.set_meta("status_code", status);
    profile.set_meta("final_url", final_url);
    Ok(vec![profile])
}

macro_rules! status_probe_scanner {
    ($(#[$doc:meta])* $name:ident, $network:literal, $default_base:literal, $pattern:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name {
            settings: AppSettings,
            base_url: String,
        }

        impl $name {
            /// Scanner against the public host.
            #[must_use]
            pub fn new(settings: AppSettings) -> Self {
                Self {
                    settings,
                    base_url: $default_base.to_string(),
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
        impl Scanner for $name {
            fn network(&self) -> &'static str {
                $network
            }

            fn fallback_url(&self, value: &str) -> String {
                format!($pattern, $default_base, value)
            }

            async fn scan(&self, value: &str) -> Result<Vec<SocialProfile>> {
                let url = format!($pattern, self.base_url, value);
                probe_status(&self.settings, &url, value, self.network()).await
            }
        }
    };
}

status_probe_scanner!(
    /// Scanner for GitHub Gist profiles.
    GitHubGistScanner, "github_gist", "https://gist.github.com", "{}/{}"
);
status_probe_scanner!(
    /// Scanner for Keybase profiles.
    KeybaseScanner, "keybase", "https://keybase.io", "{}/{}"
);
status_probe_scanner!(
    /// Scanner for dev.to author pages.
    DevToScanner, "devto", "https://dev.to", "{}/{}"
);
status_probe_scanner!(
    /// Scanner for npm user pages.
    NpmScanner, "npm", "https://www.npmjs.com", "{}/~{}"
);
status_probe_scanner!(
    /// Scanner for Product Hunt profiles.
    ProductHuntScanner, "producthunt", "https://www.producthunt.com", "{}/@{}"
);
status_probe_scanner!(
    /// Scanner for SoundCloud profiles.
    SoundCloudScanner, "soundcloud", "https://soundcloud.com", "{}/{}"
);
status_probe_scanner!(
    /// Scanner for Kaggle profiles.
    KaggleScanner, "kaggle", "https://www.kaggle.com", "{}/{}"
);
status_probe_scanner!(
    /// Scanner for Dribbble profiles.
    DribbbleScanner, "dribbble", "https://dribbble.com", "{}/{}"
);
status_probe_scanner!(
    /// Scanner for Behance profiles.
    BehanceScanner, "behance", "https://www.behance.net", "{}/{}"
);
status_probe_scanner!(
    /// Scanner for X (Twitter) profiles. X applies anti-bot measures, so
    /// this is a best-effort check.
    XScanner, "x", "https://x.com", "{}/{}"
);
