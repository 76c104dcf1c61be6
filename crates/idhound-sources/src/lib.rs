//! # idhound-sources
//!
//! Hand-written scanners for well-known sources, grouped by the identifier
//! kind they probe. Each scanner implements the [`Scanner`] contract from
//! the core crate: one deterministic URL per identifier, one verdict per
//! source, `status_code`/`final_url` always recorded, and no errors for
//! ordinary non-existence.
//!
//! [`registry`] assembles the default catalogues the orchestrator fans out
//! over; callers can freely build their own [`ScannerSet`] with a subset or
//! with test doubles.
//!
//! ## Example
//!
//! ```no_run
//! use idhound::AppSettings;
//!
//! let settings = AppSettings::default();
//! let scanners = idhound_sources::registry(&settings);
//! assert!(!scanners.username.is_empty());
//! assert!(!scanners.email.is_empty());
//! ```

use std::sync::Arc;

use idhound::{AppSettings, ScannerSet};

pub mod email;
pub mod username;

pub use email::{
    BreachTransport, GravatarProfileScanner, GravatarScanner, HibpScanner, OpenPgpKeysScanner,
    PlainTransport, UbuntuKeyserverScanner,
};
pub use username::{
    AboutMeScanner, BehanceScanner, DevToScanner, DribbbleScanner, GitHubGistScanner,
    GitHubScanner, GitLabScanner, KaggleScanner, KeybaseScanner, MediumScanner, NpmScanner,
    PinterestScanner, ProductHuntScanner, RedditScanner, SoundCloudScanner, TelegramScanner,
    TwitchScanner, XScanner,
};

/// Default scanner catalogues for the identity pipeline.
#[must_use]
pub fn registry(settings: &AppSettings) -> ScannerSet {
    let s = settings.clone();
    ScannerSet {
        username: vec![
            Arc::new(GitHubScanner::new(s.clone())),
            Arc::new(GitHubGistScanner::new(s.clone())),
            Arc::new(GitLabScanner::new(s.clone())),
            Arc::new(KeybaseScanner::new(s.clone())),
            Arc::new(DevToScanner::new(s.clone())),
            Arc::new(MediumScanner::new(s.clone())),
            Arc::new(NpmScanner::new(s.clone())),
            Arc::new(ProductHuntScanner::new(s.clone())),
            Arc::new(RedditScanner::new(s.clone())),
            Arc::new(TwitchScanner::new(s.clone())),
            Arc::new(TelegramScanner::new(s.clone())),
            Arc::new(AboutMeScanner::new(s.clone())),
            Arc::new(PinterestScanner::new(s.clone())),
            Arc::new(SoundCloudScanner::new(s.clone())),
            Arc::new(KaggleScanner::new(s.clone())),
            Arc::new(DribbbleScanner::new(s.clone())),
            Arc::new(BehanceScanner::new(s.clone())),
            Arc::new(XScanner::new(s.clone())),
        ],
        email: vec![
            Arc::new(GravatarScanner::new(s.clone())),
            Arc::new(GravatarProfileScanner::new(s.clone())),
            Arc::new(OpenPgpKeysScanner::new(s.clone())),
            Arc::new(UbuntuKeyserverScanner::new(s.clone())),
            Arc::new(HibpScanner::new(s)),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_rosters() {
        let set = registry(&AppSettings::default());
        assert_eq!(set.username.len(), 18);
        assert_eq!(set.email.len(), 5);

        let networks: Vec<_> = set.username.iter().map(|s| s.network()).collect();
        assert_eq!(networks[0], "github");
        assert!(networks.contains(&"aboutme"));
        assert!(networks.contains(&"x"));

        let email_networks: Vec<_> = set.email.iter().map(|s| s.network()).collect();
        assert_eq!(
            email_networks,
            vec![
                "gravatar",
                "gravatar_profile",
                "openpgp_keys",
                "ubuntu_keyserver",
                "hibp"
            ]
        );
    }
}
