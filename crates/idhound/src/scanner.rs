//! The scanner contract every OSINT source implements.
//!
//! A scanner is a single-source probe: it computes a deterministic URL from
//! an identifier, issues one (or a few) HTTP requests and reports a
//! normalized verdict. Scanners uniformly return a sequence of profiles so
//! that multi-result sources (an about-page advertising outbound social
//! links) compose with single-result ones without runtime variant checks.
//!
//! Scanners MUST NOT error for ordinary non-existence; they reserve `Err`
//! for transport-level failures, which the orchestrator recovers into
//! non-existent profiles carrying the error in metadata.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::SocialProfile;
use crate::error::Result;

/// Asynchronous single-source probe.
#[async_trait]
pub trait Scanner: Send + Sync {
    /// Short stable network key (`"github"`, `"gravatar"`, ...). Used as
    /// `network_name` on fallback profiles when a scan fails outright.
    fn network(&self) -> &'static str;

    /// URL recorded on a synthesized fallback profile when the scan failed
    /// before producing one.
    fn fallback_url(&self, value: &str) -> String {
        format!("https://{}.com/{}", self.network(), value)
    }

    /// Probe the source for `value` and return normalized verdicts.
    async fn scan(&self, value: &str) -> Result<Vec<SocialProfile>>;
}

/// The scanner catalogues the orchestrator fans out over.
#[derive(Clone, Default)]
pub struct ScannerSet {
    /// Scanners keyed by username/handle.
    pub username: Vec<Arc<dyn Scanner>>,
    /// Scanners keyed by email address.
    pub email: Vec<Arc<dyn Scanner>>,
}

impl ScannerSet {
    /// Empty set (useful for tests and partial pipelines).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for ScannerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScannerSet")
            .field(
                "username",
                &self
                    .username
                    .iter()
                    .map(|s| s.network())
                    .collect::<Vec<_>>(),
            )
            .field(
                "email",
                &self.email.iter().map(|s| s.network()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedScanner;

    #[async_trait]
    impl Scanner for FixedScanner {
        fn network(&self) -> &'static str {
            "fixed"
        }

        async fn scan(&self, value: &str) -> Result<Vec<SocialProfile>> {
            Ok(vec![SocialProfile::new(
                self.fallback_url(value),
                value,
                self.network(),
            )])
        }
    }

    #[tokio::test]
    async fn test_default_fallback_url() {
        let scanner = FixedScanner;
        assert_eq!(scanner.fallback_url("alice"), "https://fixed.com/alice");
        let profiles = scanner.scan("alice").await.unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].network_name, "fixed");
    }

    #[test]
    fn test_debug_lists_networks() {
        let set = ScannerSet {
            username: vec![Arc::new(FixedScanner)],
            email: vec![],
        };
        let rendered = format!("{set:?}");
        assert!(rendered.contains("fixed"));
    }
}
