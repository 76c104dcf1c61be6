//! # idhound-pipeline
//!
//! The transitive-discovery orchestrator. Starting from seed identifiers it
//! fans every scanner out concurrently, extracts further identifiers from
//! the returned evidence, and iterates until no new identifier appears.
//! After the worklist closes it optionally runs the data-driven site-list
//! engine and a Sherlock-manifest sweep, deduplicates, applies the strict
//! filter, enriches confirmed profiles from their public HTML, and emits
//! the aggregate.
//!
//! The orchestrator has no failing exit path under ordinary operation: one
//! scanner's failure never aborts the pipeline — it becomes a non-existent
//! profile row carrying the error.
//!
//! ## Example
//!
//! ```no_run
//! use idhound::AppSettings;
//! use idhound_pipeline::{hunt, HuntRequest, PipelineHooks};
//!
//! # async fn example() {
//! let settings = AppSettings::default();
//! let scanners = idhound_sources::registry(&settings);
//! let request = HuntRequest {
//!     usernames: vec!["octocat".into()],
//!     ..HuntRequest::default()
//! };
//! let result = hunt(&settings, &request, &scanners, &PipelineHooks::default()).await;
//! println!("{} profiles", result.person.profiles.len());
//! # }
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, warn};

use idhound::{
    enrich_profiles_from_html, AppSettings, PersonEntity, Scanner, ScannerSet, SocialProfile,
};
use idhound_sitelist::{
    count_checks, load_email_sites, load_username_sites, run_email_sites, run_sherlock,
    run_username_sites,
};

mod extract;
mod strict;

pub use extract::extract_identifiers;
pub use strict::{apply_strict_filter, strict_keep};

/// Legacy placeholder host rewritten in returned profile URLs.
const LEGACY_URL_PLACEHOLDER: &str = "example.invalid/x/";
const LEGACY_URL_REPLACEMENT: &str = "x.com/";

const ENRICH_CONCURRENCY_CAP: usize = 20;

/// Configuration for the data-driven site-list stage.
#[derive(Debug, Clone, Default)]
pub struct SiteListOptions {
    /// Run the site-list engine after the worklist closes.
    pub enabled: bool,
    /// Username catalogue path (WhatsMyName format).
    pub username_path: Option<PathBuf>,
    /// Email catalogue path (email-data format).
    pub email_path: Option<PathBuf>,
    /// Override for the engine concurrency cap.
    pub max_concurrency: Option<usize>,
    /// Category whitelist; empty/none means no restriction.
    pub categories: Option<BTreeSet<String>>,
    /// Override for the NSFW filter.
    pub no_nsfw: Option<bool>,
}

/// Parameters controlling one hunt.
#[derive(Debug, Clone)]
pub struct HuntRequest {
    /// Seed usernames.
    pub usernames: Vec<String>,
    /// Seed email addresses.
    pub emails: Vec<String>,
    /// Also scan each email's local part as a username.
    pub scan_localpart: bool,
    /// Site-list stage configuration.
    pub site_lists: SiteListOptions,
    /// Run the Sherlock-manifest sweep.
    pub use_sherlock: bool,
    /// Apply the strict post-filter.
    pub strict: bool,
    /// Pre-loaded Sherlock manifest for the sweep.
    pub sherlock_manifest: Option<Value>,
}

impl Default for HuntRequest {
    fn default() -> Self {
        Self {
            usernames: Vec::new(),
            emails: Vec::new(),
            scan_localpart: true,
            site_lists: SiteListOptions::default(),
            use_sherlock: false,
            strict: false,
            sherlock_manifest: None,
        }
    }
}

/// Optional callbacks for UI layers (progress, warnings).
#[derive(Default)]
pub struct PipelineHooks {
    /// Invoked for user-visible degradations (missing catalogues, ...).
    pub warning: Option<Box<dyn Fn(&str) + Send + Sync>>,
    /// Invoked with the total check count before the Sherlock sweep.
    pub sherlock_start: Option<Box<dyn Fn(usize) + Send + Sync>>,
    /// Invoked per finished Sherlock check `(done, total, site)`.
    pub sherlock_progress: Option<idhound_sitelist::ProgressCallback>,
}

impl PipelineHooks {
    fn warn(&self, warnings: &mut Vec<String>, message: &str) {
        warnings.push(message.to_string());
        if let Some(hook) = &self.warning {
            hook(message);
        }
    }
}

/// Output of one pipeline invocation.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// The aggregate (profiles only; analysis is a separate stage).
    pub person: PersonEntity,
    /// All identifiers confirmed or discovered, sorted.
    pub usernames: Vec<String>,
    /// All email addresses confirmed or discovered, sorted.
    pub emails: Vec<String>,
    /// User-visible degradations encountered along the way.
    pub warnings: Vec<String>,
}

/// Generate a filesystem-friendly slug for report artefacts.
#[must_use]
pub fn sanitize_target_for_filename(value: &str) -> String {
    let cleaned: String = value
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_alphanumeric() || matches!(ch, '-' | '_' | '.') {
                ch
            } else if matches!(ch, '@' | '+') {
                '_'
            } else {
                '-'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches(&['-', '_'][..]).to_string();
    if cleaned.is_empty() {
        "target".to_string()
    } else {
        cleaned
    }
}

/// Remove duplicated profiles, keeping the first occurrence of each
/// `(network_name, username, url)` triple.
#[must_use]
pub fn dedupe_profiles(profiles: Vec<SocialProfile>) -> Vec<SocialProfile> {
    let mut seen = BTreeSet::new();
    let mut deduped = Vec::with_capacity(profiles.len());
    for profile in profiles {
        if seen.insert(profile.identity_key()) {
            deduped.push(profile);
        }
    }
    deduped
}

fn rewrite_legacy_urls(profile: &mut SocialProfile) {
    if profile.url.contains(LEGACY_URL_PLACEHOLDER) {
        profile.url = profile
            .url
            .replace(LEGACY_URL_PLACEHOLDER, LEGACY_URL_REPLACEMENT);
    }
}

/// Run one scanner, recovering any failure into a non-existent profile.
async fn safe_scan(
    scanner: &Arc<dyn Scanner>,
    value: &str,
    derived_from: Option<&str>,
) -> Vec<SocialProfile> {
    let mut profiles = match scanner.scan(value).await {
        Ok(profiles) => profiles,
        Err(err) => {
            debug!(network = scanner.network(), value, error = %err, "scanner failed");
            let mut fallback =
                SocialProfile::new(scanner.fallback_url(value), value, scanner.network());
            fallback.set_meta("error", err.to_string());
            fallback.set_meta("scanner", scanner.network());
            vec![fallback]
        }
    };

    for profile in &mut profiles {
        if let Some(origin) = derived_from {
            profile.set_meta("derived_from", origin);
        }
        rewrite_legacy_urls(profile);
    }
    profiles
}

fn resolve_catalogue_path(configured: Option<&Path>) -> Option<PathBuf> {
    let configured = configured?;
    if configured.exists() {
        return Some(configured.to_path_buf());
    }
    // Fallback resolution: common dataset locations by file name.
    let name = configured.file_name()?;
    for candidate in [Path::new("data").join(name), PathBuf::from(name)] {
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

/// Run the full discovery pipeline for one request.
pub async fn hunt(
    settings: &AppSettings,
    request: &HuntRequest,
    scanners: &ScannerSet,
    hooks: &PipelineHooks,
) -> PipelineResult {
    let mut warnings = Vec::new();

    let seed_usernames: BTreeSet<String> = request
        .usernames
        .iter()
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .collect();
    let seed_emails: BTreeSet<String> = request
        .emails
        .iter()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    let mut profiles: Vec<SocialProfile> = Vec::new();
    let mut all_usernames = seed_usernames;
    let mut all_emails = seed_emails;
    let mut scanned_usernames: BTreeSet<String> = BTreeSet::new();
    let mut scanned_emails: BTreeSet<String> = BTreeSet::new();

    loop {
        let new_usernames: Vec<String> = all_usernames
            .difference(&scanned_usernames)
            .cloned()
            .collect();
        let new_emails: Vec<String> = all_emails.difference(&scanned_emails).cloned().collect();
        if new_usernames.is_empty() && new_emails.is_empty() {
            break;
        }
        debug!(
            usernames = new_usernames.len(),
            emails = new_emails.len(),
            "worklist iteration"
        );

        if !new_usernames.is_empty() {
            let tasks = new_usernames.iter().flat_map(|username| {
                scanners
                    .username
                    .iter()
                    .map(move |scanner| safe_scan(scanner, username, None))
            });
            for result in join_all(tasks).await {
                profiles.extend(result);
            }
            scanned_usernames.extend(new_usernames.iter().cloned());
        }

        if !new_emails.is_empty() {
            let tasks = new_emails.iter().flat_map(|email| {
                scanners
                    .email
                    .iter()
                    .map(move |scanner| safe_scan(scanner, email, None))
            });
            for result in join_all(tasks).await {
                profiles.extend(result);
            }
            scanned_emails.extend(new_emails.iter().cloned());

            if request.scan_localpart {
                let localparts: Vec<String> = new_emails
                    .iter()
                    .filter_map(|email| email.split('@').next())
                    .filter(|lp| !lp.is_empty())
                    .map(str::to_string)
                    .collect();
                let tasks = localparts.iter().flat_map(|localpart| {
                    scanners
                        .username
                        .iter()
                        .map(move |scanner| safe_scan(scanner, localpart, Some("email_localpart")))
                });
                for result in join_all(tasks).await {
                    profiles.extend(result);
                }
                // Localparts were already fanned out above; marking them
                // scanned keeps the next iteration from repeating them.
                all_usernames.extend(localparts.iter().cloned());
                scanned_usernames.extend(localparts);
            }
        }

        let (extra_usernames, extra_emails) = extract_identifiers(&profiles);
        all_usernames.extend(extra_usernames);
        all_emails.extend(extra_emails);
    }

    let mut usernames: Vec<String> = all_usernames.iter().cloned().collect();
    let mut emails: Vec<String> = all_emails.iter().cloned().collect();

    let max_concurrency = request
        .site_lists
        .max_concurrency
        .unwrap_or(settings.sites_max_concurrency);
    let no_nsfw = request
        .site_lists
        .no_nsfw
        .unwrap_or(settings.sites_no_nsfw);

    if request.site_lists.enabled {
        if !usernames.is_empty() {
            match resolve_catalogue_path(request.site_lists.username_path.as_deref()) {
                Some(path) => match load_username_sites(&path) {
                    Ok(catalogue) => {
                        profiles.extend(
                            run_username_sites(
                                &usernames,
                                &catalogue.sites,
                                settings,
                                max_concurrency,
                                request.site_lists.categories.as_ref(),
                                no_nsfw,
                            )
                            .await,
                        );
                    }
                    Err(err) => {
                        hooks.warn(
                            &mut warnings,
                            &format!("Username site-list unreadable: {err}"),
                        );
                    }
                },
                None => {
                    hooks.warn(
                        &mut warnings,
                        "Site-lists for usernames not configured (missing path).",
                    );
                }
            }
        }
        if !emails.is_empty() {
            match resolve_catalogue_path(request.site_lists.email_path.as_deref()) {
                Some(path) => match load_email_sites(&path) {
                    Ok(catalogue) => {
                        profiles.extend(
                            run_email_sites(
                                &emails,
                                &catalogue.sites,
                                settings,
                                max_concurrency,
                                request.site_lists.categories.as_ref(),
                                no_nsfw,
                            )
                            .await,
                        );
                    }
                    Err(err) => {
                        hooks.warn(&mut warnings, &format!("Email site-list unreadable: {err}"));
                    }
                },
                None => {
                    hooks.warn(
                        &mut warnings,
                        "Site-lists for emails not configured (missing path).",
                    );
                }
            }
        }
    }

    if request.use_sherlock && !usernames.is_empty() {
        match &request.sherlock_manifest {
            Some(manifest) => {
                let total = count_checks(&usernames, manifest, no_nsfw);
                if total > 0 {
                    if let Some(hook) = &hooks.sherlock_start {
                        hook(total);
                    }
                }
                let progress = if total > 0 {
                    hooks.sherlock_progress.clone()
                } else {
                    None
                };
                profiles.extend(
                    run_sherlock(
                        &usernames,
                        manifest,
                        settings,
                        max_concurrency,
                        no_nsfw,
                        progress,
                    )
                    .await,
                );
            }
            None => {
                hooks.warn(&mut warnings, "Sherlock manifest not provided.");
            }
        }
    }

    let mut profiles = dedupe_profiles(profiles);

    if request.strict && !usernames.is_empty() {
        let before = profiles.len();
        profiles = apply_strict_filter(profiles, &usernames);
        debug!(before, after = profiles.len(), "strict filter applied");
    }

    enrich_profiles_from_html(
        &mut profiles,
        settings,
        max_concurrency.min(ENRICH_CONCURRENCY_CAP),
    )
    .await;

    let (extra_usernames, extra_emails) = extract_identifiers(&profiles);
    let username_set: BTreeSet<String> =
        usernames.drain(..).chain(extra_usernames).collect();
    let email_set: BTreeSet<String> = emails.drain(..).chain(extra_emails).collect();
    let usernames: Vec<String> = username_set.into_iter().collect();
    let emails: Vec<String> = email_set.into_iter().collect();

    let mut target_parts = Vec::new();
    if !usernames.is_empty() {
        target_parts.push(usernames.join("/"));
    }
    if !emails.is_empty() {
        target_parts.push(emails.join("/"));
    }
    let target = if target_parts.is_empty() {
        "target".to_string()
    } else {
        target_parts.join("/")
    };

    if profiles.is_empty() && (!usernames.is_empty() || !emails.is_empty()) {
        warn!(target = %target, "pipeline produced no profile rows");
    }

    let person = PersonEntity {
        target,
        profiles,
        analysis: None,
    };

    PipelineResult {
        person,
        usernames,
        emails,
        warnings,
    }
}

/// Convenience wrapper: scan a single username with every default off.
pub async fn scan_username(
    settings: &AppSettings,
    username: &str,
    scanners: &ScannerSet,
    hooks: &PipelineHooks,
) -> PipelineResult {
    let request = HuntRequest {
        usernames: vec![username.to_string()],
        scan_localpart: false,
        ..HuntRequest::default()
    };
    hunt(settings, &request, scanners, hooks).await
}

/// Convenience wrapper: scan a single email address.
pub async fn scan_email(
    settings: &AppSettings,
    email: &str,
    scan_localpart: bool,
    scanners: &ScannerSet,
    hooks: &PipelineHooks,
) -> PipelineResult {
    let request = HuntRequest {
        emails: vec![email.to_string()],
        scan_localpart,
        ..HuntRequest::default()
    };
    hunt(settings, &request, scanners, hooks).await
}
