//! Strict post-filter for high-confidence output.
//!
//! Site-manifest checks (Sherlock-style) are the noisiest source in the
//! pipeline: parked domains, consent walls and login redirects all look
//! like a 200. Strict mode keeps a manifest-sourced profile only when the
//! probed username actually shows up in the evidence. Hand-written
//! scanners are trusted as-is (minus non-existent rows).

use idhound::SocialProfile;

const SHERLOCK_DENYLIST: &[&str] = &["avizo", "fanpop", "hubski"];

const SUSPICIOUS_URL_PARTS: &[&str] = &[
    "login",
    "sign_in",
    "consent",
    "privacy",
    "cookie",
    "redirect",
    "return_url=",
    "callbackurl=",
    "search?",
    "search/?",
    "vendor_not_found",
    "nastaveni-souhlasu",
];

/// Whether `profile` survives strict filtering for `username`.
#[must_use]
pub fn strict_keep(profile: &SocialProfile, username: &str) -> bool {
    if !profile.existe {
        return false;
    }

    if profile.meta_str("source") != Some("sherlock") {
        return true;
    }

    if SHERLOCK_DENYLIST.contains(&profile.network_name.as_str()) {
        return false;
    }

    let final_url = profile
        .meta_str("final_url")
        .unwrap_or(&profile.url)
        .to_lowercase();
    if SUSPICIOUS_URL_PARTS.iter().any(|p| final_url.contains(p)) {
        return false;
    }

    let username = username.to_lowercase();
    if final_url.contains(&username) {
        return true;
    }
    if profile
        .meta_str("title")
        .is_some_and(|t| t.to_lowercase().contains(&username))
    {
        return true;
    }
    profile
        .meta_str("meta_description")
        .is_some_and(|d| d.to_lowercase().contains(&username))
}

/// Keep profiles surviving strict filtering for at least one username.
#[must_use]
pub fn apply_strict_filter(
    profiles: Vec<SocialProfile>,
    usernames: &[String],
) -> Vec<SocialProfile> {
    profiles
        .into_iter()
        .filter(|profile| usernames.iter().any(|u| strict_keep(profile, u)))
        .collect()
}
