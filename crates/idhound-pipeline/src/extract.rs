//! Identifier extraction from profile evidence.
//!
//! Sources advertise further identities in their metadata (other emails,
//! other handles, personal sites). The worklist feeds these back in until
//! no new identifier appears.

use std::collections::BTreeSet;

use serde_json::Value;

use idhound::SocialProfile;

const EMAIL_KEYS: &[&str] = &["other_emails", "emails", "email"];
const USERNAME_KEYS: &[&str] = &["other_users", "usernames"];
const WEBSITE_KEYS: &[&str] = &["other_websites", "websites", "website"];

fn string_values<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::String(s) => out.push(s),
        Value::Array(items) => {
            for item in items {
                if let Value::String(s) = item {
                    out.push(s);
                }
            }
        }
        _ => {}
    }
}

/// Collect new usernames and emails advertised by `profiles`.
///
/// Emails must contain `@` and are lowercased; website values that are not
/// URLs are treated as handles (sources frequently put bare handles in
/// their "website" field).
#[must_use]
pub fn extract_identifiers(profiles: &[SocialProfile]) -> (BTreeSet<String>, BTreeSet<String>) {
    let mut usernames = BTreeSet::new();
    let mut emails = BTreeSet::new();

    for profile in profiles {
        let mut raw_emails = Vec::new();
        let mut raw_usernames = Vec::new();

        for key in EMAIL_KEYS {
            if let Some(value) = profile.metadata.get(*key) {
                string_values(value, &mut raw_emails);
            }
        }
        for key in USERNAME_KEYS {
            if let Some(value) = profile.metadata.get(*key) {
                string_values(value, &mut raw_usernames);
            }
        }
        for key in WEBSITE_KEYS {
            if let Some(value) = profile.metadata.get(*key) {
                let mut sites = Vec::new();
                string_values(value, &mut sites);
                for site in sites {
                    if !site.starts_with("http") {
                        raw_usernames.push(site);
                    }
                }
            }
        }

        for email in raw_emails {
            let cleaned = email.trim().to_lowercase();
            if !cleaned.is_empty() && cleaned.contains('@') {
                emails.insert(cleaned);
            }
        }
        for username in raw_usernames {
            let cleaned = username.trim();
            if !cleaned.is_empty() {
                usernames.insert(cleaned.to_string());
            }
        }
    }

    (usernames, emails)
}
