//! Catalogue models for data-driven site checks.
//!
//! Instead of one scanner type per site, hundreds of sites are described as
//! JSON entries in the WhatsMyName / email-data style and evaluated by one
//! generic engine. The `{account}` placeholder in `uri_check` (and in POST
//! `data` templates) is substituted with the identifier under test.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Placeholder substituted with the identifier in URL and body templates.
pub const ACCOUNT_PLACEHOLDER: &str = "{account}";

/// One username-keyed site entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsernameSite {
    /// Unique site name within the catalogue; becomes `network_name`.
    pub name: String,
    /// URL template with the `{account}` placeholder.
    pub uri_check: String,
    /// Expected status on existence.
    pub e_code: u16,
    /// Expected body substring on existence.
    pub e_string: String,
    /// Body substring expected on non-existence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub m_string: Option<String>,
    /// Status expected on non-existence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub m_code: Option<u16>,
    /// Category tag; `nsfw` entries are filterable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cat: Option<String>,
}

/// One email-keyed site entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailSite {
    /// Unique site name within the catalogue; becomes `network_name`.
    pub name: String,
    /// URL template with the `{account}` placeholder.
    pub uri_check: String,
    /// HTTP method (`GET` or `POST`).
    #[serde(default = "default_method")]
    pub method: String,
    /// Body template for POST checks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    /// Extra request headers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, Value>>,
    /// Expected status on existence.
    pub e_code: u16,
    /// Expected body substring on existence.
    pub e_string: String,
    /// Body substring expected on non-existence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub m_string: Option<String>,
    /// Status expected on non-existence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub m_code: Option<u16>,
    /// Category tag; `nsfw` entries are filterable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cat: Option<String>,
    /// Identifier transform applied before substitution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_operation: Option<String>,
}

fn default_method() -> String {
    "GET".to_string()
}

/// Username catalogue file: `{"sites": [...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsernameSitesFile {
    /// Site entries.
    #[serde(default)]
    pub sites: Vec<UsernameSite>,
}

/// Email catalogue file: `{"sites": [...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailSitesFile {
    /// Site entries.
    #[serde(default)]
    pub sites: Vec<EmailSite>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_site_minimal_entry() {
        let site: UsernameSite = serde_json::from_value(serde_json::json!({
            "name": "ExampleHub",
            "uri_check": "https://examplehub.dev/{account}",
            "e_code": 200,
            "e_string": "profile-header"
        }))
        .unwrap();
        assert_eq!(site.name, "ExampleHub");
        assert!(site.m_code.is_none());
        assert!(site.cat.is_none());
    }

    #[test]
    fn test_email_site_defaults_to_get() {
        let site: EmailSite = serde_json::from_value(serde_json::json!({
            "name": "MailCheck",
            "uri_check": "https://mailcheck.dev/api?q={account}",
            "e_code": 200,
            "e_string": "found",
            "input_operation": "sha256"
        }))
        .unwrap();
        assert_eq!(site.method, "GET");
        assert_eq!(site.input_operation.as_deref(), Some("sha256"));
    }

    #[test]
    fn test_sites_file_tolerates_missing_list() {
        let file: UsernameSitesFile = serde_json::from_str("{}").unwrap();
        assert!(file.sites.is_empty());
    }
}
