//! Catalogue file loading.
//!
//! Datasets are not bundled; callers point the pipeline at local JSON files
//! (e.g. a downloaded `wmn-data.json` or `email-data.json`).

use std::path::Path;

use idhound::{Error, Result};

use crate::model::{EmailSitesFile, UsernameSitesFile};

/// Load a username catalogue (`{"sites": [...]}`) from disk.
pub fn load_username_sites(path: &Path) -> Result<UsernameSitesFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| Error::parse(format!("cannot read {}: {e}", path.display())))?;
    serde_json::from_str(&raw)
        .map_err(|e| Error::parse(format!("invalid site list {}: {e}", path.display())))
}

/// Load an email catalogue (`{"sites": [...]}`) from disk.
pub fn load_email_sites(path: &Path) -> Result<EmailSitesFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| Error::parse(format!("cannot read {}: {e}", path.display())))?;
    serde_json::from_str(&raw)
        .map_err(|e| Error::parse(format!("invalid site list {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn test_load_username_catalogue() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"sites": [{{"name": "A", "uri_check": "https://a/{{account}}",
                 "e_code": 200, "e_string": "hi"}}]}}"#
        )
        .unwrap();
        let sites = load_username_sites(file.path()).unwrap();
        assert_eq!(sites.sites.len(), 1);
        assert_eq!(sites.sites[0].name, "A");
    }

    #[test]
    fn test_missing_file_is_parse_error() {
        let err = load_email_sites(Path::new("/nonexistent/email-data.json")).unwrap_err();
        assert_eq!(err.kind(), "parse");
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{not json").unwrap();
        assert!(load_username_sites(file.path()).is_err());
    }
}
