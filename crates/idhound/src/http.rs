//! HTTP client factory and lightweight HTML metadata extraction.
//!
//! Every probe in the pipeline goes through [`build_client`] so that all
//! sources behave the same: one timeout, one User-Agent, an HTML-preferred
//! Accept header, redirects followed. Clients are cheap to build and
//! short-lived; callers never share one across the site-list engine's pool.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

use crate::config::AppSettings;
use crate::domain::Metadata;
use crate::error::{Error, Result};

const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Build a short-lived client with the pipeline's uniform defaults.
///
/// `extra_headers` override the defaults on key collision.
pub fn build_client(settings: &AppSettings, extra_headers: Option<HeaderMap>) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&settings.user_agent)
            .map_err(|e| Error::transport(format!("invalid user agent: {e}")))?,
    );
    headers.insert(ACCEPT, HeaderValue::from_static(HTML_ACCEPT));
    if let Some(extra) = extra_headers {
        for (name, value) in &extra {
            headers.insert(name.clone(), value.clone());
        }
    }

    Client::builder()
        .timeout(Duration::from_secs_f64(settings.http_timeout_seconds))
        .redirect(Policy::limited(10))
        .default_headers(headers)
        .build()
        .map_err(|e| Error::transport(format!("failed to build HTTP client: {e}")))
}

/// Lightweight metadata extracted from an HTML page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlMetadata {
    /// `<title>` text, whitespace-collapsed.
    pub title: Option<String>,
    /// `meta[name=description]` content.
    pub meta_description: Option<String>,
    /// `meta[property=og:image]` content, absolutized against the base URL.
    pub og_image: Option<String>,
}

impl HtmlMetadata {
    /// True when nothing was extracted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.meta_description.is_none() && self.og_image.is_none()
    }

    /// Merge the extracted keys into a profile metadata bag.
    pub fn merge_into(&self, metadata: &mut Metadata) {
        if let Some(title) = &self.title {
            metadata.insert("title".into(), title.clone().into());
        }
        if let Some(description) = &self.meta_description {
            metadata.insert("meta_description".into(), description.clone().into());
        }
        if let Some(image) = &self.og_image {
            metadata.insert("og_image".into(), image.clone().into());
        }
    }
}

/// Extract `<title>`, meta description and og:image from an HTML document.
///
/// A relative og:image is resolved against `base_url` when one is given.
/// Empty or whitespace-only values are dropped.
#[must_use]
pub fn extract_html_metadata(html: &str, base_url: Option<&str>) -> HtmlMetadata {
    if html.is_empty() {
        return HtmlMetadata::default();
    }

    let document = Html::parse_document(html);

    let title = select_first(&document, "title").map(|el| {
        el.text()
            .collect::<Vec<_>>()
            .join(" ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    });
    let title = title.filter(|t| !t.is_empty());

    let meta_description = select_attr(&document, r#"meta[name="description"]"#, "content");

    let mut og_image = select_attr(&document, r#"meta[property="og:image"]"#, "content");
    if let (Some(image), Some(base)) = (&og_image, base_url) {
        if let Ok(base) = Url::parse(base) {
            if let Ok(absolute) = base.join(image) {
                og_image = Some(absolute.to_string());
            }
        }
    }

    HtmlMetadata {
        title,
        meta_description,
        og_image,
    }
}

fn select_first<'a>(document: &'a Html, selector: &str) -> Option<scraper::ElementRef<'a>> {
    let selector = Selector::parse(selector).ok()?;
    document.select(&selector).next()
}

fn select_attr(document: &Html, selector: &str, attr: &str) -> Option<String> {
    select_first(document, selector)
        .and_then(|el| el.value().attr(attr))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client_applies_settings() {
        let settings = AppSettings::default();
        assert!(build_client(&settings, None).is_ok());
    }

    #[test]
    fn test_build_client_accepts_extra_headers() {
        let settings = AppSettings::default();
        let mut extra = HeaderMap::new();
        extra.insert(ACCEPT, HeaderValue::from_static("application/json"));
        assert!(build_client(&settings, Some(extra)).is_ok());
    }

    #[test]
    fn test_extract_title_and_description() {
        let html = r#"
            <html><head>
                <title>  Octo   Cat </title>
                <meta name="description" content="A profile page">
            </head><body></body></html>
        "#;
        let meta = extract_html_metadata(html, None);
        assert_eq!(meta.title.as_deref(), Some("Octo Cat"));
        assert_eq!(meta.meta_description.as_deref(), Some("A profile page"));
        assert_eq!(meta.og_image, None);
    }

    #[test]
    fn test_extract_resolves_relative_og_image() {
        let html = r#"<html><head><meta property="og:image" content="/img/a.png"></head></html>"#;
        let meta = extract_html_metadata(html, Some("https://example.com/profile"));
        assert_eq!(meta.og_image.as_deref(), Some("https://example.com/img/a.png"));
    }

    #[test]
    fn test_extract_keeps_absolute_og_image() {
        let html =
            r#"<html><head><meta property="og:image" content="https://cdn.example/i.png"></head></html>"#;
        let meta = extract_html_metadata(html, Some("https://example.com/"));
        assert_eq!(meta.og_image.as_deref(), Some("https://cdn.example/i.png"));
    }

    #[test]
    fn test_extract_empty_html_is_empty() {
        assert!(extract_html_metadata("", None).is_empty());
        assert!(extract_html_metadata("<html><body><p>x</p></body></html>", None).is_empty());
    }

    #[test]
    fn test_merge_into_metadata() {
        let meta = HtmlMetadata {
            title: Some("T".into()),
            meta_description: Some("D".into()),
            og_image: None,
        };
        let mut bag = Metadata::new();
        meta.merge_into(&mut bag);
        assert_eq!(bag["title"], "T");
        assert_eq!(bag["meta_description"], "D");
        assert!(!bag.contains_key("og_image"));
    }
}
