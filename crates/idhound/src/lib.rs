//! # idhound
//!
//! Core building blocks of the idhound identity-correlation engine: the
//! domain model, the error taxonomy, pipeline settings, the uniform HTTP
//! client factory, the scanner contract and the generic HTML enricher.
//!
//! The crates layered on top supply the concrete probes and orchestration:
//!
//! - `idhound-sources` — hand-written per-source scanners and the
//!   breach-check adapter
//! - `idhound-sitelist` — the data-driven site-list engine and the
//!   Sherlock-manifest runner
//! - `idhound-analyst` — the AI analyst adapter and its heuristic fallback
//! - `idhound-pipeline` — the transitive-discovery orchestrator
//!
//! ## Example
//!
//! ```no_run
//! use idhound::{Scanner, SocialProfile};
//! use async_trait::async_trait;
//!
//! struct ExampleScanner;
//!
//! #[async_trait]
//! impl Scanner for ExampleScanner {
//!     fn network(&self) -> &'static str {
//!         "example"
//!     }
//!
//!     async fn scan(&self, value: &str) -> idhound::Result<Vec<SocialProfile>> {
//!         let mut profile =
//!             SocialProfile::new(format!("https://example.com/{value}"), value, "example");
//!         profile.existe = true;
//!         Ok(vec![profile])
//!     }
//! }
//! ```

pub mod config;
pub mod domain;
pub mod enrich;
pub mod error;
pub mod http;
pub mod scanner;

pub use config::{AppSettings, Language};
pub use domain::{
    AnalysisReport, BreachEntry, BreachProfile, Metadata, PersonEntity, SocialProfile,
};
pub use enrich::enrich_profiles_from_html;
pub use error::{Error, Result};
pub use http::{build_client, extract_html_metadata, HtmlMetadata};
pub use scanner::{Scanner, ScannerSet};
