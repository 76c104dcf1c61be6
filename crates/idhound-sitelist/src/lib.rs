//! # idhound-sitelist
//!
//! Data-driven site checking: instead of one hand-written scanner per site,
//! hundreds of sites are described as JSON catalogue entries (WhatsMyName
//! style for usernames, email-data style for emails) or as a
//! Sherlock-format manifest, and evaluated by a generic bounded-concurrency
//! engine.
//!
//! ## Example
//!
//! ```no_run
//! use idhound::AppSettings;
//! use idhound_sitelist::{load_username_sites, run_username_sites};
//! use std::path::Path;
//!
//! # async fn example() -> idhound::Result<()> {
//! let settings = AppSettings::default();
//! let catalogue = load_username_sites(Path::new("wmn-data.json"))?;
//! let profiles = run_username_sites(
//!     &["alice".to_string()],
//!     &catalogue.sites,
//!     &settings,
//!     30,
//!     None,
//!     true,
//! )
//! .await;
//! println!("{} rows", profiles.len());
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod loader;
pub mod model;
pub mod ops;
pub mod sherlock;

pub use engine::{run_email_sites, run_username_sites};
pub use loader::{load_email_sites, load_username_sites};
pub use model::{EmailSite, EmailSitesFile, UsernameSite, UsernameSitesFile, ACCOUNT_PLACEHOLDER};
pub use ops::apply_input_operation;
pub use sherlock::{count_checks, manifest_sites, run_sherlock, ProgressCallback, SherlockSite};
