//! `vinmerge-recon`: ERP, linkage and web-catalog product reconciliation.
//!
//! Pure engine crate: receives pre-loaded raw tables, returns the
//! deduplicated merged view plus revenue and validation reports.
//! No CLI or file IO dependencies.

pub mod checks;
pub mod clean;
pub mod config;
pub mod dedupe;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod merge;
pub mod model;
pub mod outliers;
pub mod revenue;

pub use config::ReconConfig;
pub use dedupe::{dedupe, KeyedSet};
pub use engine::{inspect, run};
pub use error::ReconError;
pub use merge::merge;
pub use model::{MergedProduct, RawTable, ReconInput, ReconResult, Source};
pub use revenue::compute_revenue;
