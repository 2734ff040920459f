//! Analytic core of a COVID-19 trends dashboard over a pre-aggregated
//! 2020–2022 per-country case table.
//!
//! The pipeline is a single synchronous pass per user interaction: load the
//! CSV once ([`CovidDataset::load`]), then for every filter change build a
//! fresh [`DashboardSnapshot`] with [`build_snapshot`]. The presentation
//! layer consumes the snapshot's plain `DataFrame`s and summary structs;
//! no rendering happens here.

pub mod aggregate;
pub mod analytics;
pub mod dataset;
pub mod enrich;
pub mod error;
pub mod filter;
pub mod schema;
pub mod snapshot;

pub use aggregate::KpiSummary;
pub use analytics::{GrowthSummary, ReboundVerdict};
pub use dataset::CovidDataset;
pub use error::DashboardError;
pub use filter::FilterSelection;
pub use snapshot::{build_snapshot, DashboardSnapshot};
