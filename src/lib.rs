//! Filtering, derivation and aggregation engine for UK House Price Index data.
//!
//! ```text
//!  HPI .csv ──► loader ──► Dataset ──┬──► regions  (selectable region list)
//!                 ▲                  └──► filter   ──► FilteredView ──► metrics
//!               cache                                                     │
//!                                        presenter ◄── pipeline ◄─────────┘
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod filter;
pub mod loader;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod presenter;
pub mod regions;
pub mod utils;

pub use error::{DashboardError, LoadError};
pub use filter::{filter, filter_records};
pub use metrics::{Metric, MetricsSnapshot, compute_snapshot};
pub use models::{Dataset, DateRangeSelection, FilterCriteria, FilteredView, Record};
pub use pipeline::{Dashboard, Selection};
pub use regions::{RegionHierarchy, default_selection};
