//! Error types for the explorer core.
//!
//! Only structural load failures and empty selections surface as errors.
//! Per-row and per-field data problems are absorbed by the loader as `None`
//! values, and metrics that cannot be computed are `Metric` sentinels.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal failure to turn a source into a `Dataset`.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The source file could not be opened or stat'ed.
    #[error("could not open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV stream could not be read (header row or underlying I/O).
    #[error("could not read CSV data: {0}")]
    Read(#[from] csv::Error),

    /// A column the explorer cannot work without is absent from the header.
    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),
}

/// Outcome of a dashboard request that did not produce metrics.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Loading failed; the session cannot continue with this source.
    #[error("Error loading data: {0}")]
    Load(#[from] LoadError),

    /// The selection matched no rows. Recoverable: pick another selection.
    #[error("No data available for {region} in the selected time period.")]
    NoData { region: String },

    /// The chosen parent group has no selectable regions. Recoverable.
    #[error("No regions available under {parent}.")]
    NoRegions { parent: String },
}

impl DashboardError {
    /// Whether the session can carry on with a new selection.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DashboardError::NoData { .. } | DashboardError::NoRegions { .. })
    }
}

pub type LoadResult<T> = Result<T, LoadError>;
