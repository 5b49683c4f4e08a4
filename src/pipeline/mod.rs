//! Dashboard orchestrator: ties loader → filter → metrics → presenter together.
//!
//! ## Request cycle
//!
//! `run()` is one user interaction (region or date change):
//!   1. Load the dataset through the cache. A load failure is reported and ends the cycle.
//!   2. Resolve the region list for the chosen parent and pick the region.
//!   3. Filter. An empty view is reported as "no data" and ends the cycle; the
//!      dashboard stays usable for the next selection.
//!   4. Compute the snapshot, render metrics, breakdown and both time series.

use crate::cache::DatasetCache;
use crate::config::AppConfig;
use crate::error::{DashboardError, LoadResult};
use crate::filter::filter;
use crate::metrics::{DirectionRule, Metric, MetricsSnapshot, SeriesField, compute_snapshot};
use crate::models::{Dataset, DateRangeSelection, FilterCriteria};
use crate::presenter::Presenter;
use crate::regions::{RegionHierarchy, default_selection};
use crate::utils::{fmt_metric, fmt_month, fmt_pct, fmt_price};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// What the user picked. Anything left `None` falls back to the configured defaults.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub parent: Option<String>,
    pub region: Option<String>,
    pub range: DateRangeSelection,
}

/// Result of a successful request cycle.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub criteria: FilterCriteria,
    pub rows: usize,
    pub snapshot: MetricsSnapshot,
}

pub struct Dashboard {
    config: AppConfig,
    hierarchy: RegionHierarchy,
    cache: DatasetCache,
}

impl Dashboard {
    pub fn new(config: AppConfig) -> Self {
        let hierarchy = RegionHierarchy::from_config(&config.regions);
        Self {
            config,
            hierarchy,
            cache: DatasetCache::new(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn hierarchy(&self) -> &RegionHierarchy {
        &self.hierarchy
    }

    /// The configured dataset, loaded at most once per source version.
    pub fn dataset(&mut self) -> LoadResult<Arc<Dataset>> {
        self.cache.get_or_load(&self.config.data.path)
    }

    /// Drop cached data so the next request re-reads the source.
    pub fn invalidate(&mut self) {
        self.cache.invalidate();
    }

    pub fn parent_options(&self) -> Vec<String> {
        self.hierarchy.parent_options()
    }

    /// Parent to use when none was given.
    fn resolve_parent(&self, parent: Option<&str>) -> String {
        if let Some(parent) = parent {
            return parent.to_string();
        }
        if self.hierarchy.is_single_level() {
            return self.hierarchy.all_label().to_string();
        }
        default_selection(&self.parent_options(), &self.config.regions.default_parent)
            .unwrap_or_else(|| self.hierarchy.all_label().to_string())
    }

    /// Selectable regions under `parent` (or the default parent).
    pub fn region_options(&mut self, parent: Option<&str>) -> LoadResult<Vec<String>> {
        let dataset = self.dataset()?;
        let parent = self.resolve_parent(parent);
        Ok(self.hierarchy.child_regions_of(&parent, &dataset))
    }

    pub fn run(
        &mut self,
        selection: &Selection,
        presenter: &mut dyn Presenter,
    ) -> Result<DashboardSummary, DashboardError> {
        // ── 1. Load ───────────────────────────────────────────────────────────
        let dataset = match self.dataset() {
            Ok(ds) => ds,
            Err(e) => {
                presenter.display_load_status(false, &format!("Error loading data: {}", e));
                return Err(e.into());
            }
        };
        presenter.display_load_status(
            true,
            &format!(
                "Data loaded successfully! ({} records from \"{}\")",
                dataset.len(),
                dataset.source()
            ),
        );

        // ── 2. Region ─────────────────────────────────────────────────────────
        let parent = self.resolve_parent(selection.parent.as_deref());
        let options = self.hierarchy.child_regions_of(&parent, &dataset);
        let region = selection
            .region
            .clone()
            .or_else(|| default_selection(&options, &self.config.regions.default_region));
        presenter.show_region_options(&options, region.as_deref());

        let Some(region) = region else {
            warn!("No regions available under '{}'", parent);
            let err = DashboardError::NoRegions { parent };
            presenter.show_no_data(&err.to_string());
            return Err(err);
        };

        // ── 3. Filter ─────────────────────────────────────────────────────────
        let criteria = FilterCriteria::resolve(region.as_str(), selection.range, &dataset);
        let view = filter(&dataset, &criteria);

        if view.is_empty() {
            let err = DashboardError::NoData { region };
            presenter.show_no_data(&err.to_string());
            return Err(err);
        }

        // ── 4. Metrics ────────────────────────────────────────────────────────
        let options = self.config.metric_options(dataset.has_extended_fields());
        let snapshot = compute_snapshot(&view, &options);
        info!(
            "{}: {} rows, {} qualifying [{} → {}]",
            region,
            view.len(),
            snapshot.qualifying_rows,
            criteria.start_date,
            criteria.end_date
        );

        render_headline(presenter, &snapshot, self.config.metrics.price_direction);
        render_extended(presenter, &snapshot, self.config.metrics.ftb_direction);

        presenter.render_time_series(&view, SeriesField::AveragePrice);
        presenter.render_time_series(&view, SeriesField::AnnualChange);

        Ok(DashboardSummary {
            criteria: view.criteria().clone(),
            rows: view.len(),
            snapshot,
        })
    }
}

/// A percentage change metric with delta and direction.
fn render_change(presenter: &mut dyn Presenter, label: &str, metric: &Metric<f64>, rule: DirectionRule) {
    let value = fmt_metric(metric, fmt_pct);
    match metric.get() {
        Some(change) => presenter.render_metric(label, &value, Some(&value), rule.classify(change)),
        None => presenter.render_metric(label, &value, None, None),
    }
}

fn render_headline(presenter: &mut dyn Presenter, snap: &MetricsSnapshot, rule: DirectionRule) {
    let price_label = match snap.latest_date.get() {
        Some(date) => format!("Latest Avg. Price ({})", fmt_month(date)),
        None => "Latest Avg. Price".to_string(),
    };
    presenter.render_metric(&price_label, &fmt_metric(&snap.latest_price, fmt_price), None, None);

    render_change(presenter, "Latest 12-Month Price Change", &snap.latest_annual_change, rule);

    let period_label = match (snap.earliest_date.get(), snap.latest_date.get(), snap.period_change_pct.is_available()) {
        (Some(from), Some(to), true) => format!("Price Change ({} - {})", from.format("%Y"), to.format("%Y")),
        _ => "Total Price Change".to_string(),
    };
    render_change(presenter, &period_label, &snap.period_change_pct, rule);
}

fn render_extended(presenter: &mut dyn Presenter, snap: &MetricsSnapshot, ftb_rule: DirectionRule) {
    let Some(ext) = &snap.extended else {
        return;
    };

    let breakdown = ext.house_type_breakdown();
    if !breakdown.is_empty() {
        presenter.render_bar_breakdown("Average Price by House Type", &breakdown);
    }

    presenter.render_metric("First-Time Buyer Avg. Price", &fmt_metric(&ext.ftb_price, fmt_price), None, None);
    presenter.render_metric("FTB Index", &fmt_metric(&ext.ftb_index, |v| format!("{:.1}", v)), None, None);
    render_change(presenter, "FTB 12-Month Price Change", &ext.ftb_annual_change, ftb_rule);
}

// ── Tests ─────────────────────────────────────────────────────────────────────
