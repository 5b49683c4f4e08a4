//! Snapshot metrics derived from a filtered view.
//!
//! Nothing here fails. Anything that cannot be computed comes back as a
//! [`Metric`] sentinel for the presentation layer to show as "N/A".

use crate::loader::{
    COL_ANNUAL_CHANGE, COL_AVERAGE_PRICE, COL_DETACHED, COL_FLAT, COL_FTB_ANNUAL_CHANGE, COL_FTB_INDEX,
    COL_FTB_PRICE, COL_SEMI_DETACHED, COL_TERRACED,
};
use crate::models::{FilteredView, Record};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ── Metric ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Metric<T> {
    Available(T),
    NotAvailable,
    /// Not enough qualifying rows, or a zero base.
    InsufficientData,
}

impl<T> Metric<T> {
    pub fn from_option(value: Option<T>) -> Self {
        value.map_or(Metric::NotAvailable, Metric::Available)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Metric::Available(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Metric::Available(_))
    }
}

impl<T: Copy> Metric<T> {
    pub fn get(&self) -> Option<T> {
        self.value().copied()
    }
}

// ── Direction ─────────────────────────────────────────────────────────────────

/// Which way a change counts as good news.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectionRule {
    RisingIsFavorable,
    /// Buyer's view: falling prices are good.
    #[default]
    FallingIsFavorable,
}

impl DirectionRule {
    /// A zero change counts as a rise. `None` only for non-finite input.
    pub fn classify(self, change: f64) -> Option<bool> {
        if !change.is_finite() {
            return None;
        }
        let falling = change < 0.0;
        Some(match self {
            DirectionRule::RisingIsFavorable => !falling,
            DirectionRule::FallingIsFavorable => falling,
        })
    }
}

// ── Snapshot ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricOptions {
    /// Only rows that also carry a 12-month change qualify as latest/earliest.
    pub require_annual_change: bool,
    /// Produce the house-type / FTB part of the snapshot.
    pub extended_fields: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtendedSnapshot {
    pub detached_price: Metric<f64>,
    pub semi_detached_price: Metric<f64>,
    pub terraced_price: Metric<f64>,
    pub flat_price: Metric<f64>,
    pub ftb_price: Metric<f64>,
    pub ftb_index: Metric<f64>,
    pub ftb_annual_change: Metric<f64>,
}

impl ExtendedSnapshot {
    fn from_row(row: Option<&Record>) -> Self {
        let field = |f: fn(&Record) -> Option<f64>| Metric::from_option(row.and_then(f));
        Self {
            detached_price: field(|r| r.extended.detached_price),
            semi_detached_price: field(|r| r.extended.semi_detached_price),
            terraced_price: field(|r| r.extended.terraced_price),
            flat_price: field(|r| r.extended.flat_price),
            ftb_price: field(|r| r.extended.ftb_price),
            ftb_index: field(|r| r.extended.ftb_index),
            ftb_annual_change: field(|r| r.extended.ftb_annual_change_pct),
        }
    }

    /// Available house-type prices as (label, price), in a fixed order.
    pub fn house_type_breakdown(&self) -> Vec<(String, f64)> {
        [
            ("Detached", self.detached_price),
            ("Semi-detached", self.semi_detached_price),
            ("Terraced", self.terraced_price),
            ("Flat", self.flat_price),
        ]
        .into_iter()
        .filter_map(|(label, m)| m.get().map(|v| (label.to_string(), v)))
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub latest_price: Metric<f64>,
    pub latest_annual_change: Metric<f64>,
    pub period_change_pct: Metric<f64>,
    pub earliest_date: Metric<NaiveDate>,
    pub latest_date: Metric<NaiveDate>,
    pub qualifying_rows: usize,
    pub extended: Option<ExtendedSnapshot>,
}

/// Latest/earliest qualifying row; ties go to the first row in view order.
fn endpoints<'a>(rows: impl Iterator<Item = &'a Record>) -> Option<(&'a Record, &'a Record, usize)> {
    let mut count = 0usize;
    let mut earliest: Option<&Record> = None;
    let mut latest: Option<&Record> = None;

    for row in rows {
        count += 1;
        if earliest.is_none_or(|e| row.date < e.date) {
            earliest = Some(row);
        }
        if latest.is_none_or(|l| row.date > l.date) {
            latest = Some(row);
        }
    }

    Some((earliest?, latest?, count))
}

pub fn compute_snapshot(view: &FilteredView, options: &MetricOptions) -> MetricsSnapshot {
    let qualifies = |r: &&Record| {
        r.average_price.is_some() && (!options.require_annual_change || r.annual_change_pct.is_some())
    };

    let Some((earliest, latest, count)) = endpoints(view.records().iter().filter(qualifies)) else {
        return MetricsSnapshot {
            latest_price: Metric::NotAvailable,
            latest_annual_change: Metric::NotAvailable,
            period_change_pct: Metric::InsufficientData,
            earliest_date: Metric::NotAvailable,
            latest_date: Metric::NotAvailable,
            qualifying_rows: 0,
            extended: options.extended_fields.then(|| ExtendedSnapshot::from_row(None)),
        };
    };

    MetricsSnapshot {
        latest_price: Metric::from_option(latest.average_price),
        latest_annual_change: Metric::from_option(latest.annual_change_pct),
        period_change_pct: period_change(earliest.average_price, latest.average_price, count),
        earliest_date: Metric::Available(earliest.date),
        latest_date: Metric::Available(latest.date),
        qualifying_rows: count,
        extended: options.extended_fields.then(|| ExtendedSnapshot::from_row(Some(latest))),
    }
}

/// Percentage change from `start` to `end`. Needs two qualifying rows and a non-zero base.
pub fn period_change(start: Option<f64>, end: Option<f64>, qualifying_rows: usize) -> Metric<f64> {
    match (start, end) {
        (Some(start), Some(end)) if qualifying_rows >= 2 && start != 0.0 => {
            let pct = (end - start) / start * 100.0;
            if pct.is_finite() { Metric::Available(pct) } else { Metric::InsufficientData }
        }
        _ => Metric::InsufficientData,
    }
}

// ── Series ────────────────────────────────────────────────────────────────────

/// Numeric column that can be charted over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeriesField {
    AveragePrice,
    AnnualChange,
    DetachedPrice,
    SemiDetachedPrice,
    TerracedPrice,
    FlatPrice,
    FtbPrice,
    FtbIndex,
    FtbAnnualChange,
}

impl SeriesField {
    /// Source column name.
    pub fn column(self) -> &'static str {
        match self {
            SeriesField::AveragePrice => COL_AVERAGE_PRICE,
            SeriesField::AnnualChange => COL_ANNUAL_CHANGE,
            SeriesField::DetachedPrice => COL_DETACHED,
            SeriesField::SemiDetachedPrice => COL_SEMI_DETACHED,
            SeriesField::TerracedPrice => COL_TERRACED,
            SeriesField::FlatPrice => COL_FLAT,
            SeriesField::FtbPrice => COL_FTB_PRICE,
            SeriesField::FtbIndex => COL_FTB_INDEX,
            SeriesField::FtbAnnualChange => COL_FTB_ANNUAL_CHANGE,
        }
    }

    pub fn is_percentage(self) -> bool {
        matches!(self, SeriesField::AnnualChange | SeriesField::FtbAnnualChange)
    }

    pub fn extract(self, r: &Record) -> Option<f64> {
        match self {
            SeriesField::AveragePrice => r.average_price,
            SeriesField::AnnualChange => r.annual_change_pct,
            SeriesField::DetachedPrice => r.extended.detached_price,
            SeriesField::SemiDetachedPrice => r.extended.semi_detached_price,
            SeriesField::TerracedPrice => r.extended.terraced_price,
            SeriesField::FlatPrice => r.extended.flat_price,
            SeriesField::FtbPrice => r.extended.ftb_price,
            SeriesField::FtbIndex => r.extended.ftb_index,
            SeriesField::FtbAnnualChange => r.extended.ftb_annual_change_pct,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Chart points for `field`, skipping rows without a value.
pub fn series(view: &FilteredView, field: SeriesField) -> Vec<SeriesPoint> {
    view.records()
        .iter()
        .filter_map(|r| field.extract(r).map(|value| SeriesPoint { date: r.date, value }))
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
