use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ── Record ────────────────────────────────────────────────────────────────────

/// House-type and first-time-buyer columns, present only in the extended file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExtendedFields {
    pub detached_price: Option<f64>,
    pub semi_detached_price: Option<f64>,
    pub terraced_price: Option<f64>,
    pub flat_price: Option<f64>,
    pub ftb_price: Option<f64>,
    pub ftb_index: Option<f64>,
    pub ftb_annual_change_pct: Option<f64>,
}

/// One dated observation for one region.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    pub region_name: String,
    pub date: NaiveDate,
    pub average_price: Option<f64>,
    pub annual_change_pct: Option<f64>, // 12m%Change
    #[serde(default)]
    pub extended: ExtendedFields,
}

impl Record {
    pub fn new(
        region_name: impl Into<String>,
        date: NaiveDate,
        average_price: Option<f64>,
        annual_change_pct: Option<f64>,
    ) -> Self {
        Self {
            region_name: region_name.into(),
            date,
            average_price,
            annual_change_pct,
            extended: ExtendedFields::default(),
        }
    }

    pub fn with_extended(mut self, extended: ExtendedFields) -> Self {
        self.extended = extended;
        self
    }
}

// ── Raw CSV row ───────────────────────────────────────────────────────────────

/// UK HPI CSV row as text, before any cleaning.
/// RegionName, Date, AveragePrice, 12m%Change [, DetachedPrice, SemiDetachedPrice,
/// TerracedPrice, FlatPrice, FTBPrice, FTBIndex, FTB12m%Change]
#[derive(Debug, Clone, Default)]
pub struct RawHpiRow {
    pub region_name: Option<String>,
    pub date: Option<String>,
    pub average_price: Option<String>,
    pub annual_change_pct: Option<String>,
    pub detached_price: Option<String>,
    pub semi_detached_price: Option<String>,
    pub terraced_price: Option<String>,
    pub flat_price: Option<String>,
    pub ftb_price: Option<String>,
    pub ftb_index: Option<String>,
    pub ftb_annual_change_pct: Option<String>,
}

// ── Dataset ───────────────────────────────────────────────────────────────────

/// Row accounting for a single load.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct LoadReport {
    pub rows_read: usize,
    pub rows_kept: usize,
    pub dropped_missing_region: usize,
    pub dropped_bad_date: usize,
    pub unreadable_rows: usize,
}

impl LoadReport {
    pub fn dropped(&self) -> usize {
        self.dropped_missing_region + self.dropped_bad_date + self.unreadable_rows
    }
}

/// The loaded table. Immutable once built; reload to get a new one.
#[derive(Debug, Clone)]
pub struct Dataset {
    source: String,
    records: Vec<Record>,
    has_extended_fields: bool,
    report: LoadReport,
}

impl Dataset {
    pub fn new(source: impl Into<String>, records: Vec<Record>, has_extended_fields: bool) -> Self {
        let report = LoadReport {
            rows_read: records.len(),
            rows_kept: records.len(),
            ..Default::default()
        };
        Self {
            source: source.into(),
            records,
            has_extended_fields,
            report,
        }
    }

    pub fn with_report(mut self, report: LoadReport) -> Self {
        self.report = report;
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether the source header carried any house-type / FTB column.
    pub fn has_extended_fields(&self) -> bool {
        self.has_extended_fields
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    /// Earliest and latest date across every region.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        date_bounds(&self.records)
    }

    /// Sorted, distinct region names.
    pub fn region_names(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.region_name.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

pub(crate) fn date_bounds(records: &[Record]) -> Option<(NaiveDate, NaiveDate)> {
    let min = records.iter().map(|r| r.date).min()?;
    let max = records.iter().map(|r| r.date).max()?;
    Some((min, max))
}

// ── Selection ─────────────────────────────────────────────────────────────────

/// A date range as picked by the user. Either end may be missing.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRangeSelection {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRangeSelection {
    /// No constraint: the whole dataset span.
    pub fn full() -> Self {
        Self::default()
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }
}

/// Region plus inclusive date range. `start_date <= end_date` once resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilterCriteria {
    pub region_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Date-sorted rows for one region and range. Empty is a valid result.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredView {
    criteria: FilterCriteria,
    records: Vec<Record>,
}

impl FilteredView {
    pub(crate) fn new(criteria: FilterCriteria, records: Vec<Record>) -> Self {
        Self { criteria, records }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_region_names_sorted_distinct() {
        let ds = Dataset::new(
            "mem",
            vec![
                Record::new("York", d(2023, 1, 1), Some(1.0), None),
                Record::new("Bath", d(2023, 1, 1), Some(1.0), None),
                Record::new("York", d(2023, 2, 1), Some(1.0), None),
            ],
            false,
        );
        assert_eq!(ds.region_names(), vec!["Bath", "York"]);
    }

    #[test]
    fn test_date_bounds() {
        let ds = Dataset::new(
            "mem",
            vec![
                Record::new("York", d(2023, 6, 1), None, None),
                Record::new("Bath", d(2021, 1, 1), None, None),
                Record::new("York", d(2024, 2, 1), None, None),
            ],
            false,
        );
        assert_eq!(ds.date_bounds(), Some((d(2021, 1, 1), d(2024, 2, 1))));
        assert_eq!(Dataset::new("empty", vec![], false).date_bounds(), None);
    }
}
