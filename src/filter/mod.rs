//! Region + date-range selection over loaded records.

use crate::models::{Dataset, DateRangeSelection, FilterCriteria, FilteredView, Record, date_bounds};
use chrono::NaiveDate;
use tracing::debug;

impl FilterCriteria {
    pub fn new(region_name: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            region_name: region_name.into(),
            start_date,
            end_date,
        }
    }

    /// Turn a user selection into criteria. An inverted, one-sided or empty selection
    /// widens to the dataset's full date span.
    pub fn resolve(region_name: impl Into<String>, selection: DateRangeSelection, dataset: &Dataset) -> Self {
        let (start, end) = match (selection.start, selection.end) {
            (Some(start), Some(end)) if start <= end => (start, end),
            _ => dataset.date_bounds().unwrap_or((NaiveDate::MIN, NaiveDate::MAX)),
        };
        Self::new(region_name, start, end)
    }

    pub fn matches(&self, record: &Record) -> bool {
        record.region_name == self.region_name
            && record.date >= self.start_date
            && record.date <= self.end_date
    }

    /// Criteria with a usable range: inverted bounds widen to `bounds`.
    fn normalised(&self, bounds: Option<(NaiveDate, NaiveDate)>) -> Self {
        if self.start_date <= self.end_date {
            return self.clone();
        }
        let (start, end) = bounds.unwrap_or((NaiveDate::MIN, NaiveDate::MAX));
        Self::new(self.region_name.clone(), start, end)
    }
}

/// Rows for one region within an inclusive date range, oldest first.
pub fn filter(dataset: &Dataset, criteria: &FilterCriteria) -> FilteredView {
    filter_records(dataset.records(), criteria)
}

/// Same as [`filter`] over any slice, so a view can be narrowed again.
///
/// Region match is exact and case-sensitive. The sort is stable: duplicate rows for
/// the same date keep their source order.
pub fn filter_records(records: &[Record], criteria: &FilterCriteria) -> FilteredView {
    let criteria = criteria.normalised(date_bounds(records));

    let mut selected: Vec<Record> = records
        .iter()
        .filter(|r| criteria.matches(r))
        .cloned()
        .collect();
    selected.sort_by_key(|r| r.date);

    debug!(
        "{} [{} → {}]: {} of {} rows",
        criteria.region_name,
        criteria.start_date,
        criteria.end_date,
        selected.len(),
        records.len()
    );

    FilteredView::new(criteria, selected)
}

impl FilteredView {
    /// Re-apply `criteria` to this view's rows.
    ///
    /// Inverted criteria keep this view's own date range rather than widening to the
    /// span of its rows, so the narrowed view records the range it was built from.
    pub fn refine(&self, criteria: &FilterCriteria) -> FilteredView {
        if criteria.start_date > criteria.end_date {
            let own = self.criteria();
            let kept = FilterCriteria::new(criteria.region_name.clone(), own.start_date, own.end_date);
            return filter_records(self.records(), &kept);
        }
        filter_records(self.records(), criteria)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
