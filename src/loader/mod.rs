//! CSV loader for UK House Price Index extracts.

pub mod cleaner;

use crate::error::{LoadError, LoadResult};
use crate::models::{Dataset, LoadReport, RawHpiRow};
use csv::StringRecord;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use self::cleaner::{RowRejection, raw_row_to_record};

// ── Column layout ─────────────────────────────────────────────────────────────

pub const COL_REGION: &str = "RegionName";
pub const COL_DATE: &str = "Date";
pub const COL_AVERAGE_PRICE: &str = "AveragePrice";
pub const COL_ANNUAL_CHANGE: &str = "12m%Change";
pub const COL_DETACHED: &str = "DetachedPrice";
pub const COL_SEMI_DETACHED: &str = "SemiDetachedPrice";
pub const COL_TERRACED: &str = "TerracedPrice";
pub const COL_FLAT: &str = "FlatPrice";
pub const COL_FTB_PRICE: &str = "FTBPrice";
pub const COL_FTB_INDEX: &str = "FTBIndex";
pub const COL_FTB_ANNUAL_CHANGE: &str = "FTB12m%Change";

/// Header positions. Columns are found by name, so order and extra columns don't matter.
#[derive(Debug, Clone)]
struct ColumnMap {
    region: usize,
    date: usize,
    average_price: usize,
    annual_change: usize,
    detached: Option<usize>,
    semi_detached: Option<usize>,
    terraced: Option<usize>,
    flat: Option<usize>,
    ftb_price: Option<usize>,
    ftb_index: Option<usize>,
    ftb_annual_change: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> LoadResult<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().trim_start_matches('\u{feff}') == name)
        };
        let require = |name: &'static str| find(name).ok_or(LoadError::MissingColumn(name));

        Ok(Self {
            region: require(COL_REGION)?,
            date: require(COL_DATE)?,
            average_price: require(COL_AVERAGE_PRICE)?,
            annual_change: require(COL_ANNUAL_CHANGE)?,
            detached: find(COL_DETACHED),
            semi_detached: find(COL_SEMI_DETACHED),
            terraced: find(COL_TERRACED),
            flat: find(COL_FLAT),
            ftb_price: find(COL_FTB_PRICE),
            ftb_index: find(COL_FTB_INDEX),
            ftb_annual_change: find(COL_FTB_ANNUAL_CHANGE),
        })
    }

    fn has_extended(&self) -> bool {
        [
            self.detached,
            self.semi_detached,
            self.terraced,
            self.flat,
            self.ftb_price,
            self.ftb_index,
            self.ftb_annual_change,
        ]
        .iter()
        .any(Option::is_some)
    }

    fn raw_row(&self, record: &StringRecord) -> RawHpiRow {
        let cell = |idx: usize| record.get(idx).map(|s| s.to_string());
        let opt_cell = |idx: Option<usize>| idx.and_then(&cell);

        RawHpiRow {
            region_name: cell(self.region),
            date: cell(self.date),
            average_price: cell(self.average_price),
            annual_change_pct: cell(self.annual_change),
            detached_price: opt_cell(self.detached),
            semi_detached_price: opt_cell(self.semi_detached),
            terraced_price: opt_cell(self.terraced),
            flat_price: opt_cell(self.flat),
            ftb_price: opt_cell(self.ftb_price),
            ftb_index: opt_cell(self.ftb_index),
            ftb_annual_change_pct: opt_cell(self.ftb_annual_change),
        }
    }
}

// ── Entry points ──────────────────────────────────────────────────────────────

/// Load an HPI CSV file from disk.
pub fn load_csv(path: &Path) -> LoadResult<Dataset> {
    debug!("Loading HPI data from {:?}", path);

    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    load_reader(file, &path.display().to_string())
}

/// Parse HPI CSV from any reader. `source` labels the dataset in logs and status messages.
pub fn load_reader<R: Read>(input: R, source: &str) -> LoadResult<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let headers = reader.headers()?.clone();
    let columns = ColumnMap::from_headers(&headers)?;

    let mut records = Vec::new();
    let mut report = LoadReport::default();

    for (i, result) in reader.records().enumerate() {
        report.rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) if e.is_io_error() => return Err(LoadError::Read(e)),
            Err(e) => {
                warn!("Row {} in {}: {}", i + 1, source, e);
                report.unreadable_rows += 1;
                continue;
            }
        };

        match raw_row_to_record(&columns.raw_row(&record)) {
            Ok(rec) => records.push(rec),
            Err(RowRejection::MissingRegion) => report.dropped_missing_region += 1,
            Err(RowRejection::BadDate) => {
                debug!("Row {} in {}: unparseable date {:?}", i + 1, source, record.get(columns.date));
                report.dropped_bad_date += 1;
            }
        }
    }

    report.rows_kept = records.len();
    info!(
        "{}: {} records loaded ({} dropped, extended columns: {})",
        source,
        report.rows_kept,
        report.dropped(),
        columns.has_extended()
    );

    Ok(Dataset::new(source, records, columns.has_extended()).with_report(report))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
