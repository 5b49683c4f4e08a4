use crate::models::{ExtendedFields, RawHpiRow, Record};
use chrono::NaiveDate;

/// The only date layout the HPI files use: 01/03/2024.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

// ── Parsers ───────────────────────────────────────────────────────────────────

fn is_blank(s: &str) -> bool {
    s.is_empty() || s == "N/A" || s == "-" || s == "—"
}

/// Parse a decimal cell, stripping thousands separators.
/// "1,234.56" → 1234.56 | "" → None | "n/a" → None
pub fn parse_decimal(s: &str) -> Option<f64> {
    let s = s.trim();
    if is_blank(s) {
        return None;
    }
    let cleaned: String = s.chars().filter(|c| *c != ',').collect();
    cleaned
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Percentage cells may carry a trailing '%'.
pub fn parse_pct(s: &str) -> Option<f64> {
    parse_decimal(s.trim().trim_end_matches('%'))
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()
}

pub fn normalise_region(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() { None } else { Some(s.to_string()) }
}

// ── RawHpiRow → Record ────────────────────────────────────────────────────────

/// Why a row was left out of the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowRejection {
    MissingRegion,
    BadDate,
}

/// Region and date are mandatory; every numeric field degrades to `None` on its own.
pub fn raw_row_to_record(row: &RawHpiRow) -> Result<Record, RowRejection> {
    let region_name = row
        .region_name
        .as_deref()
        .and_then(normalise_region)
        .ok_or(RowRejection::MissingRegion)?;

    let date = row
        .date
        .as_deref()
        .and_then(parse_date)
        .ok_or(RowRejection::BadDate)?;

    let extended = ExtendedFields {
        detached_price: row.detached_price.as_deref().and_then(parse_decimal),
        semi_detached_price: row.semi_detached_price.as_deref().and_then(parse_decimal),
        terraced_price: row.terraced_price.as_deref().and_then(parse_decimal),
        flat_price: row.flat_price.as_deref().and_then(parse_decimal),
        ftb_price: row.ftb_price.as_deref().and_then(parse_decimal),
        ftb_index: row.ftb_index.as_deref().and_then(parse_decimal),
        ftb_annual_change_pct: row.ftb_annual_change_pct.as_deref().and_then(parse_pct),
    };

    Ok(Record {
        region_name,
        date,
        average_price: row.average_price.as_deref().and_then(parse_decimal),
        annual_change_pct: row.annual_change_pct.as_deref().and_then(parse_pct),
        extended,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn row(region: &str, date: &str, price: &str) -> RawHpiRow {
        RawHpiRow {
            region_name: Some(region.to_string()),
            date: Some(date.to_string()),
            average_price: Some(price.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("1,234.56"), Some(1234.56));
        assert_eq!(parse_decimal(" 250,000 "), Some(250_000.0));
        assert_eq!(parse_decimal("-3.2"), Some(-3.2));
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("abc"), None);
        assert_eq!(parse_decimal("NaN"), None);
        assert_eq!(parse_decimal("inf"), None);
    }

    #[test]
    fn test_parse_pct() {
        assert_eq!(parse_pct("4.5%"), Some(4.5));
        assert_eq!(parse_pct("-0.7"), Some(-0.7));
        assert_eq!(parse_pct("%"), None);
    }

    #[test]
    fn test_parse_date_is_day_first() {
        assert_eq!(parse_date("01/02/2024"), NaiveDate::from_ymd_opt(2024, 2, 1));
        assert_eq!(parse_date("2024-02-01"), None);
        assert_eq!(parse_date("31/02/2024"), None);
    }

    #[test]
    fn test_empty_price_is_none_not_zero() {
        let rec = raw_row_to_record(&row("London", "01/01/2024", "")).unwrap();
        assert_eq!(rec.average_price, None);
    }

    #[test]
    fn test_rejections() {
        assert_eq!(
            raw_row_to_record(&row("  ", "01/01/2024", "1")),
            Err(RowRejection::MissingRegion)
        );
        assert_eq!(
            raw_row_to_record(&row("London", "Jan 2024", "1")),
            Err(RowRejection::BadDate)
        );
    }

    #[test]
    fn test_extended_fields_independent() {
        let raw = RawHpiRow {
            flat_price: Some("1,050,000".into()),
            terraced_price: Some("oops".into()),
            ftb_annual_change_pct: Some("2.1".into()),
            ..row("Camden", "01/06/2023", "900,000")
        };
        let rec = raw_row_to_record(&raw).unwrap();
        assert_eq!(rec.average_price, Some(900_000.0));
        assert_eq!(rec.extended.flat_price, Some(1_050_000.0));
        assert_eq!(rec.extended.terraced_price, None);
        assert_eq!(rec.extended.ftb_annual_change_pct, Some(2.1));
        assert_eq!(rec.extended.detached_price, None);
    }
}
