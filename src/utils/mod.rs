use chrono::NaiveDate;
use std::time::Instant;
use tracing::info;

use crate::metrics::Metric;

/// A simple wall-clock timer for logging elapsed time.
pub struct Timer {
    label: String,
    start: Instant,
}

impl Timer {
    pub fn start(label: impl Into<String>) -> Self {
        let label = label.into();
        info!("⏱  Starting: {}", label);
        Self {
            label,
            start: Instant::now(),
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        info!(
            "⏱  Finished: {} (took {:.2?})",
            self.label,
            self.start.elapsed()
        );
    }
}

pub const NOT_AVAILABLE: &str = "N/A";
pub const INSUFFICIENT_DATA: &str = "N/A (insufficient data)";

/// Format a large integer with thousands separators.
pub fn fmt_number(n: i64) -> String {
    let s = n.abs().to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    if n < 0 {
        result.push('-');
    }
    result.chars().rev().collect()
}

/// "£285,000"
pub fn fmt_price(value: f64) -> String {
    format!("£{}", fmt_number(value.round() as i64))
}

/// "4.2%"
pub fn fmt_pct(value: f64) -> String {
    format!("{:.1}%", value)
}

/// "Jan 2024"
pub fn fmt_month(date: NaiveDate) -> String {
    date.format("%b %Y").to_string()
}

/// Render a metric with `fmt`, or the matching "N/A" text.
pub fn fmt_metric<T: Copy>(metric: &Metric<T>, fmt: impl Fn(T) -> String) -> String {
    match metric {
        Metric::Available(v) => fmt(*v),
        Metric::NotAvailable => NOT_AVAILABLE.to_string(),
        Metric::InsufficientData => INSUFFICIENT_DATA.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_number() {
        assert_eq!(fmt_number(1_234_567), "1,234,567");
        assert_eq!(fmt_number(0), "0");
        assert_eq!(fmt_number(-42_000), "-42,000");
        assert_eq!(fmt_number(999), "999");
    }

    #[test]
    fn test_fmt_price_and_pct() {
        assert_eq!(fmt_price(284_999.6), "£285,000");
        assert_eq!(fmt_pct(-1.26), "-1.3%");
        assert_eq!(fmt_pct(10.0), "10.0%");
        assert_eq!(fmt_month(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()), "Mar 2024");
    }

    #[test]
    fn test_fmt_metric_sentinels() {
        assert_eq!(fmt_metric(&Metric::Available(2.5), fmt_pct), "2.5%");
        assert_eq!(fmt_metric(&Metric::<f64>::NotAvailable, fmt_pct), "N/A");
        assert_eq!(fmt_metric(&Metric::<f64>::InsufficientData, fmt_pct), "N/A (insufficient data)");
    }
}
