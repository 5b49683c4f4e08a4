//! Presentation adapters: where dashboard output goes.

use crate::metrics::{SeriesField, series};
use crate::models::FilteredView;
use crate::utils::{fmt_number, fmt_pct, fmt_price};
use serde_json::{Value, json};
use std::io::Write;
use tracing::warn;

// ── Presenter trait ───────────────────────────────────────────────────────────

/// Receiver for everything the dashboard shows. Swappable: terminal, JSON, a GUI.
pub trait Presenter {
    fn display_load_status(&mut self, ok: bool, message: &str);
    fn show_region_options(&mut self, options: &[String], selected: Option<&str>);
    fn render_time_series(&mut self, view: &FilteredView, field: SeriesField);
    fn render_bar_breakdown(&mut self, title: &str, values: &[(String, f64)]);
    fn render_metric(&mut self, label: &str, value: &str, delta: Option<&str>, favorable: Option<bool>);
    fn show_no_data(&mut self, message: &str);
}

// ── Console ───────────────────────────────────────────────────────────────────

const BAR_WIDTH: usize = 40;

/// Plain-text output to any writer (stdout in the binary).
pub struct ConsolePresenter<W: Write> {
    out: W,
}

impl<W: Write> ConsolePresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: impl AsRef<str>) {
        if let Err(e) = writeln!(self.out, "{}", text.as_ref()) {
            warn!("Console write failed: {}", e);
        }
    }

    fn rule(&mut self) {
        self.line("─────────────────────────────────");
    }
}

fn direction_marker(favorable: Option<bool>) -> &'static str {
    match favorable {
        Some(true) => "▲ favourable",
        Some(false) => "▼ unfavourable",
        None => "",
    }
}

impl<W: Write> Presenter for ConsolePresenter<W> {
    fn display_load_status(&mut self, ok: bool, message: &str) {
        let tag = if ok { "OK" } else { "ERROR" };
        self.line(format!("[{}] {}", tag, message));
    }

    fn show_region_options(&mut self, options: &[String], selected: Option<&str>) {
        self.line(format!("{} regions:", options.len()));
        for opt in options {
            let mark = if Some(opt.as_str()) == selected { "*" } else { " " };
            self.line(format!(" {} {}", mark, opt));
        }
    }

    fn render_time_series(&mut self, view: &FilteredView, field: SeriesField) {
        let points = series(view, field);
        self.rule();
        self.line(format!("  {} — {}", view.criteria().region_name, field.column()));
        self.rule();
        for p in &points {
            let value = if field.is_percentage() {
                format!("{:>8}", fmt_pct(p.value))
            } else {
                format!("{:>12}", fmt_number(p.value.round() as i64))
            };
            self.line(format!("  {}  {}", p.date, value));
        }
        if points.is_empty() {
            self.line("  (no values)");
        }
    }

    fn render_bar_breakdown(&mut self, title: &str, values: &[(String, f64)]) {
        self.rule();
        self.line(format!("  {}", title));
        self.rule();
        let max = values.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);
        for (label, value) in values {
            let width = if max > 0.0 {
                ((value / max) * BAR_WIDTH as f64).round() as usize
            } else {
                0
            };
            self.line(format!("  {:<14} {:<w$} {}", label, "█".repeat(width), fmt_price(*value), w = BAR_WIDTH));
        }
    }

    fn render_metric(&mut self, label: &str, value: &str, delta: Option<&str>, favorable: Option<bool>) {
        let mut text = format!("  {:<36}: {}", label, value);
        match (delta, direction_marker(favorable)) {
            (Some(delta), "") => text.push_str(&format!("  ({})", delta)),
            (Some(delta), marker) => text.push_str(&format!("  ({} {})", delta, marker)),
            (None, _) => {}
        }
        self.line(text);
    }

    fn show_no_data(&mut self, message: &str) {
        self.line(format!("[INFO] {}", message));
    }
}

// ── JSON ──────────────────────────────────────────────────────────────────────

/// Collects output into one JSON document, for scripts and other front ends.
#[derive(Debug, Default)]
pub struct JsonPresenter {
    load_status: Option<Value>,
    region_options: Option<Value>,
    metrics: Vec<Value>,
    series: Vec<Value>,
    breakdowns: Vec<Value>,
    no_data: Option<String>,
}

impl JsonPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_value(self) -> Value {
        json!({
            "load_status": self.load_status,
            "region_options": self.region_options,
            "metrics": self.metrics,
            "series": self.series,
            "breakdowns": self.breakdowns,
            "no_data": self.no_data,
        })
    }
}

impl Presenter for JsonPresenter {
    fn display_load_status(&mut self, ok: bool, message: &str) {
        self.load_status = Some(json!({ "ok": ok, "message": message }));
    }

    fn show_region_options(&mut self, options: &[String], selected: Option<&str>) {
        self.region_options = Some(json!({ "options": options, "selected": selected }));
    }

    fn render_time_series(&mut self, view: &FilteredView, field: SeriesField) {
        self.series.push(json!({
            "region": view.criteria().region_name,
            "field": field.column(),
            "points": series(view, field),
        }));
    }

    fn render_bar_breakdown(&mut self, title: &str, values: &[(String, f64)]) {
        let bars: Vec<Value> = values
            .iter()
            .map(|(label, value)| json!({ "label": label, "value": value }))
            .collect();
        self.breakdowns.push(json!({ "title": title, "bars": bars }));
    }

    fn render_metric(&mut self, label: &str, value: &str, delta: Option<&str>, favorable: Option<bool>) {
        self.metrics.push(json!({
            "label": label,
            "value": value,
            "delta": delta,
            "favorable": favorable,
        }));
    }

    fn show_no_data(&mut self, message: &str) {
        self.no_data = Some(message.to_string());
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::filter;
    use crate::models::{Dataset, FilterCriteria, Record};
    use chrono::NaiveDate;

    fn view() -> FilteredView {
        let d = |m| NaiveDate::from_ymd_opt(2024, m, 1).unwrap();
        let ds = Dataset::new(
            "mem",
            vec![
                Record::new("Leeds", d(1), Some(210_000.0), Some(2.0)),
                Record::new("Leeds", d(2), None, Some(-0.5)),
            ],
            false,
        );
        filter(&ds, &FilterCriteria::new("Leeds", d(1), d(12)))
    }

    #[test]
    fn test_console_metric_line() {
        let mut p = ConsolePresenter::new(Vec::new());
        p.render_metric("Latest 12-Month Price Change", "-0.5%", Some("-0.5%"), Some(true));
        p.render_metric("Total Price Change", "N/A (insufficient data)", None, None);
        let text = String::from_utf8(p.into_inner()).unwrap();
        assert!(text.contains("-0.5%  (-0.5% ▲ favourable)"));
        assert!(text.contains("N/A (insufficient data)"));
    }

    #[test]
    fn test_console_series_and_bars() {
        let mut p = ConsolePresenter::new(Vec::new());
        p.render_time_series(&view(), SeriesField::AveragePrice);
        p.render_bar_breakdown("By type", &[("Flat".into(), 100.0), ("Terraced".into(), 200.0)]);
        let text = String::from_utf8(p.into_inner()).unwrap();
        assert!(text.contains("2024-01-01"));
        assert!(text.contains("210,000"));
        assert!(!text.contains("2024-02-01"));
        assert!(text.contains(&"█".repeat(BAR_WIDTH)));
    }

    #[test]
    fn test_json_document() {
        let mut p = JsonPresenter::new();
        p.display_load_status(true, "loaded");
        p.render_time_series(&view(), SeriesField::AnnualChange);
        p.render_metric("Latest Avg. Price (Jan 2024)", "£210,000", None, None);
        let doc = p.into_value();

        assert_eq!(doc["load_status"]["ok"], json!(true));
        assert_eq!(doc["series"][0]["field"], json!("12m%Change"));
        assert_eq!(doc["series"][0]["points"].as_array().unwrap().len(), 2);
        assert_eq!(doc["series"][0]["points"][1]["date"], json!("2024-02-01"));
        assert_eq!(doc["metrics"][0]["delta"], Value::Null);
        assert_eq!(doc["no_data"], Value::Null);
    }
}
