use crate::metrics::{DirectionRule, MetricOptions};
use crate::regions::ALL_DATA;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::warn;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub regions: RegionsConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Dataset source configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataConfig {
    #[serde(default = "default_data_path")]
    pub path: PathBuf,

    /// Latest/earliest rows must carry a 12-month change as well as a price.
    #[serde(default)]
    pub require_annual_change: bool,
}

/// Region selection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegionsConfig {
    #[serde(default = "default_all_label")]
    pub all_label: String,

    #[serde(default = "default_true")]
    pub use_hierarchy: bool,

    #[serde(default = "default_parent")]
    pub default_parent: String,

    #[serde(default = "default_region")]
    pub default_region: String,

    /// parent → children. Empty means the built-in groups.
    #[serde(default)]
    pub hierarchy: BTreeMap<String, Vec<String>>,
}

/// Metric presentation configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub price_direction: DirectionRule,

    #[serde(default)]
    pub ftb_direction: DirectionRule,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_data_path() -> PathBuf {
    PathBuf::from("data/UK-HPI-full-file-2025-06.csv")
}
fn default_all_label() -> String {
    ALL_DATA.to_string()
}
fn default_true() -> bool {
    true
}
fn default_parent() -> String {
    "Greater London".to_string()
}
fn default_region() -> String {
    "London".to_string()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
            require_annual_change: false,
        }
    }
}

impl Default for RegionsConfig {
    fn default() -> Self {
        Self {
            all_label: default_all_label(),
            use_hierarchy: true,
            default_parent: default_parent(),
            default_region: default_region(),
            hierarchy: BTreeMap::new(),
        }
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("HPI").separator("__"))
            .build()?;

        Ok(Self::from_config(cfg))
    }

    /// Deserialize a built config. Any invalid value drops the whole config back to
    /// defaults, including the data path, and the warning names that path.
    fn from_config(cfg: config::Config) -> Self {
        cfg.try_deserialize().unwrap_or_else(|e| {
            let defaults = AppConfig::default();
            warn!(
                "Invalid configuration ({}), falling back to defaults (data path {:?})",
                e, defaults.data.path
            );
            defaults
        })
    }

    pub fn metric_options(&self, extended_fields: bool) -> MetricOptions {
        MetricOptions {
            require_annual_change: self.data.require_annual_change,
            extended_fields,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let toml = r#"
            [data]
            require_annual_change = true

            [metrics]
            ftb_direction = "rising_is_favorable"

            [regions.hierarchy]
            "Tyne and Wear" = ["Gateshead", "Sunderland"]
        "#;
        let cfg: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert!(cfg.data.require_annual_change);
        assert_eq!(cfg.data.path, default_data_path());
        assert_eq!(cfg.metrics.price_direction, DirectionRule::FallingIsFavorable);
        assert_eq!(cfg.metrics.ftb_direction, DirectionRule::RisingIsFavorable);
        assert_eq!(cfg.regions.all_label, ALL_DATA);
        let children: Vec<_> = cfg.regions.hierarchy.values().collect();
        assert_eq!(children, vec![&vec!["Gateshead".to_string(), "Sunderland".to_string()]]);
    }

    #[test]
    fn test_invalid_value_falls_back_to_default_path() {
        let toml = r#"
            [data]
            path = "custom/hpi.csv"

            [metrics]
            price_direction = "falling"
        "#;
        let cfg = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap();

        let app = AppConfig::from_config(cfg);
        assert_eq!(app.data.path, default_data_path());
        assert_eq!(app.metrics.price_direction, DirectionRule::FallingIsFavorable);
    }

    #[test]
    fn test_metric_options() {
        let opts = AppConfig::default().metric_options(true);
        assert!(opts.extended_fields);
        assert!(!opts.require_annual_change);
    }
}
