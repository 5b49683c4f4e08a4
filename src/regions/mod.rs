//! Two-level region selection: parent groupings over the region names in the data.

use crate::config::RegionsConfig;
use crate::models::Dataset;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Parent key meaning "no grouping: every region in the data".
pub const ALL_DATA: &str = "All Data";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionHierarchy {
    all_label: String,
    groups: BTreeMap<String, BTreeSet<String>>,
}

impl RegionHierarchy {
    /// A hierarchy with no declared groups. Every parent resolves to every region.
    pub fn single_level(all_label: impl Into<String>) -> Self {
        Self {
            all_label: all_label.into(),
            groups: BTreeMap::new(),
        }
    }

    pub fn with_group<I, S>(mut self, parent: impl Into<String>, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let parent = parent.into();
        if parent == self.all_label {
            warn!("Ignoring region group named like the '{}' sentinel", parent);
            return self;
        }
        self.groups
            .entry(parent)
            .or_default()
            .extend(children.into_iter().map(Into::into));
        self
    }

    /// Built from config; an empty `hierarchy` table falls back to the built-in groups.
    pub fn from_config(cfg: &RegionsConfig) -> Self {
        if !cfg.use_hierarchy {
            return Self::single_level(cfg.all_label.clone());
        }
        if cfg.hierarchy.is_empty() {
            return Self::builtin(cfg.all_label.clone());
        }
        cfg.hierarchy
            .iter()
            .fold(Self::single_level(cfg.all_label.clone()), |h, (parent, children)| {
                h.with_group(parent.clone(), children.iter().cloned())
            })
    }

    /// English metropolitan groupings, each including its own aggregate row where the
    /// HPI publishes one.
    pub fn builtin(all_label: impl Into<String>) -> Self {
        Self::single_level(all_label)
            .with_group("Greater London", GREATER_LONDON.iter().copied())
            .with_group("Greater Manchester", GREATER_MANCHESTER.iter().copied())
            .with_group("West Midlands", WEST_MIDLANDS.iter().copied())
            .with_group("West Yorkshire", WEST_YORKSHIRE.iter().copied())
    }

    pub fn all_label(&self) -> &str {
        &self.all_label
    }

    pub fn is_single_level(&self) -> bool {
        self.groups.is_empty()
    }

    /// Selectable regions under `parent`, sorted.
    ///
    /// * the sentinel, or a hierarchy without groups → every region in `dataset`
    /// * a declared parent → its declared children
    /// * anything else → empty
    pub fn child_regions_of(&self, parent: &str, dataset: &Dataset) -> Vec<String> {
        if parent == self.all_label || self.is_single_level() {
            return dataset.region_names();
        }
        self.groups
            .get(parent)
            .map(|children| children.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Declared parents alphabetically, sentinel last.
    pub fn parent_options(&self) -> Vec<String> {
        self.groups
            .keys()
            .cloned()
            .chain(std::iter::once(self.all_label.clone()))
            .collect()
    }
}

impl Default for RegionHierarchy {
    fn default() -> Self {
        Self::builtin(ALL_DATA)
    }
}

/// `preferred` when it is among `candidates`, otherwise the first candidate.
pub fn default_selection(candidates: &[String], preferred: &str) -> Option<String> {
    candidates
        .iter()
        .find(|c| c.as_str() == preferred)
        .or_else(|| candidates.first())
        .cloned()
}

// ── Built-in groups ───────────────────────────────────────────────────────────

const GREATER_LONDON: &[&str] = &[
    "London",
    "Barking and Dagenham",
    "Barnet",
    "Bexley",
    "Brent",
    "Bromley",
    "Camden",
    "City of London",
    "City of Westminster",
    "Croydon",
    "Ealing",
    "Enfield",
    "Greenwich",
    "Hackney",
    "Hammersmith and Fulham",
    "Haringey",
    "Harrow",
    "Havering",
    "Hillingdon",
    "Hounslow",
    "Islington",
    "Kensington And Chelsea",
    "Kingston upon Thames",
    "Lambeth",
    "Lewisham",
    "Merton",
    "Newham",
    "Redbridge",
    "Richmond upon Thames",
    "Southwark",
    "Sutton",
    "Tower Hamlets",
    "Waltham Forest",
    "Wandsworth",
];

const GREATER_MANCHESTER: &[&str] = &[
    "Greater Manchester",
    "Bolton",
    "Bury",
    "Manchester",
    "Oldham",
    "Rochdale",
    "Salford",
    "Stockport",
    "Tameside",
    "Trafford",
    "Wigan",
];

const WEST_MIDLANDS: &[&str] = &[
    "Birmingham",
    "Coventry",
    "Dudley",
    "Sandwell",
    "Solihull",
    "Walsall",
    "Wolverhampton",
];

const WEST_YORKSHIRE: &[&str] = &[
    "West Yorkshire",
    "Bradford",
    "Calderdale",
    "Kirklees",
    "Leeds",
    "Wakefield",
];

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;
    use chrono::NaiveDate;

    fn dataset(regions: &[&str]) -> Dataset {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let records = regions
            .iter()
            .map(|r| Record::new(*r, date, Some(1.0), None))
            .collect();
        Dataset::new("mem", records, false)
    }

    #[test]
    fn test_all_sentinel_lists_every_region() {
        let ds = dataset(&["York", "Bath", "York", "Leeds"]);
        let h = RegionHierarchy::default();
        assert_eq!(h.child_regions_of(ALL_DATA, &ds), vec!["Bath", "Leeds", "York"]);
    }

    #[test]
    fn test_declared_parent_children_sorted() {
        let ds = dataset(&[]);
        let h = RegionHierarchy::single_level(ALL_DATA)
            .with_group("Tyne and Wear", ["Sunderland", "Gateshead", "Newcastle upon Tyne"]);
        assert_eq!(
            h.child_regions_of("Tyne and Wear", &ds),
            vec!["Gateshead", "Newcastle upon Tyne", "Sunderland"]
        );
        assert!(h.child_regions_of("Nowhere", &ds).is_empty());
    }

    #[test]
    fn test_single_level_ignores_parent() {
        let ds = dataset(&["York", "Bath"]);
        let h = RegionHierarchy::single_level(ALL_DATA);
        assert_eq!(h.child_regions_of("anything", &ds), vec!["Bath", "York"]);
    }

    #[test]
    fn test_parent_options_sentinel_last() {
        let h = RegionHierarchy::single_level(ALL_DATA)
            .with_group("Zeta", ["z"])
            .with_group("Alpha", ["a"]);
        assert_eq!(h.parent_options(), vec!["Alpha", "Zeta", ALL_DATA]);
    }

    #[test]
    fn test_group_named_like_sentinel_is_ignored() {
        let h = RegionHierarchy::single_level(ALL_DATA).with_group(ALL_DATA, ["x"]);
        assert!(h.is_single_level());
    }

    #[test]
    fn test_default_selection() {
        let candidates: Vec<String> = vec!["Bath".into(), "London".into(), "York".into()];
        assert_eq!(default_selection(&candidates, "London"), Some("London".into()));
        assert_eq!(default_selection(&candidates, "Paris"), Some("Bath".into()));
        assert_eq!(default_selection(&[], "London"), None);
    }

    #[test]
    fn test_builtin_london_contains_aggregate() {
        let h = RegionHierarchy::default();
        let children = h.child_regions_of("Greater London", &dataset(&[]));
        assert!(children.contains(&"London".to_string()));
        assert!(children.windows(2).all(|w| w[0] <= w[1]));
    }
}
