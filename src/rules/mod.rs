//! # Regional Rule Tables
//!
//! Static reference data for quoting: kit catalogs, loan terms and sizing
//! constants per region and client mode. Tables are parsed and validated once
//! at startup, then shared read-only (usually behind an `Arc`).

mod loader;

pub use loader::RulesError;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use crate::domain::{ClientMode, KitEntry, Region};

const BUILTIN_RULES: &str = include_str!("../../config/regions.toml");

/// Energy tariffs used to value production
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tariffs {
    /// Retail price avoided for each self-consumed kWh
    pub retail_rate_per_kwh: f64,
    /// Price paid for each exported kWh
    pub export_rate_per_kwh: f64,
}

/// Per-mode settings shared by every region
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModeSettings {
    /// Fraction of production consumed on site (0.0-1.0)
    pub autoconsumption_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InterestRateSet {
    pub rate_without_subsidy: f64,
    pub rate_with_subsidy: f64,
}

/// Allowed loan durations, inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancingWindow {
    pub min_years: u32,
    pub max_years: u32,
}

impl FinancingWindow {
    pub fn years(&self) -> std::ops::RangeInclusive<u32> {
        self.min_years..=self.max_years
    }
}

/// Kits for one region and mode, sorted by ascending power
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KitCatalog(Vec<KitEntry>);

impl KitCatalog {
    pub fn new(mut entries: Vec<KitEntry>) -> Self {
        entries.sort_by_key(|e| e.power_w);
        entries.dedup_by_key(|e| e.power_w);
        Self(entries)
    }

    pub fn entries(&self) -> &[KitEntry] {
        &self.0
    }

    pub fn get(&self, power_w: u32) -> Option<&KitEntry> {
        self.0
            .binary_search_by_key(&power_w, |e| e.power_w)
            .ok()
            .map(|idx| &self.0[idx])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Catalog and financing terms for one (region, mode) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeRules {
    pub catalog: KitCatalog,
    pub rates: InterestRateSet,
    pub window: FinancingWindow,
}

/// Sizing constants and mode rules for one region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionProfile {
    pub region: Region,
    pub panel_area_m2: f64,
    pub panel_unit_power_w: u32,
    /// Expected yearly production per installed kW
    pub yield_kwh_per_kw: f64,
    /// Oversizing factor applied to the consumption target (> 1.0)
    pub sizing_buffer: f64,
    pub reference_latitude: f64,
    pub reference_longitude: f64,
    pub modes: BTreeMap<ClientMode, ModeRules>,
}

impl RegionProfile {
    pub fn mode(&self, mode: ClientMode) -> Option<&ModeRules> {
        self.modes.get(&mode)
    }

    /// Production estimate from the regional yield alone
    pub fn estimate_annual_kwh(&self, power_kw: f64) -> f64 {
        (power_kw * self.yield_kwh_per_kw).max(0.0)
    }
}

/// Immutable rule tables keyed by region and client mode
#[derive(Debug, Clone, PartialEq)]
pub struct RuleTables {
    regions: BTreeMap<Region, RegionProfile>,
    modes: BTreeMap<ClientMode, ModeSettings>,
    tariffs: Tariffs,
    optimal_tolerance: f64,
}

impl RuleTables {
    /// Tables shipped with the binary
    pub fn builtin() -> Result<Self, RulesError> {
        Self::from_toml_str(BUILTIN_RULES)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, RulesError> {
        let file: loader::RulesFile = toml::from_str(raw)?;
        file.into_tables()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RulesError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| RulesError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let tables = Self::from_toml_str(&raw)?;
        info!(path = %path.display(), regions = tables.regions.len(), "loaded rule tables");
        Ok(tables)
    }

    /// Load from `path` when given, otherwise fall back to the built-in tables
    pub fn load_or_builtin(path: Option<&str>) -> Result<Self, RulesError> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let tables = Self::builtin()?;
                info!(regions = tables.regions.len(), "using built-in rule tables");
                Ok(tables)
            }
        }
    }

    pub fn region(&self, region: Region) -> Option<&RegionProfile> {
        self.regions.get(&region)
    }

    pub fn regions(&self) -> impl Iterator<Item = &RegionProfile> {
        self.regions.values()
    }

    /// Resolve the rules for a (region, mode) pair
    pub fn lookup(&self, region: Region, mode: ClientMode) -> Option<(&RegionProfile, &ModeRules)> {
        let profile = self.regions.get(&region)?;
        let rules = profile.mode(mode)?;
        Some((profile, rules))
    }

    pub fn mode_settings(&self, mode: ClientMode) -> Option<&ModeSettings> {
        self.modes.get(&mode)
    }

    pub fn tariffs(&self) -> &Tariffs {
        &self.tariffs
    }

    /// Band around zero (currency units) accepted by the optimal-duration pick
    pub fn optimal_tolerance(&self) -> f64 {
        self.optimal_tolerance
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::PriceLevel;
    use strum::IntoEnumIterator;

    /// Minimal single-region tables for tests that need predictable numbers
    pub(crate) const SMALL_RULES: &str = r#"
        [tariffs]
        retail_rate_per_kwh = 0.25
        export_rate_per_kwh = 0.10

        [financing]
        optimal_tolerance = 20.0

        [modes.residential]
        autoconsumption_rate = 0.85

        [modes.professional]
        autoconsumption_rate = 0.70

        [[regions]]
        region = "mainland"
        panel_area_m2 = 2.0
        panel_unit_power_w = 500
        yield_kwh_per_kw = 1000.0
        sizing_buffer = 1.2
        reference_latitude = 45.0
        reference_longitude = 3.0

        [regions.residential]
        rate_without_subsidy = 0.06
        rate_with_subsidy = 0.05
        min_years = 6
        max_years = 15

        [[regions.residential.kits]]
        power_w = 3000
        panel_count = 6
        subsidy_amount = 500.0
        prices = { base = 9000.0 }

        [[regions.residential.kits]]
        power_w = 6000
        panel_count = 12
        subsidy_amount = 1000.0
        prices = { base = 15000.0 }

        [regions.professional]
        rate_without_subsidy = 0.065
        rate_with_subsidy = 0.055
        min_years = 5
        max_years = 10

        [[regions.professional.kits]]
        power_w = 9000
        panel_count = 18
        subsidy_amount = 1000.0
        prices = { base = 20000.0, discount = 19000.0, max_discount = 18000.0 }
    "#;

    pub(crate) fn small_tables() -> RuleTables {
        RuleTables::from_toml_str(SMALL_RULES).unwrap()
    }

    #[test]
    fn test_builtin_tables_cover_every_region_and_mode() {
        let tables = RuleTables::builtin().unwrap();
        for region in Region::iter() {
            for mode in ClientMode::iter() {
                let (profile, rules) = tables
                    .lookup(region, mode)
                    .unwrap_or_else(|| panic!("missing rules for {region}/{mode}"));
                assert_eq!(profile.region, region);
                assert!(!rules.catalog.is_empty());
                assert!(rules.window.min_years <= rules.window.max_years);
            }
            assert!(tables.mode_settings(ClientMode::Residential).is_some());
        }
    }

    #[test]
    fn test_builtin_professional_catalogs_are_tiered() {
        let tables = RuleTables::builtin().unwrap();
        for region in Region::iter() {
            let (_, rules) = tables.lookup(region, ClientMode::Professional).unwrap();
            for kit in rules.catalog.entries() {
                for level in PriceLevel::iter() {
                    assert!(kit.prices.get(level).is_some());
                }
            }
        }
    }

    #[test]
    fn test_residential_autoconsumption_exceeds_professional() {
        let tables = RuleTables::builtin().unwrap();
        let residential = tables.mode_settings(ClientMode::Residential).unwrap();
        let professional = tables.mode_settings(ClientMode::Professional).unwrap();
        assert!(residential.autoconsumption_rate > professional.autoconsumption_rate);
    }

    #[test]
    fn test_catalog_lookup() {
        let tables = small_tables();
        let (_, rules) = tables.lookup(Region::Mainland, ClientMode::Residential).unwrap();
        assert_eq!(rules.catalog.len(), 2);
        assert_eq!(rules.catalog.get(6000).map(|k| k.panel_count), Some(12));
        assert!(rules.catalog.get(4500).is_none());
        assert!(tables.lookup(Region::Island, ClientMode::Residential).is_none());
    }

    #[test]
    fn test_financing_window() {
        let window = FinancingWindow {
            min_years: 6,
            max_years: 15,
        };
        assert_eq!(window.years().count(), 10);
        assert_eq!(window.years().next(), Some(6));
        assert_eq!(window.years().last(), Some(15));
    }

    #[test]
    fn test_rejects_empty_catalog() {
        let raw = SMALL_RULES.replace(
            "[[regions.professional.kits]]\n        power_w = 9000\n        panel_count = 18\n        subsidy_amount = 1000.0\n        prices = { base = 20000.0, discount = 19000.0, max_discount = 18000.0 }",
            "",
        );
        let err = RuleTables::from_toml_str(&raw).unwrap_err();
        assert!(matches!(
            err,
            RulesError::EmptyCatalog {
                mode: ClientMode::Professional,
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_missing_professional_tier() {
        let raw = SMALL_RULES.replace(", max_discount = 18000.0", "");
        let err = RuleTables::from_toml_str(&raw).unwrap_err();
        assert!(matches!(
            err,
            RulesError::MissingPriceLevel {
                level: PriceLevel::MaxDiscount,
                power_w: 9000,
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_inverted_window() {
        let raw = SMALL_RULES.replace("min_years = 5\n        max_years = 10", "min_years = 12\n        max_years = 10");
        let err = RuleTables::from_toml_str(&raw).unwrap_err();
        assert!(matches!(err, RulesError::InvalidWindow { min_years: 12, max_years: 10, .. }));
    }

    #[test]
    fn test_rejects_zero_year_window() {
        let raw = SMALL_RULES.replace("min_years = 6", "min_years = 0");
        let err = RuleTables::from_toml_str(&raw).unwrap_err();
        assert!(matches!(
            err,
            RulesError::InvalidWindow {
                mode: ClientMode::Residential,
                min_years: 0,
                max_years: 15,
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_missing_mode() {
        let (residential_only, _) = SMALL_RULES.split_once("[regions.professional]").unwrap();
        let err = RuleTables::from_toml_str(residential_only).unwrap_err();
        assert!(matches!(
            err,
            RulesError::MissingMode {
                region: Region::Mainland,
                mode: ClientMode::Professional,
            }
        ));
    }

    #[test]
    fn test_rejects_duplicate_kit_power() {
        let raw = SMALL_RULES
            .replace("power_w = 6000\n        panel_count = 12", "power_w = 3000\n        panel_count = 6");
        let err = RuleTables::from_toml_str(&raw).unwrap_err();
        assert!(matches!(err, RulesError::UnsortedCatalog { power_w: 3000, .. }));
    }

    #[test]
    fn test_rejects_out_of_range_interest_rate() {
        let raw = SMALL_RULES.replace("rate_with_subsidy = 0.05\n", "rate_with_subsidy = 1.05\n");
        let err = RuleTables::from_toml_str(&raw).unwrap_err();
        match err {
            RulesError::OutOfRange { field, value } => {
                assert_eq!(field, "mainland.residential.rate_with_subsidy");
                assert_eq!(value, 1.05);
            }
            other => panic!("unexpected error: {other}"),
        }

        let raw = SMALL_RULES.replace("rate_without_subsidy = 0.065", "rate_without_subsidy = -0.01");
        let err = RuleTables::from_toml_str(&raw).unwrap_err();
        assert!(matches!(err, RulesError::OutOfRange { .. }));
    }

    #[test]
    fn test_rejects_unsorted_catalog() {
        let raw = SMALL_RULES
            .replace("power_w = 3000\n        panel_count = 6", "power_w = 7000\n        panel_count = 14");
        let err = RuleTables::from_toml_str(&raw).unwrap_err();
        assert!(matches!(err, RulesError::UnsortedCatalog { power_w: 6000, .. }));
    }

    #[test]
    fn test_rejects_panel_mismatch() {
        let raw = SMALL_RULES.replace("panel_count = 12", "panel_count = 11");
        let err = RuleTables::from_toml_str(&raw).unwrap_err();
        assert!(matches!(err, RulesError::PanelMismatch { power_w: 6000, .. }));
    }

    #[test]
    fn test_rejects_out_of_range_autoconsumption() {
        let raw = SMALL_RULES.replace("autoconsumption_rate = 0.85", "autoconsumption_rate = 1.5");
        let err = RuleTables::from_toml_str(&raw).unwrap_err();
        assert!(matches!(err, RulesError::OutOfRange { .. }));
    }

    #[test]
    fn test_rejects_duplicate_region() {
        let region_block = SMALL_RULES
            .split_once("[[regions]]")
            .map(|(_, rest)| format!("[[regions]]{rest}"))
            .unwrap();
        let raw = format!("{SMALL_RULES}\n{region_block}");
        let err = RuleTables::from_toml_str(&raw).unwrap_err();
        assert!(matches!(err, RulesError::DuplicateRegion(Region::Mainland)));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let err = RuleTables::from_toml_str("[tariffs\nretail = ").unwrap_err();
        assert!(matches!(err, RulesError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = RuleTables::load("/nonexistent/regions.toml").unwrap_err();
        assert!(matches!(err, RulesError::Io { .. }));
    }
}
