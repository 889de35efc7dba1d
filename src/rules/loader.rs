use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

use super::{
    FinancingWindow, InterestRateSet, KitCatalog, ModeRules, ModeSettings, RegionProfile,
    RuleTables, Tariffs,
};
use crate::domain::{ClientMode, KitEntry, PriceLevel, Region};

/// Faults in the rule tables. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum RulesError {
    #[error("Failed to read rules file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse rules: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Region {0} is defined more than once")]
    DuplicateRegion(Region),
    #[error("Region {region} has no {mode} rules")]
    MissingMode { region: Region, mode: ClientMode },
    #[error("Region {region} has an empty {mode} catalog")]
    EmptyCatalog { region: Region, mode: ClientMode },
    #[error("Region {region} {mode} catalog is not strictly ascending at {power_w} W")]
    UnsortedCatalog {
        region: Region,
        mode: ClientMode,
        power_w: u32,
    },
    #[error("Region {region} {mode} kit {power_w} W has {panel_count} panels of {panel_unit_power_w} W")]
    PanelMismatch {
        region: Region,
        mode: ClientMode,
        power_w: u32,
        panel_count: u32,
        panel_unit_power_w: u32,
    },
    #[error("Region {region} {mode} kit {power_w} W has no {level} price")]
    MissingPriceLevel {
        region: Region,
        mode: ClientMode,
        power_w: u32,
        level: PriceLevel,
    },
    #[error("Region {region} {mode} financing window {min_years}..={max_years} is invalid")]
    InvalidWindow {
        region: Region,
        mode: ClientMode,
        min_years: u32,
        max_years: u32,
    },
    #[error("Invalid value for {field}: {value}")]
    OutOfRange { field: String, value: f64 },
}

#[derive(Debug, Deserialize)]
pub(super) struct RulesFile {
    tariffs: Tariffs,
    financing: FinancingSection,
    modes: ModesSection,
    regions: Vec<RegionSection>,
}

#[derive(Debug, Deserialize)]
struct FinancingSection {
    optimal_tolerance: f64,
}

#[derive(Debug, Deserialize)]
struct ModesSection {
    residential: ModeSettings,
    professional: ModeSettings,
}

#[derive(Debug, Deserialize)]
struct RegionSection {
    region: Region,
    panel_area_m2: f64,
    panel_unit_power_w: u32,
    yield_kwh_per_kw: f64,
    sizing_buffer: f64,
    reference_latitude: f64,
    reference_longitude: f64,
    residential: Option<ModeSection>,
    professional: Option<ModeSection>,
}

#[derive(Debug, Deserialize)]
struct ModeSection {
    rate_without_subsidy: f64,
    rate_with_subsidy: f64,
    min_years: u32,
    max_years: u32,
    #[serde(default)]
    kits: Vec<KitEntry>,
}

fn ensure_range(field: impl Into<String>, value: f64, min: f64, max: f64) -> Result<(), RulesError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(RulesError::OutOfRange {
            field: field.into(),
            value,
        })
    }
}

fn ensure_positive(field: impl Into<String>, value: f64) -> Result<(), RulesError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(RulesError::OutOfRange {
            field: field.into(),
            value,
        })
    }
}

impl RulesFile {
    pub(super) fn into_tables(self) -> Result<RuleTables, RulesError> {
        ensure_range("tariffs.retail_rate_per_kwh", self.tariffs.retail_rate_per_kwh, 0.0, f64::MAX)?;
        ensure_range("tariffs.export_rate_per_kwh", self.tariffs.export_rate_per_kwh, 0.0, f64::MAX)?;
        ensure_range("financing.optimal_tolerance", self.financing.optimal_tolerance, 0.0, f64::MAX)?;
        ensure_range(
            "modes.residential.autoconsumption_rate",
            self.modes.residential.autoconsumption_rate,
            0.0,
            1.0,
        )?;
        ensure_range(
            "modes.professional.autoconsumption_rate",
            self.modes.professional.autoconsumption_rate,
            0.0,
            1.0,
        )?;

        let mut regions = BTreeMap::new();
        for section in self.regions {
            let region = section.region;
            if regions.contains_key(&region) {
                return Err(RulesError::DuplicateRegion(region));
            }
            regions.insert(region, section.into_profile()?);
        }

        let mut modes = BTreeMap::new();
        modes.insert(ClientMode::Residential, self.modes.residential);
        modes.insert(ClientMode::Professional, self.modes.professional);

        Ok(RuleTables {
            regions,
            modes,
            tariffs: self.tariffs,
            optimal_tolerance: self.financing.optimal_tolerance,
        })
    }
}

impl RegionSection {
    fn into_profile(self) -> Result<RegionProfile, RulesError> {
        let region = self.region;
        ensure_positive(format!("{region}.panel_area_m2"), self.panel_area_m2)?;
        ensure_positive(format!("{region}.yield_kwh_per_kw"), self.yield_kwh_per_kw)?;
        ensure_range(format!("{region}.sizing_buffer"), self.sizing_buffer, 1.0, f64::MAX)?;
        ensure_range(format!("{region}.reference_latitude"), self.reference_latitude, -90.0, 90.0)?;
        ensure_range(format!("{region}.reference_longitude"), self.reference_longitude, -180.0, 180.0)?;
        if self.panel_unit_power_w == 0 {
            return Err(RulesError::OutOfRange {
                field: format!("{region}.panel_unit_power_w"),
                value: 0.0,
            });
        }

        let mut modes = BTreeMap::new();
        for (mode, section) in [
            (ClientMode::Residential, self.residential),
            (ClientMode::Professional, self.professional),
        ] {
            let section = section.ok_or(RulesError::MissingMode { region, mode })?;
            modes.insert(mode, section.into_rules(region, mode, self.panel_unit_power_w)?);
        }

        Ok(RegionProfile {
            region,
            panel_area_m2: self.panel_area_m2,
            panel_unit_power_w: self.panel_unit_power_w,
            yield_kwh_per_kw: self.yield_kwh_per_kw,
            sizing_buffer: self.sizing_buffer,
            reference_latitude: self.reference_latitude,
            reference_longitude: self.reference_longitude,
            modes,
        })
    }
}

impl ModeSection {
    fn into_rules(
        self,
        region: Region,
        mode: ClientMode,
        panel_unit_power_w: u32,
    ) -> Result<ModeRules, RulesError> {
        ensure_range(format!("{region}.{mode}.rate_without_subsidy"), self.rate_without_subsidy, 0.0, 1.0)?;
        ensure_range(format!("{region}.{mode}.rate_with_subsidy"), self.rate_with_subsidy, 0.0, 1.0)?;

        if self.min_years == 0 || self.min_years > self.max_years {
            return Err(RulesError::InvalidWindow {
                region,
                mode,
                min_years: self.min_years,
                max_years: self.max_years,
            });
        }

        if self.kits.is_empty() {
            return Err(RulesError::EmptyCatalog { region, mode });
        }

        let mut previous: Option<u32> = None;
        for kit in &self.kits {
            if previous.is_some_and(|p| kit.power_w <= p) {
                return Err(RulesError::UnsortedCatalog {
                    region,
                    mode,
                    power_w: kit.power_w,
                });
            }
            previous = Some(kit.power_w);

            if kit.panel_count.checked_mul(panel_unit_power_w) != Some(kit.power_w) {
                return Err(RulesError::PanelMismatch {
                    region,
                    mode,
                    power_w: kit.power_w,
                    panel_count: kit.panel_count,
                    panel_unit_power_w,
                });
            }

            ensure_positive(format!("{region}.{mode}.{}.prices.base", kit.power_w), kit.prices.base)?;
            ensure_range(
                format!("{region}.{mode}.{}.subsidy_amount", kit.power_w),
                kit.subsidy_amount,
                0.0,
                f64::MAX,
            )?;

            if mode == ClientMode::Professional {
                for (level, price) in [
                    (PriceLevel::Discount, kit.prices.discount),
                    (PriceLevel::MaxDiscount, kit.prices.max_discount),
                ] {
                    let price = price.ok_or(RulesError::MissingPriceLevel {
                        region,
                        mode,
                        power_w: kit.power_w,
                        level,
                    })?;
                    ensure_positive(format!("{region}.{mode}.{}.prices.{level}", kit.power_w), price)?;
                }
            }
        }

        Ok(ModeRules {
            catalog: KitCatalog::new(self.kits),
            rates: InterestRateSet {
                rate_without_subsidy: self.rate_without_subsidy,
                rate_with_subsidy: self.rate_with_subsidy,
            },
            window: FinancingWindow {
                min_years: self.min_years,
                max_years: self.max_years,
            },
        })
    }
}
