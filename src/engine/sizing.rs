//! # Kit Selector
//!
//! Picks the catalog entry closest to what the roof can hold and the
//! household consumes. One parameterized routine serves every region; the
//! regional differences live in [`SizingConstants`].

use tracing::debug;

use super::EngineError;
use crate::domain::{ClientMode, KitEntry, KitSelection, PriceLevel};
use crate::rules::{KitCatalog, RegionProfile};

/// Region-specific inputs to the sizing formula
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingConstants {
    pub panel_area_m2: f64,
    pub panel_unit_power_w: u32,
    pub yield_kwh_per_kw: f64,
    pub sizing_buffer: f64,
}

impl From<&RegionProfile> for SizingConstants {
    fn from(profile: &RegionProfile) -> Self {
        Self {
            panel_area_m2: profile.panel_area_m2,
            panel_unit_power_w: profile.panel_unit_power_w,
            yield_kwh_per_kw: profile.yield_kwh_per_kw,
            sizing_buffer: profile.sizing_buffer,
        }
    }
}

/// Negative, NaN and infinite measurements count as zero
fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Largest power (W) that fits on the roof: whole panels only
pub fn max_power_by_surface_w(roof_surface_m2: f64, constants: &SizingConstants) -> f64 {
    if constants.panel_area_m2 <= 0.0 {
        return 0.0;
    }
    let panels = (sanitize(roof_surface_m2) / constants.panel_area_m2).floor();
    panels * f64::from(constants.panel_unit_power_w)
}

/// Power (W) needed to cover the yearly consumption, oversized by the buffer
pub fn consumption_target_w(yearly_consumption_kwh: f64, constants: &SizingConstants) -> f64 {
    if constants.yield_kwh_per_kw <= 0.0 {
        return 0.0;
    }
    sanitize(yearly_consumption_kwh) / constants.yield_kwh_per_kw * 1000.0 * constants.sizing_buffer
}

/// Installable target: consumption need capped by roof capacity
pub fn target_power_w(
    roof_surface_m2: f64,
    yearly_consumption_kwh: f64,
    constants: &SizingConstants,
) -> f64 {
    max_power_by_surface_w(roof_surface_m2, constants)
        .min(consumption_target_w(yearly_consumption_kwh, constants))
}

/// Entry with the smallest distance to `target_w`. On a tie the smaller
/// rating wins, which relies on the catalog being sorted ascending.
pub fn closest_kit(catalog: &KitCatalog, target_w: f64) -> Option<&KitEntry> {
    let mut best: Option<(&KitEntry, f64)> = None;
    for entry in catalog.entries() {
        let distance = (f64::from(entry.power_w) - target_w).abs();
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((entry, distance)),
        }
    }
    best.map(|(entry, _)| entry)
}

/// Resolve the list price of `entry` for a client mode.
///
/// Residential kits always use the base price. Professional kits use the
/// requested tier, `base` when none is given.
pub fn price_selection(
    entry: &KitEntry,
    mode: ClientMode,
    price_level: Option<PriceLevel>,
    manual: bool,
) -> Result<KitSelection, EngineError> {
    let (list_price, level) = match mode {
        ClientMode::Residential => (entry.prices.base, None),
        ClientMode::Professional => {
            let level = price_level.unwrap_or_default();
            let price = entry.prices.get(level).ok_or(EngineError::MissingPriceLevel {
                power_w: entry.power_w,
                level,
            })?;
            (price, Some(level))
        }
    };

    Ok(KitSelection {
        power_w: entry.power_w,
        panel_count: entry.panel_count,
        list_price,
        subsidy_amount: entry.subsidy_amount,
        price_level: level,
        manual,
    })
}

/// Select the recommended kit for a roof and consumption profile
pub fn select_kit(
    roof_surface_m2: f64,
    yearly_consumption_kwh: f64,
    profile: &RegionProfile,
    mode: ClientMode,
    price_level: Option<PriceLevel>,
) -> Result<KitSelection, EngineError> {
    let rules = profile.mode(mode).ok_or(EngineError::MissingRules {
        region: profile.region,
        mode,
    })?;

    let constants = SizingConstants::from(profile);
    let target_w = target_power_w(roof_surface_m2, yearly_consumption_kwh, &constants);

    let entry = closest_kit(&rules.catalog, target_w).ok_or(EngineError::EmptyCatalog {
        region: profile.region,
        mode,
    })?;

    debug!(
        region = %profile.region,
        %mode,
        target_w,
        power_w = entry.power_w,
        "selected kit"
    );

    price_selection(entry, mode, price_level, false)
}
