//! # Scenario Assembler
//!
//! Combines kit selection, the production split and the financing schedules
//! into one [`ScenarioResult`]. Pure: the output depends only on the inputs
//! and the rule tables.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::amortization::{build_schedule, build_tier_quotes, pick_optimal_duration, PrincipalAdjustments};
use super::production::{bill_summary, split_production};
use super::sizing::{price_selection, select_kit};
use super::EngineError;
use crate::domain::{ClientMode, ClientProfile, KitSelection, PriceLevel, Region, ScenarioResult};
use crate::rules::{ModeRules, RegionProfile, RuleTables};

/// Quote parameters beyond the client snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRequest {
    pub region: Region,
    /// Professional tier, ignored for residential clients
    #[serde(default)]
    pub price_level: Option<PriceLevel>,
    #[serde(default)]
    pub discount_amount: f64,
    /// Extra equipment financed with the kit, e.g. a storage battery
    #[serde(default)]
    pub addon_cost: f64,
    /// Bypasses the kit selector when set
    #[serde(default)]
    pub manual_kit_power_w: Option<u32>,
}

impl ScenarioRequest {
    pub fn new(region: Region) -> Self {
        Self {
            region,
            price_level: None,
            discount_amount: 0.0,
            addon_cost: 0.0,
            manual_kit_power_w: None,
        }
    }

    pub fn with_price_level(mut self, level: PriceLevel) -> Self {
        self.price_level = Some(level);
        self
    }

    pub fn with_discount(mut self, amount: f64) -> Self {
        self.discount_amount = amount;
        self
    }

    pub fn with_addon_cost(mut self, amount: f64) -> Self {
        self.addon_cost = amount;
        self
    }

    pub fn with_manual_kit_power(mut self, power_w: u32) -> Self {
        self.manual_kit_power_w = Some(power_w);
        self
    }

    fn validate(&self) -> Result<(), EngineError> {
        if !self.discount_amount.is_finite() || self.discount_amount < 0.0 {
            return Err(EngineError::InvalidInput(format!(
                "discount_amount must be a non-negative amount, got {}",
                self.discount_amount
            )));
        }
        if !self.addon_cost.is_finite() || self.addon_cost < 0.0 {
            return Err(EngineError::InvalidInput(format!(
                "addon_cost must be a non-negative amount, got {}",
                self.addon_cost
            )));
        }
        Ok(())
    }
}

fn lookup<'a>(
    tables: &'a RuleTables,
    region: Region,
    mode: ClientMode,
) -> Result<(&'a RegionProfile, &'a ModeRules), EngineError> {
    tables
        .lookup(region, mode)
        .ok_or(EngineError::MissingRules { region, mode })
}

/// Kit for a quote: the manual override when present, otherwise the selector
pub fn resolve_kit(
    tables: &RuleTables,
    client: &ClientProfile,
    request: &ScenarioRequest,
) -> Result<KitSelection, EngineError> {
    let mode = client.mode;
    let (profile, rules) = lookup(tables, request.region, mode)?;

    match request.manual_kit_power_w {
        Some(power_w) => {
            let entry = rules.catalog.get(power_w).ok_or_else(|| {
                warn!(power_w, region = %request.region, %mode, "manual kit power not in catalog");
                EngineError::UnknownKitPower {
                    power_w,
                    region: request.region,
                    mode,
                }
            })?;
            price_selection(entry, mode, request.price_level, true)
        }
        None => select_kit(
            client.roof_surface_m2,
            client.yearly_consumption_kwh,
            profile,
            mode,
            request.price_level,
        ),
    }
}

/// Build the full financed-price comparison for one client.
///
/// `annual_production_kwh` is the yearly estimate for the resolved kit; when
/// absent the regional yield per kW is used instead.
pub fn build_scenario(
    tables: &RuleTables,
    client: &ClientProfile,
    request: &ScenarioRequest,
    annual_production_kwh: Option<f64>,
) -> Result<ScenarioResult, EngineError> {
    request.validate()?;

    let region = request.region;
    let mode = client.mode;
    let (profile, rules) = lookup(tables, region, mode)?;
    let settings = tables
        .mode_settings(mode)
        .ok_or(EngineError::MissingRules { region, mode })?;

    let kit = resolve_kit(tables, client, request)?;

    let total_kwh =
        annual_production_kwh.unwrap_or_else(|| profile.estimate_annual_kwh(kit.power_kw()));
    let production = split_production(total_kwh, settings.autoconsumption_rate, tables.tariffs());
    let savings = production.monthly_savings;

    let adjustments = PrincipalAdjustments {
        subsidy: kit.subsidy_amount,
        discount: request.discount_amount,
        addon_cost: request.addon_cost,
    };
    let (principal, fully_subsidized) = adjustments.apply(kit.list_price);

    let schedule_without_subsidy =
        build_schedule(kit.list_price, rules.rates.rate_without_subsidy, &rules.window, savings);
    let schedule_with_subsidy =
        build_schedule(principal, rules.rates.rate_with_subsidy, &rules.window, savings);

    let tolerance = tables.optimal_tolerance();
    let empty_window = || EngineError::EmptyFinancingWindow { region, mode };
    let recommended_duration_years =
        pick_optimal_duration(&schedule_with_subsidy, savings, tolerance).ok_or_else(empty_window)?;
    let recommended_option = *schedule_with_subsidy
        .get(recommended_duration_years)
        .ok_or_else(empty_window)?;

    let tier_quotes = match mode {
        ClientMode::Professional => {
            let entry = rules.catalog.get(kit.power_w).ok_or(EngineError::UnknownKitPower {
                power_w: kit.power_w,
                region,
                mode,
            })?;
            build_tier_quotes(
                &entry.prices,
                &adjustments,
                rules.rates.rate_with_subsidy,
                &rules.window,
                savings,
                tolerance,
            )
        }
        ClientMode::Residential => Vec::new(),
    };

    debug!(
        %region,
        %mode,
        power_w = kit.power_w,
        principal,
        fully_subsidized,
        recommended_duration_years,
        "built scenario"
    );

    Ok(ScenarioResult {
        region,
        mode,
        bill: bill_summary(client, &production),
        kit,
        production,
        financed_principal: principal,
        fully_subsidized,
        schedule_without_subsidy,
        schedule_with_subsidy,
        recommended_duration_years,
        recommended_option,
        tier_quotes,
    })
}
