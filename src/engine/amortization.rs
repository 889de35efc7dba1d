//! # Amortization Calculator
//!
//! Fixed-rate annuity math and the schedules built from it.
//!
//! With `r = annual_rate / 12` and `n = years * 12` the monthly payment is
//! `P * r * (1+r)^n / ((1+r)^n - 1)`, or `P / n` at a zero rate. Payments are
//! rounded to cents, and rounding is monotone, so a schedule built for a fixed
//! principal and rate stays non-increasing as the duration grows.

use strum::IntoEnumIterator;
use tracing::debug;

use crate::domain::{FinancingOption, FinancingSchedule, KitPrices, PriceLevel, TierQuote};
use crate::rules::FinancingWindow;

/// Round a currency amount to cents
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn installments(duration_years: u32) -> u32 {
    // a zero-year loan collapses to one installment
    duration_years.saturating_mul(12).max(1)
}

/// Monthly payment of a fixed-rate loan, rounded to cents.
///
/// A principal of zero or less (subsidies covering the price) yields 0.
/// Negative or non-finite rates are treated as 0.
pub fn amortize(principal: f64, annual_rate: f64, duration_years: u32) -> f64 {
    if !principal.is_finite() || principal <= 0.0 {
        return 0.0;
    }

    let n = f64::from(installments(duration_years));
    let r = if annual_rate.is_finite() && annual_rate > 0.0 {
        annual_rate / 12.0
    } else {
        0.0
    };

    let payment = if r > 0.0 {
        let growth = (1.0 + r).powf(n);
        principal * r * growth / (growth - 1.0)
    } else {
        principal / n
    };

    round_cents(payment)
}

/// One financing option, annotated against the monthly savings
pub fn financing_option(
    principal: f64,
    annual_rate: f64,
    duration_years: u32,
    monthly_savings: f64,
) -> FinancingOption {
    let principal = if principal.is_finite() { principal.max(0.0) } else { 0.0 };
    let monthly_payment = amortize(principal, annual_rate, duration_years);
    let total_paid = round_cents(monthly_payment * f64::from(installments(duration_years)));

    FinancingOption {
        duration_years,
        monthly_payment,
        difference_vs_savings: round_cents(monthly_payment - monthly_savings),
        total_paid,
        total_interest: total_paid - principal,
    }
}

/// One option per whole year of the window, ascending by duration
pub fn build_schedule(
    principal: f64,
    annual_rate: f64,
    window: &FinancingWindow,
    monthly_savings: f64,
) -> FinancingSchedule {
    FinancingSchedule(
        window
            .years()
            .map(|years| financing_option(principal, annual_rate, years, monthly_savings))
            .collect(),
    )
}

/// First-match duration policy.
///
/// Walks the schedule in ascending duration order and returns the first
/// option whose rounded `difference_vs_savings` lies within `tolerance`, so
/// the pick agrees with the figures shown to the client. When none
/// qualifies, returns the longest (cheapest per month) duration. `None` only
/// for an empty schedule.
pub fn pick_optimal_duration(
    schedule: &FinancingSchedule,
    monthly_savings: f64,
    tolerance: f64,
) -> Option<u32> {
    let tolerance = tolerance.abs();
    let first_match = schedule
        .iter()
        .find(|option| option.difference_vs_savings.abs() <= tolerance);

    let picked = first_match.or_else(|| schedule.longest()).map(|o| o.duration_years);
    debug!(
        monthly_savings,
        tolerance,
        matched = first_match.is_some(),
        duration_years = ?picked,
        "picked financing duration"
    );
    picked
}

/// Amounts moved between the list price and the financed principal
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PrincipalAdjustments {
    pub subsidy: f64,
    pub discount: f64,
    /// Extra equipment financed with the kit
    pub addon_cost: f64,
}

impl PrincipalAdjustments {
    /// Principal left to finance from `list_price`, see [`financed_principal`]
    pub fn apply(&self, list_price: f64) -> (f64, bool) {
        financed_principal(list_price, self.subsidy, self.discount, self.addon_cost)
    }
}

/// Principal left to finance after subsidy and discount, plus add-ons.
/// Returns the clamped principal and whether it was fully covered.
pub fn financed_principal(list_price: f64, subsidy: f64, discount: f64, addon_cost: f64) -> (f64, bool) {
    let raw = round_cents(list_price - subsidy - discount + addon_cost);
    if raw <= 0.0 {
        (0.0, true)
    } else {
        (raw, false)
    }
}

/// Quote every price tier of a professional kit at the with-subsidy rate
pub fn build_tier_quotes(
    prices: &KitPrices,
    adjustments: &PrincipalAdjustments,
    annual_rate: f64,
    window: &FinancingWindow,
    monthly_savings: f64,
    tolerance: f64,
) -> Vec<TierQuote> {
    PriceLevel::iter()
        .filter_map(|level| {
            let list_price = prices.get(level)?;
            let (principal, _) = adjustments.apply(list_price);
            let schedule = build_schedule(principal, annual_rate, window, monthly_savings);
            let recommended_duration_years =
                pick_optimal_duration(&schedule, monthly_savings, tolerance)?;
            Some(TierQuote {
                price_level: level,
                list_price,
                financed_principal: principal,
                schedule,
                recommended_duration_years,
            })
        })
        .collect()
}
