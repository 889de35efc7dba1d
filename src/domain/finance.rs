use serde::{Deserialize, Serialize};

use super::{ClientMode, KitSelection, PriceLevel, Region};

/// Yearly production split between on-site use and grid export
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProductionSplit {
    pub total_kwh: f64,
    pub autoconsumption_kwh: f64,
    pub surplus_kwh: f64,
    /// Avoided purchases plus export revenue, per month
    pub monthly_savings: f64,
}

impl ProductionSplit {
    pub fn zero() -> Self {
        Self {
            total_kwh: 0.0,
            autoconsumption_kwh: 0.0,
            surplus_kwh: 0.0,
            monthly_savings: 0.0,
        }
    }
}

/// One loan duration with its monthly cost
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinancingOption {
    pub duration_years: u32,
    pub monthly_payment: f64,
    /// `monthly_payment - monthly_savings`; negative means the installation
    /// pays for itself every month
    pub difference_vs_savings: f64,
    pub total_paid: f64,
    pub total_interest: f64,
}

/// Financing options ordered by ascending duration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FinancingSchedule(pub Vec<FinancingOption>);

impl FinancingSchedule {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FinancingOption> {
        self.0.iter()
    }

    /// Option for a given duration
    pub fn get(&self, duration_years: u32) -> Option<&FinancingOption> {
        self.0.iter().find(|o| o.duration_years == duration_years)
    }

    /// Longest duration, which carries the lowest monthly payment
    pub fn longest(&self) -> Option<&FinancingOption> {
        self.0.last()
    }
}

/// Financing at one professional price tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierQuote {
    pub price_level: PriceLevel,
    pub list_price: f64,
    pub financed_principal: f64,
    pub schedule: FinancingSchedule,
    pub recommended_duration_years: u32,
}

/// Effect of the installation on the client's utility bill
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BillSummary {
    pub current_monthly_bill: f64,
    pub monthly_savings: f64,
    pub monthly_bill_after: f64,
    /// Share of the current bill covered by savings (0 when there is no bill)
    pub coverage_ratio: f64,
}

/// Full output of one quote calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub region: Region,
    pub mode: ClientMode,
    pub kit: KitSelection,
    pub production: ProductionSplit,
    pub bill: BillSummary,
    /// `list_price - subsidy - discount + addon`, clamped at zero
    pub financed_principal: f64,
    pub fully_subsidized: bool,
    pub schedule_without_subsidy: FinancingSchedule,
    pub schedule_with_subsidy: FinancingSchedule,
    pub recommended_duration_years: u32,
    pub recommended_option: FinancingOption,
    /// Professional quotes only, one entry per price level
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tier_quotes: Vec<TierQuote>,
}
