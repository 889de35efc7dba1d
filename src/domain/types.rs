use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

// ============================================================================
// Market Segmentation Types
// ============================================================================

/// Supported sales regions. Each region has its own catalog, rates and
/// sizing constants.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Region {
    Mainland,
    Island,
}

/// Client category. Selects the catalog, the financing window and the
/// autoconsumption ratio.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ClientMode {
    Residential,
    Professional,
}

/// Professional pricing tier. Residential quotes always use `Base`.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum PriceLevel {
    #[default]
    Base,
    Discount,
    MaxDiscount,
}

// ============================================================================
// Client Snapshot
// ============================================================================

/// Read-only snapshot of a prospective customer, as handed to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientProfile {
    /// Usable roof surface (m²)
    pub roof_surface_m2: f64,
    /// Yearly electricity consumption (kWh)
    pub yearly_consumption_kwh: f64,
    /// Yearly amount paid to the utility (currency units)
    pub yearly_utility_payment: f64,
    pub mode: ClientMode,
}

impl ClientProfile {
    pub fn new(
        roof_surface_m2: f64,
        yearly_consumption_kwh: f64,
        yearly_utility_payment: f64,
        mode: ClientMode,
    ) -> Self {
        Self {
            roof_surface_m2,
            yearly_consumption_kwh,
            yearly_utility_payment,
            mode,
        }
    }

    /// Current monthly utility bill, never negative
    pub fn monthly_bill(&self) -> f64 {
        if self.yearly_utility_payment.is_finite() {
            (self.yearly_utility_payment / 12.0).max(0.0)
        } else {
            0.0
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
