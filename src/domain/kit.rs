use serde::{Deserialize, Serialize};

use super::PriceLevel;

/// List prices for one kit. Residential entries only carry `base`;
/// professional entries carry all three tiers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KitPrices {
    pub base: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_discount: Option<f64>,
}

impl KitPrices {
    /// Price for a tier, if the entry defines it
    pub fn get(&self, level: PriceLevel) -> Option<f64> {
        match level {
            PriceLevel::Base => Some(self.base),
            PriceLevel::Discount => self.discount,
            PriceLevel::MaxDiscount => self.max_discount,
        }
    }
}

#[cfg(test)]
impl KitPrices {
    pub fn single(base: f64) -> Self {
        Self {
            base,
            discount: None,
            max_discount: None,
        }
    }

    pub fn tiered(base: f64, discount: f64, max_discount: f64) -> Self {
        Self {
            base,
            discount: Some(discount),
            max_discount: Some(max_discount),
        }
    }
}

/// One installable configuration in a regional catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KitEntry {
    /// Rated power (W), the catalog key
    pub power_w: u32,
    pub panel_count: u32,
    pub prices: KitPrices,
    /// Subsidy granted for this kit (currency units)
    #[serde(default)]
    pub subsidy_amount: f64,
}

/// Catalog entry chosen for a quote, with its price resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KitSelection {
    pub power_w: u32,
    pub panel_count: u32,
    pub list_price: f64,
    pub subsidy_amount: f64,
    /// Tier used to resolve `list_price`, professional quotes only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_level: Option<PriceLevel>,
    /// True when the power came from a manual override
    pub manual: bool,
}

impl KitSelection {
    pub fn power_kw(&self) -> f64 {
        f64::from(self.power_w) / 1000.0
    }
}
