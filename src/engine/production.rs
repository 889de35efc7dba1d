use crate::domain::{BillSummary, ClientProfile, ProductionSplit};
use crate::rules::Tariffs;

/// Split a yearly production estimate into self-consumed and exported
/// energy and value it at the retail and export tariffs.
pub fn split_production(total_kwh: f64, autoconsumption_rate: f64, tariffs: &Tariffs) -> ProductionSplit {
    let total_kwh = if total_kwh.is_finite() { total_kwh.max(0.0) } else { 0.0 };
    if total_kwh == 0.0 {
        return ProductionSplit::zero();
    }

    let rate = autoconsumption_rate.clamp(0.0, 1.0);
    let autoconsumption_kwh = total_kwh * rate;
    let surplus_kwh = total_kwh - autoconsumption_kwh;

    let yearly_value = autoconsumption_kwh * tariffs.retail_rate_per_kwh
        + surplus_kwh * tariffs.export_rate_per_kwh;

    ProductionSplit {
        total_kwh,
        autoconsumption_kwh,
        surplus_kwh,
        monthly_savings: yearly_value / 12.0,
    }
}

/// Compare the client's current bill with the savings a split produces
pub fn bill_summary(client: &ClientProfile, split: &ProductionSplit) -> BillSummary {
    let current = client.monthly_bill();
    let savings = split.monthly_savings;
    let coverage_ratio = if current > 0.0 {
        (savings / current).clamp(0.0, 1.0)
    } else {
        0.0
    };

    BillSummary {
        current_monthly_bill: current,
        monthly_savings: savings,
        monthly_bill_after: (current - savings).max(0.0),
        coverage_ratio,
    }
}
