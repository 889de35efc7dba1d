use axum::extract::State;
use serde::Serialize;
use std::collections::BTreeMap;
use strum::IntoEnumIterator;

use crate::api::response::{success, ApiResponse};
use crate::controller::AppState;
use crate::domain::ClientMode;
use crate::rules::{ModeSettings, RegionProfile, RuleTables, Tariffs};

/// Rule tables as exposed to clients
#[derive(Debug, Serialize)]
pub struct RegionsOverview {
    pub tariffs: Tariffs,
    pub optimal_tolerance: f64,
    pub modes: BTreeMap<ClientMode, ModeSettings>,
    pub regions: Vec<RegionProfile>,
}

impl From<&RuleTables> for RegionsOverview {
    fn from(tables: &RuleTables) -> Self {
        Self {
            tariffs: *tables.tariffs(),
            optimal_tolerance: tables.optimal_tolerance(),
            modes: ClientMode::iter()
                .filter_map(|mode| tables.mode_settings(mode).map(|s| (mode, *s)))
                .collect(),
            regions: tables.regions().cloned().collect(),
        }
    }
}

/// GET /api/v1/regions
pub async fn list_regions(State(st): State<AppState>) -> ApiResponse<RegionsOverview> {
    let overview = RegionsOverview::from(st.tables.as_ref());
    let count = overview.regions.len();
    success(overview).with_count(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overview_lists_builtin_regions() {
        let tables = RuleTables::builtin().unwrap();
        let overview = RegionsOverview::from(&tables);

        assert_eq!(overview.regions.len(), 2);
        assert_eq!(overview.modes.len(), 2);
        assert_eq!(overview.modes[&ClientMode::Residential].autoconsumption_rate, 0.85);

        let json = serde_json::to_value(&overview).unwrap();
        assert!(json["regions"][0]["modes"]["residential"]["catalog"].is_array());
    }
}
