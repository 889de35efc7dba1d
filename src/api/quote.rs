use axum::extract::{Query, State};
use serde::Deserialize;
use std::time::Instant;
use validator::{Validate, ValidationError};

use crate::api::error::ApiError;
use crate::api::response::{success, ApiResponse};
use crate::controller::{AppState, Quote, QuoteRequest, SiteOverride};
use crate::domain::{ClientMode, ClientProfile, PriceLevel, Region};
use crate::engine::ScenarioRequest;

/// Query parameters of `GET /api/v1/quote`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct QuoteQuery {
    pub region: Region,
    pub client_mode: ClientMode,
    pub price_level: Option<PriceLevel>,

    #[validate(range(min = 0.0), custom(function = "finite"))]
    pub roof_surface_m2: f64,
    #[validate(range(min = 0.0), custom(function = "finite"))]
    pub yearly_consumption_kwh: f64,
    #[validate(range(min = 0.0), custom(function = "finite"))]
    pub yearly_utility_payment: f64,

    #[serde(default)]
    #[validate(range(min = 0.0), custom(function = "finite"))]
    pub discount_amount: f64,
    #[serde(default)]
    #[validate(range(min = 0.0), custom(function = "finite"))]
    pub addon_cost: f64,
    #[validate(range(min = 1))]
    pub manual_kit_power_w: Option<u32>,

    #[validate(range(min = -90.0, max = 90.0), custom(function = "finite"))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0), custom(function = "finite"))]
    pub longitude: Option<f64>,
    #[validate(range(min = 0.0, max = 90.0), custom(function = "finite"))]
    pub tilt_deg: Option<f64>,
    #[validate(range(min = 0.0, max = 360.0), custom(function = "finite"))]
    pub azimuth_deg: Option<f64>,
}

fn finite(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::new("finite"))
    }
}

impl From<QuoteQuery> for QuoteRequest {
    fn from(q: QuoteQuery) -> Self {
        let mut scenario = ScenarioRequest::new(q.region)
            .with_discount(q.discount_amount)
            .with_addon_cost(q.addon_cost);
        if let Some(level) = q.price_level {
            scenario = scenario.with_price_level(level);
        }
        if let Some(power_w) = q.manual_kit_power_w {
            scenario = scenario.with_manual_kit_power(power_w);
        }

        QuoteRequest {
            client: ClientProfile::new(
                q.roof_surface_m2,
                q.yearly_consumption_kwh,
                q.yearly_utility_payment,
                q.client_mode,
            ),
            scenario,
            site: SiteOverride {
                latitude: q.latitude,
                longitude: q.longitude,
                tilt_deg: q.tilt_deg,
                azimuth_deg: q.azimuth_deg,
            },
        }
    }
}

/// GET /api/v1/quote
pub async fn get_quote(
    State(st): State<AppState>,
    Query(q): Query<QuoteQuery>,
) -> Result<ApiResponse<Quote>, ApiError> {
    let start = Instant::now();
    q.validate()?;

    let request = QuoteRequest::from(q);
    let quote = st.controller.quote(&request).await?;

    Ok(success(quote).with_duration(start.elapsed().as_millis() as u64))
}
