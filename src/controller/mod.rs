use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::config::{Config, SiteConfig};
use crate::domain::{ClientProfile, ScenarioResult};
use crate::engine::{build_scenario, resolve_kit, EngineError, ScenarioRequest};
use crate::forecast::{ProductionEstimator, SimpleProductionEstimator, SiteParameters};
use crate::rules::RuleTables;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Config,
    pub tables: Arc<RuleTables>,
    pub controller: Arc<QuoteController>,
}

impl AppState {
    /// Load the rule tables once; every request shares them read-only
    pub fn new(cfg: Config) -> Result<Self> {
        let tables = Arc::new(RuleTables::load_or_builtin(cfg.rules.path.as_deref())?);
        let estimator: Arc<dyn ProductionEstimator> = Arc::new(SimpleProductionEstimator::default());
        Ok(Self::with_parts(cfg, tables, estimator))
    }

    pub fn with_parts(
        cfg: Config,
        tables: Arc<RuleTables>,
        estimator: Arc<dyn ProductionEstimator>,
    ) -> Self {
        let controller = Arc::new(QuoteController {
            tables: tables.clone(),
            estimator,
            site_defaults: cfg.site.clone(),
        });
        Self {
            cfg,
            tables,
            controller,
        }
    }
}

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("Production estimate failed: {0}")]
    Estimator(#[source] anyhow::Error),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Optional site details; region reference coordinates fill the gaps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteOverride {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub tilt_deg: Option<f64>,
    pub azimuth_deg: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub client: ClientProfile,
    pub scenario: ScenarioRequest,
    #[serde(default)]
    pub site: SiteOverride,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub scenario: ScenarioResult,
    /// Production per month for the selected kit, January first
    pub monthly_production_kwh: [f64; 12],
}

pub struct QuoteController {
    tables: Arc<RuleTables>,
    estimator: Arc<dyn ProductionEstimator>,
    site_defaults: SiteConfig,
}

impl QuoteController {
    fn site_for(&self, request: &QuoteRequest, rated_power_kw: f64) -> Result<SiteParameters, QuoteError> {
        let (latitude, longitude) = match (request.site.latitude, request.site.longitude) {
            (Some(lat), Some(lon)) => (lat, lon),
            (None, None) => {
                let profile = self.tables.region(request.scenario.region).ok_or(
                    EngineError::MissingRules {
                        region: request.scenario.region,
                        mode: request.client.mode,
                    },
                )?;
                (profile.reference_latitude, profile.reference_longitude)
            }
            _ => {
                return Err(QuoteError::InvalidRequest(
                    "latitude and longitude must be given together".to_string(),
                ))
            }
        };

        Ok(SiteParameters {
            latitude,
            longitude,
            tilt_deg: request.site.tilt_deg.unwrap_or(self.site_defaults.tilt_deg),
            azimuth_deg: request.site.azimuth_deg.unwrap_or(self.site_defaults.azimuth_deg),
            rated_power_kw,
        })
    }

    /// Resolve the kit, estimate its production, then assemble the scenario
    pub async fn quote(&self, request: &QuoteRequest) -> Result<Quote, QuoteError> {
        let kit = resolve_kit(&self.tables, &request.client, &request.scenario)?;
        let site = self.site_for(request, kit.power_kw())?;

        let estimate = self
            .estimator
            .estimate(&site)
            .await
            .map_err(QuoteError::Estimator)?;

        let scenario = build_scenario(
            &self.tables,
            &request.client,
            &request.scenario,
            Some(estimate.annual_kwh),
        )?;

        info!(
            region = %scenario.region,
            mode = %scenario.mode,
            power_w = scenario.kit.power_w,
            annual_kwh = estimate.annual_kwh,
            recommended_duration_years = scenario.recommended_duration_years,
            "quote computed"
        );

        Ok(Quote {
            scenario,
            monthly_production_kwh: estimate.monthly_kwh,
        })
    }
}
