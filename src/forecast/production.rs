use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Inputs an irradiance service needs to estimate a kit's production
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SiteParameters {
    pub latitude: f64,
    pub longitude: f64,
    /// Panel inclination from horizontal (degrees)
    pub tilt_deg: f64,
    /// Panel orientation, 180 = due south (degrees)
    pub azimuth_deg: f64,
    pub rated_power_kw: f64,
}

/// Yearly production with its monthly breakdown (January first).
/// The months sum to `annual_kwh`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionEstimate {
    pub annual_kwh: f64,
    pub monthly_kwh: [f64; 12],
}

impl ProductionEstimate {
    pub fn monthly_total(&self) -> f64 {
        self.monthly_kwh.iter().sum()
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductionEstimator: Send + Sync {
    async fn estimate(&self, site: &SiteParameters) -> Result<ProductionEstimate>;
}

/// Deterministic estimator from latitude and panel orientation.
///
/// Specific yield falls off linearly with latitude, orientation losses grow
/// with the distance from due south and the optimal tilt, and the months
/// follow a cosine profile whose amplitude grows with latitude.
pub struct SimpleProductionEstimator {
    /// kWh per installed kW at the equator
    pub equator_yield: f64,
    /// Yield lost per degree of latitude
    pub yield_drop_per_degree: f64,
    pub min_yield: f64,
    pub optimal_tilt_deg: f64,
}

impl Default for SimpleProductionEstimator {
    fn default() -> Self {
        Self {
            equator_yield: 2000.0,
            yield_drop_per_degree: 17.0,
            min_yield: 600.0,
            optimal_tilt_deg: 32.0,
        }
    }
}

impl SimpleProductionEstimator {
    fn specific_yield(&self, latitude: f64) -> f64 {
        (self.equator_yield - self.yield_drop_per_degree * latitude.abs()).max(self.min_yield)
    }

    fn orientation_factor(&self, tilt_deg: f64, azimuth_deg: f64, latitude: f64) -> f64 {
        // panels face the equator: south in the north, north in the south
        let ideal_azimuth = if latitude >= 0.0 { 180.0 } else { 0.0 };
        let deviation = ((azimuth_deg - ideal_azimuth + 540.0).rem_euclid(360.0) - 180.0).abs();
        let azimuth_loss = 0.3 * (1.0 - (deviation * PI / 180.0).cos()) / 2.0;

        let tilt_error = (tilt_deg - self.optimal_tilt_deg) / 90.0;
        let tilt_loss = 0.4 * tilt_error * tilt_error;

        (1.0 - azimuth_loss - tilt_loss).clamp(0.3, 1.0)
    }

    /// Month weights summing to 1. Peak in June north of the equator.
    fn monthly_profile(latitude: f64) -> [f64; 12] {
        let amplitude = (latitude.abs() / 60.0).min(0.8);
        let peak_month = if latitude >= 0.0 { 5.0 } else { 11.0 };

        let mut weights = [0.0; 12];
        for (month, weight) in weights.iter_mut().enumerate() {
            let phase = 2.0 * PI * (month as f64 - peak_month) / 12.0;
            *weight = 1.0 + amplitude * phase.cos();
        }
        let total: f64 = weights.iter().sum();
        weights.map(|w| w / total)
    }

    pub fn estimate_sync(&self, site: &SiteParameters) -> Result<ProductionEstimate> {
        if !(-90.0..=90.0).contains(&site.latitude) || !(-180.0..=180.0).contains(&site.longitude) {
            bail!(
                "coordinates out of range: lat={}, lon={}",
                site.latitude,
                site.longitude
            );
        }
        if !site.rated_power_kw.is_finite() || site.rated_power_kw < 0.0 {
            bail!("rated power must be non-negative, got {}", site.rated_power_kw);
        }

        let annual_kwh = site.rated_power_kw
            * self.specific_yield(site.latitude)
            * self.orientation_factor(site.tilt_deg, site.azimuth_deg, site.latitude);

        let mut estimate = ProductionEstimate {
            annual_kwh,
            monthly_kwh: Self::monthly_profile(site.latitude).map(|w| w * annual_kwh),
        };
        // absorb float drift in the last month so the breakdown sums exactly
        estimate.monthly_kwh[11] += annual_kwh - estimate.monthly_total();

        Ok(estimate)
    }
}

#[async_trait]
impl ProductionEstimator for SimpleProductionEstimator {
    async fn estimate(&self, site: &SiteParameters) -> Result<ProductionEstimate> {
        self.estimate_sync(site)
    }
}
