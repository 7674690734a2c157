//! Tunable constants of the engine.
//!
//! The defaults reproduce the operational setup. Every field may be left out of a JSON document,
//! missing fields take their default value.
use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};

/// Physical bounds a surface observation must respect to be analyzed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservationBounds {
    /// Lowest accepted temperature, C
    pub min_temperature_c: f64,
    /// Highest accepted temperature, C
    pub max_temperature_c: f64,
    /// Lowest accepted station pressure, hPa
    pub min_pressure_hpa: f64,
    /// Highest accepted station pressure, hPa
    pub max_pressure_hpa: f64,
}

impl Default for ObservationBounds {
    fn default() -> Self {
        ObservationBounds {
            min_temperature_c: -50.0,
            max_temperature_c: 60.0,
            min_pressure_hpa: 900.0,
            max_pressure_hpa: 1050.0,
        }
    }
}

/// Thresholds beyond which a result is flagged as physically suspicious.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlausibilityThresholds {
    /// SBCAPE above this is flagged, J/kg
    pub max_sbcape: f64,
    /// SBCAPE above this with a cold surface is flagged, J/kg
    pub cold_surface_cape: f64,
    /// Surface temperature below which a surface is cold, C
    pub cold_surface_temperature_c: f64,
    /// CIN below this is flagged, J/kg
    pub min_cin: f64,
}

impl Default for PlausibilityThresholds {
    fn default() -> Self {
        PlausibilityThresholds {
            max_sbcape: 6000.0,
            cold_surface_cape: 1500.0,
            cold_surface_temperature_c: 10.0,
            min_cin: -500.0,
        }
    }
}

/// Configuration of a `ConvectiveEngine`.
///
/// # Examples
///
/// ```rust
/// use convective_profile::EngineConfig;
///
/// let config = EngineConfig::from_json_str(r#"{"grid_step_hpa": 5.0}"#).unwrap();
/// assert_eq!(config.grid_step_hpa, 5.0);
/// assert_eq!(config.mu_search_depth_hpa, 300.0);
///
/// let config = EngineConfig::default().with_moist_substeps(8);
/// assert_eq!(config.moist_substeps, 8);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Spacing of the fine pressure grid, hPa
    pub grid_step_hpa: f64,
    /// The fine grid never extends above this pressure, hPa
    pub grid_top_hpa: f64,
    /// Depth above the surface searched for the most unstable parcel, hPa
    pub mu_search_depth_hpa: f64,
    /// Number of evenly spaced pressures, both ends included, integrating a grid step that
    /// crosses the LCL from the LCL up
    pub lcl_crossing_substeps: u32,
    /// Number of evenly spaced pressures, both ends included, integrating a grid step entirely
    /// above the LCL
    pub moist_substeps: u32,
    /// Relative humidity (fraction) assumed for a forecast level below the switch pressure
    pub humidity_fallback_low: f64,
    /// Relative humidity (fraction) assumed for a forecast level at or above the switch pressure
    pub humidity_fallback_high: f64,
    /// Pressure separating the two humidity fallbacks, hPa
    pub humidity_fallback_switch_hpa: f64,
    /// Lower clamp for interpolated relative humidity (fraction)
    pub min_relative_humidity: f64,
    /// Upper clamp for interpolated relative humidity (fraction)
    pub max_relative_humidity: f64,
    /// Level the lifted index is evaluated at, hPa
    pub lifted_index_pressure_hpa: f64,
    /// How far from the reference level a grid level may be for the lifted index, hPa
    pub lifted_index_tolerance_hpa: f64,
    /// Bounds for surface observations.
    pub observation_bounds: ObservationBounds,
    /// Thresholds for the plausibility warnings.
    pub plausibility: PlausibilityThresholds,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            grid_step_hpa: 10.0,
            grid_top_hpa: 200.0,
            mu_search_depth_hpa: 300.0,
            lcl_crossing_substeps: 10,
            moist_substeps: 5,
            humidity_fallback_low: 0.5,
            humidity_fallback_high: 0.3,
            humidity_fallback_switch_hpa: 500.0,
            min_relative_humidity: 0.05,
            max_relative_humidity: 1.0,
            lifted_index_pressure_hpa: 500.0,
            lifted_index_tolerance_hpa: 15.0,
            observation_bounds: ObservationBounds::default(),
            plausibility: PlausibilityThresholds::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON and check it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("grid_step_hpa", self.grid_step_hpa),
            ("grid_top_hpa", self.grid_top_hpa),
            ("mu_search_depth_hpa", self.mu_search_depth_hpa),
            ("lifted_index_pressure_hpa", self.lifted_index_pressure_hpa),
            ("lifted_index_tolerance_hpa", self.lifted_index_tolerance_hpa),
        ];
        for (name, val) in positive.iter() {
            if !val.is_finite() || *val <= 0.0 {
                return Err(AnalysisError::Config(format!(
                    "{} must be positive, got {}",
                    name, val
                )));
            }
        }

        if self.lcl_crossing_substeps < 2 || self.moist_substeps < 2 {
            return Err(AnalysisError::Config(
                "sub-step counts must be at least 2, one for each end of the step".to_owned(),
            ));
        }

        let fractions = [
            self.humidity_fallback_low,
            self.humidity_fallback_high,
            self.min_relative_humidity,
            self.max_relative_humidity,
        ];
        if fractions.iter().any(|rh| !(0.0..=1.0).contains(rh)) {
            return Err(AnalysisError::Config(
                "relative humidity settings are fractions in [0, 1]".to_owned(),
            ));
        }
        if self.min_relative_humidity > self.max_relative_humidity {
            return Err(AnalysisError::Config(format!(
                "relative humidity clamp [{}, {}] is empty",
                self.min_relative_humidity, self.max_relative_humidity
            )));
        }

        let bounds = &self.observation_bounds;
        if bounds.min_temperature_c >= bounds.max_temperature_c
            || bounds.min_pressure_hpa >= bounds.max_pressure_hpa
        {
            return Err(AnalysisError::Config(
                "observation bounds must have min below max".to_owned(),
            ));
        }

        Ok(())
    }

    /// Builder method for the fine grid spacing.
    #[inline]
    pub fn with_grid_step(mut self, step_hpa: f64) -> Self {
        self.grid_step_hpa = step_hpa;
        self
    }

    /// Builder method for the highest level of the fine grid.
    #[inline]
    pub fn with_grid_top(mut self, top_hpa: f64) -> Self {
        self.grid_top_hpa = top_hpa;
        self
    }

    /// Builder method for the depth of the most unstable parcel search.
    #[inline]
    pub fn with_mu_search_depth(mut self, depth_hpa: f64) -> Self {
        self.mu_search_depth_hpa = depth_hpa;
        self
    }

    /// Builder method for the number of pressures integrating the grid step crossing the LCL.
    #[inline]
    pub fn with_lcl_crossing_substeps(mut self, substeps: u32) -> Self {
        self.lcl_crossing_substeps = substeps;
        self
    }

    /// Builder method for the number of pressures integrating saturated grid steps.
    #[inline]
    pub fn with_moist_substeps(mut self, substeps: u32) -> Self {
        self.moist_substeps = substeps;
        self
    }

    /// Builder method for the humidity assumed where the forecast has none.
    #[inline]
    pub fn with_humidity_fallbacks(mut self, low: f64, high: f64, switch_hpa: f64) -> Self {
        self.humidity_fallback_low = low;
        self.humidity_fallback_high = high;
        self.humidity_fallback_switch_hpa = switch_hpa;
        self
    }

    /// Builder method for the relative humidity clamp applied after interpolation.
    #[inline]
    pub fn with_relative_humidity_clamp(mut self, min: f64, max: f64) -> Self {
        self.min_relative_humidity = min;
        self.max_relative_humidity = max;
        self
    }

    /// Builder method for the lifted index reference level and tolerance.
    #[inline]
    pub fn with_lifted_index_level(mut self, pressure_hpa: f64, tolerance_hpa: f64) -> Self {
        self.lifted_index_pressure_hpa = pressure_hpa;
        self.lifted_index_tolerance_hpa = tolerance_hpa;
        self
    }

    /// Builder method for the observation bounds.
    #[inline]
    pub fn with_observation_bounds(mut self, bounds: ObservationBounds) -> Self {
        self.observation_bounds = bounds;
        self
    }

    /// Builder method for the plausibility thresholds.
    #[inline]
    pub fn with_plausibility(mut self, thresholds: PlausibilityThresholds) -> Self {
        self.plausibility = thresholds;
        self
    }

    /// Relative humidity (fraction) assumed for a level without a humidity sample.
    #[inline]
    pub fn humidity_fallback(&self, pressure_hpa: f64) -> f64 {
        if pressure_hpa > self.humidity_fallback_switch_hpa {
            self.humidity_fallback_low
        } else {
            self.humidity_fallback_high
        }
    }
}
