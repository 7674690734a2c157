#![warn(missing_docs)]
//! Convective instability indexes from a surface observation merged with a forecast profile.
//!
//! The station observation becomes the lowest level of a profile completed by the model's
//! pressure levels. The profile is resampled onto a fine pressure grid and parcels are lifted
//! through it to find the LCL, LFC and EL and to integrate the CIN and the CAPE. The most
//! unstable parcel in the lowest 300 hPa, a coarse shear proxy and a bounded severity score
//! complete the analysis.
//!
//! ```rust
//! use convective_profile::{ConvectiveEngine, ForecastLevel, ForecastProfile, SurfaceObservation};
//! use metfor::{Celsius, HectoPascal, JpKg, MetersPSec};
//!
//! let obs = SurfaceObservation::new(Celsius(28.0), HectoPascal(1013.0))
//!     .with_dew_point(Celsius(22.0))
//!     .with_wind_speed(MetersPSec(3.0));
//!
//! let forecast = ForecastProfile::new()
//!     .with_levels(vec![
//!         ForecastLevel::new(HectoPascal(950.0), Celsius(24.0), 70.0),
//!         ForecastLevel::new(HectoPascal(850.0), Celsius(15.0), 65.0),
//!         ForecastLevel::new(HectoPascal(700.0), Celsius(6.0), 50.0),
//!         ForecastLevel::new(HectoPascal(600.0), Celsius(-2.0), 40.0),
//!         ForecastLevel::new(HectoPascal(500.0), Celsius(-10.0), 35.0),
//!         ForecastLevel::new(HectoPascal(300.0), Celsius(-37.0), 30.0),
//!     ])
//!     .with_upper_wind(MetersPSec(12.0));
//!
//! let result = ConvectiveEngine::default().evaluate(&obs, &forecast).unwrap();
//! assert!(result.sbcape() > JpKg(0.0));
//! assert!(result.mucape().unwrap() >= result.sbcape());
//! ```

//
// API
//
pub use crate::{
    analysis::{
        ConvectiveEngine, ConvectiveRecord, ConvectiveResult, SurfaceParameters,
        CALCULATION_METHOD,
    },
    config::{EngineConfig, ObservationBounds, PlausibilityThresholds},
    error::{AnalysisError, Result},
    interpolation::resample,
    keys::ConvectiveIndex,
    met_formulas::DomainError,
    parcel::{level_parcel, surface_parcel, Parcel},
    parcel_profile::{
        lift_parcel, most_unstable_parcel_ascent, BuoyancyProfile, ParcelAscentAnalysis,
        ParcelTrace,
    },
    profile::build_profile,
    severity::{
        plausibility_warnings, CapeCategory, CinCategory, IngredientScoring, LegacyScoring,
        ScoreInputs, ScoringStrategy, SeverityAssessment, WarningLevel, MAX_SCORE,
    },
    sounding::{
        AtmosphericLevel, ForecastLevel, ForecastProfile, ForecastSeries, Profile, ProfileView,
        SurfaceObservation, MIN_PROFILE_LEVELS,
    },
    wind::{bulk_shear_proxy, shear_from_inputs},
};

pub mod met_formulas;
pub mod source;

//
// Internal use only
//

// Modules
mod analysis;
mod config;
mod error;
mod interpolation;
mod keys;
mod parcel;
mod parcel_profile;
mod profile;
mod severity;
mod sounding;
mod utility;
mod wind;

#[cfg(test)]
mod test_data;
