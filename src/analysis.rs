//! The convective engine and the results it produces.
//!
//! `ConvectiveEngine::evaluate` runs the whole pipeline: assemble the profile, resample it, lift
//! the surface parcel, search for the most unstable parcel, estimate the shear, score the
//! ingredients and check the result for plausibility.
use crate::{
    config::EngineConfig,
    error::{AnalysisError, Result},
    interpolation::resample,
    keys::ConvectiveIndex,
    met_formulas,
    parcel::{self, Parcel},
    parcel_profile::{lift_parcel, most_unstable_parcel_ascent, ParcelAscentAnalysis},
    profile::build_profile,
    severity::{
        plausibility_warnings, CapeCategory, CinCategory, IngredientScoring, ScoreInputs,
        ScoringStrategy, SeverityAssessment, WarningLevel,
    },
    sounding::{ForecastProfile, ForecastSeries, Profile, SurfaceObservation},
    utility::round_to,
    wind,
};
use chrono::NaiveDateTime;
use metfor::{Celsius, CelsiusDiff, HectoPascal, JpKg, MetersPSec, Quantity};
use optional::Optioned;
use serde::Serialize;
use std::fmt;

/// Name and version of the parcel method, reported with every record.
pub const CALCULATION_METHOD: &str = "virtual temperature parcel theory v2";

/// Evaluates convective indexes from a surface observation and a forecast profile.
///
/// The engine holds no state between evaluations, so it may be shared between threads.
pub struct ConvectiveEngine {
    config: EngineConfig,
    scoring: Box<dyn ScoringStrategy + Send + Sync>,
}

impl fmt::Debug for ConvectiveEngine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ConvectiveEngine")
            .field("config", &self.config)
            .field("scoring", &self.scoring.name())
            .finish()
    }
}

impl Default for ConvectiveEngine {
    fn default() -> Self {
        ConvectiveEngine {
            config: EngineConfig::default(),
            scoring: Box::new(IngredientScoring),
        }
    }
}

impl ConvectiveEngine {
    /// Create an engine with the canonical scoring after checking the configuration.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(ConvectiveEngine {
            config,
            scoring: Box::new(IngredientScoring),
        })
    }

    /// Builder method to replace the scoring strategy.
    pub fn with_scoring<S>(mut self, scoring: S) -> Self
    where
        S: ScoringStrategy + Send + Sync + 'static,
    {
        self.scoring = Box::new(scoring);
        self
    }

    /// The configuration in use.
    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Name of the scoring strategy in use.
    #[inline]
    pub fn scoring_name(&self) -> &'static str {
        self.scoring.name()
    }

    /// Analyze a surface observation together with a forecast profile.
    ///
    /// Fails if the inputs are invalid or if fewer than 3 usable levels remain after merging
    /// them. Numeric trouble inside the parcel calculations is handled with fallbacks and never
    /// fails the evaluation.
    pub fn evaluate(
        &self,
        obs: &SurfaceObservation,
        forecast: &ForecastProfile,
    ) -> Result<ConvectiveResult> {
        let coarse = build_profile(obs, forecast.levels(), &self.config)?;
        let coarse_levels = coarse.len();
        let profile = resample(&coarse, &self.config);
        log::debug!(
            "profile of {} levels resampled to {} levels",
            coarse_levels,
            profile.len()
        );

        let surface_parcel = parcel::surface_parcel(obs)?;
        let surface = lift_parcel(surface_parcel, profile.view(), &self.config)?;
        let most_unstable = most_unstable_parcel_ascent(surface_parcel, &profile, &self.config)?;

        let bulk_shear = wind::shear_from_inputs(obs, forecast);

        let inputs = ScoreInputs {
            sbcape: surface.cape(),
            mucape: Optioned::from(most_unstable.as_ref().map(|anal| anal.cape())),
            cin: surface.cin(),
            lifted_index: surface
                .lifted_index()
                .into_option()
                .unwrap_or(CelsiusDiff(0.0)),
            bulk_shear,
            wind_gust: obs.wind_gust(),
        };
        let severity = self.scoring.assess(&inputs);

        let warnings = plausibility_warnings(
            surface.cape(),
            surface.cin(),
            obs.temperature(),
            &self.config.plausibility,
        );

        log::debug!(
            "severity {} ({}) with {} warnings",
            severity.score(),
            severity.level(),
            warnings.len()
        );

        Ok(ConvectiveResult {
            observation: *obs,
            profile,
            coarse_levels,
            surface,
            most_unstable,
            bulk_shear,
            severity,
            warnings,
            scoring_method: self.scoring.name(),
            valid_time: forecast.valid_time(),
            model: forecast.model().map(ToOwned::to_owned),
        })
    }

    /// Select the snapshot for `now` from a forecast series and analyze it.
    pub fn evaluate_series(
        &self,
        obs: &SurfaceObservation,
        series: &ForecastSeries,
        now: NaiveDateTime,
    ) -> Result<ConvectiveResult> {
        let forecast = series.select(now).ok_or_else(|| {
            AnalysisError::InvalidInput("forecast series has no snapshots".to_owned())
        })?;

        self.evaluate(obs, forecast)
    }
}

/// The outcome of one evaluation.
#[derive(Debug, Clone)]
pub struct ConvectiveResult {
    observation: SurfaceObservation,
    profile: Profile,
    coarse_levels: usize,

    // Parcel analysis
    surface: ParcelAscentAnalysis,
    most_unstable: Option<ParcelAscentAnalysis>,

    bulk_shear: Optioned<MetersPSec>,
    severity: SeverityAssessment,
    warnings: Vec<String>,

    // Provenance
    scoring_method: &'static str,
    valid_time: Option<NaiveDateTime>,
    model: Option<String>,
}

impl ConvectiveResult {
    /// Surface based CAPE, never negative.
    pub fn sbcape(&self) -> JpKg {
        self.surface.cape()
    }

    /// Most unstable CAPE, missing if no parcel in the search layer had any CAPE.
    pub fn mucape(&self) -> Optioned<JpKg> {
        Optioned::from(self.most_unstable.as_ref().map(|anal| anal.cape()))
    }

    /// Pressure the most unstable parcel was lifted from.
    pub fn mu_level(&self) -> Optioned<HectoPascal> {
        Optioned::from(
            self.most_unstable
                .as_ref()
                .map(|anal| anal.parcel().pressure),
        )
    }

    /// Convective inhibition of the surface parcel, zero or negative.
    pub fn cin(&self) -> JpKg {
        self.surface.cin()
    }

    /// Lifted index of the surface parcel, zero if the profile does not reach 500 hPa.
    pub fn lifted_index(&self) -> CelsiusDiff {
        self.surface
            .lifted_index()
            .into_option()
            .unwrap_or(CelsiusDiff(0.0))
    }

    /// LCL of the surface parcel.
    pub fn lcl_pressure(&self) -> HectoPascal {
        self.surface.lcl_pressure()
    }

    /// LFC of the surface parcel.
    pub fn lfc_pressure(&self) -> Optioned<HectoPascal> {
        self.surface.lfc_pressure()
    }

    /// Equilibrium level of the surface parcel.
    pub fn el_pressure(&self) -> Optioned<HectoPascal> {
        self.surface.el_pressure()
    }

    /// The shear proxy.
    pub fn bulk_shear(&self) -> Optioned<MetersPSec> {
        self.bulk_shear
    }

    /// Score, label and reasons.
    pub fn severity(&self) -> &SeverityAssessment {
        &self.severity
    }

    /// Plausibility warnings, empty when nothing looks suspicious.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Interpretation of the larger of SBCAPE and MUCAPE.
    pub fn cape_category(&self) -> CapeCategory {
        let cape = match self.mucape().into_option() {
            Some(mucape) if mucape > self.sbcape() => mucape,
            _ => self.sbcape(),
        };
        CapeCategory::from(cape)
    }

    /// Interpretation of the CIN.
    pub fn cin_category(&self) -> CinCategory {
        CinCategory::from(self.cin())
    }

    /// The surface parcel analysis.
    pub fn surface_parcel_analysis(&self) -> &ParcelAscentAnalysis {
        &self.surface
    }

    /// The most unstable parcel analysis.
    pub fn most_unstable_parcel_analysis(&self) -> Option<&ParcelAscentAnalysis> {
        self.most_unstable.as_ref()
    }

    /// The profile the parcels were lifted through.
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Valid time of the forecast used.
    pub fn valid_time(&self) -> Option<NaiveDateTime> {
        self.valid_time
    }

    /// Get a scalar index by key.
    pub fn get_index(&self, var: ConvectiveIndex) -> Optioned<f64> {
        use crate::keys::ConvectiveIndex::*;

        match var {
            SBCAPE => Optioned::from(self.sbcape().unpack()),
            MUCAPE => Optioned::from(self.mucape().map(|c| c.unpack())),
            MULevel => Optioned::from(self.mu_level().map(|p| p.unpack())),
            CIN => Optioned::from(self.cin().unpack()),
            LI => Optioned::from(self.lifted_index().unpack()),
            LCLPressure => Optioned::from(self.lcl_pressure().unpack()),
            LFCPressure => Optioned::from(self.lfc_pressure().map(|p| p.unpack())),
            ELPressure => Optioned::from(self.el_pressure().map(|p| p.unpack())),
            BulkShear => Optioned::from(self.bulk_shear.map(|s| s.unpack())),
        }
    }

    /// Flatten the result into a serializable record.
    pub fn to_record(&self) -> ConvectiveRecord {
        let round_opt = |val: Optioned<f64>, decimals: i32| val.map(|v| round_to(v, decimals));
        let index = |var: ConvectiveIndex| self.get_index(var);

        let surface_parcel = self.surface.parcel();
        let surface_rh = self
            .profile
            .relative_humidity_profile()
            .first()
            .cloned()
            .unwrap_or(0.0);

        let parameters = SurfaceParameters {
            temperature_surface: round_to(self.observation.temperature().unpack(), 1),
            dewpoint_surface: surface_dew_point(&self.observation, surface_parcel)
                .map(|td| round_to(td.unpack(), 1)),
            rh_surface: round_to(surface_rh * 100.0, 0),
            pressure_surface: round_to(self.observation.pressure().unpack(), 1),
            mixing_ratio_surface: round_to(surface_parcel.mixing_ratio * 1000.0, 2),
            profile_levels: self.profile.len(),
            source_levels: self.coarse_levels,
            interpolated: self.profile.is_interpolated(),
        };

        ConvectiveRecord {
            sbcape: round_to(self.sbcape().unpack().max(0.0), 2),
            mucape: round_opt(index(ConvectiveIndex::MUCAPE), 2),
            mu_level: round_opt(index(ConvectiveIndex::MULevel), 1),
            cin: round_to(self.cin().unpack(), 2),
            lifted_index: round_to(self.lifted_index().unpack(), 2),
            lcl_pressure: round_to(self.lcl_pressure().unpack(), 1),
            lfc_pressure: round_opt(index(ConvectiveIndex::LFCPressure), 1),
            el_pressure: round_opt(index(ConvectiveIndex::ELPressure), 1),
            bulk_shear: round_opt(index(ConvectiveIndex::BulkShear), 1),
            severity_score: self.severity.score(),
            warning_level: self.severity.level(),
            reasons: self.severity.reasons().to_vec(),
            cape_category: self.cape_category(),
            cin_category: self.cin_category(),
            warnings: self.warnings.clone(),
            unit: "J/kg",
            calculation_method: CALCULATION_METHOD,
            scoring_method: self.scoring_method,
            valid_time: self.valid_time,
            profile_model: self.model.clone(),
            parameters,
        }
    }
}

/// Observed dew point, or the one implied by the parcel's moisture.
fn surface_dew_point(obs: &SurfaceObservation, parcel: &Parcel) -> Option<Celsius> {
    obs.dew_point().into_option().or_else(|| {
        let e =
            met_formulas::vapor_pressure_from_mixing_ratio(parcel.mixing_ratio, parcel.pressure);
        met_formulas::dew_point_from_vapor_pressure(e).ok()
    })
}

/// A `ConvectiveResult` as plain rounded numbers, the record handed to downstream consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvectiveRecord {
    /// Surface based CAPE, J/kg
    pub sbcape: f64,
    /// Most unstable CAPE, J/kg
    pub mucape: Option<f64>,
    /// Start pressure of the most unstable parcel, hPa
    pub mu_level: Option<f64>,
    /// CIN, J/kg
    pub cin: f64,
    /// Lifted index, C
    pub lifted_index: f64,
    /// LCL, hPa
    pub lcl_pressure: f64,
    /// LFC, hPa
    pub lfc_pressure: Option<f64>,
    /// EL, hPa
    pub el_pressure: Option<f64>,
    /// Shear proxy, m/s
    pub bulk_shear: Option<f64>,
    /// Severity score 0 to 12
    pub severity_score: u8,
    /// Label for the score
    pub warning_level: WarningLevel,
    /// Why the score is what it is
    pub reasons: Vec<String>,
    /// CAPE interpretation
    pub cape_category: CapeCategory,
    /// CIN interpretation
    pub cin_category: CinCategory,
    /// Plausibility warnings
    pub warnings: Vec<String>,
    /// Unit of the energies
    pub unit: &'static str,
    /// Parcel method and version
    pub calculation_method: &'static str,
    /// Scoring method and version
    pub scoring_method: &'static str,
    /// Valid time of the forecast profile
    pub valid_time: Option<NaiveDateTime>,
    /// Model that produced the forecast profile
    pub profile_model: Option<String>,
    /// Surface conditions the analysis started from
    pub parameters: SurfaceParameters,
}

impl ConvectiveRecord {
    /// Serialize to a JSON string.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Surface conditions reported with a `ConvectiveRecord`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SurfaceParameters {
    /// C
    pub temperature_surface: f64,
    /// C
    pub dewpoint_surface: Option<f64>,
    /// percent
    pub rh_surface: f64,
    /// hPa
    pub pressure_surface: f64,
    /// g/kg
    pub mixing_ratio_surface: f64,
    /// Levels in the analyzed profile
    pub profile_levels: usize,
    /// Levels before resampling
    pub source_levels: usize,
    /// Whether the profile was resampled
    pub interpolated: bool,
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        severity::LegacyScoring,
        test_data::{
            convective_forecast, convective_observation, stable_forecast, stable_observation,
        },
    };
    use chrono::NaiveDate;
    use strum::IntoEnumIterator;

    #[test]
    fn test_convective_evaluation() {
        let engine = ConvectiveEngine::default();
        let result = engine
            .evaluate(&convective_observation(), &convective_forecast())
            .unwrap();

        assert!(result.sbcape() > JpKg(0.0));
        assert!(result.mucape().unwrap() >= result.sbcape());
        assert!(result.lfc_pressure().unwrap() > HectoPascal(900.0));
        assert!(result.el_pressure().unwrap() < HectoPascal(600.0));
        assert!(result.lcl_pressure() <= HectoPascal(1013.0));
        assert!(result.warnings().is_empty());
        assert_eq!(result.bulk_shear().unwrap(), MetersPSec(9.0));
        assert!(result.profile().is_interpolated());
        assert!(result.severity().score() <= crate::severity::MAX_SCORE);
    }

    #[test]
    fn test_stable_evaluation() {
        let engine = ConvectiveEngine::default();
        let result = engine
            .evaluate(&stable_observation(), &stable_forecast())
            .unwrap();

        assert_eq!(result.sbcape(), JpKg(0.0));
        assert_eq!(result.cin(), JpKg(0.0));
        assert!(result.mucape().is_none());
        assert!(result.mu_level().is_none());
        assert!(result.lfc_pressure().is_none());
        assert_eq!(result.cape_category(), CapeCategory::VeryWeak);
        assert!(!result.severity().level().is_warning());
    }

    #[test]
    fn test_get_index() {
        let result = ConvectiveEngine::default()
            .evaluate(&convective_observation(), &convective_forecast())
            .unwrap();

        for var in ConvectiveIndex::iter() {
            assert!(result.get_index(var).is_some(), "{:?} missing", var);
        }
        assert_eq!(
            result.get_index(ConvectiveIndex::SBCAPE).unwrap(),
            result.sbcape().unpack()
        );
    }

    #[test]
    fn test_record() {
        let forecast = convective_forecast().with_valid_time(
            NaiveDate::from_ymd_opt(2024, 7, 12)
                .unwrap()
                .and_hms_opt(14, 0, 0)
                .unwrap(),
        );
        let engine = ConvectiveEngine::default();
        let result = engine.evaluate(&convective_observation(), &forecast).unwrap();
        let record = result.to_record();

        assert_eq!(record.sbcape, round_to(result.sbcape().unpack(), 2));
        assert_eq!(record.severity_score, result.severity().score());
        assert_eq!(record.profile_model.as_deref(), Some("test-model"));
        assert_eq!(record.scoring_method, "ingredients-v2");
        assert_eq!(record.parameters.temperature_surface, 28.0);
        assert_eq!(record.parameters.dewpoint_surface, Some(22.0));
        assert_eq!(record.parameters.source_levels, 7);
        assert!(record.parameters.interpolated);
        assert!(record.parameters.mixing_ratio_surface > 16.0);
        assert!(record.parameters.mixing_ratio_surface < 17.5);

        let json: serde_json::Value = serde_json::from_str(&record.to_json().unwrap()).unwrap();
        assert_eq!(json["valid_time"], "2024-07-12T14:00:00");
        assert_eq!(json["unit"], "J/kg");
        assert!(json["warnings"].as_array().unwrap().is_empty());
        assert!(json["lfc_pressure"].is_number());
    }

    #[test]
    fn test_legacy_engine() {
        let engine = ConvectiveEngine::default().with_scoring(LegacyScoring);
        assert_eq!(engine.scoring_name(), "legacy-v1");

        let result = engine
            .evaluate(&convective_observation(), &convective_forecast())
            .unwrap();
        assert_eq!(result.to_record().scoring_method, "legacy-v1");
    }

    #[test]
    fn test_bad_config_rejected() {
        let config = EngineConfig::default().with_grid_step(0.0);
        assert!(ConvectiveEngine::new(config).is_err());
    }

    #[test]
    fn test_empty_series() {
        let engine = ConvectiveEngine::default();
        let now = NaiveDate::from_ymd_opt(2024, 7, 12)
            .unwrap()
            .and_hms_opt(14, 0, 0)
            .unwrap();
        let result =
            engine.evaluate_series(&convective_observation(), &ForecastSeries::default(), now);
        assert!(result.is_err());
    }
}
