//! Data used in tests.
use crate::sounding::{AtmosphericLevel, ForecastLevel, ForecastProfile, SurfaceObservation};
use metfor::{Celsius, HectoPascal, Kelvin, MetersPSec};

/// The convective scenario as an already assembled coarse profile, surface first.
pub(crate) fn coarse_levels() -> Vec<AtmosphericLevel> {
    vec![
        AtmosphericLevel::new(HectoPascal(1013.0), Kelvin(301.15), 0.70),
        AtmosphericLevel::new(HectoPascal(950.0), Kelvin(297.15), 0.70),
        AtmosphericLevel::new(HectoPascal(850.0), Kelvin(288.15), 0.65),
        AtmosphericLevel::new(HectoPascal(700.0), Kelvin(279.15), 0.50),
        AtmosphericLevel::new(HectoPascal(600.0), Kelvin(271.15), 0.40),
        AtmosphericLevel::new(HectoPascal(500.0), Kelvin(263.15), 0.35),
        AtmosphericLevel::new(HectoPascal(300.0), Kelvin(236.15), 0.30),
    ]
}

/// Warm humid afternoon station observation.
pub(crate) fn convective_observation() -> SurfaceObservation {
    SurfaceObservation::new(Celsius(28.0), HectoPascal(1013.0))
        .with_dew_point(Celsius(22.0))
        .with_wind_speed(MetersPSec(3.0))
        .with_wind_gust(MetersPSec(9.0))
}

/// Forecast levels with a conditionally unstable lapse rate.
pub(crate) fn convective_forecast() -> ForecastProfile {
    ForecastProfile::new()
        .with_model("test-model")
        .with_levels(vec![
            ForecastLevel::new(HectoPascal(950.0), Celsius(24.0), 70.0),
            ForecastLevel::new(HectoPascal(850.0), Celsius(15.0), 65.0),
            ForecastLevel::new(HectoPascal(700.0), Celsius(6.0), 50.0),
            ForecastLevel::new(HectoPascal(600.0), Celsius(-2.0), 40.0),
            ForecastLevel::new(HectoPascal(500.0), Celsius(-10.0), 35.0),
            ForecastLevel::new(HectoPascal(300.0), Celsius(-37.0), 30.0),
        ])
        .with_surface_wind(MetersPSec(4.0))
        .with_upper_wind(MetersPSec(12.0))
}

/// Cool dry observation under a warm layer aloft.
pub(crate) fn stable_observation() -> SurfaceObservation {
    SurfaceObservation::new(Celsius(10.0), HectoPascal(1000.0)).with_dew_point(Celsius(-5.0))
}

/// Forecast levels with an inversion, nothing lifted from the surface becomes buoyant.
pub(crate) fn stable_forecast() -> ForecastProfile {
    ForecastProfile::new().with_levels(vec![
        ForecastLevel::new(HectoPascal(950.0), Celsius(14.0), 40.0),
        ForecastLevel::new(HectoPascal(850.0), Celsius(13.0), 30.0),
        ForecastLevel::new(HectoPascal(700.0), Celsius(5.0), 30.0),
        ForecastLevel::new(HectoPascal(500.0), Celsius(-8.0), 20.0),
        ForecastLevel::new(HectoPascal(300.0), Celsius(-30.0), 20.0),
    ])
}
