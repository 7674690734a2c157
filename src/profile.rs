//! Assemble the profile the engine analyzes from a surface observation and forecast levels.
use crate::{
    config::EngineConfig,
    error::{AnalysisError, Result},
    sounding::{AtmosphericLevel, ForecastLevel, Profile, SurfaceObservation},
};
use metfor::{Kelvin, Quantity};
use std::cmp::Ordering;

/// Merge a surface observation with forecast pressure levels into a `Profile`.
///
/// The observation is validated against the configured bounds and becomes the first level.
/// Forecast levels at or below the surface pressure, or without a temperature, are discarded.
/// A level without humidity gets the configured fallback for its pressure. The result is
/// sorted by decreasing pressure with duplicate pressures removed.
///
/// Fails with `InvalidInput` for an implausible observation or a non-physical forecast value,
/// and with `InsufficientProfile` if fewer than 3 levels are left.
pub fn build_profile(
    obs: &SurfaceObservation,
    forecast: &[ForecastLevel],
    config: &EngineConfig,
) -> Result<Profile> {
    obs.validate(&config.observation_bounds)?;

    let surface_p = obs.pressure();
    let surface = AtmosphericLevel::new(
        surface_p,
        Kelvin::from(obs.temperature()),
        obs.relative_humidity_fraction()?,
    );

    let mut aloft: Vec<AtmosphericLevel> = Vec::with_capacity(forecast.len());
    for lvl in forecast {
        let p = lvl.pressure.unpack();
        if !p.is_finite() || p <= 0.0 {
            return Err(AnalysisError::InvalidInput(format!(
                "forecast level with non-positive pressure {} hPa",
                p
            )));
        }

        // Below ground, or at the surface where the observation wins.
        if lvl.pressure >= surface_p {
            continue;
        }

        let temperature = match lvl.temperature.into_option() {
            Some(t) if t.unpack().is_finite() => Kelvin::from(t),
            Some(t) => {
                return Err(AnalysisError::InvalidInput(format!(
                    "forecast temperature {} C at {} hPa",
                    t.unpack(),
                    p
                )))
            }
            None => continue,
        };

        let relative_humidity = lvl
            .relative_humidity
            .into_option()
            .filter(|rh| rh.is_finite())
            .map(|rh| (rh / 100.0).max(0.0).min(1.0))
            .unwrap_or_else(|| config.humidity_fallback(p));

        aloft.push(AtmosphericLevel::new(
            lvl.pressure,
            temperature,
            relative_humidity,
        ));
    }

    aloft.sort_by(|a, b| {
        b.pressure
            .partial_cmp(&a.pressure)
            .unwrap_or(Ordering::Equal)
    });
    aloft.dedup_by(|upper, lower| upper.pressure == lower.pressure);

    let mut levels = Vec::with_capacity(aloft.len() + 1);
    levels.push(surface);
    levels.extend(aloft);

    log::debug!(
        "profile has {} usable levels from {} forecast levels",
        levels.len(),
        forecast.len()
    );

    Profile::from_levels(&levels)
}
