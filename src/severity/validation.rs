//! Sanity checks on the computed indexes.
use crate::config::PlausibilityThresholds;
use metfor::{Celsius, JpKg, Quantity};

/// Flag results that are physically suspicious.
///
/// The results are still reported, the warnings travel with them. Each warning is also logged.
pub fn plausibility_warnings(
    sbcape: JpKg,
    cin: JpKg,
    surface_temperature: Celsius,
    thresholds: &PlausibilityThresholds,
) -> Vec<String> {
    let mut warnings = vec![];

    let cape = sbcape.unpack();
    let temperature = surface_temperature.unpack();

    if cape > thresholds.max_sbcape {
        warnings.push(format!(
            "SBCAPE of {:.0} J/kg is unusually high, check the input data",
            cape
        ));
    }

    if cape > thresholds.cold_surface_cape && temperature < thresholds.cold_surface_temperature_c
    {
        warnings.push(format!(
            "SBCAPE of {:.0} J/kg with a surface temperature of {:.1} C is suspicious",
            cape, temperature
        ));
    }

    if cin.unpack() < thresholds.min_cin {
        warnings.push(format!(
            "CIN of {:.0} J/kg is unusually strong",
            cin.unpack()
        ));
    }

    for warning in &warnings {
        log::warn!("{}", warning);
    }

    warnings
}
