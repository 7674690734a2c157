//! A coarse low level wind shear proxy.
//!
//! Only wind speeds at the surface and at a single upper reference level (about 120 m) are
//! available, so this is the difference of two speeds and not a vector shear over 0-6 km. It
//! systematically underestimates the true deep layer shear, often by a factor of 3 or more.
use crate::sounding::{ForecastProfile, SurfaceObservation};
use metfor::{MetersPSec, Quantity};
use optional::Optioned;

/// Absolute difference between the upper and the surface wind speed.
///
/// ```rust
/// use convective_profile::bulk_shear_proxy;
/// use metfor::MetersPSec;
///
/// assert_eq!(bulk_shear_proxy(MetersPSec(4.0), MetersPSec(12.5)), MetersPSec(8.5));
/// assert_eq!(bulk_shear_proxy(MetersPSec(12.5), MetersPSec(4.0)), MetersPSec(8.5));
/// ```
#[inline]
pub fn bulk_shear_proxy(surface: MetersPSec, upper: MetersPSec) -> MetersPSec {
    MetersPSec((upper.unpack() - surface.unpack()).abs())
}

/// Shear proxy from the available inputs.
///
/// The observed surface wind is preferred over the model's. Missing if either speed is
/// unavailable.
pub fn shear_from_inputs(
    obs: &SurfaceObservation,
    forecast: &ForecastProfile,
) -> Optioned<MetersPSec> {
    let surface = obs
        .wind_speed()
        .into_option()
        .or_else(|| forecast.surface_wind().into_option());
    let upper = forecast.upper_wind().into_option();

    match (surface, upper) {
        (Some(surface), Some(upper)) => Optioned::from(bulk_shear_proxy(surface, upper)),
        _ => {
            log::debug!("wind speeds unavailable, no shear proxy");
            Optioned::default()
        }
    }
}
