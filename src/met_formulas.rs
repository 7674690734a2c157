//! Thermodynamic formulas used by the parcel analysis.
//!
//! Every function is pure. Functions that can leave their physical domain return a
//! `DomainError` and leave the choice of a fallback to the caller.
use metfor::{Celsius, HectoPascal, Kelvin, Quantity};
use thiserror::Error;

/// Gas constant for dry air, J/(kg K).
pub const RD: f64 = 287.05;
/// Gas constant for water vapor, J/(kg K).
pub const RV: f64 = 461.5;
/// Specific heat of dry air at constant pressure, J/(kg K).
pub const CP: f64 = 1005.0;
/// Latent heat of vaporization, J/kg.
pub const LV: f64 = 2.5e6;
/// Acceleration of gravity, m/s^2.
pub const G: f64 = 9.80665;
/// Ratio of the gas constants of dry air and water vapor.
pub const EPSILON: f64 = 0.622;
/// Exponent of the dry adiabat, Rd / Cp.
pub const KAPPA: f64 = RD / CP;

// Bolton (1980) saturation vapor pressure coefficients.
const BOLTON_E0: f64 = 6.112;
const BOLTON_A: f64 = 17.67;
const BOLTON_B: f64 = 243.5;

/// Failures of the thermodynamic kernel.
#[derive(Clone, Copy, PartialEq, Debug, Error)]
pub enum DomainError {
    /// Pressure must be strictly positive.
    #[error("non-positive pressure ({0} hPa)")]
    NonPositivePressure(f64),
    /// The vapor pressure is not smaller than the total pressure.
    #[error("vapor pressure {e} hPa is not below total pressure {p} hPa")]
    VaporPressureExceedsPressure {
        /// Vapor pressure, hPa
        e: f64,
        /// Total pressure, hPa
        p: f64,
    },
    /// Vapor pressure must be strictly positive to invert it.
    #[error("non-positive vapor pressure ({0} hPa)")]
    NonPositiveVaporPressure(f64),
    /// Temperature outside of the range the approximations are valid for.
    #[error("non-physical temperature ({0} K)")]
    NonPhysicalTemperature(f64),
}

/// Saturation vapor pressure over liquid water, Bolton's formula.
#[inline]
pub fn saturation_vapor_pressure(t: Celsius) -> HectoPascal {
    let t = t.unpack();
    HectoPascal(BOLTON_E0 * (BOLTON_A * t / (t + BOLTON_B)).exp())
}

/// Mixing ratio (kg/kg) from the vapor pressure and the total pressure.
#[inline]
pub fn mixing_ratio(e: HectoPascal, p: HectoPascal) -> Result<f64, DomainError> {
    let (e, p) = (e.unpack(), p.unpack());
    if p <= 0.0 {
        return Err(DomainError::NonPositivePressure(p));
    }
    if p <= e {
        return Err(DomainError::VaporPressureExceedsPressure { e, p });
    }

    Ok(EPSILON * e / (p - e))
}

/// Inverse of `mixing_ratio`, the vapor pressure of air with mixing ratio `mw` at pressure `p`.
#[inline]
pub fn vapor_pressure_from_mixing_ratio(mw: f64, p: HectoPascal) -> HectoPascal {
    HectoPascal(mw * p.unpack() / (EPSILON + mw))
}

/// Virtual temperature from the temperature and the mixing ratio (kg/kg).
#[inline]
pub fn virtual_temperature(t: Kelvin, mw: f64) -> Kelvin {
    Kelvin(t.unpack() * (1.0 + mw / EPSILON) / (1.0 + mw))
}

/// Dew point from the vapor pressure, the inverse of Bolton's formula.
#[inline]
pub fn dew_point_from_vapor_pressure(e: HectoPascal) -> Result<Celsius, DomainError> {
    let e = e.unpack();
    if e <= 0.0 {
        return Err(DomainError::NonPositiveVaporPressure(e));
    }

    let ln_ratio = (e / BOLTON_E0).ln();
    Ok(Celsius(BOLTON_B * ln_ratio / (BOLTON_A - ln_ratio)))
}

/// Potential temperature of air at temperature `t` and pressure `p`.
#[inline]
pub fn potential_temperature(t: Kelvin, p: HectoPascal) -> Result<Kelvin, DomainError> {
    let p = p.unpack();
    if p <= 0.0 {
        return Err(DomainError::NonPositivePressure(p));
    }

    Ok(Kelvin(t.unpack() * (1000.0 / p).powf(KAPPA)))
}

/// Temperature of a parcel lifted (or lowered) dry adiabatically from `p0` to `p1`.
#[inline]
pub fn dry_adiabat(t0: Kelvin, p0: HectoPascal, p1: HectoPascal) -> Kelvin {
    Kelvin(t0.unpack() * (p1.unpack() / p0.unpack()).powf(KAPPA))
}

/// Pressure at the lifting condensation level.
///
/// Uses Bolton's approximation for the temperature at the LCL and the dry adiabat through the
/// starting point to find the pressure.
pub fn lcl_pressure(t: Kelvin, td: Kelvin, p: HectoPascal) -> Result<HectoPascal, DomainError> {
    let (t_k, td_k) = (t.unpack(), td.unpack());

    // Bolton's fit has a pole at 56 K.
    if !td_k.is_finite() || td_k <= 56.0 {
        return Err(DomainError::NonPhysicalTemperature(td_k));
    }
    if !t_k.is_finite() || t_k <= 0.0 {
        return Err(DomainError::NonPhysicalTemperature(t_k));
    }

    let denom = 1.0 / (td_k - 56.0) + (t_k / td_k).ln() / 800.0;
    if denom <= 0.0 {
        return Err(DomainError::NonPhysicalTemperature(td_k));
    }
    let t_lcl = 1.0 / denom + 56.0;

    let theta = potential_temperature(t, p)?.unpack();

    Ok(HectoPascal(1000.0 * (t_lcl / theta).powf(1.0 / KAPPA)))
}

/// Saturated (moist) adiabatic lapse rate in K/hPa.
pub fn moist_adiabatic_lapse_rate(t: Kelvin, p: HectoPascal) -> Result<f64, DomainError> {
    let t_k = t.unpack();
    if !t_k.is_finite() || t_k <= 0.0 {
        return Err(DomainError::NonPhysicalTemperature(t_k));
    }

    let es = saturation_vapor_pressure(Celsius::from(t));
    let ws = mixing_ratio(es, p)?;

    let numerator = 1.0 + LV * ws / (RD * t_k);
    let denominator = 1.0 + EPSILON * LV * LV * ws / (CP * RD * t_k * t_k);

    Ok((RD * t_k / (CP * p.unpack())) * (numerator / denominator))
}

/// Dry adiabatic lapse rate in K/hPa, the limit of `moist_adiabatic_lapse_rate` for dry air.
#[inline]
pub fn dry_adiabatic_lapse_rate(t: Kelvin, p: HectoPascal) -> f64 {
    RD * t.unpack() / (CP * p.unpack())
}

/// Mixing ratio of saturated air at temperature `t` and pressure `p`.
#[inline]
pub fn saturation_mixing_ratio(t: Kelvin, p: HectoPascal) -> Result<f64, DomainError> {
    mixing_ratio(saturation_vapor_pressure(Celsius::from(t)), p)
}

/// Mixing ratio of air at temperature `t` with relative humidity `rh` (fraction) at pressure `p`.
#[inline]
pub fn mixing_ratio_from_rh(t: Kelvin, rh: f64, p: HectoPascal) -> Result<f64, DomainError> {
    let es = saturation_vapor_pressure(Celsius::from(t)).unpack();
    mixing_ratio(HectoPascal(es * rh), p)
}

/// Reduce mean sea level pressure to station pressure with the standard atmosphere lapse rate.
#[inline]
pub fn station_pressure_from_mslp(mslp: HectoPascal, t: Kelvin, elevation_m: f64) -> HectoPascal {
    HectoPascal(mslp.unpack() * (1.0 - 0.0065 * elevation_m / t.unpack()).powf(5.255))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utility::test_tools::*;

    #[test]
    fn test_saturation_vapor_pressure() {
        assert!(approx_equal(
            saturation_vapor_pressure(Celsius(0.0)).unpack(),
            6.112,
            1.0e-3
        ));
        // Boiling point of water is in the right neighborhood.
        assert!(approx_equal(
            saturation_vapor_pressure(Celsius(100.0)).unpack(),
            1013.25,
            50.0
        ));
    }

    #[test]
    fn test_mixing_ratio() {
        let mw = mixing_ratio(HectoPascal(20.0), HectoPascal(1000.0)).unwrap();
        assert!(approx_equal(mw, 0.622 * 20.0 / 980.0, 1.0e-12));

        assert_eq!(
            mixing_ratio(HectoPascal(20.0), HectoPascal(20.0)),
            Err(DomainError::VaporPressureExceedsPressure { e: 20.0, p: 20.0 })
        );
        assert!(mixing_ratio(HectoPascal(0.0), HectoPascal(-1.0)).is_err());

        let e = vapor_pressure_from_mixing_ratio(mw, HectoPascal(1000.0));
        assert!(approx_equal(e.unpack(), 20.0, 1.0e-9));
    }

    #[test]
    fn test_virtual_temperature() {
        let t = Kelvin(300.0);
        assert!(approx_equal(virtual_temperature(t, 0.0).unpack(), 300.0, 1.0e-12));

        let tv = virtual_temperature(t, 0.015).unpack();
        assert!(tv > 300.0);
        assert!(approx_equal(tv, 302.7, 0.1));
    }

    #[test]
    fn test_dew_point_inverts_vapor_pressure() {
        for &t in &[-30.0, -5.0, 0.0, 12.5, 28.0] {
            let e = saturation_vapor_pressure(Celsius(t));
            let td = dew_point_from_vapor_pressure(e).unwrap();
            assert!(approx_equal(td.unpack(), t, 1.0e-9));
        }

        assert!(dew_point_from_vapor_pressure(HectoPascal(0.0)).is_err());
    }

    #[test]
    fn test_lcl_pressure() {
        let t = Kelvin(301.15);
        let p = HectoPascal(1013.0);

        // Saturated air is at its LCL.
        let p_lcl = lcl_pressure(t, t, p).unwrap();
        assert!(approx_equal(p_lcl.unpack(), 1013.0, 1.5));

        // Monotonically decreasing with the dew point depression.
        let mut last = p_lcl;
        for depression in 1..30 {
            let td = Kelvin(t.unpack() - f64::from(depression));
            let p_lcl = lcl_pressure(t, td, p).unwrap();
            assert!(p_lcl < last);
            last = p_lcl;
        }

        assert!(lcl_pressure(t, Kelvin(50.0), p).is_err());
    }

    #[test]
    fn test_moist_lapse_rate_less_than_dry() {
        for &(t, p) in &[(300.0, 1000.0), (285.0, 800.0), (260.0, 500.0)] {
            let (t, p) = (Kelvin(t), HectoPascal(p));
            let moist = moist_adiabatic_lapse_rate(t, p).unwrap();
            let dry = dry_adiabatic_lapse_rate(t, p);
            assert!(moist > 0.0);
            assert!(moist < dry);
        }

        // Hot enough that saturation vapor pressure exceeds the total pressure.
        assert!(moist_adiabatic_lapse_rate(Kelvin(400.0), HectoPascal(100.0)).is_err());
    }

    #[test]
    fn test_dry_adiabat_round_trip() {
        let t0 = Kelvin(300.0);
        let t1 = dry_adiabat(t0, HectoPascal(1000.0), HectoPascal(700.0));
        let t2 = dry_adiabat(t1, HectoPascal(700.0), HectoPascal(1000.0));
        assert!(approx_equal(t2.unpack(), 300.0, 1.0e-9));

        let theta = potential_temperature(t1, HectoPascal(700.0)).unwrap();
        assert!(approx_equal(theta.unpack(), 300.0, 1.0e-9));
    }

    #[test]
    fn test_station_pressure_from_mslp() {
        let p = station_pressure_from_mslp(HectoPascal(1013.25), Kelvin(288.15), 100.0);
        assert!(approx_equal(p.unpack(), 1001.3, 0.5));
    }
}
