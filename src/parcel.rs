//! Parcels used in parcel analysis.
use crate::{
    error::Result,
    met_formulas::{self, DomainError},
    sounding::{AtmosphericLevel, SurfaceObservation},
};
use metfor::{HectoPascal, Kelvin, Quantity};

/// Variables defining a parcel as used in parcel analysis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parcel {
    /// Temperature in Kelvin
    pub temperature: Kelvin,
    /// Pressure in hPa
    pub pressure: HectoPascal,
    /// Mixing ratio in kg/kg
    pub mixing_ratio: f64,
}

impl Parcel {
    /// Get the vapor pressure of the parcel, never more than saturation.
    #[inline]
    pub fn vapor_pressure(&self) -> HectoPascal {
        let e = met_formulas::vapor_pressure_from_mixing_ratio(self.mixing_ratio, self.pressure);
        let es = met_formulas::saturation_vapor_pressure(self.temperature.into());
        if e > es {
            es
        } else {
            e
        }
    }

    /// Get the pressure of the lifting condensation level.
    ///
    /// A parcel without any moisture gets half its own pressure. The result is never below
    /// the parcel's pressure.
    pub fn lcl_pressure(&self) -> ::std::result::Result<HectoPascal, DomainError> {
        let e = self.vapor_pressure();
        if e.unpack() <= 0.0 {
            return Ok(HectoPascal(self.pressure.unpack() / 2.0));
        }

        let td = met_formulas::dew_point_from_vapor_pressure(e)?;
        let p_lcl = met_formulas::lcl_pressure(self.temperature, Kelvin::from(td), self.pressure)?;

        Ok(if p_lcl > self.pressure {
            self.pressure
        } else {
            p_lcl
        })
    }

    /// Get the virtual temperature of the parcel.
    #[inline]
    pub fn virtual_temperature(&self) -> Kelvin {
        met_formulas::virtual_temperature(self.temperature, self.mixing_ratio)
    }
}

/// Get a surface parcel.
///
/// The moisture comes from the observed dew point if there is one, otherwise from the relative
/// humidity.
pub fn surface_parcel(obs: &SurfaceObservation) -> Result<Parcel> {
    Ok(Parcel {
        temperature: Kelvin::from(obs.temperature()),
        pressure: obs.pressure(),
        mixing_ratio: obs.mixing_ratio()?,
    })
}

/// Get a parcel with the properties of a profile level.
pub fn level_parcel(level: &AtmosphericLevel) -> Result<Parcel> {
    Ok(Parcel {
        temperature: level.temperature,
        pressure: level.pressure,
        mixing_ratio: level.mixing_ratio()?,
    })
}
