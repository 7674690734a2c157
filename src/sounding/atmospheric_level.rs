use crate::{
    error::{AnalysisError, Result},
    met_formulas::{self, DomainError},
};
use metfor::{HectoPascal, Kelvin, Quantity};

/// A single level of a vertical profile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AtmosphericLevel {
    /// Pressure in hPa
    pub pressure: HectoPascal,
    /// Temperature in Kelvin
    pub temperature: Kelvin,
    /// Relative humidity as a fraction, 0 to 1
    pub relative_humidity: f64,
}

impl AtmosphericLevel {
    /// Create a new level.
    #[inline]
    pub fn new(pressure: HectoPascal, temperature: Kelvin, relative_humidity: f64) -> Self {
        AtmosphericLevel {
            pressure,
            temperature,
            relative_humidity,
        }
    }

    /// Mixing ratio (kg/kg) of the air at this level.
    #[inline]
    pub fn mixing_ratio(&self) -> ::std::result::Result<f64, DomainError> {
        met_formulas::mixing_ratio_from_rh(self.temperature, self.relative_humidity, self.pressure)
    }

    /// Virtual temperature of the air at this level.
    #[inline]
    pub fn virtual_temperature(&self) -> ::std::result::Result<Kelvin, DomainError> {
        self.mixing_ratio()
            .map(|mw| met_formulas::virtual_temperature(self.temperature, mw))
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let p = self.pressure.unpack();
        if !p.is_finite() || p <= 0.0 {
            return Err(AnalysisError::InvalidInput(format!(
                "level pressure must be positive, got {} hPa",
                p
            )));
        }

        let t = self.temperature.unpack();
        if !t.is_finite() || t <= 0.0 {
            return Err(AnalysisError::InvalidInput(format!(
                "level temperature must be positive Kelvin, got {} K",
                t
            )));
        }

        let rh = self.relative_humidity;
        if !(0.0..=1.0).contains(&rh) {
            return Err(AnalysisError::InvalidInput(format!(
                "relative humidity must be a fraction, got {}",
                rh
            )));
        }

        Ok(())
    }
}
