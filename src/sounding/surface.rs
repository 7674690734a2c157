use crate::{
    config::ObservationBounds,
    error::{AnalysisError, Result},
    met_formulas,
};
use metfor::{Celsius, HectoPascal, Kelvin, MetersPSec, Quantity};
use optional::Optioned;

/// A surface weather observation, usually from a station near the analysis point.
///
/// Relative humidity is in percent. At least one of dew point and relative humidity is needed
/// to describe the moisture of the surface parcel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceObservation {
    temperature: Celsius,
    pressure: HectoPascal,
    dew_point: Optioned<Celsius>,
    relative_humidity: Optioned<f64>,
    wind_speed: Optioned<MetersPSec>,
    wind_gust: Optioned<MetersPSec>,
}

impl SurfaceObservation {
    /// Create an observation with the required temperature and station pressure.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use convective_profile::SurfaceObservation;
    /// use metfor::{Celsius, HectoPascal, MetersPSec};
    ///
    /// let obs = SurfaceObservation::new(Celsius(28.0), HectoPascal(1013.0))
    ///     .with_dew_point(Celsius(22.0))
    ///     .with_relative_humidity(70.0)
    ///     .with_wind_speed(MetersPSec(3.0))
    ///     .with_wind_gust(None::<MetersPSec>);
    ///
    /// assert_eq!(obs.dew_point().unwrap(), Celsius(22.0));
    /// assert!(obs.wind_gust().is_none());
    /// ```
    #[inline]
    pub fn new(temperature: Celsius, pressure: HectoPascal) -> Self {
        SurfaceObservation {
            temperature,
            pressure,
            dew_point: Optioned::default(),
            relative_humidity: Optioned::default(),
            wind_speed: Optioned::default(),
            wind_gust: Optioned::default(),
        }
    }

    /// Build an observation from model surface fields when no station is available.
    ///
    /// The model reports mean sea level pressure, which is reduced to the station elevation
    /// (meters) with the standard atmosphere lapse rate.
    pub fn from_model_surface(
        temperature: Celsius,
        relative_humidity: Optioned<f64>,
        dew_point: Optioned<Celsius>,
        mslp: HectoPascal,
        elevation_m: f64,
    ) -> Self {
        let pressure =
            met_formulas::station_pressure_from_mslp(mslp, Kelvin::from(temperature), elevation_m);

        SurfaceObservation::new(temperature, pressure)
            .with_relative_humidity(relative_humidity)
            .with_dew_point(dew_point)
    }

    /// Builder method for the dew point.
    #[inline]
    pub fn with_dew_point<T>(mut self, dew_point: T) -> Self
    where
        Optioned<Celsius>: From<T>,
    {
        self.dew_point = Optioned::from(dew_point);
        self
    }

    /// Builder method for the relative humidity in percent.
    #[inline]
    pub fn with_relative_humidity<T>(mut self, rh: T) -> Self
    where
        Optioned<f64>: From<T>,
    {
        self.relative_humidity = Optioned::from(rh);
        self
    }

    /// Builder method for the mean wind speed.
    #[inline]
    pub fn with_wind_speed<T>(mut self, speed: T) -> Self
    where
        Optioned<MetersPSec>: From<T>,
    {
        self.wind_speed = Optioned::from(speed);
        self
    }

    /// Builder method for the wind gust.
    #[inline]
    pub fn with_wind_gust<T>(mut self, gust: T) -> Self
    where
        Optioned<MetersPSec>: From<T>,
    {
        self.wind_gust = Optioned::from(gust);
        self
    }

    /// Air temperature.
    #[inline]
    pub fn temperature(&self) -> Celsius {
        self.temperature
    }

    /// Station pressure.
    #[inline]
    pub fn pressure(&self) -> HectoPascal {
        self.pressure
    }

    /// Dew point.
    #[inline]
    pub fn dew_point(&self) -> Optioned<Celsius> {
        self.dew_point
    }

    /// Relative humidity in percent.
    #[inline]
    pub fn relative_humidity(&self) -> Optioned<f64> {
        self.relative_humidity
    }

    /// Mean wind speed.
    #[inline]
    pub fn wind_speed(&self) -> Optioned<MetersPSec> {
        self.wind_speed
    }

    /// Wind gust.
    #[inline]
    pub fn wind_gust(&self) -> Optioned<MetersPSec> {
        self.wind_gust
    }

    /// Mixing ratio (kg/kg) of the surface air.
    ///
    /// The dew point is preferred, relative humidity is used when the dew point is missing.
    pub fn mixing_ratio(&self) -> Result<f64> {
        if let Some(td) = self.dew_point.into_option() {
            let e = met_formulas::saturation_vapor_pressure(td);
            return Ok(met_formulas::mixing_ratio(e, self.pressure)?);
        }

        if let Some(rh) = self.relative_humidity.into_option() {
            return Ok(met_formulas::mixing_ratio_from_rh(
                Kelvin::from(self.temperature),
                rh / 100.0,
                self.pressure,
            )?);
        }

        Err(AnalysisError::InvalidInput(
            "surface observation has neither dew point nor relative humidity".to_owned(),
        ))
    }

    /// Relative humidity as a fraction of the surface air.
    ///
    /// The observed relative humidity is preferred, otherwise it is derived from the dew point.
    pub fn relative_humidity_fraction(&self) -> Result<f64> {
        if let Some(rh) = self.relative_humidity.into_option() {
            return Ok((rh / 100.0).max(0.0).min(1.0));
        }

        if let Some(td) = self.dew_point.into_option() {
            let e = met_formulas::saturation_vapor_pressure(td).unpack();
            let es = met_formulas::saturation_vapor_pressure(self.temperature).unpack();
            return Ok((e / es).max(0.0).min(1.0));
        }

        Err(AnalysisError::InvalidInput(
            "surface observation has neither dew point nor relative humidity".to_owned(),
        ))
    }

    /// Check that the observation is physically plausible.
    pub fn validate(&self, bounds: &ObservationBounds) -> Result<()> {
        let t = self.temperature.unpack();
        if !t.is_finite() || t < bounds.min_temperature_c || t > bounds.max_temperature_c {
            return Err(AnalysisError::InvalidInput(format!(
                "surface temperature {} C outside [{}, {}]",
                t, bounds.min_temperature_c, bounds.max_temperature_c
            )));
        }

        let p = self.pressure.unpack();
        if !p.is_finite() || p < bounds.min_pressure_hpa || p > bounds.max_pressure_hpa {
            return Err(AnalysisError::InvalidInput(format!(
                "surface pressure {} hPa outside [{}, {}]",
                p, bounds.min_pressure_hpa, bounds.max_pressure_hpa
            )));
        }

        if let Some(rh) = self.relative_humidity.into_option() {
            if !(0.0..=100.0).contains(&rh) {
                return Err(AnalysisError::InvalidInput(format!(
                    "surface relative humidity {}% outside [0, 100]",
                    rh
                )));
            }
        }

        if let Some(td) = self.dew_point.into_option() {
            // A dew point a little above the temperature is sensor noise, not an error.
            if !td.unpack().is_finite() || td.unpack() > t + 1.0 {
                return Err(AnalysisError::InvalidInput(format!(
                    "surface dew point {} C above temperature {} C",
                    td.unpack(),
                    t
                )));
            }
        }

        Ok(())
    }
}
