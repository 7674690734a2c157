use chrono::{NaiveDateTime, Timelike};
use metfor::{Celsius, HectoPascal, MetersPSec, Quantity};
use optional::Optioned;

/// Pressure level used to decide if a forecast snapshot carries upper air data at all.
const PROBE_LEVEL: HectoPascal = HectoPascal(850.0);

/// One forecast pressure level.
///
/// Either variable may be missing, the model does not always provide humidity aloft.
/// Relative humidity is in percent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForecastLevel {
    /// Pressure of the level.
    pub pressure: HectoPascal,
    /// Temperature at the level.
    pub temperature: Optioned<Celsius>,
    /// Relative humidity at the level in percent.
    pub relative_humidity: Optioned<f64>,
}

impl ForecastLevel {
    /// Create a new forecast level.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use convective_profile::ForecastLevel;
    /// use metfor::{Celsius, HectoPascal};
    ///
    /// let lvl = ForecastLevel::new(HectoPascal(850.0), Celsius(15.0), 60.0);
    /// assert!(lvl.relative_humidity.is_some());
    ///
    /// let lvl = ForecastLevel::new(HectoPascal(850.0), Celsius(15.0), None::<f64>);
    /// assert!(lvl.relative_humidity.is_none());
    /// ```
    #[inline]
    pub fn new<T, U>(pressure: HectoPascal, temperature: T, relative_humidity: U) -> Self
    where
        Optioned<Celsius>: From<T>,
        Optioned<f64>: From<U>,
    {
        ForecastLevel {
            pressure,
            temperature: Optioned::from(temperature),
            relative_humidity: Optioned::from(relative_humidity),
        }
    }
}

/// A forecast snapshot of the vertical profile for a single valid time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ForecastProfile {
    valid_time: Option<NaiveDateTime>,
    model: Option<String>,
    levels: Vec<ForecastLevel>,
    // Model winds used for the shear proxy.
    surface_wind: Optioned<MetersPSec>,
    upper_wind: Optioned<MetersPSec>,
}

impl ForecastProfile {
    /// Create an empty forecast profile.
    #[inline]
    pub fn new() -> Self {
        ForecastProfile::default()
    }

    /// Builder method for the pressure levels, in any order.
    #[inline]
    pub fn with_levels(mut self, levels: Vec<ForecastLevel>) -> Self {
        self.levels = levels;
        self
    }

    /// Builder method for the valid time of the snapshot.
    #[inline]
    pub fn with_valid_time<T>(mut self, valid_time: T) -> Self
    where
        Option<NaiveDateTime>: From<T>,
    {
        self.valid_time = Option::from(valid_time);
        self
    }

    /// Builder method for a description of the model that produced the snapshot.
    #[inline]
    pub fn with_model<S>(mut self, model: S) -> Self
    where
        S: Into<String>,
    {
        self.model = Some(model.into());
        self
    }

    /// Builder method for the model's near surface (10 m) wind speed.
    #[inline]
    pub fn with_surface_wind<T>(mut self, speed: T) -> Self
    where
        Optioned<MetersPSec>: From<T>,
    {
        self.surface_wind = Optioned::from(speed);
        self
    }

    /// Builder method for the wind speed at the upper reference level of the shear proxy.
    #[inline]
    pub fn with_upper_wind<T>(mut self, speed: T) -> Self
    where
        Optioned<MetersPSec>: From<T>,
    {
        self.upper_wind = Optioned::from(speed);
        self
    }

    /// The pressure levels.
    #[inline]
    pub fn levels(&self) -> &[ForecastLevel] {
        &self.levels
    }

    /// Valid time of the snapshot.
    #[inline]
    pub fn valid_time(&self) -> Option<NaiveDateTime> {
        self.valid_time
    }

    /// Description of the model that produced the snapshot.
    #[inline]
    pub fn model(&self) -> Option<&str> {
        self.model.as_ref().map(|s| s.as_ref())
    }

    /// Model near surface wind speed.
    #[inline]
    pub fn surface_wind(&self) -> Optioned<MetersPSec> {
        self.surface_wind
    }

    /// Model wind speed at the upper reference level.
    #[inline]
    pub fn upper_wind(&self) -> Optioned<MetersPSec> {
        self.upper_wind
    }

    /// Whether this snapshot has a temperature at 850 hPa, a cheap test for upper air data.
    pub fn has_upper_air_data(&self) -> bool {
        self.levels.iter().any(|lvl| {
            (lvl.pressure.unpack() - PROBE_LEVEL.unpack()).abs() < std::f64::EPSILON
                && lvl.temperature.is_some()
        })
    }
}

/// Hourly forecast snapshots for one location, ordered by valid time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ForecastSeries {
    snapshots: Vec<ForecastProfile>,
}

impl ForecastSeries {
    /// Create a series from snapshots ordered by valid time.
    #[inline]
    pub fn new(snapshots: Vec<ForecastProfile>) -> Self {
        ForecastSeries { snapshots }
    }

    /// The snapshots in the series.
    #[inline]
    pub fn snapshots(&self) -> &[ForecastProfile] {
        &self.snapshots
    }

    /// Select the snapshot to analyze at time `now`.
    ///
    /// Picks the snapshot valid in the same hour as `now`, or the first one if none matches.
    /// Limited area models often have no upper air data at the latest hours, so if the chosen
    /// snapshot lacks it, this walks back to the latest earlier snapshot that has it.
    pub fn select(&self, now: NaiveDateTime) -> Option<&ForecastProfile> {
        let same_hour = |vt: NaiveDateTime| vt.date() == now.date() && vt.hour() == now.hour();

        let idx = self
            .snapshots
            .iter()
            .position(|snap| snap.valid_time.map(same_hour).unwrap_or(false))
            .unwrap_or(0);

        let chosen = self.snapshots.get(idx)?;
        if chosen.has_upper_air_data() {
            return Some(chosen);
        }

        let fallback = self.snapshots[..idx]
            .iter()
            .rev()
            .find(|snap| snap.has_upper_air_data());

        match fallback {
            Some(snap) => {
                log::debug!(
                    "snapshot {:?} has no upper air data, using {:?}",
                    chosen.valid_time,
                    snap.valid_time
                );
                Some(snap)
            }
            None => Some(chosen),
        }
    }
}
