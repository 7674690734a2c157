//! Data types describing the vertical profile the engine analyzes and the inputs it is built from.

use crate::error::{AnalysisError, Result};
use metfor::{HectoPascal, Kelvin, Quantity};

pub use self::{
    atmospheric_level::AtmosphericLevel,
    forecast::{ForecastLevel, ForecastProfile, ForecastSeries},
    surface::SurfaceObservation,
};

mod atmospheric_level;
mod forecast;
mod surface;

/// Minimum number of levels for a usable profile.
pub const MIN_PROFILE_LEVELS: usize = 3;

/// A vertical profile of the atmosphere.
///
/// The variables are stored in parallel vectors. The first level is the surface and pressure
/// decreases strictly from there, so iterating the vectors front to back walks up through the
/// atmosphere.
#[derive(Clone, Debug, PartialEq)]
pub struct Profile {
    pressure: Vec<HectoPascal>,
    temperature: Vec<Kelvin>,
    relative_humidity: Vec<f64>,

    // Whether this profile was resampled onto a fine grid.
    interpolated: bool,
}

impl Profile {
    /// Build a profile from a list of levels, surface first.
    ///
    /// Fails with `InsufficientProfile` if there are fewer than 3 levels and with `InvalidInput`
    /// if pressure is not strictly decreasing or a value is out of its physical range.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use convective_profile::{AtmosphericLevel, Profile};
    /// use metfor::{HectoPascal, Kelvin};
    ///
    /// let levels = vec![
    ///     AtmosphericLevel::new(HectoPascal(1000.0), Kelvin(300.0), 0.8),
    ///     AtmosphericLevel::new(HectoPascal(850.0), Kelvin(290.0), 0.7),
    ///     AtmosphericLevel::new(HectoPascal(700.0), Kelvin(280.0), 0.5),
    /// ];
    ///
    /// let profile = Profile::from_levels(&levels).unwrap();
    /// assert_eq!(profile.len(), 3);
    ///
    /// assert!(Profile::from_levels(&levels[..2]).is_err());
    /// ```
    pub fn from_levels(levels: &[AtmosphericLevel]) -> Result<Self> {
        if levels.len() < MIN_PROFILE_LEVELS {
            return Err(AnalysisError::InsufficientProfile {
                usable: levels.len(),
            });
        }

        for lvl in levels {
            lvl.validate()?;
        }

        let strictly_decreasing = levels
            .windows(2)
            .all(|pair| pair[0].pressure > pair[1].pressure);
        if !strictly_decreasing {
            return Err(AnalysisError::InvalidInput(
                "profile pressure must strictly decrease upward".to_owned(),
            ));
        }

        Ok(Profile {
            pressure: levels.iter().map(|lvl| lvl.pressure).collect(),
            temperature: levels.iter().map(|lvl| lvl.temperature).collect(),
            relative_humidity: levels.iter().map(|lvl| lvl.relative_humidity).collect(),
            interpolated: false,
        })
    }

    /// Assemble a profile from parallel vectors that are already known to be consistent.
    pub(crate) fn from_parts(
        pressure: Vec<HectoPascal>,
        temperature: Vec<Kelvin>,
        relative_humidity: Vec<f64>,
        interpolated: bool,
    ) -> Self {
        debug_assert_eq!(pressure.len(), temperature.len());
        debug_assert_eq!(pressure.len(), relative_humidity.len());
        debug_assert!(pressure.windows(2).all(|pair| pair[0] > pair[1]));

        Profile {
            pressure,
            temperature,
            relative_humidity,
            interpolated,
        }
    }

    /// Number of levels in the profile.
    #[inline]
    pub fn len(&self) -> usize {
        self.pressure.len()
    }

    /// Always false for a profile that was successfully built, provided for completeness.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pressure.is_empty()
    }

    /// Whether the profile was resampled onto a fine pressure grid.
    #[inline]
    pub fn is_interpolated(&self) -> bool {
        self.interpolated
    }

    /// Get the pressure profile, surface first.
    #[inline]
    pub fn pressure_profile(&self) -> &[HectoPascal] {
        &self.pressure
    }

    /// Get the temperature profile, surface first.
    #[inline]
    pub fn temperature_profile(&self) -> &[Kelvin] {
        &self.temperature
    }

    /// Get the relative humidity profile (fraction), surface first.
    #[inline]
    pub fn relative_humidity_profile(&self) -> &[f64] {
        &self.relative_humidity
    }

    /// Get a single level, `None` if `idx` is out of range.
    #[inline]
    pub fn level(&self, idx: usize) -> Option<AtmosphericLevel> {
        Some(AtmosphericLevel::new(
            *self.pressure.get(idx)?,
            *self.temperature.get(idx)?,
            *self.relative_humidity.get(idx)?,
        ))
    }

    /// The surface level.
    #[inline]
    pub fn surface(&self) -> AtmosphericLevel {
        AtmosphericLevel::new(
            self.pressure[0],
            self.temperature[0],
            self.relative_humidity[0],
        )
    }

    /// Pressure at the top of the profile.
    #[inline]
    pub fn top_pressure(&self) -> HectoPascal {
        self.pressure[self.pressure.len() - 1]
    }

    /// Iterate over the levels from the surface up.
    pub fn bottom_up(&self) -> impl Iterator<Item = AtmosphericLevel> + '_ {
        (0..self.len()).filter_map(move |idx| self.level(idx))
    }

    /// Borrow the whole profile as a view.
    #[inline]
    pub fn view(&self) -> ProfileView<'_> {
        ProfileView {
            pressure: &self.pressure,
            temperature: &self.temperature,
            relative_humidity: &self.relative_humidity,
        }
    }
}

/// A borrowed, possibly truncated, view of a `Profile`.
///
/// Parcel analysis works on views so a parcel lifted from a level above the surface only sees
/// the part of the profile at and above its starting level.
#[derive(Clone, Copy, Debug)]
pub struct ProfileView<'a> {
    pressure: &'a [HectoPascal],
    temperature: &'a [Kelvin],
    relative_humidity: &'a [f64],
}

impl<'a> ProfileView<'a> {
    /// The part of this view at and above `idx`, `None` if fewer than 2 levels would remain.
    pub fn starting_at(&self, idx: usize) -> Option<ProfileView<'a>> {
        if idx + 2 > self.pressure.len() {
            return None;
        }

        Some(ProfileView {
            pressure: &self.pressure[idx..],
            temperature: &self.temperature[idx..],
            relative_humidity: &self.relative_humidity[idx..],
        })
    }

    /// Number of levels in the view.
    #[inline]
    pub fn len(&self) -> usize {
        self.pressure.len()
    }

    /// Whether the view has no levels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pressure.is_empty()
    }

    /// Pressure profile of the view.
    #[inline]
    pub fn pressure(&self) -> &'a [HectoPascal] {
        self.pressure
    }

    /// Temperature profile of the view.
    #[inline]
    pub fn temperature(&self) -> &'a [Kelvin] {
        self.temperature
    }

    /// Relative humidity profile (fraction) of the view.
    #[inline]
    pub fn relative_humidity(&self) -> &'a [f64] {
        self.relative_humidity
    }

    /// Index of the first level within `tolerance` of `target`.
    pub fn index_near(&self, target: HectoPascal, tolerance: f64) -> Option<usize> {
        self.pressure
            .iter()
            .position(|p| (p.unpack() - target.unpack()).abs() < tolerance)
    }
}
