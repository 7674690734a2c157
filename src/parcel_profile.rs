//! Lift parcels through a profile and analyze their buoyancy.
use crate::{
    config::EngineConfig,
    error::{AnalysisError, Result},
    parcel::{self, Parcel},
    sounding::{Profile, ProfileView},
};
use metfor::{CelsiusDiff, HectoPascal, JpKg, Quantity};
use optional::Optioned;

pub use self::{buoyancy::BuoyancyProfile, lift::ParcelTrace};

mod buoyancy;
pub(crate) mod lift;

/// Parcel analysis, this is a way to package the analysis of a parcel.
///
/// These are done by converting the profiles to virtual temperature. If the parcel never becomes
/// buoyant above its LCL there is no LFC and both the CAPE and the CIN are zero.
#[derive(Debug, Clone)]
pub struct ParcelAscentAnalysis {
    // The orginal parcel and profile
    parcel: Parcel,
    profile: BuoyancyProfile,

    // Indexes from analysis
    cape: JpKg,
    cin: JpKg,
    lcl_pressure: HectoPascal,
    lfc_pressure: Optioned<HectoPascal>,
    el_pressure: Optioned<HectoPascal>,
    lifted_index: Optioned<CelsiusDiff>,
}

impl ParcelAscentAnalysis {
    /// Get the CAPE.
    pub fn cape(&self) -> JpKg {
        self.cape
    }

    /// Get the CIN, zero or negative.
    pub fn cin(&self) -> JpKg {
        self.cin
    }

    /// Get the LCL pressure level.
    pub fn lcl_pressure(&self) -> HectoPascal {
        self.lcl_pressure
    }

    /// Get the pressure at the LFC.
    pub fn lfc_pressure(&self) -> Optioned<HectoPascal> {
        self.lfc_pressure
    }

    /// Get the pressure at the equilibrium level.
    ///
    /// When the parcel is still buoyant at the top of the profile this is the top level, so the
    /// CAPE of a very deep unstable layer is underestimated.
    pub fn el_pressure(&self) -> Optioned<HectoPascal> {
        self.el_pressure
    }

    /// Get the lifted index, environment minus parcel temperature near 500 hPa.
    ///
    /// Missing if the profile has no level close enough to the reference pressure.
    pub fn lifted_index(&self) -> Optioned<CelsiusDiff> {
        self.lifted_index
    }

    /// Retrieve the parcel's profile
    #[inline]
    pub fn profile(&self) -> &BuoyancyProfile {
        &self.profile
    }

    /// Retrieve the original parcel.
    #[inline]
    pub fn parcel(&self) -> &Parcel {
        &self.parcel
    }
}

/// Lift a parcel for a convective parcel analysis.
///
/// The parcel starts at the first level of `view`, which must be at the parcel's pressure.
pub fn lift_parcel(
    parcel: Parcel,
    view: ProfileView<'_>,
    config: &EngineConfig,
) -> Result<ParcelAscentAnalysis> {
    if view.len() < 2 {
        return Err(AnalysisError::InsufficientProfile { usable: view.len() });
    }
    if (view.pressure()[0].unpack() - parcel.pressure.unpack()).abs() > 1.0e-6 {
        return Err(AnalysisError::InvalidInput(format!(
            "parcel at {} hPa does not start at the profile base {} hPa",
            parcel.pressure.unpack(),
            view.pressure()[0].unpack()
        )));
    }

    let trace = lift::lift_parcel(&parcel, view.pressure(), config);
    let profile = BuoyancyProfile::new(view, &trace, parcel.mixing_ratio);
    let (cape, cin) = profile.cape_cin();

    let pressure_at = |idx: Option<usize>| -> Optioned<HectoPascal> {
        Optioned::from(idx.map(|i| profile.pressure[i]))
    };
    let lfc_pressure = pressure_at(profile.lfc_index);
    let el_pressure = pressure_at(profile.el_index);

    let li_target = HectoPascal(config.lifted_index_pressure_hpa);
    let lifted_index: Optioned<CelsiusDiff> = Optioned::from(
        view.index_near(li_target, config.lifted_index_tolerance_hpa)
            .map(|i| {
                CelsiusDiff(view.temperature()[i].unpack() - trace.temperature[i].unpack())
            }),
    );

    log::debug!(
        "parcel from {} hPa: LCL {:.0} hPa, LFC {:?}, EL {:?}, CAPE {:.0}, CIN {:.0}",
        parcel.pressure.unpack(),
        trace.lcl_pressure.unpack(),
        lfc_pressure.map(|p| p.unpack()),
        el_pressure.map(|p| p.unpack()),
        cape.unpack(),
        cin.unpack()
    );

    Ok(ParcelAscentAnalysis {
        parcel,
        profile,
        cape,
        cin,
        lcl_pressure: trace.lcl_pressure,
        lfc_pressure,
        el_pressure,
        lifted_index,
    })
}

/// Find the most unstable parcel, the one with the most CAPE.
///
/// The candidates are `surface` lifted through the whole profile plus every level of the profile
/// within `config.mu_search_depth_hpa` of the surface, each lifted through the part of the
/// profile above it. Since the surface parcel is itself a candidate, the result never has less
/// CAPE than the surface based analysis. Returns `None` if no candidate has any CAPE.
pub fn most_unstable_parcel_ascent(
    surface: Parcel,
    profile: &Profile,
    config: &EngineConfig,
) -> Result<Option<ParcelAscentAnalysis>> {
    let view = profile.view();
    let bottom = profile.surface().pressure.unpack();
    let lowest_candidate = bottom - config.mu_search_depth_hpa;

    let mut best: Option<ParcelAscentAnalysis> = None;
    let mut consider = |anal: ParcelAscentAnalysis| {
        let max_cape = best.as_ref().map(|b| b.cape.unpack()).unwrap_or(0.0);
        if anal.cape.unpack() > max_cape {
            best = Some(anal);
        }
    };

    consider(lift_parcel(surface, view, config)?);

    for (idx, level) in profile.bottom_up().enumerate().skip(1) {
        if level.pressure.unpack() < lowest_candidate {
            break;
        }

        let sub_view = match view.starting_at(idx) {
            Some(sub_view) => sub_view,
            None => break,
        };

        let pcl = match parcel::level_parcel(&level) {
            Ok(pcl) => pcl,
            Err(err) => {
                log::warn!(
                    "skipping candidate at {} hPa: {}",
                    level.pressure.unpack(),
                    err
                );
                continue;
            }
        };

        consider(lift_parcel(pcl, sub_view, config)?);
    }

    if let Some(ref anal) = best {
        log::debug!(
            "most unstable parcel from {} hPa with {:.0} J/kg",
            anal.parcel.pressure.unpack(),
            anal.cape.unpack()
        );
    }

    Ok(best)
}
