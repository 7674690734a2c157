//! Buoyancy of a lifted parcel and its vertical integrals.
use super::lift::ParcelTrace;
use crate::{
    met_formulas::{self, G, RD},
    sounding::ProfileView,
};
use itertools::izip;
use metfor::{HectoPascal, JpKg, Kelvin, Quantity};

/// Parallel profiles of a parcel and its environment.
#[derive(Debug, Clone, PartialEq)]
pub struct BuoyancyProfile {
    /// Pressure profile
    pub pressure: Vec<HectoPascal>,
    /// Environment virtual temperature profile
    pub environment_virtual_t: Vec<Kelvin>,
    /// Parcel virtual temperature profile
    pub parcel_virtual_t: Vec<Kelvin>,
    /// Parcel minus environment virtual temperature, K
    pub buoyancy: Vec<f64>,
    /// Index of the first level at or above the LCL.
    pub lcl_index: Option<usize>,
    /// Index of the level of free convection.
    pub lfc_index: Option<usize>,
    /// Index of the equilibrium level.
    pub el_index: Option<usize>,
}

impl BuoyancyProfile {
    /// Compare the traced parcel with its environment.
    ///
    /// Below the LCL the parcel keeps `mixing_ratio`, at and above it the parcel is saturated.
    pub(crate) fn new(view: ProfileView<'_>, trace: &ParcelTrace, mixing_ratio: f64) -> Self {
        debug_assert_eq!(view.len(), trace.temperature.len());

        let lcl = trace.lcl_pressure;
        let pressure = view.pressure().to_vec();

        let environment_virtual_t: Vec<Kelvin> =
            izip!(view.pressure(), view.temperature(), view.relative_humidity())
                .map(|(&p, &t, &rh)| {
                    let mw = met_formulas::mixing_ratio_from_rh(t, rh, p)
                        .unwrap_or_else(|err| dry_fallback(p, err));
                    met_formulas::virtual_temperature(t, mw)
                })
                .collect();

        let parcel_virtual_t: Vec<Kelvin> = izip!(view.pressure(), &trace.temperature)
            .map(|(&p, &t)| {
                let mw = if p <= lcl {
                    met_formulas::saturation_mixing_ratio(t, p)
                        .unwrap_or_else(|err| dry_fallback(p, err))
                } else {
                    mixing_ratio
                };
                met_formulas::virtual_temperature(t, mw)
            })
            .collect();

        let buoyancy: Vec<f64> = izip!(&parcel_virtual_t, &environment_virtual_t)
            .map(|(pcl, env)| pcl.unpack() - env.unpack())
            .collect();

        let lcl_index = pressure.iter().position(|&p| p <= lcl);
        let (lfc_index, el_index) = free_convection_levels(&buoyancy, lcl_index);

        BuoyancyProfile {
            pressure,
            environment_virtual_t,
            parcel_virtual_t,
            buoyancy,
            lcl_index,
            lfc_index,
            el_index,
        }
    }

    /// Integrate the convective inhibition and the CAPE.
    ///
    /// Returns `(cape, cin)`, both zero when there is no LFC.
    pub(crate) fn cape_cin(&self) -> (JpKg, JpKg) {
        let (lfc, el) = match (self.lfc_index, self.el_index) {
            (Some(lfc), Some(el)) => (lfc, el),
            _ => return (JpKg(0.0), JpKg(0.0)),
        };

        let cin: f64 = (1..lfc)
            .filter(|&i| self.buoyancy[i] < 0.0)
            .map(|i| self.layer_energy(i))
            .sum();

        let cape: f64 = ((lfc + 1)..=el)
            .filter(|&i| self.buoyancy[i] > 0.0 || self.buoyancy[i - 1] > 0.0)
            .map(|i| self.layer_energy(i))
            .filter(|&energy| energy > 0.0)
            .sum();

        (JpKg(cape), JpKg(cin))
    }

    /// Buoyant energy of the layer between levels `i - 1` and `i`.
    ///
    /// The thickness comes from the hypsometric equation with the layer mean virtual
    /// temperature, the buoyancy is the layer mean.
    fn layer_energy(&self, i: usize) -> f64 {
        let (tv_lower, tv_upper) = (
            self.environment_virtual_t[i - 1].unpack(),
            self.environment_virtual_t[i].unpack(),
        );
        let (p_lower, p_upper) = (self.pressure[i - 1].unpack(), self.pressure[i].unpack());

        let tv_avg = (tv_lower + tv_upper) / 2.0;
        let buoyancy_avg = (self.buoyancy[i - 1] + self.buoyancy[i]) / 2.0;
        let dz = RD * tv_avg / G * (p_lower / p_upper).ln();

        G * (buoyancy_avg / tv_avg) * dz
    }
}

/// Find the LFC and EL indexes from the buoyancy profile.
///
/// The LFC is the first level at or above the LCL where the buoyancy turns positive. The EL is
/// the first level above that with negative buoyancy, or the top level if the parcel stays
/// buoyant all the way up.
fn free_convection_levels(
    buoyancy: &[f64],
    lcl_index: Option<usize>,
) -> (Option<usize>, Option<usize>) {
    let lfc_index = lcl_index.and_then(|lcl_idx| {
        (lcl_idx.max(1)..buoyancy.len()).find(|&i| buoyancy[i] > 0.0 && buoyancy[i - 1] <= 0.0)
    });

    let el_index = lfc_index.map(|lfc_idx| {
        ((lfc_idx + 1)..buoyancy.len())
            .find(|&i| buoyancy[i] < 0.0)
            .unwrap_or(buoyancy.len() - 1)
    });

    (lfc_index, el_index)
}

fn dry_fallback(p: HectoPascal, err: met_formulas::DomainError) -> f64 {
    log::warn!(
        "mixing ratio undefined at {} hPa ({}), treating the air as dry",
        p.unpack(),
        err
    );
    0.0
}
