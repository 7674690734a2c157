//! Enums used as keys for retrieving values from a `ConvectiveResult`.
use strum_macros::EnumIter;

/// Scalar indexes reported by a convective analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum ConvectiveIndex {
    /// Surface based Convective Available Potential Energy (J/kg)
    SBCAPE,
    /// Most unstable CAPE (J/kg)
    MUCAPE,
    /// Pressure the most unstable parcel starts from (hPa)
    MULevel,
    /// Convective Inhibition of the surface parcel (J/kg)
    CIN,
    /// Lifted Index (C)
    LI,
    /// Lifting Condensation Level of the surface parcel (hPa)
    LCLPressure,
    /// Level of Free Convection of the surface parcel (hPa)
    LFCPressure,
    /// Equilibrium Level of the surface parcel (hPa)
    ELPressure,
    /// Low level shear proxy (m/s)
    BulkShear,
}

impl ConvectiveIndex {
    /// Key used for this index in serialized records.
    pub fn key(self) -> &'static str {
        use self::ConvectiveIndex::*;

        match self {
            SBCAPE => "sbcape",
            MUCAPE => "mucape",
            MULevel => "mu_level",
            CIN => "cin",
            LI => "lifted_index",
            LCLPressure => "lcl_pressure",
            LFCPressure => "lfc_pressure",
            ELPressure => "el_pressure",
            BulkShear => "bulk_shear",
        }
    }
}
