//! Turn convective indexes into a bounded severity score.
//!
//! The score is a custom composite, it is not a standard index from the literature and does not
//! replace indexes such as the STP or the SCP. It is meant for driving alerts.
use metfor::{CelsiusDiff, JpKg, MetersPSec, Quantity};
use optional::Optioned;
use serde::Serialize;
use std::fmt::Display;
use strum_macros::EnumIter;

mod validation;
pub use validation::plausibility_warnings;

/// Highest possible score.
pub const MAX_SCORE: u8 = 12;

/// Conversion from m/s to km/h, gust thresholds are in km/h.
const MPS_TO_KMPH: f64 = 3.6;

/// Categorical warning label derived from the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum WarningLevel {
    /// Nothing to report, score below 3.
    None = 0,
    /// Strong thunderstorms possible, score 3 or 4.
    Moderate = 3,
    /// Severe thunderstorms likely, score 5 or 6.
    High = 5,
    /// Supercells possible, score 7 and up.
    Severe = 7,
}

impl WarningLevel {
    /// The label for a score.
    pub fn from_score(score: u8) -> Self {
        use WarningLevel::*;

        match score {
            0..=2 => None,
            3..=4 => Moderate,
            5..=6 => High,
            _ => Severe,
        }
    }

    /// Whether this level should be reported at all.
    #[inline]
    pub fn is_warning(self) -> bool {
        self != WarningLevel::None
    }
}

impl Display for WarningLevel {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        let label = match self {
            WarningLevel::None => "none",
            WarningLevel::Moderate => "moderate",
            WarningLevel::High => "high",
            WarningLevel::Severe => "severe",
        };
        write!(formatter, "{}", label)
    }
}

/// The ingredients a scoring strategy may use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreInputs {
    /// Surface based CAPE
    pub sbcape: JpKg,
    /// Most unstable CAPE, if any parcel had CAPE.
    pub mucape: Optioned<JpKg>,
    /// Convective inhibition of the surface parcel.
    pub cin: JpKg,
    /// Lifted index of the surface parcel.
    pub lifted_index: CelsiusDiff,
    /// Low level shear proxy.
    pub bulk_shear: Optioned<MetersPSec>,
    /// Observed wind gust, used only by the legacy score.
    pub wind_gust: Optioned<MetersPSec>,
}

impl ScoreInputs {
    /// The larger of the surface based and most unstable CAPE.
    #[inline]
    pub fn max_cape(&self) -> JpKg {
        match self.mucape.into_option() {
            Some(mucape) if mucape > self.sbcape => mucape,
            _ => self.sbcape,
        }
    }
}

/// A score with its label and the reasons each point was awarded.
#[derive(Debug, Clone, PartialEq)]
pub struct SeverityAssessment {
    score: u8,
    level: WarningLevel,
    reasons: Vec<String>,
}

impl SeverityAssessment {
    /// Clamp the raw score to `MAX_SCORE` and label it.
    pub fn new(raw_score: u32, reasons: Vec<String>) -> Self {
        let score = raw_score.min(u32::from(MAX_SCORE)) as u8;
        SeverityAssessment {
            score,
            level: WarningLevel::from_score(score),
            reasons,
        }
    }

    /// The score, 0 to 12.
    #[inline]
    pub fn score(&self) -> u8 {
        self.score
    }

    /// The warning label.
    #[inline]
    pub fn level(&self) -> WarningLevel {
        self.level
    }

    /// Human readable reasons for the score.
    #[inline]
    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }
}

/// A way to combine the ingredients into a score.
pub trait ScoringStrategy {
    /// Name and version of the scheme, reported with the results.
    fn name(&self) -> &'static str;

    /// Score the ingredients.
    fn assess(&self, inputs: &ScoreInputs) -> SeverityAssessment;
}

/// Ingredient based scoring, the default.
///
/// Each of CAPE, CIN, lifted index and shear is bucketed independently, and bonus points are
/// awarded when the ingredients come together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngredientScoring;

impl ScoringStrategy for IngredientScoring {
    fn name(&self) -> &'static str {
        "ingredients-v2"
    }

    fn assess(&self, inputs: &ScoreInputs) -> SeverityAssessment {
        let mut reasons = vec![];
        let mut score = 0;

        let cape = inputs.max_cape().unpack();
        let cin = inputs.cin.unpack().abs();
        let li = inputs.lifted_index.unpack();
        let shear = inputs.bulk_shear.into_option().map_or(0.0, |s| s.unpack());

        score += cape_points(cape, &mut reasons);
        score += cin_points(cin, &mut reasons);

        if li <= -6.0 {
            score += 2;
            reasons.push(format!("very unstable lifted index ({:.1} C)", li));
        } else if li <= -3.0 {
            score += 1;
            reasons.push(format!("unstable lifted index ({:.1} C)", li));
        }

        score += shear_points(shear, &mut reasons);

        if cape >= 1500.0 && shear > 10.0 {
            score += 1;
            reasons.push("high CAPE together with strong shear".to_owned());
        }

        if cape >= 1200.0 && cin <= 125.0 && li <= -2.0 && shear >= 8.0 {
            score += 1;
            reasons.push("all ingredients for organized convection present".to_owned());
        }

        SeverityAssessment::new(score, reasons)
    }
}

/// The first version of the severe score, kept for comparisons with older results.
///
/// Uses CAPE, CIN, shear, and the observed gust as a sign of convection already under way. No
/// lifted index and no synergy bonus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LegacyScoring;

impl ScoringStrategy for LegacyScoring {
    fn name(&self) -> &'static str {
        "legacy-v1"
    }

    fn assess(&self, inputs: &ScoreInputs) -> SeverityAssessment {
        let mut reasons = vec![];
        let mut score = 0;

        let shear = inputs.bulk_shear.into_option().map_or(0.0, |s| s.unpack());
        let gust_kmph = inputs
            .wind_gust
            .into_option()
            .map_or(0.0, |g| g.unpack() * MPS_TO_KMPH);

        score += cape_points(inputs.max_cape().unpack(), &mut reasons);
        score += cin_points(inputs.cin.unpack().abs(), &mut reasons);
        score += shear_points(shear, &mut reasons);

        if gust_kmph > 60.0 {
            score += 2;
            reasons.push(format!("strong gusts ({:.0} km/h)", gust_kmph));
        } else if gust_kmph > 40.0 {
            score += 1;
            reasons.push(format!("moderate gusts ({:.0} km/h)", gust_kmph));
        }

        SeverityAssessment::new(score, reasons)
    }
}

fn cape_points(cape: f64, reasons: &mut Vec<String>) -> u32 {
    let (points, label) = if cape > 3000.0 {
        (4, "extreme")
    } else if cape > 2500.0 {
        (3, "very strong")
    } else if cape > 1500.0 {
        (2, "strong")
    } else if cape > 1000.0 {
        (1, "moderate")
    } else {
        return 0;
    };

    reasons.push(format!("{} CAPE ({:.0} J/kg)", label, cape));
    points
}

fn cin_points(cin_magnitude: f64, reasons: &mut Vec<String>) -> u32 {
    if cin_magnitude < 50.0 {
        reasons.push("weak or absent cap".to_owned());
        2
    } else if cin_magnitude < 100.0 {
        reasons.push("moderate cap".to_owned());
        1
    } else {
        0
    }
}

fn shear_points(shear: f64, reasons: &mut Vec<String>) -> u32 {
    if shear > 15.0 {
        reasons.push(format!("strong shear ({:.1} m/s)", shear));
        3
    } else if shear > 10.0 {
        reasons.push(format!("moderate shear ({:.1} m/s)", shear));
        2
    } else {
        0
    }
}

/// Plain language category for an amount of CAPE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum CapeCategory {
    VeryWeak,
    Weak,
    Moderate,
    Strong,
    Extreme,
}

impl From<JpKg> for CapeCategory {
    fn from(cape: JpKg) -> Self {
        use CapeCategory::*;

        let cape = cape.unpack();
        if cape < 300.0 {
            VeryWeak
        } else if cape < 1000.0 {
            Weak
        } else if cape < 2500.0 {
            Moderate
        } else if cape < 4000.0 {
            Strong
        } else {
            Extreme
        }
    }
}

/// Plain language category for the strength of the cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum CinCategory {
    Weak,
    Moderate,
    Strong,
}

impl From<JpKg> for CinCategory {
    fn from(cin: JpKg) -> Self {
        use CinCategory::*;

        let cin = cin.unpack().abs();
        if cin < 50.0 {
            Weak
        } else if cin < 150.0 {
            Moderate
        } else {
            Strong
        }
    }
}
