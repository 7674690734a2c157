//! Adiabatic ascent of a parcel through a pressure grid.
use crate::{config::EngineConfig, met_formulas, parcel::Parcel};
use metfor::{HectoPascal, Kelvin, Quantity};

/// The temperature of a lifted parcel at every level of the grid it was lifted through.
#[derive(Debug, Clone, PartialEq)]
pub struct ParcelTrace {
    /// Parcel temperature at each grid level, starting with the parcel's own level.
    pub temperature: Vec<Kelvin>,
    /// Pressure of the parcel's lifting condensation level.
    pub lcl_pressure: HectoPascal,
}

/// Lift `parcel` through `pressure`, whose first level is the parcel's own level.
///
/// Steps entirely below the LCL follow the dry adiabat exactly. A step that crosses the LCL is
/// lifted dry to the LCL and then integrated along the moist adiabat with forward Euler steps
/// between `config.lcl_crossing_substeps` evenly spaced pressures. Steps entirely above the LCL
/// use `config.moist_substeps` pressures.
pub(crate) fn lift_parcel(
    parcel: &Parcel,
    pressure: &[HectoPascal],
    config: &EngineConfig,
) -> ParcelTrace {
    debug_assert!(!pressure.is_empty());

    let lcl_pressure = parcel.lcl_pressure().unwrap_or_else(|err| {
        log::warn!(
            "no LCL for parcel at {} hPa ({}), treating it as saturated",
            parcel.pressure.unpack(),
            err
        );
        parcel.pressure
    });

    let mut temperature: Vec<Kelvin> = Vec::with_capacity(pressure.len());
    temperature.push(parcel.temperature);

    for pair in pressure.windows(2) {
        let (p_lower, p_upper) = (pair[0], pair[1]);
        let t_lower = temperature[temperature.len() - 1];

        let t_upper = if p_upper >= lcl_pressure {
            met_formulas::dry_adiabat(t_lower, p_lower, p_upper)
        } else if p_lower >= lcl_pressure {
            let t_lcl = met_formulas::dry_adiabat(t_lower, p_lower, lcl_pressure);
            moist_ascent(t_lcl, lcl_pressure, p_upper, config.lcl_crossing_substeps)
        } else {
            moist_ascent(t_lower, p_lower, p_upper, config.moist_substeps)
        };

        temperature.push(t_upper);
    }

    ParcelTrace {
        temperature,
        lcl_pressure,
    }
}

/// Integrate the moist adiabat from `p_start` to `p_end` with forward Euler steps in pressure.
///
/// The steps run between `points` evenly spaced pressures, both ends included, so there is one
/// step less than there are points.
fn moist_ascent(t_start: Kelvin, p_start: HectoPascal, p_end: HectoPascal, points: u32) -> Kelvin {
    let intervals = points.max(2) - 1;
    let p_start = p_start.unpack();
    let dp = (p_end.unpack() - p_start) / f64::from(intervals);

    (0..intervals).fold(t_start, |t, step| {
        let p = HectoPascal(p_start + f64::from(step) * dp);
        let rate = met_formulas::moist_adiabatic_lapse_rate(t, p).unwrap_or_else(|err| {
            log::warn!(
                "moist lapse rate undefined at {} hPa ({}), using the dry rate",
                p.unpack(),
                err
            );
            met_formulas::dry_adiabatic_lapse_rate(t, p)
        });

        Kelvin(t.unpack() + rate * dp)
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utility::test_tools::approx_equal;

    fn grid(ps: &[f64]) -> Vec<HectoPascal> {
        ps.iter().cloned().map(HectoPascal).collect()
    }

    #[test]
    fn test_dry_round_trip() {
        let parcel = Parcel {
            temperature: Kelvin(300.0),
            pressure: HectoPascal(1000.0),
            mixing_ratio: 0.0,
        };
        let pressure = grid(&[1000.0, 950.0, 900.0, 800.0, 700.0, 600.0, 550.0, 500.0]);

        let trace = lift_parcel(&parcel, &pressure, &EngineConfig::default());
        assert_eq!(trace.lcl_pressure, HectoPascal(500.0));
        assert_eq!(trace.temperature.len(), pressure.len());

        for (p, t) in pressure.iter().zip(trace.temperature.iter()) {
            let expected = 300.0 * (p.unpack() / 1000.0).powf(met_formulas::KAPPA);
            assert!(approx_equal(t.unpack(), expected, 1.0e-9));
        }
    }

    #[test]
    fn test_moist_ascent_cools_slower_than_dry() {
        let parcel = Parcel {
            temperature: Kelvin(300.0),
            pressure: HectoPascal(1000.0),
            // Saturated at the start.
            mixing_ratio: 0.05,
        };
        let pressure = grid(&[1000.0, 900.0, 800.0, 700.0]);

        let trace = lift_parcel(&parcel, &pressure, &EngineConfig::default());
        assert!(approx_equal(trace.lcl_pressure.unpack(), 1000.0, 1.0));

        for (p, t) in pressure.iter().zip(trace.temperature.iter()).skip(1) {
            let dry = met_formulas::dry_adiabat(Kelvin(300.0), HectoPascal(1000.0), *p);
            assert!(*t > dry);
        }
        // Monotonically cooling.
        assert!(trace
            .temperature
            .windows(2)
            .all(|pair| pair[1] < pair[0]));
    }

    #[test]
    fn test_crossing_the_lcl() {
        let parcel = Parcel {
            temperature: Kelvin(301.15),
            pressure: HectoPascal(1013.0),
            mixing_ratio: 0.0166,
        };
        let pressure = grid(&[
            1013.0, 1003.0, 993.0, 983.0, 973.0, 963.0, 953.0, 943.0, 933.0, 923.0, 913.0,
        ]);
        let trace = lift_parcel(&parcel, &pressure, &EngineConfig::default());

        // Dry below the LCL, somewhere near 928 hPa.
        assert!(trace.lcl_pressure > HectoPascal(920.0));
        assert!(trace.lcl_pressure < HectoPascal(935.0));
        let expected =
            met_formulas::dry_adiabat(Kelvin(301.15), HectoPascal(1013.0), HectoPascal(933.0));
        assert!(approx_equal(
            trace.temperature[8].unpack(),
            expected.unpack(),
            1.0e-9
        ));

        // Above the LCL the parcel is warmer than the dry adiabat.
        let dry =
            met_formulas::dry_adiabat(Kelvin(301.15), HectoPascal(1013.0), HectoPascal(913.0));
        assert!(trace.temperature[10] > dry);
    }

    // Forward Euler along the moist adiabat with `intervals` equal steps.
    fn euler(mut t: Kelvin, p_start: HectoPascal, p_end: HectoPascal, intervals: u32) -> Kelvin {
        let dp = (p_end.unpack() - p_start.unpack()) / f64::from(intervals);
        for j in 0..intervals {
            let p = HectoPascal(p_start.unpack() + f64::from(j) * dp);
            let rate = met_formulas::moist_adiabatic_lapse_rate(t, p).unwrap();
            t = Kelvin(t.unpack() + rate * dp);
        }
        t
    }

    #[test]
    fn test_substep_counts() {
        let parcel = Parcel {
            temperature: Kelvin(301.15),
            pressure: HectoPascal(1013.0),
            mixing_ratio: 0.0166,
        };
        let lcl = parcel.lcl_pressure().unwrap();
        let pressure = grid(&[1013.0, 913.0, 903.0]);
        let trace = lift_parcel(&parcel, &pressure, &EngineConfig::default());

        // Ten pressures from the LCL to 913 hPa, nine intervals.
        let t_lcl = met_formulas::dry_adiabat(Kelvin(301.15), HectoPascal(1013.0), lcl);
        let expected = euler(t_lcl, lcl, HectoPascal(913.0), 9);
        assert!(approx_equal(
            trace.temperature[1].unpack(),
            expected.unpack(),
            1.0e-9
        ));
        let ten = euler(t_lcl, lcl, HectoPascal(913.0), 10);
        assert!(!approx_equal(
            trace.temperature[1].unpack(),
            ten.unpack(),
            1.0e-9
        ));

        // Five pressures above the LCL, four intervals.
        let expected = euler(trace.temperature[1], HectoPascal(913.0), HectoPascal(903.0), 4);
        assert!(approx_equal(
            trace.temperature[2].unpack(),
            expected.unpack(),
            1.0e-9
        ));
    }

    #[test]
    fn test_no_lcl_means_saturated() {
        // So little vapor the dew point is beyond the reach of Bolton's LCL fit.
        let parcel = Parcel {
            temperature: Kelvin(300.0),
            pressure: HectoPascal(1000.0),
            mixing_ratio: 1.0e-300,
        };
        assert!(parcel.lcl_pressure().is_err());

        let pressure = grid(&[1000.0, 950.0, 900.0]);
        let trace = lift_parcel(&parcel, &pressure, &EngineConfig::default());
        assert_eq!(trace.lcl_pressure, parcel.pressure);

        // Lifted moist from the start.
        let expected = euler(Kelvin(300.0), HectoPascal(1000.0), HectoPascal(950.0), 9);
        assert!(approx_equal(
            trace.temperature[1].unpack(),
            expected.unpack(),
            1.0e-9
        ));
    }

    #[test]
    fn test_undefined_moist_rate_uses_dry_rate() {
        // Saturation vapor pressure at 400 K is far above 100 hPa.
        let (t, p) = (Kelvin(400.0), HectoPascal(100.0));
        assert!(met_formulas::moist_adiabatic_lapse_rate(t, p).is_err());

        let result = moist_ascent(t, p, HectoPascal(90.0), 2);
        let expected = 400.0 + met_formulas::dry_adiabatic_lapse_rate(t, p) * -10.0;
        assert!(approx_equal(result.unpack(), expected, 1.0e-9));
    }

    #[test]
    fn test_single_level() {
        let parcel = Parcel {
            temperature: Kelvin(300.0),
            pressure: HectoPascal(1000.0),
            mixing_ratio: 0.01,
        };
        let trace = lift_parcel(&parcel, &grid(&[1000.0]), &EngineConfig::default());
        assert_eq!(trace.temperature, vec![Kelvin(300.0)]);
    }
}
