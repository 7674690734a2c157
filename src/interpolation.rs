//! Resample a coarse profile onto a fine pressure grid.
use crate::{config::EngineConfig, sounding::Profile, utility::pressure_grid};
use itertools::izip;
use metfor::{HectoPascal, Kelvin, Quantity};

/// Number of source levels needed for the cubic spline.
const MIN_SPLINE_POINTS: usize = 4;

/// Resample `profile` every `config.grid_step_hpa` from the surface up to, but not including,
/// the higher of the top of the profile and `config.grid_top_hpa`.
///
/// Temperature is interpolated with a not-a-knot cubic spline and relative humidity linearly,
/// both extrapolating from the end segments. Relative humidity is then clamped to the
/// configured bounds. With fewer than 4 source levels, or when the grid would have fewer than 3
/// levels, the coarse profile is returned unchanged.
pub fn resample(profile: &Profile, config: &EngineConfig) -> Profile {
    if profile.len() < MIN_SPLINE_POINTS {
        log::debug!(
            "only {} levels, skipping interpolation and using the coarse profile",
            profile.len()
        );
        return profile.clone();
    }

    let bottom = profile.surface().pressure.unpack();
    let top = profile.top_pressure().unpack().max(config.grid_top_hpa);
    let grid = pressure_grid(bottom, top, config.grid_step_hpa);
    if grid.len() < crate::sounding::MIN_PROFILE_LEVELS {
        log::debug!("fine grid too short, using the coarse profile");
        return profile.clone();
    }

    // The spline wants ascending abscissas, so work from the top down.
    let xs: Vec<f64> = profile
        .pressure_profile()
        .iter()
        .rev()
        .map(|p| p.unpack())
        .collect();
    let t_ys: Vec<f64> = profile
        .temperature_profile()
        .iter()
        .rev()
        .map(|t| t.unpack())
        .collect();
    let rh_ys: Vec<f64> = profile
        .relative_humidity_profile()
        .iter()
        .rev()
        .cloned()
        .collect();

    let temperature: Vec<Kelvin> = match CubicSpline::not_a_knot(&xs, &t_ys) {
        Some(spline) => grid.iter().map(|&p| Kelvin(spline.evaluate(p))).collect(),
        None => {
            log::warn!("singular spline system, interpolating temperature linearly");
            grid.iter()
                .map(|&p| Kelvin(linear_extrapolate(&xs, &t_ys, p)))
                .collect()
        }
    };

    let (rh_min, rh_max) = (config.min_relative_humidity, config.max_relative_humidity);
    let relative_humidity: Vec<f64> = grid
        .iter()
        .map(|&p| linear_extrapolate(&xs, &rh_ys, p).max(rh_min).min(rh_max))
        .collect();

    log::debug!(
        "resampled {} levels onto {} grid levels",
        profile.len(),
        grid.len()
    );

    Profile::from_parts(
        grid.into_iter().map(HectoPascal).collect(),
        temperature,
        relative_humidity,
        true,
    )
}

/// Index of the segment of `xs` (ascending) to use for `x`, the end segments extend outward.
#[inline]
fn segment_index(xs: &[f64], x: f64) -> usize {
    debug_assert!(xs.len() >= 2);

    xs[1..xs.len() - 1]
        .iter()
        .position(|&knot| x <= knot)
        .unwrap_or(xs.len() - 2)
}

#[inline]
pub(crate) fn linear_interp(x_val: f64, x1: f64, x2: f64, y1: f64, y2: f64) -> f64 {
    debug_assert!((x2 - x1).abs() > std::f64::EPSILON);

    let run = x2 - x1;
    let rise = y2 - y1;
    let dx = x_val - x1;

    y1 + dx * (rise / run)
}

/// Piecewise linear interpolation through ascending `xs`, extrapolating beyond the ends.
pub(crate) fn linear_extrapolate(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    debug_assert_eq!(xs.len(), ys.len());

    let i = segment_index(xs, x);
    linear_interp(x, xs[i], xs[i + 1], ys[i], ys[i + 1])
}

/// A cubic spline with not-a-knot end conditions.
///
/// The third derivative is continuous across the second and the second to last knots, so the
/// first two and the last two segments are each a single cubic.
#[derive(Debug, Clone)]
pub(crate) struct CubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    // Second derivative at each knot.
    curvature: Vec<f64>,
}

impl CubicSpline {
    /// Fit a spline through the points, `xs` strictly ascending and at least 4 points.
    ///
    /// Returns `None` if there are too few points or the system cannot be solved.
    pub(crate) fn not_a_knot(xs: &[f64], ys: &[f64]) -> Option<Self> {
        let n = xs.len();
        if n < MIN_SPLINE_POINTS || ys.len() != n {
            return None;
        }

        let h: Vec<f64> = xs.windows(2).map(|pair| pair[1] - pair[0]).collect();
        if h.iter().any(|&hi| hi <= 0.0) {
            return None;
        }

        let mut matrix = vec![vec![0.0; n]; n];
        let mut rhs = vec![0.0; n];

        matrix[0][0] = -h[1];
        matrix[0][1] = h[0] + h[1];
        matrix[0][2] = -h[0];

        for i in 1..(n - 1) {
            matrix[i][i - 1] = h[i - 1];
            matrix[i][i] = 2.0 * (h[i - 1] + h[i]);
            matrix[i][i + 1] = h[i];
            rhs[i] = 6.0 * ((ys[i + 1] - ys[i]) / h[i] - (ys[i] - ys[i - 1]) / h[i - 1]);
        }

        matrix[n - 1][n - 3] = -h[n - 2];
        matrix[n - 1][n - 2] = h[n - 3] + h[n - 2];
        matrix[n - 1][n - 1] = -h[n - 3];

        let curvature = solve_dense(matrix, rhs)?;

        Some(CubicSpline {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            curvature,
        })
    }

    /// Evaluate the spline, extrapolating with the end segments outside the knots.
    pub(crate) fn evaluate(&self, x: f64) -> f64 {
        let i = segment_index(&self.xs, x);
        let (x0, x1) = (self.xs[i], self.xs[i + 1]);
        let (y0, y1) = (self.ys[i], self.ys[i + 1]);
        let (m0, m1) = (self.curvature[i], self.curvature[i + 1]);

        let h = x1 - x0;
        let t = x - x0;
        let slope = (y1 - y0) / h - h * (2.0 * m0 + m1) / 6.0;

        y0 + slope * t + m0 / 2.0 * t * t + (m1 - m0) / (6.0 * h) * t * t * t
    }
}

/// Gaussian elimination with partial pivoting, `None` if the matrix is singular.
fn solve_dense(mut matrix: Vec<Vec<f64>>, mut rhs: Vec<f64>) -> Option<Vec<f64>> {
    let n = rhs.len();

    for col in 0..n {
        let pivot = (col..n).max_by(|&a, &b| {
            matrix[a][col]
                .abs()
                .partial_cmp(&matrix[b][col].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;

        if matrix[pivot][col].abs() < 1.0e-12 {
            return None;
        }
        matrix.swap(col, pivot);
        rhs.swap(col, pivot);

        for row in (col + 1)..n {
            let factor = matrix[row][col] / matrix[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                matrix[row][k] -= factor * matrix[col][k];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut solution = vec![0.0; n];
    for row in (0..n).rev() {
        let known: f64 = izip!(&matrix[row][(row + 1)..], &solution[(row + 1)..])
            .map(|(a, x)| a * x)
            .sum();
        solution[row] = (rhs[row] - known) / matrix[row][row];
    }

    Some(solution)
}
