// src/strategy/optimization.rs

//! Numerical helpers shared by the policy layer and the model backends.
//!
//! - Newsvendor reference values: the cost-optimal safety factor for a
//!   shortage/holding cost ratio, and the nominal cycle service level of a z.
//! - A bounded Nelder-Mead simplex minimiser used to estimate smoothing and
//!   ARMA coefficients.

use crate::error::{Error, Result};

/// Calculates the Critical Ratio (target cycle service level).
///
/// Formula: CR = ShortageCost / (ShortageCost + HoldingCost)
pub fn critical_ratio(shortage_cost: f64, holding_cost: f64) -> f64 {
    if shortage_cost + holding_cost == 0.0 {
        return 0.0;
    }
    shortage_cost / (shortage_cost + holding_cost)
}

/// Approximate quantile function of the standard normal distribution.
///
/// Abramowitz and Stegun 26.2.23, absolute error below 4.5e-4.
/// Probabilities outside (0, 1) are capped at ±5 sigma.
pub fn inverse_normal_cdf(p: f64) -> f64 {
    if p >= 1.0 {
        return 5.0;
    }
    if p <= 0.0 {
        return -5.0;
    }
    if p == 0.5 {
        return 0.0;
    }

    // Valid for 0 < q <= 0.5; the upper half is mirrored.
    let q = if p < 0.5 { p } else { 1.0 - p };
    let t = (-2.0 * q.ln()).sqrt();

    const C: [f64; 3] = [2.515517, 0.802853, 0.010328];
    const D: [f64; 3] = [1.432788, 0.189269, 0.001308];

    let numerator = C[0] + C[1] * t + C[2] * t * t;
    let denominator = 1.0 + D[0] * t + D[1] * t * t + D[2] * t * t * t;
    let x = t - numerator / denominator;

    if p < 0.5 {
        -x
    } else {
        x
    }
}

/// Standard normal CDF via the Abramowitz and Stegun 7.1.26 erf approximation.
pub fn normal_cdf(x: f64) -> f64 {
    let z = x.abs() / std::f64::consts::SQRT_2;
    let t = 1.0 / (1.0 + 0.3275911 * z);
    let poly = t
        * (0.254829592
            + t * (-0.284496736 + t * (1.421413741 + t * (-1.453152027 + t * 1.061405429))));
    let erf = 1.0 - poly * (-z * z).exp();
    if x >= 0.0 {
        0.5 * (1.0 + erf)
    } else {
        0.5 * (1.0 - erf)
    }
}

/// Safety factor that balances holding against shortage cost in a single
/// review period (newsvendor). Never negative, since the order-up-to policy
/// rejects z < 0.
pub fn newsvendor_safety_factor(shortage_cost: f64, holding_cost: f64) -> f64 {
    inverse_normal_cdf(critical_ratio(shortage_cost, holding_cost)).max(0.0)
}

/// Nominal cycle service level (percent) protected by safety factor `z`
/// under normally distributed forecast errors.
pub fn service_level_for(z: f64) -> f64 {
    normal_cdf(z) * 100.0
}

// =========================================================================
// Nelder-Mead
// =========================================================================

/// Result of a simplex search.
#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    pub params: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
}

/// Tuning knobs for [`nelder_mead`].
#[derive(Debug, Clone)]
pub struct SimplexOptions {
    pub max_iter: usize,
    pub ftol: f64,
    /// Initial displacement of each vertex along its own axis.
    pub step: f64,
}

impl Default for SimplexOptions {
    fn default() -> Self {
        Self {
            max_iter: 400,
            ftol: 1e-10,
            step: 0.1,
        }
    }
}

#[derive(Clone)]
struct Vertex {
    x: Vec<f64>,
    f: f64,
}

fn clamp_into(x: &mut [f64], bounds: &[(f64, f64)]) {
    for (xi, &(lo, hi)) in x.iter_mut().zip(bounds) {
        *xi = if xi.is_nan() { 0.5 * (lo + hi) } else { xi.clamp(lo, hi) };
    }
}

/// Minimises `objective` inside the box `bounds` starting from `x0`.
///
/// Non-finite objective values are treated as +inf so the simplex walks
/// away from them.
///
/// # Errors
/// `Numeric` when no finite objective value was ever found.
pub fn nelder_mead<F>(
    objective: F,
    x0: &[f64],
    bounds: &[(f64, f64)],
    options: &SimplexOptions,
) -> Result<Minimum>
where
    F: Fn(&[f64]) -> f64,
{
    let dims = x0.len();
    if dims == 0 || bounds.len() != dims {
        return Err(Error::config(
            "simplex search needs one bound per parameter",
        ));
    }

    let eval = |x: &[f64]| {
        let f = objective(x);
        if f.is_finite() {
            f
        } else {
            f64::INFINITY
        }
    };

    const REFLECT: f64 = 1.0;
    const EXPAND: f64 = 2.0;
    const CONTRACT: f64 = 0.5;
    const SHRINK: f64 = 0.5;

    let mut start = x0.to_vec();
    clamp_into(&mut start, bounds);
    let mut simplex = Vec::with_capacity(dims + 1);
    simplex.push(Vertex {
        f: eval(&start),
        x: start.clone(),
    });
    for i in 0..dims {
        let mut x = start.clone();
        let (lo, hi) = bounds[i];
        // Step inwards if the start sits on the upper bound.
        x[i] = if x[i] + options.step <= hi {
            x[i] + options.step
        } else {
            (x[i] - options.step).max(lo)
        };
        simplex.push(Vertex { f: eval(&x), x });
    }

    let mut iterations = 0;
    while iterations < options.max_iter {
        iterations += 1;
        simplex.sort_by(|a, b| a.f.total_cmp(&b.f));

        let best_f = simplex[0].f;
        let worst_f = simplex[dims].f;
        if best_f.is_finite() && (worst_f - best_f).abs() < options.ftol {
            break;
        }

        let mut centroid = vec![0.0; dims];
        for v in simplex.iter().take(dims) {
            for (c, xi) in centroid.iter_mut().zip(&v.x) {
                *c += xi / dims as f64;
            }
        }
        let worst = simplex[dims].x.clone();

        let along = |coef: f64, from: &[f64]| {
            let mut x: Vec<f64> = centroid
                .iter()
                .zip(from)
                .map(|(c, w)| c + coef * (w - c))
                .collect();
            clamp_into(&mut x, bounds);
            x
        };

        let xr = along(-REFLECT, &worst);
        let fr = eval(&xr);

        if fr < simplex[0].f {
            let xe = along(-EXPAND, &worst);
            let fe = eval(&xe);
            simplex[dims] = if fe < fr {
                Vertex { x: xe, f: fe }
            } else {
                Vertex { x: xr, f: fr }
            };
            continue;
        }

        if fr < simplex[dims - 1].f {
            simplex[dims] = Vertex { x: xr, f: fr };
            continue;
        }

        let xc = if fr < simplex[dims].f {
            along(CONTRACT, &xr)
        } else {
            along(CONTRACT, &worst)
        };
        let fc = eval(&xc);
        if fc < simplex[dims].f.min(fr) {
            simplex[dims] = Vertex { x: xc, f: fc };
            continue;
        }

        let best = simplex[0].x.clone();
        for vertex in simplex.iter_mut().skip(1) {
            for (xj, bj) in vertex.x.iter_mut().zip(&best) {
                *xj = bj + SHRINK * (*xj - bj);
            }
            clamp_into(&mut vertex.x, bounds);
            vertex.f = eval(&vertex.x);
        }
    }

    simplex.sort_by(|a, b| a.f.total_cmp(&b.f));
    let best = simplex.swap_remove(0);
    if !best.f.is_finite() {
        return Err(Error::numeric(format!(
            "simplex search found no finite objective after {iterations} iterations"
        )));
    }
    Ok(Minimum {
        params: best.x,
        value: best.f,
        iterations,
    })
}
