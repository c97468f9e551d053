//! Projected-gradient minimizer over the probability simplex.
//!
//! Minimizes a smooth objective subject to `w >= 0` and `sum(w) == 1`, with an
//! optional linear equality `a . w == b` handled by an augmented Lagrangian.
//! Gradients are central finite differences. Step sizes come from Armijo
//! backtracking along the projection arc.

use std::cmp::Ordering;

/// Armijo sufficient-decrease constant.
const ARMIJO_C: f64 = 1e-4;
/// Central-difference step for numerical gradients.
const GRADIENT_STEP: f64 = 1e-6;
const MIN_STEP: f64 = 1e-16;
const MAX_STEP: f64 = 1e6;
/// Maximum augmented-Lagrangian rounds for an equality constraint.
const MAX_OUTER_ROUNDS: usize = 30;
/// Allowed violation of the equality constraint.
const FEASIBILITY_TOL: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Iteration cap for each inner descent.
    pub max_iterations: usize,
    /// Relative objective change treated as converged.
    pub tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            max_iterations: 500,
            tolerance: 1e-9,
        }
    }
}

/// Linear equality `coefficients . w == target`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearEquality {
    pub coefficients: Vec<f64>,
    pub target: f64,
}

impl LinearEquality {
    fn residual(&self, w: &[f64]) -> f64 {
        dot(&self.coefficients, w) - self.target
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub weights: Vec<f64>,
    pub objective: f64,
    pub iterations: usize,
}

/// Euclidean projection onto `{w : w >= 0, sum(w) == 1}` (sort-based).
pub fn project_to_simplex(v: &[f64]) -> Vec<f64> {
    if v.is_empty() {
        return Vec::new();
    }
    let mut sorted = v.to_vec();
    sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));

    let mut cumulative = 0.0;
    let mut theta = 0.0;
    for (i, u) in sorted.iter().enumerate() {
        cumulative += u;
        let candidate = (cumulative - 1.0) / (i + 1) as f64;
        if u - candidate > 0.0 {
            theta = candidate;
        }
    }
    v.iter().map(|x| (x - theta).max(0.0)).collect()
}

/// Minimize `objective` on the simplex, optionally subject to `equality`.
///
/// Returns a diagnostic message when the iteration cap is reached, the
/// objective is not finite at the start, or the equality cannot be met.
pub fn minimize<F>(
    objective: F,
    start: &[f64],
    equality: Option<&LinearEquality>,
    config: &SolverConfig,
) -> Result<Solution, String>
where
    F: Fn(&[f64]) -> f64,
{
    if start.is_empty() {
        return Err("no variables to optimize".into());
    }

    let Some(eq) = equality else {
        return descend(&objective, &project_to_simplex(start), config);
    };

    let lo = eq.coefficients.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = eq.coefficients.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if eq.target < lo - FEASIBILITY_TOL || eq.target > hi + FEASIBILITY_TOL {
        return Err(format!(
            "target {:.6} outside attainable range [{lo:.6}, {hi:.6}]",
            eq.target
        ));
    }

    let mut lambda = 0.0;
    let mut rho = 10.0;
    let mut x = project_to_simplex(start);
    let mut iterations = 0;
    let mut last_violation = f64::INFINITY;

    for _ in 0..MAX_OUTER_ROUNDS {
        let penalized = |w: &[f64]| {
            let c = eq.residual(w);
            objective(w) + lambda * c + 0.5 * rho * c * c
        };
        let inner = descend(&penalized, &x, config)?;
        iterations += inner.iterations;
        x = inner.weights;

        let violation = eq.residual(&x);
        if violation.abs() <= FEASIBILITY_TOL {
            return Ok(Solution {
                objective: objective(&x),
                weights: x,
                iterations,
            });
        }
        lambda += rho * violation;
        if violation.abs() > 0.25 * last_violation {
            rho *= 10.0;
        }
        last_violation = violation.abs();
    }

    Err(format!(
        "equality constraint not satisfied (residual {last_violation:.3e})"
    ))
}

fn descend<F>(objective: &F, start: &[f64], config: &SolverConfig) -> Result<Solution, String>
where
    F: Fn(&[f64]) -> f64,
{
    let mut x = start.to_vec();
    let mut fx = objective(&x);
    if !fx.is_finite() {
        return Err("objective is not finite at the starting point".into());
    }
    let mut step = 1.0;

    for iteration in 1..=config.max_iterations {
        let g = numerical_gradient(objective, &x);

        // backtrack until the projected step gives sufficient decrease
        let mut accepted = None;
        while step >= MIN_STEP {
            let trial: Vec<f64> = x.iter().zip(&g).map(|(xi, gi)| xi - step * gi).collect();
            let candidate = project_to_simplex(&trial);
            let moved: Vec<f64> = candidate.iter().zip(&x).map(|(c, xi)| c - xi).collect();
            let f_candidate = objective(&candidate);
            if f_candidate.is_finite() && f_candidate <= fx + ARMIJO_C * dot(&g, &moved) {
                accepted = Some((candidate, f_candidate, moved));
                break;
            }
            step *= 0.5;
        }

        let Some((candidate, f_candidate, moved)) = accepted else {
            // no descent direction left at machine precision
            return Ok(Solution {
                weights: x,
                objective: fx,
                iterations: iteration,
            });
        };

        let delta_f = (fx - f_candidate).abs();
        let delta_x = moved.iter().fold(0.0_f64, |m, d| m.max(d.abs()));
        x = candidate;
        fx = f_candidate;

        if delta_x <= config.tolerance || delta_f <= config.tolerance * (1.0 + fx.abs()) {
            return Ok(Solution {
                weights: x,
                objective: fx,
                iterations: iteration,
            });
        }
        step = (step * 2.0).min(MAX_STEP);
    }

    Err(format!(
        "iteration limit ({}) reached before convergence",
        config.max_iterations
    ))
}

fn numerical_gradient<F>(objective: &F, x: &[f64]) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let mut probe = x.to_vec();
    (0..x.len())
        .map(|i| {
            let original = probe[i];
            probe[i] = original + GRADIENT_STEP;
            let up = objective(&probe);
            probe[i] = original - GRADIENT_STEP;
            let down = objective(&probe);
            probe[i] = original;
            (up - down) / (2.0 * GRADIENT_STEP)
        })
        .collect()
}

pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
