//! Smallest enclosing circle of a body, found by a downhill simplex search.
//!
//! The objective for a candidate center `p` is
//! `(max_v |p - v| + chord_error)^2` over every vertex `v` (including the
//! synthesized mid-points on curved edges). Adding the worst chord error
//! makes the resulting radius bound the true curved boundary and not only
//! its vertices.

use crate::error::ConvergenceError;
use crate::math::vec2::Vec2;

/// Relative tolerance on the objective spread across the simplex.
pub const CENTROID_TOLERANCE: f64 = 1e-6;
/// Iterations allowed across all restarts.
pub const MAX_ITERATIONS: usize = 10_000;
/// Extra radius so round-off never makes the bound too tight.
const RADIUS_SLACK: f64 = 1e-9;

const REFLECT: f64 = 1.0;
const EXPAND: f64 = 2.0;
const CONTRACT: f64 = 0.5;
const SHRINK: f64 = 0.5;
const RESTARTS: usize = 3;

/// Finds the center and radius of the smallest circle enclosing `points`
/// widened by `chord_error`, starting the search at `start`.
pub fn enclosing_circle(points: &[Vec2], chord_error: f64, start: Vec2) -> Result<(Vec2, f64), ConvergenceError> {
    if points.is_empty() {
        return Ok((start, chord_error + RADIUS_SLACK));
    }
    let objective = |p: Vec2| {
        let far = points.iter().fold(0.0_f64, |m, v| m.max(p.distance_squared(*v)));
        let r = far.sqrt() + chord_error;
        r * r
    };

    let extent = points.iter().fold(0.0_f64, |m, v| m.max(v.distance(start)));
    let scale = (extent * 0.1).max(1e-6);

    let (center, value) = minimize(objective, start, scale, CENTROID_TOLERANCE, MAX_ITERATIONS)?;
    Ok((center, value.sqrt() + RADIUS_SLACK))
}

/// Downhill simplex (Nelder-Mead) minimization of a function of a point.
///
/// The first simplex is `start` plus two points offset by `scale` along
/// the axes. After convergence the search restarts from the best point
/// with a smaller simplex, which guards against the collapse the method
/// is prone to on non-smooth objectives.
pub fn minimize(
    f: impl Fn(Vec2) -> f64,
    start: Vec2,
    scale: f64,
    tolerance: f64,
    max_iterations: usize,
) -> Result<(Vec2, f64), ConvergenceError> {
    let mut iterations = 0;
    let mut best = (start, f(start));
    let mut step = scale;

    for restart in 0..=RESTARTS {
        let mut simplex = [
            (best.0, best.1),
            (best.0 + Vec2::new(step, 0.0), 0.0),
            (best.0 + Vec2::new(0.0, step), 0.0),
        ];
        simplex[1].1 = f(simplex[1].0);
        simplex[2].1 = f(simplex[2].0);

        loop {
            simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
            let (lo, hi) = (simplex[0].1, simplex[2].1);
            if !lo.is_finite() {
                return Err(ConvergenceError { iterations, value: lo });
            }
            if 2.0 * (hi - lo).abs() <= tolerance * (hi.abs() + lo.abs()) + 1e-300 {
                break;
            }
            if iterations >= max_iterations {
                return Err(ConvergenceError { iterations, value: lo });
            }
            iterations += 1;

            let centroid = (simplex[0].0 + simplex[1].0) / 2.0;
            let worst = simplex[2];
            let reflected = centroid + (centroid - worst.0) * REFLECT;
            let f_reflected = f(reflected);

            if f_reflected < simplex[0].1 {
                let expanded = centroid + (reflected - centroid) * EXPAND;
                let f_expanded = f(expanded);
                simplex[2] = if f_expanded < f_reflected {
                    (expanded, f_expanded)
                } else {
                    (reflected, f_reflected)
                };
            } else if f_reflected < simplex[1].1 {
                simplex[2] = (reflected, f_reflected);
            } else {
                let toward = if f_reflected < worst.1 { reflected } else { worst.0 };
                let contracted = centroid + (toward - centroid) * CONTRACT;
                let f_contracted = f(contracted);
                if f_contracted < worst.1.min(f_reflected) {
                    simplex[2] = (contracted, f_contracted);
                } else {
                    let anchor = simplex[0].0;
                    for vertex in simplex.iter_mut().skip(1) {
                        vertex.0 = anchor + (vertex.0 - anchor) * SHRINK;
                        vertex.1 = f(vertex.0);
                    }
                }
            }
        }

        let improved = simplex[0].1 < best.1;
        let gain = best.1 - simplex[0].1;
        if improved {
            best = simplex[0];
        }
        let settled = gain <= tolerance * best.1.abs();
        tracing::trace!(restart, iterations, value = best.1, "simplex search pass finished");
        if restart > 0 && settled {
            break;
        }
        step = (step * 1e-2).max(tolerance * scale);
    }

    Ok(best)
}
