//! Time-scale inference.
//!
//! Grid search for the scalar factor that best aligns an observed
//! (possibly partial) trajectory against a reference mean trajectory. The
//! cost surface is smooth but not guaranteed unimodal, so a dense grid is
//! searched and the first arg-min encountered wins.

use tracing::debug;

use crate::config::SpeedSearch;
use crate::error::{PrompError, Result};
use crate::trajectory::Trajectory;

/// Find the time-scale factor `alpha` within the search bounds that
/// minimizes the sum of squared differences between `observed` and the
/// reference resampled to `round(ref_len / alpha)` timesteps, compared over
/// the observed prefix.
///
/// Candidates whose warped reference is shorter than the observed prefix
/// are skipped. Ties resolve to the first arg-min encountered.
///
/// # Errors
///
/// Returns an error if the search bounds are invalid, the DOF counts
/// disagree, or the observed prefix is too long to fit under any candidate.
pub fn infer_speed(
    observed: &Trajectory,
    reference: &Trajectory,
    search: &SpeedSearch,
) -> Result<f64> {
    search.validate()?;
    if observed.dof_count() != reference.dof_count() {
        return Err(PrompError::dof_mismatch(
            reference.dof_count(),
            observed.dof_count(),
        ));
    }

    let obs_len = observed.timesteps();
    let ref_len = reference.timesteps();
    let longest_warp = (ref_len as f64 / search.alpha_min).round() as usize;
    if obs_len > longest_warp {
        return Err(PrompError::trajectory_too_short(obs_len, longest_warp));
    }

    let step = (search.alpha_max - search.alpha_min) / (search.candidates - 1) as f64;
    let mut best_alpha = search.alpha_min;
    let mut best_cost = f64::INFINITY;
    for i in 0..search.candidates {
        let alpha = search.alpha_min + i as f64 * step;
        let warp_len = (ref_len as f64 / alpha).round() as usize;
        if warp_len < obs_len || warp_len < 2 {
            continue;
        }
        let warped = reference.modulate(warp_len)?;
        let cost = prefix_cost(observed, &warped, obs_len);
        if cost < best_cost {
            best_cost = cost;
            best_alpha = alpha;
        }
    }

    debug!(alpha = best_alpha, cost = best_cost, "inferred speed factor");
    Ok(best_alpha)
}

/// Sum of squared differences over the leading `steps` timesteps.
fn prefix_cost(observed: &Trajectory, warped: &Trajectory, steps: usize) -> f64 {
    let a = observed.matrix();
    let b = warped.matrix();
    let mut cost = 0.0;
    for t in 0..steps {
        for d in 0..observed.dof_count() {
            let diff = a[(t, d)] - b[(t, d)];
            cost += diff * diff;
        }
    }
    cost
}
