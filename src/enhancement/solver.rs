//! Expected hitting times of the enhancement chain.
//!
//! States are the item's current level. From level `i` an attempt succeeds
//! with `p(i+1)` and moves to `i+1`; on failure it lands on
//! [`ProtectionPolicy::landing`]. Unprotected failures all return to +0, so
//! the system couples every state to state 0 and is solved as a whole:
//!
//! ```text
//! E[i] = 1 + p E[i+1] + (1-p) E[landing(i)]          E[target] = 0
//! U[i] = p U[i+1] + (1-p) (U[landing(i)] + [protected]) U[target] = 0
//! ```

use super::error::{EnhanceError, Result};
use super::types::{check_level, check_target, EnhancementLevel, ProtectionPolicy, SuccessProfile};
use serde::{Deserialize, Serialize};

/// Raw expectations for one (start, target, policy) triple.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Expectation {
    pub attempts: f64,
    pub protection_uses: f64,
}

/// Expected attempts and protection uses to take a +0 item to `target`.
pub fn solve(
    profile: &SuccessProfile,
    policy: &ProtectionPolicy,
    target: EnhancementLevel,
) -> Result<Expectation> {
    solve_range(profile, policy, 0, target)
}

/// Expected attempts and protection uses to take a `start` item to `target`.
///
/// Only levels the chain can actually visit need a usable success rate: a
/// zero rate below the lowest reachable level does not make the target
/// unreachable.
pub fn solve_range(
    profile: &SuccessProfile,
    policy: &ProtectionPolicy,
    start: EnhancementLevel,
    target: EnhancementLevel,
) -> Result<Expectation> {
    check_target(target)?;
    check_level(start)?;
    if start > target {
        return Err(EnhanceError::invalid(format!(
            "start level +{} is above target +{}",
            start, target
        )));
    }
    if start == target {
        return Ok(Expectation::default());
    }

    let floor = lowest_visited(policy, start, target);
    let size = (target - floor) as usize;

    // One row per transient state floor..target.
    let mut matrix = vec![vec![0.0; size]; size];
    let mut rhs = vec![[0.0; 2]; size];
    for level in floor..target {
        let row = (level - floor) as usize;
        let p = profile.usable_rate(level + 1)?;
        let q = 1.0 - p;

        matrix[row][row] += 1.0;
        if level + 1 < target {
            matrix[row][row + 1] -= p;
        }
        let landing = policy.landing(level);
        matrix[row][(landing - floor) as usize] -= q;

        rhs[row][0] = 1.0;
        if policy.protects(level + 1) {
            rhs[row][1] = q;
        }
    }

    let solution = gaussian_solve(matrix, rhs).ok_or_else(|| weakest_link(profile, floor, target))?;
    let [attempts, protection_uses] = solution[(start - floor) as usize];
    if !attempts.is_finite() || !protection_uses.is_finite() {
        return Err(weakest_link(profile, floor, target));
    }

    tracing::debug!(
        start,
        target,
        threshold = policy.threshold,
        attempts,
        protection_uses,
        "solved enhancement chain"
    );
    Ok(Expectation {
        attempts: attempts.max(0.0),
        protection_uses: protection_uses.max(0.0),
    })
}

/// Lowest level the chain can fall to when starting at `start`.
fn lowest_visited(
    policy: &ProtectionPolicy,
    start: EnhancementLevel,
    target: EnhancementLevel,
) -> EnhancementLevel {
    let mut floor = start;
    loop {
        let lowest = (floor..target).map(|l| policy.landing(l)).min().unwrap_or(floor);
        if lowest >= floor {
            return floor;
        }
        floor = lowest;
    }
}

/// The level with the smallest rate, reported when the system blows up.
fn weakest_link(
    profile: &SuccessProfile,
    floor: EnhancementLevel,
    target: EnhancementLevel,
) -> EnhanceError {
    let (level, probability) = (floor + 1..=target)
        .filter_map(|l| profile.rate(l).ok().map(|p| (l, p)))
        .fold((target, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best });
    EnhanceError::Unreachable { level, probability }
}

/// Solve `A x = b` for two right-hand sides with partial pivoting.
/// Returns None if the matrix is singular.
fn gaussian_solve(mut a: Vec<Vec<f64>>, mut b: Vec<[f64; 2]>) -> Option<Vec<[f64; 2]>> {
    let n = a.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&x, &y| a[x][col].abs().total_cmp(&a[y][col].abs()))?;
        if a[pivot][col].abs() < f64::MIN_POSITIVE {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            for j in 0..2 {
                b[row][j] -= factor * b[col][j];
            }
        }
    }

    let mut x = vec![[0.0; 2]; n];
    for row in (0..n).rev() {
        for j in 0..2 {
            let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k][j]).sum();
            x[row][j] = (b[row][j] - tail) / a[row][row];
        }
    }
    Some(x)
}
