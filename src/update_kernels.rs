// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use crate::core::{GridData, Side};

/// Arrival time of a node the front has not reached.
pub const UNREACHED: f64 = f64::INFINITY;

/// One upwind term of the stencil: a frozen neighbor value and the grid
/// spacing along the axis it lies on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisContribution {
    /// Arrival time of the upwind neighbor.
    pub value: f64,
    /// Spacing along the neighbor's axis.
    pub spacing: f64,
}

impl Default for AxisContribution {
    fn default() -> Self {
        AxisContribution {
            value: UNREACHED,
            spacing: 1.0,
        }
    }
}

/// Solve the Godunov upwind discretization for a single node.
///
/// Solves `sum_a ((u - v_a) / h_a)^2 = s^2` over the given axis terms, adding
/// axes in ascending order of neighbor value for as long as the current
/// solution exceeds the next neighbor value, and returns the upwind (larger)
/// root. Falls back to the best single-axis update `min_a(v_a + h_a * s)` if
/// the discriminant goes negative.
///
/// Sorts `terms` in place. Returns [`UNREACHED`] when there are no finite terms.
pub fn solve_quadratic(terms: &mut [AxisContribution], slowness: f64) -> f64 {
    terms.sort_by(|x, y| x.value.total_cmp(&y.value));

    let mut aa = 0.0;
    let mut bb = 0.0;
    let mut cc = -slowness * slowness;
    let mut solution = UNREACHED;

    for term in terms.iter() {
        if !term.value.is_finite() || solution <= term.value {
            break;
        }
        let w = 1.0 / (term.spacing * term.spacing);
        aa += w;
        bb += term.value * w;
        cc += term.value * term.value * w;

        let disc = bb * bb - aa * cc;
        if disc < 0.0 {
            tracing::trace!(disc, "negative stencil discriminant, using single-axis update");
            return single_axis_update(terms, slowness);
        }
        solution = (bb + disc.sqrt()) / aa;
    }

    solution
}

fn single_axis_update(terms: &[AxisContribution], slowness: f64) -> f64 {
    terms
        .iter()
        .filter(|t| t.value.is_finite())
        .map(|t| t.value + t.spacing * slowness)
        .fold(UNREACHED, f64::min)
}

/// Pick the upwind term along every axis of `idx`.
///
/// `frozen_value` returns the arrival time of a neighbor only if it is frozen.
/// Along each axis the frozen neighbor with the smaller arrival time is used;
/// on equal values the backward neighbor is kept. Axes with no frozen
/// neighbor are left at [`UNREACHED`]. Returns the terms and how many are finite.
pub fn upwind_terms<const N: usize, G, F>(
    grid: &G,
    idx: [usize; N],
    frozen_value: F,
) -> ([AxisContribution; N], usize)
where
    G: GridData<N>,
    F: Fn([usize; N]) -> Option<f64>,
{
    let spacing = grid.spacing();
    let mut terms = [AxisContribution::default(); N];
    let mut count = 0;

    for (axis, term) in terms.iter_mut().enumerate() {
        let lo = grid
            .neighbor(idx, axis, Side::Backward)
            .and_then(&frozen_value);
        let hi = grid
            .neighbor(idx, axis, Side::Forward)
            .and_then(&frozen_value);
        let best = match (lo, hi) {
            (Some(a), Some(b)) => Some(if a <= b { a } else { b }),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        };
        if let Some(value) = best {
            *term = AxisContribution {
                value,
                spacing: spacing[axis],
            };
            count += 1;
        }
    }

    (terms, count)
}

/// Compute the candidate arrival time of a single node from its frozen neighbors.
///
/// Reads the 2·N neighbors, picks the upwind one per axis, and calls
/// `solve_quadratic` with the node's slowness. Returns [`UNREACHED`] if no
/// neighbor is frozen.
pub fn update_node<const N: usize, G, F>(
    grid: &G,
    idx: [usize; N],
    slowness: f64,
    frozen_value: F,
) -> f64
where
    G: GridData<N>,
    F: Fn([usize; N]) -> Option<f64>,
{
    let (mut terms, count) = upwind_terms(grid, idx, frozen_value);
    if count == 0 {
        return UNREACHED;
    }
    solve_quadratic(&mut terms, slowness)
}
