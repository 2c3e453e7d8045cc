// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use crate::core::{GridData, Image, Side};
use crate::marching::{FreezeObserver, Front};

/// Upwind gradient of a node that has just been frozen with `value`.
///
/// Only frozen neighbors no later than `value` count: a seed placed with a
/// higher initial value is downwind even though it is frozen. Per axis, such
/// a backward neighbor gives `(value - T[i-1]) / h` and a forward neighbor
/// gives `(T[i+1] - value) / h`. With both usable the side with the lower
/// arrival time wins, and the forward side on an exact tie. With neither the
/// component is zero.
pub fn upwind_gradient<const N: usize>(front: &Front<'_, N>, idx: [usize; N], value: f64) -> [f64; N] {
    let grid = front.grid();
    let spacing = grid.spacing();
    let mut gradient = [0.0; N];
    let upwind = |n: [usize; N]| front.frozen_value(n).filter(|&v| v <= value);

    for (axis, component) in gradient.iter_mut().enumerate() {
        let backward = grid.neighbor(idx, axis, Side::Backward).and_then(&upwind);
        let forward = grid.neighbor(idx, axis, Side::Forward).and_then(&upwind);

        let diff = match (backward, forward) {
            (Some(b), Some(f)) if b < f => value - b,
            (_, Some(f)) => f - value,
            (Some(b), None) => value - b,
            (None, None) => 0.0,
        };
        *component = diff / spacing[axis];
    }

    gradient
}

/// Freeze observer that stores the upwind gradient of every frozen node.
///
/// The gradient is taken when a node freezes, from one-sided differences
/// against neighbors the front has already passed, and is never revised.
/// Physically it is the slowness vector of the front.
#[derive(Debug, Clone)]
pub struct UpwindGradient<const N: usize> {
    image: Image<N, [f64; N]>,
}

impl<const N: usize> UpwindGradient<N> {
    /// A zeroed gradient image with the geometry of `grid`.
    pub fn new<G: GridData<N>>(grid: &G) -> Self {
        UpwindGradient {
            image: Image::from_grid(grid, [0.0; N]),
        }
    }

    /// Gradient stored at `idx`; zero if the node has not been frozen.
    pub fn gradient(&self, idx: [usize; N]) -> [f64; N] {
        self.image.get(idx)
    }

    /// The gradient image.
    pub fn image(&self) -> &Image<N, [f64; N]> {
        &self.image
    }

    /// Consume the observer and return the gradient image.
    pub fn into_image(self) -> Image<N, [f64; N]> {
        self.image
    }
}

impl<const N: usize> FreezeObserver<N> for UpwindGradient<N> {
    fn on_freeze(&mut self, front: &Front<'_, N>, idx: [usize; N], value: f64) {
        self.image.set(idx, upwind_gradient(front, idx, value));
    }
}
