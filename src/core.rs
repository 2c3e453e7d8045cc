// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{EikonalError, Result};

/// Direction of an axis-aligned neighbor relative to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// The neighbor at `index[axis] - 1`.
    Backward,
    /// The neighbor at `index[axis] + 1`.
    Forward,
}

/// Core grid data access. Provides speed field access, grid geometry,
/// and index conversion utilities.
pub trait GridData<const N: usize> {
    /// Get the speed value at the given N-dimensional index.
    fn speed(&self, idx: [usize; N]) -> f64;

    /// Get the grid shape (number of nodes along each axis).
    fn shape(&self) -> [usize; N];

    /// Get the row-major strides for index computation.
    fn strides(&self) -> [usize; N];

    /// Get the grid spacing along each axis.
    fn spacing(&self) -> [f64; N];

    /// Get the physical coordinate of index zero.
    fn origin(&self) -> [f64; N];

    /// Get the total number of nodes in the grid.
    fn num_nodes(&self) -> usize;

    /// Convert a flat index to an N-dimensional index.
    fn flat_to_nd(&self, flat: usize) -> [usize; N];

    /// Convert an N-dimensional index to a flat index.
    fn nd_to_flat(&self, idx: [usize; N]) -> usize;

    /// Whether the index lies inside the grid.
    fn contains(&self, idx: [usize; N]) -> bool {
        idx.iter().zip(self.shape().iter()).all(|(&i, &n)| i < n)
    }

    /// Physical coordinate of a grid index.
    fn index_to_physical(&self, idx: [usize; N]) -> [f64; N] {
        let origin = self.origin();
        let spacing = self.spacing();
        let mut point = [0.0; N];
        for d in 0..N {
            point[d] = origin[d] + idx[d] as f64 * spacing[d];
        }
        point
    }

    /// Nearest grid index to a physical coordinate, or `None` if the point
    /// is more than half a cell outside the grid.
    fn physical_to_index(&self, point: [f64; N]) -> Option<[usize; N]> {
        let origin = self.origin();
        let spacing = self.spacing();
        let shape = self.shape();
        let mut idx = [0usize; N];
        for d in 0..N {
            let rel = ((point[d] - origin[d]) / spacing[d]).round();
            if !rel.is_finite() || rel < 0.0 || rel > (shape[d] - 1) as f64 {
                return None;
            }
            idx[d] = rel as usize;
        }
        Some(idx)
    }

    /// The neighbor of `idx` along `axis` on the given side, if inside the grid.
    fn neighbor(&self, idx: [usize; N], axis: usize, side: Side) -> Option<[usize; N]> {
        neighbor_in(self.shape(), idx, axis, side)
    }

    /// All axis-aligned neighbors of `idx`: 2·N in the interior, fewer at boundaries.
    fn neighbors(&self, idx: [usize; N]) -> Neighbors<N> {
        Neighbors {
            shape: self.shape(),
            idx,
            next: 0,
        }
    }
}

fn neighbor_in<const N: usize>(
    shape: [usize; N],
    idx: [usize; N],
    axis: usize,
    side: Side,
) -> Option<[usize; N]> {
    let mut n = idx;
    match side {
        Side::Backward => {
            if idx[axis] == 0 {
                return None;
            }
            n[axis] -= 1;
        }
        Side::Forward => {
            if idx[axis] + 1 >= shape[axis] {
                return None;
            }
            n[axis] += 1;
        }
    }
    Some(n)
}

/// Iterator over the axis-aligned neighbors of a node.
///
/// Yields `(axis, side, index)` in axis order, backward before forward.
pub struct Neighbors<const N: usize> {
    shape: [usize; N],
    idx: [usize; N],
    next: usize,
}

impl<const N: usize> Iterator for Neighbors<N> {
    type Item = (usize, Side, [usize; N]);

    fn next(&mut self) -> Option<Self::Item> {
        while self.next < 2 * N {
            let axis = self.next / 2;
            let side = if self.next % 2 == 0 {
                Side::Backward
            } else {
                Side::Forward
            };
            self.next += 1;
            if let Some(n) = neighbor_in(self.shape, self.idx, axis, side) {
                return Some((axis, side, n));
            }
        }
        None
    }
}

fn row_major_strides<const N: usize>(shape: [usize; N]) -> [usize; N] {
    let mut strides = [0usize; N];
    strides[N - 1] = 1;
    for d in (0..N - 1).rev() {
        strides[d] = strides[d + 1] * shape[d + 1];
    }
    strides
}

#[allow(clippy::needless_range_loop)]
fn flat_to_nd_with<const N: usize>(strides: [usize; N], flat: usize) -> [usize; N] {
    let mut idx = [0usize; N];
    let mut remainder = flat;
    for d in 0..N {
        idx[d] = remainder / strides[d];
        remainder %= strides[d];
    }
    idx
}

fn nd_to_flat_with<const N: usize>(strides: [usize; N], idx: [usize; N]) -> usize {
    let mut flat = 0;
    for d in 0..N {
        flat += idx[d] * strides[d];
    }
    flat
}

/// A Cartesian grid carrying the speed field of an eikonal problem.
///
/// Stores the grid shape, per-axis spacing, origin, and speed values in
/// row-major order. A speed of zero marks an impassable node.
/// The generic parameter `N` is the number of spatial dimensions.
#[derive(Debug, Clone)]
pub struct CartesianGrid<const N: usize> {
    shape: [usize; N],
    strides: [usize; N],
    spacing: [f64; N],
    origin: [f64; N],
    speed: Box<[f64]>,
}

impl<const N: usize> CartesianGrid<N> {
    /// Create a new Cartesian grid with the given shape, spacing, and speed field.
    ///
    /// # Parameters
    /// - `shape`: Number of nodes along each axis (each must be >= 1)
    /// - `spacing`: Grid spacing along each axis (must be positive and finite)
    /// - `speed`: Speed values in row-major order (must be finite and >= 0)
    ///
    /// # Errors
    /// Returns an error if any parameter is invalid or if the speed vector length
    /// does not match the product of the shape dimensions.
    pub fn new(shape: [usize; N], spacing: [f64; N], speed: Vec<f64>) -> Result<Self> {
        assert!(N >= 1, "CartesianGrid needs at least one dimension");

        for (axis, &h) in spacing.iter().enumerate() {
            if !h.is_finite() || h <= 0.0 {
                return Err(EikonalError::InvalidSpacing { axis, spacing: h });
            }
        }

        for (axis, &size) in shape.iter().enumerate() {
            if size == 0 {
                return Err(EikonalError::InvalidGridShape { axis, size });
            }
        }

        let num_nodes: usize = shape.iter().product();
        if speed.len() != num_nodes {
            return Err(EikonalError::ShapeMismatch {
                expected: shape.to_vec(),
                got: vec![speed.len()],
            });
        }

        for (index, &value) in speed.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(EikonalError::InvalidSpeed { index, value });
            }
        }

        Ok(CartesianGrid {
            shape,
            strides: row_major_strides(shape),
            spacing,
            origin: [0.0; N],
            speed: speed.into_boxed_slice(),
        })
    }

    /// Create a grid with the same speed at every node.
    ///
    /// # Errors
    /// Same conditions as [`CartesianGrid::new`].
    pub fn uniform(shape: [usize; N], spacing: [f64; N], speed: f64) -> Result<Self> {
        let num_nodes: usize = shape.iter().product();
        Self::new(shape, spacing, vec![speed; num_nodes])
    }

    /// Set the physical coordinate of index zero (builder method).
    pub fn with_origin(mut self, origin: [f64; N]) -> Self {
        self.origin = origin;
        self
    }

    /// Get a reference to the speed field.
    pub fn speed_field(&self) -> &[f64] {
        &self.speed
    }
}

impl<const N: usize> GridData<N> for CartesianGrid<N> {
    fn speed(&self, idx: [usize; N]) -> f64 {
        self.speed[self.nd_to_flat(idx)]
    }

    fn shape(&self) -> [usize; N] {
        self.shape
    }

    fn strides(&self) -> [usize; N] {
        self.strides
    }

    fn spacing(&self) -> [f64; N] {
        self.spacing
    }

    fn origin(&self) -> [f64; N] {
        self.origin
    }

    fn num_nodes(&self) -> usize {
        self.speed.len()
    }

    fn flat_to_nd(&self, flat: usize) -> [usize; N] {
        flat_to_nd_with(self.strides, flat)
    }

    fn nd_to_flat(&self, idx: [usize; N]) -> usize {
        nd_to_flat_with(self.strides, idx)
    }
}

/// A dense N-dimensional image of `T` values in row-major order.
///
/// Carries the geometry (shape, spacing, origin) of the grid it was made
/// from, so outputs can be written to disk without the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Image<const N: usize, T> {
    shape: [usize; N],
    strides: [usize; N],
    spacing: [f64; N],
    origin: [f64; N],
    data: Vec<T>,
}

impl<const N: usize, T: Copy> Image<N, T> {
    /// An image with the geometry of `grid`, every pixel set to `fill`.
    pub fn from_grid<G: GridData<N>>(grid: &G, fill: T) -> Self {
        Image {
            shape: grid.shape(),
            strides: grid.strides(),
            spacing: grid.spacing(),
            origin: grid.origin(),
            data: vec![fill; grid.num_nodes()],
        }
    }

    /// Build an image from row-major data.
    ///
    /// # Errors
    /// Returns `ShapeMismatch` if `data` does not hold one value per node.
    pub fn from_vec(shape: [usize; N], spacing: [f64; N], data: Vec<T>) -> Result<Self> {
        let num_nodes: usize = shape.iter().product();
        if data.len() != num_nodes {
            return Err(EikonalError::ShapeMismatch {
                expected: shape.to_vec(),
                got: vec![data.len()],
            });
        }
        Ok(Image {
            shape,
            strides: row_major_strides(shape),
            spacing,
            origin: [0.0; N],
            data,
        })
    }

    pub(crate) fn from_grid_vec<G: GridData<N>>(grid: &G, data: Vec<T>) -> Self {
        debug_assert_eq!(data.len(), grid.num_nodes());
        Image {
            shape: grid.shape(),
            strides: grid.strides(),
            spacing: grid.spacing(),
            origin: grid.origin(),
            data,
        }
    }

    /// Set the physical coordinate of index zero (builder method).
    pub fn with_origin(mut self, origin: [f64; N]) -> Self {
        self.origin = origin;
        self
    }

    /// Get the pixel at an N-dimensional index.
    pub fn get(&self, idx: [usize; N]) -> T {
        self.data[nd_to_flat_with(self.strides, idx)]
    }

    /// Get the pixel at a flat index.
    pub fn get_flat(&self, flat: usize) -> T {
        self.data[flat]
    }

    /// Set the pixel at an N-dimensional index.
    pub fn set(&mut self, idx: [usize; N], value: T) {
        let flat = nd_to_flat_with(self.strides, idx);
        self.data[flat] = value;
    }

    /// Set the pixel at a flat index.
    pub fn set_flat(&mut self, flat: usize, value: T) {
        self.data[flat] = value;
    }

    /// Number of nodes along each axis.
    pub fn shape(&self) -> [usize; N] {
        self.shape
    }

    /// Grid spacing along each axis.
    pub fn spacing(&self) -> [f64; N] {
        self.spacing
    }

    /// Physical coordinate of index zero.
    pub fn origin(&self) -> [f64; N] {
        self.origin
    }

    /// Total number of pixels.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the image has no pixels.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Convert a flat index to an N-dimensional index.
    pub fn flat_to_nd(&self, flat: usize) -> [usize; N] {
        flat_to_nd_with(self.strides, flat)
    }

    /// Pixel data in row-major order.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Consume the image and return its row-major pixel data.
    pub fn into_raw_vec(self) -> Vec<T> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_nd_roundtrip_2d() {
        let grid = CartesianGrid::<2>::uniform([12, 8], [1.0, 1.0], 1.0).unwrap();
        for flat in 0..96 {
            let nd = grid.flat_to_nd(flat);
            assert_eq!(grid.nd_to_flat(nd), flat, "flat={} nd={:?}", flat, nd);
        }
    }

    #[test]
    fn strides_are_row_major() {
        let grid = CartesianGrid::<3>::uniform([4, 5, 6], [1.0; 3], 1.0).unwrap();
        assert_eq!(grid.strides(), [30, 6, 1]);
        assert_eq!(grid.nd_to_flat([1, 2, 3]), 30 + 12 + 3);
    }

    #[test]
    fn interior_node_has_two_neighbors_per_axis() {
        let grid = CartesianGrid::<3>::uniform([5, 5, 5], [1.0; 3], 1.0).unwrap();
        let n: Vec<_> = grid.neighbors([2, 2, 2]).collect();
        assert_eq!(n.len(), 6);
        assert_eq!(n[0], (0, Side::Backward, [1, 2, 2]));
        assert_eq!(n[1], (0, Side::Forward, [3, 2, 2]));
        assert_eq!(n[5], (2, Side::Forward, [2, 2, 3]));
    }

    #[test]
    fn corner_node_has_fewer_neighbors() {
        let grid = CartesianGrid::<2>::uniform([4, 4], [1.0, 1.0], 1.0).unwrap();
        let n: Vec<_> = grid.neighbors([0, 3]).collect();
        assert_eq!(
            n,
            vec![(0, Side::Forward, [1, 3]), (1, Side::Backward, [0, 2])]
        );
        assert_eq!(grid.neighbor([0, 3], 1, Side::Forward), None);
    }

    #[test]
    fn single_node_axis_has_no_neighbors_along_it() {
        let grid = CartesianGrid::<2>::uniform([1, 3], [1.0, 1.0], 1.0).unwrap();
        let n: Vec<_> = grid.neighbors([0, 1]).collect();
        assert_eq!(n.len(), 2);
        assert!(n.iter().all(|(axis, _, _)| *axis == 1));
    }

    #[test]
    fn physical_coordinates_use_origin_and_spacing() {
        let grid = CartesianGrid::<2>::uniform([10, 10], [0.5, 2.0], 1.0)
            .unwrap()
            .with_origin([1.0, -4.0]);
        assert_eq!(grid.index_to_physical([2, 3]), [2.0, 2.0]);
        assert_eq!(grid.physical_to_index([2.1, 2.4]), Some([2, 3]));
        assert_eq!(grid.physical_to_index([0.0, 0.0]), None);
        assert_eq!(grid.physical_to_index([1.0, 100.0]), None);
    }

    #[test]
    fn contains_checks_every_axis() {
        let grid = CartesianGrid::<2>::uniform([3, 4], [1.0, 1.0], 1.0).unwrap();
        assert!(grid.contains([2, 3]));
        assert!(!grid.contains([3, 0]));
        assert!(!grid.contains([0, 4]));
    }

    #[test]
    fn zero_speed_is_allowed() {
        let mut speed = vec![1.0; 16];
        speed[5] = 0.0;
        let grid = CartesianGrid::<2>::new([4, 4], [1.0, 1.0], speed).unwrap();
        assert_eq!(grid.speed([1, 1]), 0.0);
    }

    #[test]
    fn invalid_grid_shape() {
        let result = CartesianGrid::<2>::new([0, 10], [1.0, 1.0], vec![]);
        assert!(matches!(
            result,
            Err(EikonalError::InvalidGridShape { axis: 0, size: 0 })
        ));
    }

    #[test]
    fn invalid_grid_spacing() {
        let result = CartesianGrid::<2>::new([4, 4], [1.0, 0.0], vec![1.0; 16]);
        assert!(matches!(
            result,
            Err(EikonalError::InvalidSpacing { axis: 1, .. })
        ));
        let result = CartesianGrid::<2>::new([4, 4], [f64::NAN, 1.0], vec![1.0; 16]);
        assert!(matches!(
            result,
            Err(EikonalError::InvalidSpacing { axis: 0, .. })
        ));
    }

    #[test]
    fn invalid_speed_value() {
        let mut speed = vec![1.0; 16];
        speed[5] = -1.0;
        let result = CartesianGrid::<2>::new([4, 4], [1.0, 1.0], speed);
        assert!(matches!(
            result,
            Err(EikonalError::InvalidSpeed { index: 5, .. })
        ));
    }

    #[test]
    fn shape_mismatch() {
        let result = CartesianGrid::<2>::new([4, 4], [1.0, 1.0], vec![1.0; 10]);
        assert!(matches!(result, Err(EikonalError::ShapeMismatch { .. })));
    }

    #[test]
    fn image_takes_grid_geometry() {
        let grid = CartesianGrid::<2>::uniform([3, 2], [0.5, 0.25], 1.0)
            .unwrap()
            .with_origin([1.0, 2.0]);
        let mut img = Image::from_grid(&grid, 0.0_f64);
        assert_eq!(img.shape(), [3, 2]);
        assert_eq!(img.spacing(), [0.5, 0.25]);
        assert_eq!(img.origin(), [1.0, 2.0]);
        img.set([2, 1], 7.0);
        assert_eq!(img.get([2, 1]), 7.0);
        assert_eq!(img.get_flat(5), 7.0);
        assert_eq!(img.flat_to_nd(5), [2, 1]);
    }

    #[test]
    fn speed_field_is_row_major() {
        let grid = CartesianGrid::<2>::new([2, 2], [1.0, 1.0], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(grid.speed_field(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(grid.speed_field()[grid.nd_to_flat([1, 0])], grid.speed([1, 0]));
    }

    #[test]
    fn image_flat_access_and_origin() {
        let mut img = Image::from_vec([2, 3], [1.0, 1.0], vec![0u8; 6])
            .unwrap()
            .with_origin([-1.0, 0.5]);
        assert_eq!(img.origin(), [-1.0, 0.5]);
        assert_eq!(img.len(), 6);
        assert!(!img.is_empty());
        img.set_flat(4, 9);
        assert_eq!(img.get([1, 1]), 9);
        assert_eq!(img.into_raw_vec(), vec![0, 0, 0, 0, 9, 0]);
    }

    #[test]
    fn image_from_vec_checks_length() {
        let result = Image::<2, f64>::from_vec([2, 2], [1.0, 1.0], vec![0.0; 3]);
        assert!(matches!(result, Err(EikonalError::ShapeMismatch { .. })));
    }
}
