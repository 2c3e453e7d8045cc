// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

//! A fast marching eikonal solver with upwind gradient extraction.
//!
//! This library computes first-arrival times on N-dimensional Cartesian grids
//! by solving the eikonal equation |∇T| = s, where T is the arrival time and
//! s = normalization / speed is the slowness field. Nodes are frozen in order
//! of increasing arrival time from a binary-heap narrow band, and an optional
//! observer builds the upwind gradient of T as the front passes.
//!
//! ```
//! use eikonal_fmm::{solve, CartesianGrid, SolveOptions};
//!
//! let grid = CartesianGrid::<2>::uniform([5, 5], [1.0, 1.0], 1.0).unwrap();
//! let options = SolveOptions {
//!     seeds: vec![([2, 2], 0.0)],
//!     compute_gradient: true,
//!     ..SolveOptions::default()
//! };
//! let solution = solve(grid, &options).unwrap();
//! assert_eq!(solution.arrival_time.get([2, 4]), 2.0);
//! ```

#![warn(missing_docs)]

/// Core grid data structures and traits.
pub mod core;
/// Error types for the library.
pub mod error;
/// Upwind gradient observer filled in as the front freezes.
pub mod gradient;
/// File I/O for loading speed fields and saving arrival times and gradients.
pub mod io;
/// Fast marching solver and its observer hooks.
pub mod marching;
/// Upwind update stencil shared by the solver and its tests.
pub mod update_kernels;

pub use crate::core::{CartesianGrid, GridData, Image, Side};
pub use crate::error::{EikonalError, Result};
pub use crate::gradient::UpwindGradient;
pub use crate::marching::{
    solve, solve_with_progress, FastMarching, FreezeObserver, FreezeRecorder, Front, NodeLabel,
    ProgressInfo, SolveOptions, SolveReport, Solution, SolverState, StepOutcome, StopReason,
    TargetCondition,
};
pub use crate::update_kernels::UNREACHED;
