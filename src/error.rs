// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;

/// Errors that can occur during grid setup, solver initialization, or I/O.
#[derive(Debug)]
pub enum EikonalError {
    /// Grid shape is invalid (an axis has no nodes).
    InvalidGridShape {
        /// The axis index.
        axis: usize,
        /// The size provided.
        size: usize,
    },
    /// Grid spacing on an axis is not positive and finite.
    InvalidSpacing {
        /// The axis index.
        axis: usize,
        /// The spacing provided.
        spacing: f64,
    },
    /// Speed value is negative or not finite.
    InvalidSpeed {
        /// The flat index of the invalid value.
        index: usize,
        /// The invalid value.
        value: f64,
    },
    /// Slowness value is not positive and finite.
    InvalidSlowness {
        /// The flat index of the invalid value.
        index: usize,
        /// The invalid value.
        value: f64,
    },
    /// Seed or initial trial point is unusable.
    InvalidSeed {
        /// The seed index.
        index: Vec<usize>,
        /// Explanation of why it's invalid.
        reason: String,
    },
    /// Target point lies outside the grid.
    InvalidTarget {
        /// The target index.
        index: Vec<usize>,
    },
    /// Forbidden point lies outside the grid.
    InvalidForbiddenPoint {
        /// The forbidden point index.
        index: Vec<usize>,
    },
    /// No seeds or trial points were supplied before running.
    EmptySeedSet,
    /// Stopping value is NaN.
    InvalidStoppingValue(f64),
    /// Speed normalization factor is not positive and finite.
    InvalidNormalizationFactor(f64),
    /// The solver was initialized more than once.
    AlreadyInitialized,
    /// Array shape does not match expected shape.
    ShapeMismatch {
        /// The expected shape.
        expected: Vec<usize>,
        /// The actual shape encountered.
        got: Vec<usize>,
    },
    /// Unsupported data type in file.
    UnsupportedDtype(String),
    /// Unsupported file format (unrecognized extension).
    UnsupportedFileFormat(String),
    /// Expected MAT variable not found in file.
    MatVariableNotFound {
        /// The variable name that was requested.
        expected: String,
        /// The variable names that are available.
        available: Vec<String>,
    },
    /// I/O error occurred.
    IoError(std::io::Error),
    /// Other error with a descriptive message.
    Other(String),
}

impl fmt::Display for EikonalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EikonalError::InvalidGridShape { axis, size } => {
                write!(
                    f,
                    "invalid grid shape: axis {} has size {} (must be >= 1)",
                    axis, size
                )
            }
            EikonalError::InvalidSpacing { axis, spacing } => {
                write!(
                    f,
                    "invalid grid spacing on axis {}: {} (must be positive and finite)",
                    axis, spacing
                )
            }
            EikonalError::InvalidSpeed { index, value } => {
                write!(
                    f,
                    "invalid speed at index {}: {} (must be finite and >= 0)",
                    index, value
                )
            }
            EikonalError::InvalidSlowness { index, value } => {
                write!(
                    f,
                    "invalid slowness at index {}: {} (must be positive and finite)",
                    index, value
                )
            }
            EikonalError::InvalidSeed { index, reason } => {
                write!(f, "invalid seed at {:?}: {}", index, reason)
            }
            EikonalError::InvalidTarget { index } => {
                write!(f, "invalid target at {:?}: outside the grid", index)
            }
            EikonalError::InvalidForbiddenPoint { index } => {
                write!(f, "invalid forbidden point at {:?}: outside the grid", index)
            }
            EikonalError::EmptySeedSet => write!(f, "no seed points were supplied"),
            EikonalError::InvalidStoppingValue(v) => {
                write!(f, "invalid stopping value: {}", v)
            }
            EikonalError::InvalidNormalizationFactor(k) => {
                write!(
                    f,
                    "invalid normalization factor: {} (must be positive and finite)",
                    k
                )
            }
            EikonalError::AlreadyInitialized => {
                write!(f, "solver has already been initialized")
            }
            EikonalError::ShapeMismatch { expected, got } => {
                write!(f, "shape mismatch: expected {:?}, got {:?}", expected, got)
            }
            EikonalError::UnsupportedDtype(dtype) => {
                write!(f, "unsupported dtype: {}", dtype)
            }
            EikonalError::UnsupportedFileFormat(ext) => {
                write!(f, "unsupported file format: {}", ext)
            }
            EikonalError::MatVariableNotFound {
                expected,
                available,
            } => {
                write!(
                    f,
                    "MAT variable '{}' not found; available variables: {:?}",
                    expected, available
                )
            }
            EikonalError::IoError(e) => write!(f, "I/O error: {}", e),
            EikonalError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for EikonalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EikonalError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for EikonalError {
    fn from(e: std::io::Error) -> Self {
        EikonalError::IoError(e)
    }
}

/// Convenience type alias for Results with EikonalError.
pub type Result<T> = std::result::Result<T, EikonalError>;
