// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::io::Write;
use std::path::Path;

use ndarray::{ArrayD, IxDyn, ShapeBuilder};

use crate::core::Image;
use crate::error::{EikonalError, Result};

/// Load a scalar field from a .npy file, in row-major order.
pub fn load_npy_field(path: &Path, expected_shape: &[usize]) -> Result<Vec<f64>> {
    // Try f64 first
    let arr: ArrayD<f64> = match ndarray_npy::read_npy(path) {
        Ok(a) => a,
        Err(_) => {
            // Try f32 and promote
            let arr32: ArrayD<f32> = ndarray_npy::read_npy(path)
                .map_err(|e| EikonalError::UnsupportedDtype(format!("{}", e)))?;
            arr32.mapv(|v| v as f64)
        }
    };

    let got_shape: Vec<usize> = arr.shape().to_vec();
    if got_shape != expected_shape {
        return Err(EikonalError::ShapeMismatch {
            expected: expected_shape.to_vec(),
            got: got_shape,
        });
    }

    // Fortran-order files would otherwise come out column-major.
    Ok(arr.as_standard_layout().to_owned().into_raw_vec())
}

/// Save arrival times to a .npy file.
pub fn save_npy<const N: usize>(image: &Image<N, f64>, path: &Path) -> Result<()> {
    write_npy_array(path, &image.shape(), image.as_slice().to_vec())
}

/// Save a gradient image to a .npy file of shape `[..shape, N]`.
pub fn save_gradient_npy<const N: usize>(image: &Image<N, [f64; N]>, path: &Path) -> Result<()> {
    let mut shape = image.shape().to_vec();
    shape.push(N);
    write_npy_array(path, &shape, flatten_gradient(image))
}

fn write_npy_array(path: &Path, shape: &[usize], data: Vec<f64>) -> Result<()> {
    let arr = ArrayD::from_shape_vec(IxDyn(shape), data)
        .map_err(|e| EikonalError::Other(format!("shape error: {}", e)))?;
    ndarray_npy::write_npy(path, &arr)
        .map_err(|e| EikonalError::Other(format!("npy write error: {}", e)))?;
    Ok(())
}

fn flatten_gradient<const N: usize>(image: &Image<N, [f64; N]>) -> Vec<f64> {
    image.as_slice().iter().flat_map(|g| g.iter().copied()).collect()
}

/// MAT stores vectors as 2D; drop the singleton axes a 1D grid does not have.
fn squeeze_mat_shape(mat_shape: &[usize], expected_len: usize) -> Vec<usize> {
    let mut shape = mat_shape.to_vec();
    while shape.len() > expected_len && shape.last() == Some(&1) {
        shape.pop();
    }
    if expected_len == 1 && shape.len() == 2 && shape[0] == 1 {
        shape.remove(0);
    }
    shape
}

/// Load a scalar field from a .mat file, in row-major order.
///
/// The stored array may have the expected shape or its reverse; both are
/// re-laid out from MATLAB's column-major order.
pub fn load_mat_field(
    path: &Path,
    variable_name: &str,
    expected_shape: &[usize],
) -> Result<Vec<f64>> {
    let file = std::fs::File::open(path)?;
    let mut reader = std::io::BufReader::new(file);
    let mat = matfile::MatFile::parse(&mut reader)
        .map_err(|e| EikonalError::Other(format!("MAT parse error: {}", e)))?;

    let available: Vec<String> = mat.arrays().iter().map(|a| a.name().to_string()).collect();

    let array =
        mat.find_by_name(variable_name)
            .ok_or_else(|| EikonalError::MatVariableNotFound {
                expected: variable_name.to_string(),
                available,
            })?;

    let data: Vec<f64> = match array.data() {
        matfile::NumericData::Double { real, imag: _ } => real.clone(),
        matfile::NumericData::Single { real, imag: _ } => real.iter().map(|&v| v as f64).collect(),
        _ => {
            return Err(EikonalError::UnsupportedDtype(
                "MAT file array is not f64 or f32".to_string(),
            ))
        }
    };

    let mat_shape = squeeze_mat_shape(array.size(), expected_shape.len());
    let num_elements: usize = expected_shape.iter().product();
    if data.len() != num_elements {
        return Err(EikonalError::ShapeMismatch {
            expected: expected_shape.to_vec(),
            got: mat_shape,
        });
    }

    let shape_matches = mat_shape == expected_shape;
    let reversed: Vec<usize> = expected_shape.iter().rev().cloned().collect();
    let shape_reversed = mat_shape == reversed;
    if !shape_matches && !shape_reversed {
        return Err(EikonalError::ShapeMismatch {
            expected: expected_shape.to_vec(),
            got: mat_shape,
        });
    }

    let arr = ArrayD::from_shape_vec(IxDyn(&mat_shape).f(), data)
        .map_err(|e| EikonalError::Other(format!("shape error: {}", e)))?;

    let result = if shape_matches {
        arr.as_standard_layout().to_owned().into_raw_vec()
    } else {
        let permutation: Vec<usize> = (0..expected_shape.len()).rev().collect();
        let transposed = arr.permuted_axes(IxDyn(&permutation));
        transposed.as_standard_layout().to_owned().into_raw_vec()
    };

    Ok(result)
}

fn to_column_major(shape: &[usize], data: Vec<f64>) -> Result<Vec<f64>> {
    let arr = ArrayD::from_shape_vec(IxDyn(shape), data)
        .map_err(|e| EikonalError::Other(format!("shape error: {}", e)))?;
    Ok(arr.t().as_standard_layout().to_owned().into_raw_vec())
}

/// Save arrival times to a .mat file (Level 5) under `var_name`.
///
/// The MATLAB array has the grid's shape, so `A(i+1, j+1)` is node `[i, j]`.
pub fn save_mat<const N: usize>(image: &Image<N, f64>, path: &Path, var_name: &str) -> Result<()> {
    let shape = image.shape().to_vec();
    let data = to_column_major(&shape, image.as_slice().to_vec())?;
    write_mat_level5(path, var_name, &shape, &data)
}

/// Save a gradient image to a .mat file (Level 5) with shape `[..shape, N]`.
pub fn save_gradient_mat<const N: usize>(
    image: &Image<N, [f64; N]>,
    path: &Path,
    var_name: &str,
) -> Result<()> {
    let mut shape = image.shape().to_vec();
    shape.push(N);
    let data = to_column_major(&shape, flatten_gradient(image))?;
    write_mat_level5(path, var_name, &shape, &data)
}

/// Minimal MAT-file Level 5 writer for a single uncompressed f64 array.
///
/// The `matfile` crate only reads, so the writer is hand-rolled: a 128-byte
/// header followed by one miMATRIX element holding array flags, dimensions,
/// name, and the real part. Every sub-element is padded to 8 bytes.
/// Dimensions are padded to at least two, as MATLAB requires.
fn write_mat_level5(path: &Path, var_name: &str, dimensions: &[usize], data: &[f64]) -> Result<()> {
    const MI_INT8: u32 = 1;
    const MI_INT32: u32 = 5;
    const MI_UINT32: u32 = 6;
    const MI_DOUBLE: u32 = 9;
    const MI_MATRIX: u32 = 14;
    const MX_DOUBLE_CLASS: u32 = 6;

    let mut dims: Vec<usize> = dimensions.to_vec();
    while dims.len() < 2 {
        dims.push(1);
    }

    let file = std::fs::File::create(path)?;
    let mut w = std::io::BufWriter::new(file);

    // Header: 116 bytes of text, 8 bytes subsystem offset, version, endian tag.
    let desc = b"MATLAB 5.0 MAT-file, created by eikonal-fmm";
    let mut header_text = [b' '; 116];
    let copy_len = desc.len().min(116);
    header_text[..copy_len].copy_from_slice(&desc[..copy_len]);
    w.write_all(&header_text)?;
    w.write_all(&[0u8; 8])?;
    w.write_all(&0x0100u16.to_le_bytes())?;
    w.write_all(b"IM")?;

    let padded = |n: u32| (n + 7) / 8 * 8;

    let flags_total: u32 = 16;
    let dims_size = (dims.len() * 4) as u32;
    let dims_total = 8 + padded(dims_size);
    let name_bytes = var_name.as_bytes();
    let name_size = name_bytes.len() as u32;
    let name_total = 8 + padded(name_size);
    let real_size = (data.len() * 8) as u32;
    let real_total = 8 + padded(real_size);

    w.write_all(&MI_MATRIX.to_le_bytes())?;
    w.write_all(&(flags_total + dims_total + name_total + real_total).to_le_bytes())?;

    // Array flags: class in the low byte, no complex/global/logical bits.
    w.write_all(&MI_UINT32.to_le_bytes())?;
    w.write_all(&8u32.to_le_bytes())?;
    w.write_all(&MX_DOUBLE_CLASS.to_le_bytes())?;
    w.write_all(&0u32.to_le_bytes())?;

    w.write_all(&MI_INT32.to_le_bytes())?;
    w.write_all(&dims_size.to_le_bytes())?;
    for &d in &dims {
        w.write_all(&(d as i32).to_le_bytes())?;
    }
    write_padding(&mut w, padded(dims_size) - dims_size)?;

    w.write_all(&MI_INT8.to_le_bytes())?;
    w.write_all(&name_size.to_le_bytes())?;
    w.write_all(name_bytes)?;
    write_padding(&mut w, padded(name_size) - name_size)?;

    w.write_all(&MI_DOUBLE.to_le_bytes())?;
    w.write_all(&real_size.to_le_bytes())?;
    for &val in data {
        w.write_all(&val.to_le_bytes())?;
    }
    write_padding(&mut w, padded(real_size) - real_size)?;

    w.flush()?;
    Ok(())
}

fn write_padding<W: Write>(w: &mut W, n: u32) -> Result<()> {
    if n > 0 {
        w.write_all(&vec![0u8; n as usize])?;
    }
    Ok(())
}

/// Convert a slowness field to speed (element-wise 1/s).
pub fn slowness_to_speed(slowness: &[f64]) -> Result<Vec<f64>> {
    let mut speed = Vec::with_capacity(slowness.len());
    for (index, &s) in slowness.iter().enumerate() {
        if !s.is_finite() || s <= 0.0 {
            return Err(EikonalError::InvalidSlowness { index, value: s });
        }
        speed.push(1.0 / s);
    }
    Ok(speed)
}

/// Supported file formats for grid I/O.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileFormat {
    /// NumPy .npy format.
    Npy,
    /// MATLAB .mat format (Level 5).
    Mat,
}

/// Infer file format from extension.
pub fn infer_format(path: &Path) -> Result<FileFormat> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("npy") => Ok(FileFormat::Npy),
        Some("mat") => Ok(FileFormat::Mat),
        Some(ext) => Err(EikonalError::UnsupportedFileFormat(ext.to_string())),
        None => Err(EikonalError::UnsupportedFileFormat(
            "(no extension)".to_string(),
        )),
    }
}

/// Save arrival times, inferring format from extension.
pub fn save_image<const N: usize>(image: &Image<N, f64>, path: &Path) -> Result<()> {
    match infer_format(path)? {
        FileFormat::Npy => save_npy(image, path),
        FileFormat::Mat => save_mat(image, path, "arrival_time"),
    }
}

/// Save a gradient image, inferring format from extension.
pub fn save_gradient<const N: usize>(image: &Image<N, [f64; N]>, path: &Path) -> Result<()> {
    match infer_format(path)? {
        FileFormat::Npy => save_gradient_npy(image, path),
        FileFormat::Mat => save_gradient_mat(image, path, "gradient"),
    }
}

/// Load a speed field, inferring format from extension.
pub fn load_speed(path: &Path, expected_shape: &[usize]) -> Result<Vec<f64>> {
    match infer_format(path)? {
        FileFormat::Npy => load_npy_field(path, expected_shape),
        FileFormat::Mat => load_mat_field(path, "speed", expected_shape),
    }
}

/// Load a slowness field and convert it to speed.
pub fn load_slowness_as_speed(path: &Path, expected_shape: &[usize]) -> Result<Vec<f64>> {
    let slowness = match infer_format(path)? {
        FileFormat::Npy => load_npy_field(path, expected_shape)?,
        FileFormat::Mat => load_mat_field(path, "slowness", expected_shape)?,
    };
    slowness_to_speed(&slowness)
}
