// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use eikonal_fmm::core::{CartesianGrid, GridData};
use eikonal_fmm::marching::{solve, FastMarching, NodeLabel, SolveOptions, StopReason};
use eikonal_fmm::UNREACHED;

fn norm<const N: usize>(g: [f64; N]) -> f64 {
    g.iter().map(|c| c * c).sum::<f64>().sqrt()
}

/// Point source in a homogeneous 2D medium. Analytical solution: T(x) = |x - xs|.
/// The physical domain is fixed and h halves between runs; the first-order
/// stencil must reduce the L∞ error.
#[test]
fn point_source_homogeneous_2d_convergence() {
    let domain_size = 32.0;

    let run = |n: usize| -> f64 {
        let h = domain_size / (n - 1) as f64;
        let grid = CartesianGrid::<2>::uniform([n, n], [h, h], 1.0).unwrap();
        let center = n / 2;
        let options = SolveOptions {
            seeds: vec![([center, center], 0.0)],
            ..SolveOptions::default()
        };
        let solution = solve(grid, &options).unwrap();

        let mut max_err = 0.0_f64;
        for i in 0..n {
            for j in 0..n {
                let t = solution.arrival_time.get([i, j]);
                let dx = (i as f64 - center as f64) * h;
                let dy = (j as f64 - center as f64) * h;
                let dist = (dx * dx + dy * dy).sqrt();
                // Skip near-source nodes (within 3h)
                if dist > 3.0 * h {
                    max_err = max_err.max((t - dist).abs());
                }
            }
        }
        max_err
    };

    let err_coarse = run(33);
    let err_fine = run(65);

    assert!(err_coarse < 2.0, "coarse error too large: {}", err_coarse);
    assert!(
        err_coarse / err_fine > 1.2,
        "error did not shrink with h: 33={} 65={}",
        err_coarse,
        err_fine
    );
}

/// 5×5 grid, unit speed and spacing, seed at the corner.
#[test]
fn five_by_five_corner_seed() {
    let grid = CartesianGrid::<2>::uniform([5, 5], [1.0, 1.0], 1.0).unwrap();
    let options = SolveOptions {
        seeds: vec![([0, 0], 0.0)],
        compute_gradient: true,
        ..SolveOptions::default()
    };
    let solution = solve(grid, &options).unwrap();
    let t = &solution.arrival_time;

    // Along the edges the front moves one unit per node.
    for k in 0..5 {
        assert!((t.get([0, k]) - k as f64).abs() < 1e-12);
        assert!((t.get([k, 0]) - k as f64).abs() < 1e-12);
    }

    // Strictly increasing along the diagonal and never below the Euclidean distance.
    for k in 1..5 {
        assert!(t.get([k, k]) > t.get([k - 1, k - 1]));
        assert!(t.get([k, k]) >= (2.0 * (k * k) as f64).sqrt());
    }
    assert!((t.get([1, 1]) - (1.0 + std::f64::consts::FRAC_1_SQRT_2)).abs() < 1e-12);

    // Every node is no earlier than its upwind predecessors.
    for i in 0..5 {
        for j in 0..5 {
            if i > 0 {
                assert!(t.get([i, j]) > t.get([i - 1, j]));
            }
            if j > 0 {
                assert!(t.get([i, j]) > t.get([i, j - 1]));
            }
        }
    }

    let gradient = solution.gradient.unwrap();
    assert_eq!(gradient.get([0, 0]), [0.0, 0.0]);
    for i in 0..5 {
        for j in 0..5 {
            if [i, j] == [0, 0] {
                continue;
            }
            let n = norm(gradient.get([i, j]));
            assert!((n - 1.0).abs() < 1e-9, "[{}, {}] |g|={}", i, j, n);
        }
    }
    assert_eq!(solution.report.frozen, 25);
    assert_eq!(solution.report.stop_reason, Some(StopReason::NarrowBandEmpty));
}

/// 1D line with speed 2 and spacing 0.5: T = 0.25·i and dT/dx = 0.5.
#[test]
fn one_dimensional_line() {
    let grid = CartesianGrid::<1>::uniform([5], [0.5], 2.0).unwrap();
    let options = SolveOptions {
        seeds: vec![([0], 0.0)],
        compute_gradient: true,
        ..SolveOptions::default()
    };
    let solution = solve(grid, &options).unwrap();
    let gradient = solution.gradient.unwrap();

    let expected = [0.0, 0.25, 0.5, 0.75, 1.0];
    for (i, &e) in expected.iter().enumerate() {
        assert!((solution.arrival_time.get([i]) - e).abs() < 1e-12);
    }
    assert_eq!(gradient.get([0]), [0.0]);
    for i in 1..5 {
        assert!((gradient.get([i])[0] - 0.5).abs() < 1e-12);
    }
}

/// A forbidden wall splits the grid; the far side stays unreached.
#[test]
fn forbidden_wall_blocks_the_front() {
    let n = 7;
    let grid = CartesianGrid::<2>::uniform([n, n], [1.0, 1.0], 1.0).unwrap();
    let wall: Vec<[usize; 2]> = (0..n).map(|i| [i, 3]).collect();
    let options = SolveOptions {
        seeds: vec![([3, 0], 0.0)],
        forbidden: wall,
        compute_gradient: true,
        ..SolveOptions::default()
    };
    let solution = solve(grid, &options).unwrap();
    let gradient = solution.gradient.unwrap();

    for i in 0..n {
        assert_eq!(solution.labels.get([i, 3]), NodeLabel::Forbidden);
        assert_eq!(solution.arrival_time.get([i, 3]), UNREACHED);
        for j in 4..n {
            assert_eq!(solution.labels.get([i, j]), NodeLabel::Far);
            assert_eq!(solution.arrival_time.get([i, j]), UNREACHED);
            assert_eq!(gradient.get([i, j]), [0.0, 0.0]);
        }
        for j in 0..3 {
            assert_eq!(solution.labels.get([i, j]), NodeLabel::Frozen);
            assert!(solution.arrival_time.get([i, j]).is_finite());
        }
    }
    assert_eq!(solution.report.frozen, n * 3);
}

/// A zero-speed wall behaves like a forbidden one, but its nodes stay Far.
#[test]
fn zero_speed_wall_blocks_the_front() {
    let n = 6;
    let mut speed = vec![1.0; n * n];
    for i in 0..n {
        speed[i * n + 2] = 0.0;
    }
    let grid = CartesianGrid::<2>::new([n, n], [1.0, 1.0], speed).unwrap();
    let mut fm = FastMarching::new(grid).with_gradient();
    fm.add_seed([0, 0]);
    fm.run().unwrap();

    for i in 0..n {
        assert_eq!(fm.label([i, 2]), NodeLabel::Far);
        for j in 2..n {
            assert_eq!(fm.value([i, j]), UNREACHED);
            assert_eq!(fm.observer().gradient([i, j]), [0.0, 0.0]);
        }
    }
}

/// A forbidden mask with a gap lets the front around the wall.
#[test]
fn forbidden_mask_with_gap_detours() {
    let n = 5;
    let mut mask = vec![false; n * n];
    // Wall on column 2, open at the bottom row.
    for i in 0..n - 1 {
        mask[i * n + 2] = true;
    }
    let grid = CartesianGrid::<2>::uniform([n, n], [1.0, 1.0], 1.0).unwrap();
    let options = SolveOptions {
        seeds: vec![([0, 0], 0.0)],
        forbidden_mask: Some(mask),
        ..SolveOptions::default()
    };
    let solution = solve(grid, &options).unwrap();
    let behind = solution.arrival_time.get([0, 4]);
    assert!(behind.is_finite());
    // The detour through the gap is longer than the straight line.
    assert!(behind > 8.0, "detour arrival = {}", behind);
}

/// Two seeds in a homogeneous medium: T ≈ min(|x - s1|, |x - s2|).
#[test]
fn multi_seed_2d() {
    let n = 41;
    let grid = CartesianGrid::<2>::uniform([n, n], [1.0, 1.0], 1.0).unwrap();
    let s1 = [10usize, 10usize];
    let s2 = [30usize, 30usize];
    let options = SolveOptions {
        seeds: vec![(s1, 0.0), (s2, 0.0)],
        ..SolveOptions::default()
    };
    let solution = solve(grid, &options).unwrap();

    let dist = |a: [usize; 2], b: [usize; 2]| {
        let dx = a[0] as f64 - b[0] as f64;
        let dy = a[1] as f64 - b[1] as f64;
        (dx * dx + dy * dy).sqrt()
    };
    let mut max_err = 0.0_f64;
    for i in 0..n {
        for j in 0..n {
            let expected = dist([i, j], s1).min(dist([i, j], s2));
            let t = solution.arrival_time.get([i, j]);
            max_err = max_err.max((t - expected).abs());
        }
    }
    assert_eq!(solution.arrival_time.get(s1), 0.0);
    assert_eq!(solution.arrival_time.get(s2), 0.0);
    assert!(max_err < 2.0, "multi-seed max error = {}", max_err);
    // Symmetric seeds give a symmetric field.
    assert!(
        (solution.arrival_time.get([0, 40]) - solution.arrival_time.get([40, 0])).abs() < 1e-9
    );
}

/// Seeds with different initial values on a 1D line.
#[test]
fn seeds_with_initial_values() {
    let grid = CartesianGrid::<1>::uniform([11], [1.0], 1.0).unwrap();
    let options = SolveOptions {
        seeds: vec![([0], 0.0), ([10], 2.0)],
        ..SolveOptions::default()
    };
    let solution = solve(grid, &options).unwrap();
    for i in 0..11 {
        let expected = (i as f64).min(2.0 + (10 - i) as f64);
        assert!((solution.arrival_time.get([i]) - expected).abs() < 1e-12);
    }
}

/// The stopping value leaves a frozen disc of values at or below it.
#[test]
fn stopping_value_bounds_frozen_region() {
    let n = 21;
    let grid = CartesianGrid::<2>::uniform([n, n], [1.0, 1.0], 1.0).unwrap();
    let options = SolveOptions {
        seeds: vec![([10, 10], 0.0)],
        stopping_value: Some(5.0),
        ..SolveOptions::default()
    };
    let solution = solve(grid, &options).unwrap();
    assert_eq!(
        solution.report.stop_reason,
        Some(StopReason::StoppingValueExceeded)
    );
    for i in 0..n {
        for j in 0..n {
            let t = solution.arrival_time.get([i, j]);
            match solution.labels.get([i, j]) {
                NodeLabel::Frozen => assert!(t <= 5.0),
                NodeLabel::Trial => assert!(t > 5.0 && t.is_finite()),
                NodeLabel::Far => assert_eq!(t, UNREACHED),
                NodeLabel::Forbidden => panic!("no forbidden nodes were set"),
            }
        }
    }
    assert_eq!(solution.labels.get([0, 0]), NodeLabel::Far);
    assert_eq!(solution.labels.get([10, 15]), NodeLabel::Frozen);
}

/// Point source in 3D: exact on the axes, unit gradient everywhere else.
#[test]
fn point_source_3d() {
    let n = 11;
    let grid = CartesianGrid::<3>::uniform([n, n, n], [1.0, 1.0, 1.0], 1.0).unwrap();
    let c = 5;
    let options = SolveOptions {
        seeds: vec![([c, c, c], 0.0)],
        compute_gradient: true,
        ..SolveOptions::default()
    };
    let solution = solve(grid.clone(), &options).unwrap();
    let gradient = solution.gradient.unwrap();

    for k in 0..n {
        let d = (k as f64 - c as f64).abs();
        assert!((solution.arrival_time.get([k, c, c]) - d).abs() < 1e-12);
        assert!((solution.arrival_time.get([c, k, c]) - d).abs() < 1e-12);
        assert!((solution.arrival_time.get([c, c, k]) - d).abs() < 1e-12);
    }
    let corner = solution.arrival_time.get([c + 1, c + 1, c + 1]);
    assert!(corner > 3f64.sqrt() && corner < 3.0);

    for flat in 0..grid.num_nodes() {
        let idx = grid.flat_to_nd(flat);
        if idx == [c, c, c] {
            continue;
        }
        let g = norm(gradient.get(idx));
        assert!((g - 1.0).abs() < 1e-9, "{:?} |g|={}", idx, g);
    }
}

/// Outputs written through the io module can be read back.
#[test]
fn solution_round_trips_through_npy() {
    let grid = CartesianGrid::<2>::uniform([4, 6], [1.0, 1.0], 1.0).unwrap();
    let options = SolveOptions {
        seeds: vec![([0, 0], 0.0)],
        compute_gradient: true,
        ..SolveOptions::default()
    };
    let solution = solve(grid, &options).unwrap();

    let dir = std::env::temp_dir();
    let times_path = dir.join("eikonal_fmm_verification_times.npy");
    let grad_path = dir.join("eikonal_fmm_verification_grad.mat");
    eikonal_fmm::io::save_image(&solution.arrival_time, &times_path).unwrap();
    eikonal_fmm::io::save_gradient(solution.gradient.as_ref().unwrap(), &grad_path).unwrap();

    let loaded = eikonal_fmm::io::load_npy_field(&times_path, &[4, 6]).unwrap();
    assert_eq!(loaded, solution.arrival_time.as_slice());
    assert!(grad_path.exists());

    std::fs::remove_file(&times_path).ok();
    std::fs::remove_file(&grad_path).ok();
}
