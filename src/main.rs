// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use tracing::Level;

use eikonal_fmm::core::CartesianGrid;
use eikonal_fmm::io;
use eikonal_fmm::marching::{solve_with_progress, ProgressInfo, SolveOptions, TargetCondition};

#[derive(Parser)]
#[command(
    name = "eikonal-fmm",
    about = "Fast marching eikonal solver with upwind gradient output"
)]
struct Cli {
    /// Dimensionality (1, 2 or 3)
    #[arg(short = 'd', long)]
    dim: usize,

    /// Grid size, comma-separated (e.g., 256,256 or 128,128,128)
    #[arg(short = 's', long)]
    size: String,

    /// Grid spacing: one value for every axis, or one per axis
    #[arg(long, default_value = "1.0")]
    spacing: String,

    /// Seed node "i,j[=value]" (repeatable); value defaults to 0
    #[arg(long, num_args = 1)]
    seed: Vec<String>,

    /// Initial trial node "i,j=value" (repeatable)
    #[arg(long, num_args = 1)]
    trial: Vec<String>,

    /// Forbidden node "i,j" (repeatable)
    #[arg(long, num_args = 1)]
    forbidden: Vec<String>,

    /// Speed field: "uniform:<val>", "speed-file:<path>", or
    /// "slowness-file:<path>"
    #[arg(long, default_value = "uniform:1.0")]
    speed: String,

    /// Speeds are divided by this factor
    #[arg(long, default_value = "1.0")]
    normalization: f64,

    /// Stop once the smallest trial value exceeds this
    #[arg(long)]
    stop_value: Option<f64>,

    /// Target node "i,j" (repeatable)
    #[arg(long, num_args = 1)]
    target: Vec<String>,

    /// How many targets must be reached: "one", "all", or a count
    #[arg(long, default_value = "all")]
    target_mode: String,

    /// Also write the upwind gradient to this path (.npy or .mat)
    #[arg(long)]
    gradient: Option<PathBuf>,

    /// Output file path (.npy or .mat)
    #[arg(short = 'o', long, default_value = "output.npy")]
    output: PathBuf,

    /// Log marching progress every 500ms
    #[arg(long)]
    progress: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_list<T: std::str::FromStr>(s: &str, what: &str) -> Result<Vec<T>>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    s.split(',')
        .map(|p| p.trim().parse::<T>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("invalid {}: '{}'", what, s))
}

fn parse_index<const N: usize>(s: &str, what: &str) -> Result<[usize; N]> {
    let parts: Vec<usize> = parse_list(s, what)?;
    let len = parts.len();
    parts
        .try_into()
        .map_err(|_| anyhow!("{} '{}' has {} components but --dim is {}", what, s, len, N))
}

fn parse_seed<const N: usize>(s: &str, what: &str, default: Option<f64>) -> Result<([usize; N], f64)> {
    let (idx_str, value) = match s.split_once('=') {
        Some((idx, value)) => {
            let value: f64 = value
                .trim()
                .parse()
                .with_context(|| format!("invalid {} value in '{}'", what, s))?;
            (idx, value)
        }
        None => match default {
            Some(value) => (s, value),
            None => bail!("{} '{}' needs a value: expected 'i,j=value'", what, s),
        },
    };
    Ok((parse_index(idx_str, what)?, value))
}

fn parse_spacing<const N: usize>(s: &str) -> Result<[f64; N]> {
    let parts: Vec<f64> = parse_list(s, "--spacing")?;
    match parts.len() {
        1 => Ok([parts[0]; N]),
        n if n == N => {
            let mut spacing = [0.0; N];
            spacing.copy_from_slice(&parts);
            Ok(spacing)
        }
        n => bail!("--spacing has {} components but --dim is {}", n, N),
    }
}

fn parse_target_mode(s: &str) -> Result<TargetCondition> {
    match s {
        "one" => Ok(TargetCondition::One),
        "all" => Ok(TargetCondition::All),
        n => {
            let count: usize = n.parse().with_context(|| {
                format!("invalid --target-mode '{}': expected one, all, or a count", n)
            })?;
            if count == 0 {
                bail!("--target-mode count must be at least 1");
            }
            Ok(TargetCondition::Count(count))
        }
    }
}

fn build_speed_field(mode: &str, shape: &[usize]) -> Result<Vec<f64>> {
    if let Some(val_str) = mode.strip_prefix("uniform:") {
        let val: f64 = val_str.parse().context("invalid uniform speed value")?;
        if !val.is_finite() || val < 0.0 {
            bail!("uniform speed must be finite and >= 0, got {}", val);
        }
        let num: usize = shape.iter().product();
        return Ok(vec![val; num]);
    }

    if let Some(path_str) = mode.strip_prefix("speed-file:") {
        return io::load_speed(Path::new(path_str), shape)
            .with_context(|| format!("loading speed from {}", path_str));
    }

    if let Some(path_str) = mode.strip_prefix("slowness-file:") {
        return io::load_slowness_as_speed(Path::new(path_str), shape)
            .with_context(|| format!("loading slowness from {}", path_str));
    }

    bail!(
        "unknown --speed mode: '{}'. Expected 'uniform:<val>', 'speed-file:<path>', \
         or 'slowness-file:<path>'",
        mode
    );
}

fn log_progress(info: ProgressInfo) {
    tracing::info!(
        elapsed_secs = info.elapsed.as_secs_f64(),
        frozen = info.frozen,
        narrow_band = info.narrow_band,
        value = info.current_value,
        "marching"
    );
}

fn run<const N: usize>(cli: &Cli, size: &[usize], speed: Vec<f64>) -> Result<()> {
    let mut shape = [0usize; N];
    shape.copy_from_slice(size);
    let spacing = parse_spacing::<N>(&cli.spacing)?;
    let grid = CartesianGrid::<N>::new(shape, spacing, speed)?;

    let seeds = cli
        .seed
        .iter()
        .map(|s| parse_seed::<N>(s, "--seed", Some(0.0)))
        .collect::<Result<Vec<_>>>()?;
    let trial_points = cli
        .trial
        .iter()
        .map(|s| parse_seed::<N>(s, "--trial", None))
        .collect::<Result<Vec<_>>>()?;
    let forbidden = cli
        .forbidden
        .iter()
        .map(|s| parse_index::<N>(s, "--forbidden"))
        .collect::<Result<Vec<_>>>()?;
    let targets = cli
        .target
        .iter()
        .map(|s| parse_index::<N>(s, "--target"))
        .collect::<Result<Vec<_>>>()?;

    let options = SolveOptions {
        seeds,
        trial_points,
        forbidden,
        forbidden_mask: None,
        stopping_value: cli.stop_value,
        targets,
        target_condition: parse_target_mode(&cli.target_mode)?,
        normalization_factor: cli.normalization,
        compute_gradient: cli.gradient.is_some(),
        record_freeze_order: false,
    };

    let progress: Option<Box<dyn FnMut(ProgressInfo) + Send>> = if cli.progress {
        Some(Box::new(log_progress))
    } else {
        None
    };
    let solution = solve_with_progress(grid, &options, progress)?;

    tracing::info!(
        frozen = solution.report.frozen,
        stale_pops = solution.report.stale_pops,
        reason = ?solution.report.stop_reason,
        "solve finished"
    );

    io::save_image(&solution.arrival_time, &cli.output)
        .with_context(|| format!("writing {}", cli.output.display()))?;
    if let (Some(path), Some(gradient)) = (&cli.gradient, &solution.gradient) {
        io::save_gradient(gradient, path)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    Ok(())
}

/// Subscriber level for `-v` count; `--progress` needs at least INFO to be seen.
fn log_level(verbose: u8, progress: bool) -> Level {
    match verbose {
        0 if !progress => Level::WARN,
        0 | 1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(log_level(cli.verbose, cli.progress))
        .with_writer(std::io::stderr)
        .init();

    if !(1..=3).contains(&cli.dim) {
        bail!("--dim must be 1, 2 or 3, got {}", cli.dim);
    }

    if cli.seed.is_empty() && cli.trial.is_empty() {
        bail!("at least one --seed or --trial must be specified");
    }

    let size: Vec<usize> = parse_list(&cli.size, "--size")?;
    if size.len() != cli.dim {
        bail!("--size has {} components but --dim is {}", size.len(), cli.dim);
    }
    let speed = build_speed_field(&cli.speed, &size)?;

    match cli.dim {
        1 => run::<1>(&cli, &size, speed),
        2 => run::<2>(&cli, &size, speed),
        3 => run::<3>(&cli, &size, speed),
        _ => unreachable!(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_raises_level_to_info() {
        assert_eq!(log_level(0, false), Level::WARN);
        assert_eq!(log_level(0, true), Level::INFO);
        assert_eq!(log_level(1, true), Level::INFO);
        assert_eq!(log_level(2, true), Level::DEBUG);
        assert_eq!(log_level(5, false), Level::TRACE);
    }

    #[test]
    fn seed_value_defaults_to_zero() {
        assert_eq!(parse_seed::<2>("3,4", "--seed", Some(0.0)).unwrap(), ([3, 4], 0.0));
        assert_eq!(parse_seed::<2>("3,4=1.5", "--seed", Some(0.0)).unwrap(), ([3, 4], 1.5));
        assert!(parse_seed::<2>("3,4", "--trial", None).is_err());
        assert!(parse_index::<3>("1,2", "--target").is_err());
    }
}
