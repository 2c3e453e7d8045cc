// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::time::{Duration, Instant};

use crate::core::{CartesianGrid, GridData, Image};
use crate::error::{EikonalError, Result};
use crate::gradient::UpwindGradient;
use crate::update_kernels::{update_node, UNREACHED};

const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

/// Classification of a grid node during marching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeLabel {
    /// Not yet reached by the front.
    Far,
    /// In the narrow band with a provisional arrival time.
    Trial,
    /// Arrival time is final.
    Frozen,
    /// Excluded from marching.
    Forbidden,
}

impl NodeLabel {
    /// Alias for [`NodeLabel::Frozen`].
    pub const ALIVE: NodeLabel = NodeLabel::Frozen;
}

/// Lifecycle of a [`FastMarching`] solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverState {
    /// Seeds may still be added.
    NotInitialized,
    /// Seeds are frozen and the narrow band is primed.
    Ready,
    /// At least one step has been taken.
    Running,
    /// Marching has stopped. A new solve needs a new instance.
    Complete,
}

/// When target points stop the march.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetCondition {
    /// Stop once any target is frozen.
    One,
    /// Stop once this many targets are frozen (capped at the number of targets).
    Count(usize),
    /// Stop once every target is frozen.
    All,
}

/// Why a solve stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// No trial nodes remain.
    NarrowBandEmpty,
    /// The smallest trial value exceeded the stopping value.
    StoppingValueExceeded,
    /// The target condition was met.
    TargetsReached,
}

/// Result of a single [`FastMarching::step`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome<const N: usize> {
    /// A node was frozen.
    Frozen {
        /// Index of the frozen node.
        index: [usize; N],
        /// Its final arrival time.
        value: f64,
    },
    /// Marching is finished.
    Complete(StopReason),
}

/// Counters collected over a solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveReport {
    /// Number of freeze events, seeds included.
    pub frozen: usize,
    /// Heap entries discarded because a lower value had already frozen the node.
    pub stale_pops: usize,
    /// Largest frozen value so far.
    pub last_value: f64,
    /// Set once the solve is complete.
    pub stop_reason: Option<StopReason>,
}

impl Default for SolveReport {
    fn default() -> Self {
        SolveReport {
            frozen: 0,
            stale_pops: 0,
            last_value: f64::NEG_INFINITY,
            stop_reason: None,
        }
    }
}

/// Progress information passed to the optional callback.
pub struct ProgressInfo {
    /// Number of nodes frozen so far.
    pub frozen: usize,
    /// Current number of heap entries, stale ones included.
    pub narrow_band: usize,
    /// Arrival time of the most recently frozen node.
    pub current_value: f64,
    /// Elapsed time since initialization.
    pub elapsed: Duration,
}

/// Read-only view of the marching state handed to observers.
pub struct Front<'a, const N: usize> {
    grid: &'a CartesianGrid<N>,
    labels: &'a [NodeLabel],
    values: &'a [f64],
}

impl<'a, const N: usize> Front<'a, N> {
    /// The grid being marched over.
    pub fn grid(&self) -> &'a CartesianGrid<N> {
        self.grid
    }

    /// Current classification of a node.
    pub fn label(&self, idx: [usize; N]) -> NodeLabel {
        self.labels[self.grid.nd_to_flat(idx)]
    }

    /// Current stored value of a node (final only if frozen).
    pub fn value(&self, idx: [usize; N]) -> f64 {
        self.values[self.grid.nd_to_flat(idx)]
    }

    /// The node's value if it is frozen.
    pub fn frozen_value(&self, idx: [usize; N]) -> Option<f64> {
        let flat = self.grid.nd_to_flat(idx);
        (self.labels[flat] == NodeLabel::Frozen).then(|| self.values[flat])
    }
}

/// Hooks invoked by [`FastMarching`] at its extension points.
pub trait FreezeObserver<const N: usize> {
    /// Called right after `idx` is frozen with `value`, before its neighbors
    /// are updated. Seeds are reported once all of them are placed.
    fn on_freeze(&mut self, _front: &Front<'_, N>, _idx: [usize; N], _value: f64) {}

    /// Called after a trial value is set or lowered.
    fn on_trial_update(&mut self, _front: &Front<'_, N>, _idx: [usize; N], _value: f64) {}
}

impl<const N: usize> FreezeObserver<N> for () {}

impl<const N: usize, T: FreezeObserver<N>> FreezeObserver<N> for Option<T> {
    fn on_freeze(&mut self, front: &Front<'_, N>, idx: [usize; N], value: f64) {
        if let Some(inner) = self {
            inner.on_freeze(front, idx, value);
        }
    }

    fn on_trial_update(&mut self, front: &Front<'_, N>, idx: [usize; N], value: f64) {
        if let Some(inner) = self {
            inner.on_trial_update(front, idx, value);
        }
    }
}

impl<const N: usize, A: FreezeObserver<N>, B: FreezeObserver<N>> FreezeObserver<N> for (A, B) {
    fn on_freeze(&mut self, front: &Front<'_, N>, idx: [usize; N], value: f64) {
        self.0.on_freeze(front, idx, value);
        self.1.on_freeze(front, idx, value);
    }

    fn on_trial_update(&mut self, front: &Front<'_, N>, idx: [usize; N], value: f64) {
        self.0.on_trial_update(front, idx, value);
        self.1.on_trial_update(front, idx, value);
    }
}

/// Records every freeze event in order.
#[derive(Debug, Clone, Default)]
pub struct FreezeRecorder<const N: usize> {
    events: Vec<([usize; N], f64)>,
}

impl<const N: usize> FreezeRecorder<N> {
    /// An empty recorder.
    pub fn new() -> Self {
        FreezeRecorder { events: Vec::new() }
    }

    /// Frozen nodes and their values, in freeze order.
    pub fn events(&self) -> &[([usize; N], f64)] {
        &self.events
    }

    /// Consume the recorder and return its events.
    pub fn into_events(self) -> Vec<([usize; N], f64)> {
        self.events
    }
}

impl<const N: usize> FreezeObserver<N> for FreezeRecorder<N> {
    fn on_freeze(&mut self, _front: &Front<'_, N>, idx: [usize; N], value: f64) {
        self.events.push((idx, value));
    }
}

#[derive(Debug, Clone, Copy)]
struct TrialEntry {
    value: f64,
    flat: usize,
}

// Reversed so that BinaryHeap pops the smallest value; ties go to the smaller flat index.
impl Ord for TrialEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .value
            .total_cmp(&self.value)
            .then_with(|| other.flat.cmp(&self.flat))
    }
}

impl PartialOrd for TrialEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for TrialEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TrialEntry {}

/// Everything a finished solve produces.
pub struct MarchingOutput<const N: usize, O> {
    /// Arrival times; [`UNREACHED`] where the front never arrived.
    pub arrival_time: Image<N, f64>,
    /// Final classification of every node.
    pub labels: Image<N, NodeLabel>,
    /// The observer, with whatever it collected.
    pub observer: O,
    /// Solve counters.
    pub report: SolveReport,
}

/// A fast marching eikonal solver.
///
/// Freezes nodes in order of increasing arrival time using a binary heap
/// narrow band with lazy deletion of stale entries. Each newly frozen node
/// updates its unfrozen axis neighbors with the upwind quadratic stencil.
/// An observer `O` is notified of every freeze and trial update; the
/// gradient extension is one such observer.
///
/// Execution is single-threaded and deterministic.
pub struct FastMarching<const N: usize, O = ()> {
    grid: CartesianGrid<N>,
    labels: Vec<NodeLabel>,
    values: Vec<f64>,
    heap: BinaryHeap<TrialEntry>,
    observer: O,
    seeds: Vec<([usize; N], f64)>,
    trial_points: Vec<([usize; N], f64)>,
    forbidden: Vec<[usize; N]>,
    forbidden_mask: Option<Vec<bool>>,
    stopping_value: Option<f64>,
    targets: HashSet<usize>,
    target_points: Vec<[usize; N]>,
    target_condition: TargetCondition,
    targets_reached: usize,
    normalization: f64,
    state: SolverState,
    report: SolveReport,
    progress_callback: Option<Box<dyn FnMut(ProgressInfo) + Send>>,
    start_time: Option<Instant>,
    last_progress: Duration,
}

impl<const N: usize> FastMarching<N> {
    /// Create a solver over `grid` with no observer.
    pub fn new(grid: CartesianGrid<N>) -> Self {
        let num_nodes = grid.num_nodes();
        FastMarching {
            grid,
            labels: vec![NodeLabel::Far; num_nodes],
            values: vec![UNREACHED; num_nodes],
            heap: BinaryHeap::new(),
            observer: (),
            seeds: Vec::new(),
            trial_points: Vec::new(),
            forbidden: Vec::new(),
            forbidden_mask: None,
            stopping_value: None,
            targets: HashSet::new(),
            target_points: Vec::new(),
            target_condition: TargetCondition::All,
            targets_reached: 0,
            normalization: 1.0,
            state: SolverState::NotInitialized,
            report: SolveReport::default(),
            progress_callback: None,
            start_time: None,
            last_progress: Duration::ZERO,
        }
    }
}

impl<const N: usize, O: FreezeObserver<N>> FastMarching<N, O> {
    /// Replace the observer (builder method).
    pub fn with_observer<P: FreezeObserver<N>>(self, observer: P) -> FastMarching<N, P> {
        FastMarching {
            grid: self.grid,
            labels: self.labels,
            values: self.values,
            heap: self.heap,
            observer,
            seeds: self.seeds,
            trial_points: self.trial_points,
            forbidden: self.forbidden,
            forbidden_mask: self.forbidden_mask,
            stopping_value: self.stopping_value,
            targets: self.targets,
            target_points: self.target_points,
            target_condition: self.target_condition,
            targets_reached: self.targets_reached,
            normalization: self.normalization,
            state: self.state,
            report: self.report,
            progress_callback: self.progress_callback,
            start_time: self.start_time,
            last_progress: self.last_progress,
        }
    }

    /// Compute the upwind gradient alongside the arrival times (builder method).
    pub fn with_gradient(self) -> FastMarching<N, UpwindGradient<N>> {
        let gradient = UpwindGradient::new(&self.grid);
        self.with_observer(gradient)
    }

    /// Stop once the smallest trial value exceeds `value` (builder method).
    pub fn with_stopping_value(mut self, value: f64) -> Self {
        self.stopping_value = Some(value);
        self
    }

    /// Stop once `condition` holds over the frozen `targets` (builder method).
    pub fn with_targets(mut self, targets: Vec<[usize; N]>, condition: TargetCondition) -> Self {
        self.target_points = targets;
        self.target_condition = condition;
        self
    }

    /// Divide every speed by `factor` before marching (builder method).
    ///
    /// # Errors
    /// Returns an error if the factor is not positive and finite.
    pub fn with_normalization_factor(mut self, factor: f64) -> Result<Self> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(EikonalError::InvalidNormalizationFactor(factor));
        }
        self.normalization = factor;
        Ok(self)
    }

    /// Mark nodes as forbidden from a row-major mask (builder method).
    ///
    /// # Errors
    /// Returns an error if the mask length differs from the node count.
    pub fn with_forbidden_mask(mut self, mask: Vec<bool>) -> Result<Self> {
        if mask.len() != self.grid.num_nodes() {
            return Err(EikonalError::ShapeMismatch {
                expected: self.grid.shape().to_vec(),
                got: vec![mask.len()],
            });
        }
        self.forbidden_mask = Some(mask);
        Ok(self)
    }

    /// Set a progress callback, invoked at most every 500ms while marching (builder method).
    pub fn with_progress(mut self, callback: Box<dyn FnMut(ProgressInfo) + Send>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Add a seed with initial arrival time zero.
    pub fn add_seed(&mut self, idx: [usize; N]) {
        self.add_seed_with_value(idx, 0.0);
    }

    /// Add a seed with the given initial arrival time.
    pub fn add_seed_with_value(&mut self, idx: [usize; N], value: f64) {
        self.seeds.push((idx, value));
    }

    /// Add a node that starts in the narrow band with a provisional value.
    pub fn add_trial_point(&mut self, idx: [usize; N], value: f64) {
        self.trial_points.push((idx, value));
    }

    /// Exclude a node from marching.
    pub fn add_forbidden(&mut self, idx: [usize; N]) {
        self.forbidden.push(idx);
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SolverState {
        self.state
    }

    /// The grid being marched over.
    pub fn grid(&self) -> &CartesianGrid<N> {
        &self.grid
    }

    /// The observer.
    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Current classification of a node.
    pub fn label(&self, idx: [usize; N]) -> NodeLabel {
        self.labels[self.grid.nd_to_flat(idx)]
    }

    /// Current stored value of a node.
    pub fn value(&self, idx: [usize; N]) -> f64 {
        self.values[self.grid.nd_to_flat(idx)]
    }

    /// Stored values in row-major order.
    pub fn arrival_times(&self) -> &[f64] {
        &self.values
    }

    /// Number of heap entries, stale ones included.
    pub fn narrow_band_len(&self) -> usize {
        self.heap.len()
    }

    /// Counters so far.
    pub fn report(&self) -> SolveReport {
        self.report
    }

    fn seed_error(idx: [usize; N], reason: &str) -> EikonalError {
        EikonalError::InvalidSeed {
            index: idx.to_vec(),
            reason: reason.to_string(),
        }
    }

    fn is_forbidden_input(&self, idx: [usize; N]) -> bool {
        let flat = self.grid.nd_to_flat(idx);
        self.forbidden_mask.as_ref().is_some_and(|m| m[flat]) || self.forbidden.contains(&idx)
    }

    fn validate(&self) -> Result<()> {
        if self.state != SolverState::NotInitialized {
            return Err(EikonalError::AlreadyInitialized);
        }
        if self.seeds.is_empty() && self.trial_points.is_empty() {
            return Err(EikonalError::EmptySeedSet);
        }
        if let Some(v) = self.stopping_value {
            if v.is_nan() {
                return Err(EikonalError::InvalidStoppingValue(v));
            }
        }
        for &idx in &self.forbidden {
            if !self.grid.contains(idx) {
                return Err(EikonalError::InvalidForbiddenPoint {
                    index: idx.to_vec(),
                });
            }
        }
        for &idx in &self.target_points {
            if !self.grid.contains(idx) {
                return Err(EikonalError::InvalidTarget {
                    index: idx.to_vec(),
                });
            }
        }
        for &(idx, value) in self.seeds.iter().chain(self.trial_points.iter()) {
            if !self.grid.contains(idx) {
                return Err(Self::seed_error(idx, "outside the grid"));
            }
            if !value.is_finite() {
                return Err(Self::seed_error(idx, "initial value must be finite"));
            }
            if self.is_forbidden_input(idx) {
                return Err(Self::seed_error(idx, "lies on a forbidden point"));
            }
        }
        for &(idx, _) in &self.trial_points {
            if self.grid.speed(idx) <= 0.0 {
                return Err(Self::seed_error(idx, "lies on an impassable point"));
            }
        }
        Ok(())
    }

    /// Freeze the seeds and prime the narrow band.
    ///
    /// Duplicate seeds keep their lowest value. Trial points that coincide
    /// with a seed are ignored.
    ///
    /// # Errors
    /// Returns an error if no seeds were added, a seed, target, or forbidden
    /// point lies outside the grid, a seed lies on a forbidden point, a trial
    /// point lies on a zero-speed node, the
    /// stopping value is NaN, or the solver was already initialized. On
    /// error the solver is left untouched.
    pub fn initialize(&mut self) -> Result<()> {
        self.validate()?;

        if let Some(mask) = self.forbidden_mask.take() {
            for (flat, &forbidden) in mask.iter().enumerate() {
                if forbidden {
                    self.labels[flat] = NodeLabel::Forbidden;
                }
            }
        }
        for idx in std::mem::take(&mut self.forbidden) {
            let flat = self.grid.nd_to_flat(idx);
            self.labels[flat] = NodeLabel::Forbidden;
        }
        let num_forbidden = self
            .labels
            .iter()
            .filter(|&&l| l == NodeLabel::Forbidden)
            .count();

        let mut seed_flats = Vec::with_capacity(self.seeds.len());
        for (idx, value) in std::mem::take(&mut self.seeds) {
            let flat = self.grid.nd_to_flat(idx);
            if self.labels[flat] == NodeLabel::Frozen {
                self.values[flat] = self.values[flat].min(value);
            } else {
                self.labels[flat] = NodeLabel::Frozen;
                self.values[flat] = value;
                seed_flats.push(flat);
            }
        }
        seed_flats.sort_by(|&a, &b| self.values[a].total_cmp(&self.values[b]).then(a.cmp(&b)));

        self.targets = self
            .target_points
            .iter()
            .map(|&idx| self.grid.nd_to_flat(idx))
            .collect();

        for &flat in &seed_flats {
            let idx = self.grid.flat_to_nd(flat);
            let value = self.values[flat];
            self.record_freeze(flat, value);
            let front = Front {
                grid: &self.grid,
                labels: &self.labels,
                values: &self.values,
            };
            self.observer.on_freeze(&front, idx, value);
        }

        let mut num_trial = 0;
        for (idx, value) in std::mem::take(&mut self.trial_points) {
            let flat = self.grid.nd_to_flat(idx);
            match self.labels[flat] {
                NodeLabel::Frozen => continue,
                NodeLabel::Trial if value >= self.values[flat] => continue,
                _ => {}
            }
            self.labels[flat] = NodeLabel::Trial;
            self.values[flat] = value;
            self.heap.push(TrialEntry { value, flat });
            num_trial += 1;
            let front = Front {
                grid: &self.grid,
                labels: &self.labels,
                values: &self.values,
            };
            self.observer.on_trial_update(&front, idx, value);
        }

        for &flat in &seed_flats {
            self.update_neighbors(self.grid.flat_to_nd(flat));
        }

        self.start_time = Some(Instant::now());
        self.state = SolverState::Ready;
        tracing::debug!(
            seeds = seed_flats.len(),
            trial_points = num_trial,
            forbidden = num_forbidden,
            narrow_band = self.heap.len(),
            "fast marching initialized"
        );
        Ok(())
    }

    fn record_freeze(&mut self, flat: usize, value: f64) {
        self.report.frozen += 1;
        if value > self.report.last_value {
            self.report.last_value = value;
        }
        if self.targets.contains(&flat) {
            self.targets_reached += 1;
        }
    }

    fn targets_satisfied(&self) -> bool {
        let total = self.targets.len();
        if total == 0 {
            return false;
        }
        let needed = match self.target_condition {
            TargetCondition::One => 1,
            TargetCondition::Count(n) => n.clamp(1, total),
            TargetCondition::All => total,
        };
        self.targets_reached >= needed
    }

    fn complete(&mut self, reason: StopReason) -> StepOutcome<N> {
        self.state = SolverState::Complete;
        self.report.stop_reason = Some(reason);
        tracing::debug!(
            frozen = self.report.frozen,
            stale_pops = self.report.stale_pops,
            last_value = self.report.last_value,
            reason = ?reason,
            "fast marching complete"
        );
        StepOutcome::Complete(reason)
    }

    /// Freeze the next node of the narrow band.
    ///
    /// Initializes the solver first if needed. Once complete, further calls
    /// return `Complete` and change nothing.
    ///
    /// # Errors
    /// Returns an initialization error if the solver was not yet initialized
    /// and its configuration is invalid.
    pub fn step(&mut self) -> Result<StepOutcome<N>> {
        match self.state {
            SolverState::NotInitialized => self.initialize()?,
            SolverState::Complete => {
                let reason = self
                    .report
                    .stop_reason
                    .unwrap_or(StopReason::NarrowBandEmpty);
                return Ok(StepOutcome::Complete(reason));
            }
            SolverState::Ready | SolverState::Running => {}
        }
        self.state = SolverState::Running;

        if self.targets_satisfied() {
            return Ok(self.complete(StopReason::TargetsReached));
        }

        let entry = loop {
            let Some(&top) = self.heap.peek() else {
                return Ok(self.complete(StopReason::NarrowBandEmpty));
            };
            if self.labels[top.flat] != NodeLabel::Trial || self.values[top.flat] != top.value {
                self.heap.pop();
                self.report.stale_pops += 1;
                tracing::trace!(flat = top.flat, value = top.value, "discarding stale entry");
                continue;
            }
            if self.stopping_value.is_some_and(|stop| top.value > stop) {
                return Ok(self.complete(StopReason::StoppingValueExceeded));
            }
            self.heap.pop();
            break top;
        };

        let idx = self.grid.flat_to_nd(entry.flat);
        self.labels[entry.flat] = NodeLabel::Frozen;
        self.record_freeze(entry.flat, entry.value);
        let front = Front {
            grid: &self.grid,
            labels: &self.labels,
            values: &self.values,
        };
        self.observer.on_freeze(&front, idx, entry.value);
        self.update_neighbors(idx);
        self.report_progress(entry.value);

        Ok(StepOutcome::Frozen {
            index: idx,
            value: entry.value,
        })
    }

    fn update_neighbors(&mut self, idx: [usize; N]) {
        for (_, _, n) in self.grid.neighbors(idx) {
            let flat = self.grid.nd_to_flat(n);
            let label = self.labels[flat];
            if matches!(label, NodeLabel::Frozen | NodeLabel::Forbidden) {
                continue;
            }
            let speed = self.grid.speed(n);
            if speed <= 0.0 {
                continue;
            }

            let candidate = {
                let grid = &self.grid;
                let labels = &self.labels;
                let values = &self.values;
                update_node(grid, n, self.normalization / speed, |m| {
                    let f = grid.nd_to_flat(m);
                    (labels[f] == NodeLabel::Frozen).then(|| values[f])
                })
            };

            let accepted = match label {
                NodeLabel::Far => true,
                NodeLabel::Trial => candidate < self.values[flat],
                NodeLabel::Frozen | NodeLabel::Forbidden => false,
            };
            if !accepted || !candidate.is_finite() {
                continue;
            }

            self.labels[flat] = NodeLabel::Trial;
            self.values[flat] = candidate;
            self.heap.push(TrialEntry {
                value: candidate,
                flat,
            });
            let front = Front {
                grid: &self.grid,
                labels: &self.labels,
                values: &self.values,
            };
            self.observer.on_trial_update(&front, n, candidate);
        }
    }

    fn report_progress(&mut self, current_value: f64) {
        let (Some(cb), Some(start)) = (self.progress_callback.as_mut(), self.start_time) else {
            return;
        };
        let elapsed = start.elapsed();
        if elapsed < self.last_progress + PROGRESS_INTERVAL {
            return;
        }
        self.last_progress = elapsed;
        cb(ProgressInfo {
            frozen: self.report.frozen,
            narrow_band: self.heap.len(),
            current_value,
            elapsed,
        });
    }

    /// Step until complete.
    ///
    /// # Errors
    /// Returns an initialization error if the configuration is invalid.
    pub fn run(&mut self) -> Result<SolveReport> {
        while let StepOutcome::Frozen { .. } = self.step()? {}
        Ok(self.report)
    }

    /// Consume the solver and return its outputs.
    pub fn into_output(self) -> MarchingOutput<N, O> {
        let labels = Image::from_grid_vec(&self.grid, self.labels);
        let arrival_time = Image::from_grid_vec(&self.grid, self.values);
        MarchingOutput {
            arrival_time,
            labels,
            observer: self.observer,
            report: self.report,
        }
    }
}

/// Options for [`solve`].
#[derive(Debug, Clone)]
pub struct SolveOptions<const N: usize> {
    /// Seed points and their initial arrival times.
    pub seeds: Vec<([usize; N], f64)>,
    /// Points that start in the narrow band with a provisional value.
    pub trial_points: Vec<([usize; N], f64)>,
    /// Points excluded from marching.
    pub forbidden: Vec<[usize; N]>,
    /// Row-major mask of excluded points.
    pub forbidden_mask: Option<Vec<bool>>,
    /// Stop once the smallest trial value exceeds this.
    pub stopping_value: Option<f64>,
    /// Stop once `target_condition` holds over these points.
    pub targets: Vec<[usize; N]>,
    /// How many targets must be frozen to stop.
    pub target_condition: TargetCondition,
    /// Speeds are divided by this factor.
    pub normalization_factor: f64,
    /// Produce the upwind gradient image.
    pub compute_gradient: bool,
    /// Keep the list of frozen nodes in freeze order.
    pub record_freeze_order: bool,
}

impl<const N: usize> Default for SolveOptions<N> {
    fn default() -> Self {
        SolveOptions {
            seeds: Vec::new(),
            trial_points: Vec::new(),
            forbidden: Vec::new(),
            forbidden_mask: None,
            stopping_value: None,
            targets: Vec::new(),
            target_condition: TargetCondition::All,
            normalization_factor: 1.0,
            compute_gradient: false,
            record_freeze_order: false,
        }
    }
}

/// Outputs of [`solve`].
#[derive(Debug, Clone)]
pub struct Solution<const N: usize> {
    /// Arrival times; [`UNREACHED`] where the front never arrived.
    pub arrival_time: Image<N, f64>,
    /// Final classification of every node.
    pub labels: Image<N, NodeLabel>,
    /// Upwind gradient, when requested; zero where undetermined.
    pub gradient: Option<Image<N, [f64; N]>>,
    /// Frozen nodes in freeze order, when requested.
    pub freeze_order: Option<Vec<([usize; N], f64)>>,
    /// Solve counters.
    pub report: SolveReport,
}

/// Run a complete fast marching solve over `grid`.
///
/// # Errors
/// Returns an error if the options are invalid (see [`FastMarching::initialize`]).
pub fn solve<const N: usize>(
    grid: CartesianGrid<N>,
    options: &SolveOptions<N>,
) -> Result<Solution<N>> {
    solve_with_progress(grid, options, None)
}

/// [`solve`] with an optional progress callback (see [`FastMarching::with_progress`]).
///
/// # Errors
/// Returns an error if the options are invalid (see [`FastMarching::initialize`]).
pub fn solve_with_progress<const N: usize>(
    grid: CartesianGrid<N>,
    options: &SolveOptions<N>,
    progress: Option<Box<dyn FnMut(ProgressInfo) + Send>>,
) -> Result<Solution<N>> {
    let gradient = options.compute_gradient.then(|| UpwindGradient::new(&grid));
    let recorder = options.record_freeze_order.then(FreezeRecorder::new);

    let mut solver = FastMarching::new(grid)
        .with_normalization_factor(options.normalization_factor)?
        .with_targets(options.targets.clone(), options.target_condition)
        .with_observer((gradient, recorder));
    if let Some(callback) = progress {
        solver = solver.with_progress(callback);
    }
    if let Some(mask) = &options.forbidden_mask {
        solver = solver.with_forbidden_mask(mask.clone())?;
    }
    if let Some(stop) = options.stopping_value {
        solver = solver.with_stopping_value(stop);
    }
    for &(idx, value) in &options.seeds {
        solver.add_seed_with_value(idx, value);
    }
    for &(idx, value) in &options.trial_points {
        solver.add_trial_point(idx, value);
    }
    for &idx in &options.forbidden {
        solver.add_forbidden(idx);
    }

    solver.run()?;
    let output = solver.into_output();
    let (gradient, recorder) = output.observer;
    Ok(Solution {
        arrival_time: output.arrival_time,
        labels: output.labels,
        gradient: gradient.map(UpwindGradient::into_image),
        freeze_order: recorder.map(FreezeRecorder::into_events),
        report: output.report,
    })
}
