// ─────────────────────────────────────────────────────────────────────
// Symmetroid Kernel — Randomized SDP Sampler
// ─────────────────────────────────────────────────────────────────────
//! Random linear objectives minimized over the PSD and NSD components.
//!
//! # Invariants
//!
//! 1. **Component latches are monotone**: once a sub-problem reports
//!    infeasible, its component is skipped for the rest of the run. A
//!    latch only ever moves true → false; merges use "false wins".
//!
//! 2. **Trials count attempts**: `trials` grows by `n` per call no matter
//!    how many sub-problems solved, failed, or were skipped.
//!
//! 3. **Solver failures are local**: a status outside
//!    solved/infeasible/unbounded drops that sub-problem's contribution
//!    for the current trial only.
//!
//! 4. **Same-trial pairing**: "fully bounded" and "fully unbounded"
//!    require both sub-problems to have been attempted in the same trial.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, UnitSphere};

use symmetroid_pencil::Pencil;
use symmetroid_types::{Component, ObjectiveDistribution, Point, RawMinimum};

use crate::solver::{SdpOutcome, SdpProblem, SdpSolver};

/// Accumulated sampling statistics and the raw-minima buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingState {
    /// Trials attempted (denominator for all probabilities).
    pub trials: u64,
    /// PSD sub-problems that solved.
    pub psd_solved: u64,
    /// NSD sub-problems that solved.
    pub nsd_solved: u64,
    /// Trials where both components attained a minimum.
    pub fully_bounded_directions: u64,
    /// Trials where both components were unbounded.
    pub fully_unbounded_directions: u64,
    /// Sub-problems dropped for an unrecognized solver status.
    pub solver_failures: u64,
    psd_component_exists: bool,
    nsd_component_exists: bool,
    minima: Vec<RawMinimum>,
}

impl Default for SamplingState {
    fn default() -> Self {
        Self {
            trials: 0,
            psd_solved: 0,
            nsd_solved: 0,
            fully_bounded_directions: 0,
            fully_unbounded_directions: 0,
            solver_failures: 0,
            psd_component_exists: true,
            nsd_component_exists: true,
            minima: Vec::new(),
        }
    }
}

impl SamplingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn component_exists(&self, component: Component) -> bool {
        match component {
            Component::Psd => self.psd_component_exists,
            Component::Nsd => self.nsd_component_exists,
        }
    }

    pub fn psd_component_exists(&self) -> bool {
        self.psd_component_exists
    }

    pub fn nsd_component_exists(&self) -> bool {
        self.nsd_component_exists
    }

    /// Mark `component` infeasible. Irreversible.
    pub fn latch(&mut self, component: Component) {
        let flag = match component {
            Component::Psd => &mut self.psd_component_exists,
            Component::Nsd => &mut self.nsd_component_exists,
        };
        if *flag {
            log::info!("{component} component infeasible; skipping it from now on");
        }
        *flag = false;
    }

    /// Raw minima not yet clustered.
    pub fn minima(&self) -> &[RawMinimum] {
        &self.minima
    }

    pub fn has_pending_minima(&self) -> bool {
        !self.minima.is_empty()
    }

    pub fn push_minimum(&mut self, trial: u64, point: Point) {
        self.minima.push(RawMinimum { trial, point });
    }

    /// Remove and return the raw minima, leaving the buffer empty.
    pub fn take_minima(&mut self) -> Vec<RawMinimum> {
        std::mem::take(&mut self.minima)
    }

    /// Fold another state into this one: counters add, latches use
    /// "false wins", minima concatenate.
    pub fn merge(&mut self, other: SamplingState) {
        self.trials += other.trials;
        self.psd_solved += other.psd_solved;
        self.nsd_solved += other.nsd_solved;
        self.fully_bounded_directions += other.fully_bounded_directions;
        self.fully_unbounded_directions += other.fully_unbounded_directions;
        self.solver_failures += other.solver_failures;
        self.psd_component_exists &= other.psd_component_exists;
        self.nsd_component_exists &= other.nsd_component_exists;
        self.minima.extend(other.minima);
    }

    /// Fraction of trials with both components bounded (0 when no trials).
    pub fn fully_bounded_fraction(&self) -> f64 {
        ratio(self.fully_bounded_directions, self.trials)
    }

    /// Fraction of trials with both components unbounded (0 when no trials).
    pub fn fully_unbounded_fraction(&self) -> f64 {
        ratio(self.fully_unbounded_directions, self.trials)
    }
}

fn ratio(count: u64, trials: u64) -> f64 {
    if trials == 0 {
        return 0.0;
    }
    count as f64 / trials as f64
}

/// Bookkeeping target for one trial. Implemented by the owned state and
/// by the shared state used from worker threads.
trait TrialSink {
    fn component_exists(&self, component: Component) -> bool;
    fn latch(&mut self, component: Component);
    fn record_solved(&mut self, component: Component, trial: u64, point: Point);
    fn record_fully_bounded(&mut self);
    fn record_fully_unbounded(&mut self);
    fn record_failure(&mut self);
}

impl TrialSink for SamplingState {
    fn component_exists(&self, component: Component) -> bool {
        SamplingState::component_exists(self, component)
    }

    fn latch(&mut self, component: Component) {
        SamplingState::latch(self, component)
    }

    fn record_solved(&mut self, component: Component, trial: u64, point: Point) {
        match component {
            Component::Psd => self.psd_solved += 1,
            Component::Nsd => self.nsd_solved += 1,
        }
        self.push_minimum(trial, point);
    }

    fn record_fully_bounded(&mut self) {
        self.fully_bounded_directions += 1;
    }

    fn record_fully_unbounded(&mut self) {
        self.fully_unbounded_directions += 1;
    }

    fn record_failure(&mut self) {
        self.solver_failures += 1;
    }
}

/// Lock-free counters and "false wins" latches shared across workers.
struct SharedState {
    psd_exists: AtomicBool,
    nsd_exists: AtomicBool,
    psd_solved: AtomicU64,
    nsd_solved: AtomicU64,
    fully_bounded: AtomicU64,
    fully_unbounded: AtomicU64,
    failures: AtomicU64,
    minima: Mutex<Vec<RawMinimum>>,
}

impl SharedState {
    fn from_state(state: &SamplingState) -> Self {
        Self {
            psd_exists: AtomicBool::new(state.psd_component_exists),
            nsd_exists: AtomicBool::new(state.nsd_component_exists),
            psd_solved: AtomicU64::new(0),
            nsd_solved: AtomicU64::new(0),
            fully_bounded: AtomicU64::new(0),
            fully_unbounded: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            minima: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of everything recorded by the workers, with `trials` unset.
    fn into_delta(self) -> SamplingState {
        SamplingState {
            trials: 0,
            psd_solved: self.psd_solved.into_inner(),
            nsd_solved: self.nsd_solved.into_inner(),
            fully_bounded_directions: self.fully_bounded.into_inner(),
            fully_unbounded_directions: self.fully_unbounded.into_inner(),
            solver_failures: self.failures.into_inner(),
            psd_component_exists: self.psd_exists.into_inner(),
            nsd_component_exists: self.nsd_exists.into_inner(),
            minima: self.minima.into_inner(),
        }
    }

    fn flag(&self, component: Component) -> &AtomicBool {
        match component {
            Component::Psd => &self.psd_exists,
            Component::Nsd => &self.nsd_exists,
        }
    }
}

/// Per-worker handle onto the shared state.
struct SharedView<'s>(&'s SharedState);

impl TrialSink for SharedView<'_> {
    fn component_exists(&self, component: Component) -> bool {
        self.0.flag(component).load(Ordering::SeqCst)
    }

    fn latch(&mut self, component: Component) {
        // Only ever store false: a concurrent observer can never revive it.
        if self.0.flag(component).swap(false, Ordering::SeqCst) {
            log::info!("{component} component infeasible; skipping it from now on");
        }
    }

    fn record_solved(&mut self, component: Component, trial: u64, point: Point) {
        match component {
            Component::Psd => self.0.psd_solved.fetch_add(1, Ordering::Relaxed),
            Component::Nsd => self.0.nsd_solved.fetch_add(1, Ordering::Relaxed),
        };
        self.0.minima.lock().push(RawMinimum { trial, point });
    }

    fn record_fully_bounded(&mut self) {
        self.0.fully_bounded.fetch_add(1, Ordering::Relaxed);
    }

    fn record_fully_unbounded(&mut self) {
        self.0.fully_unbounded.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failure(&mut self) {
        self.0.failures.fetch_add(1, Ordering::Relaxed);
    }
}

/// Draw one objective vector c.
pub fn draw_objective<R: Rng + ?Sized>(distribution: ObjectiveDistribution, rng: &mut R) -> [f64; 3] {
    match distribution {
        ObjectiveDistribution::UnitCube => [rng.gen::<f64>(), rng.gen::<f64>(), rng.gen::<f64>()],
        ObjectiveDistribution::Sphere => UnitSphere.sample(rng),
    }
}

/// Runs randomized minimization trials against one pencil.
pub struct Sampler<'a> {
    pencil: &'a Pencil,
    solver: &'a dyn SdpSolver,
    distribution: ObjectiveDistribution,
}

impl<'a> Sampler<'a> {
    pub fn new(
        pencil: &'a Pencil,
        solver: &'a dyn SdpSolver,
        distribution: ObjectiveDistribution,
    ) -> Self {
        Self {
            pencil,
            solver,
            distribution,
        }
    }

    /// Run `n` trials sequentially and return the updated state.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        mut state: SamplingState,
        n: u64,
        rng: &mut R,
    ) -> SamplingState {
        let first = state.trials;
        for i in 0..n {
            let objective = draw_objective(self.distribution, rng);
            self.run_trial(&mut state, first + i, objective);
        }
        state.trials += n;
        log::debug!(
            "sampled {n} trials: {} trials total, {} pending minima",
            state.trials,
            state.minima.len()
        );
        state
    }

    /// Run `n` trials across `workers` scoped threads.
    ///
    /// Worker `w` draws objectives from `StdRng::seed_from_u64(seed + w·φ)`,
    /// so results are reproducible for a fixed (seed, workers) pair. The
    /// order of the appended minima depends on scheduling.
    pub fn sample_parallel(
        &self,
        mut state: SamplingState,
        n: u64,
        workers: usize,
        seed: u64,
    ) -> SamplingState {
        let workers = (workers.max(1) as u64).min(n.max(1));
        if workers == 1 {
            let mut rng = StdRng::seed_from_u64(seed);
            return self.sample(state, n, &mut rng);
        }

        let shared = SharedState::from_state(&state);
        let first = state.trials;
        std::thread::scope(|scope| {
            for w in 0..workers {
                let quota = n / workers + u64::from(w < n % workers);
                // Worker w owns a contiguous block of trial indices.
                let start = first + w * (n / workers) + w.min(n % workers);
                let shared = &shared;
                scope.spawn(move || {
                    let mut rng =
                        StdRng::seed_from_u64(seed.wrapping_add(w.wrapping_mul(0x9E37_79B9_7F4A_7C15)));
                    let mut view = SharedView(shared);
                    for i in 0..quota {
                        let objective = draw_objective(self.distribution, &mut rng);
                        self.run_trial(&mut view, start + i, objective);
                    }
                });
            }
        });

        let mut delta = shared.into_delta();
        delta.trials = n;
        state.merge(delta);
        log::debug!(
            "sampled {n} trials on {workers} workers: {} trials total",
            state.trials
        );
        state
    }

    /// Attempt one component if it is still believed to exist.
    ///
    /// Returns `None` when skipped or when the solver failed.
    fn attempt<S: TrialSink>(
        &self,
        sink: &mut S,
        component: Component,
        trial: u64,
        objective: [f64; 3],
    ) -> Option<SdpOutcome> {
        if !sink.component_exists(component) {
            return None;
        }
        let problem = SdpProblem::new(self.pencil, objective, component);
        match self.solver.minimize(&problem) {
            Ok(SdpOutcome::Solved(point)) if !point.is_finite() => {
                log::warn!("{component} solver returned non-finite minimizer {point}; trial skipped");
                sink.record_failure();
                None
            }
            Ok(outcome) => {
                match outcome {
                    SdpOutcome::Solved(point) => sink.record_solved(component, trial, point),
                    SdpOutcome::Infeasible => sink.latch(component),
                    SdpOutcome::Unbounded => {}
                }
                Some(outcome)
            }
            Err(e) if e.is_recoverable() => {
                log::warn!("{e}; trial skipped");
                sink.record_failure();
                None
            }
            Err(e) => {
                log::error!("{component} solver failed: {e}; trial skipped");
                sink.record_failure();
                None
            }
        }
    }

    fn run_trial<S: TrialSink>(&self, sink: &mut S, trial: u64, objective: [f64; 3]) {
        let psd = self.attempt(sink, Component::Psd, trial, objective);
        let nsd = self.attempt(sink, Component::Nsd, trial, objective);

        match (psd, nsd) {
            (Some(SdpOutcome::Solved(_)), Some(SdpOutcome::Solved(_))) => {
                sink.record_fully_bounded()
            }
            (Some(SdpOutcome::Unbounded), Some(SdpOutcome::Unbounded)) => {
                sink.record_fully_unbounded()
            }
            _ => {}
        }
    }
}
