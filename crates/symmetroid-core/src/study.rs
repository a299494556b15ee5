// ─────────────────────────────────────────────────────────────────────
// Symmetroid Kernel — Study Orchestrator
// ─────────────────────────────────────────────────────────────────────
//! Owns the pencil, the injected locus/SDP solvers, and the run state.
//!
//! Pipeline: discover → sample (repeatable) → process → rank → report.
//! `rank()` and `report()` run the missing steps themselves: discovery
//! when no nodes are known, and clustering when raw minima are pending.

use std::io::Write;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use symmetroid_pencil::Pencil;
use symmetroid_types::{
    ProcessedNode, RankedNode, StudyConfig, SymmetroidError, SymmetroidResult,
};

use crate::cluster::{ClusterMatcher, MatchStats};
use crate::discovery::{self, LocusSolver, NodeSets};
use crate::report::write_report;
use crate::sampler::{Sampler, SamplingState};
use crate::singular::SingularLocus;
use crate::solver::SdpSolver;

/// One pencil under study.
pub struct SymmetroidStudy {
    config: StudyConfig,
    pencil: Pencil,
    locus: Arc<dyn LocusSolver>,
    solver: Arc<dyn SdpSolver>,
    rng: StdRng,
    nodes: Option<NodeSets>,
    processed: Vec<ProcessedNode>,
    state: SamplingState,
    ranking: Option<Vec<RankedNode>>,
}

impl SymmetroidStudy {
    pub fn new(
        config: StudyConfig,
        pencil: Pencil,
        locus: Arc<dyn LocusSolver>,
        solver: Arc<dyn SdpSolver>,
    ) -> SymmetroidResult<Self> {
        config.validate()?;
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self {
            config,
            pencil,
            locus,
            solver,
            rng,
            nodes: None,
            processed: Vec::new(),
            state: SamplingState::new(),
            ranking: None,
        })
    }

    /// Study backed by the Singular locus solver from `config.locus`.
    pub fn with_singular(
        config: StudyConfig,
        pencil: Pencil,
        solver: Arc<dyn SdpSolver>,
    ) -> SymmetroidResult<Self> {
        let locus = Arc::new(SingularLocus::new(config.locus.clone()));
        Self::new(config, pencil, locus, solver)
    }

    /// Study of a random integer pencil sized and seeded by `config`.
    pub fn random(config: StudyConfig, solver: Arc<dyn SdpSolver>) -> SymmetroidResult<Self> {
        let pencil = Pencil::random_from_config(&config)?;
        Self::with_singular(config, pencil, solver)
    }

    /// Run node discovery with the configured locus solver.
    pub fn discover(&mut self) -> SymmetroidResult<&NodeSets> {
        let locus = Arc::clone(&self.locus);
        self.discover_with(locus.as_ref())
    }

    /// Run node discovery with an explicit handler.
    ///
    /// Replaces any earlier node sets and resets every occurrence count.
    pub fn discover_with(&mut self, handler: &dyn LocusSolver) -> SymmetroidResult<&NodeSets> {
        let sets = discovery::discover(&self.pencil, handler)?;
        self.processed = sets
            .spectrahedral
            .iter()
            .cloned()
            .map(ProcessedNode::new)
            .collect();
        self.ranking = None;
        Ok(self.nodes.insert(sets))
    }

    fn ensure_discovered(&mut self) -> SymmetroidResult<()> {
        if self.nodes.is_none() {
            self.discover()?;
        }
        Ok(())
    }

    /// Run `n` more trials. Uses `config.workers` threads when > 1.
    pub fn sample(&mut self, n: u64) -> &SamplingState {
        let sampler = Sampler::new(&self.pencil, self.solver.as_ref(), self.config.objective);
        let state = std::mem::take(&mut self.state);
        self.state = if self.config.workers > 1 {
            let seed = self.rng.gen::<u64>();
            sampler.sample_parallel(state, n, self.config.workers, seed)
        } else {
            sampler.sample(state, n, &mut self.rng)
        };
        self.ranking = None;
        &self.state
    }

    /// Cluster pending minima onto the spectrahedral nodes.
    pub fn process(&mut self, tolerance: f64) -> SymmetroidResult<MatchStats> {
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(SymmetroidError::Validation(format!(
                "tolerance must be finite and >= 0, got {tolerance}"
            )));
        }
        self.ensure_discovered()?;
        let mut minima = self.state.take_minima();
        let stats = ClusterMatcher::new(tolerance).match_minima(&mut self.processed, &mut minima);
        self.ranking = None;
        Ok(stats)
    }

    /// Spectrahedral nodes by descending probability (stable on ties).
    pub fn rank(&mut self) -> SymmetroidResult<&[RankedNode]> {
        self.ensure_discovered()?;
        if self.state.has_pending_minima() {
            self.process(self.config.tolerance)?;
        }
        let ranking = match self.ranking.take() {
            Some(ranking) => ranking,
            None => self.compute_ranking(),
        };
        Ok(self.ranking.insert(ranking).as_slice())
    }

    fn compute_ranking(&self) -> Vec<RankedNode> {
        let trials = self.state.trials;
        let mut ranking: Vec<RankedNode> = self
            .processed
            .iter()
            .map(|p| RankedNode {
                point: p.node.point,
                probability: p.probability(trials),
                signature: p.node.signature.clone(),
            })
            .collect();
        ranking.sort_by(|a, b| b.probability.total_cmp(&a.probability));
        log::debug!("ranked {} nodes over {trials} trials", ranking.len());
        ranking
    }

    /// Rank (if needed) and write the text report.
    pub fn report<W: Write + ?Sized>(&mut self, out: &mut W) -> SymmetroidResult<()> {
        self.rank()?;
        let empty = NodeSets::default();
        let nodes = self.nodes.as_ref().unwrap_or(&empty);
        let ranking = self.ranking.as_deref().unwrap_or(&[]);
        write_report(out, nodes, ranking, &self.state)
    }

    /// Dump the pencil matrices.
    pub fn write_params<W: Write>(&self, out: &mut W) -> SymmetroidResult<()> {
        self.pencil.write_params(out)?;
        Ok(())
    }

    pub fn config(&self) -> &StudyConfig {
        &self.config
    }

    pub fn pencil(&self) -> &Pencil {
        &self.pencil
    }

    pub fn state(&self) -> &SamplingState {
        &self.state
    }

    pub fn nodes(&self) -> Option<&NodeSets> {
        self.nodes.as_ref()
    }

    pub fn processed(&self) -> &[ProcessedNode] {
        &self.processed
    }

    pub fn is_discovered(&self) -> bool {
        self.nodes.is_some()
    }
}
