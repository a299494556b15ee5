// ─────────────────────────────────────────────────────────────────────
// Symmetroid Kernel — Node Discovery
// ─────────────────────────────────────────────────────────────────────
//! Candidate singular points → eigenvalue signature → classification.
//!
//! Candidates come from a `LocusSolver`: the Singular CAS adapter in
//! production, or any closure/fixed list for testing. Each candidate
//! lands in exactly one of the spectrahedral or symmetroid sets; no
//! deduplication happens here.

use symmetroid_pencil::Pencil;
use symmetroid_types::{NodeKind, Point, SingularNode, SymmetroidError, SymmetroidResult};

/// Trait for singular-locus backends.
pub trait LocusSolver: Send + Sync {
    /// Candidate singular points of det M = 0. An empty list means the
    /// locus has no real points; failures must be reported as errors.
    fn candidates(&self, pencil: &Pencil) -> SymmetroidResult<Vec<Point>>;
}

/// Locus solver returning a preset list of points.
#[derive(Debug, Clone, Default)]
pub struct FixedLocus {
    points: Vec<Point>,
}

impl FixedLocus {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }
}

impl LocusSolver for FixedLocus {
    fn candidates(&self, _pencil: &Pencil) -> SymmetroidResult<Vec<Point>> {
        Ok(self.points.clone())
    }
}

/// External locus solver that calls a function pointer.
type CandidatesFn = Box<dyn Fn(&Pencil) -> SymmetroidResult<Vec<Point>> + Send + Sync>;

pub struct ExternalLocus {
    candidates_fn: CandidatesFn,
}

impl ExternalLocus {
    pub fn new(
        candidates_fn: impl Fn(&Pencil) -> SymmetroidResult<Vec<Point>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            candidates_fn: Box::new(candidates_fn),
        }
    }
}

impl LocusSolver for ExternalLocus {
    fn candidates(&self, pencil: &Pencil) -> SymmetroidResult<Vec<Point>> {
        (self.candidates_fn)(pencil)
    }
}

/// Discovered nodes split by classification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeSets {
    pub spectrahedral: Vec<SingularNode>,
    pub symmetroid: Vec<SingularNode>,
}

impl NodeSets {
    pub fn push(&mut self, node: SingularNode) {
        match node.kind {
            NodeKind::Spectrahedral => self.spectrahedral.push(node),
            NodeKind::Symmetroid => self.symmetroid.push(node),
        }
    }

    pub fn total(&self) -> usize {
        self.spectrahedral.len() + self.symmetroid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Run `handler` and classify every candidate it returns.
///
/// Handler failures surface as `NodeDiscovery`; decomposition failures on
/// a candidate are fatal and propagate unchanged.
pub fn discover(pencil: &Pencil, handler: &dyn LocusSolver) -> SymmetroidResult<NodeSets> {
    let candidates = handler.candidates(pencil).map_err(|e| match e {
        SymmetroidError::NodeDiscovery(_) => e,
        other => SymmetroidError::NodeDiscovery(other.to_string()),
    })?;

    let mut sets = NodeSets::default();
    for (i, point) in candidates.into_iter().enumerate() {
        if !point.is_finite() {
            return Err(SymmetroidError::NodeDiscovery(format!(
                "candidate {} is not finite: {point}",
                i + 1
            )));
        }
        let signature = pencil.eigen_signature(&point)?;
        sets.push(SingularNode::new(point, signature));
    }

    log::info!(
        "node discovery: {} spectrahedral, {} symmetroid",
        sets.spectrahedral.len(),
        sets.symmetroid.len()
    );
    Ok(sets)
}
