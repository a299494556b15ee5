// ─────────────────────────────────────────────────────────────────────
// Symmetroid Kernel — Point, Signature, and Node Types
// ─────────────────────────────────────────────────────────────────────

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of leading eigenvalues inspected when classifying a node.
pub const CLASSIFY_LEADING: usize = 3;

/// A parameter point (x, y, z) of the pencil.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point(pub [f64; 3]);

impl Point {
    pub const ORIGIN: Point = Point([0.0; 3]);

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self([x, y, z])
    }

    pub fn x(&self) -> f64 {
        self.0[0]
    }

    pub fn y(&self) -> f64 {
        self.0[1]
    }

    pub fn z(&self) -> f64 {
        self.0[2]
    }

    /// Euclidean (L2) norm.
    pub fn norm(&self) -> f64 {
        self.0.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Point) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

impl From<[f64; 3]> for Point {
    fn from(v: [f64; 3]) -> Self {
        Self(v)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.0[0], self.0[1], self.0[2])
    }
}

/// Sign-corrected eigenvalues of M(point), ordered by descending magnitude.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EigenSignature(pub Vec<f64>);

impl EigenSignature {
    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Leading eigenvalues all ≥ 0 or all ≤ 0.
    ///
    /// Only the first `CLASSIFY_LEADING` entries are inspected; a zero counts
    /// for both signs.
    pub fn is_semidefinite(&self) -> bool {
        let lead = &self.0[..self.0.len().min(CLASSIFY_LEADING)];
        lead.iter().all(|&e| e >= 0.0) || lead.iter().all(|&e| e <= 0.0)
    }
}

impl fmt::Display for EigenSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v:.8e}")?;
        }
        write!(f, "]")
    }
}

/// Which semidefinite component a sub-problem targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Component {
    /// M(v) ⪰ 0.
    Psd,
    /// −M(v) ⪰ 0.
    Nsd,
}

impl Component {
    /// Multiplier applied to M(v) before the ⪰ 0 constraint.
    pub fn sign(&self) -> f64 {
        match self {
            Component::Psd => 1.0,
            Component::Nsd => -1.0,
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Psd => write!(f, "PSD"),
            Component::Nsd => write!(f, "NSD"),
        }
    }
}

/// Classification of a singular point by eigenvalue sign pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Same-sign leading eigenvalues: lies on a semidefinite component.
    Spectrahedral,
    /// Mixed-sign eigenvalues.
    Symmetroid,
}

impl NodeKind {
    pub fn classify(signature: &EigenSignature) -> Self {
        if signature.is_semidefinite() {
            NodeKind::Spectrahedral
        } else {
            NodeKind::Symmetroid
        }
    }
}

/// A discovered singular point with its eigenvalue signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingularNode {
    pub point: Point,
    pub signature: EigenSignature,
    pub kind: NodeKind,
}

impl SingularNode {
    pub fn new(point: Point, signature: EigenSignature) -> Self {
        let kind = NodeKind::classify(&signature);
        Self {
            point,
            signature,
            kind,
        }
    }
}

/// A spectrahedral node together with its sampled occurrence count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedNode {
    pub node: SingularNode,
    pub occurrences: u64,
}

impl ProcessedNode {
    pub fn new(node: SingularNode) -> Self {
        Self {
            node,
            occurrences: 0,
        }
    }

    /// occurrences / trials, or 0 when no trials were run.
    pub fn probability(&self, trials: u64) -> f64 {
        if trials == 0 {
            return 0.0;
        }
        self.occurrences as f64 / trials as f64
    }
}

/// Minimizer of one solved sub-problem, tagged with the trial that
/// produced it. A trial yields at most two (PSD and NSD).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawMinimum {
    pub trial: u64,
    pub point: Point,
}

/// One row of the probability ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedNode {
    pub point: Point,
    pub probability: f64,
    pub signature: EigenSignature,
}
