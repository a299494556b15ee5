// ─────────────────────────────────────────────────────────────────────
// Symmetroid Kernel — Error Hierarchy
// ─────────────────────────────────────────────────────────────────────

use thiserror::Error;

use crate::node::Component;

/// Root error type for all Symmetroid Kernel failures.
#[derive(Error, Debug)]
pub enum SymmetroidError {
    /// Locus solver invocation or output parsing failed.
    ///
    /// Never collapsed into an empty node set: zero singular points is a
    /// legitimate geometric outcome and must stay distinguishable.
    #[error("node discovery error: {0}")]
    NodeDiscovery(String),

    /// An SDP sub-problem reported a status outside solved/infeasible/unbounded.
    #[error("solver status error ({component} component): {status}")]
    SolverStatus { component: Component, status: String },

    /// Pencil matrices disagree in shape.
    #[error("dimension error: {0}")]
    Dimension(String),

    /// Invalid input (asymmetric matrix, malformed point).
    #[error("validation error: {0}")]
    Validation(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Numerical error (NaN/Inf in computation, failed decomposition).
    #[error("numerical error: {0}")]
    Numerical(String),

    /// Report or parameter sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SymmetroidError {
    /// True for errors the sampler recovers from by skipping one sub-problem.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SymmetroidError::SolverStatus { .. })
    }
}

pub type SymmetroidResult<T> = Result<T, SymmetroidError>;
