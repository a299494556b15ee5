// ─────────────────────────────────────────────────────────────────────
// Symmetroid Kernel — SDP Solver Interface
// ─────────────────────────────────────────────────────────────────────
//! Semidefinite solver trait and closure-backed adapter.
//!
//! The solver minimizes cᵀ(x, y, z) subject to s·M(x, y, z) ⪰ 0, where
//! s = +1 for the PSD component and s = −1 for the NSD component. Any
//! conic solver can sit behind this trait: an embedded interior-point
//! implementation, a subprocess, or an RPC client.

use nalgebra::DMatrix;

use symmetroid_pencil::Pencil;
use symmetroid_types::{Component, Point, SymmetroidError, SymmetroidResult};

/// One sub-problem: minimize `objective · v` subject to `component` of M(v).
#[derive(Debug, Clone, Copy)]
pub struct SdpProblem<'a> {
    pub pencil: &'a Pencil,
    pub objective: [f64; 3],
    pub component: Component,
}

impl<'a> SdpProblem<'a> {
    pub fn new(pencil: &'a Pencil, objective: [f64; 3], component: Component) -> Self {
        Self {
            pencil,
            objective,
            component,
        }
    }

    /// s·M(point), the matrix constrained to be positive semidefinite.
    pub fn constraint_matrix(&self, point: &Point) -> DMatrix<f64> {
        self.pencil.evaluate(point) * self.component.sign()
    }
}

/// Terminal status of a sub-problem the sampler knows how to account for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SdpOutcome {
    /// Optimum attained at this point.
    Solved(Point),
    /// The component is empty.
    Infeasible,
    /// The objective decreases without bound over the component.
    Unbounded,
}

impl SdpOutcome {
    /// Map a solver status string onto an outcome.
    ///
    /// Accepts `optimal`/`solved`, `infeasible`, and `unbounded`
    /// (case-insensitive). Every other status, a solved status without a
    /// minimizer, or a non-finite minimizer is a `SolverStatus` error.
    pub fn from_status(
        component: Component,
        status: &str,
        minimizer: Option<Point>,
    ) -> SymmetroidResult<Self> {
        let status_err = |status: String| SymmetroidError::SolverStatus { component, status };
        match status.trim().to_ascii_lowercase().as_str() {
            "optimal" | "solved" => match minimizer {
                Some(p) if p.is_finite() => Ok(SdpOutcome::Solved(p)),
                Some(p) => Err(status_err(format!("solved with non-finite minimizer {p}"))),
                None => Err(status_err("solved without minimizer".to_string())),
            },
            "infeasible" => Ok(SdpOutcome::Infeasible),
            "unbounded" => Ok(SdpOutcome::Unbounded),
            other => Err(status_err(other.to_string())),
        }
    }

    pub fn is_solved(&self) -> bool {
        matches!(self, SdpOutcome::Solved(_))
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, SdpOutcome::Unbounded)
    }
}

/// Trait for SDP backends.
pub trait SdpSolver: Send + Sync {
    fn minimize(&self, problem: &SdpProblem<'_>) -> SymmetroidResult<SdpOutcome>;
}

/// External SDP backend that calls a function pointer.
///
/// Used to delegate solving to a host-provided optimizer while keeping
/// the sampling bookkeeping in Rust.
type MinimizeFn = Box<dyn Fn(&SdpProblem<'_>) -> SymmetroidResult<SdpOutcome> + Send + Sync>;

pub struct ExternalSdp {
    minimize_fn: MinimizeFn,
}

impl ExternalSdp {
    pub fn new(
        minimize_fn: impl Fn(&SdpProblem<'_>) -> SymmetroidResult<SdpOutcome> + Send + Sync + 'static,
    ) -> Self {
        Self {
            minimize_fn: Box::new(minimize_fn),
        }
    }
}

impl SdpSolver for ExternalSdp {
    fn minimize(&self, problem: &SdpProblem<'_>) -> SymmetroidResult<SdpOutcome> {
        (self.minimize_fn)(problem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pencil() -> Pencil {
        Pencil::from_row_slices(
            2,
            [
                &[1.0, 0.0, 0.0, 0.0],
                &[0.0, 0.0, 0.0, 1.0],
                &[0.0, 1.0, 1.0, 0.0],
                &[1.0, 0.0, 0.0, 1.0],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_from_status_solved() {
        let p = Point::new(1.0, 2.0, 3.0);
        let out = SdpOutcome::from_status(Component::Psd, "OPTIMAL", Some(p)).unwrap();
        assert_eq!(out, SdpOutcome::Solved(p));
        assert!(out.is_solved());
    }

    #[test]
    fn test_from_status_infeasible_unbounded() {
        assert_eq!(
            SdpOutcome::from_status(Component::Nsd, "infeasible", None).unwrap(),
            SdpOutcome::Infeasible
        );
        assert!(SdpOutcome::from_status(Component::Nsd, " Unbounded ", None)
            .unwrap()
            .is_unbounded());
    }

    #[test]
    fn test_from_status_other_is_error() {
        let err = SdpOutcome::from_status(Component::Psd, "optimal_inaccurate", None).unwrap_err();
        match err {
            SymmetroidError::SolverStatus { component, status } => {
                assert_eq!(component, Component::Psd);
                assert_eq!(status, "optimal_inaccurate");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_from_status_solved_without_point() {
        assert!(SdpOutcome::from_status(Component::Psd, "solved", None).is_err());
        let bad = Point::new(f64::NAN, 0.0, 0.0);
        assert!(SdpOutcome::from_status(Component::Psd, "solved", Some(bad)).is_err());
    }

    #[test]
    fn test_constraint_matrix_negated_for_nsd() {
        let pencil = pencil();
        let p = Point::new(1.0, 0.0, 0.0);
        let psd = SdpProblem::new(&pencil, [1.0, 0.0, 0.0], Component::Psd);
        let nsd = SdpProblem::new(&pencil, [1.0, 0.0, 0.0], Component::Nsd);
        assert_eq!(psd.constraint_matrix(&p), -nsd.constraint_matrix(&p));
        assert!((psd.constraint_matrix(&p)[(0, 0)] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_external_sdp() {
        let solver = ExternalSdp::new(|problem| match problem.component {
            Component::Psd => Ok(SdpOutcome::Solved(Point::new(0.0, 0.0, -1.0))),
            Component::Nsd => Ok(SdpOutcome::Infeasible),
        });
        let pencil = pencil();
        let psd = SdpProblem::new(&pencil, [0.0, 0.0, 1.0], Component::Psd);
        let nsd = SdpProblem::new(&pencil, [0.0, 0.0, 1.0], Component::Nsd);
        assert!(solver.minimize(&psd).unwrap().is_solved());
        assert_eq!(solver.minimize(&nsd).unwrap(), SdpOutcome::Infeasible);
    }
}
