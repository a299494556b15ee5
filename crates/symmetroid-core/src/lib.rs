// ─────────────────────────────────────────────────────────────────────
// Symmetroid Kernel — Core Engine
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Node discovery, randomized SDP sampling, clustering, and ranking for
//! the singular locus of det(xA + yB + zC + D) = 0.
//!
//! # Invariants
//!
//! 1. **Exclusive classification**: every discovered point lands in
//!    exactly one of the spectrahedral or symmetroid sets.
//!
//! 2. **Monotone component latches**: a component proven infeasible is
//!    never attempted again in the same study, across threads included.
//!
//! 3. **Probabilities never fail**: occurrence / trials, and 0 when no
//!    trials have run.
//!
//! 4. **Scoped staging**: the locus script lives in a temp file removed
//!    on every return path.

pub mod cluster;
pub mod discovery;
pub mod report;
pub mod sampler;
pub mod singular;
pub mod solver;
pub mod study;

pub use cluster::{ClusterMatcher, MatchStats};
pub use discovery::{discover, ExternalLocus, FixedLocus, LocusSolver, NodeSets};
pub use report::write_report;
pub use sampler::{draw_objective, Sampler, SamplingState};
pub use singular::{parse_output, render_template, SingularLocus, DEFAULT_TEMPLATE};
pub use solver::{ExternalSdp, SdpOutcome, SdpProblem, SdpSolver};
pub use study::SymmetroidStudy;
