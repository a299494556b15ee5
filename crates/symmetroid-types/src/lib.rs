// ─────────────────────────────────────────────────────────────────────
// Symmetroid Kernel — Types
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Type definitions, configuration, and error hierarchy shared by the
//! pencil model and the node-sampling engine.

pub mod config;
pub mod error;
pub mod node;

pub use config::{LocusConfig, ObjectiveDistribution, StudyConfig};
pub use error::{SymmetroidError, SymmetroidResult};
pub use node::{
    Component, EigenSignature, NodeKind, Point, ProcessedNode, RankedNode, RawMinimum,
    SingularNode,
};
