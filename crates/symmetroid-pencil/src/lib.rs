// ─────────────────────────────────────────────────────────────────────
// Symmetroid Kernel — Pencil Model
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Symmetric matrix pencil M(x, y, z) = xA + yB + zC + D.
//!
//! - Pencil: validated (A, B, C, D), evaluation, determinant, parameter dump
//! - Signature: SVD-based signed eigenvalues with phase sign correction
//! - Random: seeded integer pencils with D = I

pub mod pencil;
pub mod random;

pub use pencil::{row_major, signed_eigenvalues, Pencil, MATRIX_LABELS};
pub use random::random_symmetric;
