// ─────────────────────────────────────────────────────────────────────
// Symmetroid Kernel — Pencil Model
// ─────────────────────────────────────────────────────────────────────
//! M(x, y, z) = xA + yB + zC + D → signed eigenvalues via SVD phase.
//!
//! Singular values are magnitudes only. The sign of each eigenvalue is
//! recovered from the phase ⟨uᵢ, vᵢ⟩ of its left/right singular vector
//! pair, which is ±1 for a symmetric matrix with a simple singular value.
//! The SVD itself is assembled from a symmetric eigendecomposition, which
//! stays accurate when M is singular.
//! Clusters of equal singular values (e.g. eigenvalues +λ and −λ) are
//! resolved together: the k×k block Uᶜᵀ Vᶜ is symmetric with eigenvalues
//! ±1, and its inertia gives the signs for the whole cluster.

use std::cmp::Ordering;
use std::io::{self, Write};

use nalgebra::{DMatrix, DVector, SymmetricEigen};

use symmetroid_types::{EigenSignature, Point, SymmetroidError, SymmetroidResult};

/// Relative symmetry tolerance checked at construction.
const SYMMETRY_RTOL: f64 = 1e-9;

/// Singular values closer than this (relative to σ_max) share a sign cluster.
const CLUSTER_RTOL: f64 = 1e-9;

/// Matrix labels in pencil order.
pub const MATRIX_LABELS: [&str; 4] = ["A", "B", "C", "D"];

/// Immutable symmetric pencil (A, B, C, D).
#[derive(Debug, Clone, PartialEq)]
pub struct Pencil {
    n: usize,
    matrices: [DMatrix<f64>; 4],
}

impl Pencil {
    /// Build a pencil, validating shape and symmetry of all four matrices.
    pub fn new(
        a: DMatrix<f64>,
        b: DMatrix<f64>,
        c: DMatrix<f64>,
        d: DMatrix<f64>,
    ) -> SymmetroidResult<Self> {
        let n = a.nrows();
        let matrices = [a, b, c, d];
        for (label, m) in MATRIX_LABELS.iter().zip(matrices.iter()) {
            if m.nrows() != m.ncols() {
                return Err(SymmetroidError::Dimension(format!(
                    "{label} must be square, got {}x{}",
                    m.nrows(),
                    m.ncols()
                )));
            }
            if m.nrows() != n {
                return Err(SymmetroidError::Dimension(format!(
                    "{label} is {}x{} but A is {n}x{n}",
                    m.nrows(),
                    m.ncols()
                )));
            }
            if m.iter().any(|v| !v.is_finite()) {
                return Err(SymmetroidError::Validation(format!(
                    "{label} contains non-finite entries"
                )));
            }
            let scale = m.amax().max(1.0);
            for i in 0..n {
                for j in (i + 1)..n {
                    if (m[(i, j)] - m[(j, i)]).abs() > SYMMETRY_RTOL * scale {
                        return Err(SymmetroidError::Validation(format!(
                            "{label} is not symmetric at ({i}, {j}): {} != {}",
                            m[(i, j)],
                            m[(j, i)]
                        )));
                    }
                }
            }
        }
        Ok(Self { n, matrices })
    }

    /// Build from four row-major slices of length n².
    pub fn from_row_slices(n: usize, rows: [&[f64]; 4]) -> SymmetroidResult<Self> {
        for (label, r) in MATRIX_LABELS.iter().zip(rows.iter()) {
            if r.len() != n * n {
                return Err(SymmetroidError::Dimension(format!(
                    "{label} has {} entries, expected {}",
                    r.len(),
                    n * n
                )));
            }
        }
        Self::new(
            DMatrix::from_row_slice(n, n, rows[0]),
            DMatrix::from_row_slice(n, n, rows[1]),
            DMatrix::from_row_slice(n, n, rows[2]),
            DMatrix::from_row_slice(n, n, rows[3]),
        )
    }

    pub fn dimension(&self) -> usize {
        self.n
    }

    /// The matrices in order A, B, C, D.
    pub fn matrices(&self) -> &[DMatrix<f64>; 4] {
        &self.matrices
    }

    /// M(point) = xA + yB + zC + D.
    pub fn evaluate(&self, point: &Point) -> DMatrix<f64> {
        let [a, b, c, d] = &self.matrices;
        a * point.x() + b * point.y() + c * point.z() + d
    }

    /// Sign-corrected eigenvalues of M(point), descending by magnitude.
    pub fn eigen_signature(&self, point: &Point) -> SymmetroidResult<EigenSignature> {
        if !point.is_finite() {
            return Err(SymmetroidError::Numerical(format!(
                "non-finite evaluation point {point}"
            )));
        }
        signed_eigenvalues(&self.evaluate(point))
    }

    /// det M(point).
    pub fn determinant(&self, point: &Point) -> f64 {
        self.evaluate(point).determinant()
    }

    /// Print each matrix as rows, followed by its flattened row-major entries.
    pub fn write_params<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for (label, m) in MATRIX_LABELS.iter().zip(self.matrices.iter()) {
            writeln!(out, "{label}:")?;
            for i in 0..self.n {
                let row: Vec<String> = m.row(i).iter().map(|v| v.to_string()).collect();
                writeln!(out, "[{}]", row.join(" "))?;
            }
            let flat: Vec<String> = row_major(m).iter().map(|v| v.to_string()).collect();
            writeln!(out, "[{}]", flat.join(", "))?;
        }
        writeln!(out)
    }
}

/// Entries of `m` in row-major order.
pub fn row_major(m: &DMatrix<f64>) -> Vec<f64> {
    let mut out = Vec::with_capacity(m.len());
    for i in 0..m.nrows() {
        out.extend(m.row(i).iter().copied());
    }
    out
}

/// Phase ⟨uᵢ, vⱼ⟩ between a left and a right singular vector.
fn phase(u: &DMatrix<f64>, v_t: &DMatrix<f64>, i: usize, j: usize) -> f64 {
    u.column(i)
        .iter()
        .zip(v_t.row(j).iter())
        .map(|(a, b)| a * b)
        .sum()
}

/// Signed eigenvalues of a symmetric matrix, recovered from its SVD.
///
/// Ordered by descending singular value; inside a cluster of equal
/// magnitudes, positive eigenvalues come first.
pub fn signed_eigenvalues(matrix: &DMatrix<f64>) -> SymmetroidResult<EigenSignature> {
    if matrix.nrows() == 0 {
        return Ok(EigenSignature::default());
    }
    if matrix.iter().any(|v| !v.is_finite()) {
        return Err(SymmetroidError::Numerical(
            "matrix contains NaN/Inf".to_string(),
        ));
    }
    let (u, sigma, v_t) = symmetric_svd(matrix)?;
    signs_from_svd(&u, &sigma, &v_t)
}

/// SVD of a symmetric matrix assembled from M = W Λ Wᵀ:
/// U = W, Σ = |Λ|, V = W · sgn Λ.
///
/// The general bidiagonal `SVD` loses several digits on rank-deficient
/// input, and every node is rank-deficient.
fn symmetric_svd(
    matrix: &DMatrix<f64>,
) -> SymmetroidResult<(DMatrix<f64>, DVector<f64>, DMatrix<f64>)> {
    let n = matrix.nrows();
    let sym = (matrix + matrix.transpose()) * 0.5;
    let eig = SymmetricEigen::try_new(sym, f64::EPSILON, 0).ok_or_else(|| {
        SymmetroidError::Numerical("eigendecomposition failed to converge".to_string())
    })?;
    let w = eig.eigenvectors;
    let lambda = eig.eigenvalues;
    let sigma = lambda.map(f64::abs);
    let v_t = DMatrix::from_fn(n, n, |i, j| {
        let s = if lambda[i] < 0.0 { -1.0 } else { 1.0 };
        s * w[(j, i)]
    });
    Ok((w, sigma, v_t))
}

/// Signed eigenvalues from any SVD (U, Σ, Vᵀ) of a symmetric matrix.
///
/// Simple singular values take the sign of ⟨uᵢ, vᵢ⟩. Clusters of equal
/// singular values take the signs of the eigenvalues of the symmetrized
/// block Uᶜᵀ Vᶜ, positives first.
pub fn signs_from_svd(
    u: &DMatrix<f64>,
    sigma: &DVector<f64>,
    v_t: &DMatrix<f64>,
) -> SymmetroidResult<EigenSignature> {
    let n = sigma.len();
    if n == 0 {
        return Ok(EigenSignature::default());
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        sigma[b]
            .partial_cmp(&sigma[a])
            .unwrap_or(Ordering::Equal)
    });

    let sigma_max = sigma[order[0]];
    let cluster_tol = CLUSTER_RTOL * sigma_max.max(f64::MIN_POSITIVE);

    let mut values = Vec::with_capacity(n);
    let mut start = 0;
    while start < n {
        let lead = sigma[order[start]];
        let mut end = start + 1;
        while end < n && (lead - sigma[order[end]]).abs() <= cluster_tol {
            end += 1;
        }
        let cluster = &order[start..end];

        if cluster.len() == 1 {
            let i = cluster[0];
            let s = if phase(u, v_t, i, i) < 0.0 { -1.0 } else { 1.0 };
            values.push(s * sigma[i]);
        } else {
            let k = cluster.len();
            let block = DMatrix::from_fn(k, k, |r, c| {
                0.5 * (phase(u, v_t, cluster[r], cluster[c])
                    + phase(u, v_t, cluster[c], cluster[r]))
            });
            let eig = SymmetricEigen::try_new(block, f64::EPSILON, 0).ok_or_else(|| {
                SymmetroidError::Numerical("sign cluster eigensolve failed".to_string())
            })?;
            let mut signs: Vec<f64> = eig
                .eigenvalues
                .iter()
                .map(|&p| if p < 0.0 { -1.0 } else { 1.0 })
                .collect();
            signs.sort_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));
            for (s, &i) in signs.iter().zip(cluster.iter()) {
                values.push(s * sigma[i]);
            }
        }
        start = end;
    }

    Ok(EigenSignature(values))
}
