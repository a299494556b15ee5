// ─────────────────────────────────────────────────────────────────────
// Symmetroid Kernel — Random Pencil Generation
// ─────────────────────────────────────────────────────────────────────

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use symmetroid_types::{StudyConfig, SymmetroidError, SymmetroidResult};

use crate::pencil::Pencil;

/// Random symmetric n×n matrix with integer entries in [-range, range].
pub fn random_symmetric<R: Rng + ?Sized>(n: usize, range: i64, rng: &mut R) -> DMatrix<f64> {
    let mut m = DMatrix::zeros(n, n);
    for i in 0..n {
        for j in i..n {
            let v = rng.gen_range(-range..=range) as f64;
            m[(i, j)] = v;
            m[(j, i)] = v;
        }
    }
    m
}

impl Pencil {
    /// Random integer A, B, C with D = I.
    pub fn random(n: usize, range: i64, seed: u64) -> SymmetroidResult<Self> {
        if n == 0 || range < 1 {
            return Err(SymmetroidError::Validation(format!(
                "random pencil needs n >= 1 and range >= 1, got n={n}, range={range}"
            )));
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let a = random_symmetric(n, range, &mut rng);
        let b = random_symmetric(n, range, &mut rng);
        let c = random_symmetric(n, range, &mut rng);
        log::debug!("generated random {n}x{n} pencil (seed {seed}, range ±{range})");
        Self::new(a, b, c, DMatrix::identity(n, n))
    }

    /// Random pencil sized and seeded from a study configuration.
    pub fn random_from_config(config: &StudyConfig) -> SymmetroidResult<Self> {
        config.validate()?;
        Self::random(config.dimension, config.integer_range, config.seed)
    }
}
