// ─────────────────────────────────────────────────────────────────────
// Symmetroid Kernel — Study Configuration
// ─────────────────────────────────────────────────────────────────────

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{SymmetroidError, SymmetroidResult};

/// Distribution of the random linear objective c drawn per trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveDistribution {
    /// Each coefficient uniform in [0, 1).
    #[default]
    UnitCube,
    /// Uniform direction on the unit sphere S².
    Sphere,
}

/// External locus solver (computer-algebra process) settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocusConfig {
    /// Executable to spawn.
    /// Default: "Singular".
    pub program: String,

    /// Extra arguments placed before the staged script path.
    /// Default: ["-q"] (suppress banner).
    pub args: Vec<String>,

    /// Script template file. `None` uses the built-in template.
    pub template: Option<PathBuf>,

    /// Kill the process and fail discovery after this many milliseconds.
    /// Default: 60000.
    pub timeout_ms: u64,
}

impl Default for LocusConfig {
    fn default() -> Self {
        Self {
            program: "Singular".to_string(),
            args: vec!["-q".to_string()],
            template: None,
            timeout_ms: 60_000,
        }
    }
}

/// Runtime configuration for a symmetroid study.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
    /// Matrix dimension n for randomly generated pencils.
    /// Default: 5.
    pub dimension: usize,

    /// Relative clustering tolerance; scaled by the largest node norm.
    /// Default: 1e-3.
    pub tolerance: f64,

    /// Objective coefficient distribution.
    /// Default: unit cube.
    pub objective: ObjectiveDistribution,

    /// Seed for the sampling RNG (and random pencil generation).
    /// Default: 42.
    pub seed: u64,

    /// Worker threads used by parallel sampling.
    /// Default: 1 (sequential).
    pub workers: usize,

    /// Random matrix entries are integers drawn from [-integer_range, integer_range].
    /// Default: 10.
    pub integer_range: i64,

    pub locus: LocusConfig,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            dimension: 5,
            tolerance: 1e-3,
            objective: ObjectiveDistribution::UnitCube,
            seed: 42,
            workers: 1,
            integer_range: 10,
            locus: LocusConfig::default(),
        }
    }
}

impl StudyConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> SymmetroidResult<()> {
        if self.dimension < 1 {
            return Err(SymmetroidError::Config(format!(
                "dimension must be >= 1, got {}",
                self.dimension
            )));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(SymmetroidError::Config(format!(
                "tolerance must be finite and >= 0, got {}",
                self.tolerance
            )));
        }
        if self.workers < 1 {
            return Err(SymmetroidError::Config(format!(
                "workers must be >= 1, got {}",
                self.workers
            )));
        }
        if self.integer_range < 1 {
            return Err(SymmetroidError::Config(format!(
                "integer_range must be >= 1, got {}",
                self.integer_range
            )));
        }
        if self.locus.program.trim().is_empty() {
            return Err(SymmetroidError::Config(
                "locus.program must not be empty".to_string(),
            ));
        }
        if self.locus.timeout_ms == 0 {
            return Err(SymmetroidError::Config(
                "locus.timeout_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Load from JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> SymmetroidResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SymmetroidError::Config(format!("JSON parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}
