use crate::oracle::OracleErrorPolicy;
use crate::PixelFloat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

pub const DEFAULT_MAX_QUERIES: usize = 10_000;
pub const DEFAULT_MAX_ITERATIONS: usize = 50;
pub const DEFAULT_NUM_EVALS: usize = 100;
pub const DEFAULT_INIT_EVALS: usize = 100;
pub const DEFAULT_INITIAL_DELTA: PixelFloat = 0.1;
pub const DEFAULT_BINARY_SEARCH_STEPS: usize = 10;

/// Attack parameters, fixed for the lifetime of an [`crate::Hsja`].
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HsjaConfig {
    /// Oracle calls allowed per attack, the final label check included.
    pub max_queries: usize,
    pub max_iterations: usize,
    /// Random directions per gradient estimate.
    pub num_evals: usize,
    /// Uniform draws tried while looking for a first adversarial point.
    pub init_evals: usize,
    pub clip_min: PixelFloat,
    pub clip_max: PixelFloat,
    /// Probe radius of the first gradient estimate.
    pub initial_delta: PixelFloat,
    pub binary_search_steps: usize,
    /// Send each gradient estimate's probes as one batch.
    pub batch_queries: bool,
    pub oracle_error_policy: OracleErrorPolicy,
}

impl Default for HsjaConfig {
    fn default() -> Self {
        Self {
            max_queries: DEFAULT_MAX_QUERIES,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            num_evals: DEFAULT_NUM_EVALS,
            init_evals: DEFAULT_INIT_EVALS,
            clip_min: 0.0,
            clip_max: 1.0,
            initial_delta: DEFAULT_INITIAL_DELTA,
            binary_search_steps: DEFAULT_BINARY_SEARCH_STEPS,
            batch_queries: false,
            oracle_error_policy: OracleErrorPolicy::default(),
        }
    }
}

impl HsjaConfig {
    /// # Errors
    /// If `json` is malformed or describes an invalid configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config.with_zero_counts_defaulted())
    }

    /// # Errors
    /// If the file cannot be read, or as for [`HsjaConfig::from_json_str`].
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    /// Zero iteration and evaluation counts mean "use the default".
    #[must_use]
    pub fn with_zero_counts_defaulted(mut self) -> Self {
        if self.max_iterations == 0 {
            self.max_iterations = DEFAULT_MAX_ITERATIONS;
        }
        if self.num_evals == 0 {
            self.num_evals = DEFAULT_NUM_EVALS;
        }
        if self.init_evals == 0 {
            self.init_evals = DEFAULT_INIT_EVALS;
        }
        self
    }

    /// # Errors
    /// If the clip range is empty or not finite, or the probe radius is not positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.clip_min.is_finite() || !self.clip_max.is_finite() {
            return Err(ConfigError::Invalid {
                field: "clip_min/clip_max",
                reason: "bounds must be finite".to_string(),
            });
        }
        if self.clip_min > self.clip_max {
            return Err(ConfigError::Invalid {
                field: "clip_min/clip_max",
                reason: format!("{} > {}", self.clip_min, self.clip_max),
            });
        }
        if !(self.initial_delta > 0.0) {
            return Err(ConfigError::Invalid {
                field: "initial_delta",
                reason: format!("{} is not positive", self.initial_delta),
            });
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Invalid { field: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "cannot read config: {}", err),
            Self::Json(err) => write!(f, "cannot parse config: {}", err),
            Self::Invalid { field, reason } => write!(f, "invalid {}: {}", field, reason),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Invalid { .. } => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}
