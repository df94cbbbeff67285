#![allow(clippy::must_use_candidate)]
//! Label-only HopSkipJump boundary attacks.
//!
//! The attack only ever sees the top-1 label a classifier returns for an input. It walks an
//! adversarial point along the decision boundary towards the original sample, and the final
//! L2 distance is the quantity used for membership inference.
extern crate ndarray;
extern crate ndarray_rand;
extern crate ndarray_stats;
extern crate rand;

pub mod config;
pub mod distance;
pub mod geometry;
pub mod hsja;
pub mod logging;
pub mod membership;
pub mod noise;
pub mod oracle;
pub mod runner;
pub mod sample;
pub mod stats;
pub mod vector;

#[cfg(test)]
mod test_util;

use ndarray::Array1;

pub use config::{ConfigError, HsjaConfig};
pub use hsja::{AttackError, Attacker, Hsja};
pub use membership::{DistanceThreshold, MembershipPolicy};
pub use noise::NoiseSource;
pub use oracle::{CountingOracle, Oracle, OracleError, OracleErrorPolicy, QueryError};
pub use sample::{AttackResult, Sample};

pub type PixelFloat = f32;

/// Flattened image, channel-major.
pub type Image = Array1<PixelFloat>;

pub const IMG_CHANNELS: usize = 3;
pub const IMG_HEIGHT: usize = 32;
pub const IMG_WIDTH: usize = 32;
pub const FLATTENED_SIZE: usize = IMG_CHANNELS * IMG_HEIGHT * IMG_WIDTH;
