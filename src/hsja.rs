//! HopSkipJump boundary attack against a label-only oracle.
//!
//! ## Attack lifecycle
//! 1. Find a first adversarial point: the sample itself if the oracle already mislabels it
//!    (clipped into `[clip_min, clip_max]`, and asked again if clipping moved it), otherwise
//!    the first of `init_evals` uniform draws that the oracle mislabels.
//! 2. Bisect the segment from the sample to that point to land next to the decision boundary.
//! 3. Repeat up to `max_iterations` times: estimate the boundary normal from random probes, step
//!    along it, bisect back onto the boundary, and keep the result if it is strictly closer.
//! 4. Ask the oracle once more for the label of the best point and report.
//!
//! Every oracle call goes through a [`CountingOracle`], and each phase stops as soon as the
//! query budget is spent, so an attack never issues more than `max_queries` calls.
use crate::config::{ConfigError, HsjaConfig};
use crate::distance::l2_distance;
use crate::geometry::{interpolate, normalize};
use crate::noise::{self, NoiseSource};
use crate::oracle::{CountingOracle, Oracle, OracleError, QueryError};
use crate::sample::{AttackResult, Sample};
use crate::stats::mean_vector;
use crate::vector::{add, clip, scale};
use crate::{Image, PixelFloat};
use log::{debug, info, trace};
use ndarray::ArrayView1;
use std::fmt;
use std::sync::Arc;

#[derive(Debug)]
pub enum AttackError {
    /// The sample does not have the length the oracle expects.
    InputSizeMismatch { expected: usize, given: usize },
    /// The oracle failed under [`crate::OracleErrorPolicy::Abort`].
    Oracle { err: OracleError, queries: usize },
}

impl fmt::Display for AttackError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InputSizeMismatch { expected, given } => write!(
                f,
                "sample has length {} but the oracle expects {}",
                given, expected
            ),
            Self::Oracle { err, queries } => {
                write!(f, "attack aborted after {} queries: {}", queries, err)
            }
        }
    }
}

impl std::error::Error for AttackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Oracle { err, .. } => Some(err),
            Self::InputSizeMismatch { .. } => None,
        }
    }
}

/// A point the oracle labelled differently from the target, with that label.
#[derive(Clone, Debug)]
struct Boundary {
    point: Image,
    label: usize,
}

/// `Ok(None)` once the budget is spent.
fn ask<O: Oracle + ?Sized>(
    oracle: &mut CountingOracle<O>,
    input: ArrayView1<PixelFloat>,
) -> Result<Option<usize>, OracleError> {
    match oracle.predict(input) {
        Ok(label) => Ok(Some(label)),
        Err(QueryError::BudgetExhausted { .. }) => Ok(None),
        Err(QueryError::Oracle(err)) => Err(err),
    }
}

fn ask_batch<O: Oracle + ?Sized>(
    oracle: &mut CountingOracle<O>,
    inputs: &[Image],
) -> Result<Vec<usize>, OracleError> {
    match oracle.predict_batch(inputs) {
        Ok(labels) => Ok(labels),
        Err(QueryError::BudgetExhausted { .. }) => Ok(vec![]),
        Err(QueryError::Oracle(err)) => Err(err),
    }
}

/// Something that attacks one sample against one oracle.
pub trait Attacker {
    /// # Errors
    /// When the attack cannot run to completion, e.g. the oracle fails or rejects the sample.
    fn attack<O: Oracle + ?Sized>(
        &self,
        sample: &Sample,
        oracle: &O,
    ) -> Result<AttackResult, AttackError>;
}

impl<T: Attacker> Attacker for &T {
    fn attack<O: Oracle + ?Sized>(
        &self,
        sample: &Sample,
        oracle: &O,
    ) -> Result<AttackResult, AttackError> {
        (**self).attack(sample, oracle)
    }
}

/// One attacker instance. Holds no per-attack state, so one `Hsja` can attack many samples,
/// from many threads if its noise source is shared.
#[derive(Clone, Debug)]
pub struct Hsja {
    config: HsjaConfig,
    noise: Arc<NoiseSource>,
}

impl Hsja {
    /// Attacker drawing from the process-wide noise source.
    ///
    /// # Errors
    /// If `config` fails [`HsjaConfig::validate`].
    pub fn new(config: HsjaConfig) -> Result<Self, ConfigError> {
        Self::with_noise(config, Arc::clone(noise::global()))
    }

    /// # Errors
    /// If `config` fails [`HsjaConfig::validate`].
    pub fn with_noise(config: HsjaConfig, noise: Arc<NoiseSource>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config: config.with_zero_counts_defaulted(),
            noise,
        })
    }

    /// # Errors
    /// If `config` fails [`HsjaConfig::validate`].
    pub fn seeded(config: HsjaConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::with_noise(config, Arc::new(NoiseSource::new_seeded(seed)))
    }

    /// For a configuration that has already been validated and defaulted.
    pub(crate) fn from_validated(config: HsjaConfig, noise: Arc<NoiseSource>) -> Self {
        Self { config, noise }
    }

    /// Same configuration, drawing from `noise` instead.
    #[must_use]
    pub fn with_stream(&self, noise: Arc<NoiseSource>) -> Self {
        Self {
            config: self.config.clone(),
            noise,
        }
    }

    pub const fn config(&self) -> &HsjaConfig {
        &self.config
    }

    pub fn noise(&self) -> &NoiseSource {
        &self.noise
    }

    /// Attack `sample`, trying to move it out of `sample.label`.
    ///
    /// Finding no adversarial point at all is not an error: the result then has
    /// `is_success() == false` and a distance of zero.
    ///
    /// # Errors
    /// `InputSizeMismatch` before any query if the sample length differs from
    /// `oracle.input_size()`, and `Oracle` if a call fails under the `Abort` policy.
    pub fn attack<O: Oracle + ?Sized>(
        &self,
        sample: &Sample,
        oracle: &O,
    ) -> Result<AttackResult, AttackError> {
        let expected = oracle.input_size();
        if sample.len() != expected {
            return Err(AttackError::InputSizeMismatch {
                expected,
                given: sample.len(),
            });
        }
        let mut counting = CountingOracle::new(
            oracle,
            self.config.max_queries,
            self.config.oracle_error_policy,
            sample.label,
        );
        let result = self
            .run(sample, &mut counting)
            .map_err(|err| AttackError::Oracle {
                err,
                queries: counting.queries(),
            })?;
        info!("{}", result);
        Ok(result)
    }

    fn run<O: Oracle + ?Sized>(
        &self,
        sample: &Sample,
        oracle: &mut CountingOracle<O>,
    ) -> Result<AttackResult, OracleError> {
        let original = sample.data.view();
        let target = sample.label;

        let seed = match self.initialize(original, target, oracle)? {
            Some(seed) => seed,
            None => {
                debug!(
                    "sample {}: no adversarial starting point after {} queries",
                    sample.id,
                    oracle.queries()
                );
                return Ok(AttackResult::failed(sample.id, target, oracle.queries()));
            }
        };

        let mut best = if seed.point == sample.data {
            seed
        } else {
            let searched = self.binary_search(original, seed.point.view(), target, oracle)?;
            searched.unwrap_or(seed)
        };
        let mut dist = l2_distance(original, best.point.view());
        debug!("sample {}: initial boundary distance {}", sample.id, dist);

        for iteration in 0..self.config.max_iterations {
            if oracle.is_exhausted() {
                debug!("sample {}: budget spent at iteration {}", sample.id, iteration);
                break;
            }
            // the sample itself is adversarial; nothing can be closer
            if dist == 0. {
                break;
            }

            let delta = self.delta(dist, iteration);
            let gradient = match self.approximate_gradient(&best.point, target, delta, oracle)? {
                Some(gradient) => gradient,
                None => break,
            };

            let step = scale(gradient.view(), step_size(dist, iteration));
            let stepped = clip(
                add(best.point.view(), step.view()).view(),
                self.config.clip_min,
                self.config.clip_max,
            );

            let candidate = match self.binary_search(original, stepped.view(), target, oracle)? {
                Some(candidate) => candidate,
                None => {
                    trace!("iteration {}: stepped point never crossed, step dropped", iteration);
                    continue;
                }
            };
            let new_dist = l2_distance(original, candidate.point.view());
            debug!(
                "iteration {}: distance {} -> {} ({} queries)",
                iteration,
                dist,
                new_dist,
                oracle.queries()
            );
            if new_dist < dist {
                dist = new_dist;
                best = candidate;
            }
        }

        let final_label = ask(oracle, best.point.view())?.unwrap_or(best.label);
        Ok(AttackResult::new(
            sample.id,
            target,
            final_label,
            oracle.queries(),
            dist,
            best.point,
        ))
    }

    fn initialize<O: Oracle + ?Sized>(
        &self,
        original: ArrayView1<PixelFloat>,
        target: usize,
        oracle: &mut CountingOracle<O>,
    ) -> Result<Option<Boundary>, OracleError> {
        match ask(oracle, original)? {
            None => return Ok(None),
            Some(label) if label != target => {
                let clipped = clip(original, self.config.clip_min, self.config.clip_max);
                if clipped == original {
                    return Ok(Some(Boundary {
                        point: clipped,
                        label,
                    }));
                }
                // out of bounds: only its in-bounds projection may be reported
                match ask(oracle, clipped.view())? {
                    None => return Ok(None),
                    Some(label) if label != target => {
                        return Ok(Some(Boundary {
                            point: clipped,
                            label,
                        }))
                    }
                    Some(_) => {}
                }
            }
            Some(_) => {}
        }
        for _ in 0..self.config.init_evals {
            if oracle.is_exhausted() {
                return Ok(None);
            }
            let candidate = self.noise.gen_uniform(
                original.len(),
                f64::from(self.config.clip_min),
                f64::from(self.config.clip_max),
            );
            match ask(oracle, candidate.view())? {
                None => return Ok(None),
                Some(label) if label != target => {
                    return Ok(Some(Boundary {
                        point: candidate,
                        label,
                    }))
                }
                Some(_) => {}
            }
        }
        Ok(None)
    }

    /// Bisects the segment from `original` (t = 0) towards `adversarial` (t = 1) for a fixed
    /// number of steps. Returns the crossing candidate closest to `original`, or `None` if no
    /// candidate crossed.
    #[allow(clippy::cast_possible_truncation)]
    fn binary_search<O: Oracle + ?Sized>(
        &self,
        original: ArrayView1<PixelFloat>,
        adversarial: ArrayView1<PixelFloat>,
        target: usize,
        oracle: &mut CountingOracle<O>,
    ) -> Result<Option<Boundary>, OracleError> {
        let (mut low, mut high) = (0f64, 1f64);
        let mut boundary = None;
        for _ in 0..self.config.binary_search_steps {
            if oracle.is_exhausted() {
                break;
            }
            let mid = (low + high) / 2.;
            let candidate = clip(
                interpolate(original, adversarial, mid as PixelFloat).view(),
                self.config.clip_min,
                self.config.clip_max,
            );
            match ask(oracle, candidate.view())? {
                None => break,
                Some(label) if label != target => {
                    high = mid;
                    boundary = Some(Boundary {
                        point: candidate,
                        label,
                    });
                }
                Some(_) => low = mid,
            }
        }
        Ok(boundary)
    }

    /// Monte-Carlo estimate of the direction that leads away from `target` at `point`: the
    /// mean of unit probe directions, each signed by whether `point + delta * direction`
    /// crosses the boundary. `None` when the budget allowed no probe at all.
    fn approximate_gradient<O: Oracle + ?Sized>(
        &self,
        point: &Image,
        target: usize,
        delta: PixelFloat,
        oracle: &mut CountingOracle<O>,
    ) -> Result<Option<Image>, OracleError> {
        let probe = |direction: &Image| {
            clip(
                add(point.view(), scale(direction.view(), delta).view()).view(),
                self.config.clip_min,
                self.config.clip_max,
            )
        };

        let mut directions = Vec::with_capacity(self.config.num_evals);
        let mut labels = Vec::with_capacity(self.config.num_evals);
        if self.config.batch_queries {
            // Same draws, in the same order, as the one-at-a-time path below.
            let n = self.config.num_evals.min(oracle.remaining());
            directions.extend((0..n).map(|_| self.random_direction(point.len())));
            let probes: Vec<Image> = directions.iter().map(&probe).collect();
            labels.extend(ask_batch(oracle, &probes)?);
        } else {
            for _ in 0..self.config.num_evals {
                if oracle.is_exhausted() {
                    break;
                }
                let direction = self.random_direction(point.len());
                match ask(oracle, probe(&direction).view())? {
                    Some(label) => labels.push(label),
                    None => break,
                }
                directions.push(direction);
            }
        }

        let signed: Vec<Image> = directions
            .into_iter()
            .zip(labels)
            .map(|(direction, label)| {
                if label == target {
                    -direction
                } else {
                    direction
                }
            })
            .collect();
        Ok(mean_vector(&signed).map(|mean| normalize(mean.view())))
    }

    fn random_direction(&self, len: usize) -> Image {
        normalize(self.noise.gen_gaussian(len, 0., 1.).view())
    }

    /// Probe radius: `initial_delta` on the first iteration, then `0.1 * dist / sqrt(iteration)`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn delta(&self, dist: f64, iteration: usize) -> PixelFloat {
        if iteration == 0 {
            self.config.initial_delta
        } else {
            (dist * 0.1 / (iteration as f64).sqrt()) as PixelFloat
        }
    }
}

impl Attacker for Hsja {
    fn attack<O: Oracle + ?Sized>(
        &self,
        sample: &Sample,
        oracle: &O,
    ) -> Result<AttackResult, AttackError> {
        Hsja::attack(self, sample, oracle)
    }
}

/// `dist / sqrt(iteration + 1)`.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn step_size(dist: f64, iteration: usize) -> PixelFloat {
    (dist / ((iteration + 1) as f64).sqrt()) as PixelFloat
}
