//! Attacks over a whole dataset, spread across the rayon thread pool.
//!
//! Each sample draws its noise from a stream derived from the master seed and the sample id,
//! so results do not depend on how samples are scheduled and no lock is shared between them.
use crate::config::{ConfigError, HsjaConfig};
use crate::hsja::{AttackError, Attacker, Hsja};
use crate::membership::MembershipPolicy;
use crate::noise::NoiseSource;
use crate::oracle::Oracle;
use crate::sample::{AttackResult, Sample};
use log::info;
use rayon::prelude::*;
use std::sync::Arc;

pub struct Runner {
    config: HsjaConfig,
    master_seed: u64,
}

impl Runner {
    /// # Errors
    /// If `config` fails [`HsjaConfig::validate`].
    pub fn new(config: HsjaConfig, master_seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config: config.with_zero_counts_defaulted(),
            master_seed,
        })
    }

    pub const fn master_seed(&self) -> u64 {
        self.master_seed
    }

    pub const fn config(&self) -> &HsjaConfig {
        &self.config
    }

    /// Attacker for one sample, on that sample's own noise stream.
    pub fn attacker_for(&self, sample: &Sample) -> Hsja {
        Hsja::from_validated(
            self.config.clone(),
            Arc::new(NoiseSource::derive(self.master_seed, sample.id as u64)),
        )
    }

    /// One result per sample, in input order.
    pub fn attack_all<O>(
        &self,
        oracle: &O,
        samples: &[Sample],
    ) -> Vec<Result<AttackResult, AttackError>>
    where
        O: Oracle + Sync + ?Sized,
    {
        run_all(oracle, samples, |sample| self.attacker_for(sample))
    }

    /// As [`Runner::attack_all`], with each successful record judged by `policy`.
    pub fn attack_all_judged<O, P>(
        &self,
        oracle: &O,
        samples: &[Sample],
        policy: &P,
    ) -> Vec<Result<AttackResult, AttackError>>
    where
        O: Oracle + Sync + ?Sized,
        P: MembershipPolicy + ?Sized,
    {
        self.attack_all(oracle, samples)
            .into_iter()
            .map(|r| r.map(|result| result.with_membership(policy)))
            .collect()
    }
}

/// Attacks every sample with one shared `attacker`, in parallel. Results are in input order.
pub fn attack_each<A, O>(
    attacker: &A,
    oracle: &O,
    samples: &[Sample],
) -> Vec<Result<AttackResult, AttackError>>
where
    A: Attacker + Sync,
    O: Oracle + Sync + ?Sized,
{
    run_all(oracle, samples, |_| attacker)
}

fn run_all<A, O, F>(
    oracle: &O,
    samples: &[Sample],
    attacker_for: F,
) -> Vec<Result<AttackResult, AttackError>>
where
    A: Attacker,
    O: Oracle + Sync + ?Sized,
    F: Fn(&Sample) -> A + Send + Sync,
{
    let results: Vec<_> = samples
        .par_iter()
        .map(|sample| attacker_for(sample).attack(sample, oracle))
        .collect();
    let succeeded = results
        .iter()
        .filter(|r| r.as_ref().map_or(false, AttackResult::is_success))
        .count();
    info!("{} of {} attacks succeeded", succeeded, samples.len());
    results
}
