use hsja_rs::runner::{attack_each, Runner};
use hsja_rs::{
    AttackError, AttackResult, Attacker, DistanceThreshold, HsjaConfig, Image, Oracle, Sample,
};
use std::sync::atomic::{AtomicUsize, Ordering};

mod common;

fn config() -> HsjaConfig {
    HsjaConfig {
        max_queries: 1_500,
        max_iterations: 15,
        num_evals: 40,
        ..HsjaConfig::default()
    }
}

#[test]
fn test_parallel_results_are_reproducible() {
    common::setup();
    let oracle = common::FirstCoordinate::new(8);
    let samples = common::samples_below_boundary(12, 8, 3);
    let runner = Runner::new(config(), 1234).unwrap();

    let first: Vec<AttackResult> = runner
        .attack_all(&oracle, &samples)
        .into_iter()
        .map(Result::unwrap)
        .collect();
    let second: Vec<AttackResult> = runner
        .attack_all(&oracle, &samples)
        .into_iter()
        .map(Result::unwrap)
        .collect();
    assert_eq!(first, second);

    for (sample, result) in samples.iter().zip(&first) {
        assert_eq!(result.sample_id(), sample.id);
        let alone = runner.attacker_for(sample).attack(sample, &oracle).unwrap();
        assert_eq!(&alone, result);
    }
}

#[test]
fn test_different_master_seeds_differ() {
    let oracle = common::FirstCoordinate::new(8);
    let samples = common::samples_below_boundary(4, 8, 5);
    let a = Runner::new(config(), 1).unwrap().attack_all(&oracle, &samples);
    let b = Runner::new(config(), 2).unwrap().attack_all(&oracle, &samples);
    let adversarials = |results: Vec<Result<AttackResult, AttackError>>| -> Vec<Option<Image>> {
        results
            .into_iter()
            .map(|r| r.unwrap().adversarial().cloned())
            .collect()
    };
    assert_ne!(adversarials(a), adversarials(b));
}

#[test]
fn test_judged_results_carry_membership() {
    let oracle = common::FirstCoordinate::new(8);
    let samples = common::samples_below_boundary(6, 8, 9);
    let runner = Runner::new(config(), 77).unwrap();
    let policy = DistanceThreshold::new(0.0);

    for result in runner.attack_all_judged(&oracle, &samples, &policy) {
        let result = result.unwrap();
        assert_eq!(result.is_member(), result.is_success() && result.distance() > 0.);
    }
}

#[test]
fn test_runner_validates_and_defaults_config() {
    let invalid = HsjaConfig {
        clip_min: 1.0,
        clip_max: 0.0,
        ..config()
    };
    assert!(Runner::new(invalid, 0).is_err());

    let runner = Runner::new(
        HsjaConfig {
            num_evals: 0,
            ..config()
        },
        5,
    )
    .unwrap();
    assert_eq!(runner.config().num_evals, HsjaConfig::default().num_evals);
    let sample = &common::samples_below_boundary(1, 8, 1)[0];
    assert_eq!(runner.attacker_for(sample).config(), runner.config());
}

#[test]
fn test_attack_each_drives_any_attacker() {
    // Takes the sample itself as the adversarial point after a single query.
    struct OneShot {
        attacks: AtomicUsize,
    }

    impl Attacker for OneShot {
        fn attack<O: Oracle + ?Sized>(
            &self,
            sample: &Sample,
            oracle: &O,
        ) -> Result<AttackResult, AttackError> {
            self.attacks.fetch_add(1, Ordering::SeqCst);
            let label = oracle
                .predict(sample.data.view())
                .map_err(|err| AttackError::Oracle { err, queries: 1 })?;
            Ok(AttackResult::new(
                sample.id,
                sample.label,
                label,
                1,
                0.,
                sample.data.clone(),
            ))
        }
    }

    let oracle = common::FirstCoordinate::new(8);
    let samples = common::samples_below_boundary(5, 8, 11);
    let attacker = OneShot {
        attacks: AtomicUsize::new(0),
    };
    let results = attack_each(&attacker, &oracle, &samples);

    assert_eq!(attacker.attacks.load(Ordering::SeqCst), 5);
    assert_eq!(oracle.calls(), 5);
    for (sample, result) in samples.iter().zip(results) {
        let result = result.unwrap();
        assert_eq!(result.sample_id(), sample.id);
        assert!(!result.is_success());
        assert_eq!(result.queries(), 1);
    }
}
