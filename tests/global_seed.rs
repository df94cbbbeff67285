use hsja_rs::noise;
use hsja_rs::{Hsja, HsjaConfig, Sample};
use ndarray::array;

mod common;

// The process-wide source is shared state: keep every test that touches it in this one.
#[test]
fn test_global_seed_reproduces_draws_and_attacks() {
    noise::set_seed(2024);
    let gaussian = noise::gen_gaussian(32, 0., 1.);
    let uniform = noise::gen_uniform(32, 0., 1.);
    noise::set_seed(2024);
    assert_eq!(noise::gen_gaussian(32, 0., 1.), gaussian);
    assert_eq!(noise::gen_uniform(32, 0., 1.), uniform);

    let oracle = common::FirstCoordinate::new(3);
    let sample = Sample::new(0, array![0.2, 0.1, 0.0], 0, "toy.bin");
    let config = HsjaConfig {
        max_queries: 800,
        max_iterations: 10,
        num_evals: 30,
        ..HsjaConfig::default()
    };
    let hsja = Hsja::new(config).unwrap();

    noise::set_seed(7);
    let first = hsja.attack(&sample, &oracle).unwrap();
    noise::set_seed(7);
    let second = hsja.attack(&sample, &oracle).unwrap();
    assert_eq!(first, second);
}
