use rand::rngs::SmallRng;
use rand::SeedableRng;
use snow_wasm::{
    Baseline, DrawCall, GroundField, GroundStore, MemoryStore, PathCommand, Point,
    PopulationPolicy, Recorder, Simulation, SnowpackConfig,
};

fn flat_config() -> SnowpackConfig {
    SnowpackConfig {
        baseline: Baseline::Flat,
        ..SnowpackConfig::default()
    }
}

#[test]
fn repeated_deposits_build_a_centred_pile() {
    let config = flat_config();
    let mut ground = GroundField::flat(10);
    for _ in 0..3 {
        ground.deposit(5, 4.0, &config);
        assert!(ground.relax(&config));
    }

    let samples = ground.samples();
    assert!(samples.iter().all(|h| *h >= 0.0), "{samples:?}");
    let peak = samples
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap();
    assert!((4..=6).contains(&peak), "peak at {peak}: {samples:?}");
    assert!((ground.total() - 24.0).abs() < 1e-3, "total {}", ground.total());
    assert!(!ground.is_dirty());
}

#[test]
fn deposit_adds_twice_the_amount() {
    let config = flat_config();
    let mut ground = GroundField::flat(10);
    ground.deposit(4, 3.0, &config);
    assert!((ground.total() - 6.0).abs() < 1e-6);
    assert_eq!(ground.height_at(4), 3.0);
    assert_eq!(ground.height_at(3), 1.5);
    assert_eq!(ground.height_at(5), 1.5);
}

#[test]
fn a_tall_spike_at_the_edge_never_goes_negative() {
    let config = flat_config();
    let mut ground = GroundField::flat(12);
    ground.deposit(0, 40.0, &config);
    for _ in 0..200 {
        ground.deposit(0, 0.0, &config);
        ground.relax(&config);
        assert!(ground.samples().iter().all(|h| *h >= 0.0));
    }
    // spread downhill away from the edge
    assert!(ground.height_at(3) > 0.0);
}

#[test]
fn silhouette_fill_closes_along_the_bottom_edge() {
    let config = SnowpackConfig {
        population: PopulationPolicy::Replace,
        max_flakes: 8,
        ..flat_config()
    };
    let mut sim = Simulation::new(
        config,
        40,
        30,
        MemoryStore::new(),
        SmallRng::seed_from_u64(3),
    );
    let mut recorder = Recorder::new();
    sim.tick(&mut recorder);

    let fill = recorder
        .calls
        .iter()
        .find_map(|call| match call {
            DrawCall::FillGrain(path) => Some(path.clone()),
            _ => None,
        })
        .expect("ground fill was drawn");
    assert_eq!(fill[0], PathCommand::MoveTo(Point::new(0.0, 30.0)));
    assert_eq!(fill[1], PathCommand::LineTo(Point::new(0.0, 30.0)));
    let n = fill.len();
    assert_eq!(fill[n - 2], PathCommand::LineTo(Point::new(40.0, 30.0)));
    assert_eq!(fill[n - 1], PathCommand::Close);
    assert!(fill[2..n - 2]
        .iter()
        .all(|c| matches!(c, PathCommand::CubicTo { .. })));
}

#[test]
fn a_snapshot_from_another_width_is_discarded() {
    let config = flat_config();
    let store = MemoryStore::new().with_entry(&config.storage_key, "[1.0,2.0,3.0]");
    let mut rng = SmallRng::seed_from_u64(5);

    let ground = GroundField::initialize(5, 100.0, &config, &store, &mut rng);
    assert_eq!(ground.samples(), &[0.0; 5]);

    let ground = GroundField::initialize(3, 100.0, &config, &store, &mut rng);
    assert_eq!(ground.samples(), &[1.0, 2.0, 3.0]);
    assert_eq!(
        store.load(&config.storage_key).unwrap().as_deref(),
        Some("[1.0,2.0,3.0]")
    );
}
