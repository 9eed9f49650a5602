#![allow(clippy::uninlined_format_args)]
use approx::assert_relative_eq;
use cosmicseed_algorithms::{
    EventOutput, FitEngine, LineFitConfig, PipelineConfig, SeedFinder, SeedScratch,
};
use cosmicseed_core::{
    Calibration, CandidateSeed, ChannelId, ComboHit, CorrelationStrategy, EventData, EventId,
    FitFlag, FixedConditions, RawHit, SeedConfig, TimeCluster, TrackFit, Vec3,
};

const CLUSTER_T0: f64 = 1000.0;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Event with one time cluster of ten hits on `x = 5 + 0.2 z`, `y = 300 + slope * z`.
///
/// Hits listed in `displaced` are shifted by 30 mm in `x`. Every combo hit
/// has a matching raw hit on the same channel at the same time.
fn track_event(slope: f64, displaced: &[usize]) -> EventData {
    let mut event = EventData::new(EventId::new(1, 0, 42));
    for i in 0..10 {
        let z = -200.0 + 40.0 * i as f64;
        let mut pos = Vec3::new(5.0 + 0.2 * z, 300.0 + slope * z, z);
        if displaced.contains(&i) {
            pos.x += 30.0;
        }
        let channel = ChannelId::new(100 + i as u32);
        let time = 1000.0 + i as f64 * 0.5;
        event.raw_hits.push(RawHit::new(pos, time, channel));
        event
            .combo_hits
            .push(ComboHit::new(pos, time, channel).with_raw_indices(vec![i]));
    }
    event
        .time_clusters
        .push(TimeCluster::new(CLUSTER_T0, (0..10).collect()));
    event
}

/// Drift radii of zero: fitted lines pass through the hit positions.
fn zero_drift() -> Calibration {
    let mut calibration = Calibration::default();
    calibration.default.drift_velocity = 0.0;
    calibration
}

fn run<E: FitEngine>(finder: &SeedFinder<E>, event: &EventData) -> EventOutput {
    finder
        .process_event(event, &zero_drift(), &mut SeedScratch::new())
        .unwrap()
}

#[test]
fn test_outliers_removed_from_track() {
    init_logging();
    let finder = SeedFinder::with_line_fit(PipelineConfig::default()).unwrap();
    let output = run(&finder, &track_event(-1.5, &[2, 7]));

    assert_eq!(output.seeds.len(), 1);
    assert_eq!(output.line_seeds.len(), 1);

    let seed = &output.seeds[0];
    assert_eq!(seed.nhits(), 8);
    assert!(!seed.hit_indices.contains(&2));
    assert!(!seed.hit_indices.contains(&7));
    assert_eq!(seed.fit.n_outliers, 2);
    assert!(seed.status.is_accepted());
    assert_eq!(output.statistics.outliers_removed, 2);

    let line = &output.line_seeds[0];
    assert!(line.converged);
    assert_eq!(line.raw_hit_indices.len(), 8);
    assert_eq!(line.t0, CLUSTER_T0);
    assert_relative_eq!(line.intercept.x, 5.0, epsilon = 1e-6);
    assert_relative_eq!(line.intercept.y, 300.0, epsilon = 1e-6);
    assert_relative_eq!(line.direction.mag(), 1.0, epsilon = 1e-12);
    let norm = (0.2f64 * 0.2 + 1.5 * 1.5 + 1.0).sqrt();
    assert_relative_eq!(line.direction.x, 0.2 / norm, epsilon = 1e-6);
    assert_relative_eq!(line.direction.y, -1.5 / norm, epsilon = 1e-6);
}

#[test]
fn test_seed_hits_ordered_by_height() {
    init_logging();
    let finder = SeedFinder::with_line_fit(PipelineConfig::default()).unwrap();
    let mut event = track_event(-1.5, &[]);
    event.time_clusters[0].hits = vec![4, 9, 0, 3, 8, 1, 7, 2, 6, 5];
    let output = run(&finder, &event);

    let seed = &output.seeds[0];
    assert!(seed.hit_indices.iter().all(|i| *i < 10));
    assert!(seed.hits.windows(2).all(|w| w[0].pos.y >= w[1].pos.y));
    // y falls with z here, so descending y is ascending index
    assert_eq!(seed.hit_indices, (0..10).collect::<Vec<_>>());
}

#[test]
fn test_direction_points_down_for_either_slope() {
    init_logging();
    let finder = SeedFinder::with_line_fit(PipelineConfig::default()).unwrap();
    for slope in [-1.5, 1.5] {
        let output = run(&finder, &track_event(slope, &[]));
        let line = &output.line_seeds[0];
        assert!(line.direction.y <= 0.0, "slope {}: {:?}", slope, line.direction);
        assert_relative_eq!(line.direction.mag(), 1.0, epsilon = 1e-12);
    }
}

#[test]
fn test_too_few_good_hits_yields_nothing() {
    init_logging();
    let config = PipelineConfig {
        seeding: SeedConfig::default().with_min_good_hits(2),
        ..Default::default()
    };
    let finder = SeedFinder::with_line_fit(config).unwrap();
    let mut event = track_event(-1.5, &[]);
    // Only one hit left inside the default window
    for hit in &mut event.combo_hits[1..] {
        hit.time = 100.0;
    }
    let output = run(&finder, &event);

    assert!(output.seeds.is_empty());
    assert!(output.line_seeds.is_empty());
    assert_eq!(output.statistics.rejected_good_hits, 1);
}

#[test]
fn test_rerun_is_identical() {
    init_logging();
    let finder = SeedFinder::with_line_fit(PipelineConfig::default()).unwrap();
    let event = track_event(-1.5, &[3]);
    let mut scratch = SeedScratch::new();
    let first = finder
        .process_event(&event, &zero_drift(), &mut scratch)
        .unwrap();
    let second = finder
        .process_event(&event, &zero_drift(), &mut scratch)
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_hashed_correlation_matches_linear() {
    init_logging();
    let mut event = track_event(-1.5, &[5]);
    // Extra raw hits: a duplicate and an unrelated channel
    let duplicate = event.raw_hits[4];
    event.raw_hits.push(duplicate);
    event
        .raw_hits
        .push(RawHit::new(Vec3::default(), 1000.0, ChannelId::new(7)));

    let linear = SeedFinder::with_line_fit(PipelineConfig::default()).unwrap();
    let hashed = SeedFinder::with_line_fit(PipelineConfig {
        seeding: SeedConfig::default().with_correlation(CorrelationStrategy::Hashed),
        ..Default::default()
    })
    .unwrap();

    let a = run(&linear, &event);
    let b = run(&hashed, &event);
    assert_eq!(a.line_seeds, b.line_seeds);
    assert_eq!(a.statistics, b.statistics);
}

#[test]
fn test_multi_event_batch_in_order() {
    init_logging();
    let finder = SeedFinder::with_line_fit(PipelineConfig::default()).unwrap();
    let events: Vec<EventData> = (0..12)
        .map(|i| {
            let mut event = track_event(if i % 2 == 0 { -1.5 } else { 1.5 }, &[]);
            event.id = EventId::new(1, 0, i);
            if i % 4 == 3 {
                event.time_clusters.clear();
            }
            event
        })
        .collect();

    let outputs = finder
        .process_events(&events, &FixedConditions::new(zero_drift()))
        .unwrap();
    assert_eq!(outputs.len(), events.len());
    for (i, output) in outputs.iter().enumerate() {
        assert_eq!(output.id.event, i as u32);
        let expected = if i % 4 == 3 { 0 } else { 1 };
        assert_eq!(output.line_seeds.len(), expected, "event {}", i);
    }
}

#[test]
fn test_tight_fit_rejects_curved_cluster() {
    init_logging();
    let config = PipelineConfig {
        fit: LineFitConfig::default().with_max_chi2_dof(1.0),
        ..Default::default()
    };
    let finder = SeedFinder::with_line_fit(config).unwrap();
    let mut event = track_event(-1.5, &[]);
    for (i, hit) in event.combo_hits.iter_mut().enumerate() {
        let u = i as f64 - 4.5;
        hit.pos.x += 2.0 * u * u;
    }
    let output = run(&finder, &event);
    assert!(output.seeds.is_empty());
    assert_eq!(output.statistics.rejected_bad_track, 1);
}

/// Engine with scripted verdicts for the acceptance scenarios.
struct Scripted {
    converged_flag: bool,
    outliers: Vec<usize>,
}

impl FitEngine for Scripted {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn begin_fit(&self, seed: &mut CandidateSeed) {
        seed.fit.converged = true;
        seed.status.merge(FitFlag::HelixOk);
        if self.converged_flag {
            seed.status.merge(FitFlag::HelixConverged);
        }
    }

    fn drift_fit(&self, seed: &mut CandidateSeed, _calibration: &Calibration) {
        for &i in &self.outliers {
            seed.hits[i].outlier = true;
        }
        seed.fit.drift_converged = true;
    }

    fn good_track(&self, _fit: &TrackFit) -> bool {
        true
    }
}

#[test]
fn test_scripted_two_outliers() {
    init_logging();
    let engine = Scripted {
        converged_flag: true,
        outliers: vec![1, 6],
    };
    let finder = SeedFinder::new(SeedConfig::default(), engine).unwrap();
    let output = run(&finder, &track_event(-1.5, &[]));

    assert_eq!(output.seeds.len(), 1);
    assert_eq!(output.seeds[0].nhits(), 8);
    assert_eq!(output.line_seeds[0].raw_hit_indices.len(), 8);
    assert_eq!(output.seeds[0].seed_hits.len(), 8);
}

#[test]
fn test_missing_acceptance_flag_yields_nothing() {
    init_logging();
    let engine = Scripted {
        converged_flag: false,
        outliers: vec![],
    };
    let finder = SeedFinder::new(SeedConfig::default(), engine).unwrap();
    let output = run(&finder, &track_event(-1.5, &[]));
    assert!(output.seeds.is_empty());
    assert!(output.line_seeds.is_empty());
    assert_eq!(output.statistics.rejected_fit, 1);
}

#[test]
fn test_all_hits_outliers_yields_nothing() {
    init_logging();
    let engine = Scripted {
        converged_flag: true,
        outliers: (0..10).collect(),
    };
    let finder = SeedFinder::new(SeedConfig::default(), engine).unwrap();
    let output = run(&finder, &track_event(-1.5, &[]));
    assert!(output.seeds.is_empty());
    assert!(output.line_seeds.is_empty());
    assert_eq!(output.statistics.rejected_no_active_hits, 1);
}
