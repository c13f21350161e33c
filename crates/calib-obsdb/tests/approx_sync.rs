//! End-to-end checks of approximate sync and filtering on a jittered
//! multi-camera capture.

use std::collections::{BTreeSet, HashMap};

use calib_obsdb::{
    CameraId, ObsDbError, ObservationDatabase, ObservationInput, ObsDbConfig, PreFilterOptions,
    Real, TargetObservation, build_database,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const NUM_CAMERAS: usize = 4;
const NUM_FRAMES: usize = 200;
const FRAME_PERIOD: Real = 0.1;
const MAX_JITTER: Real = 0.01;
const TOLERANCE: Real = 0.03;

/// Per-camera streams of a rig triggered every `FRAME_PERIOD` with clock
/// jitter; each camera sees the target in roughly 70% of the frames.
fn jittered_capture(seed: u64) -> (Vec<Vec<TargetObservation>>, usize) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut per_camera = vec![Vec::new(); NUM_CAMERAS];
    let mut frames_seen = BTreeSet::new();
    for frame in 0..NUM_FRAMES {
        let t0 = frame as Real * FRAME_PERIOD;
        for (cam, stream) in per_camera.iter_mut().enumerate() {
            if !rng.random_bool(0.7) {
                continue;
            }
            let t = t0 + rng.random_range(-MAX_JITTER..MAX_JITTER);
            let ids: Vec<usize> = (0..20).filter(|i| (i + cam + frame) % 3 != 0).collect();
            stream.push(TargetObservation::ids_only(t, ids));
            frames_seen.insert(frame);
        }
    }
    (per_camera, frames_seen.len())
}

fn ingest(per_camera: &[Vec<TargetObservation>]) -> ObservationDatabase<TargetObservation> {
    let mut db = ObservationDatabase::new(TOLERANCE).unwrap();
    for (cam, stream) in per_camera.iter().enumerate() {
        for obs in stream {
            db.add_observation(cam, obs.clone()).unwrap();
        }
    }
    db
}

#[test]
fn one_view_per_physical_frame() {
    let (per_camera, frames_seen) = jittered_capture(42);
    let db = ingest(&per_camera);

    assert_eq!(db.num_cameras(), NUM_CAMERAS);
    assert_eq!(db.num_views(), frames_seen);
    assert!(db.conflicts().is_empty());

    for t in db.view_timestamps() {
        for (_, obs) in db.observations_at(t).unwrap() {
            assert!((obs.timestamp - t).abs() <= TOLERANCE);
        }
        let cams = db.cameras_at(t).unwrap();
        let unique: BTreeSet<CameraId> = cams.iter().copied().collect();
        assert_eq!(unique.len(), cams.len());
    }
}

#[test]
fn every_linked_observation_is_reachable() {
    let (per_camera, _) = jittered_capture(3);
    let db = ingest(&per_camera);

    for (cam, stream) in per_camera.iter().enumerate() {
        assert_eq!(db.observations_for_camera(cam).len(), stream.len());
    }

    let total: usize = db
        .view_timestamps()
        .into_iter()
        .map(|t| db.observations_at(t).unwrap().len())
        .sum();
    assert_eq!(total, db.store().total_observations());
}

#[test]
fn cached_feature_ids_match_observations() {
    let (per_camera, _) = jittered_capture(11);
    let db = ingest(&per_camera);

    for t in db.view_timestamps().into_iter().take(20) {
        for cam in db.cameras_at(t).unwrap() {
            let cached = db.feature_ids_at(t, cam).unwrap();
            let obs = db.observation_at(t, cam).unwrap();
            let expected: BTreeSet<usize> = obs.corner_ids.iter().copied().collect();
            assert_eq!(cached, &expected);
        }
    }
}

#[test]
fn camera_pairs_never_both_absent() {
    let (per_camera, _) = jittered_capture(5);
    let db = ingest(&per_camera);

    let pairs = db.paired_observations(0, 3);
    assert!(!pairs.is_empty());
    assert!(pairs.iter().all(|p| p.first().is_some() || p.second().is_some()));

    let expected = db
        .view_timestamps()
        .into_iter()
        .filter(|&t| {
            let cams = db.cameras_at(t).unwrap();
            cams.contains(&0) || cams.contains(&3)
        })
        .count();
    assert_eq!(pairs.len(), expected);
}

#[test]
fn pre_filter_bounds_tuple_occurrences() {
    let (per_camera, _) = jittered_capture(8);
    let mut db = ingest(&per_camera);

    let cap = 3;
    db.pre_filter(&PreFilterOptions {
        max_occurrences: cap,
        max_capped_arity: Some(4),
        seed: Some(99),
    });

    let mut counts: HashMap<Vec<CameraId>, usize> = HashMap::new();
    for view in db.table().iter() {
        assert!(view.num_cameras() >= 2);
        *counts.entry(view.camera_ids().collect()).or_default() += 1;
    }
    assert!(!counts.is_empty());
    assert!(counts.values().all(|&n| n <= cap));
}

#[test]
fn replace_filter_keeps_only_views_with_new_cameras() {
    let (per_camera, _) = jittered_capture(21);
    let mut db = ingest(&per_camera);

    let report = db.replace_view_filter(1);
    assert!(report.views_after < report.views_before);
    for t in db.view_timestamps() {
        assert!(db.cameras_at(t).unwrap().contains(&(NUM_CAMERAS - 1)));
    }
}

#[test]
fn repeated_conflict_leaves_view_untouched() {
    let mut db = ObservationDatabase::new(0.05).unwrap();
    db.add_observation(0, TargetObservation::ids_only(1.0, vec![1, 2]))
        .unwrap();
    for k in 1..=3 {
        let t = 1.0 + 0.01 * k as Real;
        let err = db
            .add_observation(0, TargetObservation::ids_only(t, vec![9]))
            .unwrap_err();
        assert!(matches!(err, ObsDbError::Conflict { camera: 0, obs_idx, .. } if obs_idx == k));
    }
    assert_eq!(db.obs_index_at(1.0, 0).unwrap(), 0);
    assert_eq!(db.feature_ids_at(1.0, 0).unwrap().len(), 2);
    assert_eq!(db.store().num_observations(0), 4);
    assert_eq!(db.conflicts().len(), 3);
}

#[test]
fn skewed_arrivals_can_span_beyond_twice_the_tolerance() {
    // Keys stay where the first observation put them, so members of one view
    // may be up to 2x tolerance apart.
    let mut db = ObservationDatabase::new(0.05).unwrap();
    db.add_observation(0, TargetObservation::ids_only(1.00, vec![]))
        .unwrap();
    db.add_observation(1, TargetObservation::ids_only(0.96, vec![]))
        .unwrap();
    db.add_observation(2, TargetObservation::ids_only(1.04, vec![]))
        .unwrap();

    assert_eq!(db.view_timestamps(), vec![1.00]);
    let ts: Vec<Real> = db
        .observations_at(1.00)
        .unwrap()
        .iter()
        .map(|(_, o)| o.timestamp)
        .collect();
    let spread = ts.iter().cloned().fold(Real::MIN, Real::max)
        - ts.iter().cloned().fold(Real::MAX, Real::min);
    assert!(spread > 0.05);
}

#[test]
fn pipeline_matches_manual_ingest() {
    let (per_camera, _) = jittered_capture(17);
    let manual = ingest(&per_camera);

    let config = ObsDbConfig {
        max_delta_approxsync: TOLERANCE,
        ..Default::default()
    };
    let (db, report) = build_database(ObservationInput::from_cameras(per_camera), &config).unwrap();

    assert_eq!(db.view_timestamps(), manual.view_timestamps());
    assert_eq!(report.num_views, manual.num_views());
    assert_eq!(report.num_cameras, NUM_CAMERAS);
}
