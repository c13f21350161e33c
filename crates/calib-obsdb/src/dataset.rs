//! Serializable input, configuration and the ingest pipeline.
//!
//! This is the entry point used by the CLI: feed a list of camera
//! observations through approximate sync, then apply the configured filters.

use anyhow::{Context, Result, ensure};
use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    CameraId, Conflict, FilterReport, ObsDbError, ObservationDatabase, PreFilterOptions, Real,
    TargetObservation,
};

/// One observation tagged with the camera that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub camera: CameraId,
    pub observation: TargetObservation,
}

/// Observations in ingestion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservationInput {
    pub records: Vec<ObservationRecord>,
}

impl ObservationInput {
    /// Flatten per-camera streams camera by camera; `per_camera[i]` belongs
    /// to camera `i`.
    pub fn from_cameras(per_camera: Vec<Vec<TargetObservation>>) -> Self {
        let records = per_camera
            .into_iter()
            .enumerate()
            .flat_map(|(camera, stream)| {
                stream
                    .into_iter()
                    .map(move |observation| ObservationRecord {
                        camera,
                        observation,
                    })
            })
            .collect();
        Self { records }
    }
}

/// Configuration of the ingest pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObsDbConfig {
    /// Approximate sync tolerance in seconds.
    pub max_delta_approxsync: Real,
    /// Co-occurrence capping; skipped if `None`.
    pub pre_filter: Option<PreFilterOptions>,
    /// Number of newly added cameras for the replace-view filter; skipped if
    /// `None`.
    pub num_new_cameras: Option<usize>,
}

impl Default for ObsDbConfig {
    fn default() -> Self {
        Self {
            max_delta_approxsync: 0.0,
            pre_filter: None,
            num_new_cameras: None,
        }
    }
}

impl ObsDbConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.max_delta_approxsync.is_finite() && self.max_delta_approxsync >= 0.0,
            "max_delta_approxsync must be finite and non-negative, got {}",
            self.max_delta_approxsync
        );
        if let Some(n) = self.num_new_cameras {
            ensure!(n > 0, "num_new_cameras must be positive");
        }
        Ok(())
    }
}

/// Summary of a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub num_cameras: usize,
    pub num_observations: usize,
    /// Views right after ingestion, before any filter.
    pub num_synced_views: usize,
    /// Views left after all filters.
    pub num_views: usize,
    /// Observations stored but left out of the view table.
    pub conflicts: Vec<Conflict>,
    pub pre_filter: Option<FilterReport>,
    pub replace_view_filter: Option<FilterReport>,
}

/// Ingest `input` and apply the filters enabled in `config`.
///
/// Conflicts are tolerated and listed in the report; any other ingestion
/// error aborts the run.
pub fn build_database(
    input: ObservationInput,
    config: &ObsDbConfig,
) -> Result<(ObservationDatabase<TargetObservation>, IngestReport)> {
    config.validate()?;
    let mut db = ObservationDatabase::new(config.max_delta_approxsync)?;

    for (idx, record) in input.records.into_iter().enumerate() {
        match db.add_observation(record.camera, record.observation) {
            Ok(_) | Err(ObsDbError::Conflict { .. }) => {}
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("failed to ingest record {} (camera {})", idx, record.camera)
                });
            }
        }
    }

    let num_synced_views = db.num_views();
    info!(
        "ingested {} observations from {} cameras into {} views ({} conflicts)",
        db.store().total_observations(),
        db.num_cameras(),
        num_synced_views,
        db.conflicts().len()
    );

    let pre_filter = config.pre_filter.as_ref().map(|opts| db.pre_filter(opts));
    let replace_view_filter = config
        .num_new_cameras
        .map(|n| db.replace_view_filter(n));

    let report = IngestReport {
        num_cameras: db.num_cameras(),
        num_observations: db.store().total_observations(),
        num_synced_views,
        num_views: db.num_views(),
        conflicts: db.conflicts().to_vec(),
        pre_filter,
        replace_view_filter,
    };
    Ok((db, report))
}
