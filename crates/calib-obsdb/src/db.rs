//! Observation database with approximate time synchronisation.
//!
//! Layout of the view table:
//!
//! ```text
//! | timestamp | cam0: obs_idx, feature_ids | ... | camN: obs_idx, feature_ids |
//! ```
//!
//! Each incoming observation is appended to its camera's store and then
//! linked into the view whose representative timestamp is closest, provided it
//! lies within the sync tolerance. Otherwise it opens a new view keyed by its
//! own timestamp. View keys are never re-centred, so a view that keeps
//! absorbing skewed observations can span more than twice the tolerance.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{CameraId, ObsDbError, Observation, ObservationStore, Real, ViewSlot, ViewTable};

/// Where an observation ended up after ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewAssignment {
    /// Key of the view the observation was linked into.
    pub timestamp: Real,
    /// Sequence index in the camera's store.
    pub obs_idx: usize,
    /// Whether the view was created by this observation.
    pub new_view: bool,
}

/// An observation that was stored but could not be linked into its view
/// because the camera was already present there.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub camera: CameraId,
    /// Key of the view that rejected the observation.
    pub timestamp: Real,
    /// Sequence index of the orphaned observation.
    pub obs_idx: usize,
}

impl From<Conflict> for ObsDbError {
    fn from(c: Conflict) -> Self {
        ObsDbError::Conflict {
            camera: c.camera,
            timestamp: c.timestamp,
            obs_idx: c.obs_idx,
        }
    }
}

/// Observations of a multi-camera rig grouped into synchronised views.
#[derive(Debug, Clone)]
pub struct ObservationDatabase<O> {
    max_delta_approxsync: Real,
    pub(crate) store: ObservationStore<O>,
    pub(crate) table: ViewTable,
    conflicts: Vec<Conflict>,
}

impl<O> ObservationDatabase<O> {
    /// Create an empty database.
    ///
    /// `max_delta_approxsync` is the largest timestamp difference (seconds)
    /// at which an observation is merged into an existing view.
    ///
    /// # Errors
    ///
    /// [`ObsDbError::InvalidTolerance`] if the tolerance is negative or not finite.
    pub fn new(max_delta_approxsync: Real) -> Result<Self, ObsDbError> {
        if !max_delta_approxsync.is_finite() || max_delta_approxsync < 0.0 {
            return Err(ObsDbError::InvalidTolerance(max_delta_approxsync));
        }
        Ok(Self {
            max_delta_approxsync,
            store: ObservationStore::new(),
            table: ViewTable::new(),
            conflicts: Vec::new(),
        })
    }

    pub fn max_delta_approxsync(&self) -> Real {
        self.max_delta_approxsync
    }

    pub fn store(&self) -> &ObservationStore<O> {
        &self.store
    }

    pub fn table(&self) -> &ViewTable {
        &self.table
    }

    /// Observations rejected as duplicates within a view, in arrival order.
    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }
}

impl<O: Observation> ObservationDatabase<O> {
    /// Store `obs` for `camera` and link it into a synchronised view.
    ///
    /// # Errors
    ///
    /// - [`ObsDbError::InvalidTimestamp`] for a non-finite timestamp; nothing
    ///   is stored.
    /// - [`ObsDbError::Conflict`] if the matched view already holds an
    ///   observation from `camera`. The new observation stays in the store
    ///   but is not reachable through the view table. The conflict is also
    ///   recorded in [`ObservationDatabase::conflicts`].
    pub fn add_observation(
        &mut self,
        camera: CameraId,
        obs: O,
    ) -> Result<ViewAssignment, ObsDbError> {
        let t = obs.timestamp();
        if !t.is_finite() {
            return Err(ObsDbError::InvalidTimestamp(t));
        }

        let feature_ids = obs.feature_ids().iter().copied().collect();
        let obs_idx = self.store.push(camera, obs);

        let (timestamp, new_view) = match self.table.nearest(t) {
            Some(k) if (k - t).abs() <= self.max_delta_approxsync => (k, false),
            _ => (t, true),
        };

        let entry = self.table.entry(timestamp);
        if !entry.insert(camera, ViewSlot { obs_idx, feature_ids }) {
            let conflict = Conflict {
                camera,
                timestamp,
                obs_idx,
            };
            warn!(
                "camera {} already observed the view at {}; observation {} (t = {}) left unlinked, \
                 consider reducing the approximate sync tolerance",
                camera, timestamp, obs_idx, t
            );
            self.conflicts.push(conflict);
            return Err(conflict.into());
        }

        debug!(
            "camera {} obs {} (t = {}) -> view {}{}",
            camera,
            obs_idx,
            t,
            timestamp,
            if new_view { " (new)" } else { "" }
        );

        Ok(ViewAssignment {
            timestamp,
            obs_idx,
            new_view,
        })
    }
}
