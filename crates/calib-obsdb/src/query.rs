//! Read-only queries used to assemble calibration problems.

use std::collections::BTreeSet;

use crate::{CameraId, ObsDbError, ObservationDatabase, Real, ViewEntry, ViewSlot};

/// Observations of two cameras within one view.
///
/// At least one side is always present.
#[derive(Debug, PartialEq)]
pub enum PairedObservation<'a, O> {
    Both(&'a O, &'a O),
    OnlyFirst(&'a O),
    OnlySecond(&'a O),
}

impl<O> Clone for PairedObservation<'_, O> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<O> Copy for PairedObservation<'_, O> {}

impl<'a, O> PairedObservation<'a, O> {
    /// `None` when both sides are absent.
    pub fn from_options(first: Option<&'a O>, second: Option<&'a O>) -> Option<Self> {
        match (first, second) {
            (Some(a), Some(b)) => Some(Self::Both(a, b)),
            (Some(a), None) => Some(Self::OnlyFirst(a)),
            (None, Some(b)) => Some(Self::OnlySecond(b)),
            (None, None) => None,
        }
    }

    pub fn first(&self) -> Option<&'a O> {
        match *self {
            Self::Both(a, _) | Self::OnlyFirst(a) => Some(a),
            Self::OnlySecond(_) => None,
        }
    }

    pub fn second(&self) -> Option<&'a O> {
        match *self {
            Self::Both(_, b) | Self::OnlySecond(b) => Some(b),
            Self::OnlyFirst(_) => None,
        }
    }

    pub fn is_both(&self) -> bool {
        matches!(self, Self::Both(..))
    }
}

/// Multi-camera observations for one rig view.
#[derive(Debug)]
pub struct RigView<'a, O> {
    /// Representative timestamp of the view.
    pub timestamp: Real,
    /// Per-camera observation indexed by camera id; `None` if the camera
    /// didn't observe in this view.
    pub cameras: Vec<Option<&'a O>>,
}

impl<O> RigView<'_, O> {
    /// Number of cameras that observed the target in this view.
    pub fn num_observed(&self) -> usize {
        self.cameras.iter().filter(|c| c.is_some()).count()
    }
}

impl<O> ObservationDatabase<O> {
    fn view(&self, timestamp: Real) -> Result<&ViewEntry, ObsDbError> {
        self.table
            .get(timestamp)
            .ok_or(ObsDbError::TimestampNotFound(timestamp))
    }

    fn slot(&self, timestamp: Real, camera: CameraId) -> Result<&ViewSlot, ObsDbError> {
        self.view(timestamp)?
            .slot(camera)
            .ok_or(ObsDbError::CameraNotInView { camera, timestamp })
    }

    /// Observation behind a view slot. Slots only ever point at stored
    /// observations, and the store never shrinks.
    fn linked(&self, camera: CameraId, slot: &ViewSlot) -> &O {
        &self.store.camera(camera)[slot.obs_idx]
    }

    /// Number of cameras that have contributed at least one observation,
    /// whether or not any of them is still linked into a view.
    pub fn num_cameras(&self) -> usize {
        self.store.num_cameras()
    }

    pub fn num_views(&self) -> usize {
        self.table.len()
    }

    /// View keys in table (insertion) order. Sort explicitly for
    /// chronological order.
    pub fn view_timestamps(&self) -> Vec<Real> {
        self.table.timestamps().collect()
    }

    /// Cameras observing the view at `timestamp`, in the order they joined it.
    pub fn cameras_at(&self, timestamp: Real) -> Result<Vec<CameraId>, ObsDbError> {
        Ok(self.view(timestamp)?.camera_ids().collect())
    }

    /// `(camera, observation)` pairs of the view at `timestamp`.
    pub fn observations_at(&self, timestamp: Real) -> Result<Vec<(CameraId, &O)>, ObsDbError> {
        Ok(self
            .view(timestamp)?
            .slots()
            .map(|(cam, slot)| (cam, self.linked(cam, slot)))
            .collect())
    }

    pub fn observation_at(&self, timestamp: Real, camera: CameraId) -> Result<&O, ObsDbError> {
        let slot = self.slot(timestamp, camera)?;
        Ok(self.linked(camera, slot))
    }

    /// Store index of the observation `camera` contributed to the view.
    pub fn obs_index_at(&self, timestamp: Real, camera: CameraId) -> Result<usize, ObsDbError> {
        Ok(self.slot(timestamp, camera)?.obs_idx)
    }

    /// Cached feature ids seen by `camera` in the view at `timestamp`.
    pub fn feature_ids_at(
        &self,
        timestamp: Real,
        camera: CameraId,
    ) -> Result<&BTreeSet<usize>, ObsDbError> {
        Ok(&self.slot(timestamp, camera)?.feature_ids)
    }

    /// Observations of cameras `a` and `b` for every view where at least one
    /// of them is present, in table order.
    pub fn paired_observations(&self, a: CameraId, b: CameraId) -> Vec<PairedObservation<'_, O>> {
        self.table
            .iter()
            .filter_map(|view| {
                let first = view.slot(a).map(|slot| self.linked(a, slot));
                let second = view.slot(b).map(|slot| self.linked(b, slot));
                PairedObservation::from_options(first, second)
            })
            .collect()
    }

    /// Linked observations of `camera`, in table order.
    pub fn observations_for_camera(&self, camera: CameraId) -> Vec<&O> {
        self.table
            .iter()
            .filter_map(|view| view.slot(camera))
            .map(|slot| self.linked(camera, slot))
            .collect()
    }

    /// All views in chronological order, each dense over camera ids
    /// `0..=max_camera_id`.
    pub fn rig_views(&self) -> Vec<RigView<'_, O>> {
        let width = self.store.camera_ids().last().map_or(0, |id| id + 1);
        let mut views: Vec<RigView<'_, O>> = self
            .table
            .iter()
            .map(|view| {
                let mut cameras = vec![None; width];
                for (cam, slot) in view.slots() {
                    cameras[cam] = Some(self.linked(cam, slot));
                }
                RigView {
                    timestamp: view.timestamp(),
                    cameras,
                }
            })
            .collect();
        views.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        views
    }
}
