//! Observation types fed into the database.
//!
//! The database only needs two things from an observation: when it was
//! captured and which target features it saw. [`Observation`] captures
//! exactly that, so detectors can hand over their own record types.
//! [`TargetObservation`] is the canonical record for planar targets.

use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};

use crate::{Pt2, Pt3, Real};

/// Capability interface required by the observation database.
pub trait Observation {
    /// Capture time in seconds.
    fn timestamp(&self) -> Real;

    /// Identifiers of the target features (e.g. board corners) seen.
    fn feature_ids(&self) -> &[usize];
}

/// One camera's detection of a planar calibration target.
///
/// # Example
///
/// ```
/// use calib_obsdb::{Observation, Pt2, Pt3, TargetObservation};
///
/// let obs = TargetObservation::new(
///     1.25,
///     vec![0, 1],
///     vec![Pt2::new(320.0, 240.0), Pt2::new(400.0, 240.0)],
///     vec![Pt3::new(0.0, 0.0, 0.0), Pt3::new(0.1, 0.0, 0.0)],
/// )
/// .unwrap();
///
/// assert_eq!(obs.len(), 2);
/// assert_eq!(obs.feature_ids(), &[0, 1]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetObservation {
    /// Capture time in seconds.
    pub timestamp: Real,
    /// Target corner identifiers, one per detected point.
    pub corner_ids: Vec<usize>,
    /// Detected corners in pixels.
    pub points_2d: Vec<Pt2>,
    /// The same corners in the target frame.
    pub points_3d: Vec<Pt3>,
}

impl TargetObservation {
    /// Build an observation from per-corner data.
    ///
    /// # Errors
    ///
    /// Returns an error if the timestamp is not finite or the corner id,
    /// pixel and target point counts differ.
    pub fn new(
        timestamp: Real,
        corner_ids: Vec<usize>,
        points_2d: Vec<Pt2>,
        points_3d: Vec<Pt3>,
    ) -> Result<Self> {
        ensure!(timestamp.is_finite(), "timestamp must be finite, got {timestamp}");
        ensure!(
            corner_ids.len() == points_2d.len() && points_2d.len() == points_3d.len(),
            "corner id / 2D / 3D counts must match: {} vs {} vs {}",
            corner_ids.len(),
            points_2d.len(),
            points_3d.len()
        );
        Ok(Self {
            timestamp,
            corner_ids,
            points_2d,
            points_3d,
        })
    }

    /// Observation that only carries corner ids, for detectors that report
    /// geometry elsewhere.
    pub fn ids_only(timestamp: Real, corner_ids: Vec<usize>) -> Self {
        Self {
            timestamp,
            corner_ids,
            points_2d: Vec::new(),
            points_3d: Vec::new(),
        }
    }

    /// Number of detected corners.
    #[inline]
    pub fn len(&self) -> usize {
        self.corner_ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.corner_ids.is_empty()
    }

    /// Iterate over (corner id, pixel, target point) triples.
    ///
    /// Empty for observations built with [`TargetObservation::ids_only`].
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Pt2, &Pt3)> {
        self.corner_ids
            .iter()
            .zip(self.points_2d.iter())
            .zip(self.points_3d.iter())
            .map(|((id, p2), p3)| (*id, p2, p3))
    }
}

impl Observation for TargetObservation {
    fn timestamp(&self) -> Real {
        self.timestamp
    }

    fn feature_ids(&self) -> &[usize] {
        &self.corner_ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_observation_creation() {
        let obs = TargetObservation::new(
            0.5,
            vec![3, 7],
            vec![Pt2::new(10.0, 20.0), Pt2::new(30.0, 40.0)],
            vec![Pt3::new(0.0, 0.0, 0.0), Pt3::new(0.05, 0.0, 0.0)],
        )
        .unwrap();

        assert_eq!(obs.len(), 2);
        assert!(!obs.is_empty());
        assert_eq!(obs.timestamp(), 0.5);
        let ids: Vec<usize> = obs.iter().map(|(id, _, _)| id).collect();
        assert_eq!(ids, vec![3, 7]);
    }

    #[test]
    fn target_observation_rejects_mismatch() {
        let res = TargetObservation::new(
            0.0,
            vec![0, 1],
            vec![Pt2::new(10.0, 20.0)],
            vec![Pt3::new(0.0, 0.0, 0.0)],
        );
        assert!(res.is_err());
    }

    #[test]
    fn target_observation_rejects_nan_timestamp() {
        let res = TargetObservation::new(Real::NAN, vec![], vec![], vec![]);
        assert!(res.is_err());
    }

    #[test]
    fn ids_only_has_no_geometry() {
        let obs = TargetObservation::ids_only(2.0, vec![1, 2, 3]);
        assert_eq!(obs.len(), 3);
        assert_eq!(obs.feature_ids(), &[1, 2, 3]);
        assert_eq!(obs.iter().count(), 0);
    }

    #[test]
    fn target_observation_serde_roundtrip() {
        let obs = TargetObservation::new(
            1.0,
            vec![4],
            vec![Pt2::new(1.0, 2.0)],
            vec![Pt3::new(0.1, 0.2, 0.0)],
        )
        .unwrap();

        let json = serde_json::to_string(&obs).unwrap();
        let restored: TargetObservation = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, obs);
    }
}
