use thiserror::Error;

use crate::{CameraId, Real};

/// Errors reported by the observation database.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ObsDbError {
    #[error("approximate sync tolerance must be finite and non-negative, got {0}")]
    InvalidTolerance(Real),
    #[error("observation timestamp must be finite, got {0}")]
    InvalidTimestamp(Real),
    #[error(
        "camera {camera} already has an observation in the view at {timestamp}; \
         observation {obs_idx} was stored but not linked (try reducing the approximate sync tolerance)"
    )]
    Conflict {
        camera: CameraId,
        timestamp: Real,
        obs_idx: usize,
    },
    #[error("no view at timestamp {0}")]
    TimestampNotFound(Real),
    #[error("camera {camera} has no observation in the view at {timestamp}")]
    CameraNotInView { camera: CameraId, timestamp: Real },
}

impl ObsDbError {
    /// True for lookups of a timestamp or camera that is not in the view table.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ObsDbError::TimestampNotFound(_) | ObsDbError::CameraNotInView { .. }
        )
    }
}
