//! Approximately synchronised observation database for multi-camera
//! calibration.
//!
//! Per-camera detections of a calibration target are archived in an
//! append-only store and grouped into *views*: sets of observations (at most
//! one per camera) whose timestamps lie within a tolerance of a common
//! representative timestamp. Downstream calibration stages shape the dataset
//! with filters and then query per-view, per-camera or per-camera-pair
//! sequences.
//!
//! # Example
//!
//! ```
//! use calib_obsdb::{ObservationDatabase, TargetObservation};
//!
//! let mut db = ObservationDatabase::new(0.05).unwrap();
//! db.add_observation(0, TargetObservation::ids_only(1.00, vec![0, 1, 2])).unwrap();
//! db.add_observation(1, TargetObservation::ids_only(1.02, vec![1, 2])).unwrap();
//! db.add_observation(0, TargetObservation::ids_only(2.00, vec![0])).unwrap();
//!
//! assert_eq!(db.view_timestamps(), vec![1.00, 2.00]);
//! assert_eq!(db.cameras_at(1.00).unwrap(), vec![0, 1]);
//! assert_eq!(db.paired_observations(0, 1).len(), 2);
//! ```

mod dataset;
mod db;
mod dump;
mod error;
mod filter;
mod math;
mod observation;
mod query;
mod store;
mod table;

pub use dataset::*;
pub use db::*;
pub use dump::*;
pub use error::*;
pub use filter::*;
pub use math::*;
pub use observation::*;
pub use query::*;
pub use store::*;
pub use table::*;
