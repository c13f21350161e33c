//! Dataset-shaping filters over the view table.
//!
//! Both filters decide on a snapshot of the view keys first and remove the
//! rejected views afterwards, so the table is never mutated mid-scan.

use std::collections::HashMap;

use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{CameraId, ObservationDatabase, Real};

/// Options for [`ObservationDatabase::pre_filter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreFilterOptions {
    /// Maximum number of views kept per camera tuple.
    pub max_occurrences: usize,
    /// Largest view arity subject to the cap. Views with more cameras are
    /// always kept. `None` caps every arity.
    pub max_capped_arity: Option<usize>,
    /// Seed for the processing order; `None` draws a fresh order each run.
    pub seed: Option<u64>,
}

impl Default for PreFilterOptions {
    fn default() -> Self {
        Self {
            max_occurrences: 100,
            max_capped_arity: Some(4),
            seed: None,
        }
    }
}

/// View counts around a filter run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterReport {
    pub views_before: usize,
    pub views_after: usize,
}

impl FilterReport {
    pub fn removed(&self) -> usize {
        self.views_before - self.views_after
    }
}

impl<O> ObservationDatabase<O> {
    /// Cap how often the same camera tuple may appear.
    ///
    /// Views seen by fewer than two cameras are dropped. For the remaining
    /// views up to `max_capped_arity` cameras, occurrences of the exact camera
    /// tuple are counted and a view is dropped once its tuple has been seen
    /// more than `max_occurrences` times. The tuple is taken in the order the
    /// cameras joined the view, so `(0, 1)` and `(1, 0)` are counted
    /// separately. Views are visited in shuffled order so the survivors are
    /// not biased towards early timestamps.
    pub fn pre_filter(&mut self, opts: &PreFilterOptions) -> FilterReport {
        match opts.seed {
            Some(seed) => self.pre_filter_with_rng(
                opts.max_occurrences,
                opts.max_capped_arity,
                &mut StdRng::seed_from_u64(seed),
            ),
            None => self.pre_filter_with_rng(
                opts.max_occurrences,
                opts.max_capped_arity,
                &mut rand::rng(),
            ),
        }
    }

    /// [`ObservationDatabase::pre_filter`] with a caller-provided RNG.
    pub fn pre_filter_with_rng<R: Rng + ?Sized>(
        &mut self,
        max_occurrences: usize,
        max_capped_arity: Option<usize>,
        rng: &mut R,
    ) -> FilterReport {
        let views_before = self.table.len();
        let mut order: Vec<Real> = self.table.timestamps().collect();
        order.shuffle(rng);

        let mut occurrences: HashMap<Vec<CameraId>, usize> = HashMap::new();
        let mut rejected = Vec::new();
        for t in order {
            let Some(view) = self.table.get(t) else {
                continue;
            };
            let arity = view.num_cameras();
            if arity < 2 {
                rejected.push(t);
                continue;
            }
            if max_capped_arity.is_some_and(|max| arity > max) {
                continue;
            }
            let count = occurrences.entry(view.camera_ids().collect()).or_default();
            *count += 1;
            if *count > max_occurrences {
                rejected.push(t);
            }
        }

        self.table.remove_views(&rejected);
        let report = FilterReport {
            views_before,
            views_after: self.table.len(),
        };
        info!(
            "pre-filter: {} views before, {} after ({} camera tuples)",
            report.views_before,
            report.views_after,
            occurrences.len()
        );
        report
    }

    /// Keep only views observed by at least one of the last
    /// `num_new_cameras` cameras, i.e. ids in `[N - n, N)` with
    /// `N = num_cameras()`.
    ///
    /// Used to restrict an incremental recalibration to views that involve
    /// newly added cameras. `num_new_cameras > N` keeps every view.
    pub fn replace_view_filter(&mut self, num_new_cameras: usize) -> FilterReport {
        let views_before = self.table.len();
        let num_cameras = self.num_cameras();
        if num_new_cameras == 0 {
            warn!("replace-view filter with zero new cameras removes every view");
        }
        let new_ids = num_cameras.saturating_sub(num_new_cameras)..num_cameras;

        let rejected: Vec<Real> = self
            .table
            .iter()
            .filter(|view| !view.camera_ids().any(|cam| new_ids.contains(&cam)))
            .map(|view| view.timestamp())
            .collect();

        self.table.remove_views(&rejected);
        let report = FilterReport {
            views_before,
            views_after: self.table.len(),
        };
        info!(
            "replace-view filter: {} views before, {} used for recalibration",
            report.views_before, report.views_after
        );
        report
    }
}
