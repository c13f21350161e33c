//! Time-indexed table of approximately synchronised multi-camera views.
//!
//! Entries are kept in insertion order (the order callers see from
//! [`ViewTable::timestamps`]) while a sorted key index answers nearest-key
//! queries in `O(log n)`.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound::{Excluded, Unbounded};

use crate::{CameraId, Real};

/// Totally ordered timestamp key. `-0.0` is folded into `0.0`.
#[derive(Debug, Clone, Copy)]
struct TimeKey(Real);

impl TimeKey {
    fn new(t: Real) -> Self {
        Self(if t == 0.0 { 0.0 } else { t })
    }
}

impl PartialEq for TimeKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TimeKey {}

impl PartialOrd for TimeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Link from a view to one camera's stored observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSlot {
    /// Sequence index of the observation in the camera's store.
    pub obs_idx: usize,
    /// Cached feature ids of that observation.
    pub feature_ids: BTreeSet<usize>,
}

/// Observations judged to belong to the same physical instant.
///
/// Holds at most one slot per camera. Cameras are enumerated in the order
/// they joined the view.
#[derive(Debug, Clone)]
pub struct ViewEntry {
    timestamp: Real,
    cameras: Vec<(CameraId, ViewSlot)>,
}

impl ViewEntry {
    fn new(timestamp: Real) -> Self {
        Self {
            timestamp,
            cameras: Vec::new(),
        }
    }

    /// Representative timestamp, fixed when the view was created.
    pub fn timestamp(&self) -> Real {
        self.timestamp
    }

    pub fn num_cameras(&self) -> usize {
        self.cameras.len()
    }

    /// Camera ids in the order they joined the view.
    pub fn camera_ids(&self) -> impl Iterator<Item = CameraId> + '_ {
        self.cameras.iter().map(|(cam, _)| *cam)
    }

    pub fn contains(&self, camera: CameraId) -> bool {
        self.slot(camera).is_some()
    }

    pub fn slot(&self, camera: CameraId) -> Option<&ViewSlot> {
        self.cameras
            .iter()
            .find(|(cam, _)| *cam == camera)
            .map(|(_, slot)| slot)
    }

    pub fn slots(&self) -> impl Iterator<Item = (CameraId, &ViewSlot)> {
        self.cameras.iter().map(|(cam, slot)| (*cam, slot))
    }

    /// Returns `false` and leaves the entry untouched if `camera` is already present.
    pub(crate) fn insert(&mut self, camera: CameraId, slot: ViewSlot) -> bool {
        if self.contains(camera) {
            return false;
        }
        self.cameras.push((camera, slot));
        true
    }
}

/// Ordered mapping from representative timestamp to [`ViewEntry`].
#[derive(Debug, Clone, Default)]
pub struct ViewTable {
    entries: Vec<ViewEntry>,
    index: BTreeMap<TimeKey, usize>,
}

impl ViewTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, ViewEntry> {
        self.entries.iter()
    }

    /// Representative timestamps in insertion order.
    pub fn timestamps(&self) -> impl Iterator<Item = Real> + '_ {
        self.entries.iter().map(ViewEntry::timestamp)
    }

    pub fn get(&self, timestamp: Real) -> Option<&ViewEntry> {
        self.index
            .get(&TimeKey::new(timestamp))
            .map(|&pos| &self.entries[pos])
    }

    pub fn contains(&self, timestamp: Real) -> bool {
        self.index.contains_key(&TimeKey::new(timestamp))
    }

    /// Key closest to `timestamp`.
    ///
    /// When two keys are equally close the smaller one wins, independent of
    /// insertion order.
    pub fn nearest(&self, timestamp: Real) -> Option<Real> {
        let key = TimeKey::new(timestamp);
        let below = self.index.range(..=key).next_back().map(|(k, _)| k.0);
        let above = self
            .index
            .range((Excluded(key), Unbounded))
            .next()
            .map(|(k, _)| k.0);

        match (below, above) {
            (Some(b), Some(a)) => {
                if (a - timestamp).abs() < (timestamp - b).abs() {
                    Some(a)
                } else {
                    Some(b)
                }
            }
            (b, a) => b.or(a),
        }
    }

    /// Entry keyed by `timestamp`, appended at the end if it does not exist yet.
    pub(crate) fn entry(&mut self, timestamp: Real) -> &mut ViewEntry {
        let key = TimeKey::new(timestamp);
        let pos = match self.index.get(&key) {
            Some(&pos) => pos,
            None => {
                let pos = self.entries.len();
                self.entries.push(ViewEntry::new(key.0));
                self.index.insert(key, pos);
                pos
            }
        };
        &mut self.entries[pos]
    }

    /// Remove every listed view, keeping the remaining ones in order.
    ///
    /// Returns the number of views removed.
    pub(crate) fn remove_views(&mut self, timestamps: &[Real]) -> usize {
        if timestamps.is_empty() {
            return 0;
        }
        let doomed: BTreeSet<TimeKey> = timestamps.iter().map(|&t| TimeKey::new(t)).collect();
        let before = self.entries.len();
        self.entries
            .retain(|entry| !doomed.contains(&TimeKey::new(entry.timestamp)));
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(pos, entry)| (TimeKey::new(entry.timestamp), pos))
            .collect();
        before - self.entries.len()
    }
}
