//! Append-only per-camera observation archive.

use std::collections::BTreeMap;

use crate::CameraId;

/// Raw observations addressed by `(camera, sequence index)`.
///
/// Observations are never removed or reordered, so an index handed out by
/// [`ObservationStore::push`] stays valid for the lifetime of the store.
#[derive(Debug, Clone)]
pub struct ObservationStore<O> {
    cameras: BTreeMap<CameraId, Vec<O>>,
}

impl<O> Default for ObservationStore<O> {
    fn default() -> Self {
        Self {
            cameras: BTreeMap::new(),
        }
    }
}

impl<O> ObservationStore<O> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an observation and return its sequence index for `camera`.
    pub fn push(&mut self, camera: CameraId, obs: O) -> usize {
        let seq = self.cameras.entry(camera).or_default();
        seq.push(obs);
        seq.len() - 1
    }

    pub fn get(&self, camera: CameraId, idx: usize) -> Option<&O> {
        self.cameras.get(&camera).and_then(|seq| seq.get(idx))
    }

    /// All observations of one camera, in append order.
    pub fn camera(&self, camera: CameraId) -> &[O] {
        self.cameras.get(&camera).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of cameras with at least one stored observation.
    pub fn num_cameras(&self) -> usize {
        self.cameras.len()
    }

    /// Camera ids in ascending order.
    pub fn camera_ids(&self) -> impl Iterator<Item = CameraId> + '_ {
        self.cameras.keys().copied()
    }

    pub fn num_observations(&self, camera: CameraId) -> usize {
        self.cameras.get(&camera).map_or(0, Vec::len)
    }

    pub fn total_observations(&self) -> usize {
        self.cameras.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_follow_append_order() {
        let mut store = ObservationStore::new();
        assert_eq!(store.push(0, "a"), 0);
        assert_eq!(store.push(0, "b"), 1);
        assert_eq!(store.push(3, "c"), 0);

        assert_eq!(store.get(0, 1), Some(&"b"));
        assert_eq!(store.get(3, 0), Some(&"c"));
        assert_eq!(store.get(1, 0), None);
        assert_eq!(store.get(0, 2), None);
        assert_eq!(store.camera(0), &["a", "b"]);
        assert!(store.camera(7).is_empty());
    }

    #[test]
    fn counts_cameras_and_observations() {
        let mut store = ObservationStore::new();
        store.push(2, 1.0);
        store.push(0, 2.0);
        store.push(2, 3.0);

        assert_eq!(store.num_cameras(), 2);
        assert_eq!(store.camera_ids().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(store.num_observations(2), 2);
        assert_eq!(store.num_observations(5), 0);
        assert_eq!(store.total_observations(), 3);
    }
}
