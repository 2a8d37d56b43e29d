use std::collections::{BTreeMap, BTreeSet};

use crate::error::Result;
use crate::object::{DiffSet, GameObject};

use super::world::Snapshot;

/// How [`DeltaSnapshot::evaluate_with`] decides which surviving objects
/// changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiffPolicy {
    /// Objects whose checksums match are assumed unchanged.
    #[default]
    ChecksumGated,
    /// Every surviving object is compared attribute by attribute.
    Full,
}

/// Difference between two snapshots: value deltas for surviving objects,
/// full copies of spawned ones and the ids of removed ones. The three sets
/// are pairwise disjoint.
#[derive(Debug, Clone, Default)]
pub struct DeltaSnapshot {
    prev_tick: u32,
    next_tick: u32,
    delta_values: BTreeMap<u32, DiffSet>,
    added_objects: BTreeMap<u32, GameObject>,
    deleted_objects: BTreeSet<u32>,
}

impl DeltaSnapshot {
    pub fn new(prev_tick: u32, next_tick: u32) -> Self {
        Self {
            prev_tick,
            next_tick,
            ..Default::default()
        }
    }

    pub fn evaluate(prev: &Snapshot, next: &Snapshot) -> Result<Self> {
        Self::evaluate_with(prev, next, DiffPolicy::default())
    }

    pub fn evaluate_with(prev: &Snapshot, next: &Snapshot, policy: DiffPolicy) -> Result<Self> {
        let mut delta = Self::new(prev.tick(), next.tick());

        for before in prev.objects() {
            let id = before.id();
            let Some(after) = next.get_object(id) else {
                delta.deleted_objects.insert(id);
                continue;
            };

            let changed = before.checksum() != after.checksum();
            match policy {
                DiffPolicy::ChecksumGated => {
                    if changed {
                        delta.delta_values.insert(id, before.compare(after)?);
                    }
                }
                DiffPolicy::Full => {
                    let diff = before.compare(after)?;
                    if diff.values().any(|value| !value.is_identity()) {
                        if !changed {
                            log::warn!(
                                "Object {} changed between ticks {} and {} with an unchanged checksum",
                                id,
                                prev.tick(),
                                next.tick()
                            );
                        }
                        delta.delta_values.insert(id, diff);
                    }
                }
            }
        }

        for after in next.objects() {
            if !prev.contains(after.id()) {
                delta.added_objects.insert(after.id(), after.clone());
            }
        }

        log::trace!(
            "Delta {} -> {}: {} changed, {} added, {} deleted",
            delta.prev_tick,
            delta.next_tick,
            delta.delta_values.len(),
            delta.added_objects.len(),
            delta.deleted_objects.len()
        );

        Ok(delta)
    }

    pub fn prev_tick(&self) -> u32 {
        self.prev_tick
    }

    pub fn next_tick(&self) -> u32 {
        self.next_tick
    }

    pub fn delta_values(&self) -> &BTreeMap<u32, DiffSet> {
        &self.delta_values
    }

    pub fn added_objects(&self) -> &BTreeMap<u32, GameObject> {
        &self.added_objects
    }

    pub fn deleted_objects(&self) -> &BTreeSet<u32> {
        &self.deleted_objects
    }

    pub fn object_delta(&self, id: u32) -> Option<&DiffSet> {
        self.delta_values.get(&id)
    }

    /// True when applying the delta only advances the tick.
    pub fn is_empty(&self) -> bool {
        self.delta_values.is_empty() && self.added_objects.is_empty() && self.deleted_objects.is_empty()
    }

    pub(crate) fn insert_delta(&mut self, id: u32, diff: DiffSet) {
        self.delta_values.insert(id, diff);
    }

    pub(crate) fn insert_added(&mut self, object: GameObject) {
        self.added_objects.insert(object.id(), object);
    }

    pub(crate) fn insert_deleted(&mut self, id: u32) {
        self.deleted_objects.insert(id);
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::testing::{fighter, mover, position};
    use crate::value::GameValue;

    fn pair() -> (Snapshot, Snapshot) {
        let mut prev = Snapshot::new(0);
        prev.add_object(mover(0, 0.0, 0.0));
        prev.add_object(mover(1, 0.0, 0.0));
        let next = prev.successor();
        (prev, next)
    }

    #[test]
    fn unchanged_snapshot_yields_empty_delta() {
        let (prev, next) = pair();
        for policy in [DiffPolicy::ChecksumGated, DiffPolicy::Full] {
            let delta = DeltaSnapshot::evaluate_with(&prev, &next, policy).unwrap();
            assert!(delta.is_empty());
            assert_eq!(delta.prev_tick(), 0);
            assert_eq!(delta.next_tick(), 1);
        }
    }

    #[test]
    fn partial_apply_moves_changed_objects_only() {
        let (prev, mut next) = pair();
        next.require_object_mut(0)
            .unwrap()
            .set_value("position", Vec2::ONE)
            .unwrap();

        let delta = DeltaSnapshot::evaluate(&prev, &next).unwrap();
        assert_eq!(delta.delta_values().len(), 1);
        assert!(delta.object_delta(1).is_none());

        let half = prev.apply(&delta, 0.5).unwrap();
        assert_eq!(position(&half, 0), Some(Vec2::new(0.5, 0.5)));
        assert_eq!(position(&half, 1), Some(Vec2::ZERO));
    }

    #[test]
    fn added_objects_appear_only_when_committed() {
        let (prev, mut next) = pair();
        next.add_object(mover(2, 3.0, 3.0));

        let delta = DeltaSnapshot::evaluate(&prev, &next).unwrap();
        assert_eq!(delta.added_objects().len(), 1);
        assert!(delta.delta_values().is_empty());

        assert!(!prev.apply(&delta, 0.99).unwrap().contains(2));
        let full = prev.apply(&delta, 1.0).unwrap();
        assert_eq!(position(&full, 2), Some(Vec2::new(3.0, 3.0)));
    }

    #[test]
    fn deleted_objects_vanish_only_when_committed() {
        let (prev, mut next) = pair();
        next.delete_object(1);

        let delta = DeltaSnapshot::evaluate(&prev, &next).unwrap();
        assert!(delta.deleted_objects().contains(&1));

        assert!(prev.apply(&delta, 0.5).unwrap().contains(1));
        assert!(!prev.apply(&delta, 1.0).unwrap().contains(1));
    }

    #[test]
    fn sets_are_disjoint() {
        let mut prev = Snapshot::new(0);
        prev.add_object(fighter(0, 10));
        prev.add_object(fighter(1, 10));
        let mut next = prev.successor();
        next.require_object_mut(0)
            .unwrap()
            .set_value("health", 9)
            .unwrap();
        next.delete_object(1);
        next.add_object(fighter(2, 10));

        let delta = DeltaSnapshot::evaluate(&prev, &next).unwrap();
        let changed: BTreeSet<u32> = delta.delta_values().keys().copied().collect();
        let added: BTreeSet<u32> = delta.added_objects().keys().copied().collect();

        assert_eq!(changed, BTreeSet::from([0]));
        assert_eq!(added, BTreeSet::from([2]));
        assert_eq!(delta.deleted_objects(), &BTreeSet::from([1]));
    }

    #[test]
    fn full_apply_reproduces_next() {
        let mut prev = Snapshot::new(7);
        prev.add_object(fighter(0, 10));
        let mut next = prev.successor();
        {
            let object = next.require_object_mut(0).unwrap();
            object.set_value("health", 4).unwrap();
            object.set_value("team", GameValue::IntNoInterp(2)).unwrap();
        }

        let delta = DeltaSnapshot::evaluate(&prev, &next).unwrap();
        let applied = prev.apply(&delta, 1.0).unwrap();
        assert_eq!(applied.tick(), 8);
        assert_eq!(applied.checksum(), next.checksum());
    }
}
