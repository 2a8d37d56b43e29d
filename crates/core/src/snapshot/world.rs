use std::collections::BTreeMap;

use crate::checksum::Crc32;
use crate::error::{ReplicaError, Result};
use crate::object::GameObject;

use super::delta::DeltaSnapshot;

/// Complete world state at one tick. Owns its objects outright; cloning is a
/// deep copy and [`Snapshot::successor`] is the only way to move to the next
/// tick.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    tick: u32,
    objects: BTreeMap<u32, GameObject>,
}

impl Snapshot {
    pub fn new(tick: u32) -> Self {
        Self {
            tick,
            objects: BTreeMap::new(),
        }
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    /// Deep copy for the following tick, used as the mutable working state.
    pub fn successor(&self) -> Snapshot {
        Self {
            tick: self.tick.wrapping_add(1),
            objects: self.objects.clone(),
        }
    }

    /// Inserts `object`, returning any object it replaced under the same id.
    pub fn add_object(&mut self, object: GameObject) -> Option<GameObject> {
        self.objects.insert(object.id(), object)
    }

    pub fn delete_object(&mut self, id: u32) -> bool {
        self.objects.remove(&id).is_some()
    }

    pub fn get_object(&self, id: u32) -> Option<&GameObject> {
        self.objects.get(&id)
    }

    pub fn get_object_mut(&mut self, id: u32) -> Option<&mut GameObject> {
        self.objects.get_mut(&id)
    }

    pub fn require_object(&self, id: u32) -> Result<&GameObject> {
        self.objects.get(&id).ok_or(ReplicaError::UnknownId(id))
    }

    pub fn require_object_mut(&mut self, id: u32) -> Result<&mut GameObject> {
        self.objects.get_mut(&id).ok_or(ReplicaError::UnknownId(id))
    }

    pub fn contains(&self, id: u32) -> bool {
        self.objects.contains_key(&id)
    }

    /// Objects in ascending id order.
    pub fn objects(&self) -> impl Iterator<Item = &GameObject> {
        self.objects.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.objects.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn update(&mut self, delta_time: f32) -> Result<()> {
        for object in self.objects.values_mut() {
            object.update(delta_time)?;
        }
        Ok(())
    }

    /// Builds the state `interp` of the way from `self` towards the delta's
    /// next tick. Objects are only added or removed when `interp == 1.0`;
    /// partial application only moves attribute values of existing objects.
    pub fn apply(&self, delta: &DeltaSnapshot, interp: f32) -> Result<Snapshot> {
        if !(0.0..=1.0).contains(&interp) {
            return Err(ReplicaError::OutOfRange(interp));
        }

        let commit = interp == 1.0;
        let mut result = self.clone();

        if commit {
            result.tick = delta.next_tick();
            for (id, object) in delta.added_objects() {
                result.objects.insert(*id, object.clone());
            }
            for id in delta.deleted_objects() {
                result.objects.remove(id);
            }
        }

        for (id, diffset) in delta.delta_values() {
            result
                .objects
                .get_mut(id)
                .ok_or(ReplicaError::UnknownId(*id))?
                .interpolate_in_place(diffset, interp)?;
        }

        Ok(result)
    }

    /// Order-independent fingerprint of every object id and state, used to
    /// detect replicas that drifted from the authoritative snapshot.
    pub fn checksum(&self) -> u32 {
        self.objects.values().fold(0, |acc, object| {
            let mut crc = Crc32::new();
            crc.update(&object.id().to_le_bytes());
            crc.update(&object.checksum().to_le_bytes());
            acc ^ crc.finish()
        })
    }
}
