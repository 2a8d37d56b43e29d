use crate::action::GameAction;
use crate::error::{ReplicaError, Result};
use crate::object::{Attributes, DiffSet, GameObject};
use crate::registry::{ActionRegistry, ObjectRegistry};
use crate::simulation::TickOutcome;
use crate::snapshot::{DeltaSnapshot, Snapshot};

use super::protocol::{
    ActionRecord, DeltaRecord, ObjectDeltaRecord, ObjectRecord, Packet, Payload, SnapshotRecord,
    TaggedActionRecord, ValueRecord,
};

fn value_records(values: &Attributes) -> Vec<ValueRecord> {
    values
        .iter()
        .map(|(name, value)| ValueRecord {
            name: name.to_string(),
            bytes: value.to_bytes(),
        })
        .collect()
}

/// Decodes each record into the slot of the same name; slots not listed
/// keep their current value.
fn fill_values(values: &mut Attributes, records: &[ValueRecord]) -> Result<()> {
    for record in records {
        values.decode(&record.name, &record.bytes)?;
    }
    Ok(())
}

impl From<&GameObject> for ObjectRecord {
    fn from(object: &GameObject) -> Self {
        Self {
            id: object.id(),
            kind: object.kind_name().to_string(),
            values: value_records(object.values()),
        }
    }
}

impl From<&Snapshot> for SnapshotRecord {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            tick: snapshot.tick(),
            objects: snapshot.objects().map(ObjectRecord::from).collect(),
        }
    }
}

impl From<&DeltaSnapshot> for DeltaRecord {
    fn from(delta: &DeltaSnapshot) -> Self {
        Self {
            prev_tick: delta.prev_tick(),
            next_tick: delta.next_tick(),
            delta_objects: delta
                .delta_values()
                .iter()
                .map(|(id, diff)| ObjectDeltaRecord {
                    id: *id,
                    values: diff
                        .iter()
                        .map(|(name, value)| ValueRecord {
                            name: name.clone(),
                            bytes: value.to_bytes(),
                        })
                        .collect(),
                })
                .collect(),
            added_objects: delta.added_objects().values().map(ObjectRecord::from).collect(),
            deleted_objects: delta.deleted_objects().iter().copied().collect(),
        }
    }
}

impl From<&GameAction> for ActionRecord {
    fn from(action: &GameAction) -> Self {
        Self {
            id: action.id(),
            values: value_records(action.values()),
        }
    }
}

impl From<&GameAction> for TaggedActionRecord {
    fn from(action: &GameAction) -> Self {
        Self {
            kind: action.kind_name().to_string(),
            action: ActionRecord::from(action),
        }
    }
}

/// Rebuilds an object by instantiating its kind and decoding each value
/// against the slot the kind registered.
pub fn decode_object(registry: &ObjectRegistry, record: &ObjectRecord) -> Result<GameObject> {
    let mut object = registry.instantiate(&record.kind, record.id)?;
    fill_values(object.values_mut(), &record.values)?;
    Ok(object)
}

pub fn decode_snapshot(registry: &ObjectRegistry, record: &SnapshotRecord) -> Result<Snapshot> {
    let mut snapshot = Snapshot::new(record.tick);
    for object in &record.objects {
        snapshot.add_object(decode_object(registry, object)?);
    }
    Ok(snapshot)
}

/// Delta bytes carry no type information, so each one is decoded against the
/// matching attribute of the object in `base`, the state the delta applies to.
///
/// Changed and deleted ids must exist in `base`, added ids must not, and no id
/// may appear twice; anything else is rejected with
/// [`ReplicaError::MalformedDelta`].
pub fn decode_delta(
    registry: &ObjectRegistry,
    base: &Snapshot,
    record: &DeltaRecord,
) -> Result<DeltaSnapshot> {
    let mut delta = DeltaSnapshot::new(record.prev_tick, record.next_tick);

    for object_delta in &record.delta_objects {
        let object = base.require_object(object_delta.id)?;
        if delta.object_delta(object_delta.id).is_some() {
            return Err(malformed(object_delta.id, "object changed twice"));
        }
        let diff = object_delta
            .values
            .iter()
            .map(|value| {
                let slot = object.values().slot(&value.name)?;
                Ok((value.name.clone(), slot.decode_like(&value.bytes)?))
            })
            .collect::<Result<DiffSet>>()?;
        delta.insert_delta(object_delta.id, diff);
    }
    for added in &record.added_objects {
        if base.contains(added.id) {
            return Err(malformed(added.id, "added object already exists"));
        }
        if delta.added_objects().contains_key(&added.id) {
            return Err(malformed(added.id, "object added twice"));
        }
        delta.insert_added(decode_object(registry, added)?);
    }
    for &id in &record.deleted_objects {
        if !base.contains(id) {
            return Err(malformed(id, "deleted object does not exist"));
        }
        if delta.object_delta(id).is_some() {
            return Err(malformed(id, "deleted object also changed"));
        }
        if delta.deleted_objects().contains(&id) {
            return Err(malformed(id, "object deleted twice"));
        }
        delta.insert_deleted(id);
    }

    Ok(delta)
}

fn malformed(id: u32, reason: &'static str) -> ReplicaError {
    ReplicaError::MalformedDelta { id, reason }
}

pub fn decode_action(registry: &ActionRegistry, record: &TaggedActionRecord) -> Result<GameAction> {
    let mut action = registry.instantiate(&record.kind, record.action.id)?;
    fill_values(action.values_mut(), &record.action.values)?;
    Ok(action)
}

/// Raw action body bytes, as handed to the transport alongside the kind tag.
pub fn serialize_action(action: &GameAction) -> Result<Vec<u8>> {
    Ok(ActionRecord::from(action).to_bytes()?)
}

/// Inverse of [`serialize_action`]: looks `kind` up in the registry and
/// decodes the body against the kind's attribute slots.
pub fn deserialize_action(registry: &ActionRegistry, kind: &str, bytes: &[u8]) -> Result<GameAction> {
    let record = TaggedActionRecord {
        kind: kind.to_string(),
        action: ActionRecord::from_bytes(bytes)?,
    };
    decode_action(registry, &record)
}

pub fn encode_full_snapshot(snapshot: &Snapshot) -> Result<Vec<u8>> {
    let packet = Packet::new(snapshot.tick(), Payload::FullSnapshot(snapshot.into()));
    Ok(packet.serialize()?)
}

pub fn encode_tick(outcome: &TickOutcome) -> Result<Vec<u8>> {
    let payload = Payload::TickUpdate {
        delta: outcome.delta.as_ref().into(),
        statuses: outcome.statuses.clone(),
        actions: outcome.actions.iter().map(TaggedActionRecord::from).collect(),
    };
    Ok(Packet::new(outcome.tick(), payload).serialize()?)
}

pub fn encode_action(tick: u32, action: &GameAction) -> Result<Vec<u8>> {
    Ok(Packet::new(tick, Payload::Action(action.into())).serialize()?)
}

pub fn encode_resync_request(last_tick: u32) -> Result<Vec<u8>> {
    Ok(Packet::new(last_tick, Payload::ResyncRequest { last_tick }).serialize()?)
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::error::ReplicaError;
    use crate::testing::{fighter, hit, mover, registries};
    use crate::value::GameValue;

    #[test]
    fn object_round_trip_keeps_checksum() {
        let (objects, _) = registries();
        let object = mover(5, 1.5, -2.0)
            .with_value("speed", Vec2::new(0.25, 0.0))
            .unwrap();

        let decoded = decode_object(&objects, &ObjectRecord::from(&object)).unwrap();
        assert_eq!(decoded.id(), 5);
        assert_eq!(decoded.kind_name(), "Mover");
        assert_eq!(decoded.checksum(), object.checksum());
    }

    #[test]
    fn unregistered_kind_is_rejected() {
        let (objects, _) = registries();
        let record = ObjectRecord {
            id: 1,
            kind: "NotExistingObject".to_string(),
            values: Vec::new(),
        };
        assert!(matches!(
            decode_object(&objects, &record),
            Err(ReplicaError::UnknownKind(_))
        ));
    }

    #[test]
    fn stray_attribute_is_rejected() {
        let (objects, _) = registries();
        let mut record = ObjectRecord::from(&fighter(0, 3));
        record.values.push(ValueRecord {
            name: "mana".to_string(),
            bytes: vec![0; 4],
        });
        assert!(matches!(
            decode_object(&objects, &record),
            Err(ReplicaError::UnknownAttribute { .. })
        ));
    }

    #[test]
    fn delta_decodes_against_base() {
        let (objects, _) = registries();
        let mut prev = Snapshot::new(0);
        prev.add_object(fighter(0, 10));
        prev.add_object(mover(1, 0.0, 0.0));
        let mut next = prev.successor();
        next.require_object_mut(0)
            .unwrap()
            .set_value("health", 6)
            .unwrap();
        next.delete_object(1);
        next.add_object(mover(2, 4.0, 4.0));

        let delta = DeltaSnapshot::evaluate(&prev, &next).unwrap();
        let decoded = decode_delta(&objects, &prev, &DeltaRecord::from(&delta)).unwrap();

        assert_eq!(decoded.next_tick(), 1);
        assert_eq!(decoded.object_delta(0).unwrap()["health"], GameValue::Int(-4));
        assert!(decoded.deleted_objects().contains(&1));
        assert_eq!(
            prev.apply(&decoded, 1.0).unwrap().checksum(),
            next.checksum()
        );

        assert!(matches!(
            decode_delta(&objects, &Snapshot::new(0), &DeltaRecord::from(&delta)),
            Err(ReplicaError::UnknownId(0))
        ));
    }

    #[test]
    fn overlapping_delta_sets_are_rejected() {
        let (objects, _) = registries();
        let mut base = Snapshot::new(0);
        base.add_object(fighter(0, 10));
        let empty = |next_tick| DeltaRecord {
            prev_tick: 0,
            next_tick,
            delta_objects: Vec::new(),
            added_objects: Vec::new(),
            deleted_objects: Vec::new(),
        };

        let mut respawn = empty(1);
        respawn.added_objects.push(ObjectRecord::from(&fighter(0, 10)));
        respawn.deleted_objects.push(0);
        assert!(matches!(
            decode_delta(&objects, &base, &respawn),
            Err(ReplicaError::MalformedDelta { id: 0, .. })
        ));

        let mut twice = empty(1);
        twice.added_objects.push(ObjectRecord::from(&fighter(4, 1)));
        twice.added_objects.push(ObjectRecord::from(&fighter(4, 2)));
        assert!(matches!(
            decode_delta(&objects, &base, &twice),
            Err(ReplicaError::MalformedDelta { id: 4, .. })
        ));

        let mut ghost = empty(1);
        ghost.deleted_objects.push(9);
        assert!(matches!(
            decode_delta(&objects, &base, &ghost),
            Err(ReplicaError::MalformedDelta { id: 9, .. })
        ));

        let mut changed_and_gone = empty(1);
        changed_and_gone.delta_objects.push(ObjectDeltaRecord {
            id: 0,
            values: Vec::new(),
        });
        changed_and_gone.deleted_objects.push(0);
        assert!(matches!(
            decode_delta(&objects, &base, &changed_and_gone),
            Err(ReplicaError::MalformedDelta { id: 0, .. })
        ));

        let mut spawn = empty(1);
        spawn.added_objects.push(ObjectRecord::from(&fighter(1, 10)));
        let decoded = decode_delta(&objects, &base, &spawn).unwrap();
        assert_eq!(decoded.added_objects().len(), 1);
    }

    #[test]
    fn action_bytes_round_trip() {
        let (_, actions) = registries();
        let action = hit(3).with_value("damage", 4).unwrap();

        let bytes = serialize_action(&action).unwrap();
        let decoded = deserialize_action(&actions, "Hit", &bytes).unwrap();
        assert_eq!(decoded.id(), 3);
        assert_eq!(decoded.value("damage"), Some(&GameValue::Int(4)));

        assert!(matches!(
            deserialize_action(&actions, "Fireball", &bytes),
            Err(ReplicaError::UnknownKind(_))
        ));
    }

    #[test]
    fn full_snapshot_packet() {
        let (objects, _) = registries();
        let mut snapshot = Snapshot::new(42);
        snapshot.add_object(fighter(0, 10));
        snapshot.add_object(mover(1, 1.0, 2.0));

        let bytes = encode_full_snapshot(&snapshot).unwrap();
        let packet = Packet::deserialize(&bytes).unwrap();
        assert_eq!(packet.header.tick, 42);

        let Payload::FullSnapshot(record) = packet.payload else {
            panic!("expected a full snapshot");
        };
        let decoded = decode_snapshot(&objects, &record).unwrap();
        assert_eq!(decoded.tick(), 42);
        assert_eq!(decoded.checksum(), snapshot.checksum());
    }
}
