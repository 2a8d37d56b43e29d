pub mod action;
pub mod checksum;
pub mod client;
pub mod error;
pub mod net;
pub mod object;
pub mod registry;
pub mod simulation;
pub mod snapshot;
pub mod value;

#[cfg(test)]
mod testing;

pub use action::{ActionKind, ActionQueue, ActionSender, ActionStatus, GameAction};
pub use checksum::{Crc32, crc32};
pub use client::{ClientReplica, ReplicaEvent};
pub use error::{ReplicaError, Result};
pub use net::{
    Packet, PacketError, PacketHeader, Payload, decode_snapshot, deserialize_action,
    encode_action, encode_full_snapshot, encode_tick, serialize_action,
};
pub use object::{Attributes, DiffSet, GameObject, Kind, ObjectKind, Schema};
pub use registry::{ActionRegistry, ObjectRegistry, Registry};
pub use simulation::{DEFAULT_TICK_RATE, FixedTimestep, GameInstance, InstanceConfig, TickOutcome};
pub use snapshot::{DeltaHistory, DeltaSnapshot, DiffPolicy, Snapshot};
pub use value::{GameValue, ValueType};
