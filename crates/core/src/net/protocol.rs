use rkyv::util::AlignedVec;
use rkyv::{Archive, Deserialize, Serialize, rancor};

use crate::action::ActionStatus;

pub const PROTOCOL_VERSION: u32 = 1;
pub const PROTOCOL_MAGIC: u32 = 0x4841_524B;

const TICK_WRAP_THRESHOLD: u32 = u32::MAX / 2;

/// Wrap-aware tick ordering.
#[inline]
pub fn tick_newer_than(t1: u32, t2: u32) -> bool {
    ((t1 > t2) && (t1 - t2 <= TICK_WRAP_THRESHOLD)) || ((t1 < t2) && (t2 - t1 > TICK_WRAP_THRESHOLD))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub struct PacketHeader {
    pub magic: u32,
    pub version: u32,
    /// Sender's current tick.
    pub tick: u32,
}

impl PacketHeader {
    pub fn new(tick: u32) -> Self {
        Self {
            magic: PROTOCOL_MAGIC,
            version: PROTOCOL_VERSION,
            tick,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.magic == PROTOCOL_MAGIC && self.version == PROTOCOL_VERSION
    }
}

/// One attribute: its name and fixed-width little-endian value bytes.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct ValueRecord {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct ObjectRecord {
    pub id: u32,
    pub kind: String,
    pub values: Vec<ValueRecord>,
}

/// Value deltas of one surviving object.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct ObjectDeltaRecord {
    pub id: u32,
    pub values: Vec<ValueRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct SnapshotRecord {
    pub tick: u32,
    pub objects: Vec<ObjectRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct DeltaRecord {
    pub prev_tick: u32,
    pub next_tick: u32,
    pub delta_objects: Vec<ObjectDeltaRecord>,
    pub added_objects: Vec<ObjectRecord>,
    pub deleted_objects: Vec<u32>,
}

/// Raw action body. The kind tag travels beside it.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct ActionRecord {
    pub id: u32,
    pub values: Vec<ValueRecord>,
}

impl ActionRecord {
    pub fn to_bytes(&self) -> Result<Vec<u8>, PacketError> {
        rkyv::to_bytes::<rancor::Error>(self)
            .map(|aligned| aligned.into_vec())
            .map_err(PacketError::Serialize)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, PacketError> {
        rkyv::from_bytes::<Self, rancor::Error>(&aligned(data)).map_err(PacketError::Deserialize)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct TaggedActionRecord {
    pub kind: String,
    pub action: ActionRecord,
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum Payload {
    /// Whole world state, sent on join and on resync.
    FullSnapshot(SnapshotRecord),
    /// Per-tick broadcast: the delta plus the actions that produced it.
    TickUpdate {
        delta: DeltaRecord,
        statuses: Vec<ActionStatus>,
        actions: Vec<TaggedActionRecord>,
    },
    Action(TaggedActionRecord),
    ResyncRequest {
        last_tick: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct Packet {
    pub header: PacketHeader,
    pub payload: Payload,
}

#[derive(Debug, thiserror::Error)]
pub enum PacketError {
    #[error("serialization failed: {0}")]
    Serialize(rancor::Error),
    #[error("deserialization failed: {0}")]
    Deserialize(rancor::Error),
    #[error("bad packet header (magic {magic:#010x}, version {version})")]
    InvalidHeader { magic: u32, version: u32 },
}

impl Packet {
    pub fn new(tick: u32, payload: Payload) -> Self {
        Self {
            header: PacketHeader::new(tick),
            payload,
        }
    }

    pub fn serialize(&self) -> Result<Vec<u8>, PacketError> {
        rkyv::to_bytes::<rancor::Error>(self)
            .map(|aligned| aligned.into_vec())
            .map_err(PacketError::Serialize)
    }

    /// Decodes and validates a packet from bytes of any alignment.
    pub fn deserialize(data: &[u8]) -> Result<Self, PacketError> {
        let packet = rkyv::from_bytes::<Self, rancor::Error>(&aligned(data))
            .map_err(PacketError::Deserialize)?;
        if !packet.header.is_valid() {
            return Err(PacketError::InvalidHeader {
                magic: packet.header.magic,
                version: packet.header.version,
            });
        }
        Ok(packet)
    }
}

fn aligned(data: &[u8]) -> AlignedVec {
    let mut buffer = AlignedVec::with_capacity(data.len());
    buffer.extend_from_slice(data);
    buffer
}
