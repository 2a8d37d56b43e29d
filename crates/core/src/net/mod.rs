mod codec;
mod protocol;

pub use codec::{
    decode_action, decode_delta, decode_object, decode_snapshot, deserialize_action,
    encode_action, encode_full_snapshot, encode_resync_request, encode_tick, serialize_action,
};
pub use protocol::{
    ActionRecord, ArchivedPacket, DeltaRecord, ObjectDeltaRecord, ObjectRecord, PROTOCOL_MAGIC,
    PROTOCOL_VERSION, Packet, PacketError, PacketHeader, Payload, SnapshotRecord,
    TaggedActionRecord, ValueRecord, tick_newer_than,
};
