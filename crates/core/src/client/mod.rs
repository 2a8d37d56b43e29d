mod replica;

pub use replica::{ClientReplica, DEFAULT_MAX_PENDING, ReplicaEvent};
