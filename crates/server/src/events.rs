#[derive(Debug, Clone)]
pub enum ServerEvent {
    ActionRejected {
        action_id: u32,
        message: String,
    },
    ObjectSpawned {
        id: u32,
        kind: &'static str,
    },
    ObjectDespawned {
        id: u32,
    },
    ReplicaResynced {
        tick: u32,
        reason: ResyncReason,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResyncReason {
    Join,
    MissedTick,
    ChecksumMismatch,
}

impl ResyncReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResyncReason::Join => "joined",
            ResyncReason::MissedTick => "missed a tick",
            ResyncReason::ChecksumMismatch => "diverged from the server",
        }
    }
}
