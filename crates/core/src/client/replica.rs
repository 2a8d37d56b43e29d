use std::collections::VecDeque;
use std::sync::Arc;

use crate::action::ActionStatus;
use crate::error::{ReplicaError, Result};
use crate::net::{Packet, Payload, decode_delta, decode_snapshot, tick_newer_than};
use crate::registry::ObjectRegistry;
use crate::snapshot::{DeltaSnapshot, Snapshot};

pub const DEFAULT_MAX_PENDING: usize = 8;

/// Structural changes observed when the rendered state moves forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplicaEvent {
    Spawned { id: u32, kind: &'static str },
    Despawned { id: u32 },
    /// The replica was reset from a full snapshot.
    Resynced { tick: u32 },
}

/// Receiving side of replication.
///
/// `latest` is the newest authoritative state. `base` trails it by the
/// deltas still in `pending`, so there is always a next state to
/// interpolate towards while rendering.
#[derive(Debug)]
pub struct ClientReplica {
    registry: Arc<ObjectRegistry>,
    base: Snapshot,
    latest: Snapshot,
    pending: VecDeque<Arc<DeltaSnapshot>>,
    max_pending: usize,
    events: Vec<ReplicaEvent>,
    statuses: Vec<ActionStatus>,
}

impl ClientReplica {
    pub fn new(registry: Arc<ObjectRegistry>, snapshot: Snapshot) -> Self {
        Self {
            registry,
            base: snapshot.clone(),
            latest: snapshot,
            pending: VecDeque::new(),
            max_pending: DEFAULT_MAX_PENDING,
            events: Vec::new(),
            statuses: Vec::new(),
        }
    }

    pub fn with_max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = max_pending.max(1);
        self
    }

    /// Tick of the newest authoritative state.
    pub fn tick(&self) -> u32 {
        self.latest.tick()
    }

    /// Tick the rendered state starts from.
    pub fn render_tick(&self) -> u32 {
        self.base.tick()
    }

    pub fn latest(&self) -> &Snapshot {
        &self.latest
    }

    pub fn base(&self) -> &Snapshot {
        &self.base
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Statuses broadcast with the most recent tick update.
    pub fn last_statuses(&self) -> &[ActionStatus] {
        &self.statuses
    }

    pub fn drain_events(&mut self) -> Vec<ReplicaEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn receive_full(&mut self, snapshot: Snapshot) {
        log::debug!(
            "Replica resynced at tick {} ({} objects)",
            snapshot.tick(),
            snapshot.len()
        );
        self.events.push(ReplicaEvent::Resynced {
            tick: snapshot.tick(),
        });
        self.base = snapshot.clone();
        self.latest = snapshot;
        self.pending.clear();
    }

    /// Queues a delta on top of `latest`. Returns `Ok(false)` for a delta the
    /// replica already has, and `OutOfSequence` when one or more ticks were
    /// missed; the caller should then request a resync.
    pub fn receive_delta(&mut self, delta: Arc<DeltaSnapshot>) -> Result<bool> {
        if !self.accepts(delta.prev_tick(), delta.next_tick())? {
            return Ok(false);
        }

        self.latest = self.latest.apply(&delta, 1.0)?;
        self.pending.push_back(delta);

        while self.pending.len() > self.max_pending {
            self.advance()?;
        }
        Ok(true)
    }

    /// Commits the oldest pending delta into the rendered state.
    pub fn advance(&mut self) -> Result<bool> {
        let Some(delta) = self.pending.pop_front() else {
            return Ok(false);
        };

        for id in delta.deleted_objects() {
            if self.base.contains(*id) {
                self.events.push(ReplicaEvent::Despawned { id: *id });
            }
        }
        for object in delta.added_objects().values() {
            self.events.push(ReplicaEvent::Spawned {
                id: object.id(),
                kind: object.kind_name(),
            });
        }

        self.base = self.base.apply(&delta, 1.0)?;
        Ok(true)
    }

    /// Render state `alpha` of the way from `base` to the next pending tick.
    pub fn sample(&self, alpha: f32) -> Result<Snapshot> {
        match self.pending.front() {
            Some(delta) => self.base.apply(delta, alpha),
            None => Ok(self.base.clone()),
        }
    }

    /// Decodes one server packet and feeds it into the replica.
    pub fn handle_packet(&mut self, data: &[u8]) -> Result<()> {
        let packet = Packet::deserialize(data)?;

        match packet.payload {
            Payload::FullSnapshot(record) => {
                let snapshot = decode_snapshot(&self.registry, &record)?;
                self.receive_full(snapshot);
            }
            Payload::TickUpdate {
                delta, statuses, ..
            } => {
                if !self.accepts(delta.prev_tick, delta.next_tick)? {
                    return Ok(());
                }
                let delta = decode_delta(&self.registry, &self.latest, &delta)?;
                self.receive_delta(Arc::new(delta))?;
                self.statuses = statuses;
            }
            Payload::Action(_) | Payload::ResyncRequest { .. } => {
                log::warn!(
                    "Replica ignoring client-bound payload at tick {}",
                    packet.header.tick
                );
            }
        }
        Ok(())
    }

    fn accepts(&self, prev_tick: u32, next_tick: u32) -> Result<bool> {
        let tick = self.latest.tick();
        if !tick_newer_than(next_tick, tick) {
            log::debug!("Dropping stale delta {} -> {}", prev_tick, next_tick);
            return Ok(false);
        }
        if prev_tick != tick {
            return Err(ReplicaError::OutOfSequence {
                expected: tick,
                found: prev_tick,
            });
        }
        Ok(true)
    }
}
