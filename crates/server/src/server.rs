use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use haraka::net::encode_resync_request;
use haraka::{
    ActionSender, ClientReplica, FixedTimestep, GameInstance, ObjectRegistry, ReplicaError,
    ReplicaEvent, Result, Snapshot, TickOutcome, encode_full_snapshot, encode_tick,
};

use crate::config::ServerConfig;
use crate::events::{ResyncReason, ServerEvent};

#[derive(Debug, Clone, Default)]
pub struct ServerStats {
    pub tick: u32,
    pub object_count: usize,
    pub actions_applied: u64,
    pub actions_failed: u64,
    pub bytes_broadcast: u64,
    pub resyncs: u64,
}

/// Authoritative tick loop plus one loopback replica that receives every
/// broadcast exactly as a remote client would.
pub struct GameServer {
    config: ServerConfig,
    game: GameInstance,
    replica: ClientReplica,
    timestep: FixedTimestep,
    last_frame: Instant,
    running: Arc<AtomicBool>,
    stats: ServerStats,
    pending_events: VecDeque<ServerEvent>,
}

impl GameServer {
    pub fn new(config: ServerConfig, world: Snapshot, objects: Arc<ObjectRegistry>) -> Result<Self> {
        let game = GameInstance::new(world, config.instance_config());
        let replica = ClientReplica::new(objects, Snapshot::new(0));

        let mut server = Self {
            timestep: FixedTimestep::from_config(&config.instance_config()),
            config,
            game,
            replica,
            last_frame: Instant::now(),
            running: Arc::new(AtomicBool::new(true)),
            stats: ServerStats::default(),
            pending_events: VecDeque::new(),
        };
        server.resync_replica(ResyncReason::Join)?;
        Ok(server)
    }

    pub fn running(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn sender(&self) -> ActionSender {
        self.game.sender()
    }

    pub fn stats(&self) -> &ServerStats {
        &self.stats
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = ServerEvent> + '_ {
        self.pending_events.drain(..)
    }

    pub fn run(&mut self) -> Result<()> {
        while self.running.load(Ordering::SeqCst) {
            self.tick_once()?;
            self.log_events();
            let idle = self.timestep.until_next_tick();
            std::thread::sleep(idle.max(Duration::from_millis(1)));
        }
        Ok(())
    }

    /// Runs every tick that is due. Returns how many ran.
    pub fn tick_once(&mut self) -> Result<u32> {
        let now = Instant::now();
        self.timestep.advance(now - self.last_frame);
        self.last_frame = now;

        let mut ticks_run = 0;
        while self.timestep.consume_tick() {
            self.tick()?;
            ticks_run += 1;

            if self.config.max_ticks.is_some_and(|max| self.stats.tick >= max) {
                self.running.store(false, Ordering::SeqCst);
                break;
            }
        }
        Ok(ticks_run)
    }

    pub fn tick(&mut self) -> Result<()> {
        let outcome = self.game.apply_tick()?;
        self.record(&outcome);

        let payload = encode_tick(&outcome)?;
        self.stats.bytes_broadcast += payload.len() as u64;
        self.deliver(&payload)?;

        // Render one tick behind the newest state.
        while self.replica.pending_len() > 1 {
            self.replica.advance()?;
        }
        self.forward_replica_events();

        let sample = self.replica.sample(self.timestep.alpha())?;
        log::trace!(
            "Replica renders tick {} with {} objects",
            sample.tick(),
            sample.len()
        );

        if self.stats.tick % self.config.stats_interval.max(1) == 0 {
            self.log_stats();
        }
        Ok(())
    }

    fn record(&mut self, outcome: &TickOutcome) {
        self.stats.tick = outcome.tick();
        self.stats.object_count = self.game.current_snapshot().len();

        let failed = outcome.failed_actions() as u64;
        self.stats.actions_failed += failed;
        self.stats.actions_applied += outcome.statuses.len() as u64 - failed;

        for status in outcome.statuses.iter().filter(|s| !s.success) {
            self.pending_events.push_back(ServerEvent::ActionRejected {
                action_id: status.action_id,
                message: status.message.clone(),
            });
        }
    }

    /// Hands a tick broadcast to the replica and resyncs it when it fell out
    /// of step with the server.
    fn deliver(&mut self, payload: &[u8]) -> Result<()> {
        match self.replica.handle_packet(payload) {
            Ok(()) => {}
            Err(ReplicaError::OutOfSequence { expected, found }) => {
                log::warn!(
                    "Replica at tick {} received delta from tick {}",
                    expected,
                    found
                );
                return self.resync_replica(ResyncReason::MissedTick);
            }
            Err(err) => return Err(err),
        }

        let expected = self.game.current_snapshot().checksum();
        let found = self.replica.latest().checksum();
        if expected != found {
            log::warn!(
                "Replica checksum {:#010x} differs from server {:#010x} at tick {}",
                found,
                expected,
                self.game.tick()
            );
            return self.resync_replica(ResyncReason::ChecksumMismatch);
        }
        Ok(())
    }

    fn forward_replica_events(&mut self) {
        for event in self.replica.drain_events() {
            match event {
                ReplicaEvent::Spawned { id, kind } => {
                    self.pending_events
                        .push_back(ServerEvent::ObjectSpawned { id, kind });
                }
                ReplicaEvent::Despawned { id } => {
                    self.pending_events
                        .push_back(ServerEvent::ObjectDespawned { id });
                }
                ReplicaEvent::Resynced { .. } => {}
            }
        }
    }

    fn resync_replica(&mut self, reason: ResyncReason) -> Result<()> {
        // The request stands in for what a remote client would send.
        let request = encode_resync_request(self.replica.tick())?;
        self.stats.bytes_broadcast += request.len() as u64;

        let payload = encode_full_snapshot(self.game.current_snapshot())?;
        self.stats.bytes_broadcast += payload.len() as u64;
        self.replica.handle_packet(&payload)?;
        self.replica.drain_events();

        if reason != ResyncReason::Join {
            self.stats.resyncs += 1;
        }
        self.pending_events.push_back(ServerEvent::ReplicaResynced {
            tick: self.game.tick(),
            reason,
        });
        Ok(())
    }

    fn log_events(&mut self) {
        for event in self.drain_events() {
            match event {
                ServerEvent::ActionRejected { action_id, message } => {
                    log::debug!("Action on {} rejected: {}", action_id, message);
                }
                ServerEvent::ObjectSpawned { id, kind } => {
                    log::info!("{} {} spawned", kind, id);
                }
                ServerEvent::ObjectDespawned { id } => {
                    log::info!("Object {} removed", id);
                }
                ServerEvent::ReplicaResynced { tick, reason } => {
                    log::info!("Replica resynced at tick {} ({})", tick, reason.as_str());
                }
            }
        }
    }

    fn log_stats(&self) {
        log::info!(
            "Tick {}: {} objects, {} actions applied, {} rejected, {} KiB broadcast, {} resyncs",
            self.stats.tick,
            self.stats.object_count,
            self.stats.actions_applied,
            self.stats.actions_failed,
            self.stats.bytes_broadcast / 1024,
            self.stats.resyncs
        );
    }
}
