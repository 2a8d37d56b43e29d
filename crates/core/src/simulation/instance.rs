use std::sync::Arc;

use crate::action::{ActionQueue, ActionSender, ActionStatus, GameAction};
use crate::error::Result;
use crate::snapshot::{DeltaHistory, DeltaSnapshot, DiffPolicy, Snapshot};

pub const DEFAULT_TICK_RATE: u32 = 15;
pub const DEFAULT_HISTORY_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct InstanceConfig {
    pub tick_rate: u32,
    pub history_capacity: usize,
    pub diff_policy: DiffPolicy,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            diff_policy: DiffPolicy::ChecksumGated,
        }
    }
}

impl InstanceConfig {
    /// Seconds simulated by one tick.
    pub fn dt(&self) -> f32 {
        let ms_per_tick = 1000.0 / self.tick_rate.max(1) as f32;
        ms_per_tick / 1000.0
    }
}

/// Everything one tick produced, ready to broadcast.
#[derive(Debug, Clone)]
pub struct TickOutcome {
    pub delta: Arc<DeltaSnapshot>,
    pub statuses: Vec<ActionStatus>,
    /// Actions applied during the tick, in the order they were played.
    pub actions: Vec<GameAction>,
}

impl TickOutcome {
    pub fn tick(&self) -> u32 {
        self.delta.next_tick()
    }

    pub fn failed_actions(&self) -> usize {
        self.statuses.iter().filter(|s| !s.success).count()
    }
}

/// Authoritative simulation. Owns the current snapshot and is driven from a
/// single thread; other threads only reach it through [`ActionSender`].
#[derive(Debug)]
pub struct GameInstance {
    config: InstanceConfig,
    current: Snapshot,
    queue: ActionQueue,
    history: DeltaHistory,
    statuses: Vec<ActionStatus>,
}

impl GameInstance {
    pub fn new(snapshot: Snapshot, config: InstanceConfig) -> Self {
        log::debug!(
            "Game instance starting at tick {} with {} objects ({} Hz)",
            snapshot.tick(),
            snapshot.len(),
            config.tick_rate
        );
        Self {
            history: DeltaHistory::new(config.history_capacity),
            config,
            current: snapshot,
            queue: ActionQueue::new(),
            statuses: Vec::new(),
        }
    }

    pub fn config(&self) -> &InstanceConfig {
        &self.config
    }

    pub fn dt(&self) -> f32 {
        self.config.dt()
    }

    pub fn tick(&self) -> u32 {
        self.current.tick()
    }

    pub fn current_snapshot(&self) -> &Snapshot {
        &self.current
    }

    /// Queues an action for the next tick. Actions queued while a tick is
    /// being applied are played by the tick after it.
    pub fn enqueue(&self, action: GameAction) {
        self.queue.push(action);
    }

    pub fn sender(&self) -> ActionSender {
        self.queue.sender()
    }

    pub fn pending_actions(&self) -> usize {
        self.queue.len()
    }

    /// Removes and returns the actions currently queued, in arrival order.
    pub fn drain_pending_action_list(&self) -> Vec<GameAction> {
        self.queue.drain()
    }

    /// Statuses of the actions played by the last tick.
    pub fn action_status_list(&self) -> &[ActionStatus] {
        &self.statuses
    }

    pub fn history(&self) -> &DeltaHistory {
        &self.history
    }

    /// Deltas needed to bring a replica at `tick` up to date, or `None` when
    /// it is too far behind and needs a full snapshot.
    pub fn deltas_since(&self, tick: u32) -> Option<Vec<Arc<DeltaSnapshot>>> {
        if tick == self.current.tick() {
            return Some(Vec::new());
        }
        self.history.since(tick)
    }

    /// Plays every queued action against a copy of the current snapshot,
    /// steps it by one tick and makes it current.
    ///
    /// Missing targets and rejected actions become failed statuses. Any other
    /// error aborts the tick and leaves the current snapshot untouched.
    pub fn apply_tick(&mut self) -> Result<TickOutcome> {
        let actions = self.drain_pending_action_list();
        self.apply_actions(actions)
    }

    pub fn apply_actions(&mut self, actions: Vec<GameAction>) -> Result<TickOutcome> {
        let mut next = self.current.successor();

        let mut statuses = Vec::with_capacity(actions.len());
        for action in &actions {
            statuses.push(play_action(action, &mut next)?);
        }

        next.update(self.dt())?;

        let delta = Arc::new(DeltaSnapshot::evaluate_with(
            &self.current,
            &next,
            self.config.diff_policy,
        )?);

        log::debug!(
            "Tick {}: {} actions, {} changed, {} added, {} deleted",
            delta.next_tick(),
            actions.len(),
            delta.delta_values().len(),
            delta.added_objects().len(),
            delta.deleted_objects().len()
        );

        self.current = next;
        self.history.push(Arc::clone(&delta));
        self.statuses.clone_from(&statuses);

        Ok(TickOutcome {
            delta,
            statuses,
            actions,
        })
    }
}

fn play_action(action: &GameAction, snapshot: &mut Snapshot) -> Result<ActionStatus> {
    match action.act(snapshot) {
        Ok(()) => {
            log::trace!("Action {} ({}) applied", action.id(), action.kind_name());
            Ok(ActionStatus::succeeded(action.id()))
        }
        Err(err) if err.is_recoverable() => {
            log::trace!("Action {} ({}) failed: {}", action.id(), action.kind_name(), err);
            Ok(ActionStatus::failed(action.id(), err.to_string()))
        }
        Err(err) => Err(err),
    }
}
