use std::time::Duration;

use crossbeam_channel::{Receiver, Select, Sender, unbounded};

use super::game_action::GameAction;

/// Cloneable handle for producing actions from any thread.
#[derive(Debug, Clone)]
pub struct ActionSender {
    sender: Sender<GameAction>,
}

impl ActionSender {
    /// Returns `false` once the owning queue has been dropped.
    pub fn send(&self, action: GameAction) -> bool {
        self.sender.send(action).is_ok()
    }
}

/// Multi-producer queue of pending actions consumed once per tick.
#[derive(Debug)]
pub struct ActionQueue {
    sender: Sender<GameAction>,
    receiver: Receiver<GameAction>,
}

impl Default for ActionQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionQueue {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    pub fn sender(&self) -> ActionSender {
        ActionSender {
            sender: self.sender.clone(),
        }
    }

    pub fn push(&self, action: GameAction) {
        // The queue holds its own receiver, so the channel cannot be disconnected.
        let _ = self.sender.send(action);
    }

    /// Takes every action queued at the moment of the call, in arrival order.
    /// Actions that arrive while draining stay queued for the next tick.
    pub fn drain(&self) -> Vec<GameAction> {
        let cut = self.receiver.len();
        self.receiver.try_iter().take(cut).collect()
    }

    /// Blocks until an action is queued or `timeout` elapses. Nothing is
    /// dequeued, so arrival order is untouched.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        if !self.receiver.is_empty() {
            return true;
        }
        let mut select = Select::new();
        select.recv(&self.receiver);
        select.ready_timeout(timeout).is_ok() && !self.receiver.is_empty()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}
