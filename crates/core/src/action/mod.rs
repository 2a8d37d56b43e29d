mod game_action;
mod queue;

pub use game_action::{ActionKind, ActionStatus, GameAction};
pub use queue::{ActionQueue, ActionSender};
