use std::sync::Arc;

use rkyv::{Archive, Deserialize, Serialize};

use crate::error::{ReplicaError, Result};
use crate::object::{Attributes, Kind, Schema};
use crate::snapshot::Snapshot;
use crate::value::GameValue;

/// Behaviour of one action type. `check_action` must not mutate anything;
/// `perform_act` may assume the check passed against the same snapshot.
pub trait ActionKind: Kind {
    fn check_action(&self, action: &GameAction, snapshot: &Snapshot) -> Result<bool>;

    fn perform_act(&self, action: &GameAction, snapshot: &mut Snapshot) -> Result<()>;
}

/// A player intent. `id` names the object the action is aimed at and is
/// echoed back in the matching [`ActionStatus`].
#[derive(Debug, Clone)]
pub struct GameAction {
    id: u32,
    kind: Arc<dyn ActionKind>,
    values: Attributes,
}

impl GameAction {
    pub fn new(id: u32, kind: Arc<dyn ActionKind>) -> Self {
        let values = Schema::build(kind.as_ref());
        Self { id, kind, values }
    }

    pub fn with_value(mut self, name: &str, value: impl Into<GameValue>) -> Result<Self> {
        self.values.set(name, value)?;
        Ok(self)
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn kind(&self) -> &Arc<dyn ActionKind> {
        &self.kind
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn value(&self, name: &str) -> Option<&GameValue> {
        self.values.get(name)
    }

    pub fn values(&self) -> &Attributes {
        &self.values
    }

    pub fn set_value(&mut self, name: &str, value: impl Into<GameValue>) -> Result<()> {
        self.values.set(name, value)
    }

    pub fn check(&self, snapshot: &Snapshot) -> Result<bool> {
        self.kind.check_action(self, snapshot)
    }

    /// Checks the action against `snapshot` and performs it when allowed.
    pub fn act(&self, snapshot: &mut Snapshot) -> Result<()> {
        if !self.check(snapshot)? {
            return Err(ReplicaError::ImpossibleAction {
                action_id: self.id,
                kind: self.kind_name().to_string(),
            });
        }
        self.kind.perform_act(self, snapshot)
    }

    pub(crate) fn values_mut(&mut self) -> &mut Attributes {
        &mut self.values
    }
}

/// Outcome of one attempted action during a tick.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct ActionStatus {
    pub action_id: u32,
    pub success: bool,
    pub message: String,
}

impl ActionStatus {
    pub fn succeeded(action_id: u32) -> Self {
        Self {
            action_id,
            success: true,
            message: String::new(),
        }
    }

    pub fn failed(action_id: u32, message: impl Into<String>) -> Self {
        Self {
            action_id,
            success: false,
            message: message.into(),
        }
    }
}
