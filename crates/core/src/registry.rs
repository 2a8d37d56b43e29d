use std::collections::HashMap;
use std::sync::Arc;

use crate::action::{ActionKind, GameAction};
use crate::error::{ReplicaError, Result};
use crate::object::{GameObject, Kind, ObjectKind};

/// Kind descriptors keyed by their wire tag. Built once at start-up and
/// passed to whatever decodes objects or actions.
#[derive(Debug)]
pub struct Registry<K: ?Sized> {
    kinds: HashMap<&'static str, Arc<K>>,
}

pub type ObjectRegistry = Registry<dyn ObjectKind>;
pub type ActionRegistry = Registry<dyn ActionKind>;

impl<K: Kind + ?Sized> Default for Registry<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Kind + ?Sized> Registry<K> {
    pub fn new() -> Self {
        Self {
            kinds: HashMap::new(),
        }
    }

    pub fn register(&mut self, kind: Arc<K>) -> &mut Self {
        let name = kind.name();
        log::debug!("Registering kind '{}'", name);
        if self.kinds.insert(name, kind).is_some() {
            log::warn!("Kind '{}' registered twice, keeping the latest", name);
        }
        self
    }

    pub fn get(&self, name: &str) -> Result<Arc<K>> {
        self.kinds
            .get(name)
            .cloned()
            .ok_or_else(|| ReplicaError::UnknownKind(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.kinds.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.kinds.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl Registry<dyn ObjectKind> {
    /// Default-valued object of the named kind.
    pub fn instantiate(&self, kind: &str, id: u32) -> Result<GameObject> {
        Ok(GameObject::new(id, self.get(kind)?))
    }
}

impl Registry<dyn ActionKind> {
    pub fn instantiate(&self, kind: &str, id: u32) -> Result<GameAction> {
        Ok(GameAction::new(id, self.get(kind)?))
    }
}
