use std::sync::Arc;

use super::delta::DeltaSnapshot;

/// Fixed-capacity ring of recent deltas, slotted by the tick they lead to.
/// Lets a replica that fell a few ticks behind catch up without a full
/// snapshot.
#[derive(Debug)]
pub struct DeltaHistory {
    deltas: Vec<Option<Arc<DeltaSnapshot>>>,
    capacity: usize,
    latest: Option<u32>,
}

impl DeltaHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            deltas: (0..capacity).map(|_| None).collect(),
            capacity,
            latest: None,
        }
    }

    pub fn push(&mut self, delta: Arc<DeltaSnapshot>) {
        let tick = delta.next_tick();
        let index = (tick as usize) % self.capacity;
        self.deltas[index] = Some(delta);
        self.latest = Some(tick);
    }

    /// Delta whose next tick is `tick`.
    pub fn get(&self, tick: u32) -> Option<&Arc<DeltaSnapshot>> {
        let index = (tick as usize) % self.capacity;
        self.deltas[index]
            .as_ref()
            .filter(|delta| delta.next_tick() == tick)
    }

    pub fn latest(&self) -> Option<&Arc<DeltaSnapshot>> {
        self.latest.and_then(|tick| self.get(tick))
    }

    /// Consecutive deltas leading from `tick` to the latest one, or `None`
    /// when part of the chain has already been overwritten.
    pub fn since(&self, tick: u32) -> Option<Vec<Arc<DeltaSnapshot>>> {
        let latest = self.latest?;
        let mut chain = Vec::new();
        let mut cursor = tick;

        while cursor != latest {
            let delta = self
                .get(cursor.wrapping_add(1))
                .filter(|delta| delta.prev_tick() == cursor)?;
            chain.push(Arc::clone(delta));
            cursor = delta.next_tick();
            if chain.len() > self.capacity {
                return None;
            }
        }

        Some(chain)
    }

    pub fn clear(&mut self) {
        for slot in &mut self.deltas {
            *slot = None;
        }
        self.latest = None;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.deltas.iter().filter(|d| d.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
