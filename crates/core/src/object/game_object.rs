use std::collections::BTreeMap;
use std::sync::Arc;

use crate::checksum::Crc32;
use crate::error::Result;
use crate::value::GameValue;

use super::attributes::{Attributes, Kind, Schema};

/// Per-attribute deltas between two objects of the same kind, by name.
pub type DiffSet = BTreeMap<String, GameValue>;

pub trait ObjectKind: Kind {
    /// Advances time-dependent state by `dt` seconds.
    fn update(&self, _values: &mut Attributes, _dt: f32) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct GameObject {
    id: u32,
    kind: Arc<dyn ObjectKind>,
    values: Attributes,
}

impl GameObject {
    pub fn new(id: u32, kind: Arc<dyn ObjectKind>) -> Self {
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

    pub fn kind(&self) -> &Arc<dyn ObjectKind> {
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

    pub fn update(&mut self, dt: f32) -> Result<()> {
        self.kind.update(&mut self.values, dt)
    }

    /// XOR of CRC-32(name ‖ value bytes) over all attributes. Independent of
    /// attribute order and of the object id.
    pub fn checksum(&self) -> u32 {
        self.values.iter().fold(0, |acc, (name, value)| {
            let mut crc = Crc32::new();
            crc.update(name.as_bytes());
            value.checksum_into(&mut crc);
            acc ^ crc.finish()
        })
    }

    /// Deltas from `self` to `other` for every attribute of `self`.
    pub fn compare(&self, other: &GameObject) -> Result<DiffSet> {
        self.values
            .iter()
            .map(|(name, value)| {
                let next = other.values.slot(name)?;
                Ok((name.to_string(), value.get_delta(next)?))
            })
            .collect()
    }

    /// Copy of `self` with every attribute in `diffset` moved by `t` of its
    /// delta. At exactly `t == 1.0` the deltas are committed in full.
    pub fn interpolate(&self, diffset: &DiffSet, t: f32) -> Result<GameObject> {
        let mut object = self.clone();
        object.interpolate_in_place(diffset, t)?;
        Ok(object)
    }

    pub(crate) fn interpolate_in_place(&mut self, diffset: &DiffSet, t: f32) -> Result<()> {
        let commit = t == 1.0;
        for (name, delta) in diffset {
            let slot = self.values.slot_mut(name)?;
            *slot = if commit {
                slot.apply(delta)?
            } else {
                slot.interp(delta, t)?
            };
        }
        Ok(())
    }

    pub(crate) fn values_mut(&mut self) -> &mut Attributes {
        &mut self.values
    }
}
