use std::collections::BTreeMap;
use std::fmt;

use crate::error::{ReplicaError, Result};
use crate::value::GameValue;

/// Code-defined type shared by objects and actions: a wire tag plus the
/// attribute slots every instance starts with.
pub trait Kind: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn register_values(&self, schema: &mut Schema);
}

/// Collects the attribute slots of a kind. Only available while an instance
/// is being constructed, so the set of names is fixed afterwards.
#[derive(Debug)]
pub struct Schema {
    attributes: Attributes,
}

impl Schema {
    pub(crate) fn build<K: Kind + ?Sized>(kind: &K) -> Attributes {
        let mut schema = Self {
            attributes: Attributes {
                owner: kind.name(),
                values: BTreeMap::new(),
            },
        };
        kind.register_values(&mut schema);
        schema.attributes
    }

    pub fn value(&mut self, name: &str, default: impl Into<GameValue>) -> &mut Self {
        self.attributes
            .values
            .insert(name.to_string(), default.into());
        self
    }
}

/// Named attribute values of one object or action. Values can be replaced
/// but never added, removed or changed to another variant.
#[derive(Debug, Clone, PartialEq)]
pub struct Attributes {
    owner: &'static str,
    values: BTreeMap<String, GameValue>,
}

impl Attributes {
    pub fn get(&self, name: &str) -> Option<&GameValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn set(&mut self, name: &str, value: impl Into<GameValue>) -> Result<()> {
        let value = value.into();
        let slot = self.slot_mut(name)?;
        if slot.value_type() != value.value_type() {
            return Err(slot.mismatch(&value));
        }
        *slot = value;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &GameValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn slot(&self, name: &str) -> Result<&GameValue> {
        self.values
            .get(name)
            .ok_or_else(|| self.unknown_attribute(name))
    }

    pub(crate) fn slot_mut(&mut self, name: &str) -> Result<&mut GameValue> {
        let owner = self.owner;
        self.values
            .get_mut(name)
            .ok_or_else(|| ReplicaError::UnknownAttribute {
                kind: owner.to_string(),
                name: name.to_string(),
            })
    }

    /// Replaces a slot from its wire bytes.
    pub(crate) fn decode(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        let slot = self.slot_mut(name)?;
        *slot = slot.decode_like(bytes)?;
        Ok(())
    }

    fn unknown_attribute(&self, name: &str) -> ReplicaError {
        ReplicaError::UnknownAttribute {
            kind: self.owner.to_string(),
            name: name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::value::ValueType;

    #[derive(Debug)]
    struct Crate;

    impl Kind for Crate {
        fn name(&self) -> &'static str {
            "Crate"
        }

        fn register_values(&self, schema: &mut Schema) {
            schema.value("position", Vec2::ZERO).value("durability", 3);
        }
    }

    #[test]
    fn schema_defines_slots() {
        let attributes = Schema::build(&Crate);
        assert_eq!(attributes.len(), 2);
        assert_eq!(attributes.get("durability"), Some(&GameValue::Int(3)));
        assert_eq!(
            attributes.names().collect::<Vec<_>>(),
            vec!["durability", "position"]
        );
    }

    #[test]
    fn set_keeps_schema() {
        let mut attributes = Schema::build(&Crate);

        attributes.set("durability", 1).unwrap();
        assert_eq!(attributes.get("durability"), Some(&GameValue::Int(1)));

        assert!(matches!(
            attributes.set("weight", 2.0_f32),
            Err(ReplicaError::UnknownAttribute { .. })
        ));
        assert!(matches!(
            attributes.set("durability", 2.0_f32),
            Err(ReplicaError::TypeMismatch {
                expected: ValueType::Int,
                found: ValueType::Float,
            })
        ));
        assert!(!attributes.contains("weight"));
    }

    #[test]
    fn decode_into_slot() {
        let mut attributes = Schema::build(&Crate);
        let bytes = GameValue::Vec2f(Vec2::new(2.0, -1.0)).to_bytes();
        attributes.decode("position", &bytes).unwrap();
        assert_eq!(
            attributes.get("position").and_then(GameValue::as_vec2f),
            Some(Vec2::new(2.0, -1.0))
        );

        assert!(attributes.decode("position", &bytes[..4]).is_err());
    }
}
