use std::sync::Arc;

use glam::Vec2;

use crate::action::{ActionKind, GameAction};
use crate::error::Result;
use crate::object::{Attributes, GameObject, Kind, ObjectKind, Schema};
use crate::registry::{ActionRegistry, ObjectRegistry};
use crate::snapshot::Snapshot;
use crate::value::GameValue;

#[derive(Debug)]
pub struct Mover;

impl Kind for Mover {
    fn name(&self) -> &'static str {
        "Mover"
    }

    fn register_values(&self, schema: &mut Schema) {
        schema.value("position", Vec2::ZERO).value("speed", Vec2::ZERO);
    }
}

impl ObjectKind for Mover {
    fn update(&self, values: &mut Attributes, dt: f32) -> Result<()> {
        let position = values.get("position").and_then(GameValue::as_vec2f);
        let speed = values.get("speed").and_then(GameValue::as_vec2f);
        if let (Some(position), Some(speed)) = (position, speed) {
            values.set("position", position + speed * dt)?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct Fighter;

impl Kind for Fighter {
    fn name(&self) -> &'static str {
        "Fighter"
    }

    fn register_values(&self, schema: &mut Schema) {
        schema
            .value("health", 0)
            .value("team", GameValue::IntNoInterp(0));
    }
}

impl ObjectKind for Fighter {}

/// Deals one point of damage to a fighter with more than five health.
#[derive(Debug)]
pub struct Hit;

impl Kind for Hit {
    fn name(&self) -> &'static str {
        "Hit"
    }

    fn register_values(&self, schema: &mut Schema) {
        schema.value("damage", 1);
    }
}

impl ActionKind for Hit {
    fn check_action(&self, action: &GameAction, snapshot: &Snapshot) -> Result<bool> {
        let target = snapshot.require_object(action.id())?;
        Ok(target.value("health").and_then(GameValue::as_int).unwrap_or(0) > 5)
    }

    fn perform_act(&self, action: &GameAction, snapshot: &mut Snapshot) -> Result<()> {
        let damage = action.value("damage").and_then(GameValue::as_int).unwrap_or(0);
        let target = snapshot.require_object_mut(action.id())?;
        let health = target.value("health").and_then(GameValue::as_int).unwrap_or(0);
        target.set_value("health", health - damage)
    }
}

pub fn mover(id: u32, x: f32, y: f32) -> GameObject {
    GameObject::new(id, Arc::new(Mover))
        .with_value("position", Vec2::new(x, y))
        .expect("mover schema has a position")
}

pub fn fighter(id: u32, health: i32) -> GameObject {
    GameObject::new(id, Arc::new(Fighter))
        .with_value("health", health)
        .expect("fighter schema has health")
}

pub fn hit(target: u32) -> GameAction {
    GameAction::new(target, Arc::new(Hit))
}

pub fn position(snapshot: &Snapshot, id: u32) -> Option<Vec2> {
    snapshot
        .get_object(id)
        .and_then(|object| object.value("position"))
        .and_then(GameValue::as_vec2f)
}

pub fn registries() -> (ObjectRegistry, ActionRegistry) {
    let mut objects = ObjectRegistry::new();
    objects.register(Arc::new(Mover)).register(Arc::new(Fighter));
    let mut actions = ActionRegistry::new();
    actions.register(Arc::new(Hit));
    (objects, actions)
}
