#![allow(dead_code)]

use std::sync::Arc;

use glam::{IVec2, Vec2};

use haraka::{
    ActionKind, ActionRegistry, Attributes, GameAction, GameObject, GameValue, Kind, ObjectKind,
    ObjectRegistry, Result, Schema, Snapshot,
};

pub const EPS: f32 = 1e-5;

#[derive(Debug)]
pub struct DummyObject;

impl Kind for DummyObject {
    fn name(&self) -> &'static str {
        "DummyObject"
    }

    fn register_values(&self, schema: &mut Schema) {
        schema.value("health", 10);
    }
}

impl ObjectKind for DummyObject {}

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
pub struct Unit;

impl Kind for Unit {
    fn name(&self) -> &'static str {
        "Unit"
    }

    fn register_values(&self, schema: &mut Schema) {
        schema
            .value("cell", IVec2::ZERO)
            .value("armor", 1.0_f32)
            .value("team", GameValue::IntNoInterp(0));
    }
}

impl ObjectKind for Unit {}

/// Lowers the health of a `DummyObject`, refusing to take it below five.
#[derive(Debug)]
pub struct Poke;

impl Kind for Poke {
    fn name(&self) -> &'static str {
        "Poke"
    }

    fn register_values(&self, schema: &mut Schema) {
        schema.value("strength", 1);
    }
}

impl ActionKind for Poke {
    fn check_action(&self, action: &GameAction, snapshot: &Snapshot) -> Result<bool> {
        let target = snapshot.require_object(action.id())?;
        let health = target.value("health").and_then(GameValue::as_int).unwrap_or(0);
        Ok(health - strength(action) >= 5)
    }

    fn perform_act(&self, action: &GameAction, snapshot: &mut Snapshot) -> Result<()> {
        let target = snapshot.require_object_mut(action.id())?;
        let health = target.value("health").and_then(GameValue::as_int).unwrap_or(0);
        target.set_value("health", health - strength(action))
    }
}

fn strength(action: &GameAction) -> i32 {
    action.value("strength").and_then(GameValue::as_int).unwrap_or(0)
}

pub fn dummy(id: u32, health: i32) -> GameObject {
    GameObject::new(id, Arc::new(DummyObject))
        .with_value("health", health)
        .unwrap()
}

pub fn mover(id: u32, position: Vec2, speed: Vec2) -> GameObject {
    GameObject::new(id, Arc::new(Mover))
        .with_value("position", position)
        .unwrap()
        .with_value("speed", speed)
        .unwrap()
}

pub fn unit(id: u32, cell: IVec2, team: i32) -> GameObject {
    GameObject::new(id, Arc::new(Unit))
        .with_value("cell", cell)
        .unwrap()
        .with_value("team", GameValue::IntNoInterp(team))
        .unwrap()
}

pub fn poke(target: u32, strength: i32) -> GameAction {
    GameAction::new(target, Arc::new(Poke))
        .with_value("strength", strength)
        .unwrap()
}

pub fn position(snapshot: &Snapshot, id: u32) -> Vec2 {
    snapshot
        .get_object(id)
        .and_then(|object| object.value("position"))
        .and_then(GameValue::as_vec2f)
        .unwrap()
}

pub fn health(snapshot: &Snapshot, id: u32) -> i32 {
    snapshot
        .get_object(id)
        .and_then(|object| object.value("health"))
        .and_then(GameValue::as_int)
        .unwrap()
}

pub fn object_registry() -> ObjectRegistry {
    let mut registry = ObjectRegistry::new();
    registry
        .register(Arc::new(DummyObject))
        .register(Arc::new(Mover))
        .register(Arc::new(Unit));
    registry
}

pub fn action_registry() -> ActionRegistry {
    let mut registry = ActionRegistry::new();
    registry.register(Arc::new(Poke));
    registry
}
