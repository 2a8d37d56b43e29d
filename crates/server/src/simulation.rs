use std::sync::Arc;

use glam::Vec2;

use haraka::{
    ActionKind, ActionRegistry, Attributes, GameAction, GameObject, GameValue, Kind, ObjectKind,
    ObjectRegistry, Result, Schema, Snapshot,
};

pub const ARENA_HALF_EXTENT: f32 = 50.0;
pub const UNIT_HEALTH: i32 = 100;
pub const MAX_SPEED: f32 = 8.0;

/// A unit wandering the arena. Bounces off the arena walls.
#[derive(Debug)]
pub struct UnitKind;

impl Kind for UnitKind {
    fn name(&self) -> &'static str {
        "Unit"
    }

    fn register_values(&self, schema: &mut Schema) {
        schema
            .value("position", Vec2::ZERO)
            .value("velocity", Vec2::ZERO)
            .value("health", UNIT_HEALTH)
            .value("team", GameValue::IntNoInterp(0));
    }
}

impl ObjectKind for UnitKind {
    fn update(&self, values: &mut Attributes, dt: f32) -> Result<()> {
        let (Some(position), Some(velocity)) = (
            values.get("position").and_then(GameValue::as_vec2f),
            values.get("velocity").and_then(GameValue::as_vec2f),
        ) else {
            return Ok(());
        };

        let mut position = position + velocity * dt;
        let mut velocity = velocity;
        for axis in 0..2 {
            if position[axis].abs() > ARENA_HALF_EXTENT {
                position[axis] = position[axis].clamp(-ARENA_HALF_EXTENT, ARENA_HALF_EXTENT);
                velocity[axis] = -velocity[axis];
            }
        }

        values.set("position", position)?;
        values.set("velocity", velocity)
    }
}

fn is_alive(snapshot: &Snapshot, id: u32) -> Result<bool> {
    let unit = snapshot.require_object(id)?;
    Ok(unit.value("health").and_then(GameValue::as_int).unwrap_or(0) > 0)
}

/// Sets the velocity of a living unit.
#[derive(Debug)]
pub struct MoveAction;

impl Kind for MoveAction {
    fn name(&self) -> &'static str {
        "Move"
    }

    fn register_values(&self, schema: &mut Schema) {
        schema.value("velocity", Vec2::ZERO);
    }
}

impl ActionKind for MoveAction {
    fn check_action(&self, action: &GameAction, snapshot: &Snapshot) -> Result<bool> {
        let speed = action
            .value("velocity")
            .and_then(GameValue::as_vec2f)
            .map(Vec2::length)
            .unwrap_or(f32::INFINITY);
        Ok(speed <= MAX_SPEED && is_alive(snapshot, action.id())?)
    }

    fn perform_act(&self, action: &GameAction, snapshot: &mut Snapshot) -> Result<()> {
        let velocity = action
            .value("velocity")
            .and_then(GameValue::as_vec2f)
            .unwrap_or(Vec2::ZERO);
        snapshot
            .require_object_mut(action.id())?
            .set_value("velocity", velocity)
    }
}

/// Damages a living unit; units that drop to zero health are removed.
#[derive(Debug)]
pub struct AttackAction;

impl Kind for AttackAction {
    fn name(&self) -> &'static str {
        "Attack"
    }

    fn register_values(&self, schema: &mut Schema) {
        schema.value("damage", 10);
    }
}

impl ActionKind for AttackAction {
    fn check_action(&self, action: &GameAction, snapshot: &Snapshot) -> Result<bool> {
        let damage = action.value("damage").and_then(GameValue::as_int).unwrap_or(0);
        Ok(damage > 0 && is_alive(snapshot, action.id())?)
    }

    fn perform_act(&self, action: &GameAction, snapshot: &mut Snapshot) -> Result<()> {
        let damage = action.value("damage").and_then(GameValue::as_int).unwrap_or(0);
        let unit = snapshot.require_object_mut(action.id())?;
        let health = unit.value("health").and_then(GameValue::as_int).unwrap_or(0) - damage;

        if health > 0 {
            unit.set_value("health", health)
        } else {
            snapshot.delete_object(action.id());
            Ok(())
        }
    }
}

/// Places a fresh unit under an unused id.
#[derive(Debug)]
pub struct SpawnAction;

impl Kind for SpawnAction {
    fn name(&self) -> &'static str {
        "Spawn"
    }

    fn register_values(&self, schema: &mut Schema) {
        schema
            .value("position", Vec2::ZERO)
            .value("team", GameValue::IntNoInterp(0));
    }
}

impl ActionKind for SpawnAction {
    fn check_action(&self, action: &GameAction, snapshot: &Snapshot) -> Result<bool> {
        let inside = action
            .value("position")
            .and_then(GameValue::as_vec2f)
            .is_some_and(|p| p.abs().max_element() <= ARENA_HALF_EXTENT);
        Ok(inside && !snapshot.contains(action.id()))
    }

    fn perform_act(&self, action: &GameAction, snapshot: &mut Snapshot) -> Result<()> {
        let mut unit = GameObject::new(action.id(), Arc::new(UnitKind));
        for name in ["position", "team"] {
            if let Some(value) = action.value(name) {
                unit.set_value(name, *value)?;
            }
        }
        snapshot.add_object(unit);
        Ok(())
    }
}

pub fn object_registry() -> ObjectRegistry {
    let mut registry = ObjectRegistry::new();
    registry.register(Arc::new(UnitKind));
    registry
}

pub fn action_registry() -> ActionRegistry {
    let mut registry = ActionRegistry::new();
    registry
        .register(Arc::new(MoveAction))
        .register(Arc::new(AttackAction))
        .register(Arc::new(SpawnAction));
    registry
}

/// Two teams lined up on opposite sides of the arena.
pub fn initial_world(units_per_team: u32) -> Result<Snapshot> {
    let mut snapshot = Snapshot::new(0);
    let spacing = 2.0 * ARENA_HALF_EXTENT / (units_per_team + 1) as f32;

    for team in 0..2u32 {
        let side = if team == 0 { -0.8 } else { 0.8 };
        let x = side * ARENA_HALF_EXTENT;
        for n in 0..units_per_team {
            let id = team * units_per_team + n;
            let y = -ARENA_HALF_EXTENT + spacing * (n + 1) as f32;
            let unit = GameObject::new(id, Arc::new(UnitKind))
                .with_value("position", Vec2::new(x, y))?
                .with_value("team", GameValue::IntNoInterp(team as i32))?;
            snapshot.add_object(unit);
        }
    }

    Ok(snapshot)
}
