use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use haraka::{ActionRegistry, ActionSender, GameAction, GameValue, Result};

use crate::simulation::{ARENA_HALF_EXTENT, MAX_SPEED};

/// Shared state for the scripted players feeding the action queue.
#[derive(Debug, Clone)]
pub struct BotContext {
    pub registry: Arc<ActionRegistry>,
    pub sender: ActionSender,
    pub running: Arc<AtomicBool>,
    /// Next free object id; also bounds the ids bots aim at.
    pub next_id: Arc<AtomicU32>,
    pub interval: Duration,
}

/// Starts a bot thread. Every action goes through the same byte encoding a
/// remote client would use before it reaches the queue. The thread returns
/// the number of actions it queued.
pub fn spawn_bot(bot_id: u32, context: BotContext) -> JoinHandle<u64> {
    thread::spawn(move || {
        let mut rng = SmallRng::seed_from_u64(0xB07_0000 ^ bot_id as u64);
        let mut sent = 0;

        while context.running.load(Ordering::Relaxed) {
            match next_action(&mut rng, &context).and_then(|action| relay(&context, &action)) {
                Ok(action) => {
                    if !context.sender.send(action) {
                        break;
                    }
                    sent += 1;
                }
                Err(err) => log::warn!("Bot {} produced an undeliverable action: {}", bot_id, err),
            }
            thread::sleep(context.interval);
        }

        log::debug!("Bot {} stopping after {} actions", bot_id, sent);
        sent
    })
}

fn next_action(rng: &mut SmallRng, context: &BotContext) -> Result<GameAction> {
    let known = context.next_id.load(Ordering::Relaxed).max(1);
    let target = rng.gen_range(0..known);

    match rng.gen_range(0..10) {
        0..=5 => {
            // Occasionally too fast, so some moves get rejected.
            let speed = rng.gen_range(0.0..MAX_SPEED * 1.2);
            let angle = rng.gen_range(0.0..std::f32::consts::TAU);
            context
                .registry
                .instantiate("Move", target)?
                .with_value("velocity", Vec2::from_angle(angle) * speed)
        }
        6..=8 => context
            .registry
            .instantiate("Attack", target)?
            .with_value("damage", rng.gen_range(5..25_i32)),
        _ => {
            let id = context.next_id.fetch_add(1, Ordering::Relaxed);
            let position = Vec2::new(
                rng.gen_range(-ARENA_HALF_EXTENT..ARENA_HALF_EXTENT),
                rng.gen_range(-ARENA_HALF_EXTENT..ARENA_HALF_EXTENT),
            );
            context
                .registry
                .instantiate("Spawn", id)?
                .with_value("position", position)?
                .with_value("team", GameValue::IntNoInterp(rng.gen_range(0..2)))
        }
    }
}

fn relay(context: &BotContext, action: &GameAction) -> Result<GameAction> {
    let bytes = haraka::serialize_action(action)?;
    haraka::deserialize_action(&context.registry, action.kind_name(), &bytes)
}

#[cfg(test)]
mod tests {
    use haraka::ActionQueue;

    use super::*;
    use crate::simulation::action_registry;

    #[test]
    fn bots_feed_the_queue() {
        let queue = ActionQueue::new();
        let running = Arc::new(AtomicBool::new(true));
        let context = BotContext {
            registry: Arc::new(action_registry()),
            sender: queue.sender(),
            running: Arc::clone(&running),
            next_id: Arc::new(AtomicU32::new(4)),
            interval: Duration::from_millis(1),
        };

        let handle = spawn_bot(0, context);
        assert!(queue.wait_timeout(Duration::from_secs(5)));
        running.store(false, Ordering::Relaxed);

        let sent = handle.join().unwrap();
        assert!(sent > 0);
        assert_eq!(queue.drain().len() as u64, sent);
    }
}
