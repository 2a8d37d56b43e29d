mod bots;
mod config;
mod events;
mod server;
mod simulation;

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use bots::{BotContext, spawn_bot};
use config::ServerConfig;
use server::GameServer;

#[derive(Parser)]
#[command(name = "haraka-server")]
#[command(about = "Headless authoritative tick loop with scripted players")]
struct Args {
    #[arg(short, long, default_value_t = haraka::DEFAULT_TICK_RATE)]
    tick_rate: u32,

    #[arg(long, default_value_t = 64, help = "Deltas kept for replica catch-up")]
    history: usize,

    #[arg(long, help = "Stop after this many ticks")]
    max_ticks: Option<u32>,

    #[arg(short, long, default_value_t = 4, help = "Number of bot threads")]
    bots: usize,

    #[arg(long, default_value_t = 50, help = "Delay between bot actions in ms")]
    bot_interval: u64,

    #[arg(short, long, default_value_t = 8)]
    units: u32,

    #[arg(long, help = "Diff every object instead of trusting checksums")]
    full_diff: bool,

    #[arg(long, default_value_t = 75, help = "Ticks between statistics lines")]
    stats_interval: u32,
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig {
        tick_rate: args.tick_rate,
        history_capacity: args.history,
        max_ticks: args.max_ticks,
        bots: args.bots,
        bot_interval_ms: args.bot_interval,
        units_per_team: args.units,
        full_diff: args.full_diff,
        stats_interval: args.stats_interval,
    };

    let world = simulation::initial_world(config.units_per_team)?;
    let next_id = Arc::new(AtomicU32::new(2 * config.units_per_team));
    let objects = Arc::new(simulation::object_registry());
    let actions = Arc::new(simulation::action_registry());

    let mut server = GameServer::new(config.clone(), world, objects)?;
    let running = server.running();

    let bots: Vec<_> = (0..config.bots as u32)
        .map(|bot_id| {
            spawn_bot(
                bot_id,
                BotContext {
                    registry: Arc::clone(&actions),
                    sender: server.sender(),
                    running: Arc::clone(&running),
                    next_id: Arc::clone(&next_id),
                    interval: Duration::from_millis(config.bot_interval_ms),
                },
            )
        })
        .collect();

    log::info!(
        "Server started at {} Hz with {} bots and {} units",
        config.tick_rate,
        config.bots,
        2 * config.units_per_team
    );
    let result = server.run();

    running.store(false, Ordering::SeqCst);
    let queued: u64 = bots.into_iter().filter_map(|bot| bot.join().ok()).sum();

    let stats = server.stats();
    log::info!(
        "Server shutting down at tick {}: {} actions queued by bots, {} applied, {} rejected",
        stats.tick,
        queued,
        stats.actions_applied,
        stats.actions_failed
    );

    Ok(result?)
}
