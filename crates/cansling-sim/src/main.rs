//! Cansling headless simulator
//!
//! Plays a campaign with scripted input and logs every game event.
//!
//! Usage: `cansling-sim [config.json] [levels.json]`
//! Without arguments the default config and built-in campaign are used.

use std::fs;

use anyhow::{Context, Result};
use cansling_core::{GameConfig, GameEvent, LevelQueue, LevelSet, Session};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Hard stop so a misconfigured campaign cannot spin forever.
const MAX_STEPS: u64 = 500_000;
const SEED: u64 = 12345;
/// Steps a grabbed can is held before release.
const HOLD_STEPS: u32 = 25;

/// Pull offsets from the anchor, cycled shot by shot.
const AIMS: [[f32; 2]; 3] = [[-100.0, -60.0], [-110.0, -30.0], [-90.0, -90.0]];

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => {
            let json = fs::read_to_string(&path)
                .with_context(|| format!("failed to read config {path}"))?;
            GameConfig::from_json(&json).with_context(|| format!("invalid config {path}"))?
        }
        None => GameConfig::default(),
    };
    let levels = match args.next() {
        Some(path) => {
            let json = fs::read_to_string(&path)
                .with_context(|| format!("failed to read levels {path}"))?;
            LevelSet::from_json(&json).with_context(|| format!("invalid levels {path}"))?
        }
        None => LevelSet::default_campaign(),
    };

    tracing::info!("[sim] Playing {} levels", levels.levels.len());
    let queue = LevelQueue::try_from(levels).context("invalid level set")?;
    let mut session = Session::new(config, queue, SEED);
    let mut player = AutoPlayer::default();

    let mut steps = 0u64;
    while session.game().active_level().is_some() {
        if steps >= MAX_STEPS {
            anyhow::bail!("campaign did not finish within {MAX_STEPS} steps");
        }

        let mut events = player.act(&mut session);
        events.extend(session.step());
        for event in &events {
            log_event(event);
        }
        steps += 1;
    }

    tracing::info!(
        "[sim] Finished {} levels in {} steps, state hash {:016x}",
        session.game().levels_completed(),
        steps,
        session.compute_hash()
    );
    Ok(())
}

/// Scripted input: lifts one can per level, then fires the cycled aims.
#[derive(Default)]
struct AutoPlayer {
    holding: Option<u32>,
    shots: usize,
}

impl AutoPlayer {
    fn act(&mut self, session: &mut Session) -> Vec<GameEvent> {
        let game = session.game();

        if game.is_builder() {
            if let Some(held) = self.holding {
                if held >= HOLD_STEPS {
                    self.holding = None;
                    return session.pointer_up();
                }
                self.holding = Some(held + 1);
                return Vec::new();
            }
            if game.builder_timer_running() {
                return Vec::new();
            }

            let Some(position) = session
                .registry()
                .snapshot(session.world())
                .first()
                .map(|can| can.transform.position)
            else {
                return Vec::new();
            };
            let events = session.pointer_down(position);
            session.pointer_move([position[0], position[1] + 100.0]);
            self.holding = Some(0);
            return events;
        }

        if game.is_shooter() && session.slingshot().is_loaded() {
            self.holding = None;
            let anchor = session.slingshot().anchor();
            let aim = AIMS[self.shots % AIMS.len()];
            self.shots += 1;

            let mut events = session.pointer_down(anchor);
            session.pointer_move([anchor[0] + aim[0], anchor[1] + aim[1]]);
            events.extend(session.pointer_up());
            return events;
        }

        Vec::new()
    }
}

fn log_event(event: &GameEvent) {
    match event {
        GameEvent::PhaseConditions {
            phase,
            satisfied,
            total,
        } => tracing::info!("[sim] {:?} conditions: {}/{} met", phase, satisfied, total),
        GameEvent::ProjectileRetired(reason) => {
            tracing::debug!("[sim] Projectile retired: {:?}", reason);
        }
        other => tracing::info!("[sim] {:?}", other),
    }
}
