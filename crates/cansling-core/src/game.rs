//! Builder/Shooter state machine and level progression.
//!
//! [`GameState`] owns the phase, timers, ammo and the level queue. It never
//! touches the physics world directly: level teardown and setup go through a
//! [`LevelHost`], which keeps the state machine testable without a world.

use serde::{Deserialize, Serialize};

use crate::condition::{self, Condition};
use crate::level::{Level, LevelError, LevelQueue};
use crate::physics::ObjectTransform;
use crate::projectile::RetireReason;

/// Returned by [`GameState::remaining_builder_time`] while no timer is running.
pub const TIMER_NOT_RUNNING: f32 = -1.0;

/// Game phase representing the current state of the game.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Arranging cans. The timer starts on the first grab.
    Builder { timer_started_at: Option<f64> },
    /// Firing the slingshot.
    Shooter,
    /// The queue ran dry. Stays here until a level is enqueued.
    NoActiveLevel,
}

impl Default for GamePhase {
    fn default() -> Self {
        Self::NoActiveLevel
    }
}

/// The two playable phases, used to tag condition results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseKind {
    Builder,
    Shooter,
}

/// Something observable that happened during a step or input call.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    BuilderTimerStarted,
    ShooterPhaseStarted { ammo: u32 },
    ShotFired { remaining_ammo: u32 },
    /// A draw was released but [`GameState::consume_ammo`] refused the shot.
    DryFire,
    ProjectileRetired(RetireReason),
    /// Condition results for a phase, evaluated as the phase ends.
    PhaseConditions {
        phase: PhaseKind,
        satisfied: usize,
        total: usize,
    },
    LevelCompleted { name: String },
    LevelStarted { name: String },
    SessionFinished,
}

/// World-side collaborator that the state machine drives on level changes.
pub trait LevelHost {
    /// Transforms of the live cans, for condition evaluation.
    fn live_objects(&self) -> Vec<ObjectTransform>;
    /// Removes everything the finished level put into the world.
    fn teardown_level(&mut self);
    /// Populates the world for a newly active level.
    fn setup_level(&mut self, level: &Level);
}

/// Top-level mutable game record.
#[derive(Debug, Clone, Default)]
pub struct GameState {
    phase: GamePhase,
    /// Seconds since session start, advanced only by [`GameState::tick`].
    clock: f64,
    level_started_at: f64,
    builder_max_time: f32,
    ammo: u32,
    max_ammo: u32,
    queue: LevelQueue,
    active: Option<Level>,
    levels_completed: u32,
}

impl GameState {
    /// Creates a game with `queue` pending and no active level.
    pub fn new(queue: LevelQueue) -> Self {
        Self {
            queue,
            ..Self::default()
        }
    }

    /// Validates and appends a level to the pending queue.
    pub fn enqueue(&mut self, level: Level) -> Result<(), LevelError> {
        self.queue.enqueue(level)
    }

    /// Advances the clock by `dt` seconds and processes transitions.
    ///
    /// Builder expiry is checked before Shooter exhaustion, so a level with
    /// zero ammo moves through Shooter within one tick.
    pub fn tick(
        &mut self,
        dt: f32,
        projectile_in_flight: bool,
        host: &mut impl LevelHost,
    ) -> Vec<GameEvent> {
        self.clock += f64::from(dt.max(0.0));
        let mut events = Vec::new();

        match self.phase {
            GamePhase::NoActiveLevel => {
                if !self.queue.is_empty() {
                    events.extend(self.advance_level(host));
                }
                return events;
            }
            GamePhase::Builder {
                timer_started_at: Some(started),
            } if self.clock - started >= f64::from(self.builder_max_time) => {
                if let Some(level) = &self.active {
                    events.push(phase_conditions(
                        PhaseKind::Builder,
                        &level.builder_conditions,
                        &*host,
                    ));
                }
                self.phase = GamePhase::Shooter;
                self.ammo = self.max_ammo;
                tracing::info!("[game] Builder time up, entering Shooter with {} ammo", self.ammo);
                events.push(GameEvent::ShooterPhaseStarted { ammo: self.ammo });
            }
            _ => {}
        }

        if self.phase == GamePhase::Shooter && self.ammo == 0 && !projectile_in_flight {
            if let Some(level) = &self.active {
                events.push(phase_conditions(
                    PhaseKind::Shooter,
                    &level.shooter_conditions,
                    &*host,
                ));
                events.push(GameEvent::LevelCompleted {
                    name: level.name.clone(),
                });
                tracing::info!("[game] Level '{}' complete", level.name);
            }
            self.levels_completed += 1;
            events.extend(self.advance_level(host));
        }

        events
    }

    /// Tears down the active level, if any, and activates the next queued one.
    pub fn advance_level(&mut self, host: &mut impl LevelHost) -> Vec<GameEvent> {
        if self.active.take().is_some() {
            host.teardown_level();
        }

        let Some(level) = self.queue.pop_next() else {
            self.phase = GamePhase::NoActiveLevel;
            self.ammo = 0;
            self.max_ammo = 0;
            self.builder_max_time = 0.0;
            tracing::info!("[game] Level queue empty, session finished");
            return vec![GameEvent::SessionFinished];
        };

        host.setup_level(&level);

        self.phase = GamePhase::Builder {
            timer_started_at: None,
        };
        self.level_started_at = self.clock;
        self.builder_max_time = level.builder_time;
        self.ammo = level.ammo;
        self.max_ammo = level.ammo;

        tracing::info!(
            "[game] Level '{}' started ({} cans, {}s build, {} ammo)",
            level.name,
            level.object_count,
            level.builder_time,
            level.ammo
        );
        let event = GameEvent::LevelStarted {
            name: level.name.clone(),
        };
        self.active = Some(level);
        vec![event]
    }

    /// Starts the builder timer on the first grab. Returns true if it started now.
    pub fn on_object_grabbed(&mut self) -> bool {
        if let GamePhase::Builder {
            timer_started_at: None,
        } = self.phase
        {
            self.phase = GamePhase::Builder {
                timer_started_at: Some(self.clock),
            };
            tracing::info!("[game] Builder timer started");
            true
        } else {
            false
        }
    }

    /// Spends one shot. Only succeeds in the Shooter phase with ammo left.
    pub fn consume_ammo(&mut self) -> bool {
        if self.phase == GamePhase::Shooter && self.ammo > 0 {
            self.ammo -= 1;
            true
        } else {
            false
        }
    }

    /// Seconds left on the builder timer, or [`TIMER_NOT_RUNNING`].
    pub fn remaining_builder_time(&self) -> f32 {
        match self.phase {
            GamePhase::Builder {
                timer_started_at: Some(started),
            } => {
                #[allow(clippy::cast_possible_truncation)]
                let remaining = (f64::from(self.builder_max_time) - (self.clock - started)) as f32;
                remaining.max(0.0)
            }
            _ => TIMER_NOT_RUNNING,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn is_builder(&self) -> bool {
        matches!(self.phase, GamePhase::Builder { .. })
    }

    pub fn is_shooter(&self) -> bool {
        self.phase == GamePhase::Shooter
    }

    pub fn builder_timer_running(&self) -> bool {
        matches!(
            self.phase,
            GamePhase::Builder {
                timer_started_at: Some(_)
            }
        )
    }

    pub fn ammo(&self) -> u32 {
        self.ammo
    }

    pub fn max_ammo(&self) -> u32 {
        self.max_ammo
    }

    pub fn active_level(&self) -> Option<&Level> {
        self.active.as_ref()
    }

    pub fn queued_levels(&self) -> usize {
        self.queue.len()
    }

    pub fn levels_completed(&self) -> u32 {
        self.levels_completed
    }

    /// Seconds since session start.
    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// Clock reading when the active level was activated.
    pub fn level_started_at(&self) -> f64 {
        self.level_started_at
    }

    /// Conditions for the current phase, or none without an active level.
    pub fn active_conditions(&self) -> &[Condition] {
        match (&self.active, self.phase) {
            (Some(level), GamePhase::Builder { .. }) => &level.builder_conditions,
            (Some(level), GamePhase::Shooter) => &level.shooter_conditions,
            _ => &[],
        }
    }
}

fn phase_conditions(phase: PhaseKind, conditions: &[Condition], host: &impl LevelHost) -> GameEvent {
    let objects = host.live_objects();
    let satisfied = conditions
        .iter()
        .filter(|c| condition::evaluate(c, &objects))
        .count();
    GameEvent::PhaseConditions {
        phase,
        satisfied,
        total: conditions.len(),
    }
}
