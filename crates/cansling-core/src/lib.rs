//! Cansling Core Library
//!
//! Builder/Shooter game logic on top of `Rapier2D` with deterministic behavior.
//!
//! A level runs in two phases: the player first arranges a set of cans while
//! a timer runs, then knocks them down with a slingshot. [`Session`] is the
//! entry point for hosts; the modules below it are usable on their own.

#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod can;
pub mod condition;
pub mod config;
pub mod game;
pub mod level;
pub mod physics;
pub mod projectile;
pub mod session;
pub mod slingshot;

#[cfg(test)]
mod test_utils;

pub use can::{Can, CanId, CanRegistry, CanTransform};
pub use condition::{Condition, ConditionStatus};
pub use config::{ConfigError, GameConfig};
pub use game::{GameEvent, GamePhase, GameState, LevelHost, PhaseKind, TIMER_NOT_RUNNING};
pub use level::{HintMarker, Level, LevelError, LevelQueue, LevelSet};
pub use physics::{ObjectTransform, PHYSICS_DT, PhysicsWorld, default_gravity};
pub use projectile::{ProjectileTracker, RetireReason};
pub use session::{FrameView, Session};
pub use slingshot::{Launch, SlingState, Slingshot};
