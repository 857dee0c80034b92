//! Test utilities for driving a [`Session`] headlessly.
//!
//! Provides `TestSession`, a wrapper that scripts pointer input and advances
//! the fixed physics step so scenario tests read like play-throughs.

use crate::config::GameConfig;
use crate::game::GameEvent;
use crate::level::{Level, LevelQueue};
use crate::projectile::RetireReason;
use crate::session::Session;

/// Upper bound on steps spent waiting for a phase change.
const MAX_WAIT_STEPS: usize = 20_000;

/// A session with default config and scripted input helpers.
pub(crate) struct TestSession {
    pub session: Session,
}

impl TestSession {
    /// Create a test session with the default seed.
    pub fn new(levels: Vec<Level>) -> Self {
        Self::with_seed(levels, 12345)
    }

    /// Create a test session with a specific spawn seed.
    pub fn with_seed(levels: Vec<Level>, seed: u64) -> Self {
        let queue = LevelQueue::try_from(levels).expect("test levels must be valid");
        Self {
            session: Session::new(GameConfig::default(), queue, seed),
        }
    }

    /// Advance `n` physics steps with no input, collecting events.
    pub fn settle(&mut self, n: usize) -> Vec<GameEvent> {
        let mut events = Vec::new();
        for _ in 0..n {
            events.extend(self.session.step());
        }
        events
    }

    /// Press the pointer on the first registered can.
    ///
    /// Returns the events from the press. The pointer stays down.
    pub fn grab_first_can(&mut self) -> Vec<GameEvent> {
        let Some(position) = self
            .session
            .registry()
            .snapshot(self.session.world())
            .first()
            .map(|can| can.transform.position)
        else {
            return Vec::new();
        };
        self.session.pointer_down(position)
    }

    /// Grab a can to start the timer, then step until the Shooter phase.
    pub fn enter_shooter(&mut self) -> Vec<GameEvent> {
        let mut events = self.grab_first_can();
        events.extend(self.session.pointer_up());
        for _ in 0..MAX_WAIT_STEPS {
            if self.session.game().is_shooter() {
                return events;
            }
            events.extend(self.session.step());
        }
        panic!("builder phase never expired");
    }

    /// Draw the pouch from the anchor to `pointer` and release.
    pub fn fire_from(&mut self, pointer: [f32; 2]) -> Vec<GameEvent> {
        let anchor = self.session.slingshot().anchor();
        let mut events = self.session.pointer_down(anchor);
        self.session.pointer_move(pointer);
        events.extend(self.session.pointer_up());
        events
    }

    /// Fire straight down into the floor below the anchor.
    pub fn fire_down(&mut self) -> Vec<GameEvent> {
        let anchor = self.session.slingshot().anchor();
        self.fire_from([anchor[0], anchor[1] + 100.0])
    }

    /// Step until the live projectile retires, at most `max_steps` times.
    pub fn run_until_retired(&mut self, max_steps: usize) -> Option<RetireReason> {
        for _ in 0..max_steps {
            for event in self.session.step() {
                if let GameEvent::ProjectileRetired(reason) = event {
                    return Some(reason);
                }
            }
        }
        None
    }
}
