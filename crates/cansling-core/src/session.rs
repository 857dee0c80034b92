//! Host-facing play session.
//!
//! A [`Session`] owns the physics world and every component that mutates it.
//! The host feeds it pointer events, calls [`Session::step`] once per fixed
//! physics step, and reads a [`FrameView`] back for drawing.

use rapier2d::prelude::Vector;

use crate::can::{CanId, CanRegistry, CanTransform};
use crate::condition::{self, ConditionStatus};
use crate::config::GameConfig;
use crate::game::{GameEvent, GamePhase, GameState, LevelHost};
use crate::level::{HintMarker, Level, LevelError, LevelQueue};
use crate::physics::{ObjectTransform, PHYSICS_DT, PhysicsWorld};
use crate::projectile::ProjectileTracker;
use crate::slingshot::{SlingState, Slingshot};

/// Read-only state for renderers.
#[derive(Debug, Clone)]
pub struct FrameView {
    pub phase: GamePhase,
    pub level_name: Option<String>,
    /// Seconds left to build, or a negative sentinel when no timer runs.
    pub remaining_builder_time: f32,
    pub ammo: u32,
    pub max_ammo: u32,
    pub cans: Vec<CanTransform>,
    pub live_projectile: Option<ObjectTransform>,
    pub retired_projectiles: Vec<ObjectTransform>,
    pub anchor: [f32; 2],
    pub pouch: [f32; 2],
    pub sling_state: SlingState,
    /// Results for the active phase's conditions. Empty without a level.
    pub conditions: Vec<ConditionStatus>,
    pub hints: Vec<HintMarker>,
}

/// Borrows the world-side components so the state machine can swap levels.
struct WorldHost<'a> {
    world: &'a mut PhysicsWorld,
    registry: &'a mut CanRegistry,
    slingshot: &'a mut Slingshot,
    projectiles: &'a mut ProjectileTracker,
    config: &'a GameConfig,
}

impl LevelHost for WorldHost<'_> {
    fn live_objects(&self) -> Vec<ObjectTransform> {
        self.registry.transforms(self.world)
    }

    fn teardown_level(&mut self) {
        self.registry.unload(self.world);
        self.projectiles.clear(self.world);
    }

    fn setup_level(&mut self, level: &Level) {
        self.registry.load(self.world, level, self.config);
        self.slingshot.reset(self.world);
    }
}

/// A single-player play session over an ordered list of levels.
#[derive(Debug)]
pub struct Session {
    config: GameConfig,
    world: PhysicsWorld,
    game: GameState,
    registry: CanRegistry,
    slingshot: Slingshot,
    projectiles: ProjectileTracker,
    /// Pointer position while the button is held.
    pointer: Option<[f32; 2]>,
    grab: Option<CanId>,
}

impl Session {
    /// Builds the arena and activates the first queued level, if any.
    ///
    /// `levels` is already validated: a [`LevelQueue`] only accepts levels
    /// that pass [`Level::validate`].
    pub fn new(config: GameConfig, levels: LevelQueue, seed: u64) -> Self {
        let gravity = config.arena.gravity;
        let mut world = PhysicsWorld::with_gravity(Vector::new(gravity[0], gravity[1]));
        build_walls(&mut world, &config);

        let slingshot = Slingshot::new(&mut world, &config.slingshot);

        let mut session = Self {
            world,
            game: GameState::new(levels),
            registry: CanRegistry::new(seed),
            slingshot,
            projectiles: ProjectileTracker::new(),
            pointer: None,
            grab: None,
            config,
        };

        if session.game.queued_levels() > 0 {
            let mut host = WorldHost {
                world: &mut session.world,
                registry: &mut session.registry,
                slingshot: &mut session.slingshot,
                projectiles: &mut session.projectiles,
                config: &session.config,
            };
            session.game.advance_level(&mut host);
        } else {
            tracing::info!("[session] Started without levels");
        }

        session
    }

    /// Validates and appends a level. A finished session picks it up on the next step.
    pub fn enqueue_level(&mut self, level: Level) -> Result<(), LevelError> {
        self.game.enqueue(level)
    }

    /// Pointer pressed at a world position.
    ///
    /// Hitting the pouch starts a draw (Shooter only); hitting a can grabs it
    /// (Builder only) and starts the builder timer on the first grab.
    pub fn pointer_down(&mut self, position: [f32; 2]) -> Vec<GameEvent> {
        self.pointer = Some(position);
        let mut events = Vec::new();

        let Some(hit) = self
            .world
            .query_nearest_point(position, self.config.grab.pick_radius)
        else {
            return events;
        };

        if hit == self.slingshot.pouch_body() {
            if self.slingshot.begin_drag(self.game.is_shooter()) {
                self.slingshot.update_drag(&mut self.world, position);
            }
        } else if let Some(id) = self
            .registry
            .find_by_body(hit)
            .filter(|_| self.game.is_builder())
        {
            self.grab = Some(id);
            if self.game.on_object_grabbed() {
                events.push(GameEvent::BuilderTimerStarted);
            }
        }

        events
    }

    /// Pointer moved while held.
    pub fn pointer_move(&mut self, position: [f32; 2]) {
        if self.pointer.is_none() {
            return;
        }
        self.pointer = Some(position);
        self.slingshot.update_drag(&mut self.world, position);
    }

    /// Pointer released: drops a grab or releases the slingshot.
    pub fn pointer_up(&mut self) -> Vec<GameEvent> {
        self.pointer = None;
        self.grab = None;

        let Some(launch) = self.slingshot.release() else {
            return Vec::new();
        };

        if self.game.consume_ammo() {
            self.slingshot.detach_pouch(&mut self.world);
            self.projectiles.spawn(
                &mut self.world,
                launch.origin,
                launch.impulse,
                &self.config.projectile,
            );
            let remaining_ammo = self.game.ammo();
            tracing::info!("[session] Shot fired, {} ammo left", remaining_ammo);
            vec![GameEvent::ShotFired { remaining_ammo }]
        } else {
            tracing::debug!("[session] Dry fire");
            vec![GameEvent::DryFire]
        }
    }

    /// Advances the session by one fixed physics step.
    pub fn step(&mut self) -> Vec<GameEvent> {
        let mut events = Vec::new();

        self.steer_grab();
        self.slingshot.update(&mut self.world);
        self.world.step();

        if let Some(reason) = self
            .projectiles
            .update(&self.world, &self.config.projectile)
        {
            self.slingshot.restore(&mut self.world);
            events.push(GameEvent::ProjectileRetired(reason));
        }

        let in_flight = self.projectiles.in_flight();
        let mut host = WorldHost {
            world: &mut self.world,
            registry: &mut self.registry,
            slingshot: &mut self.slingshot,
            projectiles: &mut self.projectiles,
            config: &self.config,
        };
        events.extend(self.game.tick(PHYSICS_DT, in_flight, &mut host));

        events
    }

    /// Pulls the grabbed can toward the pointer. Drops grabs that went stale.
    fn steer_grab(&mut self) {
        let Some(id) = self.grab else {
            return;
        };
        let body = self
            .registry
            .get(id)
            .filter(|_| self.game.is_builder())
            .map(|can| can.handles.body);
        let (Some(body), Some(pointer)) = (body, self.pointer) else {
            self.grab = None;
            return;
        };
        let Some(transform) = self.world.read_transform(body) else {
            self.grab = None;
            return;
        };

        let gain = self.config.grab.follow_gain;
        let mut velocity = [
            (pointer[0] - transform.position[0]) * gain,
            (pointer[1] - transform.position[1]) * gain,
        ];
        let speed = velocity[0].hypot(velocity[1]);
        let max = self.config.grab.max_follow_speed;
        if speed > max {
            velocity = [velocity[0] * max / speed, velocity[1] * max / speed];
        }
        self.world.set_velocity(body, velocity);
    }

    /// Snapshot for rendering.
    pub fn view(&self) -> FrameView {
        let cans = self.registry.snapshot(&self.world);
        let level = self.game.active_level();

        let conditions = if level.is_some() {
            let transforms: Vec<ObjectTransform> = cans.iter().map(|c| c.transform).collect();
            condition::evaluate_all(self.game.active_conditions(), &transforms)
        } else {
            Vec::new()
        };

        FrameView {
            phase: self.game.phase(),
            level_name: level.map(|l| l.name.clone()),
            remaining_builder_time: self.game.remaining_builder_time(),
            ammo: self.game.ammo(),
            max_ammo: self.game.max_ammo(),
            cans,
            live_projectile: self.projectiles.live_transform(&self.world),
            retired_projectiles: self.projectiles.retired_transforms(&self.world),
            anchor: self.slingshot.anchor(),
            pouch: self.slingshot.pouch_position(),
            sling_state: self.slingshot.state(),
            conditions,
            hints: level.map(|l| l.hints.clone()).unwrap_or_default(),
        }
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn registry(&self) -> &CanRegistry {
        &self.registry
    }

    pub fn slingshot(&self) -> &Slingshot {
        &self.slingshot
    }

    pub fn projectiles(&self) -> &ProjectileTracker {
        &self.projectiles
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// The can currently held by the pointer.
    pub fn grabbed(&self) -> Option<CanId> {
        self.grab
    }

    /// Computes a hash of the physics state for replay checks.
    pub fn compute_hash(&self) -> u64 {
        self.world.compute_hash()
    }
}

/// Four static walls around the arena.
fn build_walls(world: &mut PhysicsWorld, config: &GameConfig) {
    let arena = &config.arena;
    let (w, h, t) = (arena.width, arena.height, arena.wall_thickness);
    let walls = [
        ([w / 2.0, h - t / 2.0], [w, t]),
        ([w / 2.0, t / 2.0], [w, t]),
        ([t / 2.0, h / 2.0], [t, h]),
        ([w - t / 2.0, h / 2.0], [t, h]),
    ];
    for (center, size) in walls {
        world.add_static_box(center, size, arena.wall_elasticity, arena.wall_friction);
    }
}
