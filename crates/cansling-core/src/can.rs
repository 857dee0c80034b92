//! Registry of the active level's cans.
//!
//! Cans live in a generational arena. A [`CanId`] handed out for one level
//! stops resolving as soon as that level is unloaded, so a stale id is
//! detected instead of reaching into a removed physics body.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rapier2d::prelude::RigidBodyHandle;

use crate::config::GameConfig;
use crate::level::Level;
use crate::physics::{BodyHandles, BodyKind, ObjectTransform, PhysicsWorld};

/// Generational identifier of a can.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CanId {
    index: u32,
    generation: u32,
}

/// A live can and its physics handles.
#[derive(Debug, Clone)]
pub struct Can {
    pub id: CanId,
    pub handles: BodyHandles,
}

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    can: Option<Can>,
}

/// A can's id with its current transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanTransform {
    pub id: CanId,
    pub transform: ObjectTransform,
}

/// Sole owner of the cans in the physics world.
#[derive(Debug, Clone)]
pub struct CanRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    rng: ChaCha8Rng,
}

impl CanRegistry {
    /// Creates an empty registry whose spawn positions follow `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Spawns `level.object_count` cans at random positions in the spawn band.
    ///
    /// The registry must be empty; call [`CanRegistry::unload`] first.
    pub fn load(&mut self, world: &mut PhysicsWorld, level: &Level, config: &GameConfig) {
        debug_assert!(self.is_empty(), "load called with cans still registered");

        let [center_x, center_y] = config.spawn_center();
        let jitter = config.can.spawn_jitter;

        for _ in 0..level.object_count {
            let x = if jitter > 0.0 {
                center_x + self.rng.random_range(-jitter..=jitter)
            } else {
                center_x
            };
            self.spawn_at(world, [x, center_y], config);
        }

        tracing::info!(
            "[registry] Loaded {} cans for level '{}'",
            level.object_count,
            level.name
        );
    }

    /// Spawns one can at a specific position.
    pub fn spawn_at(&mut self, world: &mut PhysicsWorld, position: [f32; 2], config: &GameConfig) -> CanId {
        let handles = world.create_body(
            position,
            BodyKind::Dynamic,
            config.can.shape(),
            config.can.material(),
        );

        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                #[allow(clippy::cast_possible_truncation)]
                let index = self.slots.len() as u32;
                self.slots.push(Slot::default());
                index
            }
        };
        let slot = &mut self.slots[index as usize];
        let id = CanId {
            index,
            generation: slot.generation,
        };
        slot.can = Some(Can { id, handles });
        id
    }

    /// Removes every can from the world and invalidates all outstanding ids.
    pub fn unload(&mut self, world: &mut PhysicsWorld) {
        let mut removed = 0usize;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(can) = slot.can.take() {
                world.remove_body(can.handles.body);
                slot.generation = slot.generation.wrapping_add(1);
                #[allow(clippy::cast_possible_truncation)]
                self.free.push(index as u32);
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::info!("[registry] Unloaded {} cans", removed);
        }
    }

    /// Resolves an id, returning `None` once the can has been unloaded.
    pub fn get(&self, id: CanId) -> Option<&Can> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.can.as_ref())
    }

    /// Returns true if `id` still refers to a live can.
    pub fn is_live(&self, id: CanId) -> bool {
        self.get(id).is_some()
    }

    /// Finds the can that owns a physics body.
    pub fn find_by_body(&self, body: RigidBodyHandle) -> Option<CanId> {
        self.iter().find(|can| can.handles.body == body).map(|can| can.id)
    }

    /// Iterates live cans in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Can> {
        self.slots.iter().filter_map(|slot| slot.can.as_ref())
    }

    /// Number of live cans.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Reads the transform of one can.
    pub fn transform(&self, world: &PhysicsWorld, id: CanId) -> Option<ObjectTransform> {
        self.get(id)
            .and_then(|can| world.read_transform(can.handles.body))
    }

    /// Transforms of every live can, for conditions and rendering.
    pub fn snapshot(&self, world: &PhysicsWorld) -> Vec<CanTransform> {
        self.iter()
            .filter_map(|can| {
                world
                    .read_transform(can.handles.body)
                    .map(|transform| CanTransform {
                        id: can.id,
                        transform,
                    })
            })
            .collect()
    }

    /// Transforms only, in the shape conditions consume.
    pub fn transforms(&self, world: &PhysicsWorld) -> Vec<ObjectTransform> {
        self.snapshot(world).into_iter().map(|c| c.transform).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (PhysicsWorld, CanRegistry, GameConfig) {
        (PhysicsWorld::new(), CanRegistry::new(12345), GameConfig::default())
    }

    #[test]
    fn test_load_spawns_object_count() {
        let (mut world, mut registry, config) = setup();
        registry.load(&mut world, &Level::new("six", 6, 60.0, 3), &config);

        assert_eq!(registry.len(), 6);
        assert_eq!(world.body_count(), 6);
    }

    #[test]
    fn test_spawn_band() {
        let (mut world, mut registry, config) = setup();
        registry.load(&mut world, &Level::new("band", 20, 60.0, 3), &config);

        for can in registry.snapshot(&world) {
            let [x, y] = can.transform.position;
            assert!((350.0..=650.0).contains(&x), "x out of band: {x}");
            assert_eq!(y, 350.0);
        }
    }

    #[test]
    fn test_deterministic_spawning() {
        let config = GameConfig::default();
        let level = Level::new("det", 5, 60.0, 3);

        let mut world1 = PhysicsWorld::new();
        let mut registry1 = CanRegistry::new(42);
        registry1.load(&mut world1, &level, &config);

        let mut world2 = PhysicsWorld::new();
        let mut registry2 = CanRegistry::new(42);
        registry2.load(&mut world2, &level, &config);

        assert_eq!(registry1.transforms(&world1), registry2.transforms(&world2));
    }

    #[test]
    fn test_unload_removes_bodies() {
        let (mut world, mut registry, config) = setup();
        registry.load(&mut world, &Level::new("a", 4, 60.0, 3), &config);
        let handles: Vec<_> = registry.iter().map(|c| c.handles.body).collect();

        registry.unload(&mut world);

        assert!(registry.is_empty());
        assert_eq!(world.body_count(), 0);
        for handle in handles {
            assert!(!world.contains_body(handle));
        }
    }

    #[test]
    fn test_stale_id_does_not_resolve_after_reload() {
        let (mut world, mut registry, config) = setup();
        registry.load(&mut world, &Level::new("a", 2, 60.0, 3), &config);
        let old_id = registry.iter().next().unwrap().id;

        registry.unload(&mut world);
        registry.load(&mut world, &Level::new("b", 2, 60.0, 3), &config);

        // The slot is reused but the generation moved on.
        assert!(registry.get(old_id).is_none());
        assert!(registry.transform(&world, old_id).is_none());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_find_by_body() {
        let (mut world, mut registry, config) = setup();
        let id = registry.spawn_at(&mut world, [400.0, 200.0], &config);
        let body = registry.get(id).unwrap().handles.body;

        assert_eq!(registry.find_by_body(body), Some(id));

        registry.unload(&mut world);
        assert_eq!(registry.find_by_body(body), None);
    }
}
