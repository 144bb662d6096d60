//! Owned pieces of a [`SimContext`] for unit tests.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rw_core::{
    Area, AreaId, AreaKind, Entity, EntityId, EntityKind, Position, Terrain, World, WorldMeta,
};

use crate::clock::GameClock;
use crate::config::SimConfig;
use crate::context::SimContext;
use crate::event::EventLog;

pub(crate) const FIELD: AreaId = AreaId(1);

pub(crate) struct Harness {
    pub world: World,
    pub clock: GameClock,
    pub events: EventLog,
    pub rng: StdRng,
    pub config: SimConfig,
}

impl Harness {
    /// A 10x10 grass field and no entities.
    pub fn new() -> Self {
        let mut world = World::new(WorldMeta::new("Harness"));
        world
            .add_area(Area::new(
                FIELD,
                AreaKind::new("field", 10, 10),
                Terrain::grass(),
            ))
            .unwrap();
        Self {
            world,
            clock: GameClock::new(),
            events: EventLog::new(0),
            rng: StdRng::seed_from_u64(7),
            config: SimConfig::default(),
        }
    }

    /// A field with one mob at `(x, y)`, already marked as the actor.
    pub fn with_mob_at(x: i32, y: i32) -> Self {
        let mut h = Self::new();
        let id = h.place(EntityKind::Mob, x, y);
        h.world.set_active(Some(id));
        h
    }

    pub fn place(&mut self, kind: EntityKind, x: i32, y: i32) -> EntityId {
        self.world
            .register(
                Entity::new(kind, kind.class_name()),
                Some(Position::new(FIELD, x, y)),
            )
            .unwrap()
    }

    pub fn actor(&self) -> &Entity {
        self.world.active_entity().unwrap()
    }

    pub fn ctx(&mut self) -> SimContext<'_> {
        SimContext {
            world: &mut self.world,
            clock: &self.clock,
            events: &mut self.events,
            rng: &mut self.rng,
            config: &self.config,
        }
    }
}
