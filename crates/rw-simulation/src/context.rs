use rand::rngs::StdRng;
use rw_core::{CoreError, EntityId, Position, World};
use tracing::trace;

use crate::clock::GameClock;
use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use crate::event::{EventLog, SimEvent, SimEventKind};

/// Mutable context handed to behaviors and systems.
pub struct SimContext<'a> {
    /// The world being simulated.
    pub world: &'a mut World,
    /// The global clock, read-only during a step.
    pub clock: &'a GameClock,
    /// Log that receives emitted events.
    pub events: &'a mut EventLog,
    /// Seeded random source.
    pub rng: &'a mut StdRng,
    /// Run configuration.
    pub config: &'a SimConfig,
}

impl SimContext<'_> {
    /// Emit a simulation event at the current global time.
    pub fn emit(&mut self, kind: SimEventKind, description: impl Into<String>) {
        self.events
            .push(SimEvent::new(self.clock.time(), kind, description));
    }

    /// Current global time.
    pub fn time(&self) -> u64 {
        self.clock.time()
    }

    /// The id of the entity currently acting.
    pub fn actor(&self) -> SimResult<EntityId> {
        self.world
            .active_id()
            .ok_or(SimError::Core(CoreError::NoActiveEntity))
    }

    /// Where the acting entity stands. Fails if it is not inside an area.
    pub fn actor_position(&self) -> SimResult<Position> {
        let entity = self.world.active_entity()?;
        entity.position().filter(|p| p.area.is_some()).ok_or_else(|| {
            SimError::InvalidTarget(format!("{} is not placed in an area", entity.name))
        })
    }

    /// Charge one action to the acting entity's local clock.
    pub fn spend_action(&mut self) -> SimResult<()> {
        let cost = self.config.action_cost;
        self.world.active_entity_mut()?.spend_time(cost);
        Ok(())
    }

    /// Step the acting entity onto `(x, y)` if nothing blocks it.
    ///
    /// Returns `false` when the tile is blocked by terrain, an occupant,
    /// or the area edge.
    pub fn step_actor_to(&mut self, x: i32, y: i32) -> SimResult<bool> {
        let id = self.actor()?;
        let from = self.actor_position()?;
        let Some(area) = from.area else {
            return Ok(false);
        };
        if let Some(blocker) = self.world.blocker(area, x, y) {
            trace!(%id, x, y, blocker, "step blocked");
            return Ok(false);
        }
        self.world.move_entity(id, Position::new(area, x, y))?;
        let name = self
            .world
            .lookup(id)
            .map(|e| e.name.clone())
            .unwrap_or_default();
        self.emit(
            SimEventKind::Moved {
                entity: id,
                from: from.coords(),
                to: (x, y),
            },
            format!("{name} moved to ({x}, {y})"),
        );
        Ok(true)
    }
}
