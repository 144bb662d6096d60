use std::collections::BTreeSet;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rw_core::{Entity, EntityId, PLAYER_ID, Position, World, chebyshev};
use tracing::debug;

use crate::clock::GameClock;
use crate::config::SimConfig;
use crate::context::SimContext;
use crate::error::{SimError, SimResult};
use crate::event::{EventLog, SimEventKind};
use crate::pathfind::{PathTarget, Pathfinder};
use crate::scheduler::Scheduler;
use crate::script::{BehaviorFn, Script, ScriptEngine};
use crate::system::System;

/// The top-level simulation.
///
/// Owns the world, the global clock, the RNG, the event log, the script
/// engine and the scheduler, and drives the turn loop. Nothing here is
/// global: two simulations never share state.
pub struct Simulation {
    pub(crate) world: World,
    pub(crate) clock: GameClock,
    pub(crate) rng: StdRng,
    pub(crate) events: EventLog,
    pub(crate) config: SimConfig,
    pub(crate) engine: ScriptEngine,
    pub(crate) scheduler: Scheduler,
    systems: Vec<Box<dyn System>>,
    encounters: BTreeSet<EntityId>,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("time", &self.clock.time())
            .field("entities", &self.world.entity_count())
            .field("systems", &self.systems.len())
            .field("events", &self.events.len())
            .finish()
    }
}

impl Simulation {
    /// Create a simulation over `world` with the built-in behaviors.
    pub fn new(world: World, config: SimConfig) -> Self {
        Self::with_clock(world, config, GameClock::new())
    }

    pub(crate) fn with_clock(world: World, config: SimConfig, clock: GameClock) -> Self {
        let rng = StdRng::seed_from_u64(config.seed.wrapping_add(clock.steps()));
        let events = EventLog::new(config.max_events);
        Self {
            world,
            clock,
            rng,
            events,
            config,
            engine: ScriptEngine::with_builtins(),
            scheduler: Scheduler::new(),
            systems: Vec::new(),
            encounters: BTreeSet::new(),
        }
    }

    /// Register a system. Systems run in registration order.
    pub fn add_system<S: System + 'static>(&mut self, system: S) {
        self.systems.push(Box::new(system));
    }

    /// Register (or replace) a named behavior.
    pub fn register_behavior(&mut self, name: impl Into<String>, behavior: BehaviorFn) {
        self.engine.register(name, behavior);
    }

    /// The script engine and its registered behaviors.
    pub fn engine(&self) -> &ScriptEngine {
        &self.engine
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Register an entity and record it in the event log.
    pub fn spawn(&mut self, entity: Entity, position: Option<Position>) -> SimResult<EntityId> {
        let name = entity.name.clone();
        let id = self.world.register(entity, position)?;
        self.ctx().emit(
            SimEventKind::Registered { entity: id },
            format!("{name} appeared"),
        );
        Ok(id)
    }

    /// Remove an entity, its script and any pending encounter.
    pub fn despawn(&mut self, id: EntityId) -> SimResult<()> {
        let name = self
            .world
            .lookup(id)
            .map(|e| e.name.clone())
            .ok_or(SimError::EntityNotFound(id))?;
        self.world.deregister(id);
        self.scheduler.clear_script(id);
        self.encounters.remove(&id);
        self.ctx().emit(
            SimEventKind::Deregistered { entity: id },
            format!("{name} disappeared"),
        );
        Ok(())
    }

    /// Relocate an entity through the registry.
    pub fn move_entity(&mut self, id: EntityId, position: Position) -> SimResult<()> {
        if self.world.lookup(id).is_none() {
            return Err(SimError::EntityNotFound(id));
        }
        self.world.move_entity(id, position)?;
        Ok(())
    }

    /// Give an entity a script to run on its next actions.
    pub fn set_script(&mut self, id: EntityId, script: Script) -> SimResult<()> {
        if self.world.lookup(id).is_none() {
            return Err(SimError::EntityNotFound(id));
        }
        self.scheduler.set_script(id, script);
        Ok(())
    }

    /// The script stored for `id`, if any.
    pub fn script(&self, id: EntityId) -> Option<&Script> {
        self.scheduler.script(id)
    }

    /// The scheduler and its stored scripts.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Run `script` once with `actor` as the active entity, outside the
    /// scheduler. Returns the continuation without storing it.
    pub fn run_script(&mut self, actor: EntityId, script: &Script) -> SimResult<Script> {
        if self.world.lookup(actor).is_none() {
            return Err(SimError::EntityNotFound(actor));
        }
        let previous = self.world.active_id();
        self.world.set_active(Some(actor));
        let mut ctx = SimContext {
            world: &mut self.world,
            clock: &self.clock,
            events: &mut self.events,
            rng: &mut self.rng,
            config: &self.config,
        };
        let result = self.engine.run_value(&mut ctx, script);
        self.world.set_active(previous);
        result
    }

    /// Search for a route from `start` using the configured expansion limit.
    pub fn find_path(
        &self,
        start: Position,
        target: impl Into<PathTarget>,
        proximity: u32,
    ) -> SimResult<Vec<(i32, i32)>> {
        Pathfinder::new()
            .with_proximity(proximity)
            .with_expansion_limit(self.config.max_path_expansions)
            .find(&self.world, start, target)
    }

    // -----------------------------------------------------------------------
    // Time
    // -----------------------------------------------------------------------

    /// Advance the global clock by `step` and sweep the player's area once.
    ///
    /// A zero step does nothing and returns `false`. Without a player there
    /// is no current area, so only the clock moves.
    pub fn advance_time(&mut self, step: u64) -> SimResult<bool> {
        if step == 0 {
            return Ok(false);
        }
        self.clock.advance(step);
        let Some(area) = self.world.current_area_id() else {
            debug!(time = self.clock.time(), "no current area to sweep");
            return Ok(true);
        };
        let mut ctx = SimContext {
            world: &mut self.world,
            clock: &self.clock,
            events: &mut self.events,
            rng: &mut self.rng,
            config: &self.config,
        };
        self.scheduler.sweep(&mut ctx, &self.engine, area)?;
        Ok(true)
    }

    /// Run one turn: catch the world up to the player's local time.
    ///
    /// Returns `false` without doing anything when the player is not ahead
    /// of the global clock. Otherwise runs, in order: pre-step systems, the
    /// global step, post-step systems and the encounter check.
    pub fn time_update(&mut self) -> SimResult<bool> {
        let player = self
            .world
            .player()
            .ok_or(SimError::EntityNotFound(PLAYER_ID))?;
        let pending = player.local_time().saturating_sub(self.clock.time());
        if pending == 0 {
            return Ok(false);
        }

        self.run_systems(Phase::Pre)?;
        self.advance_time(pending)?;
        self.run_systems(Phase::Post)?;
        self.check_encounters();
        debug!(time = self.clock.time(), "turn complete");
        Ok(true)
    }

    /// Let the player spend `time` and then run a turn.
    pub fn player_wait(&mut self, time: u64) -> SimResult<bool> {
        self.world
            .player_mut()
            .ok_or(SimError::EntityNotFound(PLAYER_ID))?
            .spend_time(time);
        self.time_update()
    }

    fn run_systems(&mut self, phase: Phase) -> SimResult<()> {
        for i in 0..self.systems.len() {
            let mut system = std::mem::replace(&mut self.systems[i], Box::new(NoopSystem));
            let mut ctx = SimContext {
                world: &mut self.world,
                clock: &self.clock,
                events: &mut self.events,
                rng: &mut self.rng,
                config: &self.config,
            };
            let result = match phase {
                Phase::Pre => system.pre_step(&mut ctx),
                Phase::Post => system.post_step(&mut ctx),
            };
            self.systems[i] = system;
            result?;
        }
        Ok(())
    }

    /// Emit an encounter for every entity that has just come within range
    /// of the player. An entity must leave the range before it can trigger
    /// again.
    fn check_encounters(&mut self) {
        let Some(player_pos) = self.world.player().and_then(|p| p.position()) else {
            return;
        };
        let Some(area) = player_pos.area.and_then(|a| self.world.area(a)) else {
            return;
        };
        let radius = self.config.encounter_radius;
        let mut in_range = BTreeSet::new();
        let mut fresh = Vec::new();
        for id in area.entity_ids().filter(|id| !id.is_player()) {
            let Some(entity) = self.world.lookup(id) else {
                continue;
            };
            let Some(coords) = entity.coords() else {
                continue;
            };
            if chebyshev(coords, player_pos.coords()) <= radius {
                in_range.insert(id);
                if !self.encounters.contains(&id) {
                    fresh.push((id, entity.name.clone()));
                }
            }
        }
        self.encounters = in_range;

        for (id, name) in fresh {
            self.ctx().emit(
                SimEventKind::Encounter {
                    entity: id,
                    with: PLAYER_ID,
                },
                format!("{name} is next to you"),
            );
        }
    }

    fn ctx(&mut self) -> SimContext<'_> {
        SimContext {
            world: &mut self.world,
            clock: &self.clock,
            events: &mut self.events,
            rng: &mut self.rng,
            config: &self.config,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The simulated world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable world access. Use the registry methods to move entities.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// The global clock.
    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    /// Events recorded so far.
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// The run configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Access a system by downcasting to a concrete type.
    pub fn get_system<T: System + 'static>(&self) -> Option<&T> {
        self.systems
            .iter()
            .find_map(|s| s.as_any().downcast_ref::<T>())
    }

    /// Access a system mutably by downcasting to a concrete type.
    pub fn get_system_mut<T: System + 'static>(&mut self) -> Option<&mut T> {
        self.systems
            .iter_mut()
            .find_map(|s| s.as_any_mut().downcast_mut::<T>())
    }

    /// Extract the world, consuming the simulation.
    pub fn into_world(self) -> World {
        self.world
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Pre,
    Post,
}

/// Placeholder system used while a real one is borrowed out of the list.
#[derive(Debug)]
struct NoopSystem;

impl System for NoopSystem {
    fn name(&self) -> &str {
        "noop"
    }
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
