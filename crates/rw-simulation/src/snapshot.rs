use rw_core::{CoreError, EntityId, WorldSnapshot};
use serde::{Deserialize, Serialize};

use crate::clock::GameClock;
use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use crate::script::Script;
use crate::simulation::Simulation;

/// A script assigned to one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptAssignment {
    /// The entity the script belongs to.
    pub entity: EntityId,
    /// Its stored script value.
    pub script: Script,
}

/// Plain-data form of a [`Simulation`]: the world, the clock and the stored
/// scripts. Systems, custom behaviors and the event log are not included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimSnapshot {
    /// Areas, entities and the id counter.
    pub world: WorldSnapshot,
    /// Global time and step count.
    pub clock: GameClock,
    /// Stored scripts, in entity order.
    #[serde(default)]
    pub scripts: Vec<ScriptAssignment>,
    /// Seed of the run that produced this snapshot.
    pub seed: u64,
}

impl SimSnapshot {
    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a snapshot from JSON.
    pub fn from_json(json: &str) -> SimResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Simulation {
    /// Capture the simulation. Fails if any stored script holds a callable.
    pub fn snapshot(&self) -> SimResult<SimSnapshot> {
        let mut scripts = Vec::new();
        for (entity, script) in self.scheduler.scripts() {
            if !script.is_serializable() {
                return Err(SimError::InvalidScript(format!(
                    "script of {entity} holds a callable and cannot be saved"
                )));
            }
            scripts.push(ScriptAssignment {
                entity,
                script: script.clone(),
            });
        }
        Ok(SimSnapshot {
            world: self.world.snapshot(),
            clock: self.clock.clone(),
            scripts,
            seed: self.config.seed,
        })
    }

    /// Rebuild a simulation from a snapshot.
    ///
    /// The RNG is reseeded from `config.seed` and the number of steps already
    /// taken. Built-in behaviors are available; custom ones and systems must
    /// be registered again.
    pub fn from_snapshot(snapshot: SimSnapshot, config: SimConfig) -> SimResult<Self> {
        let world = snapshot.world.restore()?;
        for assignment in &snapshot.scripts {
            if world.lookup(assignment.entity).is_none() {
                return Err(CoreError::CorruptSnapshot(format!(
                    "script assigned to missing entity {}",
                    assignment.entity
                ))
                .into());
            }
        }
        let mut sim = Simulation::with_clock(world, config, snapshot.clock);
        for assignment in snapshot.scripts {
            sim.scheduler.set_script(assignment.entity, assignment.script);
        }
        Ok(sim)
    }
}
