use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::area::Area;
use crate::entity::Entity;
use crate::error::{CoreError, CoreResult};
use crate::world::{World, WorldMeta};

/// Plain-data form of a [`World`]: everything needed to rebuild the
/// registry, the id counter and every area with its indexes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// World metadata.
    pub meta: WorldMeta,
    /// The id the next automatic registration will receive.
    pub next_id: u64,
    /// All areas, including their tile and entity indexes.
    pub areas: Vec<Area>,
    /// All registered entities, in id order.
    pub entities: Vec<Entity>,
}

impl WorldSnapshot {
    /// Capture the current state of a world.
    pub fn capture(world: &World) -> Self {
        Self {
            meta: world.meta.clone(),
            next_id: world.next_id(),
            areas: world.areas().cloned().collect(),
            entities: world.entities().cloned().collect(),
        }
    }

    /// Rebuild a world, rejecting snapshots whose indexes disagree.
    pub fn restore(self) -> CoreResult<World> {
        let mut areas = BTreeMap::new();
        for area in self.areas {
            let expected = area.width() as usize * area.height() as usize;
            if area.tile_count() != expected {
                return Err(CoreError::CorruptSnapshot(format!(
                    "{} has {} tiles, expected {expected}",
                    area.id(),
                    area.tile_count()
                )));
            }
            let id = area.id();
            if areas.insert(id, area).is_some() {
                return Err(CoreError::CorruptSnapshot(format!("duplicate {id}")));
            }
        }

        let mut entities = BTreeMap::new();
        for entity in self.entities {
            let Some(id) = entity.id() else {
                return Err(CoreError::CorruptSnapshot(format!(
                    "entity \"{}\" has no id",
                    entity.name
                )));
            };
            if id.0 >= self.next_id && !id.is_player() {
                return Err(CoreError::CorruptSnapshot(format!(
                    "{id} is not below the id counter {}",
                    self.next_id
                )));
            }
            if entities.insert(id, entity).is_some() {
                return Err(CoreError::CorruptSnapshot(format!("duplicate entity {id}")));
            }
        }

        let world = World::from_parts(self.meta, self.next_id, areas, entities);
        world.check_index()?;
        Ok(world)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Parse from JSON. The result still has to be [`restore`](Self::restore)d.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl World {
    /// Shorthand for [`WorldSnapshot::capture`].
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot::capture(self)
    }
}
