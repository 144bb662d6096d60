use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::area::{Area, AreaId, Tile, VOID_BLOCKER};
use crate::entity::{Entity, EntityId, PLAYER_ID, Position};
use crate::error::{CoreError, CoreResult};

/// Metadata about the world itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldMeta {
    /// Display name of the world.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// When the world was first created.
    pub created_at: DateTime<Utc>,
}

impl WorldMeta {
    /// Metadata with the given name, created now.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            created_at: Utc::now(),
        }
    }
}

/// The entity registry and the spatial index over all areas.
///
/// `World` is the only owner of entities. Placing, moving and removing an
/// entity goes through [`register`](Self::register),
/// [`move_entity`](Self::move_entity) and [`deregister`](Self::deregister),
/// which keep three structures in step: the registry map, each area's
/// entity set, and each tile's entity list.
#[derive(Debug, Clone)]
pub struct World {
    /// World metadata.
    pub meta: WorldMeta,
    entities: BTreeMap<EntityId, Entity>,
    areas: BTreeMap<AreaId, Area>,
    next_id: u64,
    active: Option<EntityId>,
}

impl World {
    /// An empty world with no areas or entities.
    pub fn new(meta: WorldMeta) -> Self {
        Self {
            meta,
            entities: BTreeMap::new(),
            areas: BTreeMap::new(),
            next_id: 1,
            active: None,
        }
    }

    pub(crate) fn from_parts(
        meta: WorldMeta,
        next_id: u64,
        areas: BTreeMap<AreaId, Area>,
        entities: BTreeMap<EntityId, Entity>,
    ) -> Self {
        Self {
            meta,
            entities,
            areas,
            next_id,
            active: None,
        }
    }

    // -----------------------------------------------------------------------
    // Areas
    // -----------------------------------------------------------------------

    /// Add an area, replacing any area with the same id. Returns the id.
    ///
    /// An area that still holds entities cannot be replaced; deregister or
    /// move them out first.
    pub fn add_area(&mut self, area: Area) -> CoreResult<AreaId> {
        let id = area.id();
        if let Some(existing) = self.areas.get(&id) {
            if existing.entity_count() > 0 {
                return Err(CoreError::AreaOccupied(id));
            }
        }
        debug!(%id, name = %area.kind().name, "added area");
        self.areas.insert(id, area);
        Ok(id)
    }

    /// Find an area by id.
    pub fn area(&self, id: AreaId) -> Option<&Area> {
        self.areas.get(&id)
    }

    /// Mutable access for terrain and flag edits. The entity indexes of an
    /// area can only be changed through the registry.
    pub fn area_mut(&mut self, id: AreaId) -> Option<&mut Area> {
        self.areas.get_mut(&id)
    }

    /// All areas, in id order.
    pub fn areas(&self) -> impl Iterator<Item = &Area> {
        self.areas.values()
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Register an entity, optionally at `position`, and return its id.
    ///
    /// Entities without an id get the next unused one (ids start at 1; the
    /// player id 0 is only ever assigned explicitly). An entity whose id is
    /// already registered is deregistered first, so registering again is how
    /// an entity is re-placed. When no position is given the entity keeps the
    /// one it carries.
    pub fn register(
        &mut self,
        mut entity: Entity,
        position: Option<Position>,
    ) -> CoreResult<EntityId> {
        if let Some(pos) = position {
            entity.set_position(Some(pos));
        }
        if let Some(pos) = entity.position() {
            self.check_placement(pos)?;
        }

        let id = match entity.id() {
            Some(id) => {
                let unmoved = self
                    .entities
                    .get(&id)
                    .is_some_and(|old| old.position() == entity.position());
                if unmoved {
                    // Same spot: the indexes already hold this id in place.
                    trace!(%id, "re-registered in place");
                    self.entities.insert(id, entity);
                    return Ok(id);
                }
                self.take(id);
                id
            }
            None => {
                let id = EntityId(self.next_id);
                entity.assign_id(id);
                id
            }
        };
        if id.0 >= self.next_id {
            self.next_id = id.0 + 1;
        }

        if let Some(Position {
            x,
            y,
            area: Some(area_id),
        }) = entity.position()
        {
            if let Some(area) = self.areas.get_mut(&area_id) {
                area.insert_entity(id, x, y);
            }
        }

        debug!(%id, kind = %entity.kind, position = ?entity.position(), "registered entity");
        if id == PLAYER_ID {
            trace!("player reference updated");
        }
        self.entities.insert(id, entity);
        Ok(id)
    }

    /// Remove an entity from every index and from the registry.
    ///
    /// Returns `false` (and changes nothing) if the id is not registered.
    pub fn deregister(&mut self, id: EntityId) -> bool {
        let found = self.take(id).is_some();
        if found {
            debug!(%id, "deregistered entity");
        }
        found
    }

    /// Re-place a registered entity at `position`.
    ///
    /// The target is validated before anything is touched, so a failed move
    /// leaves the entity where it was.
    pub fn move_entity(&mut self, id: EntityId, position: Position) -> CoreResult<()> {
        self.check_placement(position)?;
        let current = self.lookup(id).ok_or(CoreError::EntityNotFound(id))?;
        if current.position() == Some(position) {
            return Ok(());
        }
        let entity = self.take(id).ok_or(CoreError::EntityNotFound(id))?;
        self.register(entity, Some(position))?;
        Ok(())
    }

    fn take(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.entities.remove(&id)?;
        if let Some(Position {
            x,
            y,
            area: Some(area_id),
        }) = entity.position()
        {
            if let Some(area) = self.areas.get_mut(&area_id) {
                area.remove_entity(id, x, y);
            }
        }
        Some(entity)
    }

    fn check_placement(&self, pos: Position) -> CoreResult<()> {
        let Some(area_id) = pos.area else {
            return Ok(());
        };
        let area = self
            .areas
            .get(&area_id)
            .ok_or(CoreError::AreaNotFound(area_id))?;
        if !area.contains(pos.x, pos.y) {
            return Err(CoreError::OutOfBounds {
                area: area_id,
                x: pos.x,
                y: pos.y,
            });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    /// Find an entity by id.
    pub fn lookup(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Mutable access to entity data. Position and id stay read-only.
    pub fn lookup_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// The player entity, if registered.
    pub fn player(&self) -> Option<&Entity> {
        self.entities.get(&PLAYER_ID)
    }

    /// Mutable access to the player entity.
    pub fn player_mut(&mut self) -> Option<&mut Entity> {
        self.entities.get_mut(&PLAYER_ID)
    }

    /// All registered entities, in id order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Number of registered entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// The id the next auto-assigned registration will receive.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// The area the given entity stands in.
    pub fn area_of(&self, id: EntityId) -> Option<&Area> {
        self.lookup(id)
            .and_then(Entity::area)
            .and_then(|a| self.areas.get(&a))
    }

    /// The area the player stands in.
    pub fn current_area_id(&self) -> Option<AreaId> {
        self.player().and_then(Entity::area)
    }

    /// The area the player stands in.
    pub fn current_area(&self) -> Option<&Area> {
        self.current_area_id().and_then(|a| self.areas.get(&a))
    }

    // -----------------------------------------------------------------------
    // Active entity
    // -----------------------------------------------------------------------

    /// Mark the entity that is currently acting, or clear the marker.
    pub fn set_active(&mut self, id: Option<EntityId>) {
        self.active = id;
    }

    /// Id of the entity marked as acting.
    pub fn active_id(&self) -> Option<EntityId> {
        self.active
    }

    /// The entity currently marked as acting.
    pub fn active_entity(&self) -> CoreResult<&Entity> {
        let id = self.active.ok_or(CoreError::NoActiveEntity)?;
        self.entities.get(&id).ok_or(CoreError::EntityNotFound(id))
    }

    /// Mutable form of [`active_entity`](Self::active_entity).
    pub fn active_entity_mut(&mut self) -> CoreResult<&mut Entity> {
        let id = self.active.ok_or(CoreError::NoActiveEntity)?;
        self.entities
            .get_mut(&id)
            .ok_or(CoreError::EntityNotFound(id))
    }

    // -----------------------------------------------------------------------
    // Grid queries
    // -----------------------------------------------------------------------

    /// The tile at `(x, y)` in `area`, or `None` outside its bounds.
    pub fn tile(&self, area: AreaId, x: i32, y: i32) -> Option<&Tile> {
        self.areas.get(&area).and_then(|a| a.tile(x, y))
    }

    /// False for unknown areas, out-of-bounds coordinates and blocking terrain.
    pub fn is_walkable(&self, area: AreaId, x: i32, y: i32) -> bool {
        self.areas.get(&area).is_some_and(|a| a.is_walkable(x, y))
    }

    /// Blocker text for `(x, y)`, resolving occupants through this registry.
    /// An unknown area is treated like the void.
    pub fn blocker(&self, area: AreaId, x: i32, y: i32) -> Option<&str> {
        match self.areas.get(&area) {
            Some(a) => a.blocker(x, y, Some(self)),
            None => Some(VOID_BLOCKER),
        }
    }

    /// Entities standing on one tile, in arrival order.
    pub fn entities_at(&self, area: AreaId, x: i32, y: i32) -> &[EntityId] {
        self.areas
            .get(&area)
            .map(|a| a.occupants(x, y))
            .unwrap_or(&[])
    }

    // -----------------------------------------------------------------------
    // Consistency
    // -----------------------------------------------------------------------

    /// Verify that the registry and every area/tile index agree.
    pub fn check_index(&self) -> CoreResult<()> {
        let mismatch =
            |msg: String| -> CoreResult<()> { Err(CoreError::IndexMismatch(msg)) };

        for (id, entity) in &self.entities {
            if entity.id() != Some(*id) {
                return mismatch(format!("registry key {id} holds entity {:?}", entity.id()));
            }
            let Some(Position {
                x,
                y,
                area: Some(area_id),
            }) = entity.position()
            else {
                continue;
            };
            let Some(area) = self.areas.get(&area_id) else {
                return mismatch(format!("{id} stands in missing {area_id}"));
            };
            if !area.contains_entity(*id) {
                return mismatch(format!("{id} missing from the entity set of {area_id}"));
            }
            if !area.occupants(x, y).contains(id) {
                return mismatch(format!("{id} missing from tile ({x}, {y}) of {area_id}"));
            }
        }

        for area in self.areas.values() {
            let mut seen = Vec::new();
            for ((x, y), tile) in area.tiles() {
                for id in tile.entities() {
                    let at = self
                        .entities
                        .get(id)
                        .and_then(Entity::position)
                        .filter(|p| p.area == Some(area.id()))
                        .map(|p| p.coords());
                    if at != Some((x, y)) {
                        return mismatch(format!(
                            "tile ({x}, {y}) of {} lists {id}, which is not there",
                            area.id()
                        ));
                    }
                    seen.push(*id);
                }
            }
            seen.sort();
            let set: Vec<EntityId> = area.entity_ids().collect();
            if seen != set {
                return mismatch(format!(
                    "tile lists of {} do not match its entity set",
                    area.id()
                ));
            }
        }
        Ok(())
    }
}
