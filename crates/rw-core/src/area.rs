use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, ItemRef};
use crate::world::World;

/// Blocker text for coordinates outside an area.
pub const VOID_BLOCKER: &str = "void";

/// Blocker text for an occupant id that the registry cannot resolve.
pub const UNKNOWN_OCCUPANT: &str = "something";

/// Identifier of an area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AreaId(pub u32);

impl fmt::Display for AreaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "area {}", self.0)
    }
}

/// Static ground properties of a tile.
///
/// `name` and `symbol` are display data only; the simulation reads
/// `walkable` and, for blocked tiles, `description`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terrain {
    /// Short identifier, e.g. `"grass"`.
    pub name: String,
    /// Whether entities may stand on this terrain.
    pub walkable: bool,
    /// Human-readable text, reported as the blocker for non-walkable terrain.
    pub description: String,
    /// Render glyph.
    pub symbol: char,
}

impl Terrain {
    /// Create a terrain type.
    pub fn new(
        name: impl Into<String>,
        walkable: bool,
        description: impl Into<String>,
        symbol: char,
    ) -> Self {
        Self {
            name: name.into(),
            walkable,
            description: description.into(),
            symbol,
        }
    }

    /// Open grass.
    pub fn grass() -> Self {
        Self::new("grass", true, "grass", '.')
    }

    /// Walkable stone floor.
    pub fn floor() -> Self {
        Self::new("floor", true, "stone floor", '_')
    }

    /// An impassable wall.
    pub fn wall() -> Self {
        Self::new("wall", false, "a wall", '#')
    }

    /// Deep water; not walkable.
    pub fn water() -> Self {
        Self::new("water", false, "deep water", '~')
    }
}

/// One grid cell: terrain, items lying on it, and the entities standing on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    /// The ground of this cell.
    pub terrain: Terrain,
    /// Items lying here, in drop order.
    #[serde(default)]
    pub items: Vec<ItemRef>,
    #[serde(default)]
    entities: Vec<EntityId>,
}

impl Tile {
    /// An empty tile of the given terrain.
    pub fn new(terrain: Terrain) -> Self {
        Self {
            terrain,
            items: Vec::new(),
            entities: Vec::new(),
        }
    }

    /// Entities currently standing here.
    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    /// Whether any entity stands here.
    pub fn is_occupied(&self) -> bool {
        !self.entities.is_empty()
    }

    fn add_entity(&mut self, id: EntityId) {
        if !self.entities.contains(&id) {
            self.entities.push(id);
        }
    }

    fn remove_entity(&mut self, id: EntityId) {
        self.entities.retain(|e| *e != id);
    }
}

/// The terrain-type descriptor of an area: its name and fixed size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaKind {
    /// Descriptive name, e.g. `"meadow"`.
    pub name: String,
    /// Number of columns.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
}

impl AreaKind {
    /// A named area type of the given size.
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
        }
    }
}

/// A rectangular tiled region.
///
/// Besides the tiles, an area keeps the set of every entity standing anywhere
/// inside it. The set and the per-tile lists always hold the same ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    id: AreaId,
    kind: AreaKind,
    tiles: Vec<Tile>,
    visited: bool,
    discovered: bool,
    entities: BTreeSet<EntityId>,
}

impl Area {
    /// Create an area filled with a single terrain.
    pub fn new(id: AreaId, kind: AreaKind, fill: Terrain) -> Self {
        let count = kind.width as usize * kind.height as usize;
        Self {
            id,
            kind,
            tiles: vec![Tile::new(fill); count],
            visited: false,
            discovered: false,
            entities: BTreeSet::new(),
        }
    }

    /// Builder: replace the outermost ring of tiles with `terrain`.
    pub fn with_border(mut self, terrain: Terrain) -> Self {
        let (w, h) = (self.width() as i32, self.height() as i32);
        for y in 0..h {
            for x in 0..w {
                if x == 0 || y == 0 || x == w - 1 || y == h - 1 {
                    self.set_terrain(x, y, terrain.clone());
                }
            }
        }
        self
    }

    /// This area's id.
    pub fn id(&self) -> AreaId {
        self.id
    }

    /// Name and size of this area.
    pub fn kind(&self) -> &AreaKind {
        &self.kind
    }

    /// Number of columns.
    pub fn width(&self) -> u32 {
        self.kind.width
    }

    /// Number of rows.
    pub fn height(&self) -> u32 {
        self.kind.height
    }

    /// Returns `true` if `(x, y)` lies inside this area.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.index_of(x, y).is_some()
    }

    fn index_of(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.kind.width || y as u32 >= self.kind.height {
            return None;
        }
        Some(y as usize * self.kind.width as usize + x as usize)
    }

    /// Bounds-checked tile lookup. `None` outside the area.
    pub fn tile(&self, x: i32, y: i32) -> Option<&Tile> {
        self.index_of(x, y).map(|i| &self.tiles[i])
    }

    /// Mutable tile lookup for terrain and item edits.
    pub fn tile_mut(&mut self, x: i32, y: i32) -> Option<&mut Tile> {
        self.index_of(x, y).map(|i| &mut self.tiles[i])
    }

    /// Replace the terrain at `(x, y)`. Returns `false` outside the area.
    pub fn set_terrain(&mut self, x: i32, y: i32, terrain: Terrain) -> bool {
        match self.tile_mut(x, y) {
            Some(tile) => {
                tile.terrain = terrain;
                true
            }
            None => false,
        }
    }

    /// `false` outside the area or on non-walkable terrain.
    pub fn is_walkable(&self, x: i32, y: i32) -> bool {
        self.tile(x, y).is_some_and(|t| t.terrain.walkable)
    }

    /// Why movement into `(x, y)` is disallowed, if it is.
    ///
    /// Checked in order: outside the area reports [`VOID_BLOCKER`], non-walkable
    /// terrain reports the terrain description, and only when a `world` is
    /// given are occupants considered, reporting the first occupant's class
    /// name (or [`UNKNOWN_OCCUPANT`] if the id is not registered).
    pub fn blocker<'a>(&'a self, x: i32, y: i32, world: Option<&'a World>) -> Option<&'a str> {
        let Some(tile) = self.tile(x, y) else {
            return Some(VOID_BLOCKER);
        };
        if !tile.terrain.walkable {
            return Some(tile.terrain.description.as_str());
        }
        let world = world?;
        let first = tile.entities.first()?;
        Some(
            world
                .lookup(*first)
                .map(|e| e.kind.class_name())
                .unwrap_or(UNKNOWN_OCCUPANT),
        )
    }

    /// Entities standing on `(x, y)`. Empty outside the area.
    pub fn occupants(&self, x: i32, y: i32) -> &[EntityId] {
        self.tile(x, y).map(Tile::entities).unwrap_or(&[])
    }

    /// Every entity present in this area, in ascending id order.
    pub fn entity_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter().copied()
    }

    /// Whether `id` stands anywhere in this area.
    pub fn contains_entity(&self, id: EntityId) -> bool {
        self.entities.contains(&id)
    }

    /// Number of entities in this area.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Iterate every tile with its coordinates, row by row.
    pub fn tiles(&self) -> impl Iterator<Item = ((i32, i32), &Tile)> + '_ {
        let width = self.kind.width as usize;
        self.tiles
            .iter()
            .enumerate()
            .map(move |(i, t)| (((i % width) as i32, (i / width) as i32), t))
    }

    /// Whether the player has entered this area.
    pub fn visited(&self) -> bool {
        self.visited
    }

    /// Whether this area is known to the player.
    pub fn discovered(&self) -> bool {
        self.discovered
    }

    /// Mark the area visited. A visited area is also discovered.
    pub fn mark_visited(&mut self) {
        self.visited = true;
        self.discovered = true;
    }

    /// Mark the area discovered without visiting it.
    pub fn mark_discovered(&mut self) {
        self.discovered = true;
    }

    pub(crate) fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Add `id` to the area set and to the tile at `(x, y)`. Duplicate-safe.
    /// Callers have already checked the bounds.
    pub(crate) fn insert_entity(&mut self, id: EntityId, x: i32, y: i32) {
        if let Some(i) = self.index_of(x, y) {
            self.tiles[i].add_entity(id);
            self.entities.insert(id);
        }
    }

    pub(crate) fn remove_entity(&mut self, id: EntityId, x: i32, y: i32) {
        if let Some(i) = self.index_of(x, y) {
            self.tiles[i].remove_entity(id);
        }
        self.entities.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meadow() -> Area {
        Area::new(AreaId(1), AreaKind::new("meadow", 4, 3), Terrain::grass())
    }

    #[test]
    fn tile_lookup_is_bounds_checked() {
        let area = meadow();
        assert!(area.tile(0, 0).is_some());
        assert!(area.tile(3, 2).is_some());
        assert!(area.tile(4, 0).is_none());
        assert!(area.tile(0, 3).is_none());
        assert!(area.tile(-1, 1).is_none());
    }

    #[test]
    fn walkability_follows_terrain() {
        let mut area = meadow();
        area.set_terrain(1, 1, Terrain::water());
        assert!(area.is_walkable(0, 0));
        assert!(!area.is_walkable(1, 1));
        assert!(!area.is_walkable(9, 9));
    }

    #[test]
    fn blocker_outside_is_void() {
        let area = meadow();
        assert_eq!(area.blocker(-1, 0, None), Some(VOID_BLOCKER));
        assert_eq!(area.blocker(2, 1, None), None);
    }

    #[test]
    fn blocker_reports_terrain_description() {
        let mut area = meadow();
        area.set_terrain(2, 2, Terrain::wall());
        assert_eq!(area.blocker(2, 2, None), Some("a wall"));
    }

    #[test]
    fn occupants_ignored_without_world() {
        let mut area = meadow();
        area.insert_entity(EntityId(4), 1, 1);
        assert_eq!(area.blocker(1, 1, None), None);
        assert_eq!(area.occupants(1, 1), &[EntityId(4)]);
    }

    #[test]
    fn insert_is_duplicate_safe() {
        let mut area = meadow();
        area.insert_entity(EntityId(4), 1, 1);
        area.insert_entity(EntityId(4), 1, 1);
        assert_eq!(area.occupants(1, 1).len(), 1);
        assert_eq!(area.entity_count(), 1);

        area.remove_entity(EntityId(4), 1, 1);
        assert!(area.occupants(1, 1).is_empty());
        assert!(!area.contains_entity(EntityId(4)));
    }

    #[test]
    fn border_builder_walls_the_edge() {
        let area = Area::new(AreaId(1), AreaKind::new("cell", 5, 5), Terrain::floor())
            .with_border(Terrain::wall());
        assert!(!area.is_walkable(0, 0));
        assert!(!area.is_walkable(4, 2));
        assert!(area.is_walkable(1, 1));
        assert!(area.is_walkable(3, 3));
    }

    #[test]
    fn tiles_iterate_row_major() {
        let area = meadow();
        let coords: Vec<_> = area.tiles().map(|(c, _)| c).take(5).collect();
        assert_eq!(coords, vec![(0, 0), (1, 0), (2, 0), (3, 0), (0, 1)]);
        assert_eq!(area.tile_count(), 12);
    }

    #[test]
    fn visiting_also_discovers() {
        let mut area = meadow();
        assert!(!area.visited() && !area.discovered());
        area.mark_visited();
        assert!(area.visited() && area.discovered());
    }
}
