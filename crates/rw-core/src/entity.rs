use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::area::AreaId;

/// Identifier for every registered entity.
///
/// Identifiers are handed out by [`World::register`](crate::World::register)
/// and never change afterwards. `0` is reserved for the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

/// The identifier reserved for the player-controlled entity.
pub const PLAYER_ID: EntityId = EntityId(0);

impl EntityId {
    /// Returns `true` if this is the reserved player identifier.
    pub fn is_player(self) -> bool {
        self == PLAYER_ID
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque reference to an item owned by an external item system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemRef(pub u64);

/// The class of an entity. Decides how the scheduler lets it act.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// The player-controlled entity. Never scheduled.
    Player,
    /// A non-player character.
    Npc,
    /// A roaming creature.
    Mob,
}

impl EntityKind {
    /// Lower-case class name, used as blocker text for occupied tiles.
    pub fn class_name(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Npc => "npc",
            Self::Mob => "mob",
        }
    }

    /// Parse a kind from its class name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "player" => Some(Self::Player),
            "npc" => Some(Self::Npc),
            "mob" => Some(Self::Mob),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}

/// Grid coordinates plus the owning area, if any.
///
/// A position without an area is not indexed anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
    /// The area these coordinates belong to.
    pub area: Option<AreaId>,
}

impl Position {
    /// A position inside the given area.
    pub fn new(area: AreaId, x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            area: Some(area),
        }
    }

    /// Coordinates that are not attached to any area.
    pub fn detached(x: i32, y: i32) -> Self {
        Self { x, y, area: None }
    }

    /// The coordinate pair.
    pub fn coords(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    /// Chebyshev distance to another coordinate pair.
    pub fn chebyshev(&self, (x, y): (i32, i32)) -> u32 {
        chebyshev((self.x, self.y), (x, y))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.area {
            Some(area) => write!(f, "({}, {}) in {area}", self.x, self.y),
            None => write!(f, "({}, {})", self.x, self.y),
        }
    }
}

/// Chebyshev (king-move) distance between two coordinate pairs.
pub fn chebyshev(a: (i32, i32), b: (i32, i32)) -> u32 {
    a.0.abs_diff(b.0).max(a.1.abs_diff(b.1))
}

/// A simulated actor.
///
/// The identifier and position are only written by the [`World`](crate::World)
/// registry so that the spatial index never drifts from the entity data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    id: Option<EntityId>,
    /// The class of this entity.
    pub kind: EntityKind,
    /// Display name.
    pub name: String,
    position: Option<Position>,
    local_time: u64,
    /// Opaque numeric stats owned by an external rules system.
    #[serde(default)]
    pub stats: BTreeMap<String, i64>,
    /// Opaque inventory owned by an external item system.
    #[serde(default)]
    pub inventory: Vec<ItemRef>,
}

impl Entity {
    /// Create a detached entity without an identifier.
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            id: None,
            kind,
            name: name.into(),
            position: None,
            local_time: 0,
            stats: BTreeMap::new(),
            inventory: Vec::new(),
        }
    }

    /// Create a detached entity with a pre-assigned identifier.
    pub fn with_id(id: EntityId, kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            ..Self::new(kind, name)
        }
    }

    /// The player entity, carrying the reserved identifier.
    pub fn player(name: impl Into<String>) -> Self {
        Self::with_id(PLAYER_ID, EntityKind::Player, name)
    }

    /// Builder: set an opaque stat.
    pub fn with_stat(mut self, name: impl Into<String>, value: i64) -> Self {
        self.stats.insert(name.into(), value);
        self
    }

    /// Builder: start the local clock at `time`.
    pub fn with_local_time(mut self, time: u64) -> Self {
        self.local_time = time;
        self
    }

    /// The registry id, or `None` before registration.
    pub fn id(&self) -> Option<EntityId> {
        self.id
    }

    /// Where the entity stands, if it has been placed.
    pub fn position(&self) -> Option<Position> {
        self.position
    }

    /// The area this entity stands in, if placed.
    pub fn area(&self) -> Option<AreaId> {
        self.position.and_then(|p| p.area)
    }

    /// Coordinates of a placed entity.
    pub fn coords(&self) -> Option<(i32, i32)> {
        self.position.map(|p| p.coords())
    }

    /// Returns `true` if the entity stands inside an area.
    pub fn is_placed(&self) -> bool {
        self.area().is_some()
    }

    /// Time this entity has spent on its own actions.
    pub fn local_time(&self) -> u64 {
        self.local_time
    }

    /// Charge `cost` time units to this entity's local clock.
    pub fn spend_time(&mut self, cost: u64) {
        self.local_time = self.local_time.saturating_add(cost);
    }

    /// Move the local clock to `time`. Used by external controllers that
    /// drive the player's clock directly.
    pub fn set_local_time(&mut self, time: u64) {
        self.local_time = time;
    }

    pub(crate) fn assign_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    pub(crate) fn set_position(&mut self, position: Option<Position>) {
        self.position = position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_carries_reserved_id() {
        let player = Entity::player("Hero");
        assert_eq!(player.id(), Some(PLAYER_ID));
        assert!(PLAYER_ID.is_player());
        assert_eq!(player.kind, EntityKind::Player);
    }

    #[test]
    fn new_entity_is_detached() {
        let goblin = Entity::new(EntityKind::Mob, "Goblin");
        assert!(goblin.id().is_none());
        assert!(goblin.position().is_none());
        assert!(!goblin.is_placed());
        assert_eq!(goblin.local_time(), 0);
    }

    #[test]
    fn spend_time_accumulates() {
        let mut npc = Entity::new(EntityKind::Npc, "Smith").with_local_time(50);
        npc.spend_time(100);
        npc.spend_time(100);
        assert_eq!(npc.local_time(), 250);
    }

    #[test]
    fn kind_parse_and_class_name() {
        assert_eq!(EntityKind::parse("MOB"), Some(EntityKind::Mob));
        assert_eq!(EntityKind::parse("dragon"), None);
        assert_eq!(EntityKind::Npc.class_name(), "npc");
        assert_eq!(EntityKind::Player.to_string(), "player");
    }

    #[test]
    fn chebyshev_distance() {
        assert_eq!(chebyshev((0, 0), (4, 4)), 4);
        assert_eq!(chebyshev((1, 1), (8, 3)), 7);
        assert_eq!(chebyshev((2, 2), (2, 2)), 0);
        assert_eq!(Position::detached(-1, 0).chebyshev((1, 0)), 2);
    }

    #[test]
    fn detached_position_has_no_area() {
        let pos = Position::detached(3, 4);
        assert!(pos.area.is_none());
        assert_eq!(pos.to_string(), "(3, 4)");
        assert_eq!(Position::new(AreaId(2), 3, 4).to_string(), "(3, 4) in area 2");
    }
}
