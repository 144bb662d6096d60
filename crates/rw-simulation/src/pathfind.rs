//! A* search over an area's tiles.
//!
//! Moves are king moves (4 orthogonal + 4 diagonal). A neighbor is only
//! entered if it is inside the area, walkable, and has no blocker at search
//! time, so other entities are routed around. When the goal cannot be
//! reached the search returns the route to the closest tile it expanded.

use rw_core::{Area, AreaId, CoreError, EntityId, Position, World, chebyshev};
use tracing::trace;

use crate::error::{SimError, SimResult};

/// Cost of an orthogonal step.
pub const ORTHOGONAL_COST: f64 = 1.0;

/// Cost of a diagonal step. A deliberate approximation of √2; costs and
/// tie-breaks depend on this exact value.
pub const DIAGONAL_COST: f64 = 1.4;

/// Orthogonal offsets first, then diagonals. The order fixes tie-breaks.
const NEIGHBORS: [(i32, i32, bool); 8] = [
    (0, -1, false),
    (1, 0, false),
    (0, 1, false),
    (-1, 0, false),
    (1, -1, true),
    (1, 1, true),
    (-1, 1, true),
    (-1, -1, true),
];

/// What a search is heading for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathTarget {
    /// Wherever this entity currently stands.
    Entity(EntityId),
    /// Coordinates in the start's area.
    Coords(i32, i32),
    /// A fully qualified position.
    Position(Position),
}

impl From<EntityId> for PathTarget {
    fn from(id: EntityId) -> Self {
        Self::Entity(id)
    }
}

impl From<(i32, i32)> for PathTarget {
    fn from((x, y): (i32, i32)) -> Self {
        Self::Coords(x, y)
    }
}

impl From<Position> for PathTarget {
    fn from(pos: Position) -> Self {
        Self::Position(pos)
    }
}

/// Search settings. The default searches for an exact landing on the target
/// with no expansion limit.
#[derive(Debug, Clone, PartialEq)]
pub struct Pathfinder {
    proximity: u32,
    max_expansions: Option<usize>,
    diagonal_cost: f64,
}

impl Default for Pathfinder {
    fn default() -> Self {
        Self {
            proximity: 0,
            max_expansions: None,
            diagonal_cost: DIAGONAL_COST,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct OpenNode {
    index: usize,
    g: f64,
    f: f64,
}

impl Pathfinder {
    /// Default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop once within this Chebyshev distance of the target.
    pub fn with_proximity(mut self, radius: u32) -> Self {
        self.proximity = radius;
        self
    }

    /// Give up once this many nodes have had their neighbors generated and
    /// return the route to the closest node reached so far.
    pub fn with_expansion_limit(mut self, limit: Option<usize>) -> Self {
        self.max_expansions = limit;
        self
    }

    /// Override the diagonal step cost.
    pub fn with_diagonal_cost(mut self, cost: f64) -> Self {
        self.diagonal_cost = cost;
        self
    }

    /// Find a route from `start` toward `target`.
    ///
    /// The returned coordinates begin with the first step after `start` and
    /// end at the reached tile. An empty route means the start is already
    /// close enough, or no expanded tile was closer than the start.
    pub fn find(
        &self,
        world: &World,
        start: Position,
        target: impl Into<PathTarget>,
    ) -> SimResult<Vec<(i32, i32)>> {
        let Some(area_id) = start.area else {
            return Err(SimError::InvalidTarget(
                "start is not inside an area".into(),
            ));
        };
        let goal = resolve_target(world, area_id, target.into())?;
        if goal.area != Some(area_id) {
            return Err(SimError::InvalidTarget(format!(
                "target {goal} is not in {area_id}"
            )));
        }
        let area = world
            .area(area_id)
            .ok_or(SimError::Core(CoreError::AreaNotFound(area_id)))?;
        if !area.contains(start.x, start.y) {
            return Err(SimError::InvalidTarget(format!(
                "start {start} is outside the area"
            )));
        }

        let goal = goal.coords();
        if chebyshev(start.coords(), goal) <= self.proximity {
            return Ok(Vec::new());
        }

        Ok(self.search(world, area, start.coords(), goal))
    }

    fn search(
        &self,
        world: &World,
        area: &Area,
        start: (i32, i32),
        goal: (i32, i32),
    ) -> Vec<(i32, i32)> {
        let width = area.width() as usize;
        let node_count = width * area.height() as usize;
        let coords = |index: usize| ((index % width) as i32, (index / width) as i32);
        let index_of = |(x, y): (i32, i32)| y as usize * width + x as usize;
        let heuristic =
            |c: (i32, i32)| chebyshev(c, goal).saturating_sub(self.proximity) as f64;

        let mut closed = vec![false; node_count];
        let mut best_g = vec![f64::INFINITY; node_count];
        let mut parent: Vec<Option<usize>> = vec![None; node_count];
        let mut open = Vec::new();

        let start_index = index_of(start);
        best_g[start_index] = 0.0;
        open.push(OpenNode {
            index: start_index,
            g: 0.0,
            f: heuristic(start),
        });

        let mut closest = (chebyshev(start, goal), start_index);
        let mut expansions = 0usize;

        while !open.is_empty() {
            let current = open.remove(pick_best_open_node(&open));
            if closed[current.index] {
                continue;
            }
            closed[current.index] = true;

            let here = coords(current.index);
            let distance = chebyshev(here, goal);
            if distance <= self.proximity {
                trace!(?start, ?goal, expansions, "path found");
                return reconstruct(&parent, current.index, coords);
            }
            if distance < closest.0 {
                closest = (distance, current.index);
            }

            if self.max_expansions.is_some_and(|limit| expansions >= limit) {
                trace!(?start, ?goal, expansions, "expansion limit reached");
                break;
            }
            expansions += 1;

            for (dx, dy, diagonal) in NEIGHBORS {
                let next = (here.0 + dx, here.1 + dy);
                if !area.contains(next.0, next.1) {
                    continue;
                }
                let next_index = index_of(next);
                if closed[next_index] || !area.is_walkable(next.0, next.1) {
                    continue;
                }
                if area.blocker(next.0, next.1, Some(world)).is_some() {
                    continue;
                }

                let step = if diagonal {
                    self.diagonal_cost
                } else {
                    ORTHOGONAL_COST
                };
                let tentative = current.g + step;
                if tentative >= best_g[next_index] {
                    continue;
                }
                best_g[next_index] = tentative;
                parent[next_index] = Some(current.index);
                open.push(OpenNode {
                    index: next_index,
                    g: tentative,
                    f: tentative + heuristic(next),
                });
            }
        }

        trace!(?start, ?goal, closest = ?coords(closest.1), "no exact path, using closest");
        reconstruct(&parent, closest.1, coords)
    }
}

/// One-shot search with default settings and the given proximity.
pub fn find_path(
    world: &World,
    start: Position,
    target: impl Into<PathTarget>,
    proximity: u32,
) -> SimResult<Vec<(i32, i32)>> {
    Pathfinder::new()
        .with_proximity(proximity)
        .find(world, start, target)
}

fn resolve_target(world: &World, start_area: AreaId, target: PathTarget) -> SimResult<Position> {
    match target {
        PathTarget::Entity(id) => {
            let entity = world
                .lookup(id)
                .ok_or_else(|| SimError::InvalidTarget(format!("entity {id} does not exist")))?;
            entity
                .position()
                .filter(|p| p.area.is_some())
                .ok_or_else(|| SimError::InvalidTarget(format!("entity {id} is not placed")))
        }
        PathTarget::Coords(x, y) => Ok(Position::new(start_area, x, y)),
        PathTarget::Position(pos) => Ok(pos),
    }
}

/// First node with the lowest combined score, so equal scores resolve in
/// insertion order.
fn pick_best_open_node(open: &[OpenNode]) -> usize {
    let mut best = 0;
    for (i, node) in open.iter().enumerate().skip(1) {
        if node.f < open[best].f {
            best = i;
        }
    }
    best
}

fn reconstruct(
    parent: &[Option<usize>],
    end: usize,
    coords: impl Fn(usize) -> (i32, i32),
) -> Vec<(i32, i32)> {
    let mut path = Vec::new();
    let mut cursor = end;
    while let Some(prev) = parent[cursor] {
        path.push(coords(cursor));
        cursor = prev;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use rw_core::{AreaKind, Entity, EntityKind, Terrain, WorldMeta};

    const FIELD: AreaId = AreaId(1);

    fn open_world(width: u32, height: u32) -> World {
        let mut world = World::new(WorldMeta::new("Paths"));
        world
            .add_area(Area::new(
                FIELD,
                AreaKind::new("field", width, height),
                Terrain::grass(),
            ))
            .unwrap();
        world
    }

    fn place(world: &mut World, kind: EntityKind, x: i32, y: i32) -> EntityId {
        world
            .register(Entity::new(kind, "walker"), Some(Position::new(FIELD, x, y)))
            .unwrap()
    }

    fn assert_valid_route(world: &World, start: (i32, i32), path: &[(i32, i32)]) {
        let mut prev = start;
        for &step in path {
            assert_eq!(chebyshev(prev, step), 1, "{prev:?} -> {step:?} is not one move");
            assert!(world.is_walkable(FIELD, step.0, step.1));
            assert!(world.blocker(FIELD, step.0, step.1).is_none());
            prev = step;
        }
    }

    fn route_cost(start: (i32, i32), path: &[(i32, i32)], diagonal: f64) -> f64 {
        let mut prev = start;
        let mut cost = 0.0;
        for &step in path {
            cost += if prev.0 != step.0 && prev.1 != step.1 {
                diagonal
            } else {
                ORTHOGONAL_COST
            };
            prev = step;
        }
        cost
    }

    #[test]
    fn open_field_prefers_diagonal() {
        let world = open_world(5, 5);
        let path = find_path(&world, Position::new(FIELD, 0, 0), (4, 4), 0).unwrap();
        assert_eq!(path, vec![(1, 1), (2, 2), (3, 3), (4, 4)]);
    }

    #[test]
    fn expensive_diagonals_keep_route_valid() {
        let world = open_world(5, 5);
        let path = Pathfinder::new()
            .with_diagonal_cost(2.0)
            .find(&world, Position::new(FIELD, 0, 0), (4, 4))
            .unwrap();
        assert_eq!(path.last(), Some(&(4, 4)));
        assert_valid_route(&world, (0, 0), &path);
        assert!((route_cost((0, 0), &path, 2.0) - 8.0).abs() < 1e-9);
    }

    #[test]
    fn start_never_included() {
        let world = open_world(5, 5);
        let path = find_path(&world, Position::new(FIELD, 2, 2), (2, 3), 0).unwrap();
        assert_eq!(path, vec![(2, 3)]);
    }

    #[test]
    fn proximity_short_circuits() {
        let world = open_world(10, 10);
        let start = Position::new(FIELD, 1, 1);
        assert!(find_path(&world, start, (4, 3), 3).unwrap().is_empty());
        assert!(find_path(&world, start, (4, 3), 5).unwrap().is_empty());
        assert!(find_path(&world, start, (1, 1), 0).unwrap().is_empty());
    }

    #[test]
    fn stops_within_proximity_of_entity() {
        let mut world = open_world(10, 10);
        let a = place(&mut world, EntityKind::Npc, 1, 1);
        let b = place(&mut world, EntityKind::Mob, 8, 8);
        let start = world.lookup(a).unwrap().position().unwrap();

        let path = find_path(&world, start, b, 1).unwrap();
        let end = *path.last().unwrap();
        assert!(chebyshev(end, (8, 8)) <= 1);
        assert_valid_route(&world, (1, 1), &path);
    }

    #[test]
    fn walled_goal_returns_closest_open_tile() {
        let mut world = World::new(WorldMeta::new("Cell"));
        world
            .add_area(
                Area::new(FIELD, AreaKind::new("cell", 5, 5), Terrain::floor())
                    .with_border(Terrain::wall()),
            )
            .unwrap();
        let id = place(&mut world, EntityKind::Npc, 2, 2);
        let start = world.lookup(id).unwrap().position().unwrap();

        let path = find_path(&world, start, (0, 0), 0).unwrap();
        assert_eq!(path, vec![(1, 1)]);
    }

    #[test]
    fn routes_around_occupants_and_terrain() {
        let mut world = open_world(5, 3);
        // Column x=2 is water except the bottom row, which a mob occupies.
        {
            let area = world.area_mut(FIELD).unwrap();
            area.set_terrain(2, 0, Terrain::water());
            area.set_terrain(2, 1, Terrain::water());
        }
        place(&mut world, EntityKind::Mob, 2, 2);

        let path = find_path(&world, Position::new(FIELD, 0, 1), (4, 1), 0).unwrap();
        // Nothing gets through; the best effort stops against the wall.
        assert_valid_route(&world, (0, 1), &path);
        assert!(path.iter().all(|&(x, _)| x < 2));
        assert_eq!(path.last().map(|p| p.0), Some(1));
    }

    #[test]
    fn detours_when_a_gap_exists() {
        let mut world = open_world(5, 3);
        {
            let area = world.area_mut(FIELD).unwrap();
            area.set_terrain(2, 0, Terrain::wall());
            area.set_terrain(2, 1, Terrain::wall());
        }
        let path = find_path(&world, Position::new(FIELD, 0, 1), (4, 1), 0).unwrap();
        assert_eq!(path.last(), Some(&(4, 1)));
        assert!(path.contains(&(2, 2)));
        assert_valid_route(&world, (0, 1), &path);
    }

    #[test]
    fn unknown_entity_target_is_invalid() {
        let world = open_world(5, 5);
        let err = find_path(&world, Position::new(FIELD, 0, 0), EntityId(9), 0).unwrap_err();
        assert!(matches!(err, SimError::InvalidTarget(_)));
    }

    #[test]
    fn unplaced_entity_target_is_invalid() {
        let mut world = open_world(5, 5);
        let ghost = world
            .register(Entity::new(EntityKind::Npc, "ghost"), None)
            .unwrap();
        let err = find_path(&world, Position::new(FIELD, 0, 0), ghost, 0).unwrap_err();
        assert!(matches!(err, SimError::InvalidTarget(_)));
    }

    #[test]
    fn other_area_target_is_invalid() {
        let mut world = open_world(5, 5);
        world
            .add_area(Area::new(
                AreaId(2),
                AreaKind::new("elsewhere", 5, 5),
                Terrain::grass(),
            ))
            .unwrap();
        let err = find_path(
            &world,
            Position::new(FIELD, 0, 0),
            Position::new(AreaId(2), 3, 3),
            0,
        )
        .unwrap_err();
        assert!(matches!(err, SimError::InvalidTarget(_)));

        let err = find_path(&world, Position::detached(0, 0), (3, 3), 0).unwrap_err();
        assert!(matches!(err, SimError::InvalidTarget(_)));
    }

    #[test]
    fn expansion_limit_returns_partial_route() {
        let world = open_world(30, 30);
        let path = Pathfinder::new()
            .with_expansion_limit(Some(3))
            .find(&world, Position::new(FIELD, 0, 0), (29, 29))
            .unwrap();
        assert!(!path.is_empty());
        assert!(path.len() < 29);
        assert_valid_route(&world, (0, 0), &path);
    }

    #[test]
    fn expansion_limit_counts_expanded_nodes() {
        let world = open_world(30, 30);
        let limited = |limit| {
            Pathfinder::new()
                .with_expansion_limit(Some(limit))
                .find(&world, Position::new(FIELD, 0, 0), (29, 29))
                .unwrap()
        };
        assert!(limited(0).is_empty());
        // Expanding only the start still reaches its best neighbor.
        assert_eq!(limited(1), vec![(1, 1)]);
        assert_eq!(limited(2), vec![(1, 1), (2, 2)]);
    }

    #[test]
    fn search_is_deterministic() {
        let mut world = open_world(9, 9);
        world
            .area_mut(FIELD)
            .unwrap()
            .set_terrain(4, 4, Terrain::wall());
        let start = Position::new(FIELD, 0, 4);
        let first = find_path(&world, start, (8, 4), 0).unwrap();
        let second = find_path(&world, start, (8, 4), 0).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.last(), Some(&(8, 4)));
    }
}
