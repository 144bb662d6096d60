//! Built-in behaviors.
//!
//! Every behavior spends exactly one action and returns the script for the
//! entity's next action. Stateless behaviors hand back their own script;
//! `patrol` threads its waypoint index through the returned value.

use rand::Rng;
use rw_core::{EntityId, chebyshev};
use tracing::trace;

use crate::context::SimContext;
use crate::error::{SimError, SimResult};
use crate::pathfind::{PathTarget, Pathfinder};
use crate::script::{Script, ScriptEngine};

/// King-move offsets used when wandering.
const DIRECTIONS: [(i32, i32); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

pub(crate) fn register_builtins(engine: &mut ScriptEngine) {
    engine.register("wait", wait);
    engine.register("move", step);
    engine.register("goto", goto);
    engine.register("follow", follow);
    engine.register("patrol", patrol);
}

/// `["wait"]`: do nothing for one action.
pub fn wait(ctx: &mut SimContext<'_>, args: &[Script]) -> SimResult<Script> {
    ctx.spend_action()?;
    Ok(Script::call("wait", args))
}

/// `["move", "wander"]` or `["move", dx, dy]`.
///
/// Wandering picks a random open neighbor and stays put when there is none.
/// A fixed offset is attempted as given and silently fails when blocked.
pub fn step(ctx: &mut SimContext<'_>, args: &[Script]) -> SimResult<Script> {
    let (x, y) = ctx.actor_position()?.coords();
    match args {
        [Script::Name(mode)] if mode == "wander" => {
            let area = ctx.actor_position()?.area;
            let open: Vec<(i32, i32)> = DIRECTIONS
                .iter()
                .map(|(dx, dy)| (x + dx, y + dy))
                .filter(|&(nx, ny)| {
                    area.is_some_and(|a| ctx.world.blocker(a, nx, ny).is_none())
                })
                .collect();
            if !open.is_empty() {
                let (nx, ny) = open[ctx.rng.random_range(0..open.len())];
                ctx.step_actor_to(nx, ny)?;
            }
        }
        [dx, dy] => {
            let dx = coord_arg(dx, "move dx")?;
            let dy = coord_arg(dy, "move dy")?;
            ctx.step_actor_to(x + dx, y + dy)?;
        }
        _ => {
            return Err(SimError::InvalidScript(format!(
                "move expects \"wander\" or two offsets, got {}",
                Script::seq(args.iter().cloned())
            )));
        }
    }
    ctx.spend_action()?;
    Ok(Script::call("move", args))
}

/// `["goto", x, y, radius?]`: one path step toward a coordinate.
///
/// Returns itself until the actor is within `radius` (default 0), then
/// settles into `["wait"]`.
pub fn goto(ctx: &mut SimContext<'_>, args: &[Script]) -> SimResult<Script> {
    let (tx, ty, radius) = match args {
        [x, y] => (coord_arg(x, "goto x")?, coord_arg(y, "goto y")?, 0),
        [x, y, r] => (
            coord_arg(x, "goto x")?,
            coord_arg(y, "goto y")?,
            radius_arg(r, "goto radius")?,
        ),
        _ => {
            return Err(SimError::InvalidScript(
                "goto expects x, y and an optional radius".into(),
            ));
        }
    };

    let here = ctx.actor_position()?;
    if chebyshev(here.coords(), (tx, ty)) <= radius {
        ctx.spend_action()?;
        return Ok(Script::call("wait", &[]));
    }
    step_along_path(ctx, (tx, ty).into(), radius)?;
    ctx.spend_action()?;

    let arrived = chebyshev(ctx.actor_position()?.coords(), (tx, ty)) <= radius;
    if arrived {
        Ok(Script::call("wait", &[]))
    } else {
        Ok(Script::call("goto", args))
    }
}

/// `["follow", id, radius?]`: one path step toward another entity.
///
/// Keeps following forever; within `radius` (default 1) it just waits.
pub fn follow(ctx: &mut SimContext<'_>, args: &[Script]) -> SimResult<Script> {
    let (id, radius) = match args {
        [id] => (entity_arg(id)?, 1),
        [id, r] => (entity_arg(id)?, radius_arg(r, "follow radius")?),
        _ => {
            return Err(SimError::InvalidScript(
                "follow expects an entity id and an optional radius".into(),
            ));
        }
    };
    step_along_path(ctx, PathTarget::Entity(id), radius)?;
    ctx.spend_action()?;
    Ok(Script::call("follow", args))
}

/// `["patrol", index, x0, y0, x1, y1, ...]`: walk a waypoint loop.
///
/// `index` is the waypoint currently headed for. Reaching it advances the
/// index, which is written into the returned script.
pub fn patrol(ctx: &mut SimContext<'_>, args: &[Script]) -> SimResult<Script> {
    let Some((index, coords)) = args.split_first() else {
        return Err(SimError::InvalidScript(
            "patrol needs a waypoint index".into(),
        ));
    };
    if coords.is_empty() || coords.len() % 2 != 0 {
        return Err(SimError::InvalidScript(
            "patrol needs one or more x, y waypoint pairs".into(),
        ));
    }
    let waypoints = coords
        .chunks(2)
        .map(|pair| {
            Ok((
                coord_arg(&pair[0], "patrol x")?,
                coord_arg(&pair[1], "patrol y")?,
            ))
        })
        .collect::<SimResult<Vec<_>>>()?;

    let raw = index.as_int().ok_or_else(|| {
        SimError::InvalidScript(format!("patrol index must be an integer, got {index}"))
    })?;
    let mut current = usize::try_from(raw).unwrap_or(0) % waypoints.len();

    let here = ctx.actor_position()?.coords();
    if here == waypoints[current] {
        current = (current + 1) % waypoints.len();
    }
    step_along_path(ctx, waypoints[current].into(), 0)?;
    ctx.spend_action()?;

    if ctx.actor_position()?.coords() == waypoints[current] {
        current = (current + 1) % waypoints.len();
    }

    let mut next = Vec::with_capacity(args.len());
    next.push(Script::Int(current as i64));
    next.extend_from_slice(coords);
    Ok(Script::call("patrol", &next))
}

/// Take the first step of a route toward `target`. Returns whether the
/// actor moved.
fn step_along_path(
    ctx: &mut SimContext<'_>,
    target: PathTarget,
    radius: u32,
) -> SimResult<bool> {
    let start = ctx.actor_position()?;
    let path = Pathfinder::new()
        .with_proximity(radius)
        .with_expansion_limit(ctx.config.max_path_expansions)
        .find(&*ctx.world, start, target)?;
    match path.first() {
        Some(&(x, y)) => ctx.step_actor_to(x, y),
        None => {
            trace!(?target, "no step toward target");
            Ok(false)
        }
    }
}

fn coord_arg(arg: &Script, what: &str) -> SimResult<i32> {
    arg.as_int()
        .and_then(|v| i32::try_from(v).ok())
        .ok_or_else(|| {
            SimError::InvalidScript(format!("{what} must be a coordinate, got {arg}"))
        })
}

fn radius_arg(arg: &Script, what: &str) -> SimResult<u32> {
    arg.as_int()
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| {
            SimError::InvalidScript(format!("{what} must be a non-negative integer, got {arg}"))
        })
}

fn entity_arg(arg: &Script) -> SimResult<EntityId> {
    arg.as_int()
        .and_then(|v| u64::try_from(v).ok())
        .map(EntityId)
        .ok_or_else(|| SimError::InvalidScript(format!("expected an entity id, got {arg}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FIELD, Harness};
    use rw_core::{EntityKind, Terrain};

    fn run(h: &mut Harness, script: &Script) -> SimResult<Script> {
        ScriptEngine::with_builtins().run_value(&mut h.ctx(), script)
    }

    fn ints(name: &str, values: &[i64]) -> Script {
        let args: Vec<Script> = values.iter().map(|&v| Script::Int(v)).collect();
        Script::call(name, &args)
    }

    #[test]
    fn wait_spends_one_action() {
        let mut h = Harness::with_mob_at(3, 3);
        let out = run(&mut h, &Script::call("wait", &[])).unwrap();
        assert_eq!(out, Script::call("wait", &[]));
        assert_eq!(h.actor().local_time(), 100);
        assert_eq!(h.actor().coords(), Some((3, 3)));
    }

    #[test]
    fn fixed_move_steps_by_offset() {
        let mut h = Harness::with_mob_at(3, 3);
        let script = ints("move", &[1, -1]);
        let out = run(&mut h, &script).unwrap();
        assert_eq!(out, script);
        assert_eq!(h.actor().coords(), Some((4, 2)));
        assert_eq!(h.events.len(), 1);
    }

    #[test]
    fn fixed_move_into_wall_stays_put() {
        let mut h = Harness::with_mob_at(3, 3);
        h.world
            .area_mut(FIELD)
            .unwrap()
            .set_terrain(4, 3, Terrain::wall());
        run(&mut h, &ints("move", &[1, 0])).unwrap();
        assert_eq!(h.actor().coords(), Some((3, 3)));
        assert_eq!(h.actor().local_time(), 100);
        assert!(h.events.is_empty());
    }

    #[test]
    fn move_off_the_edge_stays_put() {
        let mut h = Harness::with_mob_at(0, 0);
        run(&mut h, &ints("move", &[-1, 0])).unwrap();
        assert_eq!(h.actor().coords(), Some((0, 0)));
    }

    #[test]
    fn wander_moves_one_tile() {
        let mut h = Harness::with_mob_at(5, 5);
        run(&mut h, &Script::seq(["move".into(), "wander".into()])).unwrap();
        let now = h.actor().coords().unwrap();
        assert_eq!(chebyshev(now, (5, 5)), 1);
    }

    #[test]
    fn boxed_in_wanderer_waits() {
        let mut h = Harness::with_mob_at(0, 0);
        h.place(EntityKind::Npc, 1, 0);
        h.place(EntityKind::Npc, 0, 1);
        h.place(EntityKind::Npc, 1, 1);
        run(&mut h, &Script::seq(["move".into(), "wander".into()])).unwrap();
        assert_eq!(h.actor().coords(), Some((0, 0)));
        assert_eq!(h.actor().local_time(), 100);
    }

    #[test]
    fn bad_move_arguments_are_invalid() {
        let mut h = Harness::with_mob_at(3, 3);
        let err = run(&mut h, &Script::call("move", &["north".into()])).unwrap_err();
        assert!(matches!(err, SimError::InvalidScript(_)));
        let err = run(&mut h, &Script::call("move", &["x".into(), "y".into()])).unwrap_err();
        assert!(matches!(err, SimError::InvalidScript(_)));
    }

    #[test]
    fn goto_walks_then_waits() {
        let mut h = Harness::with_mob_at(0, 0);
        let mut script = ints("goto", &[3, 0]);
        for _ in 0..2 {
            script = run(&mut h, &script).unwrap();
            assert_eq!(script, ints("goto", &[3, 0]));
        }
        script = run(&mut h, &script).unwrap();
        assert_eq!(script, Script::call("wait", &[]));
        assert_eq!(h.actor().coords(), Some((3, 0)));
        assert_eq!(h.actor().local_time(), 300);
    }

    #[test]
    fn goto_with_radius_stops_short() {
        let mut h = Harness::with_mob_at(0, 0);
        let out = run(&mut h, &ints("goto", &[2, 0, 1])).unwrap();
        assert_eq!(out, Script::call("wait", &[]));
        assert_eq!(h.actor().coords(), Some((1, 0)));
    }

    #[test]
    fn follow_closes_in_on_target() {
        let mut h = Harness::with_mob_at(0, 0);
        let target = h.place(EntityKind::Npc, 5, 0);
        let script = ints("follow", &[target.0 as i64]);
        let mut current = script.clone();
        for _ in 0..6 {
            current = run(&mut h, &current).unwrap();
            assert_eq!(current, script);
        }
        assert_eq!(h.actor().coords(), Some((4, 0)));
    }

    #[test]
    fn follow_missing_entity_is_invalid_target() {
        let mut h = Harness::with_mob_at(0, 0);
        let err = run(&mut h, &ints("follow", &[99])).unwrap_err();
        assert!(matches!(err, SimError::InvalidTarget(_)));
    }

    #[test]
    fn patrol_advances_index_at_waypoints() {
        let mut h = Harness::with_mob_at(0, 0);
        let mut script = ints("patrol", &[0, 1, 0, 1, 1]);
        script = run(&mut h, &script).unwrap();
        assert_eq!(h.actor().coords(), Some((1, 0)));
        assert_eq!(script, ints("patrol", &[1, 1, 0, 1, 1]));
        script = run(&mut h, &script).unwrap();
        assert_eq!(h.actor().coords(), Some((1, 1)));
        assert_eq!(script, ints("patrol", &[0, 1, 0, 1, 1]));
    }

    #[test]
    fn patrol_rejects_odd_waypoints() {
        let mut h = Harness::with_mob_at(0, 0);
        let err = run(&mut h, &ints("patrol", &[0, 1])).unwrap_err();
        assert!(matches!(err, SimError::InvalidScript(_)));
    }
}
