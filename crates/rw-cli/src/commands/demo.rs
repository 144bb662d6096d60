use std::path::Path;

use colored::Colorize;
use rw_core::{
    Area, AreaId, AreaKind, Entity, EntityKind, ItemRef, Position, Terrain, World, WorldMeta,
};
use rw_simulation::{Script, SimConfig, SimResult, Simulation};

const MEADOW: AreaId = AreaId(1);
const CELLAR: AreaId = AreaId(2);

pub fn run(output: Option<&Path>, seed: u64) -> Result<(), String> {
    let sim = demo_simulation(seed).map_err(|e| format!("cannot build demo: {e}"))?;
    match output {
        Some(file) => {
            super::write_snapshot(&sim, file)?;
            println!(
                "  {} demo world to {}",
                "Wrote".green().bold(),
                file.display()
            );
            println!(
                "  {}",
                format!("{} entities, seed {seed}", sim.world().entity_count()).dimmed()
            );
        }
        None => {
            let json = sim
                .snapshot()
                .and_then(|s| s.to_json())
                .map_err(|e| format!("cannot serialize demo: {e}"))?;
            println!("{json}");
        }
    }
    Ok(())
}

/// A walled meadow with a pond, a patrolling guard, an idle merchant, a
/// wandering wolf and a crow that follows the player.
fn demo_simulation(seed: u64) -> SimResult<Simulation> {
    let mut world = World::new(WorldMeta {
        description: "A walled meadow with a pond.".into(),
        ..WorldMeta::new("Rasterwelt Demo")
    });

    let mut meadow = Area::new(MEADOW, AreaKind::new("meadow", 16, 10), Terrain::grass())
        .with_border(Terrain::wall());
    for (x, y) in [(10, 5), (11, 5), (10, 6), (11, 6), (12, 6)] {
        meadow.set_terrain(x, y, Terrain::water());
    }
    for y in 1..4 {
        meadow.set_terrain(7, y, Terrain::wall());
    }
    if let Some(tile) = meadow.tile_mut(4, 7) {
        tile.items.push(ItemRef(1));
    }
    world.add_area(meadow)?;
    world.add_area(
        Area::new(CELLAR, AreaKind::new("cellar", 6, 4), Terrain::floor())
            .with_border(Terrain::wall()),
    )?;

    let mut sim = Simulation::new(world, SimConfig::default().with_seed(seed));
    let player = sim.spawn(
        Entity::player("Wanderer")
            .with_stat("hp", 20)
            .with_stat("str", 5),
        Some(Position::new(MEADOW, 2, 2)),
    )?;

    let guard = sim.spawn(
        Entity::new(EntityKind::Npc, "Guard").with_stat("hp", 15),
        Some(Position::new(MEADOW, 3, 6)),
    )?;
    let patrol = [0, 3, 6, 13, 6, 13, 2]
        .iter()
        .map(|&v| Script::Int(v))
        .collect::<Vec<_>>();
    sim.set_script(guard, Script::call("patrol", &patrol))?;

    sim.spawn(
        Entity::new(EntityKind::Npc, "Merchant"),
        Some(Position::new(MEADOW, 5, 8)),
    )?;

    let wolf = sim.spawn(
        Entity::new(EntityKind::Mob, "Wolf").with_stat("hp", 8),
        Some(Position::new(MEADOW, 12, 3)),
    )?;
    sim.set_script(wolf, Script::seq(["move".into(), "wander".into()]))?;

    let crow = sim.spawn(
        Entity::new(EntityKind::Mob, "Crow"),
        Some(Position::new(MEADOW, 14, 8)),
    )?;
    sim.set_script(
        crow,
        Script::call("follow", &[Script::Int(player.0 as i64), Script::Int(2)]),
    )?;

    sim.spawn(
        Entity::new(EntityKind::Mob, "Rat"),
        Some(Position::new(CELLAR, 2, 2)),
    )?;
    Ok(sim)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_world_is_consistent() {
        let sim = demo_simulation(42).unwrap();
        assert!(sim.world().check_index().is_ok());
        assert_eq!(sim.world().entity_count(), 6);
        assert_eq!(sim.world().current_area_id(), Some(MEADOW));
    }

    #[test]
    fn demo_snapshot_round_trips() {
        let sim = demo_simulation(7).unwrap();
        let snapshot = sim.snapshot().unwrap();
        assert_eq!(snapshot.seed, 7);
        assert_eq!(snapshot.scripts.len(), 3);
        let restored = Simulation::from_snapshot(snapshot, SimConfig::default()).unwrap();
        assert_eq!(restored.world().entity_count(), 6);
    }

    #[test]
    fn demo_runs_a_few_turns() {
        let mut sim = demo_simulation(42).unwrap();
        for _ in 0..5 {
            assert!(sim.player_wait(100).unwrap());
        }
        assert_eq!(sim.clock().time(), 500);
        assert!(sim.world().check_index().is_ok());
    }
}
