use std::path::Path;

use colored::Colorize;
use rw_core::EntityId;
use rw_simulation::PathTarget;

use crate::render;

pub fn run(
    file: &Path,
    from: u64,
    to: Option<(i32, i32)>,
    to_entity: Option<u64>,
    proximity: u32,
) -> Result<(), String> {
    let sim = super::load_simulation(file)?;
    let world = sim.world();

    let walker_id = EntityId(from);
    let walker = world
        .lookup(walker_id)
        .ok_or_else(|| format!("no entity with id {walker_id}"))?;
    let start = walker
        .position()
        .filter(|p| p.area.is_some())
        .ok_or_else(|| format!("{} is not placed in an area", walker.name))?;

    let target = match (to, to_entity) {
        (_, Some(id)) => PathTarget::Entity(EntityId(id)),
        (Some((x, y)), None) => PathTarget::Coords(x, y),
        (None, None) => return Err("give a target with --to or --to-entity".into()),
    };

    let path = sim
        .find_path(start, target, proximity)
        .map_err(|e| e.to_string())?;

    let goal = match target {
        PathTarget::Entity(id) => id.to_string(),
        PathTarget::Coords(x, y) => format!("({x}, {y})"),
        PathTarget::Position(p) => p.to_string(),
    };
    println!("  {} from {} to {goal}", "Path".bold(), walker.name);
    if path.is_empty() {
        println!("  {}", "already there (0 steps)".dimmed());
    } else {
        let steps: Vec<String> = path.iter().map(|(x, y)| format!("({x}, {y})")).collect();
        println!("  {} steps: {}", path.len(), steps.join(" -> "));
    }
    println!();

    if let Some(area) = start.area {
        render::print_area(world, area, &path);
    }
    Ok(())
}
