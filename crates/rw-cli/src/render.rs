use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use rw_core::{AreaId, EntityKind, World};
use rw_simulation::Simulation;

/// Map glyph for an entity kind.
pub fn glyph(kind: EntityKind) -> char {
    match kind {
        EntityKind::Player => '@',
        EntityKind::Npc => 'n',
        EntityKind::Mob => 'm',
    }
}

/// Draw an area as plain ASCII, one line per row.
///
/// Occupants are drawn over path marks, path marks over items, and items
/// (`!`) over terrain.
pub fn render_area(world: &World, area: AreaId, path: &[(i32, i32)]) -> Option<String> {
    let area = world.area(area)?;
    let (width, height) = (area.width() as i32, area.height() as i32);
    let mut lines = Vec::with_capacity(height as usize);
    for y in 0..height {
        let line: String = (0..width)
            .map(|x| {
                let occupant = area
                    .occupants(x, y)
                    .first()
                    .and_then(|id| world.lookup(*id));
                if let Some(entity) = occupant {
                    return glyph(entity.kind);
                }
                if path.contains(&(x, y)) {
                    return '*';
                }
                match area.tile(x, y) {
                    Some(tile) if !tile.items.is_empty() => '!',
                    Some(tile) => tile.terrain.symbol,
                    None => ' ',
                }
            })
            .collect();
        lines.push(line);
    }
    Some(lines.join("\n"))
}

/// Print the map of `area` with a heading.
pub fn print_area(world: &World, area: AreaId, path: &[(i32, i32)]) {
    let Some(map) = render_area(world, area, path) else {
        return;
    };
    let name = world
        .area(area)
        .map(|a| a.kind().name.clone())
        .unwrap_or_default();
    println!("  {} {}", name.bold().underline(), format!("({area})").dimmed());
    println!();
    for line in map.lines() {
        println!("  {line}");
    }
    println!();
}

/// One row per entity, in id order.
pub fn entity_table(sim: &Simulation) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["ID", "Name", "Kind", "Position", "Time", "Script"]);

    for entity in sim.world().entities() {
        let Some(id) = entity.id() else {
            continue;
        };
        let position = entity
            .position()
            .map(|p| p.to_string())
            .unwrap_or_else(|| "unplaced".to_string());
        let script = sim
            .script(id)
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            id.to_string(),
            entity.name.clone(),
            format!("{} {}", glyph(entity.kind), entity.kind),
            position,
            entity.local_time().to_string(),
            script,
        ]);
    }
    table
}
