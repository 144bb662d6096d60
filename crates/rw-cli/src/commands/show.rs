use std::path::Path;

use colored::Colorize;

use crate::render;

pub fn run(file: &Path) -> Result<(), String> {
    let sim = super::load_simulation(file)?;
    let world = sim.world();

    println!(
        "  {} {}",
        world.meta.name.bold(),
        format!("(time {}, {} steps)", sim.clock().time(), sim.clock().steps()).dimmed()
    );
    if !world.meta.description.is_empty() {
        println!("  {}", world.meta.description);
    }
    println!();

    match world.current_area_id() {
        Some(area) => render::print_area(world, area, &[]),
        None => println!("  {}\n", "(the player is not placed in any area)".dimmed()),
    }

    println!("  {}", "Entities".bold().underline());
    println!();
    println!("{}", render::entity_table(&sim));
    Ok(())
}
