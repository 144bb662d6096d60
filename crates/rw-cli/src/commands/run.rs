use std::path::PathBuf;

use colored::Colorize;
use rw_simulation::{ExplorationSystem, SimConfig, SimEventKind, Simulation};

use crate::render;

pub struct RunArgs {
    pub file: PathBuf,
    pub turns: u32,
    pub step: u64,
    pub seed: Option<u64>,
    pub config: Option<PathBuf>,
    pub verbose: bool,
    pub save: Option<PathBuf>,
}

pub fn run(args: &RunArgs) -> Result<(), String> {
    if args.step == 0 {
        return Err("--step must be greater than zero".into());
    }
    let snapshot = super::load_snapshot(&args.file)?;

    let mut config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
            SimConfig::from_json(&json).map_err(|e| format!("{}: {e}", path.display()))?
        }
        None => SimConfig::default().with_seed(snapshot.seed),
    };
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    let seed = config.seed;

    let mut sim = Simulation::from_snapshot(snapshot, config).map_err(|e| e.to_string())?;
    sim.add_system(ExplorationSystem::new());

    let start = sim.clock().time();
    for turn in 1..=args.turns {
        let before = sim.events().len();
        sim.player_wait(args.step)
            .map_err(|e| format!("turn {turn} failed: {e}"))?;
        if args.verbose {
            for event in &sim.events().events()[before.min(sim.events().len())..] {
                let time = format!("[t {:>5}]", event.time).dimmed();
                println!("  {time} {}", colorize_event(&event.kind, &event.description));
            }
        }
    }
    if args.verbose {
        println!();
    }

    let events = sim.events().events();
    let count = |pred: fn(&SimEventKind) -> bool| events.iter().filter(|e| pred(&e.kind)).count();
    let moves = count(|k| matches!(k, SimEventKind::Moved { .. }));
    let encounters = count(|k| matches!(k, SimEventKind::Encounter { .. }));
    let failures = count(|k| matches!(k, SimEventKind::ScriptFailed { .. }));

    println!(
        "  {} '{}' {}",
        "Simulation".bold(),
        sim.world().meta.name,
        format!("({} turns of {}, seed={seed})", args.turns, args.step).dimmed()
    );
    println!(
        "  time {} -> {}, {} events logged",
        start,
        sim.clock().time(),
        events.len()
    );
    println!("  {moves} moves, {encounters} encounters, {failures} script failures");
    println!();

    if !args.verbose {
        let notable: Vec<_> = events
            .iter()
            .filter(|e| {
                matches!(
                    e.kind,
                    SimEventKind::Encounter { .. } | SimEventKind::ScriptFailed { .. }
                )
            })
            .collect();
        if !notable.is_empty() {
            println!("  {}", "Notable Events".bold().underline());
            for event in notable {
                let label = match event.kind {
                    SimEventKind::ScriptFailed { .. } => "FAIL".red().bold(),
                    _ => "MEET".yellow().bold(),
                };
                println!("  {label}  {}", event.description);
            }
            println!();
        }
    }

    if let Some(area) = sim.world().current_area_id() {
        render::print_area(sim.world(), area, &[]);
    }
    println!("{}", render::entity_table(&sim));

    if let Some(out) = &args.save {
        super::write_snapshot(&sim, out)?;
        println!();
        println!("  {} {}", "Saved".green().bold(), out.display());
    }
    Ok(())
}

fn colorize_event(kind: &SimEventKind, description: &str) -> colored::ColoredString {
    match kind {
        SimEventKind::Moved { .. } => description.blue(),
        SimEventKind::Acted { .. } => description.normal(),
        SimEventKind::ScriptFailed { .. } => description.red().bold(),
        SimEventKind::Encounter { .. } => description.yellow(),
        SimEventKind::Registered { .. } | SimEventKind::Deregistered { .. } => {
            description.green()
        }
        SimEventKind::Custom { .. } => description.cyan(),
    }
}
