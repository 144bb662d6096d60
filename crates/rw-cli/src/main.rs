//! Command-line front end for Rasterwelt.

mod commands;
mod render;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "rw",
    about = "Rasterwelt: a turn-based grid world simulator",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a small demo scenario as a snapshot
    Demo {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Seed stored in the snapshot
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Render the player's area and list all entities
    Show {
        /// Snapshot file
        file: PathBuf,
    },

    /// Let the player wait for a number of turns and watch the world react
    Run {
        /// Snapshot file
        file: PathBuf,

        /// Number of turns to run
        #[arg(short, long, default_value = "10")]
        turns: u32,

        /// Time the player spends per turn
        #[arg(short, long, default_value = "100")]
        step: u64,

        /// RNG seed (default: the snapshot's or the config's)
        #[arg(long)]
        seed: Option<u64>,

        /// JSON file with simulation settings
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print every event
        #[arg(short, long)]
        verbose: bool,

        /// Write the resulting snapshot here
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Find a path for an entity and draw it on the map
    Path {
        /// Snapshot file
        file: PathBuf,

        /// Id of the entity that walks
        #[arg(long)]
        from: u64,

        /// Target coordinates as `x,y`
        #[arg(long, value_parser = parse_coords, required_unless_present = "to_entity")]
        to: Option<(i32, i32)>,

        /// Target entity id
        #[arg(long, conflicts_with = "to")]
        to_entity: Option<u64>,

        /// Stop once this close to the target
        #[arg(short, long, default_value = "0")]
        proximity: u32,
    },
}

fn parse_coords(s: &str) -> Result<(i32, i32), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but got \"{s}\""))?;
    let x = x.trim().parse().map_err(|e| format!("bad x: {e}"))?;
    let y = y.trim().parse().map_err(|e| format!("bad y: {e}"))?;
    Ok((x, y))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Demo { output, seed } => commands::demo::run(output.as_deref(), seed),
        Commands::Show { file } => commands::show::run(&file),
        Commands::Run {
            file,
            turns,
            step,
            seed,
            config,
            verbose,
            save,
        } => commands::run::run(&commands::run::RunArgs {
            file,
            turns,
            step,
            seed,
            config,
            verbose,
            save,
        }),
        Commands::Path {
            file,
            from,
            to,
            to_entity,
            proximity,
        } => commands::path::run(&file, from, to, to_entity, proximity),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
