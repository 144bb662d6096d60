pub mod demo;
pub mod path;
pub mod run;
pub mod show;

use std::path::Path;

use rw_simulation::{SimConfig, SimSnapshot, Simulation};

/// Read and parse a snapshot file.
fn load_snapshot(file: &Path) -> Result<SimSnapshot, String> {
    let json = std::fs::read_to_string(file)
        .map_err(|e| format!("cannot read {}: {e}", file.display()))?;
    SimSnapshot::from_json(&json).map_err(|e| format!("{}: {e}", file.display()))
}

/// Load a snapshot and rebuild the simulation with its own seed.
fn load_simulation(file: &Path) -> Result<Simulation, String> {
    let snapshot = load_snapshot(file)?;
    let config = SimConfig::default().with_seed(snapshot.seed);
    Simulation::from_snapshot(snapshot, config).map_err(|e| format!("{}: {e}", file.display()))
}

fn write_snapshot(sim: &Simulation, file: &Path) -> Result<(), String> {
    let json = sim
        .snapshot()
        .and_then(|s| s.to_json())
        .map_err(|e| format!("cannot save snapshot: {e}"))?;
    std::fs::write(file, json).map_err(|e| format!("cannot write {}: {e}", file.display()))
}
