//! Record-and-replay demo - headless run of the terminal flow
//!
//! Walks the hero to the terminal, records a seeded random run with one
//! clone, replays it as a ghost and prints a JSON report.
//!
//! Usage:
//!   cargo run --bin simulate -- --help
//!   cargo run --bin simulate -- --seed 42 --profile 2
//!   cargo run --bin simulate -- --ticks 300 -o report.json

use ghostline::simulation::{DemoConfig, run_simulation};

fn main() {
    let config = DemoConfig::from_args();
    if let Err(e) = run_simulation(config) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
