//! Headless simulation - drive the game without rendering
//!
//! Provides the headless app builder used by the scenario harness and a
//! seeded record-and-replay demo that reports how well ghosts track
//! their recordings.

pub mod app_builder;
pub mod config;
pub mod report;
pub mod runner;

pub use app_builder::{HeadlessAppBuilder, step_fixed};
pub use config::DemoConfig;
pub use report::DemoReport;
pub use runner::{run_demo, run_demo_with, run_simulation};
