//! Demo run configuration

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_SCENE;

/// Configuration for a headless record-and-replay run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoConfig {
    /// RNG seed for the recorded input script
    pub seed: u64,
    /// Level to play (must have a terminal)
    pub level: String,
    /// Clone hotkey used to record (1-based)
    pub profile_key: u8,
    /// Ticks of random input to record
    pub record_ticks: u32,
    /// Ticks each random input is held before the next roll
    pub hold_ticks: u32,
    /// Gameplay tuning file; compiled defaults when None
    pub tuning_file: Option<String>,
    /// Output file path (None = stdout)
    pub output_file: Option<String>,
    /// Suppress progress output
    pub quiet: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            seed: 7,
            level: DEFAULT_SCENE.to_string(),
            profile_key: 1,
            record_ticks: 150,
            hold_ticks: 12,
            tuning_file: None,
            output_file: None,
            quiet: false,
        }
    }
}

impl DemoConfig {
    /// Load configuration from a JSON settings file
    pub fn from_file(path: &str) -> Result<Self, String> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path, e))?;
        serde_json::from_str(&contents).map_err(|e| format!("Failed to parse {}: {}", path, e))
    }

    /// Parse configuration from command line arguments
    pub fn from_args() -> Self {
        let args: Vec<String> = std::env::args().collect();
        Self::parse_args(&args[1..])
    }

    pub fn parse_args(args: &[String]) -> Self {
        let mut config = Self::default();

        // Settings file first, flags override it
        if let Some(path) = args
            .iter()
            .position(|a| a == "--settings")
            .and_then(|i| args.get(i + 1))
        {
            match Self::from_file(path) {
                Ok(loaded) => config = loaded,
                Err(e) => eprintln!("Warning: {}", e),
            }
        }

        let mut i = 0;
        while i < args.len() {
            let value = args.get(i + 1);
            match (args[i].as_str(), value) {
                ("--seed", Some(v)) => {
                    config.seed = v.parse().unwrap_or(config.seed);
                    i += 1;
                }
                ("--level", Some(v)) => {
                    config.level = v.clone();
                    i += 1;
                }
                ("--profile", Some(v)) => {
                    config.profile_key = v.parse().unwrap_or(config.profile_key);
                    i += 1;
                }
                ("--ticks", Some(v)) => {
                    config.record_ticks = v.parse().unwrap_or(config.record_ticks);
                    i += 1;
                }
                ("--hold", Some(v)) => {
                    config.hold_ticks = v.parse().unwrap_or(config.hold_ticks).max(1);
                    i += 1;
                }
                ("--tuning", Some(v)) => {
                    config.tuning_file = Some(v.clone());
                    i += 1;
                }
                ("--output", Some(v)) | ("-o", Some(v)) => {
                    config.output_file = Some(v.clone());
                    i += 1;
                }
                ("--settings", Some(_)) => i += 1,
                ("--quiet", _) | ("-q", _) => config.quiet = true,
                ("--help", _) | ("-h", _) => {
                    print_help();
                    std::process::exit(0);
                }
                (other, _) => eprintln!("Warning: ignoring argument {}", other),
            }
            i += 1;
        }

        config
    }
}

fn print_help() {
    println!(
        "ghostline - headless record and replay demo

USAGE:
    ghostline [OPTIONS]

OPTIONS:
    --seed <N>        Seed for the random input script (default 7)
    --level <NAME>    Level to play, must have a terminal (default Level1)
    --profile <K>     Clone hotkey to record with, 1-9 (default 1)
    --ticks <N>       Ticks of input to record (default 150)
    --hold <N>        Ticks each random input is held (default 12)
    --tuning <PATH>   Gameplay tuning JSON
    --settings <PATH> Load these options from a JSON file
    -o, --output <P>  Write the report here instead of stdout
    -q, --quiet       No progress output"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        let config = DemoConfig::parse_args(&args(&[
            "--seed", "42", "--profile", "3", "--ticks", "80", "--hold", "0", "-q",
        ]));
        assert_eq!(config.seed, 42);
        assert_eq!(config.profile_key, 3);
        assert_eq!(config.record_ticks, 80);
        assert_eq!(config.hold_ticks, 1);
        assert!(config.quiet);
        assert_eq!(config.level, DEFAULT_SCENE);
    }

    #[test]
    fn test_bad_values_keep_defaults() {
        let config = DemoConfig::parse_args(&args(&["--seed", "abc", "--ticks"]));
        assert_eq!(config.seed, DemoConfig::default().seed);
        assert_eq!(config.record_ticks, DemoConfig::default().record_ticks);
    }
}
