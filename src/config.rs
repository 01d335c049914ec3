//! Configuration and CLI argument handling

use std::path::PathBuf;

use clap::Parser;

/// `.simple-timers` under the user's home directory.
fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".simple-timers")
}

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "simple-timers")]
#[command(about = "Countdown timers and alarms with escalating warnings")]
#[command(version)]
pub struct Config {
    /// Directory holding saved timers and preferences
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Prefix for every saved key
    #[arg(long, default_value = crate::persistence::DEFAULT_NAMESPACE)]
    pub namespace: String,

    /// Default warning lead in minutes for new timers
    #[arg(short, long, value_name = "MINUTES")]
    pub min_before: Option<u64>,

    /// Start with all sound turned off
    #[arg(long)]
    pub mute: bool,

    /// Audio file to use as the buzzer
    #[arg(long, value_name = "FILE")]
    pub buzzer: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Directory for saved state: `--data-dir`, else `~/.simple-timers`.
    pub fn data_dir(&self) -> PathBuf {
        match &self.data_dir {
            Some(dir) => dir.clone(),
            None => default_data_dir(),
        }
    }

    /// File backing the key-value store.
    pub fn storage_path(&self) -> PathBuf {
        self.data_dir().join("storage.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["simple-timers"]).unwrap();
        assert_eq!(config.namespace, "simple-timers");
        assert_eq!(config.min_before, None);
        assert!(!config.mute);
        assert_eq!(config.log_level(), "info");
    }

    #[test]
    fn default_data_dir_is_under_home() {
        let config = Config::try_parse_from(["simple-timers"]).unwrap();
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        assert_eq!(config.data_dir(), home.join(".simple-timers"));
        assert_eq!(
            config.storage_path(),
            home.join(".simple-timers").join("storage.json")
        );
    }

    #[test]
    fn explicit_data_dir_holds_storage() {
        let config = Config::try_parse_from([
            "simple-timers",
            "--data-dir",
            "/tmp/timers",
            "--min-before",
            "2",
            "--mute",
            "-v",
        ])
        .unwrap();
        assert_eq!(config.storage_path(), PathBuf::from("/tmp/timers/storage.json"));
        assert_eq!(config.min_before, Some(2));
        assert!(config.mute);
        assert_eq!(config.log_level(), "debug");
    }
}
