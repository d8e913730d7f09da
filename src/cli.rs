// src/cli.rs
use crate::config::Config;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "site-monitor", version, about = "Check websites and email status reports")]
pub struct Cli {
    /// Configuration file (YAML, JSON or TOML)
    #[arg(short, long, default_value = "site-monitor.yaml")]
    pub config: PathBuf,

    /// Run a single cycle even if an interval is configured
    #[arg(long, conflicts_with = "interval")]
    pub once: bool,

    /// Seconds between cycles, overriding check.interval_secs
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,

    /// Print emails instead of sending them
    #[arg(long)]
    pub dry_run: bool,

    /// Print each cycle as JSON
    #[arg(long)]
    pub json: bool,

    /// Print the effective configuration as YAML and exit
    #[arg(long)]
    pub print_config: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if self.once {
            config.check.interval_secs = None;
        } else if let Some(secs) = self.interval {
            config.check.interval_secs = Some(secs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        let mut config = Config::with_sites(["https://example.com"]);
        config.check.interval_secs = Some(60);
        config
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["site-monitor"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("site-monitor.yaml"));
        assert!(!cli.once && !cli.dry_run && !cli.json);
    }

    #[test]
    fn test_once_clears_interval() {
        let cli = Cli::try_parse_from(["site-monitor", "--once", "-c", "sites.json"]).unwrap();
        let mut config = config();
        cli.apply(&mut config);
        assert_eq!(config.check.interval_secs, None);
        assert_eq!(cli.config, PathBuf::from("sites.json"));
    }

    #[test]
    fn test_interval_override() {
        let cli = Cli::try_parse_from(["site-monitor", "--interval", "5"]).unwrap();
        let mut config = config();
        cli.apply(&mut config);
        assert_eq!(config.check.interval_secs, Some(5));
    }

    #[test]
    fn test_once_conflicts_with_interval() {
        assert!(Cli::try_parse_from(["site-monitor", "--once", "--interval", "5"]).is_err());
    }
}
