use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use thiserror::Error;

use crate::config::DEFAULT_CONFIG_PATH;
use crate::migration::RunMode;
use crate::runner::RunOptions;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlagError {
    #[error("Flags --apply and --debug cannot be used together")]
    ApplyDebugConflict,
    #[error("Period must be at least one day")]
    PeriodLessThanOne,
    #[error("Precision must be at least one minute")]
    PrecisionLessThanOne,
    #[error("Cannot determine the home directory")]
    HomeDirNotFound,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Moves Clockify time entries into Jira worklogs. Without --apply nothing is written.
#[derive(Debug, Parser)]
#[command(name = "clockify-to-jira", version, about)]
pub struct Cli {
    /// Create worklogs and tag the migrated time entries
    #[arg(short, long)]
    pub apply: bool,

    /// Re-inspect already migrated entries without writing anything
    #[arg(short, long)]
    pub debug: bool,

    /// Only migrate these workspaces (comma separated config keys)
    #[arg(short, long, value_delimiter = ',')]
    pub workspace: Vec<String>,

    /// Only migrate entries of these clients (comma separated)
    #[arg(short, long, value_delimiter = ',')]
    pub client: Vec<String>,

    /// Lookback window in days, overrides `global.period`
    #[arg(short, long)]
    pub period: Option<u32>,

    /// Rounding precision in minutes for every client
    #[arg(short = 't', long)]
    pub precision: Option<u32>,

    /// Configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Write a configuration template to the config path and exit
    #[arg(long)]
    pub init: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Cli {
    pub fn validate(&self) -> Result<(), FlagError> {
        if self.apply && self.debug {
            return Err(FlagError::ApplyDebugConflict);
        }

        if self.period == Some(0) {
            return Err(FlagError::PeriodLessThanOne);
        }

        if self.precision == Some(0) {
            return Err(FlagError::PrecisionLessThanOne);
        }

        Ok(())
    }

    pub fn config_path(&self) -> Result<PathBuf, FlagError> {
        expand_home(&self.config)
    }

    pub fn clients(&self) -> Vec<String> {
        self.client
            .iter()
            .map(|client| client.trim().to_lowercase())
            .filter(|client| !client.is_empty())
            .collect()
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            mode: RunMode {
                apply: self.apply,
                debug: self.debug,
            },
            clients: self.clients(),
        }
    }
}

fn expand_home(path: &str) -> Result<PathBuf, FlagError> {
    let rest = match path.strip_prefix('~') {
        Some(rest) => rest,
        None => return Ok(PathBuf::from(path)),
    };

    let home = dirs::home_dir().ok_or(FlagError::HomeDirNotFound)?;
    let rest = rest.trim_start_matches(['/', '\\']);
    if rest.is_empty() {
        Ok(home)
    } else {
        Ok(home.join(rest))
    }
}
