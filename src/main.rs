use std::error::Error;
use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use tracing::{error, info};

mod cli;
mod clockify;
mod config;
mod dates;
mod jira;
mod logging;
mod migration;
mod models;
mod report;
mod rounding;
mod runner;
mod summary;
#[cfg(test)]
mod testing;
mod validation;

use cli::Cli;
use clockify::ClockifyClient;
use config::Config;
use jira::JiraClient;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.log_format);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    cli.validate()?;
    let config_path = cli.config_path()?;

    if cli.init {
        config::generate_template(&config_path)?;
        info!(path = %config_path.display(), "Configuration template created");
        return Ok(());
    }

    let mut config = Config::load(&config_path)?;
    if let Some(period) = cli.period {
        config.overwrite_period(period);
    }
    if let Some(precision) = cli.precision {
        config.overwrite_precision(precision);
    }

    let workspaces = config.find_workspaces(&cli.workspace)?;
    let range = config.time_interval(Local::now());
    let options = cli.run_options();
    if !options.mode.apply {
        info!("Dry run, nothing will be written. Use --apply to migrate");
    }

    let tracker = ClockifyClient::new(config.global.clockify_token.clone())?;
    let issues = JiraClient::new()?;

    for summary in runner::run(&workspaces, range, &options, &tracker, &issues) {
        info!("\n{}", summary.render());
    }

    Ok(())
}
