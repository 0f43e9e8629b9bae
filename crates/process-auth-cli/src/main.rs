//! Process authorization command line tool.

use std::process::ExitCode;

use clap::Parser;
use helios_process_auth_cli::{CliConfig, init_logging, run};
use tracing::debug;

fn main() -> anyhow::Result<ExitCode> {
    let config = CliConfig::parse();
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        return Ok(ExitCode::FAILURE);
    }

    debug!(command = ?config.command, output = ?config.output, "Starting process-auth");

    let mut stdout = std::io::stdout().lock();
    if run(&config, &mut stdout)? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
