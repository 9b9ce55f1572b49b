use anyhow::Result;
use clap::Parser;
use lineage::cli::Cli;
use lineage::output;
use log::info;
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    env_logger::init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting lineage - fetch artifact dependency checker");
    let valid = cli.execute()?;

    Ok(if valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
