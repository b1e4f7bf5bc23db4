//! Pension portal main entry point

use clap::Parser;
use pensionweb_api::start_server;
use pensionweb_config::{Config, ConfigError};
use std::path::PathBuf;
use tokio::runtime::Runtime;

#[derive(Parser, Debug)]
#[command(name = "pensionweb")]
#[command(author = "Pensionweb Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Server-rendered portal for pensioners, affiliates, beneficiaries and company groups", long_about = None)]
struct Args {
    /// Configuration file path (defaults are used when it does not exist)
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Print the default configuration and exit
    #[arg(long)]
    print_default_config: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.print_default_config {
        println!("{}", Config::generate_default());
        return Ok(());
    }

    let mut config = Config::load_or_default(args.config.clone()).map_err(report)?;
    config.apply_env_overrides();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.logging.level.as_str())).init();
    log::info!("Config loaded from {}", args.config.display());

    config.validate().map_err(report)?;
    log::info!(
        "Backend: {}, data source mode: {}, assistant: {} ({})",
        config.backend.base_url,
        config.fallback.mode,
        config.llm.provider,
        config.llm.model
    );

    let rt = Runtime::new()?;
    rt.block_on(start_server(config))?;

    Ok(())
}

/// Print the structured details of a rejected configuration
fn report(error: ConfigError) -> ConfigError {
    eprintln!("{}", error.to_details());
    error
}
