//! Backend connectivity diagnostic
//!
//! Probes the usual backend ports and paths and prints what answered.

use clap::Parser;
use pensionweb_core::diagnostics::{default_probes, probe_client, run_probe, BANNER, SUMMARY};
use std::io::Write;

#[derive(Parser, Debug)]
#[command(name = "pensionweb-diagnose")]
#[command(version = "0.1.0")]
#[command(about = "Check which backend endpoints are reachable", long_about = None)]
struct Args {
    /// Host to probe
    #[arg(long, default_value = "localhost")]
    host: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    println!("{}", BANNER);
    println!("Testing backend connectivity...\n");

    let client = match probe_client() {
        Ok(client) => client,
        Err(e) => {
            println!("❌ Could not build HTTP client: {}", e);
            return Ok(());
        }
    };
    for probe in default_probes(&args.host) {
        print!("Testing {}... ", probe.url());
        std::io::stdout().flush()?;
        let outcome = run_probe(&client, &probe).await;
        println!("{}", outcome.describe());
    }

    println!("\n{}", SUMMARY);
    Ok(())
}
