use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use invest_calc::config::{Cli, Command};
use invest_calc::core::validate::{self, RawSimulationParams, RawTaxParams};
use invest_calc::core::{project, resolve};
use invest_calc::{CalcError, api};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Command::Serve(args) => {
            let schedule = match args.load_schedule() {
                Ok(schedule) => schedule,
                Err(e) => {
                    eprintln!("Config error: {e}");
                    std::process::exit(2);
                }
            };
            if let Err(e) = api::run_http_server(args.socket_addr(), schedule).await {
                eprintln!("Server error: {e}");
                std::process::exit(1);
            }
            return;
        }
        Command::Simulate(args) => {
            let raw = RawSimulationParams::from(args);
            validate::simulation_request(&raw)
                .and_then(|request| project(&request))
                .and_then(|result| to_json(&result))
        }
        Command::Tax(args) => {
            let raw = RawTaxParams::from(args);
            validate::tax_request(&raw)
                .and_then(|request| resolve(&request))
                .and_then(|result| to_json(&result))
        }
    };

    match outcome {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(if e.is_validation() { 2 } else { 1 });
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, CalcError> {
    serde_json::to_string_pretty(value).map_err(|e| CalcError::Internal(e.to_string()))
}
