use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use thiserror::Error;

use crate::core::validate::{RawSimulationParams, RawTaxParams};
use crate::core::{FixedIncomeSchedule, TaxBracket};
use crate::error::CalcError;

#[derive(Parser, Debug)]
#[command(
    name = "invest-calc",
    version,
    about = "Compound-growth projector and investment income-tax resolver"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the HTTP API
    Serve(ServeArgs),
    /// Project compound growth and print the result as JSON
    Simulate(SimulateArgs),
    /// Resolve the income tax on a gain and print the result as JSON
    Tax(TaxArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, env = "INVEST_CALC_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,
    #[arg(
        long,
        env = "INVEST_CALC_FIXED_INCOME_TABLE",
        help = "JSON file replacing the fixed-income bracket table"
    )]
    pub fixed_income_table: Option<PathBuf>,
}

impl ServeArgs {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn load_schedule(&self) -> Result<FixedIncomeSchedule, ConfigError> {
        match &self.fixed_income_table {
            Some(path) => load_schedule(path),
            None => Ok(FixedIncomeSchedule::canonical().clone()),
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct SimulateArgs {
    #[arg(long, allow_hyphen_values = true, help = "Starting balance, default 0")]
    pub initial_balance: Option<String>,
    #[arg(long, allow_hyphen_values = true, help = "Deposit at the end of each month, default 0")]
    pub monthly_contribution: Option<String>,
    #[arg(
        long,
        allow_hyphen_values = true,
        help = "Annual effective rate in percent, e.g. 12, default 0"
    )]
    pub annual_rate: Option<String>,
    #[arg(long, allow_hyphen_values = true, help = "Term in months, default 12")]
    pub term_months: Option<String>,
}

impl From<SimulateArgs> for RawSimulationParams {
    fn from(args: SimulateArgs) -> Self {
        RawSimulationParams {
            initial_balance: args.initial_balance,
            monthly_contribution: args.monthly_contribution,
            annual_rate_percent: args.annual_rate,
            term_months: args.term_months,
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct TaxArgs {
    #[arg(long, allow_hyphen_values = true)]
    pub gross_gain: Option<String>,
    #[arg(
        long,
        help = "fixed-income, stock-swing-trade, stock-day-trade, stock-exempt or real-estate-fund"
    )]
    pub category: Option<String>,
    #[arg(long, allow_hyphen_values = true, help = "Holding period; required for fixed income")]
    pub term_months: Option<String>,
}

impl From<TaxArgs> for RawTaxParams {
    fn from(args: TaxArgs) -> Self {
        RawTaxParams {
            gross_gain: args.gross_gain,
            category: args.category,
            term_months: args.term_months,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("rejected bracket table: {0}")]
    Table(#[from] CalcError),
}

pub fn load_schedule(path: &Path) -> Result<FixedIncomeSchedule, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_schedule(&text).map_err(|err| match err {
        ConfigError::Parse { source, .. } => ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })
}

pub fn parse_schedule(json: &str) -> Result<FixedIncomeSchedule, ConfigError> {
    let brackets: Vec<TaxBracket> =
        serde_json::from_str(json).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
    Ok(FixedIncomeSchedule::new(brackets)?)
}
