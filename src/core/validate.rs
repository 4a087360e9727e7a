use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer};

use super::types::{SimulationRequest, TaxCategory, TaxRequest};
use crate::error::{CalcError, Result};

/// Longest projection accepted, in months.
pub const MAX_TERM_MONTHS: u32 = 1200;
pub const DEFAULT_TERM_MONTHS: u32 = 12;
pub const MAX_ANNUAL_RATE_PERCENT: Decimal = dec!(1000);
/// Ceiling for the starting balance and the monthly deposit.
pub const MAX_AMOUNT: Decimal = dec!(1_000_000_000_000);
/// Largest compounding factor a projection may reach over its term. With
/// both amounts at [`MAX_AMOUNT`] and the longest term, balances stay
/// below 1.3e27, an order of magnitude under `Decimal::MAX`.
const MAX_GROWTH_FACTOR: f64 = 1e12;

const CATEGORY_TOKENS: &str =
    "fixed-income, stock-swing-trade, stock-day-trade, stock-exempt, real-estate-fund";

/// Untyped simulation parameters as they arrive from a query string, a JSON
/// body or the command line.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawSimulationParams {
    #[serde(alias = "valor_inicial", alias = "initial_balance", deserialize_with = "scalar")]
    pub initial_balance: Option<String>,
    #[serde(alias = "aportes_mensais", alias = "monthly_contribution", deserialize_with = "scalar")]
    pub monthly_contribution: Option<String>,
    #[serde(
        alias = "taxa_anual",
        alias = "annual_rate_percent",
        alias = "annualRate",
        deserialize_with = "scalar"
    )]
    pub annual_rate_percent: Option<String>,
    #[serde(alias = "prazo_meses", alias = "term_months", deserialize_with = "scalar")]
    pub term_months: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawTaxParams {
    #[serde(alias = "rendimento", alias = "gross_gain", deserialize_with = "scalar")]
    pub gross_gain: Option<String>,
    #[serde(alias = "tipo", deserialize_with = "scalar")]
    pub category: Option<String>,
    #[serde(alias = "prazo_meses", alias = "term_months", deserialize_with = "scalar")]
    pub term_months: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(serde_json::Number),
    Flag(bool),
}

fn scalar<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Scalar>::deserialize(deserializer)?;
    Ok(value.map(|v| match v {
        Scalar::Text(s) => s,
        Scalar::Number(n) => n.to_string(),
        Scalar::Flag(b) => b.to_string(),
    }))
}

pub fn simulation_request(raw: &RawSimulationParams) -> Result<SimulationRequest> {
    let initial_balance =
        bounded_amount("initialBalance", raw.initial_balance.as_deref(), MAX_AMOUNT)?;
    let monthly_contribution = bounded_amount(
        "monthlyContribution",
        raw.monthly_contribution.as_deref(),
        MAX_AMOUNT,
    )?;
    let annual_rate_percent = bounded_amount(
        "annualRatePercent",
        raw.annual_rate_percent.as_deref(),
        MAX_ANNUAL_RATE_PERCENT,
    )?;

    let term_months = match present(raw.term_months.as_deref()) {
        None => DEFAULT_TERM_MONTHS,
        Some(text) => {
            let term = parse_integer("termMonths", text)?;
            if term <= 0 {
                return Err(CalcError::validation(
                    "termMonths",
                    "term must be a positive integer",
                ));
            }
            if term > i64::from(MAX_TERM_MONTHS) {
                return Err(CalcError::validation(
                    "termMonths",
                    format!("term must be at most {MAX_TERM_MONTHS} months"),
                ));
            }
            term as u32
        }
    };
    check_growth(annual_rate_percent, term_months)?;

    Ok(SimulationRequest {
        initial_balance,
        monthly_contribution,
        annual_rate_percent,
        term_months,
    })
}

pub fn tax_request(raw: &RawTaxParams) -> Result<TaxRequest> {
    let Some(gross_text) = present(raw.gross_gain.as_deref()) else {
        return Err(CalcError::validation("grossGain", "gross gain is required"));
    };
    let gross_gain = parse_decimal("grossGain", gross_text)?;
    if gross_gain <= Decimal::ZERO {
        return Err(CalcError::validation("grossGain", "gross gain must be > 0"));
    }

    let category = match present(raw.category.as_deref()) {
        None => TaxCategory::FixedIncome,
        Some(token) => token.parse()?,
    };

    let term_months = if category == TaxCategory::FixedIncome {
        let Some(text) = present(raw.term_months.as_deref()) else {
            return Err(CalcError::validation(
                "termMonths",
                "term is required for fixed income",
            ));
        };
        let term = parse_integer("termMonths", text)?;
        if term < 0 {
            return Err(CalcError::validation("termMonths", "term must be >= 0"));
        }
        Some(u32::try_from(term).unwrap_or(u32::MAX))
    } else {
        None
    };

    Ok(TaxRequest {
        gross_gain,
        category,
        term_months,
    })
}

impl FromStr for TaxCategory {
    type Err = CalcError;

    fn from_str(token: &str) -> Result<Self> {
        let normalized = token.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "fixed_income" | "renda_fixa" => Ok(TaxCategory::FixedIncome),
            "stock_swing_trade" | "swing_trade" | "acoes" | "stocks" => {
                Ok(TaxCategory::StockSwingTrade)
            }
            "stock_day_trade" | "day_trade" => Ok(TaxCategory::StockDayTrade),
            "stock_exempt" | "stock_exempt_monthly_limit" | "isento" => {
                Ok(TaxCategory::StockExemptMonthlyLimit)
            }
            "real_estate_fund" | "fii" | "fundos_imobiliarios" => Ok(TaxCategory::RealEstateFund),
            _ => Err(CalcError::validation(
                "category",
                format!("unknown category '{}'; use one of: {CATEGORY_TOKENS}", token.trim()),
            )),
        }
    }
}

fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn bounded_amount(field: &'static str, raw: Option<&str>, max: Decimal) -> Result<Decimal> {
    let Some(text) = present(raw) else {
        return Ok(Decimal::ZERO);
    };
    let value = parse_decimal(field, text)?;
    if value < Decimal::ZERO {
        return Err(CalcError::validation(field, "must be >= 0"));
    }
    if value > max {
        return Err(CalcError::validation(field, format!("must be <= {max}")));
    }
    Ok(value)
}

/// Rejects rate and term pairs whose compounding factor alone would push a
/// maximal balance out of `Decimal` range.
fn check_growth(annual_rate_percent: Decimal, term_months: u32) -> Result<()> {
    let annual = annual_rate_percent.to_f64().unwrap_or(f64::INFINITY);
    let factor = (1.0 + annual / 100.0).powf(f64::from(term_months) / 12.0);
    if !factor.is_finite() || factor > MAX_GROWTH_FACTOR {
        return Err(CalcError::validation(
            "annualRatePercent",
            format!(
                "rate too high for a {term_months}-month term; \
                 the balance would exceed the supported range"
            ),
        ));
    }
    Ok(())
}

fn parse_decimal(field: &'static str, text: &str) -> Result<Decimal> {
    let parsed = if text.contains(['e', 'E']) {
        Decimal::from_scientific(text)
    } else {
        Decimal::from_str(text)
    };
    parsed.map_err(|_| CalcError::validation(field, format!("'{text}' is not a number")))
}

fn parse_integer(field: &'static str, text: &str) -> Result<i64> {
    text.parse::<i64>()
        .map_err(|_| CalcError::validation(field, format!("'{text}' is not a whole number of months")))
}
