use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationRequest {
    pub initial_balance: Decimal,
    pub monthly_contribution: Decimal,
    pub annual_rate_percent: Decimal,
    pub term_months: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationSnapshot {
    pub month: u32,
    pub balance: Decimal,
    pub total_contributed: Decimal,
    pub gain: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub final_balance: Decimal,
    pub total_contributed: Decimal,
    pub total_gain: Decimal,
    pub gain_percent: Decimal,
    pub monthly_rate: Decimal,
    pub snapshots: Vec<SimulationSnapshot>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaxCategory {
    FixedIncome,
    StockSwingTrade,
    StockDayTrade,
    StockExemptMonthlyLimit,
    RealEstateFund,
}

impl TaxCategory {
    pub const ALL: [TaxCategory; 5] = [
        TaxCategory::FixedIncome,
        TaxCategory::StockSwingTrade,
        TaxCategory::StockDayTrade,
        TaxCategory::StockExemptMonthlyLimit,
        TaxCategory::RealEstateFund,
    ];
}

/// Upper bound of a bracket, inclusive.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(from = "Option<u32>", into = "Option<u32>")]
pub enum MaxMonths {
    Bounded(u32),
    Unbounded,
}

impl MaxMonths {
    pub fn covers(self, term_months: u32) -> bool {
        match self {
            MaxMonths::Bounded(max) => term_months <= max,
            MaxMonths::Unbounded => true,
        }
    }
}

impl From<Option<u32>> for MaxMonths {
    fn from(value: Option<u32>) -> Self {
        value.map_or(MaxMonths::Unbounded, MaxMonths::Bounded)
    }
}

impl From<MaxMonths> for Option<u32> {
    fn from(value: MaxMonths) -> Self {
        match value {
            MaxMonths::Bounded(max) => Some(max),
            MaxMonths::Unbounded => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxBracket {
    pub max_months: MaxMonths,
    pub rate_percent: Decimal,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxRequest {
    pub gross_gain: Decimal,
    pub category: TaxCategory,
    /// Only consulted for fixed income.
    pub term_months: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxResult {
    pub rate_percent: Decimal,
    pub bracket_label: String,
    pub tax_amount: Decimal,
    pub net_gain: Decimal,
    pub notes: Vec<String>,
}
