use std::sync::LazyLock;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use super::money::{HUNDRED, checked_div, checked_mul, round_cents};
use super::types::{MaxMonths, TaxBracket, TaxCategory, TaxRequest, TaxResult};
use crate::error::{CalcError, Result};

pub const DAY_TRADE_RATE: Decimal = dec!(20.0);
pub const SWING_TRADE_RATE: Decimal = dec!(15.0);

const STOCK_EXEMPTION_NOTE: &str = "Stock sales up to R$ 20,000 per month are exempt from income tax";
const DARF_NOTE: &str = "Tax is paid via DARF by the last business day of the following month";

static CANONICAL: LazyLock<FixedIncomeSchedule> = LazyLock::new(|| FixedIncomeSchedule {
    brackets: vec![
        bracket(MaxMonths::Bounded(6), dec!(22.5), "Up to 6 months"),
        bracket(MaxMonths::Bounded(12), dec!(20.0), "6 to 12 months"),
        bracket(MaxMonths::Bounded(24), dec!(17.5), "12 to 24 months"),
        bracket(MaxMonths::Unbounded, dec!(15.0), "Over 24 months"),
    ],
});

fn bracket(max_months: MaxMonths, rate_percent: Decimal, label: &str) -> TaxBracket {
    TaxBracket {
        max_months,
        rate_percent,
        label: label.to_string(),
    }
}

/// Regressive withholding table for fixed income.
///
/// Every schedule is total over non-negative holding periods and its rate
/// strictly decreases as the holding period grows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedIncomeSchedule {
    brackets: Vec<TaxBracket>,
}

impl FixedIncomeSchedule {
    pub fn new(brackets: Vec<TaxBracket>) -> Result<Self> {
        let Some(last) = brackets.last() else {
            return Err(CalcError::validation(
                "brackets",
                "table must have at least one bracket",
            ));
        };
        if last.max_months != MaxMonths::Unbounded {
            return Err(CalcError::validation(
                "brackets",
                "last bracket must be unbounded",
            ));
        }

        let mut previous: Option<&TaxBracket> = None;
        for (idx, current) in brackets.iter().enumerate() {
            if current.rate_percent < Decimal::ZERO || current.rate_percent > HUNDRED {
                return Err(CalcError::validation(
                    "brackets",
                    format!("bracket {idx} rate must be between 0 and 100"),
                ));
            }
            if current.max_months == MaxMonths::Unbounded && idx + 1 != brackets.len() {
                return Err(CalcError::validation(
                    "brackets",
                    format!("bracket {idx} is unbounded but is not the last bracket"),
                ));
            }
            if let Some(prev) = previous {
                if let (MaxMonths::Bounded(prev_max), MaxMonths::Bounded(max)) =
                    (prev.max_months, current.max_months)
                {
                    if max <= prev_max {
                        return Err(CalcError::validation(
                            "brackets",
                            format!("bracket {idx} maxMonths must exceed {prev_max}"),
                        ));
                    }
                }
                if current.rate_percent >= prev.rate_percent {
                    return Err(CalcError::validation(
                        "brackets",
                        format!(
                            "bracket {idx} rate must be lower than {}",
                            prev.rate_percent
                        ),
                    ));
                }
            }
            previous = Some(current);
        }

        Ok(Self { brackets })
    }

    pub fn canonical() -> &'static FixedIncomeSchedule {
        &CANONICAL
    }

    pub fn brackets(&self) -> &[TaxBracket] {
        &self.brackets
    }

    /// First bracket whose inclusive upper bound covers `term_months`.
    pub fn bracket_for(&self, term_months: u32) -> &TaxBracket {
        self.brackets
            .iter()
            .find(|b| b.max_months.covers(term_months))
            .unwrap_or_else(|| self.unbounded())
    }

    fn unbounded(&self) -> &TaxBracket {
        // `new` guarantees a non-empty table ending in an unbounded bracket.
        &self.brackets[self.brackets.len() - 1]
    }
}

impl Default for FixedIncomeSchedule {
    fn default() -> Self {
        CANONICAL.clone()
    }
}

/// Resolves the withholding tax using the canonical fixed-income table.
pub fn resolve(request: &TaxRequest) -> Result<TaxResult> {
    resolve_with_schedule(request, FixedIncomeSchedule::canonical())
}

pub fn resolve_with_schedule(
    request: &TaxRequest,
    schedule: &FixedIncomeSchedule,
) -> Result<TaxResult> {
    if request.gross_gain <= Decimal::ZERO {
        return Err(CalcError::validation(
            "grossGain",
            "gross gain must be > 0",
        ));
    }

    let (rate_percent, bracket_label) = match request.category {
        TaxCategory::FixedIncome => {
            let Some(term_months) = request.term_months else {
                return Err(CalcError::validation(
                    "termMonths",
                    "term is required for fixed income",
                ));
            };
            let bracket = schedule.bracket_for(term_months);
            (bracket.rate_percent, bracket.label.clone())
        }
        TaxCategory::StockDayTrade => (DAY_TRADE_RATE, "Day trade".to_string()),
        TaxCategory::StockSwingTrade => {
            (SWING_TRADE_RATE, "Swing trade (held over one day)".to_string())
        }
        TaxCategory::StockExemptMonthlyLimit => (
            Decimal::ZERO,
            "Exempt (sales up to R$ 20,000 per month)".to_string(),
        ),
        TaxCategory::RealEstateFund => (
            Decimal::ZERO,
            "Exempt from tax on capital gains".to_string(),
        ),
    };

    let tax = checked_div(checked_mul(request.gross_gain, rate_percent)?, HUNDRED)?;
    // Both outputs round from the exact tax; their sum may drift from
    // gross_gain by one cent.
    let tax_amount = round_cents(tax);
    let net_gain = round_cents(request.gross_gain - tax);
    debug!(
        category = ?request.category,
        %rate_percent,
        %tax_amount,
        "tax resolved"
    );

    Ok(TaxResult {
        rate_percent,
        bracket_label,
        tax_amount,
        net_gain,
        notes: notes_for(request.category),
    })
}

pub fn notes_for(category: TaxCategory) -> Vec<String> {
    let notes: &[&str] = match category {
        TaxCategory::FixedIncome => &[
            "Regressive income-tax table for fixed income",
            "The longer the holding period, the lower the tax",
        ],
        TaxCategory::StockSwingTrade | TaxCategory::StockDayTrade => {
            &[STOCK_EXEMPTION_NOTE, DARF_NOTE]
        }
        TaxCategory::StockExemptMonthlyLimit => &[
            STOCK_EXEMPTION_NOTE,
            DARF_NOTE,
            "Exemption is advisory: monthly sales total is not verified",
        ],
        TaxCategory::RealEstateFund => &[
            "Capital gains on real-estate fund units are exempt",
            "Dividend taxation is not computed",
        ],
    };
    notes.iter().map(|n| n.to_string()).collect()
}
