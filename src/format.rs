//! Display strings for API responses. Computation never goes through here.

use rust_decimal::Decimal;

use crate::core::round_cents;

/// Brazilian real in pt-BR notation, e.g. `R$ 1.234,56`.
pub fn brl(value: Decimal) -> String {
    let rounded = round_cents(value);
    let sign = if rounded < Decimal::ZERO { "-" } else { "" };
    let text = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    format!("{sign}R$ {},{frac_part}", group_thousands(int_part))
}

/// Percentage with a decimal comma and no trailing zeros, e.g. `22,5%`.
pub fn percent(value: Decimal) -> String {
    let text = round_cents(value).normalize().to_string();
    format!("{}%", text.replace('.', ","))
}

pub fn term_label(term_months: u32) -> String {
    let years = term_months / 12;
    let months = term_months % 12;
    format!(
        "{term_months} {} ({years} {} and {months} {})",
        plural(term_months, "month", "months"),
        plural(years, "year", "years"),
        plural(months, "month", "months"),
    )
}

/// Label for a snapshot month: `Year 2`, `Year 2 (6 months)` or `5 months`.
pub fn period_label(month: u32) -> String {
    let years = month / 12;
    let months = month % 12;
    match (years, months) {
        (0, m) => format!("{m} {}", plural(m, "month", "months")),
        (y, 0) => format!("Year {y}"),
        (y, m) => format!("Year {y} ({m} {})", plural(m, "month", "months")),
    }
}

pub fn holding_period(term_months: Option<u32>) -> String {
    match term_months {
        Some(m) if m > 0 => format!("{m} {}", plural(m, "month", "months")),
        _ => "N/A".to_string(),
    }
}

fn plural(n: u32, one: &'static str, many: &'static str) -> &'static str {
    if n == 1 { one } else { many }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}
