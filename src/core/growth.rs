use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use tracing::debug;

use super::money::{HUNDRED, checked_add, checked_div, checked_mul, round_cents};
use super::types::{SimulationRequest, SimulationResult, SimulationSnapshot};
use crate::error::{CalcError, Result};

pub const MONTHS_PER_YEAR: u32 = 12;

/// Projects an initial balance plus end-of-month contributions under a fixed
/// annual effective rate, compounded monthly.
///
/// Iteration runs at full decimal precision; only the reported values are
/// rounded to cents.
pub fn project(request: &SimulationRequest) -> Result<SimulationResult> {
    validate_request(request)?;

    let monthly_rate = effective_monthly_rate(request.annual_rate_percent)?;
    let growth_factor = checked_add(Decimal::ONE, monthly_rate)?;

    let mut balance = request.initial_balance;
    let mut total_contributed = request.initial_balance;
    let mut snapshots = Vec::with_capacity(snapshot_count(request.term_months));

    for month in 1..=request.term_months {
        balance = checked_mul(balance, growth_factor)?;
        balance = checked_add(balance, request.monthly_contribution)?;
        total_contributed = checked_add(total_contributed, request.monthly_contribution)?;

        if month % MONTHS_PER_YEAR == 0 || month == request.term_months {
            snapshots.push(snapshot(month, balance, total_contributed));
        }
    }

    let total_gain = balance - total_contributed;
    let gain_percent = if total_contributed.is_zero() {
        Decimal::ZERO
    } else {
        checked_mul(checked_div(total_gain, total_contributed)?, HUNDRED)?
    };

    let final_balance = round_cents(balance);
    let total_contributed = round_cents(total_contributed);
    debug!(
        term_months = request.term_months,
        %final_balance,
        %total_contributed,
        "projection complete"
    );

    Ok(SimulationResult {
        final_balance,
        total_contributed,
        total_gain: final_balance - total_contributed,
        gain_percent: round_cents(gain_percent),
        monthly_rate,
        snapshots,
    })
}

/// `(1 + annual/100)^(1/12) - 1`. A zero annual rate yields exactly zero.
pub fn effective_monthly_rate(annual_rate_percent: Decimal) -> Result<Decimal> {
    if annual_rate_percent.is_zero() {
        return Ok(Decimal::ZERO);
    }

    let annual = annual_rate_percent
        .to_f64()
        .ok_or_else(|| CalcError::Internal(format!("rate {annual_rate_percent} is not representable")))?;
    let monthly = (1.0 + annual / 100.0).powf(1.0 / f64::from(MONTHS_PER_YEAR)) - 1.0;
    if !monthly.is_finite() {
        return Err(CalcError::Internal(format!(
            "monthly rate for {annual_rate_percent}% is not finite"
        )));
    }

    Decimal::from_f64(monthly)
        .ok_or_else(|| CalcError::Internal(format!("monthly rate {monthly} is not representable")))
}

/// One snapshot per completed year plus one for a trailing partial year.
pub fn snapshot_count(term_months: u32) -> usize {
    let full_years = term_months / MONTHS_PER_YEAR;
    let partial = u32::from(term_months % MONTHS_PER_YEAR != 0);
    (full_years + partial) as usize
}

fn snapshot(month: u32, balance: Decimal, total_contributed: Decimal) -> SimulationSnapshot {
    let balance = round_cents(balance);
    let total_contributed = round_cents(total_contributed);
    SimulationSnapshot {
        month,
        balance,
        total_contributed,
        gain: balance - total_contributed,
    }
}

fn validate_request(request: &SimulationRequest) -> Result<()> {
    if request.initial_balance < Decimal::ZERO {
        return Err(CalcError::validation(
            "initialBalance",
            "initial balance must be >= 0",
        ));
    }
    if request.monthly_contribution < Decimal::ZERO {
        return Err(CalcError::validation(
            "monthlyContribution",
            "monthly contribution must be >= 0",
        ));
    }
    if request.annual_rate_percent < Decimal::ZERO {
        return Err(CalcError::validation(
            "annualRatePercent",
            "annual rate must be >= 0",
        ));
    }
    if request.term_months == 0 {
        return Err(CalcError::validation(
            "termMonths",
            "term must be a positive integer",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};
    use rust_decimal_macros::dec;

    const CENT: Decimal = dec!(0.01);

    fn assert_approx_tol(actual: Decimal, expected: Decimal, tol: Decimal) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn request(initial: Decimal, monthly: Decimal, rate: Decimal, term: u32) -> SimulationRequest {
        SimulationRequest {
            initial_balance: initial,
            monthly_contribution: monthly,
            annual_rate_percent: rate,
            term_months: term,
        }
    }

    #[test]
    fn one_year_with_contributions_matches_reference_values() {
        let result = project(&request(dec!(1000), dec!(100), dec!(12), 12)).expect("valid");

        assert_approx_tol(result.monthly_rate, dec!(0.009489), dec!(0.000001));
        assert_approx_tol(result.final_balance, dec!(2384.65), CENT);
        assert_eq!(result.total_contributed, dec!(2200.00));
        assert_approx_tol(result.total_gain, dec!(184.65), CENT);
        assert_approx_tol(result.gain_percent, dec!(8.39), CENT);
        assert_eq!(result.snapshots.len(), 1);
        assert_eq!(result.snapshots[0].month, 12);
        assert_eq!(result.snapshots[0].balance, result.final_balance);
    }

    #[test]
    fn monthly_rate_uses_compound_conversion_not_division() {
        let rate = effective_monthly_rate(dec!(12)).expect("valid rate");
        let naive = dec!(0.01);
        assert!(rate < naive);
        assert_approx_tol(rate, dec!(0.0094887929), dec!(0.0000000001));
    }

    #[test]
    fn zero_rate_is_exactly_zero_monthly() {
        assert_eq!(effective_monthly_rate(Decimal::ZERO).expect("valid"), Decimal::ZERO);
    }

    #[test]
    fn snapshots_land_on_year_boundaries_and_final_month() {
        let result = project(&request(dec!(500), dec!(50), dec!(8), 30)).expect("valid");
        let months: Vec<u32> = result.snapshots.iter().map(|s| s.month).collect();
        assert_eq!(months, vec![12, 24, 30]);

        let result = project(&request(dec!(500), dec!(50), dec!(8), 24)).expect("valid");
        let months: Vec<u32> = result.snapshots.iter().map(|s| s.month).collect();
        assert_eq!(months, vec![12, 24]);

        let result = project(&request(dec!(500), dec!(50), dec!(8), 5)).expect("valid");
        let months: Vec<u32> = result.snapshots.iter().map(|s| s.month).collect();
        assert_eq!(months, vec![5]);
    }

    #[test]
    fn snapshot_gain_is_balance_minus_contributed() {
        let result = project(&request(dec!(1234.56), dec!(78.9), dec!(10.5), 40)).expect("valid");
        for snap in &result.snapshots {
            assert_eq!(snap.gain, snap.balance - snap.total_contributed);
        }
        let last = result.snapshots.last().expect("at least one snapshot");
        assert_eq!(last.month, 40);
        assert_eq!(last.balance, result.final_balance);
        assert_eq!(last.total_contributed, result.total_contributed);
    }

    #[test]
    fn all_zero_inputs_report_zero_gain_percent() {
        let result = project(&request(Decimal::ZERO, Decimal::ZERO, dec!(10), 12)).expect("valid");
        assert_eq!(result.final_balance, Decimal::ZERO);
        assert_eq!(result.total_contributed, Decimal::ZERO);
        assert_eq!(result.gain_percent, Decimal::ZERO);
    }

    #[test]
    fn rejects_negative_amounts_and_zero_term() {
        let cases = [
            (request(dec!(-1), dec!(0), dec!(0), 12), "initialBalance"),
            (request(dec!(0), dec!(-0.01), dec!(0), 12), "monthlyContribution"),
            (request(dec!(0), dec!(0), dec!(-3), 12), "annualRatePercent"),
            (request(dec!(0), dec!(0), dec!(3), 0), "termMonths"),
        ];
        for (req, expected_field) in cases {
            match project(&req) {
                Err(CalcError::Validation { field, .. }) => assert_eq!(field, expected_field),
                other => panic!("expected validation error on {expected_field}, got {other:?}"),
            }
        }
    }

    #[test]
    fn overflow_surfaces_as_internal_error() {
        let err = project(&request(Decimal::MAX, Decimal::ZERO, dec!(50), 12))
            .expect_err("must overflow");
        assert!(matches!(err, CalcError::Internal(_)));
    }

    #[test]
    fn largest_accepted_requests_project_without_overflow() {
        use crate::core::validate::{RawSimulationParams, simulation_request};

        let cap = "1000000000000".to_string();
        for (initial, monthly, rate, term) in [
            (cap.clone(), cap.clone(), "31", "1200"),
            (cap.clone(), cap.clone(), "1000", "138"),
            ("0.01".to_string(), "0".to_string(), "1000", "138"),
        ] {
            let raw = RawSimulationParams {
                initial_balance: Some(initial),
                monthly_contribution: Some(monthly),
                annual_rate_percent: Some(rate.to_string()),
                term_months: Some(term.to_string()),
            };
            let req = simulation_request(&raw).expect("within limits");
            let result = project(&req).expect("fits in Decimal");
            assert!(result.final_balance > result.total_contributed);
        }
    }

    #[test]
    fn snapshot_count_matches_boundaries() {
        assert_eq!(snapshot_count(1), 1);
        assert_eq!(snapshot_count(12), 1);
        assert_eq!(snapshot_count(13), 2);
        assert_eq!(snapshot_count(24), 2);
        assert_eq!(snapshot_count(30), 3);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_zero_rate_is_linear_accumulation(
            initial_cents in 0u64..100_000_000,
            monthly_cents in 0u64..1_000_000,
            term in 1u32..600
        ) {
            let initial = Decimal::new(initial_cents as i64, 2);
            let monthly = Decimal::new(monthly_cents as i64, 2);
            let result = project(&request(initial, monthly, Decimal::ZERO, term)).expect("valid");

            let expected = initial + monthly * Decimal::from(term);
            prop_assert_eq!(result.final_balance, expected);
            prop_assert_eq!(result.total_contributed, expected);
            prop_assert_eq!(result.total_gain, Decimal::ZERO);
        }
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_one_year_without_contributions_collapses_to_annual_rate(
            initial_cents in 1u64..100_000_000,
            rate_bp in 0u32..5_000
        ) {
            let initial = Decimal::new(initial_cents as i64, 2);
            let rate = Decimal::new(i64::from(rate_bp), 2);
            let result = project(&request(initial, Decimal::ZERO, rate, 12)).expect("valid");

            let expected = round_cents(initial * (Decimal::ONE + rate / HUNDRED));
            prop_assert!(
                (result.final_balance - expected).abs() <= CENT,
                "expected {}, got {}", expected, result.final_balance
            );
        }
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(32))]

        #[test]
        fn prop_projection_is_idempotent_and_snapshot_count_is_exact(
            initial_cents in 0u64..10_000_000,
            monthly_cents in 0u64..500_000,
            rate_bp in 0u32..3_000,
            term in 1u32..480
        ) {
            let req = request(
                Decimal::new(initial_cents as i64, 2),
                Decimal::new(monthly_cents as i64, 2),
                Decimal::new(i64::from(rate_bp), 2),
                term,
            );
            let first = project(&req).expect("valid");
            let second = project(&req).expect("valid");
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.snapshots.len(), snapshot_count(term));
            prop_assert!(first.snapshots.windows(2).all(|w| w[0].month < w[1].month));
            prop_assert!(first.final_balance >= first.total_contributed);
        }
    }
}
