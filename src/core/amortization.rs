use tracing::{debug, warn};

use super::types::{LoanParameters, PaymentType, PeriodRow, Schedule};

/// Fixed payment that fully amortizes `principal` over `periods` at
/// `periodic_rate`. Returns `f64::NAN` when `periods <= 0`; callers must check
/// `is_nan()` before using the result.
pub fn periodic_payment(principal: f64, periodic_rate: f64, periods: i64) -> f64 {
    if periods <= 0 {
        return f64::NAN;
    }
    let n = periods as f64;
    if periodic_rate == 0.0 {
        return principal / n;
    }

    let growth = (1.0 + periodic_rate).powf(n);
    principal * periodic_rate * growth / (growth - 1.0)
}

/// Period-by-period balance walk. Ends after `periods` rows or as soon as the
/// balance reaches zero, whichever comes first.
#[derive(Debug, Clone)]
pub struct AmortizationWalk {
    balance: f64,
    payment: f64,
    periodic_rate: f64,
    offset_balance: f64,
    payment_type: PaymentType,
    periods: u32,
    period: u32,
}

impl AmortizationWalk {
    pub fn new(principal: f64, payment: f64, periodic_rate: f64, periods: u32) -> Self {
        Self {
            balance: principal.max(0.0),
            payment,
            periodic_rate,
            offset_balance: 0.0,
            payment_type: PaymentType::Repayment,
            periods,
            period: 0,
        }
    }

    pub fn with_offset(mut self, offset_balance: f64) -> Self {
        self.offset_balance = offset_balance.max(0.0);
        self
    }

    pub fn with_payment_type(mut self, payment_type: PaymentType) -> Self {
        self.payment_type = payment_type;
        self
    }

    /// Drives the walk to completion and returns the outstanding balance.
    pub fn remaining_balance(mut self) -> f64 {
        for _ in self.by_ref() {}
        self.balance
    }
}

impl Iterator for AmortizationWalk {
    type Item = PeriodRow;

    fn next(&mut self) -> Option<PeriodRow> {
        if self.period >= self.periods || self.balance <= 0.0 {
            return None;
        }
        self.period += 1;

        let effective_principal = (self.balance - self.offset_balance).max(0.0);
        let interest = effective_principal * self.periodic_rate;
        let principal_paid = match self.payment_type {
            PaymentType::InterestOnly => 0.0,
            // The final period absorbs any overshoot.
            PaymentType::Repayment => (self.payment - interest).max(0.0).min(self.balance),
        };
        let balance = (self.balance - principal_paid).max(0.0);
        self.balance = balance;

        Some(PeriodRow {
            period: self.period,
            payment: self.payment,
            interest,
            principal_paid,
            balance,
            effective_principal,
        })
    }
}

/// Longest loan term or horizon, in years, the calculators will walk.
pub const MAX_TERM_YEARS: f64 = 100.0;

/// Terms longer than `MAX_TERM_YEARS`, infinite ones included, are capped, so a
/// weekly schedule tops out at 5,200 rows.
pub fn build_schedule(params: &LoanParameters) -> Schedule {
    let principal = params.principal.max(0.0);
    let annual_rate_pct = params.annual_rate_pct.max(0.0);
    let years = params.years.max(0.0).min(MAX_TERM_YEARS);
    let offset_balance = params.offset_balance.max(0.0);

    let periods_per_year = params.frequency.periods_per_year();
    let periodic_rate = annual_rate_pct / 100.0 / f64::from(periods_per_year);
    let period_count = (years * f64::from(periods_per_year)).round() as u32;

    let payment = match params.payment_type {
        // Quoted on the full principal; the offset only reduces interest charged.
        PaymentType::InterestOnly => principal * periodic_rate,
        PaymentType::Repayment => periodic_payment(principal, periodic_rate, i64::from(period_count)),
    };
    if payment.is_nan() {
        warn!(
            years,
            frequency = %params.frequency,
            "loan term resolves to zero periods; schedule is empty"
        );
    }

    let rows: Vec<PeriodRow> =
        AmortizationWalk::new(principal, payment, periodic_rate, period_count)
            .with_offset(offset_balance)
            .with_payment_type(params.payment_type)
            .collect();

    let total_interest = rows.iter().map(|row| row.interest).sum();
    let total_paid = rows
        .iter()
        .map(|row| row.interest + row.principal_paid)
        .sum();

    debug!(
        period_count,
        rows = rows.len(),
        payment,
        offset_balance,
        "built amortization schedule"
    );

    Schedule {
        payment,
        periodic_rate,
        period_count,
        total_interest,
        total_paid,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::PaymentFrequency;
    use proptest::prelude::{any, prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn sample_loan() -> LoanParameters {
        LoanParameters {
            principal: 300_000.0,
            annual_rate_pct: 5.0,
            years: 25.0,
            frequency: PaymentFrequency::Monthly,
            payment_type: PaymentType::Repayment,
            offset_balance: 0.0,
        }
    }

    #[test]
    fn periodic_payment_matches_annuity_formula() {
        let payment = periodic_payment(300_000.0, 0.05 / 12.0, 300);
        assert_approx_tol(payment, 1_753.77, 0.01);
    }

    #[test]
    fn periodic_payment_zero_rate_is_straight_line() {
        assert_approx(periodic_payment(12_000.0, 0.0, 24), 500.0);
    }

    #[test]
    fn periodic_payment_non_positive_term_is_nan() {
        assert!(periodic_payment(100_000.0, 0.01, 0).is_nan());
        assert!(periodic_payment(100_000.0, 0.01, -3).is_nan());
    }

    #[test]
    fn repayment_schedule_runs_full_term_and_clears_balance() {
        let schedule = build_schedule(&sample_loan());
        assert_eq!(schedule.period_count, 300);
        assert_eq!(schedule.rows.len(), 300);
        assert_approx_tol(schedule.payment, 1_753.77, 0.01);
        assert_approx_tol(schedule.rows[0].interest, 1_250.0, 1e-9);

        let last = schedule.rows.last().expect("rows");
        assert_eq!(last.period, 300);
        assert_approx_tol(last.balance, 0.0, 1e-4);
        assert_approx_tol(schedule.total_paid, schedule.payment * 300.0, 1e-3);
    }

    #[test]
    fn offset_reduces_first_period_interest_by_offset_times_rate() {
        let base = build_schedule(&sample_loan());
        let mut loan = sample_loan();
        loan.offset_balance = 50_000.0;
        let offset = build_schedule(&loan);

        let delta = base.rows[0].interest - offset.rows[0].interest;
        assert_approx(delta, 50_000.0 * (0.05 / 12.0));
        assert_approx_tol(delta, 208.33, 0.01);
        assert_approx(offset.payment, base.payment);
        assert!(offset.rows.len() < base.rows.len());
    }

    #[test]
    fn full_offset_charges_no_interest_and_shortens_schedule() {
        let loan = LoanParameters {
            principal: 100_000.0,
            annual_rate_pct: 6.0,
            years: 10.0,
            frequency: PaymentFrequency::Monthly,
            payment_type: PaymentType::Repayment,
            offset_balance: 200_000.0,
        };
        let schedule = build_schedule(&loan);
        assert!(schedule.rows.len() >= 24);
        for row in schedule.rows.iter().take(24) {
            assert_eq!(row.interest, 0.0);
            assert_eq!(row.effective_principal, 0.0);
            assert!(row.principal_paid > 0.0);
        }
        assert!(schedule.rows.len() < schedule.period_count as usize);
        assert_eq!(schedule.rows.last().expect("rows").balance, 0.0);
        assert_eq!(schedule.total_interest, 0.0);
    }

    #[test]
    fn interest_only_payment_uses_full_principal_and_keeps_balance() {
        let mut loan = sample_loan();
        loan.payment_type = PaymentType::InterestOnly;
        loan.offset_balance = 100_000.0;
        let schedule = build_schedule(&loan);

        assert_approx(schedule.payment, 1_250.0);
        assert_eq!(schedule.rows.len(), 300);
        for row in &schedule.rows {
            assert_eq!(row.principal_paid, 0.0);
            assert_eq!(row.balance, 300_000.0);
            assert_approx(row.effective_principal, 200_000.0);
            assert_approx(row.interest, 200_000.0 * 0.05 / 12.0);
        }
    }

    #[test]
    fn fortnightly_and_weekly_frequencies_scale_period_count() {
        let mut loan = sample_loan();
        loan.frequency = PaymentFrequency::Fortnightly;
        let fortnightly = build_schedule(&loan);
        assert_eq!(fortnightly.period_count, 650);
        assert_approx(fortnightly.periodic_rate, 0.05 / 26.0);

        loan.frequency = PaymentFrequency::Weekly;
        loan.years = 2.5;
        let weekly = build_schedule(&loan);
        assert_eq!(weekly.period_count, 130);
    }

    #[test]
    fn zero_term_yields_nan_payment_and_no_rows() {
        let mut loan = sample_loan();
        loan.years = 0.0;
        let schedule = build_schedule(&loan);
        assert!(schedule.payment.is_nan());
        assert!(schedule.rows.is_empty());
    }

    #[test]
    fn negative_inputs_are_clamped_to_zero() {
        let loan = LoanParameters {
            principal: -5_000.0,
            annual_rate_pct: -3.0,
            years: 5.0,
            offset_balance: -100.0,
            ..sample_loan()
        };
        let schedule = build_schedule(&loan);
        assert_eq!(schedule.periodic_rate, 0.0);
        assert_eq!(schedule.payment, 0.0);
        assert!(schedule.rows.is_empty());
    }

    #[test]
    fn unsupported_frequency_names_the_value() {
        let err = "daily"
            .parse::<PaymentFrequency>()
            .expect_err("daily is not supported");
        assert!(err.to_string().contains("daily"));
    }

    #[test]
    fn oversized_term_is_capped() {
        let schedule = build_schedule(&LoanParameters {
            years: f64::INFINITY,
            frequency: PaymentFrequency::Weekly,
            payment_type: PaymentType::InterestOnly,
            ..sample_loan()
        });
        assert_eq!(schedule.period_count, 5_200);
        assert_eq!(schedule.rows.len(), 5_200);
        assert_approx(schedule.rows[5_199].balance, 300_000.0);
    }

    #[test]
    fn walk_remaining_balance_matches_schedule_row() {
        let schedule = build_schedule(&sample_loan());
        let remaining =
            AmortizationWalk::new(300_000.0, schedule.payment, schedule.periodic_rate, 60)
                .remaining_balance();
        assert_approx(remaining, schedule.rows[59].balance);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_zero_offset_matches_default_offset(
            principal in 0u32..1_000_000,
            rate_bp in 0u32..1_500,
            years in 1u32..40,
            interest_only in any::<bool>()
        ) {
            let payment_type = if interest_only { PaymentType::InterestOnly } else { PaymentType::Repayment };
            let defaulted = LoanParameters {
                principal: principal as f64,
                annual_rate_pct: rate_bp as f64 / 100.0,
                years: years as f64,
                payment_type,
                ..LoanParameters::default()
            };
            let explicit = LoanParameters {
                offset_balance: 0.0,
                ..defaulted.clone()
            };

            let a = build_schedule(&explicit);
            let b = build_schedule(&defaulted);
            prop_assert_eq!(a.rows, b.rows);
        }

        #[test]
        fn prop_larger_offset_never_increases_interest(
            principal in 1_000u32..800_000,
            rate_bp in 1u32..1_200,
            years in 1u32..35,
            offset_small in 0u32..400_000,
            offset_extra in 0u32..400_000
        ) {
            let mut loan = sample_loan();
            loan.principal = principal as f64;
            loan.annual_rate_pct = rate_bp as f64 / 100.0;
            loan.years = years as f64;

            loan.offset_balance = offset_small as f64;
            let low = build_schedule(&loan);
            loan.offset_balance = (offset_small + offset_extra) as f64;
            let high = build_schedule(&loan);

            for (period, row) in low.rows.iter().enumerate() {
                let high_interest = high.rows.get(period).map(|r| r.interest).unwrap_or(0.0);
                prop_assert!(high_interest <= row.interest + 1e-9);
            }

            if loan.offset_balance < loan.principal {
                let base = {
                    let mut l = loan.clone();
                    l.offset_balance = 0.0;
                    build_schedule(&l)
                };
                let delta = base.rows[0].interest - high.rows[0].interest;
                prop_assert!((delta - loan.offset_balance * high.periodic_rate).abs() <= 1e-6);
            }
        }

        #[test]
        fn prop_rows_are_non_negative_and_bounded(
            principal in 0u32..1_000_000,
            rate_bp in 0u32..2_000,
            years in 0u32..40,
            offset in 0u32..1_200_000,
            frequency_idx in 0usize..3,
            interest_only in any::<bool>()
        ) {
            let frequency = [
                PaymentFrequency::Monthly,
                PaymentFrequency::Fortnightly,
                PaymentFrequency::Weekly,
            ][frequency_idx];
            let loan = LoanParameters {
                principal: principal as f64,
                annual_rate_pct: rate_bp as f64 / 100.0,
                years: years as f64,
                frequency,
                payment_type: if interest_only { PaymentType::InterestOnly } else { PaymentType::Repayment },
                offset_balance: offset as f64,
            };
            let schedule = build_schedule(&loan);

            prop_assert!(schedule.rows.len() <= schedule.period_count as usize);
            for (idx, row) in schedule.rows.iter().enumerate() {
                prop_assert_eq!(row.period as usize, idx + 1);
                prop_assert!(row.balance >= 0.0);
                prop_assert!(row.effective_principal >= 0.0);
                prop_assert!(row.interest >= 0.0);
                // Only the final emitted row may bring the balance to zero.
                if row.balance <= 0.0 {
                    prop_assert_eq!(idx + 1, schedule.rows.len());
                }
            }
        }

        #[test]
        fn prop_full_offset_pays_principal_only(
            principal in 1_000u32..500_000,
            rate_bp in 1u32..1_200,
            years in 1u32..30,
            excess in 0u32..100_000
        ) {
            let mut loan = sample_loan();
            loan.principal = principal as f64;
            loan.annual_rate_pct = rate_bp as f64 / 100.0;
            loan.years = years as f64;
            loan.offset_balance = (principal + excess) as f64;
            let schedule = build_schedule(&loan);

            for row in &schedule.rows {
                prop_assert_eq!(row.effective_principal, 0.0);
                prop_assert_eq!(row.interest, 0.0);
                prop_assert!(row.principal_paid > 0.0);
            }
            prop_assert_eq!(schedule.rows.last().map(|r| r.balance), Some(0.0));
        }
    }
}
