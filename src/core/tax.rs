use tracing::debug;

use super::bands::{INCOME_TAX, NATIONAL_INSURANCE, banded_total, student_loan_terms};
use super::types::{StudentLoanCharge, StudentLoanPlan, TakeHomeParams, TakeHomeResult};

/// Personal allowance after the £1-per-£2 taper above the taper threshold.
pub fn personal_allowance(taxable_pay: f64) -> f64 {
    let gross = taxable_pay.max(0.0);
    let mut allowance = INCOME_TAX.personal_allowance;
    if gross > INCOME_TAX.taper_threshold {
        let reduction = (gross - INCOME_TAX.taper_threshold) / 2.0;
        allowance = (allowance - reduction).max(0.0);
    }
    allowance
}

pub fn income_tax(taxable_pay: f64) -> f64 {
    let gross = taxable_pay.max(0.0);
    let taxable_income = (gross - personal_allowance(gross)).max(0.0);
    banded_total(taxable_income, INCOME_TAX.bands)
}

pub fn national_insurance(earnings: f64) -> f64 {
    banded_total(earnings, &NATIONAL_INSURANCE)
}

pub fn student_loan_repayment(earnings: f64, plan: StudentLoanPlan) -> StudentLoanCharge {
    let terms = student_loan_terms(plan);
    let repayment = (earnings.max(0.0) - terms.threshold).max(0.0) * terms.rate_pct / 100.0;
    StudentLoanCharge {
        plan,
        threshold: terms.threshold,
        rate_pct: terms.rate_pct,
        repayment,
    }
}

pub fn take_home_pay(params: &TakeHomeParams) -> TakeHomeResult {
    let gross = params.gross_salary.max(0.0);
    let pension_contribution = gross * params.pension_pct.clamp(0.0, 100.0) / 100.0;
    let taxable_pay = (gross - pension_contribution).max(0.0);

    let allowance = personal_allowance(taxable_pay);
    let income_tax = income_tax(taxable_pay);
    let national_insurance = national_insurance(taxable_pay);

    let mut student_loans: Vec<StudentLoanCharge> = Vec::new();
    for &plan in &params.student_loans {
        if student_loans.iter().any(|charge| charge.plan == plan) {
            continue;
        }
        student_loans.push(student_loan_repayment(taxable_pay, plan));
    }
    let student_loan: f64 = student_loans.iter().map(|charge| charge.repayment).sum();

    let net_annual = taxable_pay - income_tax - national_insurance - student_loan;
    debug!(gross, net_annual, "computed take-home pay");

    TakeHomeResult {
        gross,
        pension_contribution,
        taxable_pay,
        personal_allowance: allowance,
        income_tax,
        national_insurance,
        student_loan,
        student_loans,
        net_annual,
        net_monthly: net_annual / 12.0,
        net_weekly: net_annual / 52.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn uk_tax_bands_apply_progressive_rates() {
        assert_approx(income_tax(60_000.0), 11_432.0);
        assert_approx(income_tax(12_570.0), 0.0);
        assert_approx(income_tax(30_000.0), 3_486.0);
    }

    #[test]
    fn personal_allowance_tapers_above_threshold() {
        assert_approx(personal_allowance(100_000.0), 12_570.0);
        assert_approx(personal_allowance(110_000.0), 7_570.0);
        assert_approx(personal_allowance(125_140.0), 0.0);
        assert_approx(personal_allowance(200_000.0), 0.0);
        assert_approx(income_tax(110_000.0), 33_432.0);
    }

    #[test]
    fn additional_rate_applies_above_top_threshold() {
        // 37,700 @ 20% + 87,440 @ 40% + 24,860 @ 45%
        assert_approx(income_tax(150_000.0), 7_540.0 + 34_976.0 + 11_187.0);
    }

    #[test]
    fn national_insurance_uses_main_and_upper_rates() {
        assert_approx(national_insurance(12_000.0), 0.0);
        assert_approx(national_insurance(30_000.0), (30_000.0 - 12_570.0) * 0.08);
        assert_approx(
            national_insurance(60_000.0),
            (50_270.0 - 12_570.0) * 0.08 + (60_000.0 - 50_270.0) * 0.02,
        );
    }

    #[test]
    fn student_loan_charges_above_plan_threshold() {
        let plan2 = student_loan_repayment(38_470.0, StudentLoanPlan::Plan2);
        assert_approx(plan2.repayment, 900.0);
        let pg = student_loan_repayment(31_000.0, StudentLoanPlan::Postgraduate);
        assert_approx(pg.repayment, 600.0);
        let below = student_loan_repayment(20_000.0, StudentLoanPlan::Plan1);
        assert_approx(below.repayment, 0.0);
    }

    #[test]
    fn take_home_composes_deductions() {
        let params = TakeHomeParams {
            gross_salary: 50_000.0,
            pension_pct: 5.0,
            student_loans: vec![
                StudentLoanPlan::Plan2,
                StudentLoanPlan::Postgraduate,
                StudentLoanPlan::Plan2,
            ],
        };
        let result = take_home_pay(&params);

        assert_approx(result.pension_contribution, 2_500.0);
        assert_approx(result.taxable_pay, 47_500.0);
        assert_approx(result.income_tax, (47_500.0 - 12_570.0) * 0.20);
        assert_approx(result.national_insurance, (47_500.0 - 12_570.0) * 0.08);
        assert_eq!(result.student_loans.len(), 2);
        assert_approx(
            result.student_loan,
            (47_500.0 - 28_470.0) * 0.09 + (47_500.0 - 21_000.0) * 0.06,
        );
        assert_approx(
            result.net_annual,
            47_500.0 - result.income_tax - result.national_insurance - result.student_loan,
        );
        assert_approx(result.net_monthly * 12.0, result.net_annual);
    }

    #[test]
    fn take_home_clamps_negative_salary_and_pension() {
        let params = TakeHomeParams {
            gross_salary: -10.0,
            pension_pct: 250.0,
            student_loans: Vec::new(),
        };
        let result = take_home_pay(&params);
        assert_eq!(result.gross, 0.0);
        assert_eq!(result.net_annual, 0.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_net_pay_is_bounded_and_monotone(
            salary in 0u32..400_000,
            raise in 1u32..20_000
        ) {
            let low = take_home_pay(&TakeHomeParams { gross_salary: salary as f64, ..TakeHomeParams::default() });
            let high = take_home_pay(&TakeHomeParams { gross_salary: (salary + raise) as f64, ..TakeHomeParams::default() });

            prop_assert!(low.net_annual >= 0.0);
            prop_assert!(low.net_annual <= low.gross + 1e-9);
            // The allowance taper peaks at a 62% marginal rate, so net pay still rises.
            prop_assert!(high.net_annual > low.net_annual);
        }
    }
}
