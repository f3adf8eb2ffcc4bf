use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::CalcError;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentFrequency {
    Monthly,
    Fortnightly,
    Weekly,
}

impl PaymentFrequency {
    pub fn periods_per_year(self) -> u32 {
        match self {
            PaymentFrequency::Monthly => 12,
            PaymentFrequency::Fortnightly => 26,
            PaymentFrequency::Weekly => 52,
        }
    }
}

impl FromStr for PaymentFrequency {
    type Err = CalcError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "monthly" => Ok(PaymentFrequency::Monthly),
            "fortnightly" => Ok(PaymentFrequency::Fortnightly),
            "weekly" => Ok(PaymentFrequency::Weekly),
            _ => Err(CalcError::UnsupportedFrequency(value.to_string())),
        }
    }
}

impl fmt::Display for PaymentFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PaymentFrequency::Monthly => "monthly",
            PaymentFrequency::Fortnightly => "fortnightly",
            PaymentFrequency::Weekly => "weekly",
        };
        f.write_str(label)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentType {
    Repayment,
    InterestOnly,
}

impl FromStr for PaymentType {
    type Err = CalcError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "repayment" => Ok(PaymentType::Repayment),
            "interest-only" | "interestonly" | "interest_only" => Ok(PaymentType::InterestOnly),
            _ => Err(CalcError::UnsupportedPaymentType(value.to_string())),
        }
    }
}

/// Inputs to the schedule builder. Negative or non-finite amounts are floored
/// to zero before use, so callers may pass raw user input.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanParameters {
    pub principal: f64,
    pub annual_rate_pct: f64,
    pub years: f64,
    pub frequency: PaymentFrequency,
    pub payment_type: PaymentType,
    pub offset_balance: f64,
}

impl Default for LoanParameters {
    fn default() -> Self {
        Self {
            principal: 0.0,
            annual_rate_pct: 0.0,
            years: 0.0,
            frequency: PaymentFrequency::Monthly,
            payment_type: PaymentType::Repayment,
            offset_balance: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodRow {
    pub period: u32,
    pub payment: f64,
    pub interest: f64,
    pub principal_paid: f64,
    pub balance: f64,
    pub effective_principal: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub payment: f64,
    pub periodic_rate: f64,
    pub period_count: u32,
    pub total_interest: f64,
    pub total_paid: f64,
    pub rows: Vec<PeriodRow>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuyerType {
    #[default]
    Standard,
    FirstTime,
}

impl FromStr for BuyerType {
    type Err = CalcError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(BuyerType::Standard),
            "first-time" | "firsttime" | "first_time" | "ftb" => Ok(BuyerType::FirstTime),
            _ => Err(CalcError::UnsupportedBuyerType(value.to_string())),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StampDutyOptions {
    pub buyer_type: BuyerType,
    pub additional_property: bool,
    pub non_uk_resident: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StampDutyRelief {
    None,
    FirstTimeBuyer,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BandSlice {
    pub from: f64,
    pub to: Option<f64>,
    pub rate_pct: f64,
    pub taxable: f64,
    pub tax: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StampDutyResult {
    pub ok: bool,
    pub total: f64,
    pub effective_rate_pct: f64,
    pub relief: StampDutyRelief,
    pub bands: Vec<BandSlice>,
}

impl StampDutyResult {
    pub fn rejected() -> Self {
        Self {
            ok: false,
            total: 0.0,
            effective_rate_pct: 0.0,
            relief: StampDutyRelief::None,
            bands: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffordabilityParams {
    pub price: f64,
    pub deposit_pct: f64,
    pub mortgage_rate_pct: f64,
    pub mortgage_term_years: f64,
    pub owner_other_monthly: f64,
    pub rent_monthly: f64,
    pub rent_extra_monthly: f64,
    pub horizon_years: f64,
    pub rent_inflation_pct: f64,
    pub owner_cost_inflation_pct: f64,
    pub price_growth_pct: f64,
    pub selling_cost_pct: f64,
    pub legal_fees: f64,
    pub survey_fees: f64,
    pub sale_legal_fees: f64,
    pub include_stamp_duty: bool,
    pub stamp_duty: StampDutyOptions,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffordabilityResult {
    pub deposit: f64,
    pub principal: f64,
    pub mortgage_monthly: f64,
    pub owner_monthly: f64,
    pub rent_monthly: f64,
    pub horizon_months: u32,
    pub rent_total_basic: f64,
    pub owner_total_basic: f64,
    pub rent_total_inflated: f64,
    pub owner_total_inflated: f64,
    pub stamp_duty: f64,
    pub upfront_costs: f64,
    pub sale_price: f64,
    pub selling_costs: f64,
    pub remaining_balance: f64,
    pub equity: f64,
    pub buy_net_cost: f64,
    pub buy_minus_rent: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StudentLoanPlan {
    Plan1,
    Plan2,
    Plan4,
    Plan5,
    Postgraduate,
}

impl FromStr for StudentLoanPlan {
    type Err = CalcError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "plan1" | "plan-1" | "1" => Ok(StudentLoanPlan::Plan1),
            "plan2" | "plan-2" | "2" => Ok(StudentLoanPlan::Plan2),
            "plan4" | "plan-4" | "4" => Ok(StudentLoanPlan::Plan4),
            "plan5" | "plan-5" | "5" => Ok(StudentLoanPlan::Plan5),
            "postgraduate" | "postgrad" | "pg" => Ok(StudentLoanPlan::Postgraduate),
            _ => Err(CalcError::UnsupportedStudentLoanPlan(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TakeHomeParams {
    pub gross_salary: f64,
    pub pension_pct: f64,
    pub student_loans: Vec<StudentLoanPlan>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentLoanCharge {
    pub plan: StudentLoanPlan,
    pub threshold: f64,
    pub rate_pct: f64,
    pub repayment: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TakeHomeResult {
    pub gross: f64,
    pub pension_contribution: f64,
    pub taxable_pay: f64,
    pub personal_allowance: f64,
    pub income_tax: f64,
    pub national_insurance: f64,
    pub student_loan: f64,
    pub student_loans: Vec<StudentLoanCharge>,
    pub net_annual: f64,
    pub net_monthly: f64,
    pub net_weekly: f64,
}
