mod affordability;
mod amortization;
pub mod bands;
mod stamp_duty;
mod tax;
mod types;

pub use affordability::{project_affordability, project_affordability_with};
pub use amortization::{AmortizationWalk, MAX_TERM_YEARS, build_schedule, periodic_payment};
pub use stamp_duty::stamp_duty;
pub use tax::{
    income_tax, national_insurance, personal_allowance, student_loan_repayment, take_home_pay,
};
pub use types::{
    AffordabilityParams, AffordabilityResult, BandSlice, BuyerType, LoanParameters,
    PaymentFrequency, PaymentType, PeriodRow, Schedule, StampDutyOptions, StampDutyRelief,
    StampDutyResult, StudentLoanCharge, StudentLoanPlan, TakeHomeParams, TakeHomeResult,
};
