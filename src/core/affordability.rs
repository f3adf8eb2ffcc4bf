use tracing::{debug, warn};

use super::amortization::{AmortizationWalk, MAX_TERM_YEARS, periodic_payment};
use super::stamp_duty::stamp_duty;
use super::types::{AffordabilityParams, AffordabilityResult, StampDutyOptions, StampDutyResult};

/// Yearly growth multiplier for a percent rate. Rates below -100% floor at zero
/// so fractional powers stay real.
fn growth_factor(pct: f64) -> f64 {
    (1.0 + pct / 100.0).max(0.0)
}

pub fn project_affordability(params: &AffordabilityParams) -> AffordabilityResult {
    project_affordability_with(params, stamp_duty)
}

/// Rent-vs-buy projection with an injected stamp-duty lookup. A lookup result
/// with `ok: false` counts as zero cost.
pub fn project_affordability_with<F>(params: &AffordabilityParams, lookup: F) -> AffordabilityResult
where
    F: Fn(f64, &StampDutyOptions) -> StampDutyResult,
{
    let price = params.price.max(0.0);
    let deposit = price * (params.deposit_pct / 100.0).clamp(0.0, 1.0);
    let principal = (price - deposit).max(0.0);

    let monthly_rate = params.mortgage_rate_pct.max(0.0) / 100.0 / 12.0;
    let term_years = params.mortgage_term_years.max(0.0).min(MAX_TERM_YEARS);
    let term_months = (term_years * 12.0).round() as u32;
    let mut mortgage_monthly = periodic_payment(principal, monthly_rate, i64::from(term_months));
    if mortgage_monthly.is_nan() {
        warn!(
            term_years = params.mortgage_term_years,
            "mortgage term resolves to zero months; treating payment as zero"
        );
        mortgage_monthly = 0.0;
    }

    let owner_monthly = mortgage_monthly + params.owner_other_monthly.max(0.0);
    let rent_monthly = params.rent_monthly.max(0.0) + params.rent_extra_monthly.max(0.0);

    let horizon_years = params.horizon_years.max(0.0).min(MAX_TERM_YEARS);
    let horizon_months = (horizon_years * 12.0).round() as u32;
    let months = f64::from(horizon_months);

    let rent_total_basic = rent_monthly * months;
    let owner_total_basic = owner_monthly * months;

    let rent_growth = growth_factor(params.rent_inflation_pct);
    let owner_growth = growth_factor(params.owner_cost_inflation_pct);
    let mut rent_total_inflated = 0.0;
    let mut owner_total_inflated = 0.0;
    for month in 0..horizon_months {
        // Fractional-year exponent every month, not a yearly step.
        let years_elapsed = f64::from(month) / 12.0;
        rent_total_inflated += rent_monthly * rent_growth.powf(years_elapsed);
        owner_total_inflated += owner_monthly * owner_growth.powf(years_elapsed);
    }

    let stamp_duty = if params.include_stamp_duty {
        let result = lookup(price, &params.stamp_duty);
        if result.ok { result.total } else { 0.0 }
    } else {
        0.0
    };
    let upfront_costs = params.legal_fees.max(0.0) + params.survey_fees.max(0.0) + stamp_duty;

    // Annual compounding over completed years only, unlike the monthly cost loop.
    let whole_years = (horizon_months / 12) as i32;
    let sale_price = price * growth_factor(params.price_growth_pct).powi(whole_years);
    let selling_costs =
        sale_price * params.selling_cost_pct.max(0.0) / 100.0 + params.sale_legal_fees.max(0.0);

    let remaining_balance = AmortizationWalk::new(
        principal,
        mortgage_monthly,
        monthly_rate,
        horizon_months.min(term_months),
    )
    .remaining_balance();

    let equity = (sale_price - remaining_balance - selling_costs).max(0.0);
    let buy_net_cost = owner_total_inflated + upfront_costs - equity;

    debug!(
        price,
        horizon_months,
        buy_net_cost,
        rent_total_inflated,
        "projected rent vs buy"
    );

    AffordabilityResult {
        deposit,
        principal,
        mortgage_monthly,
        owner_monthly,
        rent_monthly,
        horizon_months,
        rent_total_basic,
        owner_total_basic,
        rent_total_inflated,
        owner_total_inflated,
        stamp_duty,
        upfront_costs,
        sale_price,
        selling_costs,
        remaining_balance,
        equity,
        buy_net_cost,
        buy_minus_rent: buy_net_cost - rent_total_inflated,
    }
}
