use axum::{
    Router,
    extract::{
        Json, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{ArgAction, Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::core::{
    AffordabilityParams, AffordabilityResult, BuyerType, LoanParameters, MAX_TERM_YEARS,
    PaymentFrequency, PaymentType, Schedule, StampDutyOptions, StampDutyResult, StudentLoanPlan,
    TakeHomeParams, TakeHomeResult, build_schedule, project_affordability, stamp_duty,
    take_home_pay,
};
use crate::error::{CalcError, CalcResult};

#[derive(Parser, Debug)]
#[command(
    name = "homecalc",
    about = "UK mortgage schedules, rent-vs-buy projections, take-home pay and stamp duty",
    version
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        env = "HOMECALC_LOG",
        default_value = "info",
        help = "Log level or tracing filter directive; RUST_LOG takes precedence"
    )]
    pub log_level: String,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP API
    Serve(ServeArgs),
    /// Print a full amortization schedule as JSON
    Schedule(ScheduleArgs),
    /// Compare renting with buying over a horizon
    Afford(AffordArgs),
    /// Residential stamp duty (SDLT) for a purchase price
    StampDuty(StampDutyArgs),
    /// Annual take-home pay after income tax, NI and student loans
    TakeHome(TakeHomeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, env = "HOMECALC_PORT", default_value_t = 8080)]
    pub port: u16,
}

#[derive(Args, Debug, Clone)]
pub struct ScheduleArgs {
    #[arg(long, default_value_t = 250_000.0, help = "Loan principal")]
    principal: f64,
    #[arg(long, default_value_t = 4.5, help = "Annual interest rate in percent")]
    annual_rate: f64,
    #[arg(long, default_value_t = 25.0, help = "Loan term in years")]
    years: f64,
    #[arg(
        long,
        default_value = "monthly",
        help = "Payment frequency: monthly, fortnightly or weekly"
    )]
    frequency: String,
    #[arg(
        long,
        default_value = "repayment",
        help = "Payment type: repayment or interest-only"
    )]
    payment_type: String,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Savings held in a linked offset account"
    )]
    offset_balance: f64,
}

impl Default for ScheduleArgs {
    fn default() -> Self {
        Self {
            principal: 250_000.0,
            annual_rate: 4.5,
            years: 25.0,
            frequency: "monthly".to_string(),
            payment_type: "repayment".to_string(),
            offset_balance: 0.0,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct AffordArgs {
    #[arg(long, default_value_t = 300_000.0, help = "Purchase price")]
    price: f64,
    #[arg(long, default_value_t = 10.0, help = "Deposit as percent of price")]
    deposit_pct: f64,
    #[arg(long, default_value_t = 4.5, help = "Mortgage rate in percent")]
    mortgage_rate: f64,
    #[arg(long, default_value_t = 25.0, help = "Mortgage term in years")]
    mortgage_term_years: f64,
    #[arg(
        long,
        default_value_t = 200.0,
        help = "Owner's other monthly costs (service charge, insurance, maintenance)"
    )]
    owner_other_monthly: f64,
    #[arg(long, default_value_t = 1_200.0, help = "Monthly rent")]
    rent_monthly: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Extra monthly renting costs (renter's insurance, fees)"
    )]
    rent_extra_monthly: f64,
    #[arg(long, default_value_t = 10.0, help = "Comparison horizon in years")]
    horizon_years: f64,
    #[arg(long, default_value_t = 3.0, help = "Annual rent inflation in percent")]
    rent_inflation: f64,
    #[arg(
        long,
        default_value_t = 2.0,
        help = "Annual inflation of owner's other costs in percent"
    )]
    owner_cost_inflation: f64,
    #[arg(long, default_value_t = 3.0, help = "Annual house price growth in percent")]
    price_growth: f64,
    #[arg(
        long,
        default_value_t = 1.5,
        help = "Estate agent selling fee as percent of sale price"
    )]
    selling_cost_pct: f64,
    #[arg(long, default_value_t = 1_500.0, help = "Purchase legal fees")]
    legal_fees: f64,
    #[arg(long, default_value_t = 500.0, help = "Survey fees")]
    survey_fees: f64,
    #[arg(long, default_value_t = 1_200.0, help = "Sale legal fees")]
    sale_legal_fees: f64,
    #[arg(
        long,
        default_value_t = true,
        action = ArgAction::Set,
        help = "Include stamp duty in upfront costs"
    )]
    include_stamp_duty: bool,
    #[command(flatten)]
    sdlt: SdltArgs,
}

impl Default for AffordArgs {
    fn default() -> Self {
        Self {
            price: 300_000.0,
            deposit_pct: 10.0,
            mortgage_rate: 4.5,
            mortgage_term_years: 25.0,
            owner_other_monthly: 200.0,
            rent_monthly: 1_200.0,
            rent_extra_monthly: 0.0,
            horizon_years: 10.0,
            rent_inflation: 3.0,
            owner_cost_inflation: 2.0,
            price_growth: 3.0,
            selling_cost_pct: 1.5,
            legal_fees: 1_500.0,
            survey_fees: 500.0,
            sale_legal_fees: 1_200.0,
            include_stamp_duty: true,
            sdlt: SdltArgs::default(),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct SdltArgs {
    #[arg(
        long,
        default_value = "standard",
        help = "Buyer type: standard or first-time"
    )]
    buyer_type: String,
    #[arg(long, help = "Purchase is an additional residential property")]
    additional_property: bool,
    #[arg(long, help = "Buyer is not resident in the UK")]
    non_uk_resident: bool,
}

impl Default for SdltArgs {
    fn default() -> Self {
        Self {
            buyer_type: "standard".to_string(),
            additional_property: false,
            non_uk_resident: false,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct StampDutyArgs {
    #[arg(long, default_value_t = 300_000.0, help = "Purchase price")]
    price: f64,
    #[command(flatten)]
    sdlt: SdltArgs,
}

impl Default for StampDutyArgs {
    fn default() -> Self {
        Self {
            price: 300_000.0,
            sdlt: SdltArgs::default(),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct TakeHomeArgs {
    #[arg(long, default_value_t = 35_000.0, help = "Annual gross salary")]
    gross_salary: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Salary sacrifice pension contribution in percent of gross"
    )]
    pension_pct: f64,
    #[arg(
        long,
        value_delimiter = ',',
        help = "Student loan plans: plan1, plan2, plan4, plan5, postgraduate"
    )]
    student_loans: Vec<String>,
}

impl Default for TakeHomeArgs {
    fn default() -> Self {
        Self {
            gross_salary: 35_000.0,
            pension_pct: 0.0,
            student_loans: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SchedulePayload {
    principal: Option<f64>,
    #[serde(alias = "annualRatePct")]
    annual_rate: Option<f64>,
    years: Option<f64>,
    frequency: Option<String>,
    payment_type: Option<String>,
    offset_balance: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AffordabilityPayload {
    price: Option<f64>,
    deposit_pct: Option<f64>,
    mortgage_rate: Option<f64>,
    mortgage_term_years: Option<f64>,
    owner_other_monthly: Option<f64>,
    rent_monthly: Option<f64>,
    rent_extra_monthly: Option<f64>,
    horizon_years: Option<f64>,
    rent_inflation: Option<f64>,
    owner_cost_inflation: Option<f64>,
    price_growth: Option<f64>,
    selling_cost_pct: Option<f64>,
    legal_fees: Option<f64>,
    survey_fees: Option<f64>,
    sale_legal_fees: Option<f64>,
    include_stamp_duty: Option<bool>,
    buyer_type: Option<String>,
    additional_property: Option<bool>,
    non_uk_resident: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct StampDutyPayload {
    price: Option<f64>,
    buyer_type: Option<String>,
    additional_property: Option<bool>,
    non_uk_resident: Option<bool>,
}

/// Query strings carry a comma-separated list, JSON bodies an array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PlanList {
    Joined(String),
    Each(Vec<String>),
}

impl PlanList {
    fn into_vec(self) -> Vec<String> {
        match self {
            PlanList::Joined(joined) => joined
                .split(',')
                .map(str::trim)
                .filter(|plan| !plan.is_empty())
                .map(str::to_string)
                .collect(),
            PlanList::Each(plans) => plans,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct TakeHomePayload {
    gross_salary: Option<f64>,
    pension_pct: Option<f64>,
    student_loans: Option<PlanList>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    loan: LoanParameters,
    #[serde(flatten)]
    schedule: Schedule,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffordabilityResponse {
    inputs: AffordabilityParams,
    #[serde(flatten)]
    result: AffordabilityResult,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn finite(field: &str, value: f64) -> CalcResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalcError::invalid(field, "must be a finite number"))
    }
}

fn term_years(field: &str, value: f64) -> CalcResult<f64> {
    let value = finite(field, value)?;
    if value > MAX_TERM_YEARS {
        return Err(CalcError::invalid(field, "must be at most 100 years"));
    }
    Ok(value)
}

fn build_loan(args: &ScheduleArgs) -> CalcResult<LoanParameters> {
    Ok(LoanParameters {
        principal: finite("--principal", args.principal)?,
        annual_rate_pct: finite("--annual-rate", args.annual_rate)?,
        years: term_years("--years", args.years)?,
        frequency: args.frequency.parse::<PaymentFrequency>()?,
        payment_type: args.payment_type.parse::<PaymentType>()?,
        offset_balance: finite("--offset-balance", args.offset_balance)?,
    })
}

fn build_stamp_duty_options(args: &SdltArgs) -> CalcResult<StampDutyOptions> {
    Ok(StampDutyOptions {
        buyer_type: args.buyer_type.parse::<BuyerType>()?,
        additional_property: args.additional_property,
        non_uk_resident: args.non_uk_resident,
    })
}

fn build_affordability(args: &AffordArgs) -> CalcResult<AffordabilityParams> {
    Ok(AffordabilityParams {
        price: finite("--price", args.price)?,
        deposit_pct: finite("--deposit-pct", args.deposit_pct)?,
        mortgage_rate_pct: finite("--mortgage-rate", args.mortgage_rate)?,
        mortgage_term_years: term_years("--mortgage-term-years", args.mortgage_term_years)?,
        owner_other_monthly: finite("--owner-other-monthly", args.owner_other_monthly)?,
        rent_monthly: finite("--rent-monthly", args.rent_monthly)?,
        rent_extra_monthly: finite("--rent-extra-monthly", args.rent_extra_monthly)?,
        horizon_years: term_years("--horizon-years", args.horizon_years)?,
        rent_inflation_pct: finite("--rent-inflation", args.rent_inflation)?,
        owner_cost_inflation_pct: finite("--owner-cost-inflation", args.owner_cost_inflation)?,
        price_growth_pct: finite("--price-growth", args.price_growth)?,
        selling_cost_pct: finite("--selling-cost-pct", args.selling_cost_pct)?,
        legal_fees: finite("--legal-fees", args.legal_fees)?,
        survey_fees: finite("--survey-fees", args.survey_fees)?,
        sale_legal_fees: finite("--sale-legal-fees", args.sale_legal_fees)?,
        include_stamp_duty: args.include_stamp_duty,
        stamp_duty: build_stamp_duty_options(&args.sdlt)?,
    })
}

fn build_take_home(args: &TakeHomeArgs) -> CalcResult<TakeHomeParams> {
    let student_loans = args
        .student_loans
        .iter()
        .map(|plan| plan.parse::<StudentLoanPlan>())
        .collect::<CalcResult<Vec<_>>>()?;

    Ok(TakeHomeParams {
        gross_salary: finite("--gross-salary", args.gross_salary)?,
        pension_pct: finite("--pension-pct", args.pension_pct)?,
        student_loans,
    })
}

pub fn schedule_response(args: &ScheduleArgs) -> CalcResult<ScheduleResponse> {
    let loan = build_loan(args)?;
    let schedule = build_schedule(&loan);
    Ok(ScheduleResponse { loan, schedule })
}

pub fn affordability_response(args: &AffordArgs) -> CalcResult<AffordabilityResponse> {
    let inputs = build_affordability(args)?;
    let result = project_affordability(&inputs);
    Ok(AffordabilityResponse { inputs, result })
}

pub fn stamp_duty_response(args: &StampDutyArgs) -> CalcResult<StampDutyResult> {
    let price = finite("--price", args.price)?;
    let options = build_stamp_duty_options(&args.sdlt)?;
    Ok(stamp_duty(price, &options))
}

pub fn take_home_response(args: &TakeHomeArgs) -> CalcResult<TakeHomeResult> {
    Ok(take_home_pay(&build_take_home(args)?))
}

/// Runs a calculator subcommand and renders its result as pretty JSON.
/// `serve` is handled by the caller.
pub fn render_command(command: &Command) -> CalcResult<String> {
    let json = match command {
        Command::Serve(_) => return Err(CalcError::invalid("serve", "is not a calculator")),
        Command::Schedule(args) => serde_json::to_string_pretty(&schedule_response(args)?)?,
        Command::Afford(args) => serde_json::to_string_pretty(&affordability_response(args)?)?,
        Command::StampDuty(args) => serde_json::to_string_pretty(&stamp_duty_response(args)?)?,
        Command::TakeHome(args) => serde_json::to_string_pretty(&take_home_response(args)?)?,
    };
    Ok(json)
}

pub fn router() -> Router {
    Router::new()
        .route(
            "/api/schedule",
            get(schedule_get_handler).post(schedule_post_handler),
        )
        .route(
            "/api/affordability",
            get(affordability_get_handler).post(affordability_post_handler),
        )
        .route(
            "/api/stamp-duty",
            get(stamp_duty_get_handler).post(stamp_duty_post_handler),
        )
        .route(
            "/api/take-home",
            get(take_home_get_handler).post(take_home_post_handler),
        )
        .fallback(not_found_handler)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "homecalc HTTP API listening");
    info!("local access: http://127.0.0.1:{port}/api/schedule");

    axum::serve(listener, router()).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn schedule_get_handler(
    payload: Result<Query<SchedulePayload>, QueryRejection>,
) -> Response {
    match payload {
        Ok(Query(payload)) => respond(schedule_response(&schedule_args_from_payload(payload))),
        Err(rejection) => decode_error(rejection.body_text()),
    }
}

async fn schedule_post_handler(
    payload: Result<Json<SchedulePayload>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(payload)) => respond(schedule_response(&schedule_args_from_payload(payload))),
        Err(rejection) => decode_error(rejection.body_text()),
    }
}

async fn affordability_get_handler(
    payload: Result<Query<AffordabilityPayload>, QueryRejection>,
) -> Response {
    match payload {
        Ok(Query(payload)) => respond(affordability_response(&afford_args_from_payload(payload))),
        Err(rejection) => decode_error(rejection.body_text()),
    }
}

async fn affordability_post_handler(
    payload: Result<Json<AffordabilityPayload>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(payload)) => respond(affordability_response(&afford_args_from_payload(payload))),
        Err(rejection) => decode_error(rejection.body_text()),
    }
}

async fn stamp_duty_get_handler(
    payload: Result<Query<StampDutyPayload>, QueryRejection>,
) -> Response {
    match payload {
        Ok(Query(payload)) => respond(stamp_duty_response(&stamp_duty_args_from_payload(payload))),
        Err(rejection) => decode_error(rejection.body_text()),
    }
}

async fn stamp_duty_post_handler(
    payload: Result<Json<StampDutyPayload>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(payload)) => respond(stamp_duty_response(&stamp_duty_args_from_payload(payload))),
        Err(rejection) => decode_error(rejection.body_text()),
    }
}

async fn take_home_get_handler(
    payload: Result<Query<TakeHomePayload>, QueryRejection>,
) -> Response {
    match payload {
        Ok(Query(payload)) => respond(take_home_response(&take_home_args_from_payload(payload))),
        Err(rejection) => decode_error(rejection.body_text()),
    }
}

async fn take_home_post_handler(
    payload: Result<Json<TakeHomePayload>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(payload)) => respond(take_home_response(&take_home_args_from_payload(payload))),
        Err(rejection) => decode_error(rejection.body_text()),
    }
}

fn respond<T: Serialize>(result: CalcResult<T>) -> Response {
    match result {
        Ok(body) => json_response(StatusCode::OK, body),
        Err(err) => {
            debug!(error = %err, "rejected calculator request");
            error_response(StatusCode::BAD_REQUEST, &err.to_string())
        }
    }
}

fn decode_error(reason: String) -> Response {
    let err = CalcError::InvalidInput {
        field: "payload".to_string(),
        reason,
    };
    error_response(StatusCode::BAD_REQUEST, &err.to_string())
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

fn schedule_args_from_payload(payload: SchedulePayload) -> ScheduleArgs {
    let mut args = ScheduleArgs::default();

    if let Some(v) = payload.principal {
        args.principal = v;
    }
    if let Some(v) = payload.annual_rate {
        args.annual_rate = v;
    }
    if let Some(v) = payload.years {
        args.years = v;
    }
    if let Some(v) = payload.frequency {
        args.frequency = v;
    }
    if let Some(v) = payload.payment_type {
        args.payment_type = v;
    }
    if let Some(v) = payload.offset_balance {
        args.offset_balance = v;
    }

    args
}

fn apply_sdlt_payload(
    sdlt: &mut SdltArgs,
    buyer_type: Option<String>,
    additional_property: Option<bool>,
    non_uk_resident: Option<bool>,
) {
    if let Some(v) = buyer_type {
        sdlt.buyer_type = v;
    }
    if let Some(v) = additional_property {
        sdlt.additional_property = v;
    }
    if let Some(v) = non_uk_resident {
        sdlt.non_uk_resident = v;
    }
}

fn afford_args_from_payload(payload: AffordabilityPayload) -> AffordArgs {
    let mut args = AffordArgs::default();

    if let Some(v) = payload.price {
        args.price = v;
    }
    if let Some(v) = payload.deposit_pct {
        args.deposit_pct = v;
    }
    if let Some(v) = payload.mortgage_rate {
        args.mortgage_rate = v;
    }
    if let Some(v) = payload.mortgage_term_years {
        args.mortgage_term_years = v;
    }
    if let Some(v) = payload.owner_other_monthly {
        args.owner_other_monthly = v;
    }
    if let Some(v) = payload.rent_monthly {
        args.rent_monthly = v;
    }
    if let Some(v) = payload.rent_extra_monthly {
        args.rent_extra_monthly = v;
    }
    if let Some(v) = payload.horizon_years {
        args.horizon_years = v;
    }
    if let Some(v) = payload.rent_inflation {
        args.rent_inflation = v;
    }
    if let Some(v) = payload.owner_cost_inflation {
        args.owner_cost_inflation = v;
    }
    if let Some(v) = payload.price_growth {
        args.price_growth = v;
    }
    if let Some(v) = payload.selling_cost_pct {
        args.selling_cost_pct = v;
    }
    if let Some(v) = payload.legal_fees {
        args.legal_fees = v;
    }
    if let Some(v) = payload.survey_fees {
        args.survey_fees = v;
    }
    if let Some(v) = payload.sale_legal_fees {
        args.sale_legal_fees = v;
    }
    if let Some(v) = payload.include_stamp_duty {
        args.include_stamp_duty = v;
    }
    apply_sdlt_payload(
        &mut args.sdlt,
        payload.buyer_type,
        payload.additional_property,
        payload.non_uk_resident,
    );

    args
}

fn stamp_duty_args_from_payload(payload: StampDutyPayload) -> StampDutyArgs {
    let mut args = StampDutyArgs::default();
    if let Some(v) = payload.price {
        args.price = v;
    }
    apply_sdlt_payload(
        &mut args.sdlt,
        payload.buyer_type,
        payload.additional_property,
        payload.non_uk_resident,
    );
    args
}

fn take_home_args_from_payload(payload: TakeHomePayload) -> TakeHomeArgs {
    let mut args = TakeHomeArgs::default();
    if let Some(v) = payload.gross_salary {
        args.gross_salary = v;
    }
    if let Some(v) = payload.pension_pct {
        args.pension_pct = v;
    }
    if let Some(v) = payload.student_loans {
        args.student_loans = v.into_vec();
    }
    args
}
