use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{
        Json, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::core::validate::{self, RawSimulationParams, RawTaxParams};
use crate::core::{
    FixedIncomeSchedule, SimulationRequest, SimulationResult, TaxBracket, TaxCategory, TaxRequest,
    TaxResult, project, resolve_with_schedule,
};
use crate::error::CalcError;
use crate::format;

#[derive(Clone)]
pub struct AppState {
    schedule: Arc<FixedIncomeSchedule>,
}

impl AppState {
    pub fn new(schedule: FixedIncomeSchedule) -> Self {
        Self {
            schedule: Arc::new(schedule),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(FixedIncomeSchedule::canonical().clone())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulationParameters {
    initial_balance: Decimal,
    monthly_contribution: Decimal,
    annual_rate_percent: Decimal,
    term_months: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotDisplay {
    period: String,
    balance: String,
    total_contributed: String,
    gain: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulationDisplay {
    initial_balance: String,
    monthly_contribution: String,
    annual_rate: String,
    term: String,
    final_balance: String,
    total_contributed: String,
    total_gain: String,
    gain_percent: String,
    snapshots: Vec<SnapshotDisplay>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    parameters: SimulationParameters,
    #[serde(flatten)]
    result: SimulationResult,
    display: SimulationDisplay,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TaxParameters {
    gross_gain: Decimal,
    category: TaxCategory,
    term_months: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BracketDisplay {
    period: String,
    rate: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TaxDisplay {
    gross_gain: String,
    holding_period: String,
    rate: String,
    tax_amount: String,
    net_gain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    table: Option<Vec<BracketDisplay>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TaxResponse {
    parameters: TaxParameters,
    #[serde(flatten)]
    result: TaxResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    table: Option<Vec<TaxBracket>>,
    display: TaxDisplay,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
    message: String,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .route("/api/tax", get(tax_get_handler).post(tax_post_handler))
        .fallback(not_found_handler)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_http_server(addr: SocketAddr, schedule: FixedIncomeSchedule) -> std::io::Result<()> {
    let app = router(AppState::new(schedule));

    let listener = TcpListener::bind(addr).await?;
    info!("invest-calc HTTP API listening on http://{addr}");
    info!("Local access: http://127.0.0.1:{}/", addr.port());

    axum::serve(listener, app).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, serde_json::json!({ "status": "ok" }))
}

async fn not_found_handler() -> Response {
    json_response(
        StatusCode::NOT_FOUND,
        ErrorResponse {
            error: "not_found",
            field: None,
            message: "Not found".to_string(),
        },
    )
}

async fn simulate_get_handler(
    payload: Result<Query<RawSimulationParams>, QueryRejection>,
) -> Response {
    match payload {
        Ok(Query(raw)) => simulate_handler_impl(raw),
        Err(rejection) => rejection_response(rejection.body_text()),
    }
}

async fn simulate_post_handler(
    payload: Result<Json<RawSimulationParams>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(raw)) => simulate_handler_impl(raw),
        Err(rejection) => rejection_response(rejection.body_text()),
    }
}

async fn tax_get_handler(
    State(state): State<AppState>,
    payload: Result<Query<RawTaxParams>, QueryRejection>,
) -> Response {
    match payload {
        Ok(Query(raw)) => tax_handler_impl(&state, raw),
        Err(rejection) => rejection_response(rejection.body_text()),
    }
}

async fn tax_post_handler(
    State(state): State<AppState>,
    payload: Result<Json<RawTaxParams>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(raw)) => tax_handler_impl(&state, raw),
        Err(rejection) => rejection_response(rejection.body_text()),
    }
}

fn simulate_handler_impl(raw: RawSimulationParams) -> Response {
    let outcome = validate::simulation_request(&raw)
        .and_then(|request| project(&request).map(|result| (request, result)));
    match outcome {
        Ok((request, result)) => {
            json_response(StatusCode::OK, build_simulate_response(request, result))
        }
        Err(err) => calc_error_response(err),
    }
}

fn tax_handler_impl(state: &AppState, raw: RawTaxParams) -> Response {
    let outcome = validate::tax_request(&raw).and_then(|request| {
        resolve_with_schedule(&request, &state.schedule).map(|result| (request, result))
    });
    match outcome {
        Ok((request, result)) => json_response(
            StatusCode::OK,
            build_tax_response(request, result, &state.schedule),
        ),
        Err(err) => calc_error_response(err),
    }
}

fn build_simulate_response(request: SimulationRequest, result: SimulationResult) -> SimulateResponse {
    let display = SimulationDisplay {
        initial_balance: format::brl(request.initial_balance),
        monthly_contribution: format::brl(request.monthly_contribution),
        annual_rate: format::percent(request.annual_rate_percent),
        term: format::term_label(request.term_months),
        final_balance: format::brl(result.final_balance),
        total_contributed: format::brl(result.total_contributed),
        total_gain: format::brl(result.total_gain),
        gain_percent: format::percent(result.gain_percent),
        snapshots: result
            .snapshots
            .iter()
            .map(|snap| SnapshotDisplay {
                period: format::period_label(snap.month),
                balance: format::brl(snap.balance),
                total_contributed: format::brl(snap.total_contributed),
                gain: format::brl(snap.gain),
            })
            .collect(),
    };

    SimulateResponse {
        parameters: SimulationParameters {
            initial_balance: request.initial_balance,
            monthly_contribution: request.monthly_contribution,
            annual_rate_percent: request.annual_rate_percent,
            term_months: request.term_months,
        },
        result,
        display,
    }
}

fn build_tax_response(
    request: TaxRequest,
    result: TaxResult,
    schedule: &FixedIncomeSchedule,
) -> TaxResponse {
    let table = (request.category == TaxCategory::FixedIncome).then(|| schedule.brackets().to_vec());
    let display = TaxDisplay {
        gross_gain: format::brl(request.gross_gain),
        holding_period: format::holding_period(request.term_months),
        rate: format::percent(result.rate_percent),
        tax_amount: format::brl(result.tax_amount),
        net_gain: format::brl(result.net_gain),
        table: table.as_ref().map(|brackets| {
            brackets
                .iter()
                .map(|b| BracketDisplay {
                    period: b.label.clone(),
                    rate: format::percent(b.rate_percent),
                })
                .collect()
        }),
    };

    TaxResponse {
        parameters: TaxParameters {
            gross_gain: request.gross_gain,
            category: request.category,
            term_months: request.term_months,
        },
        result,
        table,
        display,
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn calc_error_response(err: CalcError) -> Response {
    let kind = err.kind();
    match err {
        CalcError::Validation { field, message } => {
            debug!(field, %message, "rejected request");
            json_response(
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: kind,
                    field: Some(field),
                    message,
                },
            )
        }
        CalcError::Internal(detail) => {
            error!(%detail, "computation failed");
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error: kind,
                    field: None,
                    message: "The calculation could not be completed".to_string(),
                },
            )
        }
    }
}

fn rejection_response(detail: String) -> Response {
    debug!(%detail, "malformed request");
    json_response(
        StatusCode::BAD_REQUEST,
        ErrorResponse {
            error: "validation",
            field: Some("body"),
            message: format!("Malformed request: {detail}"),
        },
    )
}
