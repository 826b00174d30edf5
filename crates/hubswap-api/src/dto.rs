//! Data Transfer Objects for API requests and responses

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use cross_chain::{path_hops, PathHop, TokenIcons};
use dex_router::SwapPlan;
use hubswap_core::{Decimal, RouterError};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Query of `GET /router/best_route`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestRouteQuery {
    pub chain_id: String,
    pub amount_in: String,
    pub token_in_address: String,
    pub token_in_decimal: u8,
    pub token_out_address: String,
    pub token_out_decimal: u8,
}

/// Query of `GET /router/cross_chain`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossChainQuery {
    pub from_chain_id: String,
    pub to_chain_id: String,
    pub amount_in: String,
    pub token_in_address: String,
    pub token_in_decimals: u8,
    #[serde(default)]
    pub token_in_symbol: String,
    pub token_out_address: String,
    pub token_out_decimals: u8,
    #[serde(default)]
    pub token_out_symbol: String,
}

/// One route of a same-chain plan
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteEntry {
    pub protocol: String,
    pub percent: u32,
    pub amount_in: String,
    pub amount_out: String,
    pub gas_cost_in_usd: String,
    pub path: Vec<PathHop>,
}

impl RouteEntry {
    pub fn from_plan(plan: &SwapPlan, icons: &TokenIcons) -> Vec<RouteEntry> {
        plan.routes
            .iter()
            .map(|r| RouteEntry {
                protocol: r.route.dex_name().to_string(),
                percent: r.percent,
                amount_in: Decimal::from_base_units(r.amount_in(), plan.token_in.decimals).to_string(),
                amount_out: Decimal::from_base_units(r.amount_out(), plan.token_out.decimals).to_string(),
                gas_cost_in_usd: r.gas_cost_in_usd.to_string(),
                path: path_hops(r, icons),
            })
            .collect()
    }
}

/// Generic API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

pub type ErrorResponse = (StatusCode, Json<ApiError>);

/// Map a router error onto its status code and machine-checkable kind.
pub fn error_response(e: RouterError) -> ErrorResponse {
    let status = StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ApiError::new(e.kind(), e.to_string())))
}
