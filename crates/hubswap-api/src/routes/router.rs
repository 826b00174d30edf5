//! Routing endpoints

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use cross_chain::{CrossChainRequest, CrossChainResponse};
use hubswap_core::{ChainId, Decimal, RouterError, Token, TradeType};

use crate::dto::{error_response, BestRouteQuery, CrossChainQuery, ErrorResponse, RouteEntry};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/best_route", get(best_route))
        .route("/cross_chain", get(cross_chain))
}

/// GET /router/best_route - Best same-chain split for an exact input
async fn best_route(
    State(state): State<AppState>,
    Query(query): Query<BestRouteQuery>,
) -> Result<Json<Vec<RouteEntry>>, ErrorResponse> {
    let chain_id = ChainId::parse(&query.chain_id).map_err(error_response)?;
    let router = state.router(chain_id).ok_or_else(|| {
        error_response(RouterError::UnsupportedChain {
            chain: chain_id.to_string(),
        })
    })?;

    let token_in = Token::new(chain_id, query.token_in_address.as_str(), query.token_in_decimal, "", "");
    let token_out = Token::new(chain_id, query.token_out_address.as_str(), query.token_out_decimal, "", "");
    let amount = Decimal::parse(&query.amount_in)
        .and_then(|a| a.to_base_units(token_in.decimals))
        .map_err(error_response)?;

    let ctx = state.request_context();
    let plan = router
        .route(&ctx, &token_in, &token_out, amount, TradeType::ExactInput)
        .await
        .map_err(error_response)?;

    Ok(Json(
        plan.map(|p| RouteEntry::from_plan(&p, state.icons()))
            .unwrap_or_default(),
    ))
}

/// GET /router/cross_chain - Source swap, bridge and destination swap
async fn cross_chain(
    State(state): State<AppState>,
    Query(query): Query<CrossChainQuery>,
) -> Result<Json<CrossChainResponse>, ErrorResponse> {
    let from = ChainId::parse(&query.from_chain_id).map_err(error_response)?;
    let to = ChainId::parse(&query.to_chain_id).map_err(error_response)?;
    let amount = Decimal::parse(&query.amount_in).map_err(error_response)?;

    let request = CrossChainRequest {
        token_in: Token::new(
            from,
            query.token_in_address.as_str(),
            query.token_in_decimals,
            query.token_in_symbol.as_str(),
            "",
        ),
        token_out: Token::new(
            to,
            query.token_out_address.as_str(),
            query.token_out_decimals,
            query.token_out_symbol.as_str(),
            "",
        ),
        amount,
    };

    let ctx = state.request_context();
    let plan = state
        .orchestrator()
        .plan(&ctx, &request)
        .await
        .map_err(error_response)?;

    Ok(Json(plan.to_response(
        state.icons(),
        &request.token_in.address,
        &request.token_out.address,
    )))
}
