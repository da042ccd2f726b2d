use axum::{
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{
    AppState, error::AppError, extract::AppJson, middleware::AuthUser,
    utils::success_to_api_response,
};

use super::model::{
    BuyProductRequest, PurchaseResponse, PurchasesResponse, RefundResponse, buy, increment,
    purchases_of, refund,
};

#[axum::debug_handler]
pub async fn list_purchases(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let purchases = purchases_of(state.store.as_ref(), &caller).await?;
    let message = if purchases.is_empty() {
        "No purchases found"
    } else {
        "Success loading purchases"
    };

    Ok(success_to_api_response(message, PurchasesResponse { purchases }))
}

#[axum::debug_handler]
pub async fn add_purchase(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(product_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let entry = increment(state.store.as_ref(), &caller, &product_id).await?;

    Ok(success_to_api_response(
        "Purchase count incremented successfully",
        PurchaseResponse::from(entry),
    ))
}

#[axum::debug_handler]
pub async fn buy_product(
    State(state): State<AppState>,
    caller: AuthUser,
    AppJson(req): AppJson<BuyProductRequest>,
) -> Result<impl IntoResponse, AppError> {
    let entry = buy(state.store.as_ref(), &state.catalogue, &caller, req).await?;

    Ok(success_to_api_response(
        "Product purchased successfully",
        PurchaseResponse::from(entry),
    ))
}

#[axum::debug_handler]
pub async fn delete_purchase(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(product_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = refund(state.store.as_ref(), &caller, &product_id).await?;

    Ok(success_to_api_response(
        "Success Delete Product and Refund Processed",
        RefundResponse::from(outcome),
    ))
}
