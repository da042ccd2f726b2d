use axum::{
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{AppState, error::AppError, utils::success_to_api_response};

use super::model::{ListingResponse, PAGE_ONE_SIZE, ProductResponse};

#[axum::debug_handler]
pub async fn shopping(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let products = state.catalogue.fetch_listing().await?;

    Ok(success_to_api_response(
        "Products fetched successfully.",
        ListingResponse::new(products),
    ))
}

#[axum::debug_handler]
pub async fn page_one(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let mut products = state.catalogue.fetch_listing().await?;
    products.truncate(PAGE_ONE_SIZE);

    Ok(success_to_api_response(
        "Page one products fetched.",
        ListingResponse::new(products),
    ))
}

#[axum::debug_handler]
pub async fn product_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(AppError::Validation("Product ID is required.".into()));
    }

    let product = state.catalogue.fetch_by_id(id).await?;
    Ok(success_to_api_response(
        "Product fetched successfully.",
        ProductResponse { product },
    ))
}
