use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    AppState, error::AppError, extract::AppJson, middleware::AuthUser, result::EmptyResponse,
    utils::success_to_api_response,
};

use super::model::{ReportRequest, ReportResponse, file_report};

pub async fn home() -> impl IntoResponse {
    success_to_api_response("Home Page", EmptyResponse {})
}

pub async fn about() -> impl IntoResponse {
    success_to_api_response("About Page", EmptyResponse {})
}

#[axum::debug_handler]
pub async fn submit_report(
    State(state): State<AppState>,
    caller: AuthUser,
    AppJson(req): AppJson<ReportRequest>,
) -> Result<impl IntoResponse, AppError> {
    let report_id = file_report(state.store.as_ref(), &caller, req).await?;

    Ok((
        StatusCode::OK,
        success_to_api_response("Thank you for your feedback!", ReportResponse { report_id }),
    ))
}
