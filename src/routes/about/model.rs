use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::AppError, middleware::AuthUser, store::Store};

const MAX_REPORT_LEN: usize = 2000;

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    #[serde(alias = "message")]
    pub report: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub report_id: Uuid,
}

pub async fn file_report(
    store: &dyn Store,
    caller: &AuthUser,
    req: ReportRequest,
) -> Result<Uuid, AppError> {
    let message = req
        .report
        .map(|report| report.trim().to_string())
        .filter(|report| !report.is_empty())
        .ok_or_else(|| AppError::Validation("Please enter a report message.".into()))?;
    if message.chars().count() > MAX_REPORT_LEN {
        return Err(AppError::Validation(format!(
            "Report must be at most {MAX_REPORT_LEN} characters."
        )));
    }

    let report = store.insert_report(caller.id, &message).await?;
    tracing::info!(user_id = %caller.id, report_id = %report.id, "Feedback report received");
    Ok(report.id)
}
