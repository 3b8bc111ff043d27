use crate::dtos::{SummaryData, SummaryResponse};
use crate::middleware::Operator;
use crate::services::{reports, ReconcileError};
use crate::startup::AppState;
use axum::{extract::State, Json};
use service_core::error::AppError;

pub async fn report_summary(
    State(state): State<AppState>,
    _operator: Operator,
) -> Result<Json<SummaryResponse>, AppError> {
    let (invoices, transactions) = tokio::try_join!(
        state.stores.invoices.status_totals(),
        state.stores.transactions.status_totals(),
    )
    .map_err(ReconcileError::from)?;

    Ok(Json(SummaryResponse {
        success: true,
        message: "Report summary fetch successfully".to_string(),
        data: SummaryData {
            invoices: reports::summarize(&invoices),
            transactions: reports::summarize(&transactions),
        },
    }))
}
