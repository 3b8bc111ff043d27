use super::{mail_spreadsheet, SpreadsheetMail};
use crate::dtos::{MailSentResponse, ReconcileRequest, ReconcileResponse};
use crate::middleware::Operator;
use crate::models::STATUS_RECONCILED;
use crate::services::{reconciler, reports, ReconcileError};
use crate::startup::AppState;
use crate::utils::ValidatedJson;
use axum::{extract::State, Json};
use service_core::error::AppError;

pub async fn reconcile_data(
    State(state): State<AppState>,
    operator: Operator,
    ValidatedJson(req): ValidatedJson<ReconcileRequest>,
) -> Result<Json<ReconcileResponse>, AppError> {
    tracing::info!(
        operator = %operator.email(),
        invoices = req.selected_invoices.len(),
        transactions = req.selected_transactions.len(),
        "Reconciliation requested"
    );

    let outcome = reconciler::reconcile(
        state.stores.invoices.as_ref(),
        state.stores.transactions.as_ref(),
        state.stores.ledger.as_ref(),
        &req.selected_invoices,
        &req.selected_transactions,
    )
    .await?;

    Ok(Json(ReconcileResponse {
        success: true,
        message: "Reconciliation successful.".to_string(),
        reconciled_invoices: outcome.invoices,
        reconciled_transactions: outcome.transactions,
    }))
}

pub async fn reconcile_report(
    State(state): State<AppState>,
    operator: Operator,
) -> Result<Json<MailSentResponse>, AppError> {
    let invoices = state
        .stores
        .invoices
        .list(Some(STATUS_RECONCILED))
        .await
        .map_err(ReconcileError::from)?;
    let transactions = state
        .stores
        .transactions
        .list(Some(STATUS_RECONCILED))
        .await
        .map_err(ReconcileError::from)?;

    let mail = SpreadsheetMail {
        report: "reconciliation",
        file_prefix: "Reconciliation_Report_",
        subject: "Your Reconciliation Report from Reconcile Pro",
        intro: "Please find the attached Reconciliation Report for your reference.",
        attachment_name: "Reconciliation-Report.xlsx",
    };
    let message_id = mail_spreadsheet(
        &state,
        &operator,
        mail,
        reports::reconciliation_report(&invoices, &transactions),
    )
    .await?;

    Ok(Json(MailSentResponse {
        success: true,
        message: "File sent successfully".to_string(),
        message_id,
    }))
}
