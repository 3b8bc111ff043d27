use super::{mail_spreadsheet, SpreadsheetMail};
use super::upload::{import_upload, UploadTarget};
use crate::dtos::{
    MailSentResponse, PageParams, PendingParams, PendingTransaction, PendingTransactionsResponse,
    TransactionListResponse, TransactionPageMeta, TransactionResponse, UploadResponse,
};
use crate::middleware::Operator;
use crate::models::STATUS_PENDING;
use crate::services::{reports, validation, ReconcileError};
use crate::spreadsheet::headers::TRANSACTION_HEADERS;
use crate::startup::AppState;
use axum::{
    extract::{Multipart, Query, State},
    Json,
};
use service_core::error::AppError;

pub async fn upload_transactions(
    State(state): State<AppState>,
    operator: Operator,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let target = UploadTarget {
        field: "transFile",
        mapping: TRANSACTION_HEADERS,
        validate: validation::validate_transactions,
    };

    let summary = import_upload(
        &state,
        &operator,
        state.stores.transactions.as_ref(),
        target,
        multipart,
    )
    .await?;

    Ok(Json(UploadResponse::from(summary)))
}

pub async fn list_transactions(
    State(state): State<AppState>,
    _operator: Operator,
    Query(params): Query<PageParams>,
) -> Result<Json<TransactionListResponse>, AppError> {
    let store = &state.stores.transactions;
    let total = store.count(None).await.map_err(ReconcileError::from)?;
    let window = params.window(total);

    let transactions = store
        .page(window.skip, window.limit)
        .await
        .map_err(ReconcileError::from)?;

    Ok(Json(TransactionListResponse {
        success: true,
        message: "Transactions fetched successfully.".to_string(),
        meta_data: TransactionPageMeta {
            total_pages: window.total_pages,
            current_page: window.page,
            transactions_per_page: window.limit,
        },
        trans_data: transactions
            .into_iter()
            .map(TransactionResponse::from)
            .collect(),
    }))
}

pub async fn pending_transactions(
    State(state): State<AppState>,
    _operator: Operator,
    Query(params): Query<PendingParams>,
) -> Result<Json<PendingTransactionsResponse>, AppError> {
    let (offset, limit) = params.resolve();
    let store = &state.stores.transactions;

    let transactions = store
        .pending(offset, limit)
        .await
        .map_err(ReconcileError::from)?;
    let total_transactions = store
        .count(Some(STATUS_PENDING))
        .await
        .map_err(ReconcileError::from)?;

    Ok(Json(PendingTransactionsResponse {
        success: true,
        message: "Pending Transactions fetched successfully.".to_string(),
        total_transactions,
        pending_trans: transactions
            .into_iter()
            .map(PendingTransaction::from)
            .collect(),
    }))
}

pub async fn download_transactions(
    State(state): State<AppState>,
    operator: Operator,
) -> Result<Json<MailSentResponse>, AppError> {
    let transactions = state
        .stores
        .transactions
        .list(None)
        .await
        .map_err(ReconcileError::from)?;

    tracing::info!(count = transactions.len(), "Exporting transactions");

    let mail = SpreadsheetMail {
        report: "transaction_dump",
        file_prefix: "Transaction_Data_",
        subject: "Your Transactions from Reconcile Pro",
        intro: "Please find the attached transactions for your reference.",
        attachment_name: "Transaction-File.xlsx",
    };
    let message_id = mail_spreadsheet(&state, &operator, mail, reports::transaction_dump(&transactions)).await?;

    Ok(Json(MailSentResponse {
        success: true,
        message: "File sent successfully".to_string(),
        message_id,
    }))
}
