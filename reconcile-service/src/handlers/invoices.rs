use super::{mail_spreadsheet, SpreadsheetMail};
use super::upload::{import_upload, UploadTarget};
use crate::dtos::{
    InvoiceListResponse, InvoicePageMeta, InvoiceResponse, MailSentResponse, PageParams,
    PendingInvoice, PendingInvoicesResponse, PendingParams, UploadResponse,
};
use crate::middleware::Operator;
use crate::models::STATUS_PENDING;
use crate::services::{reports, validation, ReconcileError};
use crate::spreadsheet::headers::INVOICE_HEADERS;
use crate::startup::AppState;
use axum::{
    extract::{Multipart, Query, State},
    Json,
};
use service_core::error::AppError;

pub async fn upload_invoices(
    State(state): State<AppState>,
    operator: Operator,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let target = UploadTarget {
        field: "invFile",
        mapping: INVOICE_HEADERS,
        validate: validation::validate_invoices,
    };

    let summary = import_upload(
        &state,
        &operator,
        state.stores.invoices.as_ref(),
        target,
        multipart,
    )
    .await?;

    Ok(Json(UploadResponse::from(summary)))
}

pub async fn list_invoices(
    State(state): State<AppState>,
    _operator: Operator,
    Query(params): Query<PageParams>,
) -> Result<Json<InvoiceListResponse>, AppError> {
    let store = &state.stores.invoices;
    let total = store.count(None).await.map_err(ReconcileError::from)?;
    let window = params.window(total);

    let invoices = store
        .page(window.skip, window.limit)
        .await
        .map_err(ReconcileError::from)?;

    Ok(Json(InvoiceListResponse {
        success: true,
        message: "Invoices fetched successfully.".to_string(),
        meta_data: InvoicePageMeta {
            total_pages: window.total_pages,
            current_page: window.page,
            invoices_per_page: window.limit,
        },
        inv_data: invoices.into_iter().map(InvoiceResponse::from).collect(),
    }))
}

pub async fn pending_invoices(
    State(state): State<AppState>,
    _operator: Operator,
    Query(params): Query<PendingParams>,
) -> Result<Json<PendingInvoicesResponse>, AppError> {
    let (offset, limit) = params.resolve();
    let store = &state.stores.invoices;

    let invoices = store
        .pending(offset, limit)
        .await
        .map_err(ReconcileError::from)?;
    let total_invoices = store
        .count(Some(STATUS_PENDING))
        .await
        .map_err(ReconcileError::from)?;

    Ok(Json(PendingInvoicesResponse {
        success: true,
        message: "Pending Invoices fetched successfully.".to_string(),
        total_invoices,
        pending_inv: invoices.into_iter().map(PendingInvoice::from).collect(),
    }))
}

pub async fn download_invoices(
    State(state): State<AppState>,
    operator: Operator,
) -> Result<Json<MailSentResponse>, AppError> {
    let invoices = state
        .stores
        .invoices
        .list(None)
        .await
        .map_err(ReconcileError::from)?;

    tracing::info!(count = invoices.len(), "Exporting invoices");

    let mail = SpreadsheetMail {
        report: "invoice_dump",
        file_prefix: "Invoice_Data_",
        subject: "Your Invoice from Reconcile Pro",
        intro: "Please find the attached invoices for your reference.",
        attachment_name: "Invoice-File.xlsx",
    };
    let message_id = mail_spreadsheet(&state, &operator, mail, reports::invoice_dump(&invoices)).await?;

    Ok(Json(MailSentResponse {
        success: true,
        message: "File sent successfully".to_string(),
        message_id,
    }))
}
