pub mod health;
pub mod invoices;
pub mod reconcile;
pub mod report;
pub mod transactions;
pub mod upload;

pub use health::{health_check, metrics_endpoint};
pub use invoices::{download_invoices, list_invoices, pending_invoices, upload_invoices};
pub use reconcile::{reconcile_data, reconcile_report};
pub use report::report_summary;
pub use transactions::{
    download_transactions, list_transactions, pending_transactions, upload_transactions,
};

use crate::middleware::Operator;
use crate::services::metrics as reconcile_metrics;
use crate::services::{reports, EmailMessage, ReconcileError};
use crate::spreadsheet::SheetData;
use crate::startup::AppState;
use service_core::error::AppError;

/// Wording and file naming for one emailed export.
pub struct SpreadsheetMail {
    pub report: &'static str,
    pub file_prefix: &'static str,
    pub subject: &'static str,
    pub intro: &'static str,
    pub attachment_name: &'static str,
}

/// Render `sheets`, mail them to the operator and wait for the relay.
/// A delivery failure fails the request.
pub async fn mail_spreadsheet(
    state: &AppState,
    operator: &Operator,
    mail: SpreadsheetMail,
    sheets: Vec<SheetData>,
) -> Result<Option<String>, AppError> {
    let bytes = reports::render_workbook(&state.staging, mail.report, mail.file_prefix, sheets).await?;

    let body = format!(
        "I hope this email finds you well.\n\n{}\nThe latest data is also available at {}.\nIf you have any questions or require further assistance, feel free to reach out.\n\nThank you for choosing Reconcile Pro.",
        mail.intro, state.config.app_url
    );
    let email = EmailMessage::new(operator.email(), mail.subject, body)
        .with_attachment(mail.attachment_name, bytes);

    match state.mailer.send(&email).await {
        Ok(message_id) => {
            reconcile_metrics::record_email(mail.report, "sent");
            tracing::info!(report = mail.report, to = %operator.email(), "Report mailed");
            Ok(message_id)
        }
        Err(e) => {
            reconcile_metrics::record_email(mail.report, "failed");
            tracing::error!(report = mail.report, error = %e, "Failed to mail report");
            Err(ReconcileError::MailDelivery(e).into())
        }
    }
}
