use crate::services::reports::StatusSummary;
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const MAX_SELECTION: u64 = 1000;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileRequest {
    #[serde(default)]
    #[validate(length(max = MAX_SELECTION, message = "Too many invoices selected for one reconciliation"))]
    pub selected_invoices: Vec<String>,
    #[serde(default)]
    #[validate(length(max = MAX_SELECTION, message = "Too many transactions selected for one reconciliation"))]
    pub selected_transactions: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileResponse {
    pub success: bool,
    pub message: String,
    pub reconciled_invoices: u64,
    pub reconciled_transactions: u64,
}

#[derive(Debug, Serialize)]
pub struct SummaryData {
    pub invoices: StatusSummary,
    pub transactions: StatusSummary,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub success: bool,
    pub message: String,
    pub data: SummaryData,
}

/// Reply for endpoints that mail a generated spreadsheet.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MailSentResponse {
    pub success: bool,
    pub message: String,
    pub message_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_selections_deserialize_as_empty() {
        let req: ReconcileRequest = serde_json::from_str(r#"{"selectedInvoices":["A1"]}"#).unwrap();
        assert_eq!(req.selected_invoices, vec!["A1".to_string()]);
        assert!(req.selected_transactions.is_empty());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn oversized_selection_fails_validation() {
        let req = ReconcileRequest {
            selected_invoices: (0..=MAX_SELECTION).map(|i| i.to_string()).collect(),
            selected_transactions: vec!["T1".into()],
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn selection_at_the_limit_is_accepted() {
        let req = ReconcileRequest {
            selected_invoices: vec!["A1".into()],
            selected_transactions: (0..MAX_SELECTION).map(|i| i.to_string()).collect(),
        };
        assert!(req.validate().is_ok());
    }
}
