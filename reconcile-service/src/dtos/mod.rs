pub mod ledger;
pub mod pagination;
pub mod reconcile;

pub use ledger::{
    InvoiceListResponse, InvoicePageMeta, InvoiceResponse, PendingInvoice, PendingInvoicesResponse,
    PendingTransaction, PendingTransactionsResponse, TransactionListResponse, TransactionPageMeta,
    TransactionResponse, UploadResponse,
};
pub use pagination::{PageParams, PageWindow, PendingParams};
pub use reconcile::{MailSentResponse, ReconcileRequest, ReconcileResponse, SummaryData, SummaryResponse};
