#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use reconcile_service::config::ReconcileConfig;
use reconcile_service::services::{EmailProvider, MockEmailProvider, Stores};
use reconcile_service::spreadsheet::headers::{INVOICE_HEADERS, TRANSACTION_HEADERS};
use reconcile_service::spreadsheet::{workbook_to_buffer, CellValue, SheetData, SheetRow, XLSX_MIME};
use reconcile_service::startup::{build_router, AppState};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tower::ServiceExt;

pub const TEST_OPERATOR: &str = "ops@example.com";
const BOUNDARY: &str = "----reconcile-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub mailer: Arc<MockEmailProvider>,
    pub stores: Stores,
    pub staging: TempDir,
    _worker: JoinHandle<()>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_mail(true).await
    }

    /// `mail_enabled = false` makes every delivery fail.
    pub async fn spawn_with_mail(mail_enabled: bool) -> Self {
        let staging = TempDir::new().expect("Failed to create staging dir");
        let config = ReconcileConfig::for_memory(staging.path().to_path_buf());
        let stores = Stores::memory();
        let mailer = Arc::new(if mail_enabled {
            MockEmailProvider::recording()
        } else {
            MockEmailProvider::new(false)
        });
        let provider: Arc<dyn EmailProvider> = mailer.clone();

        let (state, worker) =
            AppState::new(config, stores.clone(), provider).expect("Failed to build app state");

        TestApp {
            router: build_router(state),
            mailer,
            stores,
            staging,
            _worker: worker,
        }
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header("X-User-Email", TEST_OPERATOR)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn get_anonymous(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("X-User-Email", TEST_OPERATOR)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn upload(
        &self,
        uri: &str,
        field: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("X-User-Email", TEST_OPERATOR)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(field, content_type, &bytes)))
            .unwrap();
        self.send(request).await
    }

    pub async fn upload_invoices(&self, rows: &[(&str, &str, &str, f64)]) -> (StatusCode, Value) {
        self.upload(
            "/api/v1/invoice/upload-invoice",
            "invFile",
            XLSX_MIME,
            invoice_workbook(rows),
        )
        .await
    }

    pub async fn upload_transactions(
        &self,
        rows: &[(&str, &str, &str, f64)],
    ) -> (StatusCode, Value) {
        self.upload(
            "/api/v1/transaction/upload-transaction",
            "transFile",
            XLSX_MIME,
            transaction_workbook(rows),
        )
        .await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }

    /// Files currently left in the staging directory.
    pub fn staged_files(&self) -> Vec<String> {
        std::fs::read_dir(self.staging.path())
            .expect("Failed to read staging dir")
            .map(|entry| {
                entry
                    .expect("Failed to read staging entry")
                    .file_name()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect()
    }

    /// Queued notifications are delivered in the background; wait for them.
    pub async fn wait_for_mail(&self, count: u64) {
        for _ in 0..100 {
            if self.mailer.send_count() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "expected {} mails, mock provider saw {}",
            count,
            self.mailer.send_count()
        );
    }
}

pub fn multipart_body(field: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"upload.xlsx\"\r\nContent-Type: {}\r\n\r\n",
            BOUNDARY, field, content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// Rows are `(invoice id, customer id, yyyy-mm-dd, amount)`.
pub fn invoice_workbook(rows: &[(&str, &str, &str, f64)]) -> Vec<u8> {
    let rows = rows
        .iter()
        .enumerate()
        .map(|(i, (id, customer, date, amount))| {
            SheetRow::new(i as u32 + 2)
                .with("invoiceId", CellValue::Text(id.to_string()))
                .with("customerId", CellValue::Text(customer.to_string()))
                .with("invoiceDate", CellValue::Text(date.to_string()))
                .with("amount", CellValue::Number(*amount))
        })
        .collect();
    workbook_to_buffer(&[SheetData::new("Invoice", INVOICE_HEADERS).with_rows(rows)])
        .expect("Failed to build invoice workbook")
}

/// Rows are `(transaction id, payment method, yyyy-mm-dd, amount)`.
pub fn transaction_workbook(rows: &[(&str, &str, &str, f64)]) -> Vec<u8> {
    let rows = rows
        .iter()
        .enumerate()
        .map(|(i, (id, method, date, amount))| {
            SheetRow::new(i as u32 + 2)
                .with("transactionId", CellValue::Text(id.to_string()))
                .with("paymentMethod", CellValue::Text(method.to_string()))
                .with("paymentDate", CellValue::Text(date.to_string()))
                .with("amount", CellValue::Number(*amount))
        })
        .collect();
    workbook_to_buffer(&[SheetData::new("Transaction", TRANSACTION_HEADERS).with_rows(rows)])
        .expect("Failed to build transaction workbook")
}
