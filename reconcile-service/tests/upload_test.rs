mod common;

use axum::http::StatusCode;
use common::{invoice_workbook, TestApp};
use reconcile_service::spreadsheet::XLSX_MIME;

#[tokio::test]
async fn api_routes_require_the_operator_header() {
    let app = TestApp::spawn().await;

    for uri in [
        "/api/v1/invoice/all-invoices",
        "/api/v1/invoice/download-invoices",
        "/api/v1/transaction/pending-transactions",
        "/api/v1/report/report-summary",
    ] {
        let (status, body) = app.get_anonymous(uri).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(body["success"], false);
    }

    let (status, _) = app.get_anonymous("/health").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn valid_invoice_upload_imports_rows_and_confirms_by_mail() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .upload_invoices(&[
            ("INV001", "C001", "2024-01-15", 100.0),
            ("INV002", "C002", "2024-01-16", 50.0),
        ])
        .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["success"], true);
    assert_eq!(body["insertedCount"], 2);
    assert_eq!(body["duplicateCount"], 0);
    assert_eq!(
        body["message"],
        "File uploaded successfully.\nPlease check your email for confirmation."
    );

    app.wait_for_mail(1).await;
    let sent = app.mailer.sent();
    assert_eq!(sent[0].to, common::TEST_OPERATOR);
    assert_eq!(sent[0].subject, "Invoice Upload Success");
    assert!(sent[0].body_text.contains("Inserted Count: 2"));
}

#[tokio::test]
async fn reuploading_known_invoices_reports_duplicates() {
    let app = TestApp::spawn().await;

    app.upload_invoices(&[("INV001", "C001", "2024-01-15", 100.0)])
        .await;
    let (status, body) = app
        .upload_invoices(&[
            ("INV001", "C001", "2024-01-15", 100.0),
            ("INV003", "C003", "2024-02-01", 75.5),
        ])
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["insertedCount"], 1);
    assert_eq!(body["duplicateCount"], 1);
    assert_eq!(body["duplicates"][0], "INV001");

    let (_, listing) = app.get("/api/v1/invoice/all-invoices").await;
    assert_eq!(listing["invData"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn invalid_rows_are_rejected_and_reported_by_mail() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .upload_invoices(&[
            ("INV0001", "C001", "2024-01-15", 100.0),
            ("INV002", "C002", "not a date", -5.0),
        ])
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    let errors = body["errors"].as_array().expect("errors array");
    assert!(errors.len() >= 3, "{:?}", errors);
    assert!(errors.iter().any(|e| e.as_str().unwrap().starts_with("Row 2:")));
    assert!(errors.iter().any(|e| e.as_str().unwrap().starts_with("Row 3:")));

    app.wait_for_mail(1).await;
    assert_eq!(app.mailer.sent()[0].subject, "Invoice Upload Validation Errors");

    let (_, listing) = app.get("/api/v1/invoice/all-invoices").await;
    assert!(listing["invData"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn non_xlsx_upload_is_rejected() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .upload(
            "/api/v1/invoice/upload-invoice",
            "invFile",
            "text/csv",
            b"Invoice ID,Amount\nINV001,10\n".to_vec(),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "File must be type of xlsx");
}

#[tokio::test]
async fn missing_file_field_is_rejected() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .upload(
            "/api/v1/invoice/upload-invoice",
            "somethingElse",
            XLSX_MIME,
            invoice_workbook(&[("INV001", "C001", "2024-01-15", 1.0)]),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "File is required");
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .upload(
            "/api/v1/invoice/upload-invoice",
            "invFile",
            XLSX_MIME,
            vec![0u8; 1024 * 1024 + 1],
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "File size must be less than 1 MB");
}

#[tokio::test]
async fn invoice_sheet_in_transaction_upload_is_a_schema_error() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .upload(
            "/api/v1/transaction/upload-transaction",
            "transFile",
            XLSX_MIME,
            invoice_workbook(&[("INV001", "C001", "2024-01-15", 1.0)]),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(app.mailer.send_count(), 0);
}

#[tokio::test]
async fn transaction_upload_and_listing() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .upload_transactions(&[
            ("T001", "Credit Card", "2024-01-20", 150.0),
            ("T002", "Bank Transfer", "2024-01-21", 20.0),
        ])
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["insertedCount"], 2);

    let (status, listing) = app.get("/api/v1/transaction/all-transactions").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["metaData"]["totalPages"], 1);
    assert_eq!(listing["metaData"]["currentPage"], 1);
    let rows = listing["transData"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r["status"] == "Pending"));

    let (status, pending) = app
        .get("/api/v1/transaction/pending-transactions?offset=0&limit=1")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending["totalTransactions"], 2);
    assert_eq!(pending["pendingTrans"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn invoice_listing_pages_by_ten() {
    let app = TestApp::spawn().await;

    let ids: Vec<String> = (1..=12).map(|i| format!("INV{:03}", i)).collect();
    let rows: Vec<(&str, &str, &str, f64)> = ids
        .iter()
        .map(|id| (id.as_str(), "C001", "2024-03-01", 10.0))
        .collect();
    let (status, _) = app.upload_invoices(&rows).await;
    assert_eq!(status, StatusCode::OK);

    let (_, first) = app.get("/api/v1/invoice/all-invoices").await;
    assert_eq!(first["metaData"]["totalPages"], 2);
    assert_eq!(first["metaData"]["invoicesPerPage"], 10);
    assert_eq!(first["invData"].as_array().unwrap().len(), 10);

    let (_, second) = app.get("/api/v1/invoice/all-invoices?page=2").await;
    assert_eq!(second["metaData"]["currentPage"], 2);
    assert_eq!(second["invData"].as_array().unwrap().len(), 2);

    let (_, beyond) = app.get("/api/v1/invoice/all-invoices?page=99").await;
    assert_eq!(beyond["metaData"]["currentPage"], 2);

    let (_, junk) = app.get("/api/v1/invoice/all-invoices?page=abc").await;
    assert_eq!(junk["metaData"]["currentPage"], 1);
}

#[tokio::test]
async fn staged_uploads_are_removed_on_every_outcome() {
    let app = TestApp::spawn().await;

    let (status, _) = app
        .upload_invoices(&[("INV001", "C001", "2024-01-15", 100.0)])
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.staged_files().is_empty(), "{:?}", app.staged_files());

    let (status, _) = app
        .upload_invoices(&[("INV0002", "C002", "2024-01-16", 0.0)])
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.staged_files().is_empty(), "{:?}", app.staged_files());

    let (status, body) = app
        .upload(
            "/api/v1/invoice/upload-invoice",
            "invFile",
            XLSX_MIME,
            b"not a zip".to_vec(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Unable to read the uploaded file"));
    assert!(app.staged_files().is_empty(), "{:?}", app.staged_files());
}
