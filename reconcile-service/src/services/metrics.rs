//! Metrics collection and Prometheus export.
//!
//! The recorder is installed once at startup; the `record_*` helpers are
//! no-ops until then, which keeps tests free of global state.

use crate::models::RecordKind;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use service_core::error::AppError;
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Later calls are ignored.
pub fn init_metrics() -> Result<(), AppError> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!("failed to install Prometheus recorder: {}", e))
    })?;

    if METRICS_HANDLE.set(handle).is_err() {
        tracing::warn!("Metrics handle already initialized");
    }
    Ok(())
}

/// Current metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

pub fn record_upload(kind: RecordKind, outcome: &'static str) {
    metrics::counter!(
        "reconcile_uploads_total",
        "kind" => kind.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_import_rows(kind: RecordKind, inserted: u64, duplicates: u64) {
    metrics::counter!("reconcile_rows_inserted_total", "kind" => kind.as_str()).increment(inserted);
    metrics::counter!("reconcile_rows_duplicate_total", "kind" => kind.as_str())
        .increment(duplicates);
}

pub fn record_reconciliation(outcome: &'static str) {
    metrics::counter!("reconcile_settlements_total", "outcome" => outcome).increment(1);
}

pub fn record_email(kind: &'static str, outcome: &'static str) {
    metrics::counter!(
        "reconcile_emails_total",
        "kind" => kind,
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_report_duration(report: &'static str, seconds: f64) {
    metrics::histogram!("reconcile_report_build_seconds", "report" => report).record(seconds);
}
