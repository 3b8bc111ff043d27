use super::metrics as reconcile_metrics;
use super::store::{RecordStore, StoreError};
use crate::models::LedgerRecord;
use std::collections::HashSet;

/// Outcome of one deduplicating import.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportSummary {
    pub inserted_count: u64,
    pub duplicate_count: u64,
    pub duplicates: Vec<String>,
}

/// Persist the records whose keys are not already stored.
///
/// Keys already present, keys repeated within the batch, and keys that lose
/// a race against a concurrent import are all reported as duplicates.
pub async fn import_unique<T: LedgerRecord>(
    store: &dyn RecordStore<T>,
    records: Vec<T>,
) -> Result<ImportSummary, StoreError> {
    let kind = T::KIND;
    let keys: Vec<String> = records.iter().map(|r| r.key().to_string()).collect();
    let existing = store.existing_keys(&keys).await?;

    let mut seen = HashSet::with_capacity(records.len());
    let mut duplicates = Vec::new();
    let mut fresh = Vec::with_capacity(records.len());

    for record in records {
        let key = record.key().to_string();
        if existing.contains(&key) || !seen.insert(key.clone()) {
            duplicates.push(key);
        } else {
            fresh.push(record);
        }
    }

    let outcome = store.insert_unique(fresh).await?;
    duplicates.extend(outcome.duplicates);

    let summary = ImportSummary {
        inserted_count: outcome.inserted,
        duplicate_count: duplicates.len() as u64,
        duplicates,
    };

    reconcile_metrics::record_import_rows(kind, summary.inserted_count, summary.duplicate_count);

    tracing::info!(
        kind = kind.as_str(),
        inserted = summary.inserted_count,
        duplicates = summary.duplicate_count,
        "Import completed"
    );

    Ok(summary)
}
