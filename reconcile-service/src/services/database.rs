use super::store::{InsertOutcome, Ledger, RecordStore, Settled, StatusTotal, StoreError};
use crate::models::{Invoice, LedgerRecord, Transaction, STATUS_PENDING, STATUS_RECONCILED};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Bson, Document},
    error::ErrorKind,
    options::{FindOptions, IndexOptions, InsertManyOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;
use std::collections::HashSet;

const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!("Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for reconcile-service");

        self.create_ledger_indexes::<Invoice>().await?;
        self.create_ledger_indexes::<Transaction>().await?;

        Ok(())
    }

    async fn create_ledger_indexes<T: LedgerRecord>(&self) -> Result<(), AppError> {
        let kind = T::KIND;
        let (key_field, date_field) = (kind.key_field(), kind.date_field());
        let unique_key = IndexModel::builder()
            .keys(doc! { key_field: 1 })
            .options(
                IndexOptions::builder()
                    .name(format!("{}_unique", kind.key_field()))
                    .unique(true)
                    .build(),
            )
            .build();

        // Serves the paged listing sort.
        let status_date = IndexModel::builder()
            .keys(doc! { "status": 1, date_field: -1 })
            .options(
                IndexOptions::builder()
                    .name(format!("status_{}", kind.date_field()))
                    .build(),
            )
            .build();

        self.db
            .collection::<Document>(kind.collection())
            .create_indexes([unique_key, status_date], None)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to create indexes on {} collection: {}",
                    kind.collection(),
                    e
                );
                AppError::from(e)
            })?;
        tracing::info!(
            "Created indexes on {}.{}",
            kind.collection(),
            kind.key_field()
        );
        Ok(())
    }

    async fn ping(&self) -> Result<(), mongodb::error::Error> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await?;
        Ok(())
    }

    pub fn invoices(&self) -> Collection<Invoice> {
        self.db.collection(Invoice::KIND.collection())
    }

    pub fn transactions(&self) -> Collection<Transaction> {
        self.db.collection(Transaction::KIND.collection())
    }

    pub fn client(&self) -> &MongoClient {
        &self.client
    }
}

/// MongoDB-backed implementation of the storage seam.
#[derive(Clone)]
pub struct MongoStore {
    db: MongoDb,
}

impl MongoStore {
    pub fn new(db: MongoDb) -> Self {
        Self { db }
    }

    fn collection<T: LedgerRecord>(&self) -> Collection<T> {
        self.db.db.collection(T::KIND.collection())
    }
}

fn status_filter(status: Option<&str>) -> Document {
    match status {
        Some(status) => doc! { "status": status },
        None => doc! {},
    }
}

fn bson_number(value: Option<&Bson>) -> f64 {
    match value {
        Some(Bson::Int32(n)) => *n as f64,
        Some(Bson::Int64(n)) => *n as f64,
        Some(Bson::Double(n)) => *n,
        _ => 0.0,
    }
}

#[async_trait]
impl<T: LedgerRecord> RecordStore<T> for MongoStore {
    async fn existing_keys(&self, keys: &[String]) -> Result<HashSet<String>, StoreError> {
        let key_field = T::KIND.key_field();
        let values = self
            .collection::<T>()
            .distinct(key_field, doc! { key_field: { "$in": keys } }, None)
            .await?;
        Ok(values
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect())
    }

    async fn insert_unique(&self, records: Vec<T>) -> Result<InsertOutcome, StoreError> {
        if records.is_empty() {
            return Ok(InsertOutcome::default());
        }

        let options = InsertManyOptions::builder().ordered(false).build();
        match self.collection::<T>().insert_many(&records, options).await {
            Ok(result) => Ok(InsertOutcome {
                inserted: result.inserted_ids.len() as u64,
                duplicates: Vec::new(),
            }),
            Err(err) => {
                let ErrorKind::BulkWrite(failure) = &*err.kind else {
                    return Err(err.into());
                };
                let write_errors = failure.write_errors.as_deref().unwrap_or(&[]);
                if failure.write_concern_error.is_some()
                    || write_errors.iter().any(|e| e.code != DUPLICATE_KEY_CODE)
                {
                    return Err(err.into());
                }

                let duplicates: Vec<String> = write_errors
                    .iter()
                    .filter_map(|e| records.get(e.index))
                    .map(|r| r.key().to_string())
                    .collect();

                tracing::warn!(
                    collection = T::KIND.collection(),
                    conflicts = duplicates.len(),
                    "Duplicate keys rejected during bulk insert"
                );

                Ok(InsertOutcome {
                    inserted: (records.len() - write_errors.len()) as u64,
                    duplicates,
                })
            }
        }
    }

    async fn find_by_keys(&self, keys: &[String]) -> Result<Vec<T>, StoreError> {
        let key_field = T::KIND.key_field();
        let filter = doc! { key_field: { "$in": keys } };
        let cursor = self.collection::<T>().find(filter, None).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn page(&self, skip: u64, limit: u64) -> Result<Vec<T>, StoreError> {
        let date_field = T::KIND.date_field();
        let options = FindOptions::builder()
            .sort(doc! { "status": 1, date_field: -1 })
            .skip(skip)
            .limit(limit as i64)
            .build();
        let cursor = self.collection::<T>().find(doc! {}, options).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn count(&self, status: Option<&str>) -> Result<u64, StoreError> {
        Ok(self
            .collection::<T>()
            .count_documents(status_filter(status), None)
            .await?)
    }

    async fn pending(&self, offset: u64, limit: u64) -> Result<Vec<T>, StoreError> {
        let options = FindOptions::builder()
            .sort(doc! { "createdAt": 1 })
            .skip(offset)
            .limit(limit as i64)
            .build();
        let cursor = self
            .collection::<T>()
            .find(status_filter(Some(STATUS_PENDING)), options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn list(&self, status: Option<&str>) -> Result<Vec<T>, StoreError> {
        let options = FindOptions::builder().sort(doc! { "createdAt": 1 }).build();
        let cursor = self
            .collection::<T>()
            .find(status_filter(status), options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn status_totals(&self) -> Result<Vec<StatusTotal>, StoreError> {
        let pipeline = vec![doc! {
            "$group": {
                "_id": "$status",
                "count": { "$sum": 1 },
                "amount": { "$sum": "$amount" },
            }
        }];
        let mut cursor = self.collection::<T>().aggregate(pipeline, None).await?;

        let mut totals = Vec::new();
        while let Some(bucket) = cursor.try_next().await? {
            let status = bucket
                .get_str("_id")
                .map_err(|e| StoreError::Malformed(format!("status bucket: {}", e)))?
                .to_string();
            totals.push(StatusTotal {
                status,
                count: bson_number(bucket.get("count")) as u64,
                amount: bson_number(bucket.get("amount")),
            });
        }
        Ok(totals)
    }
}

#[async_trait]
impl Ledger for MongoStore {
    async fn settle(
        &self,
        invoice_ids: &[String],
        transaction_ids: &[String],
    ) -> Result<Settled, StoreError> {
        let now = mongodb::bson::DateTime::now();

        let mut session = self.db.client().start_session(None).await?;
        session.start_transaction(None).await?;

        let invoices = self
            .db
            .invoices()
            .update_many_with_session(
                doc! { "invoiceId": { "$in": invoice_ids } },
                doc! {
                    "$set": {
                        "status": STATUS_RECONCILED,
                        "outstandingAmount": 0.0,
                        "updatedAt": now,
                    }
                },
                None,
                &mut session,
            )
            .await;
        let invoices = match invoices {
            Ok(result) => result,
            Err(e) => {
                session.abort_transaction().await.ok();
                return Err(e.into());
            }
        };

        let transactions = self
            .db
            .transactions()
            .update_many_with_session(
                doc! { "transactionId": { "$in": transaction_ids } },
                doc! {
                    "$set": {
                        "status": STATUS_RECONCILED,
                        "updatedAt": now,
                    }
                },
                None,
                &mut session,
            )
            .await;
        let transactions = match transactions {
            Ok(result) => result,
            Err(e) => {
                session.abort_transaction().await.ok();
                return Err(e.into());
            }
        };

        session.commit_transaction().await?;

        Ok(Settled {
            invoices: invoices.matched_count,
            transactions: transactions.matched_count,
        })
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(self.db.ping().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_numbers_accept_every_numeric_width() {
        assert_eq!(bson_number(Some(&Bson::Int32(3))), 3.0);
        assert_eq!(bson_number(Some(&Bson::Int64(4))), 4.0);
        assert_eq!(bson_number(Some(&Bson::Double(2.5))), 2.5);
        assert_eq!(bson_number(None), 0.0);
    }

    #[test]
    fn status_filter_is_empty_without_a_status() {
        assert!(status_filter(None).is_empty());
        assert_eq!(status_filter(Some("Pending")).get_str("status"), Ok("Pending"));
    }
}
