pub mod database;
pub mod error;
pub mod importer;
pub mod mailer;
pub mod metrics;
pub mod notifier;
pub mod reconciler;
pub mod reports;
pub mod staging;
pub mod store;
pub mod validation;

pub use database::{MongoDb, MongoStore};
pub use error::ReconcileError;
pub use mailer::{EmailMessage, EmailProvider, MailError, MockEmailProvider, SmtpMailer};
pub use self::metrics::{get_metrics, init_metrics};
pub use notifier::{DeliveryStatus, NotificationTicket, Notifier};
pub use staging::StagingArea;
pub use store::{Ledger, MemoryStore, RecordStore, StoreError, Stores};
