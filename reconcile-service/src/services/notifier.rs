//! Background delivery of upload notifications.
//!
//! Handlers enqueue a message and move on; a single worker drains the queue
//! through the configured `EmailProvider`. Each enqueue hands back a ticket
//! that resolves once the worker has tried the delivery.

use super::mailer::{EmailMessage, EmailProvider};
use super::metrics as reconcile_metrics;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use uuid::Uuid;

pub const DEFAULT_QUEUE_SIZE: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    Sent,
    Failed(String),
    /// The worker was gone before the message could be tried.
    Dropped,
}

#[derive(Debug)]
struct NotificationJob {
    id: Uuid,
    kind: &'static str,
    email: EmailMessage,
    done: oneshot::Sender<DeliveryStatus>,
}

/// Handle on one queued notification. Dropping it does not cancel delivery.
#[derive(Debug)]
pub struct NotificationTicket {
    pub id: Uuid,
    rx: oneshot::Receiver<DeliveryStatus>,
}

impl NotificationTicket {
    pub async fn wait(self) -> DeliveryStatus {
        self.rx.await.unwrap_or(DeliveryStatus::Dropped)
    }
}

#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::Sender<NotificationJob>,
}

impl Notifier {
    /// Start the delivery worker. It exits once every `Notifier` clone is dropped.
    pub fn spawn(provider: Arc<dyn EmailProvider>, queue_size: usize) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(queue_size.max(1));
        let worker = tokio::spawn(run_worker(provider, rx));
        (Self { tx }, worker)
    }

    pub async fn enqueue(&self, kind: &'static str, email: EmailMessage) -> NotificationTicket {
        let (done, rx) = oneshot::channel();
        let id = Uuid::new_v4();
        let job = NotificationJob {
            id,
            kind,
            email,
            done,
        };

        if let Err(mpsc::error::SendError(job)) = self.tx.send(job).await {
            tracing::error!(
                notification_id = %job.id,
                kind = job.kind,
                "Notification queue closed, message dropped"
            );
            reconcile_metrics::record_email(job.kind, "dropped");
            // Resolve the ticket right away instead of leaving it pending.
            let _ = job.done.send(DeliveryStatus::Dropped);
        } else {
            tracing::debug!(notification_id = %id, kind, "Notification queued");
        }

        NotificationTicket { id, rx }
    }
}

async fn run_worker(provider: Arc<dyn EmailProvider>, mut rx: mpsc::Receiver<NotificationJob>) {
    tracing::info!("Notification worker started");

    while let Some(job) = rx.recv().await {
        let status = match provider.send(&job.email).await {
            Ok(_) => {
                reconcile_metrics::record_email(job.kind, "sent");
                DeliveryStatus::Sent
            }
            Err(e) => {
                tracing::error!(
                    notification_id = %job.id,
                    kind = job.kind,
                    to = %job.email.to,
                    error = %e,
                    "Failed to deliver notification"
                );
                reconcile_metrics::record_email(job.kind, "failed");
                DeliveryStatus::Failed(e.to_string())
            }
        };
        let _ = job.done.send(status);
    }

    tracing::info!("Channel closed, notification worker exiting");
}
