//! Fire-and-forget audit recorder
//!
//! Business handlers hand records to a bounded queue and move on; a worker
//! task owns the store writes. Append failures are logged at the worker
//! boundary and never reach the caller, so business operations succeed or
//! fail independently of audit durability.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::models::NewAuditRecord;
use super::store::AuditStore;

/// Handle for appending audit records off the caller's execution path
#[derive(Clone)]
pub struct AuditRecorder {
    tx: mpsc::Sender<NewAuditRecord>,
    store: Arc<dyn AuditStore>,
}

/// Worker half of the recorder; resolves when the last sender is dropped
/// and the queue is drained
pub struct RecorderWorker {
    handle: JoinHandle<()>,
}

impl RecorderWorker {
    /// Wait for the worker to drain and exit
    pub async fn join(self) {
        if let Err(err) = self.handle.await {
            error!(error = %err, "Audit recorder worker panicked");
        }
    }
}

impl AuditRecorder {
    /// Start the recorder with a bounded queue of the given capacity
    pub fn spawn(store: Arc<dyn AuditStore>, capacity: usize) -> (Self, RecorderWorker) {
        let (tx, mut rx) = mpsc::channel::<NewAuditRecord>(capacity);

        let worker_store = Arc::clone(&store);
        let handle = tokio::spawn(async move {
            while let Some(record) = rx.recv().await {
                if let Err(err) = worker_store.append(record).await {
                    // Swallowed deliberately: the triggering operation has
                    // already moved on.
                    warn!(error = %err, "Failed to append audit record");
                }
            }
            info!("Audit recorder drained and stopped");
        });

        (Self { tx, store }, RecorderWorker { handle })
    }

    /// Queue a record for appending. Never blocks and never fails the
    /// caller; when the queue is full the record is dropped with a warning.
    pub fn record(&self, record: NewAuditRecord) {
        if let Err(err) = self.tx.try_send(record) {
            match err {
                mpsc::error::TrySendError::Full(dropped) => warn!(
                    entity_type = %dropped.entity_type,
                    entity_id = %dropped.entity_id,
                    "Audit queue full, record dropped"
                ),
                mpsc::error::TrySendError::Closed(dropped) => warn!(
                    entity_type = %dropped.entity_type,
                    entity_id = %dropped.entity_id,
                    "Audit recorder stopped, record dropped"
                ),
            }
        }
    }

    /// Append a record immediately, outside the queue.
    ///
    /// Used where the record must be committed even if the triggering
    /// business transaction later aborts. Failures are still logged and
    /// swallowed; the caller is never affected.
    pub async fn record_durable(&self, record: NewAuditRecord) {
        if let Err(err) = self.store.append(record).await {
            warn!(error = %err, "Failed to durably append audit record");
        }
    }
}
