//! Fire-and-forget job queue. Producers enqueue and return immediately;
//! the worker drains the channel independently. No ordering guarantee
//! between enqueue and processing is required or provided.

use async_trait::async_trait;
use std::sync::OnceLock;
use tokio::sync::mpsc;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub enum Job {
    InviteEmail { tenant_id: Uuid, invite_id: Uuid },
    TaskAssigned { tenant_id: Uuid, task_id: Uuid, assignee_id: Uuid },
}

#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, job: &Job) -> anyhow::Result<()>;
}

/// Delivery stand-in: logs what a mail/notification provider would send.
pub struct LogNotifier;

#[async_trait]
impl JobHandler for LogNotifier {
    async fn handle(&self, job: &Job) -> anyhow::Result<()> {
        match job {
            Job::InviteEmail { tenant_id, invite_id } => {
                tracing::info!("Sending invite email (tenant={}, invite={})", tenant_id, invite_id);
            }
            Job::TaskAssigned { tenant_id, task_id, assignee_id } => {
                tracing::info!(
                    "Notifying assignee {} of task {} (tenant={})",
                    assignee_id,
                    task_id,
                    tenant_id
                );
            }
        }
        Ok(())
    }
}

static SENDER: OnceLock<mpsc::UnboundedSender<Job>> = OnceLock::new();

/// Start the queue worker. Safe to call once at startup; later calls are
/// no-ops.
pub fn start() {
    let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
    if SENDER.set(tx).is_err() {
        return;
    }

    tokio::spawn(async move {
        let handler = LogNotifier;
        while let Some(job) = rx.recv().await {
            if let Err(e) = handler.handle(&job).await {
                tracing::error!("Queue job failed: {e:?}");
            }
            crate::metrics::record_queue_job();
        }
    });
}

/// Enqueue-and-return. Jobs enqueued before `start` are dropped with a
/// warning rather than blocking the request path.
pub fn enqueue(job: Job) {
    match SENDER.get() {
        Some(tx) => {
            if tx.send(job).is_err() {
                tracing::warn!("Queue worker is gone; dropping job");
            }
        }
        None => {
            tracing::debug!("Queue not started; dropping job {:?}", job);
        }
    }
}
