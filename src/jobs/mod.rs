//! Background job scheduling

pub mod catalog_sync;

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::info;

use crate::sync::SyncOrchestrator;

/// Initialize and start the job scheduler
///
/// Only one sync job is registered, so runs never overlap: the schedule is
/// the serialization point for orchestrator invocations.
pub async fn start_scheduler(
    orchestrator: Arc<SyncOrchestrator>,
    schedule: &str,
) -> anyhow::Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let sync = orchestrator.clone();
    let sync_job = Job::new_async(schedule, move |_uuid, _l| {
        let sync = sync.clone();
        Box::pin(async move {
            info!("Running scheduled catalog sync");
            catalog_sync::run_sync(sync).await;
        })
    })?;
    scheduler.add(sync_job).await?;

    scheduler.start().await?;

    info!(schedule = %schedule, "Job scheduler started");
    Ok(scheduler)
}
