//! Catalog synchronization job

use std::sync::Arc;

use tracing::{info, warn};

use crate::sync::{SyncOrchestrator, SyncStatus};

/// Run one full catalog sync and log the outcome. Partial failures arrive
/// as summary warnings, never as errors.
pub async fn run_sync(orchestrator: Arc<SyncOrchestrator>) {
    let summary = orchestrator.run_full_sync().await;

    match summary.status {
        SyncStatus::Completed => {
            info!(written = summary.total_written(), "Catalog sync completed");
        }
        SyncStatus::CompletedWithWarnings => {
            warn!(
                written = summary.total_written(),
                warnings = summary.warning_count(),
                "Catalog sync completed with warnings"
            );
        }
        SyncStatus::Aborted => {
            warn!(
                written = summary.total_written(),
                "Catalog sync aborted; partial progress retained"
            );
        }
    }
}
