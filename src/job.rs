//! Job state machine.
//!
//! ```text
//! DISCOVERING ──► PENDING ──► IN_PROGRESS ──► COMPLETED
//!       │             │             │
//!       └─────────────┴─────────────┴──► FAILED
//! ```
//!
//! Transitions are applied through [`apply`] — a pure function from
//! `(job, event)` to an updated job or a [`HarvestError::Conflict`] — never
//! by mutating status fields in place. Progress fields only ever grow.

use std::collections::BTreeSet;

use chrono::Utc;

use crate::error::{HarvestError, Result};
use crate::model::{JobStatus, ScrapeJob};

/// Everything that can happen to a job over its lifetime.
#[derive(Debug, Clone)]
pub enum JobEvent {
    /// Discovery found more URLs; merged into the discovered set.
    DiscoveryProgress { discovered: BTreeSet<String> },
    /// Discovery finished (or degraded with a fallback set); job becomes
    /// selectable.
    DiscoveryFinished { discovered: BTreeSet<String> },
    /// The operator (or auto-selector) picked the URLs to ingest.
    SelectionSubmitted { selected: BTreeSet<String> },
    /// One URL was scraped and persisted successfully.
    PageScraped { url: String },
    /// Ingestion ran to the end of the selection.
    IngestionFinished,
    /// Terminal failure, from any non-terminal state.
    Failed { message: String },
}

fn conflict(job: &ScrapeJob, event: &JobEvent) -> HarvestError {
    HarvestError::Conflict(format!(
        "job {} in state {:?} cannot accept {:?}",
        job.id, job.status, std::mem::discriminant(event)
    ))
}

/// Apply `event` to `job`, returning the updated job.
///
/// Rejects backward transitions, events in the wrong state, selections
/// outside the discovered set, and anything that would shrink a progress
/// field.
pub fn apply(mut job: ScrapeJob, event: JobEvent) -> Result<ScrapeJob> {
    match event {
        JobEvent::DiscoveryProgress { discovered } => {
            if job.status != JobStatus::Discovering {
                return Err(conflict(&job, &JobEvent::DiscoveryProgress { discovered }));
            }
            job.discovered_urls.extend(discovered);
            job.total_urls = job.total_urls.max(job.discovered_urls.len());
            Ok(job)
        }
        JobEvent::DiscoveryFinished { discovered } => {
            if job.status != JobStatus::Discovering {
                return Err(conflict(&job, &JobEvent::DiscoveryFinished { discovered }));
            }
            job.discovered_urls.extend(discovered);
            // The base URL is part of the discovered set even when every
            // fetch failed; downstream selection must never be empty-handed.
            job.discovered_urls.insert(job.base_url.clone());
            job.total_urls = job.total_urls.max(job.discovered_urls.len());
            job.status = JobStatus::Pending;
            Ok(job)
        }
        JobEvent::SelectionSubmitted { selected } => {
            if job.status != JobStatus::Pending {
                return Err(conflict(&job, &JobEvent::SelectionSubmitted { selected }));
            }
            if selected.is_empty() {
                return Err(HarvestError::Conflict(format!(
                    "job {}: selection is empty",
                    job.id
                )));
            }
            let unknown: Vec<&String> = selected
                .iter()
                .filter(|u| !job.discovered_urls.contains(*u))
                .collect();
            if !unknown.is_empty() {
                return Err(HarvestError::Conflict(format!(
                    "job {}: {} selected URL(s) were never discovered (first: {})",
                    job.id,
                    unknown.len(),
                    unknown[0]
                )));
            }
            job.selected_urls = selected;
            job.status = JobStatus::InProgress;
            Ok(job)
        }
        JobEvent::PageScraped { url } => {
            if job.status != JobStatus::InProgress {
                return Err(conflict(&job, &JobEvent::PageScraped { url }));
            }
            if job.scraped_urls.insert(url) {
                job.scraped_count += 1;
            }
            debug_assert!(job.scraped_count <= job.selected_urls.len());
            Ok(job)
        }
        JobEvent::IngestionFinished => {
            if job.status != JobStatus::InProgress {
                return Err(conflict(&job, &JobEvent::IngestionFinished));
            }
            job.status = JobStatus::Completed;
            job.completed_at = Some(Utc::now());
            Ok(job)
        }
        JobEvent::Failed { message } => {
            if job.status.is_terminal() {
                return Err(conflict(&job, &JobEvent::Failed { message }));
            }
            job.status = JobStatus::Failed;
            job.error_message = Some(message);
            job.completed_at = Some(Utc::now());
            Ok(job)
        }
    }
}
