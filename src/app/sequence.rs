use crate::core::indexer::{build_index, current_membership};
use crate::core::reconciler::reconcile;
use crate::core::{
    GroupingMembership, IdentifierIndex, LibraryPort, ReconcileOutcome, ReferenceEntry,
    ReferenceListPort, Unidentified,
};
use crate::utils::error::{ErrorSeverity, Result, SyncError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::{Duration, Instant};

/// One collection to keep in sync with one list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionJob {
    pub name: String,
    pub list_url: String,
}

impl CollectionJob {
    pub fn new(name: impl Into<String>, list_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            list_url: list_url.into(),
        }
    }
}

/// What happens to the rest of the queue after a collection fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    #[default]
    Stop,
    Continue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportedItem {
    pub identifier: String,
    pub title: String,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionReport {
    pub collection: String,
    pub list_url: String,
    pub existed: bool,
    pub members_before: usize,
    pub list_size: usize,
    pub added: Vec<ReportedItem>,
    pub removed: Vec<ReportedItem>,
    pub missing: Vec<ReferenceEntry>,
    pub dry_run: bool,
    pub duration_ms: u64,
}

impl CollectionReport {
    fn new(
        job: &CollectionJob,
        membership: &GroupingMembership,
        list_size: usize,
        outcome: ReconcileOutcome,
        index: &IdentifierIndex,
        dry_run: bool,
        duration: Duration,
    ) -> Self {
        let describe = |identifier: String| {
            let (title, year) = index
                .get(&identifier)
                .map(|item| (item.title.clone(), item.year))
                .unwrap_or_default();
            ReportedItem {
                identifier,
                title,
                year,
            }
        };

        Self {
            collection: job.name.clone(),
            list_url: job.list_url.clone(),
            existed: membership.exists,
            members_before: membership.len() + membership.skipped,
            list_size,
            added: outcome.added.into_iter().map(describe).collect(),
            removed: outcome.removed.into_iter().map(describe).collect(),
            missing: outcome.missing,
            dry_run,
            duration_ms: duration.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionFailure {
    pub collection: String,
    pub message: String,
    pub severity: ErrorSeverity,
    pub suggestion: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub indexed_items: usize,
    pub unidentified: Vec<Unidentified>,
    pub collections: Vec<CollectionReport>,
    pub failures: Vec<CollectionFailure>,
    /// Collections never attempted because an earlier one failed.
    pub skipped: Vec<String>,
}

impl RunSummary {
    fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            indexed_items: 0,
            unidentified: Vec::new(),
            collections: Vec::new(),
            failures: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn total_added(&self) -> usize {
        self.collections.iter().map(|c| c.added.len()).sum()
    }

    pub fn total_removed(&self) -> usize {
        self.collections.iter().map(|c| c.removed.len()).sum()
    }

    pub fn total_missing(&self) -> usize {
        self.collections.iter().map(|c| c.missing.len()).sum()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn worst_severity(&self) -> Option<ErrorSeverity> {
        self.failures.iter().map(|f| f.severity).max()
    }

    /// Keeps the first index build's unidentified items; rebuilds find the same ones.
    fn record_unidentified(&mut self, unidentified: Vec<Unidentified>) {
        if !self.unidentified.is_empty() {
            return;
        }
        for entry in &unidentified {
            match entry.year {
                Some(year) => tracing::warn!("Missing IMDb id for {} ({})", entry.title, year),
                None => tracing::warn!("Missing IMDb id for {}", entry.title),
            }
        }
        self.unidentified = unidentified;
    }
}

/// Runs every configured collection through index, membership, list fetch
/// and reconciliation, one after another.
pub struct SyncSequence<L, R> {
    library: L,
    lists: R,
    jobs: Vec<CollectionJob>,
    failure_policy: FailurePolicy,
    reindex_per_collection: bool,
    dry_run: bool,
}

impl<L: LibraryPort, R: ReferenceListPort> SyncSequence<L, R> {
    pub fn new(library: L, lists: R) -> Self {
        Self {
            library,
            lists,
            jobs: Vec::new(),
            failure_policy: FailurePolicy::default(),
            reindex_per_collection: false,
            dry_run: false,
        }
    }

    pub fn with_jobs(mut self, jobs: impl IntoIterator<Item = CollectionJob>) -> Self {
        self.jobs.extend(jobs);
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_reindex_per_collection(mut self, enabled: bool) -> Self {
        self.reindex_per_collection = enabled;
        self
    }

    /// Marks reports as dry-run; the caller supplies a non-mutating library.
    pub fn with_dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Executes the queue in order.
    ///
    /// Only a failure while building the shared index is returned as an
    /// error; per-collection failures are recorded in the summary.
    pub async fn execute_all(&self) -> Result<RunSummary> {
        let mut summary = RunSummary::new();

        let shared_index = if self.reindex_per_collection {
            None
        } else {
            let (index, unidentified) = build_index(&self.library).await?;
            summary.indexed_items = index.len();
            summary.record_unidentified(unidentified);
            Some(index)
        };

        for (position, job) in self.jobs.iter().enumerate() {
            tracing::info!("Updating '{}' collection", job.name);

            match self.sync_collection(job, shared_index.as_ref(), &mut summary).await {
                Ok(report) => {
                    tracing::info!(
                        "✅ '{}' synced (added: {}, removed: {}, missing: {}, duration: {}ms)",
                        report.collection,
                        report.added.len(),
                        report.removed.len(),
                        report.missing.len(),
                        report.duration_ms
                    );
                    summary.collections.push(report);
                }
                Err(e) => {
                    let error = SyncError::CollectionFailed {
                        collection: job.name.clone(),
                        source: Box::new(e),
                    };
                    tracing::error!("❌ {}", error);
                    summary.failures.push(CollectionFailure {
                        collection: job.name.clone(),
                        message: error.user_friendly_message(),
                        severity: error.severity(),
                        suggestion: error.recovery_suggestion(),
                    });

                    if self.failure_policy == FailurePolicy::Stop {
                        summary.skipped = self.jobs[position + 1..]
                            .iter()
                            .map(|j| j.name.clone())
                            .collect();
                        if !summary.skipped.is_empty() {
                            tracing::warn!(
                                "⏭️ Skipping {} remaining collections",
                                summary.skipped.len()
                            );
                        }
                        break;
                    }
                }
            }
        }

        summary.finished_at = Some(Utc::now());
        Ok(summary)
    }

    async fn sync_collection(
        &self,
        job: &CollectionJob,
        shared_index: Option<&IdentifierIndex>,
        summary: &mut RunSummary,
    ) -> Result<CollectionReport> {
        let start_time = Instant::now();

        let rebuilt;
        let index = match shared_index {
            Some(index) => index,
            None => {
                let (index, unidentified) = build_index(&self.library).await?;
                summary.indexed_items = index.len();
                summary.record_unidentified(unidentified);
                rebuilt = index;
                &rebuilt
            }
        };

        let membership = current_membership(&self.library, index, &job.name).await?;

        let reference = self.lists.fetch_list(&job.list_url).await?;
        tracing::debug!("Fetched {} list entries from {}", reference.len(), job.list_url);

        let list_size = reference.len();
        let outcome = reconcile(&self.library, &job.name, index, &membership, &reference).await?;

        Ok(CollectionReport::new(
            job,
            &membership,
            list_size,
            outcome,
            index,
            self.dry_run,
            start_time.elapsed(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unidentified(title: &str) -> Unidentified {
        Unidentified {
            title: title.to_string(),
            year: None,
        }
    }

    #[test]
    fn test_unidentified_items_recorded_once_across_rebuilds() {
        let mut summary = RunSummary::new();

        summary.record_unidentified(vec![unidentified("Home Movie")]);
        summary.record_unidentified(vec![unidentified("Home Movie")]);
        summary.record_unidentified(Vec::new());

        assert_eq!(summary.unidentified, vec![unidentified("Home Movie")]);
    }
}
