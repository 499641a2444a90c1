//! In-memory registry of in-flight jobs.

use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

use super::error::VideoError;
use super::types::{JobId, JobKind, JobSnapshot, JobState};
use crate::engine::{ProcessHandle, ProgressRecord};

/// State kept for one in-flight job.
#[derive(Debug)]
struct JobEntry {
    kind: JobKind,
    source_url: String,
    state: JobState,
    progress: ProgressRecord,
    handle: Option<ProcessHandle>,
    cancel_requested: bool,
    started_at: chrono::DateTime<Utc>,
}

impl JobEntry {
    fn snapshot(&self, id: JobId) -> JobSnapshot {
        JobSnapshot {
            id,
            kind: self.kind,
            source_url: self.source_url.clone(),
            state: self.state,
            progress: self.progress.clone(),
            pid: self.handle.as_ref().and_then(ProcessHandle::pid),
            started_at: self.started_at,
        }
    }
}

/// Process handles and progress of every in-flight job, keyed by id.
///
/// Entries are inserted when a job starts and removed when it reaches a
/// terminal state. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct JobRegistry {
    next_id: Arc<AtomicU64>,
    jobs: Arc<RwLock<HashMap<JobId, JobEntry>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh job id and registers the job as `Created`.
    pub fn register(&self, kind: JobKind, source_url: &str) -> JobId {
        let id = JobId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.jobs.write().insert(
            id,
            JobEntry {
                kind,
                source_url: source_url.to_string(),
                state: JobState::Created,
                progress: ProgressRecord::default(),
                handle: None,
                cancel_requested: false,
                started_at: Utc::now(),
            },
        );
        debug!(job_id = %id, kind = ?kind, "Registered job");
        id
    }

    pub(crate) fn set_state(&self, id: JobId, state: JobState) {
        if let Some(entry) = self.jobs.write().get_mut(&id) {
            entry.state = state;
        }
    }

    /// Gives the job ownership of its running process.
    ///
    /// Replaces (and thereby stops) a previous process of the same job. Fails
    /// with `Cancelled` if the job was cancelled before the process started;
    /// the handle is dropped, which stops the process.
    pub(crate) fn attach_process(&self, id: JobId, handle: ProcessHandle) -> Result<(), VideoError> {
        let mut jobs = self.jobs.write();
        let entry = jobs.get_mut(&id).ok_or(VideoError::NotFound(id))?;
        if entry.cancel_requested {
            return Err(VideoError::Cancelled);
        }
        entry.handle = Some(handle);
        Ok(())
    }

    /// Releases the job's process handle, stopping the process if it still runs.
    pub(crate) fn detach_process(&self, id: JobId) {
        let handle = self
            .jobs
            .write()
            .get_mut(&id)
            .and_then(|entry| entry.handle.take());
        drop(handle);
    }

    pub(crate) fn update_progress(&self, id: JobId, progress: ProgressRecord) {
        if let Some(entry) = self.jobs.write().get_mut(&id) {
            entry.progress = progress;
        }
    }

    /// Removes a job that reached a terminal state.
    pub(crate) fn remove(&self, id: JobId) -> bool {
        let removed = self.jobs.write().remove(&id);
        if removed.is_some() {
            debug!(job_id = %id, "Removed job");
        }
        removed.is_some()
    }

    /// Ties the job's registration to the returned guard.
    ///
    /// Dropping the guard removes the job, which also stops any process it
    /// still owns. This holds when the future driving the job is dropped.
    pub(crate) fn guard(&self, id: JobId) -> JobGuard {
        JobGuard {
            registry: self.clone(),
            id,
        }
    }

    /// Stops an in-flight job. It then fails with `Cancelled`.
    pub fn cancel(&self, id: JobId) -> Result<(), VideoError> {
        let mut jobs = self.jobs.write();
        let entry = jobs.get_mut(&id).ok_or(VideoError::NotFound(id))?;
        entry.cancel_requested = true;
        if let Some(handle) = entry.handle.as_mut() {
            handle.kill();
        }
        debug!(job_id = %id, "Cancellation requested");
        Ok(())
    }

    pub fn is_cancelled(&self, id: JobId) -> bool {
        self.jobs
            .read()
            .get(&id)
            .map(|entry| entry.cancel_requested)
            .unwrap_or(false)
    }

    /// Last reported progress of a job.
    pub fn progress(&self, id: JobId) -> Result<ProgressRecord, VideoError> {
        self.jobs
            .read()
            .get(&id)
            .map(|entry| entry.progress.clone())
            .ok_or(VideoError::NotFound(id))
    }

    pub fn job(&self, id: JobId) -> Result<JobSnapshot, VideoError> {
        self.jobs
            .read()
            .get(&id)
            .map(|entry| entry.snapshot(id))
            .ok_or(VideoError::NotFound(id))
    }

    /// All in-flight jobs, oldest first.
    pub fn jobs(&self) -> Vec<JobSnapshot> {
        let mut snapshots: Vec<_> = self
            .jobs
            .read()
            .iter()
            .map(|(id, entry)| entry.snapshot(*id))
            .collect();
        snapshots.sort_by_key(|s| s.id);
        snapshots
    }

    pub fn len(&self) -> usize {
        self.jobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.read().is_empty()
    }
}

/// Removes its job from the registry when dropped.
#[derive(Debug)]
pub(crate) struct JobGuard {
    registry: JobRegistry,
    id: JobId,
}

impl Drop for JobGuard {
    fn drop(&mut self) {
        self.registry.remove(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineProcess;
    use tokio::sync::{mpsc, oneshot};

    fn handle() -> (ProcessHandle, oneshot::Receiver<()>) {
        let (_events_tx, events_rx) = mpsc::channel(1);
        let (kill_tx, kill_rx) = oneshot::channel();
        let (handle, _) = EngineProcess::new(Some(1234), events_rx, kill_tx).into_parts();
        (handle, kill_rx)
    }

    #[test]
    fn test_ids_are_never_reused() {
        let registry = JobRegistry::new();
        let first = registry.register(JobKind::Screenshot, "file:///a.avi");
        assert!(registry.remove(first));
        let second = registry.register(JobKind::Screenshot, "file:///a.avi");
        assert_ne!(first, second);
        assert!(matches!(registry.progress(first), Err(VideoError::NotFound(id)) if id == first));
        assert!(matches!(registry.cancel(first), Err(VideoError::NotFound(_))));
    }

    #[test]
    fn test_progress_is_per_job() {
        let registry = JobRegistry::new();
        let a = registry.register(JobKind::Conversion, "file:///a.avi");
        let b = registry.register(JobKind::Conversion, "file:///b.avi");

        registry.update_progress(
            a,
            ProgressRecord {
                percent: 40.0,
                ..Default::default()
            },
        );

        assert_eq!(registry.progress(a).unwrap().percent, 40.0);
        assert_eq!(registry.progress(b).unwrap().percent, 0.0);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_snapshot_reports_state_and_pid() {
        let registry = JobRegistry::new();
        let id = registry.register(JobKind::Conversion, "https://example.com/a.avi");
        let (handle, _kill_rx) = handle();
        registry.attach_process(id, handle).unwrap();
        registry.set_state(id, JobState::Probing);

        let snapshot = registry.job(id).unwrap();
        assert_eq!(snapshot.kind, JobKind::Conversion);
        assert_eq!(snapshot.state, JobState::Probing);
        assert_eq!(snapshot.pid, Some(1234));
        assert_eq!(registry.jobs().len(), 1);
    }

    #[test]
    fn test_guard_removes_job_and_stops_process() {
        let registry = JobRegistry::new();
        let id = registry.register(JobKind::Screenshot, "file:///a.avi");
        let guard = registry.guard(id);
        let (handle, mut kill_rx) = handle();
        registry.attach_process(id, handle).unwrap();

        drop(guard);
        assert!(registry.is_empty());
        assert!(matches!(
            kill_rx.try_recv(),
            Err(oneshot::error::TryRecvError::Closed)
        ));
    }

    #[test]
    fn test_cancel_kills_attached_process() {
        let registry = JobRegistry::new();
        let id = registry.register(JobKind::Screenshot, "file:///a.avi");
        let (handle, mut kill_rx) = handle();
        registry.attach_process(id, handle).unwrap();

        registry.cancel(id).unwrap();
        assert!(kill_rx.try_recv().is_ok());
        assert!(registry.is_cancelled(id));
    }

    #[test]
    fn test_cancel_before_start_refuses_process() {
        let registry = JobRegistry::new();
        let id = registry.register(JobKind::Conversion, "file:///a.avi");
        registry.cancel(id).unwrap();

        let (handle, mut kill_rx) = handle();
        assert!(matches!(
            registry.attach_process(id, handle),
            Err(VideoError::Cancelled)
        ));
        // The refused handle was dropped.
        assert!(matches!(
            kill_rx.try_recv(),
            Err(oneshot::error::TryRecvError::Closed)
        ));
    }

    #[test]
    fn test_detach_stops_process() {
        let registry = JobRegistry::new();
        let id = registry.register(JobKind::Conversion, "file:///a.avi");
        let (handle, mut kill_rx) = handle();
        registry.attach_process(id, handle).unwrap();
        registry.detach_process(id);
        assert!(registry.job(id).unwrap().pid.is_none());
        assert!(kill_rx.try_recv().is_err());
    }
}
