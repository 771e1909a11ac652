//! Completion tracking for fire-and-forget writes
//!
//! A [`PendingTask`] wraps one in-flight sink write. The [`CommitTracker`]
//! holds them in issuance order and drives them to completion when
//! `commit` is awaited. Tasks only make progress while a tracker future is
//! being polled; nothing runs them in the background.

use super::error::{LoggerError, Result};
use std::fmt;
use std::future::{poll_fn, Future};
use std::pin::Pin;
use std::task::{Context, Poll};

/// The write a task drives
pub type WriteFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Registered, never polled
    NotStarted,
    /// Polled once and suspended
    Running,
    /// Polled again and still suspended
    Rescheduled,
    Completed,
    Erred,
}

impl TaskState {
    pub fn is_finished(self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Erred)
    }
}

pub struct PendingTask {
    id: u64,
    binding: usize,
    sink: String,
    state: TaskState,
    future: WriteFuture,
}

impl PendingTask {
    pub fn new(id: u64, binding: usize, sink: impl Into<String>, future: WriteFuture) -> Self {
        Self {
            id,
            binding,
            sink: sink.into(),
            state: TaskState::NotStarted,
            future,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Index of the writer binding the write belongs to
    pub fn binding(&self) -> usize {
        self.binding
    }

    /// Name of the sink the write goes to
    pub fn sink(&self) -> &str {
        &self.sink
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    fn poll_step(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        match self.future.as_mut().poll(cx) {
            Poll::Ready(Ok(())) => {
                self.state = TaskState::Completed;
                Poll::Ready(Ok(()))
            }
            Poll::Ready(Err(err)) => {
                self.state = TaskState::Erred;
                Poll::Ready(Err(err))
            }
            Poll::Pending => {
                self.state = match self.state {
                    TaskState::NotStarted => TaskState::Running,
                    _ => TaskState::Rescheduled,
                };
                Poll::Pending
            }
        }
    }
}

impl fmt::Debug for PendingTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingTask")
            .field("id", &self.id)
            .field("binding", &self.binding)
            .field("sink", &self.sink)
            .field("state", &self.state)
            .finish()
    }
}

/// Set of outstanding writes for one logger
#[derive(Debug, Default)]
pub struct CommitTracker {
    pending: Vec<PendingTask>,
    /// Errors of erred tasks not yet reported by a commit
    errors: Vec<LoggerError>,
    /// Bindings whose writes erred during the latest commit
    erred_bindings: Vec<usize>,
    next_id: u64,
}

impl CommitTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a write; returns the task id
    pub fn track(&mut self, binding: usize, sink: impl Into<String>, future: WriteFuture) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.pending.push(PendingTask::new(id, binding, sink, future));
        id
    }

    /// Outstanding task count
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.errors.is_empty()
    }

    /// `(id, state)` of every outstanding task in issuance order
    pub fn states(&self) -> Vec<(u64, TaskState)> {
        self.pending.iter().map(|task| (task.id, task.state)).collect()
    }

    /// Poll every outstanding task once, in issuance order
    ///
    /// Finished tasks leave the set; erred tasks leave their error behind.
    /// Ready once the set is empty.
    pub fn poll_commit(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        let errors = &mut self.errors;
        let erred_bindings = &mut self.erred_bindings;
        self.pending.retain_mut(|task| match task.poll_step(cx) {
            Poll::Ready(Ok(())) => false,
            Poll::Ready(Err(err)) => {
                errors.push(err);
                if !erred_bindings.contains(&task.binding) {
                    erred_bindings.push(task.binding);
                }
                false
            }
            Poll::Pending => true,
        });

        if !self.pending.is_empty() {
            return Poll::Pending;
        }
        Poll::Ready(self.take_failure())
    }

    /// Drive every outstanding write to completion
    ///
    /// Returns immediately when nothing is outstanding. If any task erred,
    /// returns `AsyncFailure` carrying the first error once all others have
    /// finished.
    pub async fn commit(&mut self) -> Result<()> {
        self.erred_bindings.clear();
        if self.is_empty() {
            return Ok(());
        }
        poll_fn(|cx| self.poll_commit(cx)).await
    }

    /// Bindings whose writes erred during the latest commit
    pub fn erred_bindings(&self) -> &[usize] {
        &self.erred_bindings
    }

    fn take_failure(&mut self) -> Result<()> {
        if self.errors.is_empty() {
            return Ok(());
        }
        let failed = self.errors.len();
        let first = self.errors.remove(0);
        self.errors.clear();
        Err(LoggerError::async_failure(failed, first))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::task::{Wake, Waker};

    struct NoopWake;

    impl Wake for NoopWake {
        fn wake(self: Arc<Self>) {}
    }

    /// Suspends `polls` times before resolving to `result`
    struct Suspend {
        polls: usize,
        result: Option<Result<()>>,
    }

    impl Future for Suspend {
        type Output = Result<()>;

        fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
            if self.polls == 0 {
                return Poll::Ready(self.result.take().unwrap_or(Ok(())));
            }
            self.polls -= 1;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }

    fn suspend(polls: usize, result: Result<()>) -> WriteFuture {
        Box::pin(Suspend {
            polls,
            result: Some(result),
        })
    }

    #[tokio::test]
    async fn test_commit_empty_returns_immediately() {
        let mut tracker = CommitTracker::new();
        tracker.commit().await.unwrap();
        assert_eq!(tracker.pending(), 0);
    }

    #[test]
    fn test_state_transitions() {
        let mut tracker = CommitTracker::new();
        tracker.track(0, "slow", suspend(2, Ok(())));
        tracker.track(1, "fast", suspend(0, Ok(())));
        assert_eq!(
            tracker.states(),
            vec![(0, TaskState::NotStarted), (1, TaskState::NotStarted)]
        );

        let waker = Waker::from(Arc::new(NoopWake));
        let mut cx = Context::from_waker(&waker);

        assert!(tracker.poll_commit(&mut cx).is_pending());
        assert_eq!(tracker.states(), vec![(0, TaskState::Running)]);

        assert!(tracker.poll_commit(&mut cx).is_pending());
        assert_eq!(tracker.states(), vec![(0, TaskState::Rescheduled)]);

        assert!(matches!(tracker.poll_commit(&mut cx), Poll::Ready(Ok(()))));
        assert_eq!(tracker.pending(), 0);
    }

    #[tokio::test]
    async fn test_erred_task_is_surfaced() {
        let mut tracker = CommitTracker::new();
        tracker.track(0, "a", suspend(1, Ok(())));
        tracker.track(1, "b", suspend(0, Err(LoggerError::writer("disk full"))));
        tracker.track(2, "c", suspend(3, Err(LoggerError::writer("late"))));

        let err = tracker.commit().await.unwrap_err();
        match err {
            LoggerError::AsyncFailure { failed, source } => {
                assert_eq!(failed, 2);
                assert!(source.to_string().contains("disk full"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(tracker.pending(), 0);
        assert_eq!(tracker.erred_bindings(), &[1, 2]);

        tracker.commit().await.unwrap();
        assert!(tracker.erred_bindings().is_empty());
    }

    #[tokio::test]
    async fn test_commit_waits_for_all() {
        let mut tracker = CommitTracker::new();
        for polls in [3, 0, 1] {
            tracker.track(0, "sink", suspend(polls, Ok(())));
        }
        tracker.commit().await.unwrap();
        assert_eq!(tracker.pending(), 0);
    }
}
