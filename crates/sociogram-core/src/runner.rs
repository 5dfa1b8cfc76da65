//! Fail-fast, strictly sequential statement runner.
//!
//! ```text
//! NotStarted ──► Running(0) ──► Running(1) ──► … ──► Completed
//!                    │              │
//!                    └──────────────┴──► Halted(index, reason)
//! ```
//!
//! Exactly one submission is in flight at any time. The first failure moves
//! the runner to `Halted`; nothing after the failing operation is submitted,
//! retried or rolled back.

use serde::Serialize;

use crate::channel::{ChannelConnector, ChannelError, ExecutionChannel};
use crate::operation::Operation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    /// Operation `index` has been submitted and its outcome is pending.
    Running { index: usize },
    Completed,
    Halted { index: usize, reason: ChannelError },
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Halted { .. })
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Receives per-operation progress, in order.
///
/// `on_attempt` fires before the submission is awaited; exactly one of
/// `on_success` / `on_failure` follows it.
pub trait RunObserver: Send {
    fn on_attempt(&mut self, _index: usize, _operation: &Operation) {}

    fn on_success(&mut self, index: usize, operation: &Operation);

    fn on_failure(&mut self, index: usize, operation: &Operation, error: &ChannelError);
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl RunObserver for NullObserver {
    fn on_success(&mut self, _index: usize, _operation: &Operation) {}

    fn on_failure(&mut self, _index: usize, _operation: &Operation, _error: &ChannelError) {}
}

/// Outcome of one attempted operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationReport {
    pub index: usize,
    pub description: String,
    /// `None` on success, the failure text otherwise.
    pub error: Option<String>,
}

impl OperationReport {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// What the caller gets back after a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub state: RunState,
    pub submissions: usize,
    pub total_operations: usize,
    pub outcomes: Vec<OperationReport>,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|r| r.succeeded()).count()
    }

    /// Operations never submitted because the run halted.
    pub fn skipped(&self) -> usize {
        self.total_operations - self.submissions
    }

    pub fn halt_reason(&self) -> Option<&ChannelError> {
        match &self.state {
            RunState::Halted { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct StatementRunner {
    state: RunState,
    submissions: usize,
    outcomes: Vec<OperationReport>,
}

impl Default for StatementRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementRunner {
    pub fn new() -> Self {
        Self {
            state: RunState::NotStarted,
            submissions: 0,
            outcomes: Vec::new(),
        }
    }

    /// Current state; terminal once `run` has returned.
    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Execute `operations` in order against `channel`, stopping at the first
    /// failure.
    ///
    /// Every submission outcome is observed and recorded; nothing escapes as
    /// an `Err`. The terminal state is in the returned report and stays on the
    /// runner. Running again starts over from `NotStarted`.
    pub async fn run<C, O>(
        &mut self,
        operations: &[Operation],
        channel: &mut C,
        observer: &mut O,
    ) -> RunReport
    where
        C: ExecutionChannel + ?Sized,
        O: RunObserver + ?Sized,
    {
        *self = Self::new();
        for (index, operation) in operations.iter().enumerate() {
            self.state = RunState::Running { index };
            observer.on_attempt(index, operation);
            tracing::debug!(index, description = %operation.description, "submitting");

            self.submissions += 1;
            match channel.submit(&operation.statement).await {
                Ok(()) => {
                    observer.on_success(index, operation);
                    self.outcomes.push(OperationReport {
                        index,
                        description: operation.description.clone(),
                        error: None,
                    });
                }
                Err(error) => {
                    tracing::warn!(
                        index,
                        description = %operation.description,
                        %error,
                        "statement failed; halting run"
                    );
                    observer.on_failure(index, operation, &error);
                    self.outcomes.push(OperationReport {
                        index,
                        description: operation.description.clone(),
                        error: Some(error.to_string()),
                    });
                    self.state = RunState::Halted {
                        index,
                        reason: error,
                    };
                    return self.finish(operations.len());
                }
            }
        }

        self.state = RunState::Completed;
        self.finish(operations.len())
    }

    fn finish(&self, total_operations: usize) -> RunReport {
        tracing::info!(
            submissions = self.submissions,
            total = total_operations,
            completed = self.state.is_completed(),
            "run finished"
        );
        RunReport {
            state: self.state.clone(),
            submissions: self.submissions,
            total_operations,
            outcomes: self.outcomes.clone(),
        }
    }
}

/// Open a channel, run `operations`, then close the channel whatever the
/// outcome.
///
/// Only a failure to open is returned as `Err`; a failed statement is a
/// `Halted` report. A close failure is logged and does not change the report.
pub async fn execute_scoped<K, O>(
    connector: &K,
    operations: &[Operation],
    observer: &mut O,
) -> Result<RunReport, ChannelError>
where
    K: ChannelConnector + ?Sized,
    O: RunObserver + ?Sized,
{
    let mut channel = connector.open().await?;
    let report = StatementRunner::new()
        .run(operations, &mut channel, observer)
        .await;
    if let Err(error) = channel.close().await {
        tracing::warn!(%error, "failed to close execution channel");
    }
    Ok(report)
}
