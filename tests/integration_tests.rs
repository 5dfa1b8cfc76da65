//! End-to-end tests: generator → runner → channel.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use sociogram_core::{
    construct_sociogram, execute_scoped, summarize, ChannelConnector, ChannelError,
    ExecutionChannel, Operation, OperationKind, RunObserver, RunState, StatementRunner,
};

/// Shared view of what the channel saw, surviving the channel itself.
#[derive(Debug, Default)]
struct Journal {
    opened: usize,
    closed: usize,
    submitted: Vec<String>,
}

/// Fails the first statement that mentions `poison`.
struct SpyChannel {
    journal: Arc<Mutex<Journal>>,
    poison: Option<String>,
}

#[async_trait]
impl ExecutionChannel for SpyChannel {
    async fn submit(&mut self, statement: &str) -> Result<(), ChannelError> {
        self.journal
            .lock()
            .unwrap()
            .submitted
            .push(statement.to_string());
        match &self.poison {
            Some(p) if statement.contains(p.as_str()) => Err(ChannelError::Rejected {
                status: 409,
                message: format!("conflict on {p}"),
            }),
            _ => Ok(()),
        }
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        self.journal.lock().unwrap().closed += 1;
        Ok(())
    }
}

struct SpyConnector {
    journal: Arc<Mutex<Journal>>,
    poison: Option<String>,
}

impl SpyConnector {
    fn new(poison: Option<&str>) -> Self {
        Self {
            journal: Arc::default(),
            poison: poison.map(str::to_string),
        }
    }
}

#[async_trait]
impl ChannelConnector for SpyConnector {
    type Channel = SpyChannel;

    async fn open(&self) -> Result<Self::Channel, ChannelError> {
        self.journal.lock().unwrap().opened += 1;
        Ok(SpyChannel {
            journal: self.journal.clone(),
            poison: self.poison.clone(),
        })
    }
}

#[derive(Default)]
struct Tally {
    attempts: Vec<usize>,
    successes: usize,
    failures: usize,
}

impl RunObserver for Tally {
    fn on_attempt(&mut self, index: usize, _operation: &Operation) {
        self.attempts.push(index);
    }

    fn on_success(&mut self, _index: usize, _operation: &Operation) {
        self.successes += 1;
    }

    fn on_failure(&mut self, _index: usize, _operation: &Operation, _error: &ChannelError) {
        self.failures += 1;
    }
}

fn roster() -> Vec<String> {
    [
        "Hazel", "Madeline", "Isaac", "Shelia", "Christy", "Thelma", "Kara", "Johnnie", "Ron",
        "Frances", "Eddie", "Mona",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[tokio::test]
async fn generated_plan_loads_completely_and_closes_channel() {
    let operations = construct_sociogram(&roster(), &mut StdRng::seed_from_u64(2024));
    let connector = SpyConnector::new(None);
    let mut tally = Tally::default();

    let report = execute_scoped(&connector, &operations, &mut tally)
        .await
        .unwrap();

    assert_eq!(report.state, RunState::Completed);
    assert_eq!(report.submissions, operations.len());
    assert_eq!(tally.successes, operations.len());
    assert_eq!(tally.failures, 0);

    let journal = connector.journal.lock().unwrap();
    assert_eq!((journal.opened, journal.closed), (1, 1));
    assert_eq!(
        journal.submitted,
        operations
            .iter()
            .map(|op| op.statement.clone())
            .collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn failure_mid_vertex_phase_halts_and_still_closes() {
    let operations = construct_sociogram(&roster(), &mut StdRng::seed_from_u64(7));
    // Every vertex precedes every edge, so Kara's vertex is the first match.
    let connector = SpyConnector::new(Some("'Kara')"));
    let mut tally = Tally::default();

    let report = execute_scoped(&connector, &operations, &mut tally)
        .await
        .unwrap();

    let k = operations
        .iter()
        .position(|op| op.kind == OperationKind::CreateVertex { name: "Kara".into() })
        .unwrap();
    assert!(matches!(report.state, RunState::Halted { index, .. } if index == k));
    assert_eq!(report.submissions, k + 1);
    assert_eq!(tally.successes, k);
    assert_eq!(tally.failures, 1);
    assert_eq!(tally.attempts, (0..=k).collect::<Vec<_>>());
    assert_eq!(report.skipped(), operations.len() - (k + 1));

    let journal = connector.journal.lock().unwrap();
    assert_eq!(journal.submitted.len(), k + 1);
    assert_eq!(journal.closed, 1);
}

#[tokio::test]
async fn every_failure_position_submits_exactly_prefix() {
    let operations = construct_sociogram(&roster()[..4], &mut StdRng::seed_from_u64(1));
    let n = operations.len();

    for k in 0..n {
        let mut channel = sociogram_core::RecordingChannel::failing_at(
            k,
            ChannelError::Transport(format!("fault {k}")),
        );
        let mut tally = Tally::default();
        let report = StatementRunner::new()
            .run(&operations, &mut channel, &mut tally)
            .await;

        assert_eq!(channel.submitted().len(), k + 1);
        assert_eq!(tally.successes, k);
        assert_eq!(tally.failures, 1);
        assert_eq!(report.skipped(), n - k - 1);
        assert_eq!(
            report.halt_reason(),
            Some(&ChannelError::Transport(format!("fault {k}")))
        );
    }
}

#[test]
fn default_roster_plan_shape() {
    let operations = construct_sociogram(&roster(), &mut StdRng::seed_from_u64(99));
    let summary = summarize(&operations);
    assert_eq!(summary.resets, 1);
    assert_eq!(summary.vertices, 12);
    // 12 candidates, take 8, drop self if drawn: 7 or 8 per person.
    assert!(summary.edges >= 12 * 7 && summary.edges <= 12 * 8);
}
