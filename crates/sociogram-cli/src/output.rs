//! Console rendering for plans and runs.

use std::io::{self, Write};

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use sociogram_core::{ChannelError, Operation, PlanSummary, RunObserver, RunReport, RunState};

/// Prints `Executing: <description>... ok|Error: <reason>`, one line per
/// attempted operation.
///
/// Observer hooks cannot fail, so the first write error is held until
/// [`ConsoleObserver::finish`].
pub struct ConsoleObserver<W: Write + Send> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write + Send> ConsoleObserver<W> {
    pub fn new(out: W) -> Self {
        Self { out, error: None }
    }

    /// Hand back the writer, or the first write error seen during the run.
    pub fn finish(self) -> io::Result<W> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.out),
        }
    }

    fn record(&mut self, result: io::Result<()>) {
        if let Err(error) = result {
            if self.error.is_none() {
                tracing::warn!(%error, "failed to write run progress");
                self.error = Some(error);
            }
        }
    }
}

impl<W: Write + Send> RunObserver for ConsoleObserver<W> {
    fn on_attempt(&mut self, _index: usize, operation: &Operation) {
        let result = write!(self.out, "Executing: {}... ", operation.description)
            .and_then(|()| self.out.flush());
        self.record(result);
    }

    fn on_success(&mut self, _index: usize, _operation: &Operation) {
        let result = writeln!(self.out, "{}", "ok".green());
        self.record(result);
    }

    fn on_failure(&mut self, _index: usize, _operation: &Operation, error: &ChannelError) {
        let result = writeln!(self.out, "{} {error}", "Error:".red().bold());
        self.record(result);
    }
}

#[derive(Serialize)]
struct PlanJson<'a> {
    summary: PlanSummary,
    operations: &'a [Operation],
}

pub fn write_plan<W: Write>(
    out: &mut W,
    operations: &[Operation],
    summary: PlanSummary,
    json: bool,
) -> Result<()> {
    if json {
        let payload = PlanJson {
            summary,
            operations,
        };
        serde_json::to_writer_pretty(&mut *out, &payload)?;
        writeln!(out)?;
        return Ok(());
    }

    for (index, op) in operations.iter().enumerate() {
        writeln!(
            out,
            "{:>4}  {:<28} {}",
            index,
            op.description,
            op.statement.dimmed()
        )?;
    }
    writeln!(
        out,
        "{} {} operations ({} vertices, {} edges)",
        "plan".cyan().bold(),
        summary.total(),
        summary.vertices,
        summary.edges
    )?;
    Ok(())
}

pub fn write_run_summary<W: Write>(out: &mut W, report: &RunReport) -> Result<()> {
    match &report.state {
        RunState::Completed => {
            writeln!(out, "Graph constructed. B-)")?;
        }
        RunState::Halted { index, reason } => {
            writeln!(
                out,
                "{} halted at operation {index}: {reason} ({} succeeded, {} not attempted)",
                "error".red().bold(),
                report.succeeded(),
                report.skipped()
            )?;
        }
        RunState::NotStarted | RunState::Running { .. } => {
            writeln!(out, "{} run did not finish", "error".red().bold())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sociogram_core::{RecordingChannel, StatementRunner};

    fn plain() {
        colored::control::set_override(false);
    }

    fn ops() -> Vec<Operation> {
        vec![
            Operation::reset_graph(),
            Operation::create_vertex("Ron"),
            Operation::create_vertex("Jim"),
            Operation::create_edge("Ron", "Jim"),
        ]
    }

    async fn run(fail_at: Option<usize>) -> (String, String) {
        plain();
        let ops = ops();
        let mut channel = match fail_at {
            Some(i) => RecordingChannel::failing_at(
                i,
                ChannelError::Transport("connection reset".to_string()),
            ),
            None => RecordingChannel::new(),
        };
        let mut observer = ConsoleObserver::new(Vec::new());
        let report = StatementRunner::new()
            .run(&ops, &mut channel, &mut observer)
            .await;
        let mut summary = Vec::new();
        write_run_summary(&mut summary, &report).unwrap();
        (
            String::from_utf8(observer.finish().unwrap()).unwrap(),
            String::from_utf8(summary).unwrap(),
        )
    }

    #[tokio::test]
    async fn completed_run_log() {
        let (log, summary) = run(None).await;
        assert_eq!(
            log,
            "Executing: Drop existing Graph... ok\n\
             Executing: Add Ron... ok\n\
             Executing: Add Jim... ok\n\
             Executing: Ron knows Jim... ok\n"
        );
        assert_eq!(summary, "Graph constructed. B-)\n");
    }

    #[tokio::test]
    async fn halted_run_log_stops_at_failure() {
        let (log, summary) = run(Some(1)).await;
        assert_eq!(
            log,
            "Executing: Drop existing Graph... ok\n\
             Executing: Add Ron... Error: transport error: connection reset\n"
        );
        assert_eq!(
            summary,
            "error halted at operation 1: transport error: connection reset (1 succeeded, 2 not attempted)\n"
        );
    }

    #[test]
    fn plan_json_lists_operations() {
        let ops = ops();
        let mut out = Vec::new();
        write_plan(&mut out, &ops, sociogram_core::summarize(&ops), true).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["summary"]["edges"], 1);
        assert_eq!(value["operations"][3]["kind"]["kind"], "create_edge");
        assert_eq!(value["operations"][3]["description"], "Ron knows Jim");
    }

    #[test]
    fn plan_text_ends_with_summary() {
        plain();
        let ops = ops();
        let mut out = Vec::new();
        write_plan(&mut out, &ops, sociogram_core::summarize(&ops), false).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 5);
        assert!(text.contains("g.V('Ron').addE('knows').to(g.V('Jim'))"));
        assert!(text
            .lines()
            .last()
            .unwrap()
            .ends_with("4 operations (2 vertices, 1 edges)"));
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "stdout closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn write_failure_surfaces_from_finish() {
        let ops = ops();
        let mut observer = ConsoleObserver::new(BrokenPipe);
        let report = StatementRunner::new()
            .run(&ops, &mut RecordingChannel::new(), &mut observer)
            .await;

        assert!(report.state.is_completed());
        let err = observer.finish().err().expect("write error is kept");
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
