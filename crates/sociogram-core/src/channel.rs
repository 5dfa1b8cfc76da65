//! Execution channel: the only way statements reach the remote store.

use async_trait::async_trait;

/// Why a single statement submission failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("rejected by server (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("channel is closed")]
    Closed,
}

/// Submits one opaque statement at a time.
///
/// Implementations must report every outcome through the returned `Result`;
/// the runner relies on observing each one before submitting the next.
#[async_trait]
pub trait ExecutionChannel: Send {
    async fn submit(&mut self, statement: &str) -> Result<(), ChannelError>;

    /// Release the underlying connection. Later submissions fail with
    /// [`ChannelError::Closed`].
    async fn close(&mut self) -> Result<(), ChannelError> {
        Ok(())
    }
}

/// Opens channels. Server address and credentials live in the connector.
#[async_trait]
pub trait ChannelConnector: Send + Sync {
    type Channel: ExecutionChannel;

    async fn open(&self) -> Result<Self::Channel, ChannelError>;
}

/// In-memory channel that records statements and can fail on demand.
///
/// Backs `load --dry-run` and the test suites.
#[derive(Debug, Default)]
pub struct RecordingChannel {
    submitted: Vec<String>,
    fail_at: Option<(usize, ChannelError)>,
    closed: bool,
    close_count: usize,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the submission with zero-based index `index`; all others succeed.
    pub fn failing_at(index: usize, error: ChannelError) -> Self {
        Self {
            fail_at: Some((index, error)),
            ..Self::default()
        }
    }

    /// Every statement passed to `submit`, including the failing one.
    pub fn submitted(&self) -> &[String] {
        &self.submitted
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn close_count(&self) -> usize {
        self.close_count
    }
}

#[async_trait]
impl ExecutionChannel for RecordingChannel {
    async fn submit(&mut self, statement: &str) -> Result<(), ChannelError> {
        if self.closed {
            return Err(ChannelError::Closed);
        }
        let index = self.submitted.len();
        self.submitted.push(statement.to_string());
        match &self.fail_at {
            Some((fail_index, error)) if *fail_index == index => Err(error.clone()),
            _ => Ok(()),
        }
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        self.closed = true;
        self.close_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn recording_channel_fails_at_configured_index() {
        let mut channel =
            RecordingChannel::failing_at(1, ChannelError::Transport("reset".to_string()));
        assert!(channel.submit("a").await.is_ok());
        assert_eq!(
            channel.submit("b").await,
            Err(ChannelError::Transport("reset".to_string()))
        );
        assert!(channel.submit("c").await.is_ok());
        assert_eq!(channel.submitted(), ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn closed_channel_rejects_submissions() {
        let mut channel = RecordingChannel::new();
        channel.close().await.unwrap();
        assert_eq!(channel.submit("a").await, Err(ChannelError::Closed));
        assert!(channel.submitted().is_empty());
        assert!(channel.is_closed());
    }

    #[test]
    fn errors_render_for_the_run_log() {
        let err = ChannelError::Rejected {
            status: 400,
            message: "bad traversal".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "rejected by server (status 400): bad traversal"
        );
    }
}
