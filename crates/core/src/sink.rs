//! Clinical notification sink.
//!
//! Invoked once per finished interview with the total and disposition. The
//! only binding shipped here writes the result to the log; a records system
//! integration would implement the same trait.

use crate::interview::Outcome;
use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

/// Receives the result of every completed interview.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClinicalSink: Send + Sync {
    async fn notify(&self, outcome: &Outcome) -> Result<()>;
}

/// A `ClinicalSink` that records outcomes in the application log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl ClinicalSink for LogSink {
    async fn notify(&self, outcome: &Outcome) -> Result<()> {
        info!(
            target: "silverline::clinical",
            total = outcome.total,
            disposition = %outcome.disposition,
            "PHQ-9 screening completed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::Disposition;

    #[tokio::test]
    async fn test_log_sink_accepts_outcomes() {
        let sink = LogSink;
        let outcome = Outcome {
            total: 12,
            disposition: Disposition::Escalate,
        };
        assert!(sink.notify(&outcome).await.is_ok());
    }
}
