//! Result reporters
//!
//! Every finished scan is handed to all registered reporters. A host wires
//! in its own (badge counter, popup, telemetry) by implementing the trait.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::results::ScanResult;

/// Receives the result of every completed scan
#[async_trait]
pub trait ResultReporter: Send + Sync {
    /// Human-readable name for logging
    fn name(&self) -> &str;

    async fn report(&self, result: &ScanResult);
}

/// Fans scan results out to all reporters
pub struct ReporterManager {
    reporters: Vec<Box<dyn ResultReporter>>,
}

impl ReporterManager {
    pub fn new() -> Self {
        Self {
            reporters: Vec::new(),
        }
    }

    pub fn register(&mut self, reporter: Box<dyn ResultReporter>) {
        tracing::debug!("Registered reporter: {}", reporter.name());
        self.reporters.push(reporter);
    }

    pub fn len(&self) -> usize {
        self.reporters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reporters.is_empty()
    }

    /// Report to every reporter concurrently
    pub async fn dispatch(&self, result: Arc<ScanResult>) {
        use futures_util::future::join_all;

        let tasks: Vec<_> = self
            .reporters
            .iter()
            .map(|r| {
                let result = result.clone();
                async move {
                    r.report(&result).await;
                }
            })
            .collect();

        join_all(tasks).await;
    }
}

impl Default for ReporterManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Logs a one-line summary per scan
pub struct LogReporter;

#[async_trait]
impl ResultReporter for LogReporter {
    fn name(&self) -> &str {
        "LogReporter"
    }

    async fn report(&self, result: &ScanResult) {
        tracing::info!(
            "[LogReporter] {} patterns found ({} visible)",
            result.count,
            result.count_visible
        );
        for pattern in result.patterns.iter().filter(|p| !p.is_empty()) {
            tracing::debug!("[LogReporter] {}: {}", pattern.name, pattern.len());
        }
    }
}

/// Forwards results into a channel, for hosts that poll
pub struct ChannelReporter {
    sender: mpsc::UnboundedSender<ScanResult>,
}

impl ChannelReporter {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ScanResult>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl ResultReporter for ChannelReporter {
    fn name(&self) -> &str {
        "ChannelReporter"
    }

    async fn report(&self, result: &ScanResult) {
        if self.sender.send(result.clone()).is_err() {
            tracing::debug!("[ChannelReporter] receiver dropped, result discarded");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingReporter {
        seen: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ResultReporter for CountingReporter {
        fn name(&self) -> &str {
            "counting"
        }

        async fn report(&self, result: &ScanResult) {
            self.seen.fetch_add(result.count, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_dispatch_reaches_every_reporter() {
        let seen = Arc::new(AtomicUsize::new(0));
        let mut manager = ReporterManager::new();
        manager.register(Box::new(CountingReporter { seen: seen.clone() }));
        manager.register(Box::new(CountingReporter { seen: seen.clone() }));
        manager.register(Box::new(LogReporter));

        let result = ScanResult {
            count: 3,
            ..Default::default()
        };
        manager.dispatch(Arc::new(result)).await;

        assert_eq!(manager.len(), 3);
        assert_eq!(seen.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn test_channel_reporter() {
        let (reporter, mut rx) = ChannelReporter::new();
        let result = ScanResult {
            count: 1,
            count_visible: 1,
            ..Default::default()
        };

        reporter.report(&result).await;
        assert_eq!(rx.recv().await, Some(result));

        drop(rx);
        reporter.report(&ScanResult::default()).await;
    }
}
