//! Scan scheduler
//!
//! Owns the per-document engine state: the identity counter, which doubles
//! as the exclusive scan lock, and the mutation observer. A scan request
//! that finds the lock taken is dropped, never queued. Whether a scan is
//! running is tracked on its own flag, so asking never contends for the
//! lock.
//!
//! ```text
//! Settle ─→ CaptureBaseline ─→ Observe ─→ CaptureCurrent ─→ Classify ─→ Report
//! (mutation-triggered only)     (window)
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dom::{IdentityAssigner, Phid, Snapshot};
use tokio::sync::{broadcast, Mutex, Notify, OwnedMutexGuard, RwLock};
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::{EngineConfig, Markers};
use crate::document::{self, LiveDocument};
use crate::error::Result;
use crate::events::MutationRecord;
use crate::matcher;
use crate::pattern::PatternRegistry;
use crate::reporter::{LogReporter, ReporterManager, ResultReporter};
use crate::results::ScanResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Scanning,
}

/// One step of a scan, carrying whatever the next step needs
enum Stage {
    Settle,
    CaptureBaseline,
    Observe(Snapshot),
    CaptureCurrent(Snapshot),
    Classify { previous: Snapshot, current: Snapshot },
    Report(ScanResult),
}

/// Exclusive right to run one scan
///
/// The engine reads as idle again once the permit is dropped.
pub(crate) struct ScanPermit {
    identities: OwnedMutexGuard<IdentityAssigner>,
    scanning: Arc<AtomicBool>,
}

impl Drop for ScanPermit {
    fn drop(&mut self) {
        self.scanning.store(false, Ordering::Release);
    }
}

/// Detection engine for one loaded document
pub struct Engine {
    registry: PatternRegistry,
    config: EngineConfig,
    markers: Markers,
    document: LiveDocument,
    reporters: ReporterManager,

    /// Held for the whole of a scan
    identities: Arc<Mutex<IdentityAssigner>>,
    scanning: Arc<AtomicBool>,

    observer_task: RwLock<Option<JoinHandle<()>>>,
    shutdown: Notify,
}

impl Engine {
    /// The registry is validated by construction, so an engine never runs
    /// with a partial pattern set.
    pub fn new(registry: PatternRegistry, config: EngineConfig, document: LiveDocument) -> Self {
        let mut reporters = ReporterManager::new();
        reporters.register(Box::new(LogReporter));

        Self {
            registry,
            markers: config.markers(),
            config,
            document,
            reporters,
            identities: Arc::new(Mutex::new(IdentityAssigner::new())),
            scanning: Arc::new(AtomicBool::new(false)),
            observer_task: RwLock::new(None),
            shutdown: Notify::new(),
        }
    }

    pub fn with_reporter(mut self, reporter: Box<dyn ResultReporter>) -> Self {
        self.reporters.register(reporter);
        self
    }

    pub fn registry(&self) -> &PatternRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn document(&self) -> &LiveDocument {
        &self.document
    }

    pub fn state(&self) -> ScanState {
        if self.scanning.load(Ordering::Acquire) {
            ScanState::Scanning
        } else {
            ScanState::Idle
        }
    }

    pub fn is_scanning(&self) -> bool {
        self.state() == ScanState::Scanning
    }

    /// Run the initial scan, then start reacting to host mutations
    pub async fn start(self: &Arc<Self>) -> Option<ScanResult> {
        tracing::info!(
            "[Engine] started with {} patterns",
            self.registry.patterns().len()
        );

        self.stop().await;

        let result = self.run_scan(true).await;

        // Observation begins once the first results are out; subscribe
        // before spawning so nothing published in between is lost
        let observer = self.document.observe();
        let engine = Arc::clone(self);
        let task = tokio::spawn(async move { engine.observe_mutations(observer).await });
        *self.observer_task.write().await = Some(task);

        result
    }

    /// Stop observing mutations
    ///
    /// A scan the observer already started runs to completion first.
    pub async fn stop(&self) {
        let Some(task) = self.observer_task.write().await.take() else {
            return;
        };
        self.shutdown.notify_one();
        if let Err(e) = task.await {
            tracing::warn!("[Engine] observer ended abnormally: {}", e);
        }
        tracing::info!("[Engine] stopped");
    }

    /// Run one full scan
    ///
    /// `immediate` skips the quiescence delay. Returns `None` when another
    /// scan holds the lock or the scan could not complete.
    pub async fn run_scan(&self, immediate: bool) -> Option<ScanResult> {
        let Some(permit) = self.try_begin() else {
            tracing::debug!("[Scheduler] scan in progress, request dropped");
            return None;
        };
        self.run_permitted(permit, immediate).await
    }

    /// Take the scan lock without waiting
    pub(crate) fn try_begin(&self) -> Option<ScanPermit> {
        let identities = Arc::clone(&self.identities).try_lock_owned().ok()?;
        self.scanning.store(true, Ordering::Release);
        Some(ScanPermit {
            identities,
            scanning: Arc::clone(&self.scanning),
        })
    }

    /// Run a scan whose lock was already taken
    pub(crate) async fn run_permitted(&self, mut permit: ScanPermit, immediate: bool) -> Option<ScanResult> {
        let span = tracing::info_span!("scan", scan_id = %Uuid::now_v7(), immediate);
        match self.scan(&mut permit.identities, immediate).instrument(span).await {
            Ok(result) => Some(result),
            Err(e) => {
                tracing::error!("[Scheduler] scan failed: {}", e);
                None
            }
        }
    }

    async fn scan(&self, identities: &mut IdentityAssigner, immediate: bool) -> Result<ScanResult> {
        let mut stage = if immediate {
            Stage::CaptureBaseline
        } else {
            Stage::Settle
        };

        loop {
            stage = match stage {
                Stage::Settle => {
                    tokio::time::sleep(self.config.quiescence_delay()).await;
                    Stage::CaptureBaseline
                }
                Stage::CaptureBaseline => Stage::Observe(self.capture(identities).await?),
                Stage::Observe(previous) => {
                    tokio::time::sleep(self.config.comparison_window()).await;
                    Stage::CaptureCurrent(previous)
                }
                Stage::CaptureCurrent(previous) => Stage::Classify {
                    previous,
                    current: self.capture(identities).await?,
                },
                Stage::Classify {
                    mut previous,
                    mut current,
                } => Stage::Report(self.classify(&mut current, &mut previous).await?),
                Stage::Report(result) => {
                    tracing::info!("[Scheduler] {} patterns found", result.count_visible);
                    self.reporters.dispatch(Arc::new(result.clone())).await;
                    return Ok(result);
                }
            };
        }
    }

    /// Stamp the live tree, then copy it
    async fn capture(&self, identities: &mut IdentityAssigner) -> Result<Snapshot> {
        let mut tree = self.document.write().await;
        let stamped = identities.stamp(&mut tree)?;
        if stamped > 0 {
            tracing::debug!("[Scheduler] stamped {} new elements", stamped);
        }
        Ok(Snapshot::capture(&tree, &self.config.tag_blacklist)?)
    }

    /// Replace the live tree's annotations with this scan's matches
    async fn classify(&self, current: &mut Snapshot, previous: &mut Snapshot) -> Result<ScanResult> {
        let matches = matcher::match_snapshots(&self.registry, current, previous)?;

        let mut tree = self.document.write().await;
        let cleared = document::reset_annotations(&mut tree, &self.markers);
        tracing::debug!("[Scheduler] cleared {} previous annotations", cleared);

        for found in &matches {
            if !document::annotate(&mut tree, found.phid, &found.class_key, &self.markers) {
                tracing::debug!("[Scheduler] phid {} left the tree before annotation", found.phid);
            }
        }

        Ok(ScanResult::aggregate(&tree, &self.registry, &self.markers))
    }

    /// Watch the mutation stream while idle
    ///
    /// The subscription is dropped for the duration of each scan and taken
    /// again once its results have been reported, so a burst yields one scan.
    async fn observe_mutations(self: Arc<Self>, mut observer: broadcast::Receiver<MutationRecord>) {
        loop {
            tokio::select! {
                received = observer.recv() => match received {
                    Ok(record) => tracing::trace!("[Scheduler] mutation: {:?}", record),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::trace!("[Scheduler] {} mutations coalesced", missed)
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = self.shutdown.notified() => break,
            }
            drop(observer);

            self.run_scan(false).await;

            observer = self.document.observe();
        }
    }

    /// Results rebuilt from the live tree's current annotations
    pub async fn query_results(&self) -> ScanResult {
        let tree = self.document.read().await;
        ScanResult::aggregate(&tree, &self.registry, &self.markers)
    }

    /// Overlay the element carrying `phid`; false when it is gone
    pub async fn highlight(&self, phid: Phid) -> bool {
        let mut tree = self.document.write().await;
        let shown = document::place_overlay(&mut tree, phid, &self.markers);
        if !shown {
            tracing::debug!("[Engine] phid {} not in the tree, nothing to show", phid);
        }
        shown
    }
}
