//! The validation job seen from the graph search side.
//!
//! Validation jobs are owned by the validator. Graph search only keeps weak
//! references to them and reads their liveness and network settings.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Receives the cumulative number of bytes downloaded by graph search.
pub type ProgressSink = Arc<dyn Fn(u64) + Send + Sync>;

/// Network settings carried by a validation job.
#[derive(Clone, Default)]
pub struct NetworkConfig {
    /// gs++ host; empty means "use the manager default".
    pub gs_host: String,
    /// Optional sink for download progress updates.
    pub progress: Option<ProgressSink>,
}

impl fmt::Debug for NetworkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkConfig")
            .field("gs_host", &self.gs_host)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl NetworkConfig {
    pub fn new(gs_host: impl Into<String>) -> Self {
        Self {
            gs_host: gs_host.into(),
            progress: None,
        }
    }

    pub fn with_progress(mut self, sink: ProgressSink) -> Self {
        self.progress = Some(sink);
        self
    }
}

/// A token validation job that consumes graph search results.
pub trait ValidationJob: Send + Sync {
    /// Display-order txid whose ancestry is needed.
    fn root_txid(&self) -> &str;

    fn is_running(&self) -> bool;

    /// True until the validator has started this job for the first time.
    fn has_never_run(&self) -> bool;

    /// Called after graph search finishes with this job's search, whatever
    /// the outcome, so a blocked validator can resume.
    fn wakeup(&self) {}

    fn network(&self) -> &NetworkConfig;
}

/// Minimal [`ValidationJob`] driven by flags.
///
/// Used by the CLI, which has no validator of its own, and by tests.
#[derive(Debug)]
pub struct SimpleValidationJob {
    root_txid: String,
    network: NetworkConfig,
    running: AtomicBool,
    has_never_run: AtomicBool,
    wakeups: AtomicU64,
}

impl SimpleValidationJob {
    /// A job that is already running.
    pub fn new(root_txid: impl Into<String>, network: NetworkConfig) -> Self {
        Self {
            root_txid: root_txid.into(),
            network,
            running: AtomicBool::new(true),
            has_never_run: AtomicBool::new(false),
            wakeups: AtomicU64::new(0),
        }
    }

    /// A job that has not been started yet.
    pub fn pending(root_txid: impl Into<String>, network: NetworkConfig) -> Self {
        let job = Self::new(root_txid, network);
        job.running.store(false, Ordering::SeqCst);
        job.has_never_run.store(true, Ordering::SeqCst);
        job
    }

    pub fn set_running(&self, running: bool) {
        if running {
            self.has_never_run.store(false, Ordering::SeqCst);
        }
        self.running.store(running, Ordering::SeqCst);
    }

    /// Number of times graph search has woken this job.
    pub fn wakeups(&self) -> u64 {
        self.wakeups.load(Ordering::SeqCst)
    }
}

impl ValidationJob for SimpleValidationJob {
    fn root_txid(&self) -> &str {
        &self.root_txid
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn has_never_run(&self) -> bool {
        self.has_never_run.load(Ordering::SeqCst)
    }

    fn wakeup(&self) {
        self.wakeups.fetch_add(1, Ordering::SeqCst);
    }

    fn network(&self) -> &NetworkConfig {
        &self.network
    }
}
