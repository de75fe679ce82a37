//! Graph Search Manager
//!
//! Admits graph search requests and processes them one at a time on a
//! dedicated worker thread.
//!
//! # Architecture
//!
//! 1. [`GraphSearchManager::request_search`] registers one job per root txid
//!    and pushes new jobs onto an unbounded FIFO channel
//! 2. The worker thread pops jobs, streams the gs++ response, and checks
//!    validation liveness and cancellation after every received chunk
//! 3. The decoded transactions land in the job's cache and the job is marked
//!    successful; any error marks it failed instead
//! 4. Between jobs, and at least every `sweep_interval` while idle, the
//!    worker drops expired transactions from every registered job's cache
//!
//! Errors never leave the worker: every outcome is recorded on the job, and
//! the validator reads it from there.
//!
//! # Example
//!
//! ```ignore
//! use slp_graph_search::{GraphSearchConfig, GraphSearchManager};
//!
//! let manager = GraphSearchManager::new(GraphSearchConfig::from_env())?;
//! let job = manager.request_search(valjob.clone());
//! job.wait_complete(Duration::from_secs(300));
//! let tx = job.get_tx(&some_txid);
//! ```

use std::collections::HashMap;
use std::io::{ErrorKind, Read};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Weak};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use parking_lot::Mutex;
use slp_transport::response::parse_graph_search_response;
use slp_transport::GraphSearchClient;
use slp_types::encoding::base64_decode;
use tracing::{debug, error, info, warn};

use crate::cache::{Clock, SystemClock};
use crate::config::GraphSearchConfig;
use crate::job::{CancelCallback, CancelRequest, GraphSearchJob};
use crate::transport::SearchTransport;
use crate::validation::{NetworkConfig, ProgressSink, ValidationJob};

pub const VALIDATION_FINISHED: &str = "validation finished";
pub const VALIDATION_STOPPED: &str = "validation job stopped";
pub const JOB_RESTARTED: &str = "job restarted";
pub const WORKER_GONE: &str = "graph search worker is not running";

const CHUNK_SIZE: usize = 16 * 1024;

enum WorkItem {
    Search(Arc<GraphSearchJob>),
    Shutdown,
}

/// State shared between the admission side and the worker.
struct Shared {
    config: GraphSearchConfig,
    search_jobs: Mutex<HashMap<String, Arc<GraphSearchJob>>>,
    search_queue: Sender<WorkItem>,
    /// Bytes downloaded by all jobs. Only the worker adds to it.
    data_totalizer: AtomicU64,
    emit_ui_update: Mutex<Option<ProgressSink>>,
    /// Time source for every job's transaction cache.
    clock: Arc<dyn Clock>,
}

pub struct GraphSearchManager {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl GraphSearchManager {
    /// Start a manager that talks to gs++ over HTTP.
    pub fn new(config: GraphSearchConfig) -> Result<Self> {
        let transport = Arc::new(GraphSearchClient::with_timeouts(
            config.connect_timeout,
            config.read_timeout,
        ));
        Self::with_transport(config, transport)
    }

    pub fn with_transport(
        config: GraphSearchConfig,
        transport: Arc<dyn SearchTransport>,
    ) -> Result<Self> {
        Self::with_clock(config, transport, Arc::new(SystemClock))
    }

    /// Like [`GraphSearchManager::with_transport`], with the clock used to
    /// expire cached transactions.
    pub fn with_clock(
        config: GraphSearchConfig,
        transport: Arc<dyn SearchTransport>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let (search_queue, queue) = mpsc::channel();
        let thread_name = format!("{}/search", config.thread_name);
        let shared = Arc::new(Shared {
            config,
            search_jobs: Mutex::new(HashMap::new()),
            search_queue,
            data_totalizer: AtomicU64::new(0),
            emit_ui_update: Mutex::new(None),
            clock,
        });

        let worker = Worker {
            shared: shared.clone(),
            transport,
            queue,
        };
        let handle = std::thread::Builder::new()
            .name(thread_name)
            .spawn(move || worker.run())
            .context("Failed to spawn graph search worker")?;

        Ok(Self {
            shared,
            worker: Some(handle),
        })
    }

    /// Get the job for `valjob.root_txid()`, creating and queueing it if
    /// this is the first request for that txid.
    pub fn request_search(&self, valjob: Arc<dyn ValidationJob>) -> Arc<GraphSearchJob> {
        self.shared.request_search(valjob)
    }

    /// Drop `job` from the registry and request a fresh search for the same
    /// validation job. A running job is cancelled first and the resubmit
    /// happens once the worker has unwound it.
    pub fn restart_search(&self, job: &Arc<GraphSearchJob>) {
        Shared::restart_search(&self.shared, job);
    }

    pub fn get_job(&self, root_txid: &str) -> Option<Arc<GraphSearchJob>> {
        self.shared.search_jobs.lock().get(root_txid).cloned()
    }

    pub fn job_count(&self) -> usize {
        self.shared.search_jobs.lock().len()
    }

    /// Total bytes downloaded by this manager's worker.
    pub fn bytes_downloaded(&self) -> u64 {
        self.shared.data_totalizer.load(Ordering::Relaxed)
    }

    pub fn config(&self) -> &GraphSearchConfig {
        &self.shared.config
    }

    /// Drop expired transactions from every registered job's cache.
    /// Returns how many were dropped.
    pub fn sweep_caches(&self) -> usize {
        self.shared.sweep_caches()
    }

    /// Stop the worker after the job it is running, and wait for it.
    pub fn shutdown(mut self) {
        let _ = self.shared.search_queue.send(WorkItem::Shutdown);
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                error!("graph search worker panicked during shutdown");
            }
        }
    }
}

impl Drop for GraphSearchManager {
    fn drop(&mut self) {
        if self.worker.is_some() {
            let _ = self.shared.search_queue.send(WorkItem::Shutdown);
        }
    }
}

impl Shared {
    fn request_search(&self, valjob: Arc<dyn ValidationJob>) -> Arc<GraphSearchJob> {
        self.adopt_progress_sink(valjob.network());
        let txid = valjob.root_txid().to_string();

        let mut jobs = self.search_jobs.lock();
        if let Some(job) = jobs.get(&txid) {
            return job.clone();
        }

        let job = Arc::new(GraphSearchJob::with_clock(
            &valjob,
            &self.config,
            self.clock.clone(),
        ));
        jobs.insert(txid, job.clone());
        if self.search_queue.send(WorkItem::Search(job.clone())).is_err() {
            job.set_failed(WORKER_GONE);
        } else {
            debug!(root_txid = job.root_txid(), "queued graph search");
        }
        job
    }

    fn restart_search(self: &Arc<Self>, job: &Arc<GraphSearchJob>) {
        let weak: Weak<Shared> = Arc::downgrade(self);
        let callback: CancelCallback = Box::new(move |job: &Arc<GraphSearchJob>| {
            if let Some(shared) = weak.upgrade() {
                shared.resubmit(job);
            }
        });

        match job.schedule_cancel(Some(callback), JOB_RESTARTED) {
            CancelRequest::Scheduled => {
                debug!(root_txid = job.root_txid(), "restart deferred until cancel");
            }
            CancelRequest::Complete => self.resubmit(job),
            CancelRequest::AlreadyPending => {
                debug!(root_txid = job.root_txid(), "restart skipped, cancel already pending");
            }
        }
    }

    fn resubmit(&self, job: &Arc<GraphSearchJob>) {
        {
            let mut jobs = self.search_jobs.lock();
            // Only drop the registry entry if it still is this job.
            if jobs
                .get(job.root_txid())
                .is_some_and(|current| Arc::ptr_eq(current, job))
            {
                jobs.remove(job.root_txid());
            }
        }
        match job.valjob() {
            Some(valjob) => {
                self.request_search(valjob);
            }
            None => debug!(root_txid = job.root_txid(), "validation job gone, not resubmitting"),
        }
    }

    fn sweep_caches(&self) -> usize {
        let jobs: Vec<Arc<GraphSearchJob>> = self.search_jobs.lock().values().cloned().collect();
        let dropped: usize = jobs.iter().map(|job| job.sweep_cache()).sum();
        if dropped > 0 {
            debug!(dropped, jobs = jobs.len(), "swept expired graph search txns");
        }
        dropped
    }

    fn adopt_progress_sink(&self, network: &NetworkConfig) {
        if let Some(sink) = &network.progress {
            let mut slot = self.emit_ui_update.lock();
            if slot.is_none() {
                *slot = Some(sink.clone());
            }
        }
    }

    fn emit_progress(&self, total: u64) {
        let sink = self.emit_ui_update.lock().clone();
        if let Some(sink) = sink {
            sink(total);
        }
    }
}

/// True when the validation job has run and stopped, or was dropped.
fn validation_finished(job: &GraphSearchJob) -> bool {
    match job.valjob() {
        Some(valjob) => !valjob.is_running() && !valjob.has_never_run(),
        None => true,
    }
}

struct Worker {
    shared: Arc<Shared>,
    transport: Arc<dyn SearchTransport>,
    queue: Receiver<WorkItem>,
}

impl Worker {
    fn run(self) {
        let interval = self.shared.config.sweep_interval.max(Duration::from_millis(1));
        let mut last_sweep = Instant::now();
        loop {
            let wait = interval.saturating_sub(last_sweep.elapsed());
            match self.queue.recv_timeout(wait) {
                Ok(WorkItem::Search(job)) => self.process(&job),
                Ok(WorkItem::Shutdown) => {
                    debug!("graph search worker shutting down");
                    return;
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
            if last_sweep.elapsed() >= interval {
                self.shared.sweep_caches();
                last_sweep = Instant::now();
            }
        }
        error!("graph search mainloop exited");
    }

    fn process(&self, job: &Arc<GraphSearchJob>) {
        job.mark_started();

        if validation_finished(job) {
            job.set_failed(VALIDATION_FINISHED);
        } else {
            match panic::catch_unwind(AssertUnwindSafe(|| self.search_query(job))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    let reason = format!("{:#}", e);
                    warn!(
                        root_txid = job.root_txid(),
                        error = %reason,
                        "graph search query failed"
                    );
                    job.set_failed(reason);
                }
                Err(_) => {
                    error!(root_txid = job.root_txid(), "graph search query panicked");
                    job.set_failed("graph search query panicked");
                }
            }
        }

        if let Some(valjob) = job.valjob() {
            valjob.wakeup();
            self.shared.adopt_progress_sink(valjob.network());
        }
        self.shared
            .emit_progress(self.shared.data_totalizer.load(Ordering::Relaxed));
    }

    fn search_query(&self, job: &Arc<GraphSearchJob>) -> Result<()> {
        if job.waiting_to_cancel() {
            job.cancel_now();
            return Ok(());
        }
        if validation_finished(job) {
            job.set_failed(VALIDATION_FINISHED);
            return Ok(());
        }

        let stream = self.transport.open_search(job.host(), job.root_txid())?;
        job.set_last_search_url(stream.url.clone());

        let Some(dat) = self.read_body(job, stream.body)? else {
            return Ok(());
        };

        let txdata = parse_graph_search_response(&dat)?;
        for txn in &txdata {
            job.increment_progress();
            let raw = base64_decode(txn, "graph search txdata")?;
            job.put_tx(raw, None);
        }

        if let Some(expected) = job.txn_count_total() {
            if expected != txdata.len() as u64 {
                warn!(
                    root_txid = job.root_txid(),
                    expected,
                    received = txdata.len(),
                    "graph search returned a different txn count than advertised"
                );
            }
        }

        job.set_success();
        info!(
            root_txid = job.root_txid(),
            txns = txdata.len(),
            bytes = dat.len(),
            "graph search job success"
        );
        Ok(())
    }

    /// Stream the response body, checking the job after every chunk.
    ///
    /// Returns `None` if the job was stopped or cancelled mid-stream; the
    /// job is already terminal in that case.
    fn read_body(
        &self,
        job: &Arc<GraphSearchJob>,
        mut body: Box<dyn Read + Send>,
    ) -> Result<Option<Vec<u8>>> {
        let mut dat = Vec::new();
        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut last_update = Instant::now();

        loop {
            let n = match body.read(&mut buf) {
                Ok(0) => return Ok(Some(dat)),
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e).context("Failed to read graph search response"),
            };

            job.record_response_bytes(n as u64);
            let total = self
                .shared
                .data_totalizer
                .fetch_add(n as u64, Ordering::Relaxed)
                + n as u64;
            dat.extend_from_slice(&buf[..n]);

            if last_update.elapsed() > self.shared.config.progress_interval {
                self.shared.emit_progress(total);
                last_update = Instant::now();
            }

            if !job.valjob().is_some_and(|valjob| valjob.is_running()) {
                job.set_failed(VALIDATION_STOPPED);
                return Ok(None);
            }
            if job.waiting_to_cancel() {
                job.cancel_now();
                return Ok(None);
            }
        }
    }
}
