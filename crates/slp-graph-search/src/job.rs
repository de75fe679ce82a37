//! State and results of a single root-transaction graph search.
//!
//! A [`GraphSearchJob`] is written by the manager's worker thread and read by
//! the validator. All status fields live behind one lock and stop changing
//! once the job is complete. Fetched transactions go into an expiring cache
//! that hands out copies, never the cached instance.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use serde::Serialize;
use slp_types::{compute_txid, Transaction};

use crate::cache::{Clock, ExpiringCache, SystemClock};
use crate::config::GraphSearchConfig;
use crate::metrics::MetricsSnapshot;
use crate::validation::ValidationJob;

pub const TX_CACHE_NAME: &str = "GraphSearchTxnFetchCache";

/// Runs once, on the worker thread, when a cancelled job completes.
pub type CancelCallback = Box<dyn FnOnce(&Arc<GraphSearchJob>) + Send>;

/// Outcome of [`GraphSearchJob::schedule_cancel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CancelRequest {
    /// Flag set; the worker will cancel at its next check.
    Scheduled,
    /// An earlier cancel is still pending and keeps its callback.
    AlreadyPending,
    /// Nothing to cancel.
    Complete,
}

/// Point-in-time copy of a job's status and progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobStatus {
    pub root_txid: String,
    pub search_started: bool,
    pub search_success: Option<bool>,
    pub job_complete: bool,
    pub exit_msg: Option<String>,
    /// Transaction count per ancestry depth, as reported by the server.
    pub depth_map: Option<BTreeMap<u32, u64>>,
    pub total_depth: Option<u32>,
    pub txn_count_total: Option<u64>,
    pub txn_count_progress: u64,
    pub gs_response_size: u64,
    pub last_search_url: String,
    pub waiting_to_cancel: bool,
}

struct JobState {
    search_started: bool,
    search_success: Option<bool>,
    job_complete: bool,
    exit_msg: Option<String>,
    depth_map: Option<BTreeMap<u32, u64>>,
    total_depth: Option<u32>,
    txn_count_total: Option<u64>,
    txn_count_progress: u64,
    gs_response_size: u64,
    last_search_url: String,
    waiting_to_cancel: bool,
    cancel_callback: Option<CancelCallback>,
}

impl Default for JobState {
    fn default() -> Self {
        Self {
            search_started: false,
            search_success: None,
            job_complete: false,
            exit_msg: None,
            depth_map: None,
            total_depth: None,
            txn_count_total: None,
            txn_count_progress: 0,
            gs_response_size: 0,
            last_search_url: "(url empty)".to_string(),
            waiting_to_cancel: false,
            cancel_callback: None,
        }
    }
}

pub struct GraphSearchJob {
    root_txid: String,
    host: String,
    valjob: Weak<dyn ValidationJob>,
    state: Mutex<JobState>,
    completed: Condvar,
    txdata: ExpiringCache<String, Arc<Transaction>>,
}

impl fmt::Debug for GraphSearchJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphSearchJob")
            .field("root_txid", &self.root_txid)
            .field("host", &self.host)
            .field("job_complete", &self.is_complete())
            .finish_non_exhaustive()
    }
}

impl GraphSearchJob {
    pub fn new(valjob: &Arc<dyn ValidationJob>, config: &GraphSearchConfig) -> Self {
        Self::with_clock(valjob, config, Arc::new(SystemClock))
    }

    /// Like [`GraphSearchJob::new`] with an explicit clock for the tx cache.
    pub fn with_clock(
        valjob: &Arc<dyn ValidationJob>,
        config: &GraphSearchConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let gs_host = &valjob.network().gs_host;
        let host = if gs_host.trim().is_empty() {
            config.host.clone()
        } else {
            gs_host.clone()
        };
        Self {
            root_txid: valjob.root_txid().to_string(),
            host,
            valjob: Arc::downgrade(valjob),
            state: Mutex::new(JobState::default()),
            completed: Condvar::new(),
            txdata: ExpiringCache::with_clock(
                TX_CACHE_NAME,
                config.cache_capacity,
                config.cache_ttl,
                clock,
            ),
        }
    }

    pub fn root_txid(&self) -> &str {
        &self.root_txid
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// The requesting validation job, if the validator still holds it.
    pub fn valjob(&self) -> Option<Arc<dyn ValidationJob>> {
        self.valjob.upgrade()
    }

    pub fn status(&self) -> JobStatus {
        let st = self.state.lock();
        JobStatus {
            root_txid: self.root_txid.clone(),
            search_started: st.search_started,
            search_success: st.search_success,
            job_complete: st.job_complete,
            exit_msg: st.exit_msg.clone(),
            depth_map: st.depth_map.clone(),
            total_depth: st.total_depth,
            txn_count_total: st.txn_count_total,
            txn_count_progress: st.txn_count_progress,
            gs_response_size: st.gs_response_size,
            last_search_url: st.last_search_url.clone(),
            waiting_to_cancel: st.waiting_to_cancel,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.state.lock().job_complete
    }

    pub fn search_success(&self) -> Option<bool> {
        self.state.lock().search_success
    }

    pub fn exit_msg(&self) -> Option<String> {
        self.state.lock().exit_msg.clone()
    }

    pub fn waiting_to_cancel(&self) -> bool {
        self.state.lock().waiting_to_cancel
    }

    pub fn txn_count_progress(&self) -> u64 {
        self.state.lock().txn_count_progress
    }

    /// Ask the worker to cancel this job.
    ///
    /// The first pending request wins: a later call neither replaces its
    /// reason nor its callback.
    pub fn schedule_cancel(
        &self,
        callback: Option<CancelCallback>,
        reason: impl Into<String>,
    ) -> CancelRequest {
        let mut st = self.state.lock();
        if st.job_complete {
            return CancelRequest::Complete;
        }
        if st.waiting_to_cancel {
            return CancelRequest::AlreadyPending;
        }
        st.exit_msg = Some(reason.into());
        st.waiting_to_cancel = true;
        st.cancel_callback = callback;
        CancelRequest::Scheduled
    }

    /// Mark the fetch successful; every transaction is in the cache.
    pub fn set_success(self: &Arc<Self>) -> bool {
        self.finish(true, None)
    }

    pub fn set_failed(self: &Arc<Self>, reason: impl Into<String>) -> bool {
        self.finish(false, Some(reason.into()))
    }

    /// Complete a job whose cancel was observed. The exit message is the
    /// reason given to `schedule_cancel`.
    pub(crate) fn cancel_now(self: &Arc<Self>) -> bool {
        self.finish(false, None)
    }

    /// The single transition into the terminal state. Returns false if the
    /// job was already complete.
    ///
    /// A pending cancel callback fires here whichever way the job ends, so a
    /// restart is never lost to a search that finished first.
    fn finish(self: &Arc<Self>, success: bool, reason: Option<String>) -> bool {
        let callback = {
            let mut st = self.state.lock();
            if st.job_complete {
                return false;
            }
            if !success {
                st.search_started = true;
            }
            if reason.is_some() {
                st.exit_msg = reason;
            }
            st.search_success = Some(success);
            st.job_complete = true;
            st.cancel_callback.take()
        };
        if let Some(callback) = callback {
            callback(self);
        }
        // Waiters wake after the callback so they observe its effects.
        self.completed.notify_all();
        true
    }

    /// Block until the job is complete or `timeout` passes. Returns whether
    /// the job is complete.
    pub fn wait_complete(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut st = self.state.lock();
        while !st.job_complete {
            if self.completed.wait_until(&mut st, deadline).timed_out() {
                return st.job_complete;
            }
        }
        true
    }

    /// Record server-side metadata about the graph.
    pub fn set_search_metadata(
        &self,
        depth_map: BTreeMap<u32, u64>,
        total_depth: u32,
        txn_count_total: u64,
    ) {
        self.update(|st| {
            st.depth_map = Some(depth_map);
            st.total_depth = Some(total_depth);
            st.txn_count_total = Some(txn_count_total);
        });
    }

    pub(crate) fn txn_count_total(&self) -> Option<u64> {
        self.state.lock().txn_count_total
    }

    pub(crate) fn mark_started(&self) {
        self.update(|st| st.search_started = true);
    }

    pub(crate) fn set_last_search_url(&self, url: String) {
        self.update(|st| st.last_search_url = url);
    }

    pub(crate) fn record_response_bytes(&self, len: u64) {
        self.update(|st| st.gs_response_size += len);
    }

    pub(crate) fn increment_progress(&self) {
        self.update(|st| st.txn_count_progress += 1);
    }

    /// Apply a mutation unless the job is already terminal.
    fn update(&self, f: impl FnOnce(&mut JobState)) {
        let mut st = self.state.lock();
        if !st.job_complete {
            f(&mut *st);
        }
    }

    /// Fetch a cached transaction.
    ///
    /// Returns a fresh copy so a caller that deserializes or mutates it
    /// never touches the cached raw entry.
    pub fn get_tx(&self, txid: &str) -> Option<Transaction> {
        let cached = self.txdata.get(txid)?;
        if cached.is_empty() {
            return None;
        }
        Some(Transaction::new(cached.raw().to_vec()))
    }

    /// Cache a raw transaction. `txid` skips hashing when the caller already
    /// knows it. Returns the key used.
    pub fn put_tx(&self, raw: Vec<u8>, txid: Option<String>) -> String {
        let txid = txid.unwrap_or_else(|| compute_txid(&raw));
        self.txdata.put(txid.clone(), Arc::new(Transaction::new(raw)));
        txid
    }

    /// Drop expired transactions. Returns how many were dropped.
    pub fn sweep_cache(&self) -> usize {
        self.txdata.sweep()
    }

    pub fn cached_tx_count(&self) -> usize {
        self.txdata.len()
    }

    pub fn cache_metrics(&self) -> MetricsSnapshot {
        self.txdata.metrics().snapshot()
    }
}
