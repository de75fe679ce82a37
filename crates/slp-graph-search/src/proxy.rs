//! Trusted validation queries against gs++.
//!
//! A [`ProxyQuerier`] owns one worker thread that answers batches of txids
//! in submission order. Only positive answers are kept: they are remembered
//! for the lifetime of the querier and handed to callbacks. A txid missing
//! from the results is unknown and must be validated locally; the server's
//! word alone never marks a transaction invalid.

use std::collections::{BTreeSet, HashMap};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use slp_transport::GraphSearchClient;
use tracing::{debug, error, warn};

use crate::transport::ValidityTransport;

pub const DEFAULT_PROXY_THREAD_NAME: &str = "ProxyQuerier";

/// Called on the worker thread with the requested txids and the ones among
/// them known to be valid. Every value in the map is `true`.
pub type ValidityCallback = Box<dyn FnOnce(&BTreeSet<String>, &HashMap<String, bool>) + Send>;

enum ProxyMessage {
    Query(BTreeSet<String>, ValidityCallback),
    Shutdown,
}

pub struct ProxyQuerier {
    queue: Sender<ProxyMessage>,
    past_results: Arc<Mutex<HashMap<String, bool>>>,
    worker: Option<JoinHandle<()>>,
}

impl ProxyQuerier {
    /// Querier backed by HTTP with the default 3 second request timeout.
    pub fn new(host: impl Into<String>, connect_timeout: Duration) -> Result<Self> {
        let client = Arc::new(GraphSearchClient::new(connect_timeout));
        Self::with_transport(host, client, DEFAULT_PROXY_THREAD_NAME)
    }

    pub fn with_transport(
        host: impl Into<String>,
        transport: Arc<dyn ValidityTransport>,
        thread_name: &str,
    ) -> Result<Self> {
        let (queue, rx) = mpsc::channel();
        let past_results = Arc::new(Mutex::new(HashMap::new()));
        let worker = ProxyWorker {
            host: host.into(),
            transport,
            past_results: past_results.clone(),
        };
        let handle = std::thread::Builder::new()
            .name(thread_name.to_string())
            .spawn(move || worker.run(rx))
            .context("Failed to spawn proxy querier")?;

        Ok(Self {
            queue,
            past_results,
            worker: Some(handle),
        })
    }

    /// Queue a validity lookup. Duplicate txids collapse; the deduplicated
    /// set is returned and later handed to `callback`.
    pub fn add_job<I, S>(&self, txids: I, callback: ValidityCallback) -> Result<BTreeSet<String>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let txids: BTreeSet<String> = txids.into_iter().map(Into::into).collect();
        self.queue
            .send(ProxyMessage::Query(txids.clone(), callback))
            .map_err(|_| anyhow::anyhow!("proxy querier worker is not running"))?;
        Ok(txids)
    }

    /// Remembered result for `txid`, if any.
    pub fn past_result(&self, txid: &str) -> Option<bool> {
        self.past_results.lock().get(txid).copied()
    }

    pub fn past_result_count(&self) -> usize {
        self.past_results.lock().len()
    }

    pub fn shutdown(mut self) {
        let _ = self.queue.send(ProxyMessage::Shutdown);
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                error!("proxy querier panicked during shutdown");
            }
        }
    }
}

impl Drop for ProxyQuerier {
    fn drop(&mut self) {
        if self.worker.is_some() {
            let _ = self.queue.send(ProxyMessage::Shutdown);
        }
    }
}

struct ProxyWorker {
    host: String,
    transport: Arc<dyn ValidityTransport>,
    past_results: Arc<Mutex<HashMap<String, bool>>>,
}

impl ProxyWorker {
    fn run(self, queue: Receiver<ProxyMessage>) {
        while let Ok(message) = queue.recv() {
            match message {
                ProxyMessage::Query(txids, callback) => {
                    let results = self.answer(&txids);
                    callback(&txids, &results);
                }
                ProxyMessage::Shutdown => {
                    debug!("proxy querier shutting down");
                    return;
                }
            }
        }
        error!("proxy thread died");
    }

    fn answer(&self, txids: &BTreeSet<String>) -> HashMap<String, bool> {
        let mut results = HashMap::new();
        let unknown: Vec<&String> = {
            let past = self.past_results.lock();
            txids
                .iter()
                .filter(|txid| match past.get(*txid) {
                    Some(valid) => {
                        results.insert((*txid).clone(), *valid);
                        false
                    }
                    None => true,
                })
                .collect()
        };

        for txid in unknown {
            debug!(txid = %txid, host = %self.host, "requesting trusted validation");
            match self.transport.trusted_validation(&self.host, txid) {
                Ok(true) => {
                    self.past_results.lock().insert(txid.clone(), true);
                    results.insert(txid.clone(), true);
                }
                Ok(false) => {
                    debug!(txid = %txid, "trusted validation negative, leaving unknown");
                }
                Err(e) => {
                    warn!(txid = %txid, error = %format!("{:#}", e), "error in proxy query");
                }
            }
        }
        results
    }
}
