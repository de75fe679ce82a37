//! Background graph search for SLP token validation.
//!
//! Validating an SLP token transaction needs its whole ancestry. Rather than
//! fetch parents one at a time, a validation job asks a gs++ server for the
//! full graph in a single request. This crate runs those requests in the
//! background and keeps the results where the validator can reach them.
//!
//! - [`GraphSearchManager`] - one job per root txid, processed in FIFO order
//!   by a dedicated worker thread
//! - [`GraphSearchJob`] - status, progress, and an expiring cache of the
//!   fetched transactions
//! - [`ProxyQuerier`] - trusted validity lookups for individual txids
//! - [`ExpiringCache`] - thread-safe TTL + LRU map used for fetched txs
//!
//! # Example
//!
//! ```ignore
//! use slp_graph_search::{GraphSearchConfig, GraphSearchManager, NetworkConfig, SimpleValidationJob};
//!
//! let manager = GraphSearchManager::new(GraphSearchConfig::from_env())?;
//! let valjob = Arc::new(SimpleValidationJob::new(txid, NetworkConfig::default()));
//! let job = manager.request_search(valjob.clone());
//! if job.wait_complete(Duration::from_secs(300)) && job.search_success() == Some(true) {
//!     let parent = job.get_tx(&parent_txid);
//! }
//! ```

pub mod cache;
pub mod config;
pub mod job;
pub mod manager;
pub mod metrics;
pub mod proxy;
pub mod transport;
pub mod validation;

// Re-export main types
pub use cache::{Clock, ExpiringCache, ManualClock, SystemClock};
pub use config::GraphSearchConfig;
pub use job::{CancelCallback, CancelRequest, GraphSearchJob, JobStatus};
pub use manager::GraphSearchManager;
pub use metrics::{CacheMetrics, MetricsSnapshot};
pub use proxy::{ProxyQuerier, ValidityCallback};
pub use transport::{SearchTransport, ValidityTransport};
pub use validation::{NetworkConfig, ProgressSink, SimpleValidationJob, ValidationJob};
