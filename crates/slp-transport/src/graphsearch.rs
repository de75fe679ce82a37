//! gs++ Graph Search Client
//!
//! Talks to a gs++ server over HTTP:
//!
//! 1. `POST /v1/graphsearch/graphsearch` streams back every ancestor
//!    transaction of a root txid, base64-encoded in one JSON document
//! 2. `POST /v1/graphsearch/trustedvalidation` returns the server's
//!    validity verdict for a single txid
//!
//! Both endpoints take `{"txid": <hex>}` with the txid in internal byte
//! order, i.e. reversed from the display order used by the wallet.
//!
//! # Example
//!
//! ```ignore
//! use slp_transport::GraphSearchClient;
//!
//! let client = GraphSearchClient::new(Duration::from_secs(60));
//! let valid = client.trusted_validation(DEFAULT_GS_HOST, &txid)?;
//! ```

use std::fmt;
use std::io::Read;
use std::time::Duration;

use anyhow::{anyhow, Result};
use serde_json::json;
use slp_types::encoding::reverse_txid_hex;
use tracing::debug;

use crate::network::{graph_search_url, trusted_validation_url};
use crate::response::parse_trusted_validation_response;

/// Per-request timeout for trusted validation queries.
pub const VALIDATION_TIMEOUT: Duration = Duration::from_secs(3);

/// An open graph search response.
///
/// The body has not been read yet; callers pull it chunk by chunk so they
/// can stop early.
pub struct GraphSearchStream {
    /// Full request URL
    pub url: String,
    /// HTTP status code (non-2xx bodies still carry the gs++ error)
    pub status: u16,
    /// Unread response body
    pub body: Box<dyn Read + Send>,
}

impl fmt::Debug for GraphSearchStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphSearchStream")
            .field("url", &self.url)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// HTTP client for the gs++ endpoints.
#[derive(Clone, Debug)]
pub struct GraphSearchClient {
    /// HTTP client for requests
    http_client: ureq::Agent,
    validation_timeout: Duration,
}

impl GraphSearchClient {
    /// Create a client that uses `timeout` both to connect and for each
    /// socket read.
    pub fn new(timeout: Duration) -> Self {
        Self::with_timeouts(timeout, timeout)
    }

    /// Create a client with separate connect and per-read timeouts.
    ///
    /// The read timeout bounds each wait for data, not the whole body:
    /// graph search bodies can take minutes to stream, but a server that
    /// goes silent fails the request instead of stalling the caller.
    pub fn with_timeouts(connect_timeout: Duration, read_timeout: Duration) -> Self {
        Self {
            http_client: ureq::AgentBuilder::new()
                .timeout_connect(connect_timeout)
                .timeout_read(read_timeout)
                .timeout_write(read_timeout)
                .build(),
            validation_timeout: VALIDATION_TIMEOUT,
        }
    }

    pub fn with_validation_timeout(mut self, timeout: Duration) -> Self {
        self.validation_timeout = timeout;
        self
    }

    /// Start a graph search for `root_txid` (display order).
    pub fn open_graph_search(&self, host: &str, root_txid: &str) -> Result<GraphSearchStream> {
        let url = graph_search_url(host);
        let txid = reverse_txid_hex(root_txid)?;
        debug!(root_txid, reversed = %txid, url = %url, "requesting graph search");

        let response = self.post_txid(&url, &txid, None)?;
        Ok(GraphSearchStream {
            url,
            status: response.status(),
            body: Box::new(response.into_reader()),
        })
    }

    /// Ask the server whether `txid` (display order) is a valid SLP transaction.
    pub fn trusted_validation(&self, host: &str, txid: &str) -> Result<bool> {
        let url = trusted_validation_url(host);
        let reversed = reverse_txid_hex(txid)?;
        debug!(txid, reversed = %reversed, "requesting trusted validation");

        let response = self.post_txid(&url, &reversed, Some(self.validation_timeout))?;
        let mut body = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut body)
            .map_err(|e| anyhow!("Failed to read trusted validation response: {}", e))?;

        parse_trusted_validation_response(&body)
    }

    fn post_txid(
        &self,
        url: &str,
        txid: &str,
        timeout: Option<Duration>,
    ) -> Result<ureq::Response> {
        let mut request = self.http_client.post(url);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        match request.send_json(json!({ "txid": txid })) {
            Ok(response) => Ok(response),
            // gs++ puts its error message in the body; let the caller decode it.
            Err(ureq::Error::Status(_, response)) => Ok(response),
            Err(e) => Err(anyhow!("Failed to reach gs++ at {}: {}", url, e)),
        }
    }
}
