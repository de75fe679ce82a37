//! Seams between the workers and the network.

use anyhow::Result;
use slp_transport::{GraphSearchClient, GraphSearchStream};

/// Opens graph search response streams.
pub trait SearchTransport: Send + Sync {
    fn open_search(&self, host: &str, root_txid: &str) -> Result<GraphSearchStream>;
}

/// Answers trusted validation queries.
pub trait ValidityTransport: Send + Sync {
    fn trusted_validation(&self, host: &str, txid: &str) -> Result<bool>;
}

impl SearchTransport for GraphSearchClient {
    fn open_search(&self, host: &str, root_txid: &str) -> Result<GraphSearchStream> {
        self.open_graph_search(host, root_txid)
    }
}

impl ValidityTransport for GraphSearchClient {
    fn trusted_validation(&self, host: &str, txid: &str) -> Result<bool> {
        GraphSearchClient::trusted_validation(self, host, txid)
    }
}
