//! SLP Transport Layer
//!
//! Blocking HTTP transport for the gs++ graph search server.
//!
//! This crate provides:
//! - [`graphsearch`]: client for the streaming graph search and trusted
//!   validation endpoints
//! - [`response`]: decoding of gs++ JSON response bodies
//! - [`network`]: endpoint defaults and resolution
//!
//! # Example
//!
//! ```ignore
//! use std::io::Read;
//! use std::time::Duration;
//! use slp_transport::GraphSearchClient;
//!
//! let client = GraphSearchClient::new(Duration::from_secs(60));
//! let mut stream = client.open_graph_search("https://gs.fountainhead.cash", &txid)?;
//! let mut body = Vec::new();
//! stream.body.read_to_end(&mut body)?;
//! let txdata = slp_transport::response::parse_graph_search_response(&body)?;
//! ```

pub mod graphsearch;
pub mod network;
pub mod response;

// Re-export main types for convenience
pub use graphsearch::{GraphSearchClient, GraphSearchStream};
pub use network::{resolve_gs_host, DEFAULT_GS_HOST};
