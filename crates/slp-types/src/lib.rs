//! Shared types for the slp-gs workspace.
//!
//! This crate provides foundational types used across the transport and
//! graph search crates:
//!
//! - [`Transaction`](transaction::Transaction) - Undeserialized raw transaction
//! - [`encoding`] - Hex/base64 helpers and txid byte-order conversion
//! - [`env_utils`] - Typed environment variable parsing

pub mod encoding;
pub mod env_utils;
pub mod transaction;

pub use transaction::{compute_txid, Transaction};

pub use env_utils::{env_bool, env_string_or, env_var, env_var_or};
