//! Output formatting for the slp-gs CLI

use std::collections::BTreeMap;

use serde::Serialize;
use slp_graph_search::job::TX_CACHE_NAME;
use slp_graph_search::{JobStatus, MetricsSnapshot};

#[derive(Debug, Serialize)]
pub struct SearchOutput {
    pub host: String,
    pub status: JobStatus,
    pub cached_txns: usize,
    pub bytes_downloaded: u64,
    pub elapsed_ms: u128,
    pub cache: MetricsSnapshot,
}

#[derive(Debug, Serialize)]
pub struct ValidateOutput {
    pub host: String,
    /// `None` unless the server vouched for the txid.
    pub results: BTreeMap<String, Option<bool>>,
}

pub fn print_search_result(output: &SearchOutput, verbose: bool) {
    let status = &output.status;
    match status.search_success {
        Some(true) => println!("\x1b[32m✓ Graph search complete\x1b[0m"),
        Some(false) => println!(
            "\x1b[31m✗ Graph search failed: {}\x1b[0m",
            status.exit_msg.as_deref().unwrap_or("unknown error")
        ),
        None => println!("\x1b[33m… Graph search still running\x1b[0m"),
    }
    println!();
    println!("Root txid:    {}", status.root_txid);
    println!("Server:       {}", status.last_search_url);
    println!("Transactions: {}", status.txn_count_progress);
    println!("Downloaded:   {}", format_bytes(output.bytes_downloaded));
    println!("Elapsed:      {} ms", output.elapsed_ms);

    if verbose {
        if let Some(total) = status.txn_count_total {
            println!("Expected:     {}", total);
        }
        println!();
        println!("{}", output.cache.format_report(TX_CACHE_NAME));
    }
}

pub fn print_validate_result(output: &ValidateOutput) {
    for (txid, result) in &output.results {
        let verdict = match result {
            Some(true) => "\x1b[32mvalid\x1b[0m",
            _ => "\x1b[33munknown\x1b[0m",
        };
        println!("{}  {}", txid, verdict);
    }
}

/// Format an error for the terminal, or as a JSON object.
pub fn format_error(error: &anyhow::Error, json_output: bool) -> String {
    if json_output {
        #[derive(Serialize)]
        struct ErrorJson {
            error: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            cause: Option<String>,
        }

        let err = ErrorJson {
            error: error.to_string(),
            cause: error.source().map(|e| e.to_string()),
        };
        serde_json::to_string_pretty(&err).unwrap_or_else(|_| "{}".to_string())
    } else {
        let mut out = format!("\x1b[31mError:\x1b[0m {}\n", error);
        let mut causes = error.chain().skip(1).peekable();
        if causes.peek().is_some() {
            out.push_str("Caused by:\n");
            for (idx, cause) in causes.enumerate() {
                out.push_str(&format!("  {}: {}\n", idx + 1, cause));
            }
        }
        out
    }
}

fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    let b = bytes as f64;
    if b >= KIB * KIB {
        format!("{:.1} MiB", b / (KIB * KIB))
    } else if b >= KIB {
        format!("{:.1} KiB", b / KIB)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KiB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MiB");
    }

    #[test]
    fn test_format_error_json() {
        let err = anyhow::anyhow!("not found");
        let out = format_error(&err, true);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["error"], "not found");
        assert!(value.get("cause").is_none());
    }
}
