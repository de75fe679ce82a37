//! Search command - download a transaction's ancestry graph

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use slp_graph_search::{
    GraphSearchConfig, GraphSearchManager, NetworkConfig, ProgressSink, SimpleValidationJob,
};
use slp_types::encoding::validate_txid;
use tracing::debug;

use super::output::{format_error, print_search_result, SearchOutput};

#[derive(Parser, Debug)]
pub struct SearchCmd {
    /// Root transaction id (display order hex)
    #[arg(value_name = "TXID")]
    pub txid: String,

    /// Give up waiting after this many seconds
    #[arg(long, default_value_t = 300)]
    pub timeout: u64,
}

impl SearchCmd {
    pub async fn execute(
        &self,
        config: GraphSearchConfig,
        json_output: bool,
        verbose: bool,
    ) -> Result<()> {
        match self.execute_inner(config).await {
            Ok(output) => {
                if json_output {
                    println!("{}", serde_json::to_string_pretty(&output)?);
                } else {
                    print_search_result(&output, verbose);
                }
                match output.status.search_success {
                    Some(true) => Ok(()),
                    Some(false) => Err(anyhow::anyhow!(
                        "graph search failed: {}",
                        output.status.exit_msg.as_deref().unwrap_or("unknown error")
                    )),
                    None => Err(anyhow::anyhow!(
                        "graph search did not finish within {}s",
                        self.timeout
                    )),
                }
            }
            Err(e) => {
                eprintln!("{}", format_error(&e, json_output));
                Err(e)
            }
        }
    }

    async fn execute_inner(&self, config: GraphSearchConfig) -> Result<SearchOutput> {
        validate_txid(&self.txid)?;

        let host = config.host.clone();
        let manager = GraphSearchManager::new(config)?;
        let progress: ProgressSink = Arc::new(|total: u64| {
            debug!(bytes = total, "graph search progress");
        });
        let valjob = Arc::new(SimpleValidationJob::new(
            self.txid.clone(),
            NetworkConfig::new(host.as_str()).with_progress(progress),
        ));

        let started = Instant::now();
        let job = manager.request_search(valjob.clone());

        let waiter = job.clone();
        let timeout = Duration::from_secs(self.timeout);
        tokio::task::spawn_blocking(move || waiter.wait_complete(timeout))
            .await
            .context("graph search wait task failed")?;

        // Stop the validation job so an unfinished search unwinds at its next chunk.
        valjob.set_running(false);

        Ok(SearchOutput {
            host,
            status: job.status(),
            cached_txns: job.cached_tx_count(),
            bytes_downloaded: manager.bytes_downloaded(),
            elapsed_ms: started.elapsed().as_millis(),
            cache: job.cache_metrics(),
        })
    }
}
