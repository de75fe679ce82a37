//! Validate command - trusted validity lookups

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use slp_graph_search::{GraphSearchConfig, ProxyQuerier};
use slp_types::encoding::validate_txid;
use tokio::sync::oneshot;

use super::output::{format_error, print_validate_result, ValidateOutput};

#[derive(Parser, Debug)]
pub struct ValidateCmd {
    /// Transaction ids (display order hex)
    #[arg(value_name = "TXID", required = true)]
    pub txids: Vec<String>,

    /// Give up waiting after this many seconds
    #[arg(long, default_value_t = 60)]
    pub timeout: u64,
}

impl ValidateCmd {
    pub async fn execute(&self, config: GraphSearchConfig, json_output: bool) -> Result<()> {
        match self.execute_inner(config).await {
            Ok(output) => {
                if json_output {
                    println!("{}", serde_json::to_string_pretty(&output)?);
                } else {
                    print_validate_result(&output);
                }
                Ok(())
            }
            Err(e) => {
                eprintln!("{}", format_error(&e, json_output));
                Err(e)
            }
        }
    }

    async fn execute_inner(&self, config: GraphSearchConfig) -> Result<ValidateOutput> {
        for txid in &self.txids {
            validate_txid(txid)?;
        }

        let querier = ProxyQuerier::new(config.host.as_str(), config.connect_timeout)?;
        let (tx, rx) = oneshot::channel();
        let requested = querier.add_job(
            self.txids.iter().cloned(),
            Box::new(move |_: &BTreeSet<String>, results: &HashMap<String, bool>| {
                let _ = tx.send(results.clone());
            }),
        )?;

        let results = tokio::time::timeout(Duration::from_secs(self.timeout), rx)
            .await
            .context("trusted validation timed out")?
            .context("proxy querier dropped the request")?;
        querier.shutdown();

        Ok(ValidateOutput {
            host: config.host,
            results: requested
                .into_iter()
                .map(|txid| {
                    let valid = results.get(&txid).copied();
                    (txid, valid)
                })
                .collect::<BTreeMap<_, _>>(),
        })
    }
}
