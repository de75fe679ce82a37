//! slp-gs subcommands

pub mod output;
pub mod search;
pub mod validate;

use slp_graph_search::GraphSearchConfig;
use slp_transport::resolve_gs_host;

/// Environment configuration with the `--host` flag applied on top.
pub fn load_config(host: Option<&str>) -> GraphSearchConfig {
    GraphSearchConfig::from_env().with_host(resolve_gs_host(host))
}
