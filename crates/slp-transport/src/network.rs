/// Public gs++ instance.
pub const DEFAULT_GS_HOST: &str = "https://gs.fountainhead.cash";

/// Graph search endpoint path, appended to the host.
pub const GRAPH_SEARCH_PATH: &str = "/v1/graphsearch/graphsearch";
/// Trusted validation endpoint path, appended to the host.
pub const TRUSTED_VALIDATION_PATH: &str = "/v1/graphsearch/trustedvalidation";

/// Pick the gs++ host: explicit value, then `SLP_GS_HOST`, then the default.
pub fn resolve_gs_host(explicit: Option<&str>) -> String {
    if let Some(host) = explicit {
        if !host.trim().is_empty() {
            return normalize_host(host);
        }
    }
    if let Ok(value) = std::env::var("SLP_GS_HOST") {
        if !value.trim().is_empty() {
            return normalize_host(&value);
        }
    }
    DEFAULT_GS_HOST.to_string()
}

pub fn graph_search_url(host: &str) -> String {
    format!("{}{}", normalize_host(host), GRAPH_SEARCH_PATH)
}

pub fn trusted_validation_url(host: &str) -> String {
    format!("{}{}", normalize_host(host), TRUSTED_VALIDATION_PATH)
}

fn normalize_host(host: &str) -> String {
    host.trim().trim_end_matches('/').to_string()
}
