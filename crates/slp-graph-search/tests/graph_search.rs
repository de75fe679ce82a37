//! End-to-end tests for graph search over HTTP.
//!
//! A tiny gs++ stand-in runs on a local `TcpListener` and answers each
//! connection with a scripted status and JSON body.
//!
//! The live test talks to the public gs++ server and is ignored by default:
//!
//! ```bash
//! cargo test -p slp-graph-search --test graph_search -- --ignored --nocapture
//! ```

use std::collections::{BTreeSet, HashMap};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use base64::Engine;
use serde_json::json;
use slp_graph_search::{
    GraphSearchConfig, GraphSearchManager, NetworkConfig, ProxyQuerier, SimpleValidationJob,
};
use slp_types::compute_txid;

const WAIT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
struct RecordedRequest {
    path: String,
    body: serde_json::Value,
}

fn write_http_json(stream: &mut TcpStream, status: &str, body: &str) {
    let resp = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let _ = stream.write_all(resp.as_bytes());
}

fn read_request(stream: &mut TcpStream) -> RecordedRequest {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let mut header_bytes = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        match stream.read(&mut byte) {
            Ok(0) => break,
            Ok(_) => {
                header_bytes.push(byte[0]);
                if header_bytes.ends_with(b"\r\n\r\n") {
                    break;
                }
            }
            Err(_) => break,
        }
    }

    let header_text = String::from_utf8_lossy(&header_bytes).to_string();
    let mut lines = header_text.split("\r\n");
    let request_line = lines.next().unwrap_or_default();
    let path = request_line.split(' ').nth(1).unwrap_or_default().to_string();

    let mut headers = HashMap::new();
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }

    let body = match headers.get("content-length").and_then(|v| v.parse::<usize>().ok()) {
        Some(len) => {
            let mut body = vec![0u8; len];
            let _ = stream.read_exact(&mut body);
            body
        }
        None => read_chunked_body(stream),
    };

    RecordedRequest {
        path,
        body: serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null),
    }
}

fn read_chunked_body(stream: &mut TcpStream) -> Vec<u8> {
    let mut body = Vec::new();
    loop {
        let mut line = Vec::new();
        let mut buf = [0u8; 1];
        while !line.ends_with(b"\r\n") {
            match stream.read(&mut buf) {
                Ok(1) => line.push(buf[0]),
                _ => return body,
            }
        }
        let size_str = String::from_utf8_lossy(&line[..line.len() - 2]).to_string();
        let size = usize::from_str_radix(size_str.trim(), 16).unwrap_or(0);
        let mut chunk = vec![0u8; size + 2];
        if size == 0 || stream.read_exact(&mut chunk).is_err() {
            return body;
        }
        body.extend_from_slice(&chunk[..size]);
    }
}

/// Serve one scripted response per connection, in order.
fn spawn_gs_server(
    responses: Vec<(&'static str, String)>,
) -> (String, Arc<Mutex<Vec<RecordedRequest>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let host = format!("http://{}", listener.local_addr().unwrap());
    let recorded = Arc::new(Mutex::new(Vec::new()));
    let server_recorded = recorded.clone();

    thread::spawn(move || {
        for (status, body) in responses {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            let request = read_request(&mut stream);
            server_recorded.lock().unwrap().push(request);
            write_http_json(&mut stream, status, &body);
        }
    });

    (host, recorded)
}

/// Accept connections and never answer them.
fn spawn_silent_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let host = format!("http://{}", listener.local_addr().unwrap());
    thread::spawn(move || {
        let mut held = Vec::new();
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => held.push(stream),
                Err(_) => return,
            }
        }
    });
    host
}

fn txdata_body(txs: &[&[u8]]) -> String {
    let encoded: Vec<String> = txs
        .iter()
        .map(|tx| base64::engine::general_purpose::STANDARD.encode(tx))
        .collect();
    json!({ "txdata": encoded }).to_string()
}

/// Display-order txid 00 01 .. 1f and its byte-reversed form.
fn sample_txid() -> (String, String) {
    let bytes: Vec<u8> = (0u8..32).collect();
    let display = bytes.iter().map(|b| format!("{:02x}", b)).collect::<String>();
    let reversed = bytes.iter().rev().map(|b| format!("{:02x}", b)).collect::<String>();
    (display, reversed)
}

fn manager_for(host: &str) -> GraphSearchManager {
    let config = GraphSearchConfig {
        connect_timeout: Duration::from_secs(5),
        ..GraphSearchConfig::default()
    }
    .with_host(host);
    GraphSearchManager::new(config).unwrap()
}

#[test]
fn test_graph_search_over_http() {
    let parent: &[u8] = b"\x02\x00\x00\x00 parent";
    let grandparent: &[u8] = b"\x02\x00\x00\x00 grandparent";
    let (host, recorded) = spawn_gs_server(vec![("200 OK", txdata_body(&[parent, grandparent]))]);
    let manager = manager_for(&host);
    let (root_txid, reversed) = sample_txid();

    // An empty host on the validation job falls back to the manager default.
    let valjob = Arc::new(SimpleValidationJob::new(root_txid.clone(), NetworkConfig::new("")));
    let job = manager.request_search(valjob.clone());
    assert!(job.wait_complete(WAIT));

    let status = job.status();
    assert_eq!(status.search_success, Some(true), "exit_msg: {:?}", status.exit_msg);
    assert_eq!(status.txn_count_progress, 2);
    assert_eq!(status.last_search_url, format!("{}/v1/graphsearch/graphsearch", host));
    assert_eq!(job.get_tx(&compute_txid(parent)).unwrap().raw(), parent);
    assert_eq!(job.get_tx(&compute_txid(grandparent)).unwrap().raw(), grandparent);
    assert!(manager.bytes_downloaded() > 0);

    let requests = recorded.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/v1/graphsearch/graphsearch");
    assert_eq!(requests[0].body["txid"], reversed);
}

#[test]
fn test_graph_search_error_status_uses_body_message() {
    let (host, _) = spawn_gs_server(vec![(
        "404 Not Found",
        json!({ "error": "not found" }).to_string(),
    )]);
    let manager = manager_for(&host);
    let (root_txid, _) = sample_txid();

    let valjob = Arc::new(SimpleValidationJob::new(root_txid, NetworkConfig::new(host.as_str())));
    let job = manager.request_search(valjob.clone());
    assert!(job.wait_complete(WAIT));
    assert_eq!(job.search_success(), Some(false));
    assert_eq!(job.exit_msg().as_deref(), Some("not found"));
    assert!(job.status().search_started);
}

#[test]
fn test_graph_search_unreachable_host() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let host = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let manager = manager_for(&host);
    let (root_txid, _) = sample_txid();
    let valjob = Arc::new(SimpleValidationJob::new(root_txid, NetworkConfig::default()));
    let job = manager.request_search(valjob.clone());

    assert!(job.wait_complete(WAIT));
    assert_eq!(job.search_success(), Some(false));
    assert!(job.exit_msg().unwrap().contains("Failed to reach gs++"));
}

#[test]
fn test_silent_server_fails_job_and_frees_worker() {
    let host = spawn_silent_server();
    let config = GraphSearchConfig {
        connect_timeout: Duration::from_secs(1),
        read_timeout: Duration::from_secs(1),
        ..GraphSearchConfig::default()
    }
    .with_host(host.as_str());
    let manager = GraphSearchManager::new(config).unwrap();

    let first = Arc::new(SimpleValidationJob::new("11".repeat(32), NetworkConfig::default()));
    let second = Arc::new(SimpleValidationJob::new("22".repeat(32), NetworkConfig::default()));
    let job_first = manager.request_search(first.clone());
    let job_second = manager.request_search(second.clone());

    assert!(job_first.wait_complete(WAIT));
    assert_eq!(job_first.search_success(), Some(false));
    assert!(job_first.exit_msg().unwrap().contains("Failed to reach gs++"));

    // The queued job still gets its turn once the stalled one gives up.
    assert!(job_second.wait_complete(WAIT));
    assert_eq!(job_second.search_success(), Some(false));
    assert!(job_second.status().search_started);
}

#[test]
fn test_trusted_validation_over_http() {
    let (host, recorded) = spawn_gs_server(vec![("200 OK", json!({ "valid": true }).to_string())]);
    let querier = ProxyQuerier::new(host.as_str(), Duration::from_secs(5)).unwrap();
    let (txid, reversed) = sample_txid();

    let (tx, rx) = mpsc::channel();
    querier
        .add_job(
            [txid.clone()],
            Box::new(move |_: &BTreeSet<String>, results: &HashMap<String, bool>| {
                let _ = tx.send(results.clone());
            }),
        )
        .unwrap();

    let results = rx.recv_timeout(WAIT).unwrap();
    assert_eq!(results.get(&txid), Some(&true));
    assert_eq!(querier.past_result(&txid), Some(true));

    let requests = recorded.lock().unwrap();
    assert_eq!(requests[0].path, "/v1/graphsearch/trustedvalidation");
    assert_eq!(requests[0].body["txid"], reversed);
}

/// Requires network access to gs.fountainhead.cash.
#[test]
#[ignore]
fn test_live_graph_search() {
    let txid = std::env::var("SLP_GS_TEST_TXID").unwrap_or_else(|_| {
        "959ee3a7f2b1d7c6b1d2d28ca8e8ee0b1a85ca5e8baf7e4e6c4b80c1c3c54d0a".to_string()
    });
    let manager = GraphSearchManager::new(GraphSearchConfig::from_env()).unwrap();
    let valjob = Arc::new(SimpleValidationJob::new(txid, NetworkConfig::default()));

    let job = manager.request_search(valjob.clone());
    assert!(job.wait_complete(Duration::from_secs(300)));
    let status = job.status();
    println!("{}", serde_json::to_string_pretty(&status).unwrap());
    assert!(status.search_started);
}
