//! Shared utilities for integration testing.

use std::net::SocketAddr;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

/// Start a minimal HTTP backend that answers every connection with 200 OK.
/// Used as a stand-in RPC endpoint for connectivity probes.
#[allow(dead_code)]
pub async fn start_mock_endpoint(addr: SocketAddr) {
    let listener = TcpListener::bind(addr).await.unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let body = "{\"jsonrpc\":\"2.0\"}";
                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });
}

/// A validated configuration for tests, pointing the RPC endpoint at the
/// given address.
#[allow(dead_code)]
pub fn test_config(rpc_addr: &str) -> stake_guard::config::ConfigManager {
    stake_guard::config::ConfigManager::from_vars([
        ("NETWORK".to_string(), "base-sepolia".to_string()),
        ("RPC_URL".to_string(), format!("http://{rpc_addr}")),
        (
            "CONTRACT_ADDRESS".to_string(),
            "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string(),
        ),
        ("OPERATOR_KEY".to_string(), "0xdeadbeef".to_string()),
    ])
    .unwrap()
}
