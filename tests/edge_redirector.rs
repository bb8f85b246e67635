//! Integration tests for the edge redirector daemon.

use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::mpsc;

use subdomain_gateway::{EdgeConfig, EdgeServer, Shutdown};

mod common;

const CID_V0: &str = "QmbWqxBEKC3P8tqsKc98xmWNzrzDtRLMiMPL8wBuTGsMnR";
const CID_V1: &str = "bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi";

fn edge_config(edge_addr: SocketAddr, upstream_addr: SocketAddr) -> EdgeConfig {
    let mut config = EdgeConfig::default();
    config.listener.bind_address = edge_addr.to_string();
    config.upstream.address = upstream_addr.to_string();
    config
}

/// Spawn an edge server and give it a moment to start accepting.
async fn start_edge(
    config: EdgeConfig,
    edge_addr: SocketAddr,
) -> (Shutdown, mpsc::UnboundedSender<EdgeConfig>) {
    let shutdown = Shutdown::new();
    let (config_tx, config_updates) = mpsc::unbounded_channel();
    let server = EdgeServer::new(config);
    let listener = tokio::net::TcpListener::bind(edge_addr).await.unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });
    tokio::time::sleep(Duration::from_millis(300)).await;

    (shutdown, config_tx)
}

/// A client that maps gateway hostnames onto the local edge listener and
/// never follows redirects.
fn gateway_client(hosts: &[&str], edge_addr: SocketAddr) -> reqwest::Client {
    let mut builder = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy();
    for host in hosts {
        builder = builder.resolve(host, edge_addr);
    }
    builder.build().unwrap()
}

#[tokio::test]
async fn test_path_request_redirects_to_canonical_subdomain() {
    let edge_addr: SocketAddr = "127.0.0.1:28211".parse().unwrap();
    let upstream_addr: SocketAddr = "127.0.0.1:28212".parse().unwrap();
    common::start_mock_upstream(upstream_addr, "upstream").await;
    let _edge = start_edge(edge_config(edge_addr, upstream_addr), edge_addr).await;

    let client = gateway_client(&["example.com"], edge_addr);
    let res = client
        .get(format!(
            "http://example.com:{}/ipfs/{CID_V0}/a/b?x=1",
            edge_addr.port()
        ))
        .send()
        .await
        .expect("edge unreachable");

    assert_eq!(res.status(), 301);
    assert_eq!(
        res.headers().get("location").unwrap(),
        &format!(
            "http://{CID_V1}.ipfs.example.com:{}/a/b?x=1",
            edge_addr.port()
        )
    );
    assert_eq!(
        res.headers().get("cache-control").unwrap(),
        "public, max-age=31536000, immutable"
    );
}

#[tokio::test]
async fn test_malformed_identifier_passes_through() {
    let edge_addr: SocketAddr = "127.0.0.1:28213".parse().unwrap();
    let upstream_addr: SocketAddr = "127.0.0.1:28214".parse().unwrap();
    common::start_mock_upstream(upstream_addr, "upstream content").await;
    let _edge = start_edge(edge_config(edge_addr, upstream_addr), edge_addr).await;

    let client = gateway_client(&["example.com"], edge_addr);
    for path in ["/ipfs/not-a-cid", "/ipfs/", "/about"] {
        let res = client
            .get(format!(
                "http://example.com:{}{path}",
                edge_addr.port()
            ))
            .send()
            .await
            .expect("edge unreachable");

        assert_eq!(res.status(), 200, "path {path} must pass through");
        assert_eq!(
            res.headers().get("cache-control").unwrap(),
            "public, s-maxage=300"
        );
        assert_eq!(res.text().await.unwrap(), "upstream content");
    }
}

#[tokio::test]
async fn test_worker_assets_share_cache_key_across_subdomains() {
    let edge_addr: SocketAddr = "127.0.0.1:28215".parse().unwrap();
    let upstream_addr: SocketAddr = "127.0.0.1:28216".parse().unwrap();
    common::start_mock_upstream(upstream_addr, "// worker").await;
    let _edge = start_edge(edge_config(edge_addr, upstream_addr), edge_addr).await;

    let client = gateway_client(&["example.com", "bafkqaaa.ipfs.example.com"], edge_addr);
    let port = edge_addr.port();

    let from_root = client
        .get(format!("http://example.com:{port}/gw-sw-main.js"))
        .send()
        .await
        .unwrap();
    let from_subdomain = client
        .get(format!(
            "http://bafkqaaa.ipfs.example.com:{port}/gw-sw-main.js"
        ))
        .send()
        .await
        .unwrap();

    assert_eq!(from_root.status(), 200);
    assert_eq!(from_subdomain.status(), 200);
    assert_eq!(
        from_root.headers().get("cache-control").unwrap(),
        "public, s-maxage=86400"
    );

    let root_key = from_root.headers().get("x-edge-cache-key").unwrap();
    let subdomain_key = from_subdomain.headers().get("x-edge-cache-key").unwrap();
    assert_eq!(root_key, subdomain_key);
    assert_eq!(root_key, "https://example.com/gw-sw-main.js");
}

#[tokio::test]
async fn test_upstream_errors_are_not_cached() {
    let edge_addr: SocketAddr = "127.0.0.1:28217".parse().unwrap();
    let upstream_addr: SocketAddr = "127.0.0.1:28218".parse().unwrap();
    common::start_programmable_upstream(upstream_addr, || async {
        (404, "no such content".to_string())
    })
    .await;
    let _edge = start_edge(edge_config(edge_addr, upstream_addr), edge_addr).await;

    let client = gateway_client(&["bafkqaaa.ipfs.example.com"], edge_addr);
    let res = client
        .get(format!(
            "http://bafkqaaa.ipfs.example.com:{}/missing",
            edge_addr.port()
        ))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 404);
    assert_eq!(res.headers().get("cache-control").unwrap(), "no-store");
}

#[tokio::test]
async fn test_config_swap_applies_without_restart() {
    let edge_addr: SocketAddr = "127.0.0.1:28219".parse().unwrap();
    let upstream_addr: SocketAddr = "127.0.0.1:28220".parse().unwrap();
    common::start_mock_upstream(upstream_addr, "upstream").await;
    let config = edge_config(edge_addr, upstream_addr);
    let (_shutdown, config_tx) = start_edge(config.clone(), edge_addr).await;

    let client = gateway_client(&["example.com"], edge_addr);
    let url = format!("http://example.com:{}/about", edge_addr.port());

    let before = client.get(&url).send().await.unwrap();
    assert_eq!(
        before.headers().get("cache-control").unwrap(),
        "public, s-maxage=300"
    );

    let mut updated = config;
    updated.cache.content_ttl_secs = 60;
    config_tx.send(updated).unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let after = client.get(&url).send().await.unwrap();
    assert_eq!(
        after.headers().get("cache-control").unwrap(),
        "public, s-maxage=60"
    );
}
