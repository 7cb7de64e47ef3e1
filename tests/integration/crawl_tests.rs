//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test the full
//! crawl cycle end-to-end. The crawler is pointed at the mock server as its
//! HTTP proxy, so requests for arbitrary domain names arrive there with the
//! name in the `Host` header.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use webgenome::config::{Config, CrawlerConfig, DomainsConfig, StoreConfig, UserAgentConfig};
use webgenome::crawler::Coordinator;
use webgenome::storage::{DomainFilter, DomainStore, SharedStore, SqliteStore};
use webgenome::DomainStatus;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration routed through `proxy`
fn create_test_config(seeds: &[&str], proxy: &str, max_workers: u32) -> Config {
    Config {
        crawler: CrawlerConfig {
            batch_size: 50,
            max_workers,
            http_timeout: 5,
            resource_cooldown: 1,
            proxy: Some(proxy.to_string()),
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        store: StoreConfig {
            database_path: "unused.db".to_string(),
        },
        domains: DomainsConfig {
            seeds: seeds.iter().map(|s| s.to_string()).collect(),
            ignore: vec![".blogspot.com".to_string()],
        },
    }
}

fn memory_store() -> SharedStore {
    Arc::new(Mutex::new(
        SqliteStore::new_in_memory().expect("Failed to open in-memory store"),
    ))
}

/// Serves `body` for the front page of `host`
async fn mount_front_page(server: &MockServer, host: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("host", host))
        .respond_with(response)
        .mount(server)
        .await;
}

fn html_page(links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">link</a>"#, href))
        .collect();
    format!("<html><body>{}</body></html>", anchors)
}

#[tokio::test]
async fn test_crawl_discovers_linked_domain() {
    let mock_server = MockServer::start().await;

    mount_front_page(
        &mock_server,
        "a.com",
        ResponseTemplate::new(200)
            .insert_header("server", "nginx/1.18.0")
            .insert_header("x-powered-by", "PHP/7.4.3")
            .insert_header("content-type", "text/html")
            .set_body_string(html_page(&["http://b.com/path", "/local", "https://B.com/"])),
    )
    .await;

    mount_front_page(
        &mock_server,
        "b.com",
        ResponseTemplate::new(200)
            .insert_header("server", "Apache/2.4.41 (Ubuntu)")
            .set_body_string(html_page(&[])),
    )
    .await;

    let store = memory_store();
    let config = create_test_config(&["a.com"], &mock_server.uri(), 2);
    let mut coordinator =
        Coordinator::with_store(config, store.clone(), true).expect("Failed to create coordinator");

    let report = coordinator.run().await.expect("Crawl failed");

    assert_eq!(report.domains, 2);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.discovered, 1);
    // b.com is only found after a.com's batch drains
    assert_eq!(report.batches, 2);

    let guard = store.lock().unwrap();
    let a = guard.find_by_name("a.com").unwrap().expect("a.com missing");
    let b = guard.find_by_name("b.com").unwrap().expect("b.com missing");

    assert_eq!(a.status(), DomainStatus::Checked);
    assert_eq!(a.header("Server"), Some("nginx/1.18.0"));
    assert_eq!(a.header("X-Powered-By"), Some("PHP/7.4.3"));
    assert!(a.last_checked.is_some());

    assert_eq!(b.parent_domain, a.id);
    assert_eq!(b.status(), DomainStatus::Checked);
    assert_eq!(b.header("Server"), Some("Apache/2.4.41 (Ubuntu)"));

    assert_eq!(guard.count(&DomainFilter::All).unwrap(), 2);
}

#[tokio::test]
async fn test_date_header_not_recorded() {
    let mock_server = MockServer::start().await;

    mount_front_page(
        &mock_server,
        "dated.com",
        ResponseTemplate::new(200)
            .insert_header("date", "Mon, 01 Jan 2024 00:00:00 GMT")
            .insert_header("server", "lighttpd/1.4.59"),
    )
    .await;

    let store = memory_store();
    let config = create_test_config(&["dated.com"], &mock_server.uri(), 1);
    let mut coordinator = Coordinator::with_store(config, store.clone(), false).unwrap();
    coordinator.run().await.unwrap();

    let domain = store.lock().unwrap().find_by_name("dated.com").unwrap().unwrap();
    assert_eq!(domain.header("Server"), Some("lighttpd/1.4.59"));
    assert_eq!(domain.header("Date"), None);
    assert!(domain.headers.iter().all(|h| !h.key.eq_ignore_ascii_case("date")));
}

#[tokio::test]
async fn test_ignored_domain_is_never_requested() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("host", "someone.blogspot.com"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let store = memory_store();
    let config = create_test_config(&["someone.blogspot.com"], &mock_server.uri(), 1);
    let mut coordinator = Coordinator::with_store(config, store.clone(), false).unwrap();

    let report = coordinator.run().await.unwrap();
    assert_eq!(report.skipped, 1);

    let domain = store
        .lock()
        .unwrap()
        .find_by_name("someone.blogspot.com")
        .unwrap()
        .unwrap();
    assert_eq!(domain.status(), DomainStatus::Skipped);
    assert!(domain.last_checked.is_some());
    assert!(domain.headers.is_empty());
}

#[tokio::test]
async fn test_unreachable_domain_marked_skipped() {
    // Nothing listens on port 1, so the proxy connection is refused
    let store = memory_store();
    let config = create_test_config(&["gone.example.com"], "http://127.0.0.1:1", 1);
    let mut coordinator = Coordinator::with_store(config, store.clone(), false).unwrap();

    let report = coordinator.run().await.unwrap();
    assert_eq!(report.skipped, 1);
    assert_eq!(report.succeeded, 0);

    let guard = store.lock().unwrap();
    assert_eq!(guard.count(&DomainFilter::Skipped).unwrap(), 1);
    assert_eq!(guard.count(&DomainFilter::Unprocessed).unwrap(), 0);
}

#[tokio::test]
async fn test_error_status_still_counts_as_response() {
    let mock_server = MockServer::start().await;

    mount_front_page(
        &mock_server,
        "broken.com",
        ResponseTemplate::new(500).insert_header("server", "Microsoft-IIS/10.0"),
    )
    .await;

    let store = memory_store();
    let config = create_test_config(&["broken.com"], &mock_server.uri(), 1);
    let mut coordinator = Coordinator::with_store(config, store.clone(), false).unwrap();

    let report = coordinator.run().await.unwrap();
    assert_eq!(report.succeeded, 1);

    let domain = store.lock().unwrap().find_by_name("broken.com").unwrap().unwrap();
    assert_eq!(domain.status(), DomainStatus::Checked);
    assert_eq!(domain.header("Server"), Some("Microsoft-IIS/10.0"));
}

#[tokio::test]
async fn test_shared_link_inserted_once() {
    let mock_server = MockServer::start().await;

    for host in ["one.com", "two.com", "three.com"] {
        mount_front_page(
            &mock_server,
            host,
            ResponseTemplate::new(200)
                .insert_header("server", "nginx")
                .set_body_string(html_page(&["http://shared.com/", "http://Shared.com/about"])),
        )
        .await;
    }

    mount_front_page(
        &mock_server,
        "shared.com",
        ResponseTemplate::new(200).insert_header("server", "nginx"),
    )
    .await;

    let store = memory_store();
    let config = create_test_config(&["one.com", "two.com", "three.com"], &mock_server.uri(), 3);
    let mut coordinator = Coordinator::with_store(config, store.clone(), false).unwrap();

    let report = coordinator.run().await.unwrap();
    assert_eq!(report.discovered, 1);
    assert_eq!(report.domains, 4);

    let guard = store.lock().unwrap();
    let shared = guard
        .count(&DomainFilter::NameMatches("^shared\\.com$".to_string()))
        .unwrap();
    assert_eq!(shared, 1);
}

#[tokio::test]
async fn test_concurrency_bounded_by_max_workers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("server", "slow")
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&mock_server)
        .await;

    let seeds = [
        "s1.com", "s2.com", "s3.com", "s4.com", "s5.com", "s6.com", "s7.com", "s8.com",
    ];

    let store = memory_store();
    let config = create_test_config(&seeds, &mock_server.uri(), 3);
    let mut coordinator = Coordinator::with_store(config, store.clone(), false).unwrap();

    let report = coordinator.run().await.unwrap();

    assert_eq!(report.domains, 8);
    assert_eq!(report.succeeded, 8);
    // Every response is delayed, so the first three workers overlap
    assert_eq!(report.peak_in_flight, 3);
}

#[tokio::test]
async fn test_rerun_does_not_refetch() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("host", "once.com"))
        .respond_with(ResponseTemplate::new(200).insert_header("server", "nginx"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("webgenome.db");

    let mut config = create_test_config(&["once.com"], &mock_server.uri(), 1);
    config.store.database_path = db_path.to_string_lossy().to_string();

    let mut first = Coordinator::new(config.clone(), false).expect("Failed to create coordinator");
    assert_eq!(first.run().await.unwrap().domains, 1);
    drop(first);

    // Seeding again leaves the checked record alone
    let mut second = Coordinator::new(config, false).expect("Failed to create coordinator");
    let report = second.run().await.unwrap();
    assert_eq!(report.domains, 0);
    assert_eq!(report.batches, 0);
}

/// Answers one request with headers and a body cut short of its Content-Length
async fn serve_truncated_body(listener: TcpListener) {
    let Ok((mut socket, _)) = listener.accept().await else {
        return;
    };

    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }

    let response = "HTTP/1.1 200 OK\r\n\
                    Server: trunc\r\n\
                    Content-Length: 500\r\n\
                    \r\n\
                    <html><body><a href=\"http://c.com/\">c</a>";
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

#[tokio::test]
async fn test_truncated_body_keeps_headers_and_discovers_nothing() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let proxy = format!("http://{}", listener.local_addr().unwrap());
    let server = tokio::spawn(serve_truncated_body(listener));

    let store = memory_store();
    let config = create_test_config(&["a.com"], &proxy, 1);
    let mut coordinator = Coordinator::with_store(config, store.clone(), false).unwrap();

    let report = coordinator.run().await.unwrap();
    server.await.unwrap();

    assert_eq!(report.domains, 1);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.discovered, 0);

    let guard = store.lock().unwrap();
    let a = guard.find_by_name("a.com").unwrap().expect("a.com missing");
    assert_eq!(a.status(), DomainStatus::Checked);
    assert_eq!(a.header("Server"), Some("trunc"));
    assert!(guard.find_by_name("c.com").unwrap().is_none());
}
