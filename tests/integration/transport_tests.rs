//! Integration tests for the HTTP transport and seed collection
//!
//! These tests use wiremock to stand in for onion services and the search
//! engine, with the proxy disabled.

use onion_archive::config::{SeedConfig, TransportConfig};
use onion_archive::crawler::{
    FetchError, HttpSession, HttpSessionFactory, SeedProvider, SessionFactory, Transport,
};
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn onion(c: char) -> String {
    format!("http://{}.onion", c.to_string().repeat(56))
}

fn direct_config() -> TransportConfig {
    TransportConfig {
        user_agent: "ArchiveTest/1.0".to_string(),
        ..TransportConfig::direct()
    }
}

#[tokio::test]
async fn test_fetch_success_and_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", "ArchiveTest/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>hello</html>"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
        .mount(&mock_server)
        .await;

    let session = HttpSession::direct(&direct_config()).unwrap();
    let timeout = Duration::from_secs(5);

    let ok = session
        .fetch(&format!("{}/", mock_server.uri()), timeout)
        .await
        .unwrap();
    assert!(ok.is_ok());
    assert_eq!(ok.body, "<html>hello</html>");

    let missing = session
        .fetch(&format!("{}/missing", mock_server.uri()), timeout)
        .await
        .unwrap();
    assert_eq!(missing.status, 404);
    assert!(!missing.is_ok());
}

#[tokio::test]
async fn test_fetch_follows_redirects() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("location", format!("{}/new", mock_server.uri()).as_str()),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200).set_body_string("moved here"))
        .mount(&mock_server)
        .await;

    let factory = HttpSessionFactory::new(direct_config());
    let session = factory.connect().unwrap();

    let response = session
        .fetch(&format!("{}/old", mock_server.uri()), Duration::from_secs(5))
        .await
        .unwrap();

    assert!(response.is_ok());
    assert_eq!(response.final_url, format!("{}/new", mock_server.uri()));
    assert_eq!(response.body, "moved here");
}

#[tokio::test]
async fn test_fetch_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let session = HttpSession::direct(&direct_config()).unwrap();
    let result = session
        .fetch(&mock_server.uri(), Duration::from_millis(200))
        .await;

    assert!(matches!(result, Err(FetchError::Timeout { .. })));
}

#[tokio::test]
async fn test_connection_refused() {
    // Bind then drop a server so the port is very likely closed
    let uri = {
        let mock_server = MockServer::start().await;
        mock_server.uri()
    };

    let session = HttpSession::direct(&direct_config()).unwrap();
    let result = session.fetch(&uri, Duration::from_secs(2)).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_seeds_from_search_engine() {
    let mock_server = MockServer::start().await;

    let redirect = format!(
        "/search/redirect?redirect_url={}%2F",
        onion('b').replace(':', "%3A").replace('/', "%2F")
    );
    Mock::given(method("GET"))
        .and(path("/search/"))
        .and(query_param("q", "forum"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<html><body>
            <a href="{}">result one</a>
            <a href="{}/index.html">result two</a>
            </body></html>"#,
            redirect,
            onion('c')
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search/"))
        .and(query_param("q", "wiki"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let config = SeedConfig {
        static_seeds: vec![onion('a')],
        search_enabled: true,
        search_url: format!("{}/search/?q=", mock_server.uri()),
        search_queries: vec!["forum".to_string(), "wiki".to_string()],
        directories: vec![],
    };
    let provider = SeedProvider::new(config, Duration::from_secs(5));
    let session = HttpSession::direct(&direct_config()).unwrap();

    let seeds = provider.get_seeds(&session, &session).await;

    assert_eq!(
        seeds.into_iter().collect::<Vec<_>>(),
        vec![onion('a'), onion('b'), onion('c')]
    );
}
