//! Integration tests for the registry client against a local HTTP server
//!
//! A throwaway server on 127.0.0.1 answers each connection with the next
//! canned response, so the real reqwest client and decoding path are used.

use chrono::NaiveDate;
use eyre::Result;
use mca_company_extractor::client::{ApiKey, FetchError, PageRequest, RegistryClient};
use mca_company_extractor::etl::{DateRange, ExtractOptions, Extractor, PageSource, RetryPolicy};
use mca_company_extractor::storage::{YearFileRotator, read_year_file};
use serde_json::json;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

/// Serve `responses` in order, one per connection, returning the request lines seen.
async fn serve(responses: Vec<(u16, &'static str)>) -> Result<(Url, JoinHandle<Vec<String>>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        let mut seen = Vec::new();
        for (status, body) in responses {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };

            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let request = String::from_utf8_lossy(&request);
            seen.push(request.lines().next().unwrap_or_default().to_string());

            let reason = if status == 200 { "OK" } else { "Error" };
            let response = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                reason,
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
        seen
    });

    let url = Url::parse(&format!("http://{}/resource/test-resource", addr))?;
    Ok((url, handle))
}

fn client(url: Url) -> Result<RegistryClient> {
    RegistryClient::try_new(url, ApiKey::new("TESTKEY"), Some(Duration::from_secs(10)))
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 6, 15).unwrap()
}

#[tokio::test]
async fn test_fetch_page_sends_filters_and_decodes() -> Result<()> {
    let (url, server) = serve(vec![(
        200,
        r#"{"total":3,"count":3,"records":[{"CIN":"A"},{"CIN":"B"},{"CIN":"C"}]}"#,
    )])
    .await?;

    let client = client(url)?;
    let page = client.fetch_page(&PageRequest::first(day(), 1000)).await?;
    assert_eq!(page.len(), 3);
    assert_eq!(page.total, Some(3));
    assert_eq!(page.records[2], json!({"CIN": "C"}));

    let seen = server.await?;
    assert_eq!(seen.len(), 1);
    let line = &seen[0];
    assert!(line.starts_with("GET /resource/test-resource?"));
    assert!(line.contains("api-key=TESTKEY"));
    assert!(line.contains("format=json"));
    assert!(line.contains("offset=0"));
    assert!(line.contains("limit=1000"));
    assert!(line.contains("filters%5Bdate_of_registration%5D=2020-06-15"));
    Ok(())
}

#[tokio::test]
async fn test_error_status_is_classified() -> Result<()> {
    let (url, _server) = serve(vec![(503, r#"{"error":"service unavailable"}"#)]).await?;

    let err = client(url)?
        .fetch_page(&PageRequest::first(day(), 1000))
        .await
        .unwrap_err();
    match err {
        FetchError::Status { status, body } => {
            assert_eq!(status.as_u16(), 503);
            assert!(body.contains("service unavailable"));
        }
        other => panic!("expected status error, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_unexpected_body_is_decode_error() -> Result<()> {
    let (url, _server) = serve(vec![(200, "<html>maintenance</html>")]).await?;

    let err = client(url)?
        .fetch_page(&PageRequest::first(day(), 1000))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Decode { .. }));
    assert_eq!(err.body(), Some("<html>maintenance</html>"));
    Ok(())
}

#[tokio::test]
async fn test_extract_over_http_with_recovery() -> Result<()> {
    let (url, server) = serve(vec![
        (500, "Internal Server Error"),
        (200, r#"{"total":2,"records":[{"n":1},{"n":2}]}"#),
        (200, "not json"),
        (200, r#"{"total":2,"records":[]}"#),
    ])
    .await?;

    let temp_dir = TempDir::new()?;
    let options = ExtractOptions {
        page_size: 1000,
        max_result_window: 10_000,
        request_delay: Duration::ZERO,
        retry: RetryPolicy::unbounded(Duration::ZERO),
    };
    let extractor = Extractor::new(client(url)?, options);
    let mut rotator = YearFileRotator::new(temp_dir.path())?;
    let summary = extractor
        .run(DateRange::new(day(), day()), &mut rotator)
        .await?;

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.last_total, Some(2));
    assert_eq!(
        read_year_file(temp_dir.path().join("2020.json"))?,
        vec![json!({"n": 1}), json!({"n": 2})]
    );

    let offsets: Vec<String> = server
        .await?
        .iter()
        .map(|line| {
            line.split(['?', '&', ' '])
                .find(|p| p.starts_with("offset="))
                .unwrap_or_default()
                .to_string()
        })
        .collect();
    assert_eq!(offsets, vec!["offset=0", "offset=0", "offset=1000", "offset=1000"]);
    Ok(())
}
