//! HTTP contract tests against a local wiremock server.
//!
//! These exercise the real `HttpTransport` end to end: multipart layout,
//! query string, binary success bodies and JSON error bodies.

use doclens_client::{
    ClientConfig, ConversionController, ConversionStatus, FileEntry, HttpTransport, OutputFormat,
    GENERIC_FAILURE,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Test helpers ─────────────────────────────────────────────────────────────

fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::builder()
        .api_base(server.uri())
        .request_timeout_secs(10)
        .build()
        .unwrap()
}

fn png(name: &str) -> FileEntry {
    FileEntry::new(name, b"\x89PNG\r\n\x1a\nfake image".to_vec())
}

fn count(haystack: &[u8], needle: &[u8]) -> usize {
    haystack.windows(needle.len()).filter(|w| *w == needle).count()
}

// ── Success ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn success_body_is_saved_byte_for_byte() {
    let server = MockServer::start().await;
    let payload: Vec<u8> = (0u8..=255).cycle().take(4096).collect();
    Mock::given(method("POST"))
        .and(path("/convert"))
        .and(query_param("output_format", "docx"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(payload.clone(), OutputFormat::Word.media_type()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut c = ConversionController::from_config(&config_for(&server)).unwrap();
    let _ = c.add_files([png("a.png"), png("b.png")]);
    let _ = c.convert().await;

    assert_eq!(c.status(), ConversionStatus::Completed, "{}", c.error_message());
    assert_eq!(c.artifact().unwrap().filename, "a_and_1_more.docx");

    let out = tempfile::tempdir().unwrap();
    let saved = c.download_to(out.path()).await.unwrap();
    assert_eq!(std::fs::read(saved).unwrap(), payload);
}

#[tokio::test]
async fn multipart_carries_one_files_part_per_entry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/convert"))
        .and(query_param("output_format", "pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"%PDF-1.7".to_vec(), "application/pdf"))
        .mount(&server)
        .await;

    let mut c = ConversionController::from_config(&config_for(&server)).unwrap();
    let _ = c.add_files([
        png("page1.png"),
        FileEntry::new("contract.pdf", b"%PDF-1.4 input".to_vec()),
        png("page1.png"),
    ]);
    let _ = c.set_format(OutputFormat::Pdf);
    let _ = c.convert().await;
    assert_eq!(c.status(), ConversionStatus::Completed);
    assert_eq!(c.artifact().unwrap().filename, "page1_and_2_more.pdf");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body = &requests[0].body;
    assert_eq!(count(body, b"name=\"files\""), 3);
    assert_eq!(count(body, b"filename=\"page1.png\""), 2);
    assert_eq!(count(body, b"filename=\"contract.pdf\""), 1);
    assert_eq!(count(body, b"Content-Type: image/png"), 2);
    assert_eq!(count(body, b"Content-Type: application/pdf"), 1);
    assert_eq!(count(body, b"%PDF-1.4 input"), 1);
}

// ── Failures ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn detail_from_422_and_retry_resends() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/convert"))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_raw(br#"{"detail":"unsupported file type"}"#.to_vec(), "application/json"),
        )
        .expect(2)
        .mount(&server)
        .await;

    let mut c = ConversionController::from_config(&config_for(&server)).unwrap();
    let _ = c.add_files([png("a.png")]);
    let _ = c.convert().await;

    assert_eq!(c.status(), ConversionStatus::Error);
    assert_eq!(c.error_message(), "unsupported file type");
    assert_eq!(c.queue().len(), 1);

    let _ = c.retry().await;
    assert_eq!(c.status(), ConversionStatus::Error);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].url.query(), requests[1].url.query());
    assert_eq!(requests[0].body.len(), requests[1].body.len());
}

#[tokio::test]
async fn non_json_error_body_uses_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/convert"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let mut c = ConversionController::from_config(&config_for(&server)).unwrap();
    let _ = c.add_files([png("a.png")]);
    let _ = c.convert().await;

    assert_eq!(c.status(), ConversionStatus::Error);
    assert_eq!(c.error_message(), GENERIC_FAILURE);
}

#[tokio::test]
async fn unreachable_service_reports_connection_failure() {
    // Nothing listens on the discard port.
    let config = ClientConfig::builder()
        .api_base("http://127.0.0.1:9")
        .connect_timeout_secs(2)
        .request_timeout_secs(5)
        .build()
        .unwrap();
    let mut c = ConversionController::from_config(&config).unwrap();
    let _ = c.add_files([png("a.png")]);
    let _ = c.convert().await;

    assert_eq!(c.status(), ConversionStatus::Error);
    assert!(!c.error_message().is_empty());
    assert_ne!(c.error_message(), GENERIC_FAILURE);
    assert!(
        c.error_message().starts_with("Could not connect"),
        "{}",
        c.error_message()
    );
}

// ── Health check ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn ping_reads_service_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(br#"{"message":"DocLens API is running"}"#.to_vec(), "application/json"),
        )
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&config_for(&server)).unwrap();
    let status = transport.ping().await.unwrap();
    assert_eq!(status.message, "DocLens API is running");
}

#[tokio::test]
async fn ping_surfaces_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&config_for(&server)).unwrap();
    let err = transport.ping().await.unwrap_err();
    assert_eq!(err.status(), Some(503));
}
