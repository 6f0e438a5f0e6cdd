//! Tests for the sheet loader against a mock gviz endpoint.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use super::SheetLoader;
use crate::config::SheetConfig;
use crate::error::LoadError;
use crate::price::PriceCell;

const SHEET_PATH: &str = "/spreadsheets/d/test-sheet/gviz/tq";

/// Answers like gviz: wraps the payload in the handler named by `tqx`.
struct GvizResponder {
    payload: serde_json::Value,
    delay: Duration,
}

impl Respond for GvizResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let handler = request
            .url
            .query_pairs()
            .find(|(key, _)| key == "tqx")
            .and_then(|(_, value)| {
                value
                    .strip_prefix("responseHandler:")
                    .map(str::to_string)
            })
            .unwrap_or_default();

        ResponseTemplate::new(200)
            .set_body_string(format!("/*O_o*/\n{}({});", handler, self.payload))
            .set_delay(self.delay)
    }
}

fn sheet_payload() -> serde_json::Value {
    json!({
        "version": "0.6",
        "status": "ok",
        "table": {
            "cols": [ {"label": "NOME"}, {"label": "EAN"}, {"label": "VENDA"} ],
            "rows": [
                { "c": [ {"v": "Água"}, {"v": "7891000100103"}, {"v": "R$ 3,50"} ] },
                { "c": [ {"v": "Sem código"}, null, {"v": "R$ 1,00"} ] },
                { "c": null },
                { "c": [ {"v": "Café"}, {"v": 7891000300300u64}, {"v": 18.9} ] }
            ]
        }
    })
}

fn loader_for(server: &MockServer, timeout: Duration) -> SheetLoader {
    SheetLoader::new(SheetConfig {
        sheet_id: "test-sheet".to_string(),
        timeout,
        ..SheetConfig::with_base_url(server.uri())
    })
}

fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

// ── success ──────────────────────────────────────────────────────────

#[tokio::test]
async fn load_projects_rows_and_drops_invalid_ones() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SHEET_PATH))
        .respond_with(GvizResponder {
            payload: sheet_payload(),
            delay: Duration::ZERO,
        })
        .expect(1)
        .mount(&mock_server)
        .await;

    let loader = loader_for(&mock_server, Duration::from_secs(5));
    let rows = loader.load().await.unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].name, "Água");
    assert_eq!(rows[0].code, "7891000100103");
    assert_eq!(rows[0].price, PriceCell::Text("R$ 3,50".into()));
    assert_eq!(rows[1].code, "7891000300300");
    assert_eq!(rows[1].price, PriceCell::Number(18.9));

    let stats = loader.handlers().stats();
    assert_eq!((stats.minted, stats.released, stats.active), (1, 1, 0));
}

#[tokio::test]
async fn load_requests_selected_worksheet() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SHEET_PATH))
        .and(query_param("sheet", "Loja 2"))
        .respond_with(GvizResponder {
            payload: sheet_payload(),
            delay: Duration::ZERO,
        })
        .expect(1)
        .mount(&mock_server)
        .await;

    let loader = SheetLoader::new(SheetConfig {
        sheet_id: "test-sheet".to_string(),
        sheet_name: Some("Loja 2".to_string()),
        ..SheetConfig::with_base_url(mock_server.uri())
    });

    assert_eq!(loader.load().await.unwrap().len(), 2);
}

#[tokio::test]
async fn concurrent_loads_use_distinct_handlers() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(GvizResponder {
            payload: sheet_payload(),
            delay: Duration::from_millis(50),
        })
        .expect(2)
        .mount(&mock_server)
        .await;

    let loader = loader_for(&mock_server, Duration::from_secs(5));
    let (a, b) = tokio::join!(loader.load(), loader.load());

    assert_eq!(a.unwrap().len(), 2);
    assert_eq!(b.unwrap().len(), 2);
    let stats = loader.handlers().stats();
    assert_eq!((stats.minted, stats.released, stats.active), (2, 2, 0));
}

// ── failures ─────────────────────────────────────────────────────────

#[tokio::test]
async fn load_times_out_and_releases_handler() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(GvizResponder {
            payload: sheet_payload(),
            delay: Duration::from_millis(500),
        })
        .mount(&mock_server)
        .await;

    let loader = loader_for(&mock_server, Duration::from_millis(100));
    let result = loader.load().await;

    assert_eq!(result, Err(LoadError::Timeout(Duration::from_millis(100))));
    let stats = loader.handlers().stats();
    assert_eq!((stats.minted, stats.released, stats.active), (1, 1, 0));
}

#[tokio::test]
async fn load_http_error_is_connection_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let loader = loader_for(&mock_server, Duration::from_secs(5));

    match loader.load().await {
        Err(LoadError::Connection(msg)) => assert!(msg.contains("404")),
        other => panic!("Expected LoadError::Connection, got: {other:?}"),
    }
    assert_eq!(loader.handlers().stats().active, 0);
}

#[tokio::test]
async fn load_unreachable_host_is_connection_error() {
    let loader = SheetLoader::new(SheetConfig::with_base_url(closed_port_url()));

    match loader.load().await {
        Err(LoadError::Connection(_)) => {}
        other => panic!("Expected LoadError::Connection, got: {other:?}"),
    }
    assert_eq!(loader.handlers().stats().released, 1);
}

#[tokio::test]
async fn load_response_for_other_handler_is_rejected() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("sheetCallback_stale({\"table\":{\"rows\":[]}});"),
        )
        .mount(&mock_server)
        .await;

    let loader = loader_for(&mock_server, Duration::from_secs(5));

    assert!(matches!(loader.load().await, Err(LoadError::Format(_))));
    assert_eq!(loader.handlers().stats().active, 0);
}

#[tokio::test]
async fn load_payload_without_table_is_format_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(GvizResponder {
            payload: json!({ "version": "0.6", "status": "ok" }),
            delay: Duration::ZERO,
        })
        .mount(&mock_server)
        .await;

    let loader = loader_for(&mock_server, Duration::from_secs(5));

    assert!(matches!(loader.load().await, Err(LoadError::Format(_))));
}
