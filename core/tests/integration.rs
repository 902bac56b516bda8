//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives `Fetcher` over real
//! HTTP with the default ureq transport. Covers URL composition, header and
//! body delivery, every decoder, and the three failure kinds. A few cases
//! need a server that misbehaves mid-response; those use a bare TCP socket.

use std::io::{BufRead, BufReader, Write};
use std::net::SocketAddr;
use std::time::Duration;

use fetcher::{ClientConfig, DataType, ErrorKind, Fetcher, RequestOptions, NO_STATUS};
use mock_server::Echo;
use serde_json::{json, Map, Value};

fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

/// Serve one connection: answer any request with `head`, wait `pause`, then
/// write `body` and close.
fn start_raw_server(head: &'static str, pause: Duration, body: &'static str) -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut line = String::new();
        while reader.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
            line.clear();
        }
        let mut stream = stream;
        let _ = stream.write_all(head.as_bytes());
        let _ = stream.flush();
        std::thread::sleep(pause);
        let _ = stream.write_all(body.as_bytes());
    });

    addr
}

fn client(addr: SocketAddr) -> Fetcher {
    Fetcher::new(ClientConfig {
        base_url: format!("http://{addr}/"),
        base_body: match json!({"headers": {"x-client": "fetcher"}}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        },
        timeout_millis: 2000,
        ..ClientConfig::default()
    })
}

fn echo(data: fetcher::ResponseData) -> Echo {
    data.deserialize().unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn get_composes_url_and_headers() {
    let client = client(start_server());

    let options = RequestOptions::from("/echo/users")
        .path_id(42)
        .query("page", 2)
        .query("sort", "name")
        .header("x-request", "1")
        .body(json!({"dropped": true}));
    let echo = echo(client.get(options).await.unwrap());

    assert_eq!(echo.method, "GET");
    assert_eq!(echo.path, "/echo/users/42");
    assert_eq!(echo.query.as_deref(), Some("page=2&sort=name"));
    assert_eq!(echo.headers.get("x-client").map(String::as_str), Some("fetcher"));
    assert_eq!(echo.headers.get("x-request").map(String::as_str), Some("1"));
    assert!(echo.body.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn post_sends_json_body() {
    let client = client(start_server());

    let options = RequestOptions::new()
        .header("content-type", "application/json")
        .body(json!({"title": "Integration test", "completed": false}));
    let echo = echo(client.post(("echo", options)).await.unwrap());

    assert_eq!(echo.method, "POST");
    assert_eq!(echo.path, "/echo");
    let body: Value = serde_json::from_str(echo.body.as_deref().unwrap()).unwrap();
    assert_eq!(body, json!({"title": "Integration test", "completed": false}));
}

#[tokio::test(flavor = "multi_thread")]
async fn body_verbs_reach_the_server() {
    let client = client(start_server());

    let put = echo(client.put(RequestOptions::from("echo").raw_body("a=1")).await.unwrap());
    assert_eq!(put.method, "PUT");
    assert_eq!(put.body.as_deref(), Some("a=1"));

    let patch = echo(client.patch(RequestOptions::from("echo").body(json!([1, 2]))).await.unwrap());
    assert_eq!(patch.method, "PATCH");
    assert_eq!(patch.body.as_deref(), Some("[1,2]"));

    let delete = echo(client.delete("echo/items/7").await.unwrap());
    assert_eq!(delete.method, "DELETE");
    assert_eq!(delete.path, "/echo/items/7");

    let options = echo(client.options("echo").await.unwrap());
    assert_eq!(options.method, "OPTIONS");
}

#[tokio::test(flavor = "multi_thread")]
async fn head_returns_status_only() {
    let client = client(start_server());
    let data = client
        .head(RequestOptions::from("echo").data_type(DataType::Origin))
        .await
        .unwrap();
    let response = data.into_origin().unwrap();
    assert_eq!(response.status, 200);
    assert!(response.body.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn decodes_text_and_blob() {
    let client = client(start_server());

    let text = client
        .get(RequestOptions::from("text").data_type(DataType::Text))
        .await
        .unwrap();
    assert_eq!(text.as_text(), Some("hello from mock-server"));

    let blob = client
        .get(RequestOptions::from("bytes").data_type(DataType::Blob))
        .await
        .unwrap();
    assert_eq!(blob.as_bytes().map(|b| b.to_vec()), Some(vec![0u8, 159, 146, 150, 255]));
}

#[tokio::test(flavor = "multi_thread")]
async fn error_status_is_returned_as_data() {
    let client = client(start_server());
    let data = client.get("status/404").await.unwrap();
    assert_eq!(data.as_json(), Some(&json!({"status": 404})));
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_body_is_a_parse_failure() {
    let client = client(start_server());
    let err = client.get("malformed").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
    assert_eq!(err.status_code(), 200);
}

#[tokio::test(flavor = "multi_thread")]
async fn slow_server_times_out() {
    let client = client(start_server());
    let err = client
        .get(RequestOptions::from("delay/1000").timeout_millis(100))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert_eq!(err.status_code(), NO_STATUS);
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_host_is_a_connection_failure() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let client = client(addr);
    let err = client.get("echo").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
    assert_eq!(err.status_code(), NO_STATUS);
}

#[tokio::test(flavor = "multi_thread")]
async fn per_call_base_overrides() {
    let addr = start_server();
    let client = Fetcher::new(ClientConfig::default());

    let options = RequestOptions::from("echo")
        .base_url(format!("http://{addr}"))
        .base_body(Map::new())
        .header("x-only", "call");
    let echo = echo(client.get(options).await.unwrap());
    assert_eq!(echo.headers.get("x-only").map(String::as_str), Some("call"));
    assert!(!echo.headers.contains_key("x-client"));
}

#[tokio::test(flavor = "multi_thread")]
async fn timeout_while_body_streams_keeps_status() {
    let addr = start_raw_server(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 2\r\n\r\n",
        Duration::from_millis(800),
        "{}",
    );
    let client = client(addr);
    let err = client
        .get(RequestOptions::from("echo").timeout_millis(300))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert_eq!(err.status_code(), 200);
}

#[tokio::test(flavor = "multi_thread")]
async fn truncated_body_is_a_parse_failure() {
    let addr = start_raw_server(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 10\r\n\r\n",
        Duration::ZERO,
        "{}",
    );
    let client = client(addr);
    let err = client.get("echo").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
    assert_eq!(err.status_code(), 200);
}
