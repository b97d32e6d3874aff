//! Wire-level framing tests against a raw TCP socket: pipelining, partial
//! requests, and malformed-input handling.

use jrot_core::{parse_buffer, Value};
use jrot_server::{from_fn, Server, ServerHandle};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

async fn spawn_echo_server() -> (std::net::SocketAddr, ServerHandle) {
    let server = Server::builder()
        .bind_str("127.0.0.1:0")
        .unwrap()
        .verbosity(0)
        .procedure("echo", from_fn(|_ctx, params, _id| async move { params }))
        .build()
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();
    let handle = server.handle();
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    (addr, handle)
}

/// Read from the socket until one complete JSON document is buffered.
async fn recv_document(stream: &mut TcpStream, buf: &mut Vec<u8>) -> Value {
    loop {
        if let Some((value, consumed)) = parse_buffer(buf).unwrap() {
            buf.drain(..consumed);
            return value;
        }
        let n = stream.read_buf(buf).await.unwrap();
        assert_ne!(n, 0, "connection closed while waiting for a document");
    }
}

fn error_code(response: &Value) -> Option<i64> {
    response.member("error")?.member("code")?.as_i64()
}

#[tokio::test]
async fn test_two_pipelined_requests_get_ordered_responses() {
    let (addr, _handle) = spawn_echo_server().await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    // Both requests in a single write, no waiting in between.
    stream
        .write_all(
            concat!(
                r#"{"method":"echo","params":[1],"id":1}"#,
                r#"{"method":"echo","params":[2],"id":2}"#,
            )
            .as_bytes(),
        )
        .await
        .unwrap();

    let mut buf = Vec::new();
    let first = recv_document(&mut stream, &mut buf).await;
    let second = recv_document(&mut stream, &mut buf).await;

    assert_eq!(first.member("id").and_then(Value::as_i64), Some(1));
    assert_eq!(
        first.member("result").and_then(|r| r.get(0)).and_then(Value::as_i64),
        Some(1)
    );
    assert_eq!(second.member("id").and_then(Value::as_i64), Some(2));
    assert_eq!(
        second.member("result").and_then(|r| r.get(0)).and_then(Value::as_i64),
        Some(2)
    );
}

#[tokio::test]
async fn test_incomplete_request_leaves_connection_open_and_silent() {
    let (addr, _handle) = spawn_echo_server().await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    stream.write_all(br#"{"method":"f"#).await.unwrap();

    // No response may arrive while the request is incomplete.
    let mut probe = [0u8; 64];
    let waited =
        tokio::time::timeout(Duration::from_millis(200), stream.read(&mut probe)).await;
    assert!(waited.is_err(), "server replied to an incomplete request");

    // Completing the request (the method is unknown) gets a response,
    // proving the connection stayed open.
    stream.write_all(br#"oo","id":9}"#).await.unwrap();
    let mut buf = Vec::new();
    let response = recv_document(&mut stream, &mut buf).await;
    assert_eq!(error_code(&response), Some(-32601));
    assert_eq!(response.member("id").and_then(Value::as_i64), Some(9));
}

#[tokio::test]
async fn test_request_split_across_many_writes() {
    let (addr, _handle) = spawn_echo_server().await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    let request = br#"{"method":"echo","params":["split"],"id":3}"#;
    for chunk in request.chunks(7) {
        stream.write_all(chunk).await.unwrap();
        stream.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let mut buf = Vec::new();
    let response = recv_document(&mut stream, &mut buf).await;
    assert_eq!(
        response.member("result").and_then(|r| r.get(0)).and_then(Value::as_str),
        Some("split")
    );
}

#[tokio::test]
async fn test_malformed_input_gets_parse_error_and_close() {
    let (addr, _handle) = spawn_echo_server().await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    // Broken fragment followed by further unrelated bytes: malformed before
    // the end of the buffered data.
    stream
        .write_all(br#"{"method": nope} {"method":"echo","id":1}"#)
        .await
        .unwrap();

    let mut buf = Vec::new();
    let response = recv_document(&mut stream, &mut buf).await;
    assert_eq!(error_code(&response), Some(-32700));
    assert!(response.member("id").map(Value::is_null).unwrap_or(false));

    // The server closes the connection after a parse error.
    let mut rest = Vec::new();
    let closed =
        tokio::time::timeout(Duration::from_secs(1), stream.read_to_end(&mut rest)).await;
    assert_eq!(closed.unwrap().unwrap(), 0);
}

#[tokio::test]
async fn test_invalid_request_keeps_connection_open() {
    let (addr, _handle) = spawn_echo_server().await;
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let mut buf = Vec::new();

    // Well-formed JSON, invalid request shape: id must not be echoed.
    stream
        .write_all(br#"{"method":"echo","id":[1]}"#)
        .await
        .unwrap();
    let response = recv_document(&mut stream, &mut buf).await;
    assert_eq!(error_code(&response), Some(-32600));
    assert!(response.member("id").map(Value::is_null).unwrap_or(false));

    // The same connection still serves valid requests.
    stream
        .write_all(br#"{"method":"echo","params":[7],"id":4}"#)
        .await
        .unwrap();
    let response = recv_document(&mut stream, &mut buf).await;
    assert_eq!(response.member("id").and_then(Value::as_i64), Some(4));
}

#[tokio::test]
async fn test_responses_are_newline_terminated() {
    let (addr, _handle) = spawn_echo_server().await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    stream
        .write_all(br#"{"method":"echo","id":1}"#)
        .await
        .unwrap();

    let mut buf = Vec::new();
    loop {
        let n = stream.read_buf(&mut buf).await.unwrap();
        assert_ne!(n, 0);
        if parse_buffer(&buf).unwrap().is_some() && buf.ends_with(b"\n") {
            break;
        }
    }
}
