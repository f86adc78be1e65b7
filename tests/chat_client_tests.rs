//! Integration tests for the chat client against a loopback stub backend.
//!
//! Each test spins up a one-shot TCP server that captures the raw request
//! and answers with a canned HTTP response, so the full transport path
//! (headers, body, status handling) is exercised without a real backend.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;

use drawbridge::chat::{CancelToken, ChatClient, ChatError, ChatMessage};

/// Spawn a server that accepts one connection, captures the request, and
/// replies with `response`. Returns the endpoint URL and the channel the
/// captured request arrives on.
fn stub_backend(response: &'static str) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        let request = read_request(&mut stream);
        stream.write_all(response.as_bytes()).expect("write response");
        let _ = stream.flush();
        let _ = tx.send(request);
    });

    (format!("http://{addr}/chat/completions"), rx)
}

/// Read one HTTP request (headers + Content-Length body) as a string.
fn read_request(stream: &mut std::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        let n = stream.read(&mut chunk).expect("read request");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find_header_end(&buf) {
            break pos;
        }
        assert!(n > 0, "connection closed before headers completed");
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = headers
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())?
        })
        .unwrap_or(0);

    let body_start = header_end + 4;
    while buf.len() < body_start + content_length {
        let n = stream.read(&mut chunk).expect("read body");
        assert!(n > 0, "connection closed before body completed");
        buf.extend_from_slice(&chunk[..n]);
    }

    String::from_utf8_lossy(&buf).to_string()
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

fn ok_response(body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    )
}

#[test]
fn successful_send_returns_reply_text() {
    let body = r#"{"choices":[{"message":{"role":"assistant","content":"hi there"}}]}"#;
    let response: &'static str = Box::leak(ok_response(body).into_boxed_str());
    let (endpoint, request_rx) = stub_backend(response);

    let client = ChatClient::new(endpoint, "deepseek-chat", 5);
    let conversation = vec![ChatMessage::user("hello")];
    let reply = client
        .complete("sk-test", &conversation, &CancelToken::new())
        .expect("completion should succeed");
    assert_eq!(reply, "hi there");

    let request = request_rx.recv().expect("request captured");
    assert!(request.starts_with("POST /chat/completions"));
    assert!(request.contains("Authorization: Bearer sk-test") ||
        request.contains("authorization: Bearer sk-test"));
    assert!(
        request.to_ascii_lowercase().contains("content-type: application/json"),
        "missing json content type: {request}"
    );
    assert!(request.contains(r#""model":"deepseek-chat""#));
    assert!(request.contains(r#""stream":false"#));
    assert!(request.contains(r#"{"role":"user","content":"hello"}"#));
}

#[test]
fn conversation_is_replayed_in_order() {
    let body = r#"{"choices":[{"message":{"content":"third"}}]}"#;
    let response: &'static str = Box::leak(ok_response(body).into_boxed_str());
    let (endpoint, request_rx) = stub_backend(response);

    let client = ChatClient::new(endpoint, "deepseek-chat", 5);
    let conversation = vec![
        ChatMessage::user("first"),
        ChatMessage::assistant("second"),
        ChatMessage::user("what came before?"),
    ];
    client
        .complete("sk-test", &conversation, &CancelToken::new())
        .expect("completion should succeed");

    let request = request_rx.recv().expect("request captured");
    let first = request.find(r#""content":"first""#).expect("first message");
    let second = request.find(r#""content":"second""#).expect("second message");
    let third = request
        .find(r#""content":"what came before?""#)
        .expect("third message");
    assert!(first < second && second < third, "messages out of order");
    assert!(request.contains(r#""role":"assistant""#));
}

#[test]
fn non_success_status_surfaces_status_and_body() {
    let response = "HTTP/1.1 401 Unauthorized\r\nContent-Type: application/json\r\nContent-Length: 23\r\nConnection: close\r\n\r\n{\"error\":\"invalid key\"}";
    let (endpoint, _request_rx) = stub_backend(response);

    let client = ChatClient::new(endpoint, "deepseek-chat", 5);
    let err = client
        .complete("sk-bad", &[ChatMessage::user("hello")], &CancelToken::new())
        .unwrap_err();

    match &err {
        ChatError::Backend { status, body, .. } => {
            assert_eq!(*status, 401);
            assert!(body.contains("invalid key"));
        }
        other => panic!("Expected Backend error, got {other:?}"),
    }
    let text = err.to_string();
    assert!(text.contains("401"), "message should include status: {text}");
    assert!(text.contains("invalid key"));
}

#[test]
fn success_without_content_is_malformed() {
    let body = r#"{"choices":[{"message":{"role":"assistant"}}]}"#;
    let response: &'static str = Box::leak(ok_response(body).into_boxed_str());
    let (endpoint, _request_rx) = stub_backend(response);

    let client = ChatClient::new(endpoint, "deepseek-chat", 5);
    let err = client
        .complete("sk-test", &[ChatMessage::user("hello")], &CancelToken::new())
        .unwrap_err();
    assert!(matches!(err, ChatError::MalformedResponse));
}

#[test]
fn unreachable_backend_is_a_network_failure() {
    // Port 9 (discard) is virtually never listening on loopback.
    let client = ChatClient::new("http://127.0.0.1:9/chat/completions", "deepseek-chat", 2);
    let err = client
        .complete("sk-test", &[ChatMessage::user("hello")], &CancelToken::new())
        .unwrap_err();
    assert!(
        matches!(err, ChatError::Network(_) | ChatError::Timeout),
        "expected transport failure, got {err:?}"
    );
}

#[test]
fn missing_credential_short_circuits_before_connecting() {
    // Bind a listener that would panic the test if anything connected.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    listener
        .set_nonblocking(true)
        .expect("nonblocking listener");

    let client = ChatClient::new(format!("http://{addr}/chat/completions"), "deepseek-chat", 2);
    let err = client
        .complete("   ", &[ChatMessage::user("hello")], &CancelToken::new())
        .unwrap_err();
    assert!(matches!(err, ChatError::MissingCredential));

    match listener.accept() {
        Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
        other => panic!("no connection should have been attempted, got {other:?}"),
    }
}
