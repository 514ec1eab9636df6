use parley::chat::{ChatTransport, HttpTransport, Message, TransportError};
use tokio::sync::mpsc;
use wiremock::matchers::{body_json_string, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Helper Functions
// ============================================================================

fn test_messages() -> Vec<Message> {
    vec![Message::user("Hello"), Message::assistant("Hi there")]
}

/// Drains the byte channel and returns the concatenated body.
async fn collect_body(mut receiver: mpsc::Receiver<bytes::Bytes>) -> Vec<u8> {
    let mut body = Vec::new();
    while let Some(chunk) = receiver.recv().await {
        body.extend_from_slice(&chunk);
    }
    body
}

fn transport_for(server: &MockServer) -> HttpTransport {
    HttpTransport::new(format!("{}/gpt4", server.uri()))
}

// ============================================================================
// HttpTransport Tests
// ============================================================================

#[tokio::test]
async fn test_successful_stream_forwards_whole_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/gpt4"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Hello from the model"))
        .mount(&mock_server)
        .await;

    let transport = transport_for(&mock_server);
    let (tx, rx) = mpsc::channel(64);

    let messages = test_messages();
    let send = transport.send(&messages, None, tx);
    let (result, body) = tokio::join!(send, collect_body(rx));

    assert!(result.is_ok());
    assert_eq!(body, b"Hello from the model");
}

#[tokio::test]
async fn test_request_body_carries_messages_and_image() {
    let mock_server = MockServer::start().await;

    let expected = r#"{"messages":[{"role":"user","content":"Hello"},{"role":"assistant","content":"Hi there"}],"image":"data:image/png;base64,AA=="}"#;
    Mock::given(method("POST"))
        .and(path("/gpt4"))
        .and(body_json_string(expected))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport = transport_for(&mock_server);
    let (tx, rx) = mpsc::channel(64);

    let messages = test_messages();
    let send = transport.send(&messages, Some("data:image/png;base64,AA=="), tx);
    let (result, _) = tokio::join!(send, collect_body(rx));
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_request_body_image_null_without_attachment() {
    let mock_server = MockServer::start().await;

    let expected = r#"{"messages":[{"role":"user","content":"Hello"}],"image":null}"#;
    Mock::given(method("POST"))
        .and(path("/gpt4"))
        .and(body_json_string(expected))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport = transport_for(&mock_server);
    let (tx, rx) = mpsc::channel(64);

    let messages = [Message::user("Hello")];
    let send = transport.send(&messages, None, tx);
    let (result, _) = tokio::join!(send, collect_body(rx));
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_server_error_status_is_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/gpt4"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&mock_server)
        .await;

    let transport = transport_for(&mock_server);
    let (tx, rx) = mpsc::channel(64);

    let messages = test_messages();
    let send = transport.send(&messages, None, tx);
    let (result, body) = tokio::join!(send, collect_body(rx));

    match result {
        Err(TransportError::Api { status, message }) => {
            assert_eq!(status, 503);
            assert_eq!(message, "overloaded");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    // Nothing should have been forwarded for a failed request.
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_unreachable_endpoint_is_network_error() {
    // Nothing listens on this port.
    let transport = HttpTransport::new("http://127.0.0.1:1/gpt4".to_string());
    let (tx, rx) = mpsc::channel(64);

    let messages = test_messages();
    let send = transport.send(&messages, None, tx);
    let (result, _) = tokio::join!(send, collect_body(rx));

    assert!(matches!(result, Err(TransportError::Network(_))));
}

#[tokio::test]
async fn test_dropped_receiver_is_channel_closed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/gpt4"))
        .respond_with(ResponseTemplate::new(200).set_body_string("some reply body"))
        .mount(&mock_server)
        .await;

    let transport = transport_for(&mock_server);
    let (tx, rx) = mpsc::channel(64);
    drop(rx);

    let result = transport.send(&test_messages(), None, tx).await;
    assert!(matches!(result, Err(TransportError::ChannelClosed)));
}

#[tokio::test]
async fn test_empty_body_stream_succeeds_with_no_chunks() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/gpt4"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .mount(&mock_server)
        .await;

    let transport = transport_for(&mock_server);
    let (tx, rx) = mpsc::channel(64);

    let messages = test_messages();
    let send = transport.send(&messages, None, tx);
    let (result, body) = tokio::join!(send, collect_body(rx));

    assert!(result.is_ok());
    assert!(body.is_empty());
}
