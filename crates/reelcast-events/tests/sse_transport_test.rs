use futures::StreamExt;
use mockito::{Matcher, Server};
use reelcast_events::{BrokerTransport, SseBrokerTransport};

#[tokio::test]
async fn test_sse_transport_yields_message_payloads() {
    let mut server = Server::new_async().await;
    let body = concat!(
        ": keepalive\n\n",
        "event: message\n",
        "data: {\"type\":\"status-update\",\"status\":\"processing\"}\n\n",
        "event: ping\n",
        "data: ignored\n\n",
        "data: {\"type\":\"log-message\",\"message\":\"720p done\"}\n\n",
    );
    let mock = server
        .mock("GET", "/events")
        .match_query(Matcher::UrlEncoded("topic".into(), "logs:42".into()))
        .match_header("accept", "text/event-stream")
        .match_header("x-api-key", "secret")
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(body)
        .create_async()
        .await;

    let transport = SseBrokerTransport::new(server.url(), Some("secret".to_string()));
    let messages: Vec<String> = transport
        .connect("logs:42")
        .await
        .unwrap()
        .map(|m| m.unwrap())
        .collect()
        .await;

    mock.assert_async().await;
    assert_eq!(
        messages,
        vec![
            r#"{"type":"status-update","status":"processing"}"#,
            r#"{"type":"log-message","message":"720p done"}"#,
        ]
    );
}

#[tokio::test]
async fn test_sse_transport_rejects_error_status() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/events")
        .match_query(Matcher::Any)
        .with_status(503)
        .create_async()
        .await;

    let transport = SseBrokerTransport::new(server.url(), None);
    let err = transport.connect("logs:1").await.err().unwrap();
    assert!(err.to_string().contains("503"));
}

#[test]
fn test_events_url_encodes_topic() {
    let transport = SseBrokerTransport::new("http://broker.test/", None);
    let url = transport.events_url("logs:42").unwrap();
    assert_eq!(url.as_str(), "http://broker.test/events?topic=logs%3A42");
}
