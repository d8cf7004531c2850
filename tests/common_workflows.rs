//! Integration tests for common Fletch workflows.
//!
//! Tests run against local wiremock servers, or a raw TCP listener where a
//! server has to misbehave.

use std::time::Duration;

use async_trait::async_trait;
use fletch::{
    CancellationToken, Codec, Context, FormValues, HttpClient, HttpClientConfig, HttpClientError,
    PassThrough, Payload, RawResponse, RequestId, StatusCheck, Timed, after_fn, before_fn, mime,
};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{body_bytes, body_string, body_string_contains, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct User {
    name: String,
    age: u32,
}

#[derive(Serialize)]
struct Signup {
    name: &'static str,
    age: Vec<u32>,
}

fn caster() -> User {
    User {
        name: "caster".into(),
        age: 3,
    }
}

// =============================================================================
// Request Encoding Tests
// =============================================================================

#[tokio::test]
async fn test_json_post() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users"))
        .and(header("content-type", mime::JSON))
        .and(body_string(r#"{"name":"caster","age":3}"#))
        .respond_with(ResponseTemplate::new(201).set_body_json(caster()))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::default();
    let user = caster();
    let mut resp = client
        .post(format!("{}/users", server.uri()))
        .send(Payload::record(&user))
        .await;

    assert!(resp.err().is_none());
    assert_eq!(resp.status().map(|s| s.as_u16()), Some(201));
    let created: User = resp.bind_json().await.unwrap();
    assert_eq!(created, user);
}

#[tokio::test]
async fn test_form_post_repeats_keys() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/signup"))
        .and(header("content-type", mime::FORM))
        .and(body_string("age=1&age=3&age=5&name=caster"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::default();
    let signup = Signup {
        name: "caster",
        age: vec![1, 3, 5],
    };
    let resp = client
        .post(format!("{}/signup", server.uri()))
        .encoder(Codec::Form)
        .send(Payload::record(&signup))
        .await;

    assert!(resp.is_success());
}

#[tokio::test]
async fn test_form_values_and_literal_query_string() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(body_string("a=xxx"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(body_string("tag=a&tag=b"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::default();
    let resp = client
        .put(server.uri())
        .encoder(Codec::Form)
        .send("a=xxx")
        .await;
    assert!(resp.is_success());

    let values = FormValues::new().with("tag", "a").with("tag", "b");
    let resp = client
        .patch(server.uri())
        .encoder(Codec::Form)
        .send(values)
        .await;
    assert!(resp.is_success());
}

#[tokio::test]
async fn test_xml_post() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("content-type", mime::XML))
        .and(body_string_contains("<name>caster</name>"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::default();
    let user = caster();
    let resp = client
        .post(server.uri())
        .encoder(Codec::Xml)
        .send(Payload::record(&user))
        .await;
    assert!(resp.is_success());
}

#[tokio::test]
async fn test_stream_upload() {
    let server = MockServer::start().await;
    let image = vec![0x89, b'P', b'N', b'G'];
    Mock::given(method("POST"))
        .and(header("content-type", mime::PNG))
        .and(body_bytes(image.clone()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::default();
    let resp = client
        .post(server.uri())
        .encoder(Codec::stream(mime::PNG))
        .send(image)
        .await;
    assert!(resp.is_success());
}

#[tokio::test]
async fn test_get_without_body_drops_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = HttpClient::default();
    let resp = client.get(server.uri()).send(()).await;
    assert!(resp.is_success());

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert!(received[0].headers.get("content-type").is_none());
}

#[tokio::test]
async fn test_post_without_body_keeps_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("content-type", mime::JSON))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::default();
    let resp = client.post(server.uri()).send(()).await;
    assert!(resp.is_success());
}

#[tokio::test]
async fn test_set_query_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = HttpClient::default();
    let filter = Signup {
        name: "caster",
        age: vec![1, 3],
    };
    client
        .get(format!("{}/search", server.uri()))
        .set_query(Payload::record(&filter))
        .send(())
        .await;

    let received = server.received_requests().await.unwrap();
    assert_eq!(received[0].url.query(), Some("age=1&age=3&name=caster"));
}

#[tokio::test]
async fn test_base_url_and_default_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users"))
        .and(header("x-api-key", "secret"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(
        HttpClientConfig::builder()
            .base_url(format!("{}/api/", server.uri()))
            .default_header("x-api-key", "secret")
            .build(),
    );
    let resp = client.get("users").send(()).await;
    assert!(resp.is_success());
}

// =============================================================================
// Response Tests
// =============================================================================

#[tokio::test]
async fn test_read_body_twice() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::default();
    let mut resp = client.get(server.uri()).send(()).await;
    let first = resp.read_body().await.unwrap();
    let second = resp.read_body().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(&first[..], b"hello");
}

#[tokio::test]
async fn test_second_bind_without_reuse_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(caster()))
        .mount(&server)
        .await;

    let client = HttpClient::default();
    let mut resp = client.get(server.uri()).send(()).await;
    let user: User = resp.bind_json().await.unwrap();
    assert_eq!(user, caster());

    let err = resp.bind_json::<User>().await.unwrap_err();
    assert!(matches!(err, HttpClientError::EmptyResponse));
}

#[tokio::test]
async fn test_bind_yaml_and_form() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/yaml"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("name: caster\nage: 3\n", mime::YAML))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/form"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("tag=a&tag=b", mime::FORM))
        .mount(&server)
        .await;

    let client = HttpClient::default();
    let mut resp = client.get(format!("{}/yaml", server.uri())).send(()).await;
    assert_eq!(resp.bind_yaml::<User>().await.unwrap(), caster());

    let mut resp = client.get(format!("{}/form", server.uri())).send(()).await;
    let values = resp.bind_form_values().await.unwrap();
    assert_eq!(values.get_all("tag"), ["a", "b"]);
}

#[derive(Clone, PartialEq, prost::Message)]
struct Ping {
    #[prost(string, tag = "1")]
    message: String,
    #[prost(uint32, tag = "2")]
    seq: u32,
}

#[tokio::test]
async fn test_protobuf_round_trip() {
    let server = MockServer::start().await;
    let ping = Ping {
        message: "ping".into(),
        seq: 7,
    };
    let encoded = prost::Message::encode_to_vec(&ping);
    Mock::given(method("POST"))
        .and(header("content-type", mime::PROTOBUF))
        .and(body_bytes(encoded.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_raw(encoded, mime::PROTOBUF))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::default();
    let mut resp = client
        .post(server.uri())
        .encoder(Codec::Protobuf)
        .send(Payload::message(&ping))
        .await;
    let pong: Ping = resp.bind_proto().await.unwrap();
    assert_eq!(pong, ping);
}

// =============================================================================
// Hook Tests
// =============================================================================

#[tokio::test]
async fn test_status_check_rejects_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
        .mount(&server)
        .await;

    let client = HttpClient::new(HttpClientConfig::builder().after(StatusCheck::success()).build());
    let mut resp = client.get(server.uri()).send(()).await;

    assert_eq!(resp.err().and_then(HttpClientError::status_code), Some(404));
    assert_eq!(resp.status().map(|s| s.as_u16()), Some(404));
    assert!(resp.read_body().await.is_err());
    assert!(resp.into_result().is_err());
}

#[tokio::test]
async fn test_explicit_client_passes_non_2xx_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = HttpClient::default();
    let mut resp = client.get(server.uri()).send(()).await;
    assert!(resp.err().is_none());
    assert!(!resp.is_success());
    assert_eq!(resp.text().await.unwrap(), "boom");
}

#[tokio::test]
async fn test_default_client_rejects_non_2xx() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(caster()))
        .mount(&server)
        .await;

    let resp = fletch::get(format!("{}/missing", server.uri())).send(()).await;
    assert!(matches!(
        resp.err(),
        Some(HttpClientError::UnexpectedStatus { .. })
    ));

    let mut resp = fletch::request("get", format!("{}/ok", server.uri()))
        .send(())
        .await;
    assert_eq!(resp.bind_json::<User>().await.unwrap(), caster());
}

#[tokio::test]
async fn test_before_hook_aborts_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = HttpClient::default();
    let resp = client
        .get(server.uri())
        .before(before_fn(|_ctx: Context, _request: &mut reqwest::Request| {
            Err(HttpClientError::hook("not allowed"))
        }))
        .send(())
        .await;

    assert!(matches!(resp.err(), Some(HttpClientError::Hook(_))));
    assert!(resp.status().is_none());
}

#[tokio::test]
async fn test_request_hook_replaces_client_hook() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = HttpClient::new(HttpClientConfig::builder().after(StatusCheck::success()).build());
    let resp = client.get(server.uri()).after(PassThrough).send(()).await;
    assert!(resp.err().is_none());
}

#[tokio::test]
async fn test_hooks_pass_context() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header_exists("x-request-id"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    #[derive(Debug, Clone, PartialEq)]
    struct Seen(u16);

    let client = HttpClient::new(HttpClientConfig::builder().before(RequestId::new()).build());
    let resp = client
        .get(server.uri())
        .after(after_fn(|ctx: Context, response: &mut RawResponse| {
            Ok(ctx.with_value(Seen(response.status().as_u16())))
        }))
        .send(())
        .await;

    assert_eq!(resp.context().value::<Seen>(), Some(&Seen(200)));
    assert!(resp.context().value::<fletch::hook::RequestIdValue>().is_some());
}

/// After-hook that rejects responses whose JSON envelope carries an error code.
struct EnvelopeCheck;

#[derive(Deserialize)]
struct Envelope {
    code: i32,
}

#[async_trait]
impl fletch::AfterHook for EnvelopeCheck {
    async fn after(&self, ctx: Context, response: &mut RawResponse) -> fletch::Result<Context> {
        let body = response.bytes().await?;
        let envelope: Envelope = fletch::codec::json::decode(&body)?;
        if envelope.code != 0 {
            return Err(HttpClientError::hook(format!("error code {}", envelope.code)));
        }
        Ok(ctx)
    }
}

#[tokio::test]
async fn test_after_hook_reads_reused_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"code":0}"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fail"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"code":42}"#))
        .mount(&server)
        .await;

    let client = HttpClient::new(
        HttpClientConfig::builder()
            .after(EnvelopeCheck)
            .reuse_body(true)
            .build(),
    );

    let mut resp = client.get(format!("{}/ok", server.uri())).send(()).await;
    assert!(resp.err().is_none());
    let first: serde_json::Value = resp.bind_json().await.unwrap();
    let second: serde_json::Value = resp.bind_json().await.unwrap();
    assert_eq!(first, second);

    let resp = client.get(format!("{}/fail", server.uri())).send(()).await;
    assert_eq!(
        resp.err().map(ToString::to_string).as_deref(),
        Some("Hook error: error code 42")
    );
}

#[tokio::test]
async fn test_latency() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(20)))
        .mount(&server)
        .await;

    let timed = HttpClient::new(
        HttpClientConfig::builder()
            .before(Timed::new(PassThrough))
            .after(Timed::new(StatusCheck::success()))
            .build(),
    );
    let resp = timed.get(server.uri()).send(()).await;
    assert!(resp.latency() >= Duration::from_millis(20));

    let untimed = HttpClient::default();
    let resp = untimed.get(server.uri()).send(()).await;
    assert_eq!(resp.latency(), Duration::ZERO);
}

// =============================================================================
// Error Tests
// =============================================================================

#[tokio::test]
async fn test_invalid_proxy_surfaces_on_send() {
    let client = HttpClient::new(HttpClientConfig::builder().proxy("::not a proxy::").build());
    let mut resp = client.get("http://localhost/").send(()).await;
    assert!(matches!(resp.err(), Some(HttpClientError::InvalidProxy(_))));
    assert!(matches!(
        resp.read_body().await,
        Err(HttpClientError::InvalidProxy(_))
    ));
}

#[tokio::test]
async fn test_context_deadline() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let client = HttpClient::default();
    let resp = client
        .get(server.uri())
        .context(Context::background().with_timeout(Duration::from_millis(50)))
        .send(())
        .await;
    assert!(resp.err().is_some_and(HttpClientError::is_timeout));
}

#[tokio::test]
async fn test_context_cancellation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let client = HttpClient::default();
    let resp = client
        .get(server.uri())
        .context(Context::background().with_cancellation(token))
        .send(())
        .await;
    assert!(resp.err().is_some_and(HttpClientError::is_cancelled));
}

#[tokio::test]
async fn test_connection_refused() {
    let client = HttpClient::default();
    let resp = client.get("http://127.0.0.1:1/").send(()).await;
    assert!(resp.err().is_some_and(HttpClientError::is_connection));
}

#[tokio::test]
async fn test_debug_flag_keeps_body() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string(r#"{"name":"caster","age":3}"#))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::default();
    let user = caster();
    let resp = client
        .post(server.uri())
        .debug()
        .send(Payload::record(&user))
        .await;
    assert!(resp.is_success());
}

/// Serve headers announcing a 100-byte body, send 3 bytes of it, then stall.
async fn stalled_body_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\nabc")
                    .await;
                tokio::time::sleep(Duration::from_secs(60)).await;
                drop(socket);
            });
        }
    });
    format!("http://{addr}/")
}

#[tokio::test]
async fn test_deadline_covers_reused_body_drain() {
    let url = stalled_body_server().await;
    let client = HttpClient::default();

    let send = client
        .get(url)
        .context(Context::background().with_timeout(Duration::from_millis(200)))
        .reuse_body(true)
        .send(());
    let resp = tokio::time::timeout(Duration::from_secs(3), send)
        .await
        .expect("send should return once the context deadline passes");

    assert!(resp.err().is_some_and(HttpClientError::is_timeout));
}

#[tokio::test]
async fn test_deadline_covers_read_body() {
    let url = stalled_body_server().await;
    let client = HttpClient::default();

    let mut resp = client
        .get(url)
        .context(Context::background().with_timeout(Duration::from_millis(200)))
        .send(())
        .await;
    assert!(resp.err().is_none());
    assert_eq!(resp.status().map(|s| s.as_u16()), Some(200));

    let result = tokio::time::timeout(Duration::from_secs(3), resp.read_body())
        .await
        .expect("read_body should return once the context deadline passes");
    assert!(result.unwrap_err().is_timeout());
}

#[tokio::test]
async fn test_cancellation_covers_bind() {
    let url = stalled_body_server().await;
    let token = CancellationToken::new();
    let client = HttpClient::default();

    let mut resp = client
        .get(url)
        .context(Context::background().with_cancellation(token.clone()))
        .send(())
        .await;
    assert!(resp.err().is_none());

    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let result = tokio::time::timeout(Duration::from_secs(3), resp.bind_json::<User>())
        .await
        .expect("bind should return once the context is cancelled");
    assert!(result.unwrap_err().is_cancelled());
}
