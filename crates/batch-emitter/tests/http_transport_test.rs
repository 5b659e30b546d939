//! HTTP transport tests against a mock collector.

mod common;

use batch_emitter::{Batch, DeliveryOutcome, Emitter, EmitterConfig, HttpMethod, HttpTransport, Transport};
use common::payload;
use std::time::Duration;
use tracker_payload::constants::schema;
use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

const POST_PATH: &str = "/com.snowplowanalytics.snowplow/tp2";

/// The blocking client must not run on the async runtime's threads.
async fn send_blocking(config: EmitterConfig, batch: Batch) -> DeliveryOutcome {
    tokio::task::spawn_blocking(move || {
        let transport = HttpTransport::new(&config).expect("transport should build");
        transport.send(&batch)
    })
    .await
    .expect("blocking task panicked")
}

fn config_for(server: &MockServer) -> EmitterConfig {
    let mut config = EmitterConfig::new(server.uri());
    config.request_timeout_ms = 2_000;
    config
}

async fn mount_status(server: &MockServer, method: &str, status: u16) {
    Mock::given(matchers::method(method))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn post_sends_payload_data_envelope() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path(POST_PATH))
        .and(matchers::header("content-type", "application/json; charset=utf-8"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let first = payload("first");
    let second = payload("second");
    let ids = [first.event_id(), second.event_id()];
    let outcome = send_blocking(config_for(&server), Batch::from_payloads(vec![first, second])).await;
    assert_eq!(outcome, DeliveryOutcome::Success);

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["schema"], schema::PAYLOAD_DATA);

    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["eid"], ids[0].to_string());
    assert_eq!(data[1]["eid"], ids[1].to_string());
    assert_eq!(data[0]["se_ac"], "first");
    assert!(data[0]["dtm"].is_string());
    assert!(data[0]["stm"].as_str().unwrap().parse::<i64>().is_ok());
}

#[tokio::test(flavor = "multi_thread")]
async fn client_errors_are_permanent() {
    let server = MockServer::start().await;
    mount_status(&server, "POST", 400).await;

    let outcome = send_blocking(config_for(&server), Batch::from_payloads(vec![payload("a")])).await;
    assert!(matches!(outcome, DeliveryOutcome::PermanentFailure(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn server_errors_are_transient() {
    let server = MockServer::start().await;
    mount_status(&server, "POST", 503).await;

    let outcome = send_blocking(config_for(&server), Batch::from_payloads(vec![payload("a")])).await;
    assert!(matches!(outcome, DeliveryOutcome::TransientFailure(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn connection_refused_is_transient() {
    let mut config = EmitterConfig::new("http://127.0.0.1:1");
    config.request_timeout_ms = 1_000;

    let outcome = send_blocking(config, Batch::from_payloads(vec![payload("a")])).await;
    assert!(matches!(outcome, DeliveryOutcome::TransientFailure(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn get_mode_encodes_fields_in_query() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("GET"))
        .and(matchers::path("/i"))
        .and(matchers::query_param("e", "se"))
        .and(matchers::query_param("se_ac", "clicked"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.method = HttpMethod::Get;
    let event = payload("clicked");
    let event_id = event.event_id().to_string();
    let outcome = send_blocking(config, Batch::from_payloads(vec![event])).await;
    assert_eq!(outcome, DeliveryOutcome::Success);

    let requests = server.received_requests().await.unwrap();
    let query: Vec<(String, String)> = requests[0]
        .url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    assert!(query.contains(&("eid".to_string(), event_id)));
    assert_eq!(query.last().map(|(k, _)| k.as_str()), Some("stm"));
}

#[tokio::test(flavor = "multi_thread")]
async fn emitter_delivers_seven_events_in_two_requests() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path(POST_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.batch_size = 4;
    config.buffer_timeout_ms = 100;
    tokio::task::spawn_blocking(move || {
        let emitter = Emitter::new(config).expect("emitter should start");
        for i in 0..7 {
            emitter.enqueue(payload(&format!("event-{i}"))).unwrap();
        }
        emitter.shutdown(Duration::from_secs(5)).unwrap();
    })
    .await
    .unwrap();

    let requests = server.received_requests().await.unwrap();
    let sizes: Vec<usize> = requests
        .iter()
        .map(|r| {
            let body: serde_json::Value = serde_json::from_slice(&r.body).unwrap();
            body["data"].as_array().unwrap().len()
        })
        .collect();
    assert_eq!(sizes, vec![4, 3]);
}
