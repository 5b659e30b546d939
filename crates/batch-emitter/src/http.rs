//! HTTP transport to a Snowplow-protocol collector.

use crate::config::{EmitterConfig, HttpMethod};
use crate::transport::{Batch, DeliveryOutcome, Transport};
use crate::EmitterResult;
use chrono::Utc;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::Serialize;
use tracing::trace;
use tracker_payload::constants::{post_path, schema, GET_PATH, POST_CONTENT_TYPE};
use tracker_payload::WirePayload;
use url::Url;

/// Body of a batched POST request.
#[derive(Serialize)]
struct PostEnvelope<'a> {
    schema: &'static str,
    data: Vec<WirePayload<'a>>,
}

/// Sends batches with a pooled blocking HTTP client.
///
/// POST carries any batch as a JSON envelope. In GET mode a single-event
/// batch is sent with its fields in the query string.
pub struct HttpTransport {
    client: Client,
    method: HttpMethod,
    post_url: Url,
    get_url: Url,
}

impl HttpTransport {
    pub fn new(config: &EmitterConfig) -> EmitterResult<Self> {
        let base = config.collector_url()?;
        let client = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(Self {
            client,
            method: config.method,
            post_url: endpoint(&base, &post_path())?,
            get_url: endpoint(&base, GET_PATH)?,
        })
    }

    pub fn post_url(&self) -> &Url {
        &self.post_url
    }

    pub fn get_url(&self) -> &Url {
        &self.get_url
    }

    fn send_post(&self, batch: &Batch, sent_at: i64) -> DeliveryOutcome {
        let envelope = PostEnvelope {
            schema: schema::PAYLOAD_DATA,
            data: batch
                .payloads()
                .map(|payload| payload.with_sent_timestamp(sent_at))
                .collect(),
        };
        let body = match serde_json::to_vec(&envelope) {
            Ok(body) => body,
            Err(e) => return DeliveryOutcome::PermanentFailure(format!("unserializable batch: {e}")),
        };

        let result = self
            .client
            .post(self.post_url.clone())
            .header(CONTENT_TYPE, POST_CONTENT_TYPE)
            .body(body)
            .send();
        outcome_of(result)
    }

    fn send_get(&self, batch: &Batch, sent_at: i64) -> DeliveryOutcome {
        let Some(payload) = batch.payloads().next() else {
            return DeliveryOutcome::Success;
        };

        let mut url = self.get_url.clone();
        url.query_pairs_mut()
            .extend_pairs(payload.with_sent_timestamp(sent_at).query_pairs());
        outcome_of(self.client.get(url).send())
    }
}

impl Transport for HttpTransport {
    fn send(&self, batch: &Batch) -> DeliveryOutcome {
        let sent_at = Utc::now().timestamp_millis();
        trace!(batch_size = batch.len(), method = ?self.method, "HTTP send");
        match self.method {
            HttpMethod::Get if batch.len() == 1 => self.send_get(batch, sent_at),
            _ => self.send_post(batch, sent_at),
        }
    }
}

/// Map a collector status code to a delivery outcome.
pub fn classify_status(status: StatusCode) -> DeliveryOutcome {
    if status.is_success() {
        DeliveryOutcome::Success
    } else if status.is_client_error() {
        DeliveryOutcome::PermanentFailure(format!("collector rejected request: HTTP {status}"))
    } else if status.is_server_error() {
        DeliveryOutcome::TransientFailure(format!("collector error: HTTP {status}"))
    } else {
        DeliveryOutcome::TransientFailure(format!("unexpected response: HTTP {status}"))
    }
}

fn outcome_of(result: reqwest::Result<reqwest::blocking::Response>) -> DeliveryOutcome {
    match result {
        Ok(response) => classify_status(response.status()),
        Err(e) => DeliveryOutcome::TransientFailure(format!("request failed: {e}")),
    }
}

fn endpoint(base: &Url, path: &str) -> EmitterResult<Url> {
    let root = base.as_str().trim_end_matches('/');
    Ok(Url::parse(&format!("{root}/{path}"))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert_eq!(classify_status(StatusCode::OK), DeliveryOutcome::Success);
        assert_eq!(classify_status(StatusCode::NO_CONTENT), DeliveryOutcome::Success);
        assert!(matches!(
            classify_status(StatusCode::BAD_REQUEST),
            DeliveryOutcome::PermanentFailure(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS),
            DeliveryOutcome::PermanentFailure(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::SERVICE_UNAVAILABLE),
            DeliveryOutcome::TransientFailure(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::NOT_MODIFIED),
            DeliveryOutcome::TransientFailure(_)
        ));
    }

    #[test]
    fn endpoints_join_collector_paths() {
        let base = Url::parse("https://collector.example.com/").unwrap();
        assert_eq!(
            endpoint(&base, &post_path()).unwrap().as_str(),
            "https://collector.example.com/com.snowplowanalytics.snowplow/tp2"
        );

        let base = Url::parse("http://localhost:8080/prefix/").unwrap();
        assert_eq!(
            endpoint(&base, GET_PATH).unwrap().as_str(),
            "http://localhost:8080/prefix/i"
        );
    }
}
