//! HTTP client for the hospital information system.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::HisError;

/// One patient as reported by the HIS.
///
/// Only the identifier is interpreted here; everything else the HIS sends
/// rides along opaquely so the cached list round-trips unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: u64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Client for the HIS HTTP API.
#[derive(Clone)]
pub struct HisClient {
    http: Client,
    base_url: String,
}

impl HisClient {
    /// Create a new client for the given HIS base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self, HisError> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Fetch the authoritative patient list.
    pub async fn fetch_patients(&self) -> Result<Vec<Patient>, HisError> {
        let url = format!("{}/patients", self.base_url);
        debug!(%url, "fetching patient list");

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(HisError::Status(status));
        }

        // Decode from bytes rather than response.json() so a malformed body
        // surfaces as Decode instead of a generic transport error.
        let body = response.bytes().await?;
        let patients = serde_json::from_slice(&body)?;
        Ok(patients)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetches_and_decodes_the_patient_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/patients"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 1, "name": "Anna"},
                {"id": 2, "name": "Boris", "ward": 4},
            ])))
            .mount(&server)
            .await;

        let client = HisClient::new(server.uri()).unwrap();
        let patients = client.fetch_patients().await.unwrap();

        assert_eq!(patients.len(), 2);
        assert_eq!(patients[0].id, 1);
        assert_eq!(
            patients[1].extra.get("ward"),
            Some(&serde_json::json!(4))
        );
    }

    #[tokio::test]
    async fn non_success_status_is_reported_as_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/patients"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = HisClient::new(server.uri()).unwrap();
        let err = client.fetch_patients().await.unwrap_err();
        assert!(matches!(
            err,
            HisError::Status(reqwest::StatusCode::SERVICE_UNAVAILABLE)
        ));
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/patients"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = HisClient::new(server.uri()).unwrap();
        let err = client.fetch_patients().await.unwrap_err();
        assert!(matches!(err, HisError::Decode(_)));
    }
}
