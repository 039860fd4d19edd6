//! Client for the id reservation service.
//!
//! The service hands out blocks of globally unique ids so that segments
//! created by one solver never collide with ids used elsewhere. A
//! reservation is a `POST {"count": n}` answered by `{"begin": b, "end": e}`
//! with `e - b == n`.

use async_trait::async_trait;
use proofread_core::IdRange;
use serde::Serialize;
use tracing::debug;

use crate::errors::IdServiceError;

/// Source of reserved id blocks.
#[async_trait]
pub trait IdService: Send + Sync {
    /// Reserve exactly `count` consecutive ids.
    async fn reserve(&self, count: u64) -> Result<IdRange, IdServiceError>;
}

#[derive(Serialize)]
struct ReserveRequest {
    count: u64,
}

/// [`IdService`] over HTTP.
#[derive(Clone, Debug)]
pub struct HttpIdService {
    client: reqwest::Client,
    url: String,
}

impl HttpIdService {
    /// Client for the reservation endpoint at `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    /// Reservation endpoint.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl IdService for HttpIdService {
    async fn reserve(&self, count: u64) -> Result<IdRange, IdServiceError> {
        let range: IdRange = self
            .client
            .post(&self.url)
            .json(&ReserveRequest { count })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let range = range.expect_len(count)?;
        debug!(%range, url = %self.url, "reserved ids");
        Ok(range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proofread_core::IdRangeError;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn reserves_a_block() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ids"))
            .and(body_json(json!({"count": 16})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"begin": 23461, "end": 23477})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let service = HttpIdService::new(format!("{}/ids", server.uri()));
        let range = service.reserve(16).await.unwrap();
        assert_eq!(range.begin, 23461);
        assert_eq!(range.end, 23477);
    }

    #[tokio::test]
    async fn wrong_sized_block_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"begin": 10, "end": 12})))
            .mount(&server)
            .await;

        let service = HttpIdService::new(server.uri());
        assert_matches!(
            service.reserve(4).await,
            Err(IdServiceError::InvalidRange(IdRangeError::WrongLength {
                expected: 4,
                actual: 2
            }))
        );
    }

    #[tokio::test]
    async fn server_errors_surface() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let service = HttpIdService::new(server.uri());
        assert_matches!(service.reserve(1).await, Err(IdServiceError::Http(_)));
    }
}
