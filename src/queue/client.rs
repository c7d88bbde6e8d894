//! HTTP client for the backend delivery queue.

use std::time::Duration;

use alloy::primitives::Address;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::QueueConfig;
use crate::queue::types::{ClaimAck, QueueError, QueueRecord, QueueResult};

/// Claim submission and queue status lookups.
#[async_trait]
pub trait DeliveryQueueClient: Send + Sync {
    /// Request delivery `delivery_id` to `address`.
    async fn submit_claim(&self, delivery_id: u64, address: Address) -> QueueResult<ClaimAck>;

    /// Fetch the queue entry created by a submission.
    async fn queue_status(&self, queue_uid: &str) -> QueueResult<QueueRecord>;
}

#[derive(Debug, Serialize)]
struct ClaimRequest {
    id: u64,
    address: String,
}

/// [`DeliveryQueueClient`] over the backend's JSON API.
#[derive(Debug, Clone)]
pub struct HttpQueueClient {
    client: Client,
    config: QueueConfig,
}

impl HttpQueueClient {
    pub fn new(config: QueueConfig) -> QueueResult<Self> {
        url::Url::parse(&config.api_url)
            .map_err(|e| QueueError::InvalidConfig(format!("{}: {}", config.api_url, e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url.trim_end_matches('/'), path)
    }

    /// `{queue_path}/{queue_uid}` with the uid percent-encoded as one segment.
    fn queue_entry_url(&self, queue_uid: &str) -> QueueResult<url::Url> {
        let mut url = url::Url::parse(&self.url(&self.config.queue_path))
            .map_err(|e| QueueError::InvalidConfig(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| {
                QueueError::InvalidConfig(format!("{} cannot take a path", self.config.api_url))
            })?
            .pop_if_empty()
            .push(queue_uid);
        Ok(url)
    }

    /// Read a response, mapping non-success statuses and undecodable bodies.
    pub(crate) async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> QueueResult<T> {
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(QueueError::Rejected {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|e| QueueError::Malformed(e.to_string()))
    }

    /// GET `path` and decode the JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> QueueResult<T> {
        let resp = self.client.get(self.url(path)).send().await?;
        Self::read_json(resp).await
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }
}

#[async_trait]
impl DeliveryQueueClient for HttpQueueClient {
    async fn submit_claim(&self, delivery_id: u64, address: Address) -> QueueResult<ClaimAck> {
        let body = ClaimRequest {
            id: delivery_id,
            address: address.to_checksum(None),
        };
        tracing::debug!(delivery_id, address = %body.address, "Submitting claim");

        let resp = self
            .client
            .post(self.url(&self.config.claim_path))
            .json(&body)
            .send()
            .await?;
        Self::read_json(resp).await
    }

    async fn queue_status(&self, queue_uid: &str) -> QueueResult<QueueRecord> {
        let url = self.queue_entry_url(queue_uid)?;
        let resp = self.client.get(url).send().await?;
        Self::read_json(resp).await
    }
}
