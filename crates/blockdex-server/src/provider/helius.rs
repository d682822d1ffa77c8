//! Helius webhook API client

use async_trait::async_trait;
use blockdex_common::JobType;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use super::{ProviderError, WebhookProvider};
use crate::config::ProviderConfig;
use crate::models::{IndexingJob, JobConfig};
use crate::sink::records::{NftBid, NftPrice};
use crate::sink::transform::{decimal, timestamp};
use crate::sink::SinkRecord;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Marketplace programs watched by NFT subscriptions
const NFT_MARKETPLACE_PROGRAMS: &[&str] = &[
    "M2mx93ekt1fmXSVkTrUL9xVFHkmME8HTUi5Cyc5aF7K", // Magic Eden v2
    "TSWAPaqyCSx2KABk68Shruf4rp7CxcNi8hAsbdwmHbN", // Tensor swap
];

fn transaction_types(job_type: JobType) -> &'static [&'static str] {
    match job_type {
        JobType::NftBids => &["NFT_BID"],
        JobType::NftPrices => &["NFT_LISTING", "NFT_SALE"],
        JobType::TokenBorrowing => &["TOKEN_TRANSFER", "SWAP", "UNKNOWN"],
        JobType::TokenPrices => &["SWAP", "UNKNOWN"],
    }
}

fn account_addresses(job_type: JobType, config: &JobConfig) -> Vec<String> {
    if job_type.is_token_type() {
        config.token_list().to_vec()
    } else {
        NFT_MARKETPLACE_PROGRAMS.iter().map(|p| p.to_string()).collect()
    }
}

pub struct HeliusProvider {
    client: Client,
    api_url: String,
    api_key: String,
    webhook_base_url: String,
}

impl std::fmt::Debug for HeliusProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeliusProvider")
            .field("api_url", &self.api_url)
            .field("webhook_base_url", &self.webhook_base_url)
            .finish_non_exhaustive()
    }
}

impl HeliusProvider {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        webhook_base_url: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("blockdex/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            webhook_base_url: webhook_base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// `None` when no API key is configured
    pub fn from_config(config: &ProviderConfig) -> Result<Option<Self>, ProviderError> {
        match (&config.helius_api_key, &config.webhook_base_url) {
            (Some(key), Some(base)) => Ok(Some(Self::new(&config.helius_api_url, key, base)?)),
            _ => Ok(None),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path)
    }

    /// Attach the API key, send, and turn non-2xx answers into errors.
    ///
    /// Transport errors drop the request URL because it carries the key.
    async fn send(&self, request: RequestBuilder) -> Result<Response, ProviderError> {
        let response = request
            .query(&[("api-key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.without_url()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| {
                v.get("message")
                    .or_else(|| v.get("error"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());

        Err(ProviderError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn fetch_nft_events(&self, collection: &str, event_type: &str) -> Result<Vec<Value>, ProviderError> {
        let response = self
            .send(
                self.client
                    .get(self.url("nft-events"))
                    .query(&[("collection", collection), ("type", event_type)]),
            )
            .await?;

        match response
            .json::<Value>()
            .await
            .map_err(|e| ProviderError::Http(e.without_url()))?
        {
            Value::Array(items) => Ok(items),
            other => Err(ProviderError::InvalidResponse(format!(
                "expected an array of nft events, got {}",
                other
            ))),
        }
    }
}

fn job_type(job: &IndexingJob) -> Result<JobType, ProviderError> {
    job.kind()
        .map_err(|e| ProviderError::UnsupportedJob(e.to_string()))
}

fn backfill_bid(item: &Value, config: &JobConfig) -> Option<SinkRecord> {
    let text = |key: &str| item.get(key).and_then(Value::as_str).map(str::to_string);
    let collection = text("collection")?;
    let marketplace = text("marketplace")?;
    if !config.allows_collection(Some(&collection)) || !config.allows_marketplace(Some(&marketplace)) {
        return None;
    }
    Some(SinkRecord::NftBid(NftBid {
        collection,
        mint: text("mint")?,
        price: decimal(item.get("price")?)?,
        marketplace,
        bidder: text("bidder")?,
        expiry: item.get("expiry").and_then(timestamp),
    }))
}

fn backfill_listing(item: &Value, config: &JobConfig) -> Option<SinkRecord> {
    let text = |key: &str| item.get(key).and_then(Value::as_str).map(str::to_string);
    let collection = text("collection")?;
    let marketplace = text("marketplace")?;
    if !config.allows_collection(Some(&collection)) || !config.allows_marketplace(Some(&marketplace)) {
        return None;
    }
    Some(SinkRecord::NftPrice(NftPrice {
        collection,
        mint: text("mint")?,
        price: decimal(item.get("price")?)?,
        marketplace,
        seller: text("seller")?,
    }))
}

#[async_trait]
impl WebhookProvider for HeliusProvider {
    fn name(&self) -> &'static str {
        "helius"
    }

    async fn create_subscription(&self, job: &IndexingJob) -> Result<Option<String>, ProviderError> {
        let job_type = job_type(job)?;
        let body = json!({
            "webhookURL": format!("{}/placeholder", self.webhook_base_url),
            "transactionTypes": transaction_types(job_type),
            "accountAddresses": account_addresses(job_type, &job.config),
            "webhookType": "enhanced",
        });

        let response = self
            .send(self.client.post(self.url("webhooks")).json(&body))
            .await?;
        let created: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Http(e.without_url()))?;

        let webhook_id = created
            .get("webhookID")
            .and_then(Value::as_str)
            .ok_or_else(|| ProviderError::InvalidResponse("missing webhookID".to_string()))?;

        info!(job_id = %job.id, webhook_id, "Created Helius webhook");
        Ok(Some(webhook_id.to_string()))
    }

    async fn update_subscription_target(
        &self,
        subscription_id: &str,
        job_id: Uuid,
    ) -> Result<(), ProviderError> {
        let body = json!({ "webhookURL": format!("{}/{}", self.webhook_base_url, job_id) });
        self.send(
            self.client
                .put(self.url(&format!("webhooks/{}", subscription_id)))
                .json(&body),
        )
        .await?;
        Ok(())
    }

    async fn pause_subscription(&self, subscription_id: &str) -> Result<(), ProviderError> {
        self.send(
            self.client
                .post(self.url(&format!("webhooks/{}/pause", subscription_id))),
        )
        .await?;
        Ok(())
    }

    async fn resume_subscription(&self, subscription_id: &str) -> Result<(), ProviderError> {
        self.send(
            self.client
                .post(self.url(&format!("webhooks/{}/resume", subscription_id))),
        )
        .await?;
        Ok(())
    }

    async fn delete_subscription(&self, subscription_id: &str) -> Result<(), ProviderError> {
        self.send(
            self.client
                .delete(self.url(&format!("webhooks/{}", subscription_id))),
        )
        .await?;
        Ok(())
    }

    async fn fetch_initial_dataset(&self, job: &IndexingJob) -> Result<Vec<SinkRecord>, ProviderError> {
        let (event_type, parse): (&str, fn(&Value, &JobConfig) -> Option<SinkRecord>) =
            match job_type(job)? {
                JobType::NftBids => ("bid", backfill_bid),
                JobType::NftPrices => ("listing", backfill_listing),
                JobType::TokenBorrowing | JobType::TokenPrices => return Ok(Vec::new()),
            };

        let mut records = Vec::new();
        for collection in job.config.collection_list() {
            match self.fetch_nft_events(collection, event_type).await {
                Ok(items) => {
                    records.extend(items.iter().filter_map(|item| parse(item, &job.config)));
                },
                Err(e) => {
                    warn!(job_id = %job.id, collection = %collection, error = %e, "Skipping collection in backfill");
                },
            }
        }

        info!(job_id = %job.id, records = records.len(), "Fetched initial dataset");
        Ok(records)
    }
}
