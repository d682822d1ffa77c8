//! Common types used across Blockdex

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::BlockdexError;

/// Kind of blockchain data an indexing job collects.
///
/// Each variant owns a fixed table template on the sink side; adding a new
/// kind of data means adding a variant here and a schema in the server's
/// sink module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    NftBids,
    NftPrices,
    TokenBorrowing,
    TokenPrices,
}

impl JobType {
    pub const ALL: [JobType; 4] = [
        JobType::NftBids,
        JobType::NftPrices,
        JobType::TokenBorrowing,
        JobType::TokenPrices,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::NftBids => "nft_bids",
            JobType::NftPrices => "nft_prices",
            JobType::TokenBorrowing => "token_borrowing",
            JobType::TokenPrices => "token_prices",
        }
    }

    /// Whether the job watches token mints rather than NFT collections
    pub fn is_token_type(&self) -> bool {
        matches!(self, JobType::TokenBorrowing | JobType::TokenPrices)
    }
}

impl FromStr for JobType {
    type Err = BlockdexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nft_bids" => Ok(JobType::NftBids),
            "nft_prices" => Ok(JobType::NftPrices),
            "token_borrowing" => Ok(JobType::TokenBorrowing),
            "token_prices" => Ok(JobType::TokenPrices),
            other => Err(BlockdexError::UnsupportedJobType(other.to_string())),
        }
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of an indexing job
///
/// ```text
/// pending --backfill done--> active <--pause/resume--> paused
///                              |  ^
///                    failure   v  |  next success
///                             error
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Active,
    Paused,
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Active => "active",
            JobStatus::Paused => "paused",
            JobStatus::Error => "error",
        }
    }

    /// Only active jobs accept and process webhook events
    pub fn accepts_events(&self) -> bool {
        matches!(self, JobStatus::Active)
    }
}

impl FromStr for JobStatus {
    type Err = BlockdexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "active" => Ok(JobStatus::Active),
            "paused" => Ok(JobStatus::Paused),
            "error" => Ok(JobStatus::Error),
            other => Err(BlockdexError::InvalidJobStatus(other.to_string())),
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of an entry in the webhook event log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookEventStatus {
    Received,
    Error,
}

impl WebhookEventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookEventStatus::Received => "received",
            WebhookEventStatus::Error => "error",
        }
    }
}

impl FromStr for WebhookEventStatus {
    type Err = BlockdexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "received" => Ok(WebhookEventStatus::Received),
            "error" => Ok(WebhookEventStatus::Error),
            other => Err(BlockdexError::InvalidEventStatus(other.to_string())),
        }
    }
}

impl std::fmt::Display for WebhookEventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row decoding support: stored strings become typed values.
macro_rules! impl_try_from_string {
    ($($ty:ty),*) => {
        $(
            impl TryFrom<String> for $ty {
                type Error = BlockdexError;

                fn try_from(value: String) -> Result<Self, BlockdexError> {
                    value.parse()
                }
            }
        )*
    };
}

impl_try_from_string!(JobType, JobStatus, WebhookEventStatus);
