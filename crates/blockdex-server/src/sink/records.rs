//! Row shapes written to tenant tables

use blockdex_common::JobType;
use chrono::{DateTime, Utc};
use sqlx::{query_builder::Separated, types::BigDecimal, Postgres};

#[derive(Debug, Clone, PartialEq)]
pub struct NftBid {
    pub collection: String,
    pub mint: String,
    pub price: BigDecimal,
    pub marketplace: String,
    pub bidder: String,
    pub expiry: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NftPrice {
    pub collection: String,
    pub mint: String,
    pub price: BigDecimal,
    pub marketplace: String,
    pub seller: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenBorrowing {
    pub token: String,
    pub amount: BigDecimal,
    pub platform: String,
    pub interest_rate: BigDecimal,
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenPrice {
    pub token: String,
    pub price: BigDecimal,
    pub platform: String,
    pub volume_24h: Option<BigDecimal>,
}

/// One row destined for a tenant table, tagged by job type
#[derive(Debug, Clone, PartialEq)]
pub enum SinkRecord {
    NftBid(NftBid),
    NftPrice(NftPrice),
    TokenBorrowing(TokenBorrowing),
    TokenPrice(TokenPrice),
}

impl SinkRecord {
    pub fn job_type(&self) -> JobType {
        match self {
            SinkRecord::NftBid(_) => JobType::NftBids,
            SinkRecord::NftPrice(_) => JobType::NftPrices,
            SinkRecord::TokenBorrowing(_) => JobType::TokenBorrowing,
            SinkRecord::TokenPrice(_) => JobType::TokenPrices,
        }
    }

    /// Values of the natural key columns, in schema order
    pub fn natural_key(&self) -> (&str, &str) {
        match self {
            SinkRecord::NftBid(r) => (&r.mint, &r.bidder),
            SinkRecord::NftPrice(r) => (&r.mint, &r.seller),
            SinkRecord::TokenBorrowing(r) => (&r.token, &r.platform),
            SinkRecord::TokenPrice(r) => (&r.token, &r.platform),
        }
    }

    /// Bind the row's values in the column order of its schema
    pub(crate) fn push_binds(&self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        match self {
            SinkRecord::NftBid(r) => {
                row.push_bind(r.collection.clone())
                    .push_bind(r.mint.clone())
                    .push_bind(r.price.clone())
                    .push_bind(r.marketplace.clone())
                    .push_bind(r.bidder.clone())
                    .push_bind(r.expiry);
            },
            SinkRecord::NftPrice(r) => {
                row.push_bind(r.collection.clone())
                    .push_bind(r.mint.clone())
                    .push_bind(r.price.clone())
                    .push_bind(r.marketplace.clone())
                    .push_bind(r.seller.clone());
            },
            SinkRecord::TokenBorrowing(r) => {
                row.push_bind(r.token.clone())
                    .push_bind(r.amount.clone())
                    .push_bind(r.platform.clone())
                    .push_bind(r.interest_rate.clone())
                    .push_bind(r.available);
            },
            SinkRecord::TokenPrice(r) => {
                row.push_bind(r.token.clone())
                    .push_bind(r.price.clone())
                    .push_bind(r.platform.clone())
                    .push_bind(r.volume_24h.clone());
            },
        }
    }
}

/// Collapse records sharing a natural key, keeping the last occurrence.
///
/// A single `INSERT .. ON CONFLICT DO UPDATE` cannot affect the same row
/// twice, so batches are deduplicated before writing. Survivors keep their
/// relative order.
pub fn dedupe_by_natural_key(records: Vec<SinkRecord>) -> Vec<SinkRecord> {
    let mut seen = std::collections::HashSet::new();
    let mut kept: Vec<SinkRecord> = records
        .into_iter()
        .rev()
        .filter(|record| {
            let (a, b) = record.natural_key();
            seen.insert((a.to_string(), b.to_string()))
        })
        .collect();
    kept.reverse();
    kept
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn bid(mint: &str, bidder: &str, price: &str) -> SinkRecord {
        SinkRecord::NftBid(NftBid {
            collection: "degods".into(),
            mint: mint.into(),
            price: BigDecimal::from_str(price).unwrap(),
            marketplace: "MAGIC_EDEN".into(),
            bidder: bidder.into(),
            expiry: None,
        })
    }

    #[test]
    fn test_dedupe_keeps_last_occurrence() {
        let records = vec![
            bid("m1", "alice", "1.0"),
            bid("m2", "alice", "2.0"),
            bid("m1", "alice", "3.0"),
            bid("m1", "bob", "4.0"),
        ];

        let deduped = dedupe_by_natural_key(records);

        assert_eq!(
            deduped,
            vec![
                bid("m2", "alice", "2.0"),
                bid("m1", "alice", "3.0"),
                bid("m1", "bob", "4.0"),
            ]
        );
    }

    #[test]
    fn test_job_type_tag() {
        assert_eq!(bid("m", "b", "1").job_type(), JobType::NftBids);
    }
}
