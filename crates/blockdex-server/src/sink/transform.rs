//! Webhook payload to row transforms
//!
//! Payloads are Helius enhanced-transaction arrays. Anything that is not an
//! array yields no rows, and entries missing a required field are skipped.
//! Allow-lists from the job config are applied here, so rows that reach the
//! writer are always wanted.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use sqlx::types::BigDecimal;
use std::str::FromStr;

use super::records::{NftBid, NftPrice, SinkRecord, TokenBorrowing, TokenPrice};
use crate::models::JobConfig;

const LAMPORTS_PER_SOL_EXP: u64 = 9;
/// Digits kept when deriving a token price from a swap
const PRICE_SCALE: i64 = 18;

pub fn nft_bids(payload: &Value, config: &JobConfig) -> Vec<SinkRecord> {
    nft_events(payload, &["NFT_BID"])
        .filter_map(|(tx, event)| {
            let (collection, mint, marketplace) = nft_identity(tx, event, config)?;
            Some(SinkRecord::NftBid(NftBid {
                collection,
                mint,
                price: decimal(event.get("amount")?)?,
                marketplace,
                bidder: str_field(event, "bidder")?,
                expiry: event.get("expiry").and_then(timestamp),
            }))
        })
        .collect()
}

pub fn nft_prices(payload: &Value, config: &JobConfig) -> Vec<SinkRecord> {
    nft_events(payload, &["NFT_LISTING", "NFT_SALE"])
        .filter_map(|(tx, event)| {
            let (collection, mint, marketplace) = nft_identity(tx, event, config)?;
            Some(SinkRecord::NftPrice(NftPrice {
                collection,
                mint,
                price: decimal(event.get("amount")?)?,
                marketplace,
                seller: str_field(event, "seller")?,
            }))
        })
        .collect()
}

/// Derive SOL-denominated token prices from swaps that pair SOL with tokens.
///
/// A swap paying SOL for tokens prices each token output against the native
/// input, and the reverse for tokens sold for SOL.
pub fn token_prices(payload: &Value, config: &JobConfig) -> Vec<SinkRecord> {
    let mut rows = Vec::new();

    for tx in transactions(payload, &["SWAP"]) {
        let Some(swap) = tx.pointer("/events/swap") else {
            continue;
        };
        let Some(platform) = str_field(tx, "source") else {
            continue;
        };
        if !config.allows_platform(Some(&platform)) {
            continue;
        }

        let legs = [
            (swap.get("nativeInput"), swap.get("tokenOutputs")),
            (swap.get("nativeOutput"), swap.get("tokenInputs")),
        ];

        for (native, tokens) in legs {
            let Some(sol) = native.and_then(|n| n.get("amount")).and_then(lamports_to_sol) else {
                continue;
            };
            for token_leg in tokens.and_then(Value::as_array).into_iter().flatten() {
                let Some(mint) = str_field(token_leg, "mint") else {
                    continue;
                };
                if !config.allows_token(Some(&mint)) {
                    continue;
                }
                let Some(amount) = token_leg.get("rawTokenAmount").and_then(raw_token_amount) else {
                    continue;
                };
                if amount == BigDecimal::from(0) {
                    continue;
                }
                rows.push(SinkRecord::TokenPrice(TokenPrice {
                    token: mint,
                    price: (&sol / &amount).round(PRICE_SCALE),
                    platform: platform.clone(),
                    volume_24h: None,
                }));
            }
        }
    }

    rows
}

/// Lending snapshots listed under `events.lending`
pub fn token_borrowing(payload: &Value, config: &JobConfig) -> Vec<SinkRecord> {
    let mut rows = Vec::new();

    for tx in transactions(payload, &[]) {
        let Some(entries) = tx.pointer("/events/lending").and_then(Value::as_array) else {
            continue;
        };
        let source = str_field(tx, "source");

        for entry in entries {
            let Some(token) = str_field(entry, "token") else {
                continue;
            };
            let Some(platform) = str_field(entry, "platform").or_else(|| source.clone()) else {
                continue;
            };
            if !config.allows_token(Some(&token)) || !config.allows_platform(Some(&platform)) {
                continue;
            }
            let (Some(amount), Some(interest_rate), Some(available)) = (
                entry.get("amount").and_then(decimal),
                entry.get("interestRate").and_then(decimal),
                entry.get("available").and_then(Value::as_bool),
            ) else {
                continue;
            };
            rows.push(SinkRecord::TokenBorrowing(TokenBorrowing {
                token,
                amount,
                platform,
                interest_rate,
                available,
            }));
        }
    }

    rows
}

/// Transactions of the payload whose `type` is one of `types` (any type when empty)
fn transactions<'a>(payload: &'a Value, types: &'a [&str]) -> impl Iterator<Item = &'a Value> {
    payload
        .as_array()
        .into_iter()
        .flatten()
        .filter(move |tx| {
            types.is_empty()
                || tx
                    .get("type")
                    .and_then(Value::as_str)
                    .is_some_and(|t| types.contains(&t))
        })
}

/// `(transaction, nft event)` pairs; `events.nft` may be one object or a list
fn nft_events<'a>(
    payload: &'a Value,
    types: &'a [&str],
) -> impl Iterator<Item = (&'a Value, &'a Value)> {
    transactions(payload, types).flat_map(|tx| {
        let events: Vec<&Value> = match tx.pointer("/events/nft") {
            Some(Value::Array(list)) => list.iter().collect(),
            Some(event @ Value::Object(_)) => vec![event],
            _ => Vec::new(),
        };
        events.into_iter().map(move |event| (tx, event))
    })
}

/// Collection, mint and marketplace of an nft event, if it passes the allow-lists
fn nft_identity(tx: &Value, event: &Value, config: &JobConfig) -> Option<(String, String, String)> {
    let collection = str_field(event, "collection")?;
    let marketplace = str_field(event, "marketplace")
        .or_else(|| str_field(event, "source"))
        .or_else(|| str_field(tx, "source"))?;

    if !config.allows_collection(Some(&collection)) || !config.allows_marketplace(Some(&marketplace)) {
        return None;
    }

    let mint = str_field(event, "mint").or_else(|| {
        event
            .pointer("/nfts/0/mint")
            .and_then(Value::as_str)
            .map(str::to_string)
    })?;

    Some((collection, mint, marketplace))
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Numbers and numeric strings both decode; anything else is rejected
pub(crate) fn decimal(value: &Value) -> Option<BigDecimal> {
    match value {
        Value::Number(n) => BigDecimal::from_str(&n.to_string()).ok(),
        Value::String(s) => BigDecimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

/// Numeric timestamps are epoch milliseconds, strings are RFC 3339
pub(crate) fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        _ => None,
    }
}

/// `10^-exp`
fn unit_scale(exp: u64) -> Option<BigDecimal> {
    BigDecimal::from_str(&format!("1e-{}", exp)).ok()
}

fn lamports_to_sol(value: &Value) -> Option<BigDecimal> {
    Some(decimal(value)? * unit_scale(LAMPORTS_PER_SOL_EXP)?)
}

/// `{ tokenAmount, decimals }` scaled to whole tokens
fn raw_token_amount(raw: &Value) -> Option<BigDecimal> {
    let amount = decimal(raw.get("tokenAmount")?)?;
    let decimals = raw.get("decimals").and_then(Value::as_u64).unwrap_or(0);
    Some(amount * unit_scale(decimals)?)
}
