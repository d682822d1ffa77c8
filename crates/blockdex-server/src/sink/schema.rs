//! Per-job-type table templates
//!
//! Each [`JobType`] owns exactly one [`SinkSchema`]: its columns, natural key,
//! columns overwritten on conflict, and the transform that turns a webhook
//! payload into rows. DDL and upsert SQL are generated only from these
//! templates plus a validated [`TableName`].

use blockdex_common::JobType;
use serde_json::Value;

use super::records::SinkRecord;
use super::table::TableName;
use super::transform;
use crate::models::JobConfig;

pub type TransformFn = fn(&Value, &JobConfig) -> Vec<SinkRecord>;

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub sql_type: &'static str,
    pub nullable: bool,
}

const fn col(name: &'static str, sql_type: &'static str) -> Column {
    Column {
        name,
        sql_type,
        nullable: false,
    }
}

const fn nullable(name: &'static str, sql_type: &'static str) -> Column {
    Column {
        name,
        sql_type,
        nullable: true,
    }
}

#[derive(Debug)]
pub struct SinkSchema {
    pub job_type: JobType,
    /// Data columns in bind order
    pub columns: &'static [Column],
    pub natural_key: &'static [&'static str],
    /// Columns replaced by the incoming row on natural-key conflict
    pub mutable: &'static [&'static str],
    pub transform: TransformFn,
}

static NFT_BIDS: SinkSchema = SinkSchema {
    job_type: JobType::NftBids,
    columns: &[
        col("collection", "TEXT"),
        col("mint", "TEXT"),
        col("price", "NUMERIC"),
        col("marketplace", "TEXT"),
        col("bidder", "TEXT"),
        nullable("expiry", "TIMESTAMPTZ"),
    ],
    natural_key: &["mint", "bidder"],
    mutable: &["price", "expiry"],
    transform: transform::nft_bids,
};

static NFT_PRICES: SinkSchema = SinkSchema {
    job_type: JobType::NftPrices,
    columns: &[
        col("collection", "TEXT"),
        col("mint", "TEXT"),
        col("price", "NUMERIC"),
        col("marketplace", "TEXT"),
        col("seller", "TEXT"),
    ],
    natural_key: &["mint", "seller"],
    mutable: &["price"],
    transform: transform::nft_prices,
};

static TOKEN_BORROWING: SinkSchema = SinkSchema {
    job_type: JobType::TokenBorrowing,
    columns: &[
        col("token", "TEXT"),
        col("amount", "NUMERIC"),
        col("platform", "TEXT"),
        col("interest_rate", "NUMERIC"),
        col("available", "BOOLEAN"),
    ],
    natural_key: &["token", "platform"],
    mutable: &["amount", "interest_rate", "available"],
    transform: transform::token_borrowing,
};

static TOKEN_PRICES: SinkSchema = SinkSchema {
    job_type: JobType::TokenPrices,
    columns: &[
        col("token", "TEXT"),
        col("price", "NUMERIC"),
        col("platform", "TEXT"),
        nullable("volume_24h", "NUMERIC"),
    ],
    natural_key: &["token", "platform"],
    mutable: &["price", "volume_24h"],
    transform: transform::token_prices,
};

impl SinkSchema {
    pub fn for_job_type(job_type: JobType) -> &'static SinkSchema {
        match job_type {
            JobType::NftBids => &NFT_BIDS,
            JobType::NftPrices => &NFT_PRICES,
            JobType::TokenBorrowing => &TOKEN_BORROWING,
            JobType::TokenPrices => &TOKEN_PRICES,
        }
    }

    pub fn create_table_sql(&self, table: &TableName) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| {
                let null = if c.nullable { "" } else { " NOT NULL" };
                format!("    {} {}{}", c.name, c.sql_type, null)
            })
            .collect::<Vec<_>>()
            .join(",\n");

        format!(
            "CREATE TABLE IF NOT EXISTS {table} (\n    id BIGSERIAL PRIMARY KEY,\n{columns},\n    \
             created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),\n    \
             updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),\n    UNIQUE ({key})\n)",
            table = table.quoted(),
            columns = columns,
            key = self.natural_key.join(", "),
        )
    }

    /// `INSERT INTO <table> (<columns>) ` ready for `push_values`
    pub fn insert_prefix(&self, table: &TableName) -> String {
        let names: Vec<&str> = self.columns.iter().map(|c| c.name).collect();
        format!("INSERT INTO {} ({}) ", table.quoted(), names.join(", "))
    }

    pub fn on_conflict_clause(&self) -> String {
        let updates: Vec<String> = self
            .mutable
            .iter()
            .map(|c| format!("{c} = EXCLUDED.{c}"))
            .chain(std::iter::once("updated_at = NOW()".to_string()))
            .collect();
        format!(
            " ON CONFLICT ({}) DO UPDATE SET {}",
            self.natural_key.join(", "),
            updates.join(", ")
        )
    }

    pub fn transform(&self, payload: &Value, config: &JobConfig) -> Vec<SinkRecord> {
        (self.transform)(payload, config)
    }
}
