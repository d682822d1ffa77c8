//! In-memory tenant store for pipeline and connectivity tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::records::{dedupe_by_natural_key, SinkRecord};
use super::schema::SinkSchema;
use super::table::TableName;
use super::writer::{SinkConnector, SinkError, SinkSession, SinkTarget};

#[derive(Default)]
struct Store {
    opened: usize,
    closed: usize,
    tables: Vec<String>,
    rows: HashMap<(String, String, String), SinkRecord>,
}

/// Applies upserts to a map keyed by `(table, natural key)`, so repeated or
/// overlapping writes converge the way the real `ON CONFLICT` does.
#[derive(Clone, Default)]
pub struct MemoryConnector {
    store: Arc<Mutex<Store>>,
    refuse_connections: bool,
}

impl MemoryConnector {
    pub fn unreachable() -> Self {
        Self {
            refuse_connections: true,
            ..Default::default()
        }
    }

    pub fn opened(&self) -> usize {
        self.store.lock().map(|s| s.opened).unwrap_or_default()
    }

    pub fn closed(&self) -> usize {
        self.store.lock().map(|s| s.closed).unwrap_or_default()
    }

    pub fn tables(&self) -> Vec<String> {
        self.store.lock().map(|s| s.tables.clone()).unwrap_or_default()
    }

    pub fn row(&self, table: &str, key: (&str, &str)) -> Option<SinkRecord> {
        let store = self.store.lock().ok()?;
        store
            .rows
            .get(&(table.to_string(), key.0.to_string(), key.1.to_string()))
            .cloned()
    }

    pub fn row_count(&self) -> usize {
        self.store.lock().map(|s| s.rows.len()).unwrap_or_default()
    }
}

#[async_trait]
impl SinkConnector for MemoryConnector {
    async fn open(&self, target: &SinkTarget) -> Result<Box<dyn SinkSession>, SinkError> {
        if self.refuse_connections {
            return Err(SinkError::Connect {
                target: target.to_string(),
                source: sqlx::Error::PoolTimedOut,
            });
        }
        if let Ok(mut store) = self.store.lock() {
            store.opened += 1;
        }
        Ok(Box::new(MemorySession {
            store: self.store.clone(),
        }))
    }
}

struct MemorySession {
    store: Arc<Mutex<Store>>,
}

#[async_trait]
impl SinkSession for MemorySession {
    async fn ping(&mut self) -> Result<(), SinkError> {
        Ok(())
    }

    async fn ensure_table(
        &mut self,
        _schema: &'static SinkSchema,
        table: &TableName,
    ) -> Result<(), SinkError> {
        if let Ok(mut store) = self.store.lock() {
            let name = table.to_string();
            if !store.tables.contains(&name) {
                store.tables.push(name);
            }
        }
        Ok(())
    }

    async fn upsert(
        &mut self,
        schema: &'static SinkSchema,
        table: &TableName,
        records: Vec<SinkRecord>,
    ) -> Result<u64, SinkError> {
        if let Some(other) = records.iter().find(|r| r.job_type() != schema.job_type) {
            return Err(SinkError::RecordMismatch {
                expected: schema.job_type,
                found: other.job_type(),
            });
        }

        let records = dedupe_by_natural_key(records);
        let written = records.len() as u64;
        if let Ok(mut store) = self.store.lock() {
            for record in records {
                let (a, b) = record.natural_key();
                let key = (table.to_string(), a.to_string(), b.to_string());
                store.rows.insert(key, record);
            }
        }
        Ok(written)
    }

    async fn close(self: Box<Self>) {
        if let Ok(mut store) = self.store.lock() {
            store.closed += 1;
        }
    }
}
