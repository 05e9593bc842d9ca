//! In-memory storage driver for tests and local development.
//!
//! One `BTreeMap` per partition keeps rows in ascending clustering-key order;
//! scans walk it in reverse. Conditional writes hold the table lock for their
//! full read-check-write, which models the engine's per-partition atomicity.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AppResult;

use super::{ClusteringKey, ColumnValue, Columns, Row, ScanRange, StorageDriver, Table};

type Partition = BTreeMap<ClusteringKey, Columns>;

#[derive(Default)]
pub struct MemoryStorage {
    tables: RwLock<HashMap<(Table, Uuid), Partition>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageDriver for MemoryStorage {
    async fn put(
        &self,
        table: Table,
        partition: Uuid,
        clustering: ClusteringKey,
        columns: Columns,
    ) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .entry((table, partition))
            .or_default()
            .entry(clustering)
            .or_default()
            .extend(columns);
        Ok(())
    }

    async fn put_if_absent(
        &self,
        table: Table,
        partition: Uuid,
        clustering: ClusteringKey,
        columns: Columns,
    ) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        let part = tables.entry((table, partition)).or_default();
        if part.contains_key(&clustering) {
            return Ok(false);
        }
        part.insert(clustering, columns);
        Ok(true)
    }

    async fn put_if_column_less(
        &self,
        table: Table,
        partition: Uuid,
        clustering: ClusteringKey,
        guard: &str,
        guard_value: ColumnValue,
        columns: Columns,
    ) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        let part = tables.entry((table, partition)).or_default();
        let row = part.entry(clustering).or_default();
        let newer = match row.get(guard) {
            None => true,
            Some(stored) => {
                stored.partial_cmp_same(&guard_value) == Some(std::cmp::Ordering::Less)
            }
        };
        if newer {
            row.extend(columns);
        }
        Ok(newer)
    }

    async fn get(
        &self,
        table: Table,
        partition: Uuid,
        clustering: &ClusteringKey,
    ) -> AppResult<Option<Row>> {
        let tables = self.tables.read().await;
        Ok(tables.get(&(table, partition)).and_then(|part| {
            part.get(clustering).map(|columns| Row {
                clustering: clustering.clone(),
                columns: columns.clone(),
            })
        }))
    }

    async fn scan(
        &self,
        table: Table,
        partition: Uuid,
        range: ScanRange,
        limit: usize,
    ) -> AppResult<Vec<Row>> {
        let tables = self.tables.read().await;
        let Some(part) = tables.get(&(table, partition)) else {
            return Ok(Vec::new());
        };
        let iter: Box<dyn DoubleEndedIterator<Item = (&ClusteringKey, &Columns)>> = match &range.below
        {
            Some(bound) => Box::new(part.range(..bound.clone())),
            None => Box::new(part.iter()),
        };
        Ok(iter
            .rev()
            .take(limit)
            .map(|(k, columns)| Row {
                clustering: k.clone(),
                columns: columns.clone(),
            })
            .collect())
    }
}
