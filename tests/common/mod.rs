#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use messaging_store::config::Config;
use messaging_store::error::{AppError, AppResult};
use messaging_store::state::AppState;
use messaging_store::storage::{
    ClusteringKey, ColumnValue, Columns, MemoryStorage, Row, ScanRange, StorageDriver, Table,
};

pub fn uid(n: u128) -> Uuid {
    Uuid::from_u128(n)
}

pub fn test_state() -> AppState {
    AppState::new(Arc::new(MemoryStorage::new()), Arc::new(Config::test_defaults()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteOp {
    Put,
    PutIfAbsent,
    PutIfColumnLess,
}

/// Storage wrapper that fails the next N writes of a given kind with a
/// transient error, for exercising the per-step retry and fan-out policies.
pub struct FlakyStorage {
    inner: MemoryStorage,
    failures: Mutex<HashMap<(Table, WriteOp), u32>>,
}

impl FlakyStorage {
    pub fn new() -> Self {
        Self {
            inner: MemoryStorage::new(),
            failures: Mutex::new(HashMap::new()),
        }
    }

    pub fn fail_writes(&self, table: Table, op: WriteOp, times: u32) {
        self.failures.lock().unwrap().insert((table, op), times);
    }

    fn should_fail(&self, table: Table, op: WriteOp) -> bool {
        let mut failures = self.failures.lock().unwrap();
        match failures.get_mut(&(table, op)) {
            Some(0) | None => false,
            Some(n) => {
                *n -= 1;
                true
            }
        }
    }
}

#[async_trait]
impl StorageDriver for FlakyStorage {
    async fn put(
        &self,
        table: Table,
        partition: Uuid,
        clustering: ClusteringKey,
        columns: Columns,
    ) -> AppResult<()> {
        if self.should_fail(table, WriteOp::Put) {
            return Err(AppError::Storage("injected write failure".into()));
        }
        self.inner.put(table, partition, clustering, columns).await
    }

    async fn put_if_absent(
        &self,
        table: Table,
        partition: Uuid,
        clustering: ClusteringKey,
        columns: Columns,
    ) -> AppResult<bool> {
        if self.should_fail(table, WriteOp::PutIfAbsent) {
            return Err(AppError::Storage("injected write failure".into()));
        }
        self.inner
            .put_if_absent(table, partition, clustering, columns)
            .await
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
        if self.should_fail(table, WriteOp::PutIfColumnLess) {
            return Err(AppError::Storage("injected write failure".into()));
        }
        self.inner
            .put_if_column_less(table, partition, clustering, guard, guard_value, columns)
            .await
    }

    async fn get(
        &self,
        table: Table,
        partition: Uuid,
        clustering: &ClusteringKey,
    ) -> AppResult<Option<Row>> {
        self.inner.get(table, partition, clustering).await
    }

    async fn scan(
        &self,
        table: Table,
        partition: Uuid,
        range: ScanRange,
        limit: usize,
    ) -> AppResult<Vec<Row>> {
        self.inner.scan(table, partition, range, limit).await
    }
}

pub fn flaky_state() -> (AppState, Arc<FlakyStorage>) {
    let storage = Arc::new(FlakyStorage::new());
    let state = AppState::new(storage.clone(), Arc::new(Config::test_defaults()));
    (state, storage)
}
