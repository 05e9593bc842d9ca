//! Wide-column storage boundary.
//!
//! The underlying engine provides atomic single-partition writes and ordered
//! range scans within a partition; everything cross-partition is the caller's
//! problem. All cross-writer coordination goes through the conditional write
//! primitives (`put_if_absent`, `put_if_column_less`), never in-process locks.

pub mod memory;

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub use memory::MemoryStorage;

/// The three logical tables from the data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Messages,
    Conversations,
    ConversationsByUser,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Text(String),
    Int(i64),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
}

impl ColumnValue {
    /// Ordering used by the write-if-newer guard. Values of different kinds
    /// do not compare.
    pub fn partial_cmp_same(&self, other: &ColumnValue) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (ColumnValue::Text(a), ColumnValue::Text(b)) => a.partial_cmp(b),
            (ColumnValue::Int(a), ColumnValue::Int(b)) => a.partial_cmp(b),
            (ColumnValue::Uuid(a), ColumnValue::Uuid(b)) => a.partial_cmp(b),
            (ColumnValue::Timestamp(a), ColumnValue::Timestamp(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

pub type Columns = BTreeMap<String, ColumnValue>;

/// Byte-comparable clustering key. Encoded so that ascending byte order is
/// ascending sort order; scans iterate in descending byte order, which gives
/// the most-recent-first layouts from the data model.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClusteringKey(Vec<u8>);

// Sign bit flipped so the byte order of the encoded i64 matches numeric order.
fn encode_millis(ts: DateTime<Utc>) -> [u8; 8] {
    ((ts.timestamp_millis() as u64) ^ (1 << 63)).to_be_bytes()
}

impl ClusteringKey {
    /// The empty key, for single-row-per-partition tables.
    pub fn root() -> Self {
        ClusteringKey(Vec::new())
    }

    /// (timestamp, id), both descending under a descending scan.
    /// Layout of the `messages` clustering key.
    pub fn recency(ts: DateTime<Utc>, id: Uuid) -> Self {
        let mut bytes = Vec::with_capacity(24);
        bytes.extend_from_slice(&encode_millis(ts));
        bytes.extend_from_slice(id.as_bytes());
        ClusteringKey(bytes)
    }

    /// (timestamp DESC, id ASC) under a descending scan; the id bytes are
    /// complemented so ties on timestamp come back in ascending id order.
    /// Layout of the `conversations_by_user` clustering key.
    pub fn recency_id_asc(ts: DateTime<Utc>, id: Uuid) -> Self {
        let mut bytes = Vec::with_capacity(24);
        bytes.extend_from_slice(&encode_millis(ts));
        bytes.extend(id.as_bytes().iter().map(|&b| !b));
        ClusteringKey(bytes)
    }
}

/// Clustering-key bounds for a scan. `below` is exclusive: a descending scan
/// returns rows strictly below it, which is exactly "resume after the cursor".
#[derive(Debug, Clone, Default)]
pub struct ScanRange {
    pub below: Option<ClusteringKey>,
}

impl ScanRange {
    pub fn all() -> Self {
        ScanRange { below: None }
    }

    pub fn below(key: ClusteringKey) -> Self {
        ScanRange { below: Some(key) }
    }
}

#[derive(Debug, Clone)]
pub struct Row {
    pub clustering: ClusteringKey,
    pub columns: Columns,
}

impl Row {
    fn column(&self, name: &str) -> AppResult<&ColumnValue> {
        self.columns
            .get(name)
            .ok_or_else(|| AppError::Storage(format!("missing column {name}")))
    }

    pub fn text(&self, name: &str) -> AppResult<String> {
        match self.column(name)? {
            ColumnValue::Text(s) => Ok(s.clone()),
            other => Err(AppError::Storage(format!("column {name} is not text: {other:?}"))),
        }
    }

    pub fn uuid(&self, name: &str) -> AppResult<Uuid> {
        match self.column(name)? {
            ColumnValue::Uuid(u) => Ok(*u),
            other => Err(AppError::Storage(format!("column {name} is not a uuid: {other:?}"))),
        }
    }

    pub fn timestamp(&self, name: &str) -> AppResult<DateTime<Utc>> {
        match self.column(name)? {
            ColumnValue::Timestamp(t) => Ok(*t),
            other => Err(AppError::Storage(format!(
                "column {name} is not a timestamp: {other:?}"
            ))),
        }
    }

    pub fn opt_text(&self, name: &str) -> Option<String> {
        match self.columns.get(name) {
            Some(ColumnValue::Text(s)) => Some(s.clone()),
            _ => None,
        }
    }

    pub fn opt_timestamp(&self, name: &str) -> Option<DateTime<Utc>> {
        match self.columns.get(name) {
            Some(ColumnValue::Timestamp(t)) => Some(*t),
            _ => None,
        }
    }
}

/// Driver for the partitioned store. Writes are atomic within a partition;
/// there is no multi-partition primitive of any kind.
#[async_trait]
pub trait StorageDriver: Send + Sync {
    /// Unconditional upsert; merges `columns` into the row.
    async fn put(
        &self,
        table: Table,
        partition: Uuid,
        clustering: ClusteringKey,
        columns: Columns,
    ) -> AppResult<()>;

    /// Create-if-absent. Returns `false` (leaving the row untouched) when a
    /// row already exists at this key.
    async fn put_if_absent(
        &self,
        table: Table,
        partition: Uuid,
        clustering: ClusteringKey,
        columns: Columns,
    ) -> AppResult<bool>;

    /// Write-if-newer. Merges `columns` only when the stored `guard` column is
    /// absent or strictly less than `guard_value`. Returns whether the write
    /// was applied.
    async fn put_if_column_less(
        &self,
        table: Table,
        partition: Uuid,
        clustering: ClusteringKey,
        guard: &str,
        guard_value: ColumnValue,
        columns: Columns,
    ) -> AppResult<bool>;

    async fn get(
        &self,
        table: Table,
        partition: Uuid,
        clustering: &ClusteringKey,
    ) -> AppResult<Option<Row>>;

    /// Rows of one partition in descending clustering order, bounded by
    /// `range` and capped at `limit`.
    async fn scan(
        &self,
        table: Table,
        partition: Uuid,
        range: ScanRange,
        limit: usize,
    ) -> AppResult<Vec<Row>>;
}
