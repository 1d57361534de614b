//! Persistence sink interface
//!
//! The pipeline only ever needs three operations from a store: bulk save,
//! list everything, and create one record from a draft. Implementations
//! decide what a primary-key collision means through [`ConflictPolicy`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::time::Duration;
use thiserror::Error;

use crate::record::Record;

/// How a sink treats a record whose primary key is already stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Overwrite the stored record (upsert); re-imports are idempotent
    #[default]
    Replace,
    /// Refuse the whole batch and report every colliding key
    Reject,
}

impl std::str::FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "replace" | "upsert" => Ok(ConflictPolicy::Replace),
            "reject" => Ok(ConflictPolicy::Reject),
            other => Err(format!("unknown conflict policy '{}' (expected replace or reject)", other)),
        }
    }
}

impl std::fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictPolicy::Replace => f.write_str("replace"),
            ConflictPolicy::Reject => f.write_str("reject"),
        }
    }
}

/// Failures reported by a persistence sink
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    #[error("Duplicate primary key(s): {}", format_keys(.keys))]
    DuplicateKeys { keys: Vec<i64> },

    #[error("Store did not respond within {0:?}")]
    Timeout(Duration),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store error: {0}")]
    Backend(String),
}

fn format_keys(keys: &[i64]) -> String {
    keys.iter().map(i64::to_string).collect::<Vec<_>>().join(", ")
}

/// Keep the last record for every key, in the order of those last occurrences
pub fn dedupe_last_wins<R: Record>(records: Vec<R>) -> Vec<R> {
    let mut last: HashMap<i64, usize> = HashMap::with_capacity(records.len());
    for (position, record) in records.iter().enumerate() {
        last.insert(record.key(), position);
    }

    records
        .into_iter()
        .enumerate()
        .filter(|(position, record)| last.get(&record.key()) == Some(position))
        .map(|(_, record)| record)
        .collect()
}

/// Keys that occur more than once within `records`
pub fn repeated_keys<R: Record>(records: &[R]) -> BTreeSet<i64> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .iter()
        .map(Record::key)
        .filter(|key| !seen.insert(*key))
        .collect()
}

/// Durable store for one record kind
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    type Record: Send + Sync;
    type Draft: Send;

    /// What this store does with keys it already holds
    fn conflict_policy(&self) -> ConflictPolicy;

    /// Persist a batch atomically, returning the stored records
    ///
    /// When the batch holds the same key more than once under
    /// [`ConflictPolicy::Replace`], the last occurrence wins and only it is
    /// returned.
    async fn save_all(&self, records: Vec<Self::Record>) -> Result<Vec<Self::Record>, SinkError>;

    async fn find_all(&self) -> Result<Vec<Self::Record>, SinkError>;

    /// Store a new record, assigning its primary key
    async fn save(&self, draft: Self::Draft) -> Result<Self::Record, SinkError>;
}
