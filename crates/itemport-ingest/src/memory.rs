//! In-process item store
//!
//! Backs the server when no database is configured and serves as the
//! reference sink in tests. Keys are kept ordered so `find_all` is stable.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::record::{Item, ItemDraft};
use crate::sink::{dedupe_last_wins, repeated_keys, ConflictPolicy, PersistenceSink, SinkError};

#[derive(Debug, Default)]
pub struct MemoryItemSink {
    policy: ConflictPolicy,
    items: Mutex<BTreeMap<i64, Item>>,
}

impl MemoryItemSink {
    pub fn new(policy: ConflictPolicy) -> Self {
        Self {
            policy,
            items: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn with_items(policy: ConflictPolicy, items: impl IntoIterator<Item = Item>) -> Self {
        Self {
            policy,
            items: Mutex::new(items.into_iter().map(|item| (item.id, item)).collect()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<i64, Item>>, SinkError> {
        self.items
            .lock()
            .map_err(|_| SinkError::Backend("item store lock poisoned".to_string()))
    }
}

/// Keys that occur in `records` more than once or are already in `stored`
fn colliding_keys(stored: &BTreeMap<i64, Item>, records: &[Item]) -> Vec<i64> {
    let mut colliding = repeated_keys(records);
    colliding.extend(records.iter().map(|item| item.id).filter(|id| stored.contains_key(id)));
    colliding.into_iter().collect()
}

#[async_trait]
impl PersistenceSink for MemoryItemSink {
    type Record = Item;
    type Draft = ItemDraft;

    fn conflict_policy(&self) -> ConflictPolicy {
        self.policy
    }

    async fn save_all(&self, records: Vec<Item>) -> Result<Vec<Item>, SinkError> {
        let mut items = self.lock()?;

        if self.policy == ConflictPolicy::Reject {
            let keys = colliding_keys(&items, &records);
            if !keys.is_empty() {
                return Err(SinkError::DuplicateKeys { keys });
            }
        }

        let saved = dedupe_last_wins(records);
        for item in &saved {
            items.insert(item.id, item.clone());
        }

        tracing::debug!(saved = saved.len(), total = items.len(), "Batch stored in memory");

        Ok(saved)
    }

    async fn find_all(&self) -> Result<Vec<Item>, SinkError> {
        Ok(self.lock()?.values().cloned().collect())
    }

    async fn save(&self, draft: ItemDraft) -> Result<Item, SinkError> {
        let mut items = self.lock()?;
        let next_id = match items.last_key_value() {
            Some((&max, _)) => max
                .checked_add(1)
                .ok_or_else(|| SinkError::Backend("item id space exhausted".to_string()))?
                .max(1),
            None => 1,
        };
        let item = draft.with_id(next_id);
        items.insert(item.id, item.clone());
        Ok(item)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replace_policy_upserts() {
        let sink = MemoryItemSink::with_items(ConflictPolicy::Replace, [Item::new(1, "Pen")]);

        let saved = sink
            .save_all(vec![Item::new(1, "Fountain pen"), Item::new(2, "Ink")])
            .await
            .unwrap();
        assert_eq!(saved.len(), 2);

        assert_eq!(
            sink.find_all().await.unwrap(),
            vec![Item::new(1, "Fountain pen"), Item::new(2, "Ink")]
        );
    }

    #[tokio::test]
    async fn test_replace_policy_last_duplicate_in_batch_wins() {
        let sink = MemoryItemSink::new(ConflictPolicy::Replace);
        let saved = sink
            .save_all(vec![Item::new(5, "first"), Item::new(6, "other"), Item::new(5, "second")])
            .await
            .unwrap();

        assert_eq!(saved, vec![Item::new(6, "other"), Item::new(5, "second")]);
        assert_eq!(sink.find_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_reject_policy_reports_all_collisions_and_writes_nothing() {
        let sink = MemoryItemSink::with_items(ConflictPolicy::Reject, [Item::new(1, "Pen")]);

        let err = sink
            .save_all(vec![
                Item::new(1, "Pen again"),
                Item::new(2, "Ink"),
                Item::new(3, "Ruler"),
                Item::new(3, "Ruler twice"),
            ])
            .await
            .unwrap_err();

        assert_eq!(err, SinkError::DuplicateKeys { keys: vec![1, 3] });
        assert_eq!(sink.find_all().await.unwrap(), vec![Item::new(1, "Pen")]);
    }

    #[tokio::test]
    async fn test_save_assigns_next_id() {
        let sink = MemoryItemSink::new(ConflictPolicy::Replace);
        assert_eq!(sink.save(ItemDraft::new("Pen")).await.unwrap().id, 1);

        sink.save_all(vec![Item::new(41, "Imported")]).await.unwrap();
        let created = sink.save(ItemDraft::new("Stapler")).await.unwrap();
        assert_eq!(created, Item::new(42, "Stapler"));
    }
}
