//! `items` table access
//!
//! Bulk saves run as a single `INSERT ... SELECT FROM UNNEST` inside one
//! transaction, so a batch is either stored completely or not at all.

use async_trait::async_trait;
use itemport_ingest::sink::{dedupe_last_wins, repeated_keys};
use itemport_ingest::{ConflictPolicy, Item, ItemDraft, PersistenceSink, SinkError};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::collections::HashSet;

const UPSERT_ITEMS: &str = r#"
    INSERT INTO items (id, item_name)
    SELECT * FROM UNNEST($1::BIGINT[], $2::TEXT[])
    ON CONFLICT (id) DO UPDATE SET item_name = EXCLUDED.item_name
    RETURNING id, item_name
"#;

const SELECT_STORED_IDS: &str = "SELECT id FROM items WHERE id = ANY($1)";

const INSERT_NEW_ITEMS: &str = r#"
    INSERT INTO items (id, item_name)
    SELECT * FROM UNNEST($1::BIGINT[], $2::TEXT[])
    ON CONFLICT (id) DO NOTHING
    RETURNING id, item_name
"#;

// Explicit ids bypass the identity sequence; move it past the largest stored id.
const SYNC_ID_SEQUENCE: &str = r#"
    SELECT setval(pg_get_serial_sequence('items', 'id'), m.max_id)
    FROM (SELECT MAX(id) AS max_id FROM items) m
    WHERE m.max_id IS NOT NULL AND m.max_id >= 1
"#;

#[derive(Debug, FromRow)]
struct ItemRow {
    id: i64,
    item_name: String,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Item::new(row.id, row.item_name)
    }
}

fn sink_error(err: sqlx::Error) -> SinkError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            SinkError::Unavailable(err.to_string())
        },
        other => SinkError::Backend(other.to_string()),
    }
}

/// PostgreSQL-backed item store
#[derive(Debug, Clone)]
pub struct PgItemSink {
    pool: PgPool,
    policy: ConflictPolicy,
}

impl PgItemSink {
    pub fn new(pool: PgPool, policy: ConflictPolicy) -> Self {
        Self { pool, policy }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn insert_batch(
        tx: &mut Transaction<'_, Postgres>,
        sql: &str,
        records: &[Item],
    ) -> Result<Vec<Item>, sqlx::Error> {
        let ids: Vec<i64> = records.iter().map(|item| item.id).collect();
        let names: Vec<&str> = records.iter().map(|item| item.item_name.as_str()).collect();

        let rows = sqlx::query_as::<_, ItemRow>(sql)
            .bind(&ids)
            .bind(&names)
            .fetch_all(&mut **tx)
            .await?;

        Ok(rows.into_iter().map(Item::from).collect())
    }
}

#[async_trait]
impl PersistenceSink for PgItemSink {
    type Record = Item;
    type Draft = ItemDraft;

    fn conflict_policy(&self) -> ConflictPolicy {
        self.policy
    }

    #[tracing::instrument(skip(self, records), fields(records = records.len(), policy = %self.policy))]
    async fn save_all(&self, records: Vec<Item>) -> Result<Vec<Item>, SinkError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let batch = match self.policy {
            ConflictPolicy::Replace => dedupe_last_wins(records),
            ConflictPolicy::Reject => {
                let mut repeated = repeated_keys(&records);
                if !repeated.is_empty() {
                    let ids: Vec<i64> = records.iter().map(|item| item.id).collect();
                    let stored = sqlx::query_scalar::<_, i64>(SELECT_STORED_IDS)
                        .bind(&ids)
                        .fetch_all(&self.pool)
                        .await
                        .map_err(sink_error)?;
                    repeated.extend(stored);
                    return Err(SinkError::DuplicateKeys {
                        keys: repeated.into_iter().collect(),
                    });
                }
                records
            },
        };

        let mut tx = self.pool.begin().await.map_err(sink_error)?;

        let saved = match self.policy {
            ConflictPolicy::Replace => Self::insert_batch(&mut tx, UPSERT_ITEMS, &batch)
                .await
                .map_err(sink_error)?,
            ConflictPolicy::Reject => {
                let inserted = Self::insert_batch(&mut tx, INSERT_NEW_ITEMS, &batch)
                    .await
                    .map_err(sink_error)?;

                if inserted.len() != batch.len() {
                    let stored: HashSet<i64> = inserted.iter().map(|item| item.id).collect();
                    let mut keys: Vec<i64> = batch
                        .iter()
                        .map(|item| item.id)
                        .filter(|id| !stored.contains(id))
                        .collect();
                    keys.sort_unstable();

                    tx.rollback().await.map_err(sink_error)?;
                    tracing::warn!(colliding = keys.len(), "Batch rejected on existing keys");
                    return Err(SinkError::DuplicateKeys { keys });
                }
                inserted
            },
        };

        sqlx::query(SYNC_ID_SEQUENCE)
            .execute(&mut *tx)
            .await
            .map_err(sink_error)?;

        tx.commit().await.map_err(sink_error)?;

        tracing::debug!(saved = saved.len(), "Batch committed");
        Ok(saved)
    }

    async fn find_all(&self) -> Result<Vec<Item>, SinkError> {
        let rows = sqlx::query_as::<_, ItemRow>("SELECT id, item_name FROM items ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(sink_error)?;

        Ok(rows.into_iter().map(Item::from).collect())
    }

    async fn save(&self, draft: ItemDraft) -> Result<Item, SinkError> {
        let row = sqlx::query_as::<_, ItemRow>(
            "INSERT INTO items (item_name) VALUES ($1) RETURNING id, item_name",
        )
        .bind(&draft.item_name)
        .fetch_one(&self.pool)
        .await
        .map_err(sink_error)?;

        Ok(row.into())
    }
}
