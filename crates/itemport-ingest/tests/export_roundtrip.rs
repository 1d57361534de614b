//! Exported CSV imports back into the same stored collection

#![allow(clippy::unwrap_used, clippy::expect_used)]

use proptest::prelude::*;
use std::sync::Arc;

use itemport_ingest::export::to_csv_bytes;
use itemport_ingest::{ConflictPolicy, ImportPipeline, Item, ItemDraft, MemoryItemSink, PersistenceSink, Upload};

fn item_names() -> impl Strategy<Value = String> {
    "[ \t]{0,2}[A-Za-z0-9,;\"' ]{0,16}[ \t]{0,2}"
}

proptest! {
    #[test]
    fn export_then_import_restores_items(
        entries in prop::collection::btree_map(any::<i64>(), item_names(), 0..32)
    ) {
        let items: Vec<Item> = entries
            .into_iter()
            .map(|(id, name)| ItemDraft::new(name).with_id(id))
            .collect();
        let bytes = to_csv_bytes(&items).unwrap();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let (imported, stored) = runtime.block_on(async {
            let sink = Arc::new(MemoryItemSink::new(ConflictPolicy::Reject));
            let pipeline = ImportPipeline::for_record(Arc::clone(&sink));
            let upload = Upload::new(bytes.as_slice()).media_type("text/csv");
            let report = pipeline.import(upload).await.unwrap();
            (report.imported_count(), sink.find_all().await.unwrap())
        });

        prop_assert_eq!(imported, items.len());
        prop_assert_eq!(stored, items);
    }
}
