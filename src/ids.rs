//! Positional chunk identity.
//!
//! A chunk's id is `"{source}:{page}:{chunk_index}"`, assigned in a single
//! pass over the chunk sequence in splitter order. The index increments
//! while consecutive chunks share a `(source, page)` pair and resets to 0
//! when the pair changes. Identical corpus and split output produce
//! identical ids run over run, which is what ingestion dedup keys on.
//!
//! Ids are positions, not content. If a page's text changes it re-splits,
//! and the new chunks reuse ids already present in the store, so the changed
//! content is not re-ingested. Rebuilding (`paper clear`, then `paper
//! ingest`) is the supported way to pick up edited sources.

use crate::models::Chunk;

/// Format one chunk id, e.g. `"A.pdf:0:2"`.
pub fn chunk_id(source: &str, page: i64, chunk_index: i64) -> String {
    format!("{source}:{page}:{chunk_index}")
}

/// Assign `chunk_index` and `id` to every chunk, in sequence order.
pub fn assign_chunk_ids(chunks: &mut [Chunk]) {
    let mut last_page: Option<(String, i64)> = None;
    let mut index: i64 = 0;

    for chunk in chunks.iter_mut() {
        let same_page = last_page
            .as_ref()
            .is_some_and(|(source, page)| source == &chunk.source && *page == chunk.page);

        if same_page {
            index += 1;
        } else {
            index = 0;
            last_page = Some((chunk.source.clone(), chunk.page));
        }

        chunk.chunk_index = index;
        chunk.id = chunk_id(&chunk.source, chunk.page, index);
    }
}
