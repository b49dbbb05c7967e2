//! Semantic splitter: page documents to chunks.
//!
//! Pages are segmented into sentences with a rule-based scan (a sentence
//! ends at `.`, `!` or `?` followed by whitespace, or at a blank line). All
//! sentences of a page are embedded in one provider call, and a new chunk
//! starts wherever the cosine distance between adjacent sentence embeddings
//! exceeds the configured breakpoint threshold.
//!
//! Chunks never cross a page boundary, and a page's chunks concatenate back
//! to the page text modulo whitespace. Chunk ids are not assigned here; see
//! [`crate::ids`].

use crate::config::SplitterConfig;
use crate::embedding::{cosine_similarity, EmbeddingProvider};
use crate::error::Result;
use crate::models::{Chunk, Document};

/// Split every document at semantic boundaries, in input order.
///
/// Empty or whitespace-only pages yield no chunks. Single-sentence pages
/// yield one chunk without calling the provider; there is no adjacent pair
/// to measure.
pub async fn split_documents(
    provider: &dyn EmbeddingProvider,
    config: &SplitterConfig,
    documents: &[Document],
) -> Result<Vec<Chunk>> {
    let mut chunks = Vec::new();
    for document in documents {
        chunks.extend(split_page(provider, config.breakpoint_threshold, document).await?);
    }
    Ok(chunks)
}

async fn split_page(
    provider: &dyn EmbeddingProvider,
    threshold: f32,
    document: &Document,
) -> Result<Vec<Chunk>> {
    let sentences = segment_sentences(&document.content);

    if sentences.is_empty() {
        return Ok(Vec::new());
    }
    if sentences.len() == 1 {
        let mut sentences = sentences;
        return Ok(vec![raw_chunk(document, sentences.remove(0))]);
    }

    let embeddings = provider.embed(&sentences).await?;

    let mut chunks = Vec::new();
    let mut buf = sentences[0].clone();
    for i in 1..sentences.len() {
        let distance = 1.0 - cosine_similarity(&embeddings[i - 1], &embeddings[i]);
        if distance > threshold {
            chunks.push(raw_chunk(document, std::mem::take(&mut buf)));
            buf = sentences[i].clone();
        } else {
            buf.push(' ');
            buf.push_str(&sentences[i]);
        }
    }
    chunks.push(raw_chunk(document, buf));

    tracing::debug!(
        source = %document.source,
        page = document.page,
        sentences = sentences.len(),
        chunks = chunks.len(),
        "split page"
    );

    Ok(chunks)
}

fn raw_chunk(document: &Document, content: String) -> Chunk {
    Chunk {
        content,
        source: document.source.clone(),
        page: document.page,
        chunk_index: 0,
        id: String::new(),
    }
}

/// Segment text into trimmed sentences.
///
/// The scan covers the whole input: every non-whitespace character lands in
/// exactly one sentence, so joining the sentences reproduces the text modulo
/// whitespace. A terminator followed by a non-space (`3.14`, `v0.3.0`) does
/// not end a sentence.
fn segment_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            let next_is_space = chars.peek().map_or(true, |(_, n)| n.is_whitespace());
            if next_is_space {
                let end = i + c.len_utf8();
                push_trimmed(&mut sentences, &text[start..end]);
                start = end;
            }
        } else if c == '\n' && matches!(chars.peek(), Some((_, '\n'))) {
            push_trimmed(&mut sentences, &text[start..i]);
            start = i;
        }
    }
    push_trimmed(&mut sentences, &text[start..]);

    sentences
}

fn push_trimmed(sentences: &mut Vec<String>, raw: &str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
}
