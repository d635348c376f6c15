use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A contiguous segment of a normalized source document; the atomic unit of
/// retrieval.
///
/// Offsets are byte positions into the normalized document text, with
/// `start_char < end_char <= document length`. A chunk is immutable once
/// produced: re-ingestion replaces the document's chunks wholesale rather
/// than patching individual records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextChunk {
    pub text: String,
    pub start_char: usize,
    pub end_char: usize,
    pub chunk_index: usize,
    pub content_hash: String,
}

impl TextChunk {
    pub fn new(text: String, start_char: usize, end_char: usize, chunk_index: usize) -> Self {
        let content_hash = content_hash(&text);
        Self {
            text,
            start_char,
            end_char,
            chunk_index,
            content_hash,
        }
    }

    /// Whitespace-token count of the chunk body.
    pub fn token_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// Hex-encoded SHA-256 of chunk text; the deduplication and idempotency key.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_deterministic() {
        let a = content_hash("Habari gani? The principle of the day is umoja.");
        let b = content_hash("Habari gani? The principle of the day is umoja.");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64, "hex-encoded SHA-256 digest");
    }

    #[test]
    fn content_hash_distinguishes_text() {
        assert_ne!(content_hash("umoja"), content_hash("kujichagulia"));
    }

    #[test]
    fn chunk_constructor_hashes_its_text() {
        let chunk = TextChunk::new("Unity was the first principle.".into(), 0, 30, 0);
        assert_eq!(chunk.content_hash, content_hash(&chunk.text));
        assert_eq!(chunk.token_count(), 5);
    }
}
