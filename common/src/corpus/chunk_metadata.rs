use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    corpus::{manifest::DocumentManifest, text_chunk::TextChunk},
    error::AppError,
};

/// Bounded prefix of chunk text kept on the metadata record for debugging.
pub const CHUNK_PREVIEW_CHARS: usize = 120;

/// Full provenance attached to a single stored chunk.
///
/// Created once at ingestion time and never mutated afterwards; re-ingestion
/// produces a fresh record rather than patching in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkMetadata {
    pub source_id: String,
    pub document_id: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub source_org: String,
    pub canonical_url: String,
    pub license_info: String,
    pub year: i32,
    pub content_type: String,
    pub tags: BTreeSet<String>,
    pub priority: u8,
    pub ingested_at: DateTime<Utc>,
    pub chunk_text_preview: String,
}

impl ChunkMetadata {
    /// Copies manifest provenance onto a chunk. Storage-free; the only
    /// failure modes are a blank identity field or an index outside
    /// `total_chunks`.
    pub fn from_manifest(
        chunk: &TextChunk,
        manifest: &DocumentManifest,
        total_chunks: usize,
    ) -> Result<Self, AppError> {
        manifest.validate_identity()?;

        if chunk.chunk_index >= total_chunks {
            return Err(AppError::InternalError(format!(
                "chunk_index {} out of range for total_chunks {}",
                chunk.chunk_index, total_chunks
            )));
        }

        let chunk_text_preview: String = chunk.text.chars().take(CHUNK_PREVIEW_CHARS).collect();

        Ok(Self {
            source_id: manifest.source_id.clone(),
            document_id: manifest.document_id.clone(),
            chunk_index: chunk.chunk_index,
            total_chunks,
            source_org: manifest.source_org.clone(),
            canonical_url: manifest.canonical_url.clone(),
            license_info: manifest.license_info.clone(),
            year: manifest.year,
            content_type: manifest.content_type.clone(),
            tags: manifest.tags.clone(),
            priority: manifest.priority,
            ingested_at: Utc::now(),
            chunk_text_preview,
        })
    }

    /// Bit-exact storage key: `"{document_id}_chunk_{chunk_index}"`.
    pub fn vector_id(&self) -> String {
        format!("{}_chunk_{}", self.document_id, self.chunk_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> DocumentManifest {
        DocumentManifest {
            source_id: "speeches".into(),
            document_id: "doc-9".into(),
            license_info: "unknown".into(),
            source_org: "Community Archive".into(),
            canonical_url: "https://example.org/speeches/9".into(),
            year: 1970,
            content_type: "speech".into(),
            tags: BTreeSet::new(),
            priority: 1,
        }
    }

    #[test]
    fn builds_metadata_with_provenance_and_preview() {
        let chunk = TextChunk::new("The seven principles guide the week.".into(), 0, 36, 2);
        let metadata =
            ChunkMetadata::from_manifest(&chunk, &manifest(), 5).expect("metadata builds");

        assert_eq!(metadata.document_id, "doc-9");
        assert_eq!(metadata.chunk_index, 2);
        assert_eq!(metadata.total_chunks, 5);
        assert_eq!(metadata.license_info, "unknown");
        assert_eq!(metadata.chunk_text_preview, chunk.text);
        assert_eq!(metadata.vector_id(), "doc-9_chunk_2");
    }

    #[test]
    fn preview_is_bounded() {
        let long_text = "word ".repeat(200);
        let chunk = TextChunk::new(long_text, 0, 1000, 0);
        let metadata =
            ChunkMetadata::from_manifest(&chunk, &manifest(), 1).expect("metadata builds");
        assert_eq!(metadata.chunk_text_preview.chars().count(), CHUNK_PREVIEW_CHARS);
    }

    #[test]
    fn index_outside_total_is_rejected() {
        let chunk = TextChunk::new("tail".into(), 0, 4, 3);
        let err = ChunkMetadata::from_manifest(&chunk, &manifest(), 3)
            .expect_err("index must stay below total");
        assert!(matches!(err, AppError::InternalError(_)));
    }

    #[test]
    fn blank_identity_field_is_rejected() {
        let mut bad = manifest();
        bad.source_id = String::new();
        let chunk = TextChunk::new("body".into(), 0, 4, 0);
        let err = ChunkMetadata::from_manifest(&chunk, &bad, 1).expect_err("blank source_id");
        assert!(matches!(err, AppError::MissingRequiredField(_)));
    }
}
