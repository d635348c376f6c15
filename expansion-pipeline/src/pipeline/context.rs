use std::sync::Arc;

use common::{
    corpus::{chunk_metadata::ChunkMetadata, manifest::DocumentManifest, text_chunk::TextChunk},
    error::AppError,
};
use tracing::error;

use super::{
    config::ExpansionConfig,
    report::{BatchError, ExpansionReport, ExpansionStatus},
};
use crate::gateways::{EmbeddingGateway, VectorStoreGateway};

pub struct ExpansionContext<'a> {
    pub run_id: String,
    pub manifest: &'a DocumentManifest,
    pub namespace: &'a str,
    pub config: &'a ExpansionConfig,
    pub embedder: &'a Arc<dyn EmbeddingGateway>,
    pub store: &'a Arc<dyn VectorStoreGateway>,
    pub chunks: Vec<TextChunk>,
    pub annotated: Vec<(TextChunk, ChunkMetadata)>,
    pub chunks_stored: usize,
    pub errors: Vec<BatchError>,
}

impl<'a> ExpansionContext<'a> {
    pub fn new(
        run_id: String,
        manifest: &'a DocumentManifest,
        namespace: &'a str,
        config: &'a ExpansionConfig,
        embedder: &'a Arc<dyn EmbeddingGateway>,
        store: &'a Arc<dyn VectorStoreGateway>,
    ) -> Self {
        Self {
            run_id,
            manifest,
            namespace,
            config,
            embedder,
            store,
            chunks: Vec::new(),
            annotated: Vec::new(),
            chunks_stored: 0,
            errors: Vec::new(),
        }
    }

    pub fn abort(&mut self, err: AppError) -> AppError {
        error!(
            run_id = %self.run_id,
            document_id = %self.manifest.document_id,
            error = %err,
            "expansion pipeline aborted"
        );
        err
    }

    /// Classifies the finished run. Partial batch failures never abort the
    /// pipeline; the run is `Failed` only when nothing was stored at all.
    pub fn into_report(self) -> ExpansionReport {
        let chunks_created = self.chunks.len();
        let status = if self.errors.is_empty() && self.chunks_stored == chunks_created {
            ExpansionStatus::Success
        } else if self.chunks_stored > 0 {
            ExpansionStatus::Partial
        } else {
            ExpansionStatus::Failed
        };

        ExpansionReport {
            status,
            run_id: self.run_id,
            document_id: self.manifest.document_id.clone(),
            namespace: self.namespace.to_owned(),
            chunks_created,
            chunks_stored: self.chunks_stored,
            skip_reason: None,
            errors: self.errors,
        }
    }
}
