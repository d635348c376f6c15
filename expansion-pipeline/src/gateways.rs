use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use async_trait::async_trait;
use common::{
    corpus::chunk_metadata::ChunkMetadata, error::AppError, utils::embedding::EmbeddingProvider,
};

/// One stored triple: vector, chunk text, and full provenance.
#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub vector_id: String,
    pub vector: Vec<f32>,
    pub metadata: ChunkMetadata,
    pub chunk_text: String,
    pub namespace: String,
}

/// Embedding service boundary. One vector per input text, order preserved;
/// upstream failures surface as [`AppError::EmbeddingService`] and are
/// absorbed per batch by the orchestrator.
#[async_trait]
pub trait EmbeddingGateway: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AppError>;
}

/// Vector store boundary. Writes are keyed by vector id and idempotent:
/// the last write for a given id wins, so concurrent re-ingestion of the
/// same document cannot corrupt state.
#[async_trait]
pub trait VectorStoreGateway: Send + Sync {
    async fn exists(&self, document_id: &str) -> Result<bool, AppError>;
    async fn store(&self, record: VectorRecord) -> Result<(), AppError>;
}

/// Production embedder backed by the shared [`EmbeddingProvider`].
pub struct ProviderEmbeddingGateway {
    provider: EmbeddingProvider,
}

impl ProviderEmbeddingGateway {
    pub fn new(provider: EmbeddingProvider) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl EmbeddingGateway for ProviderEmbeddingGateway {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
        self.provider
            .embed_batch(texts.to_vec())
            .await
            .map_err(|err| AppError::EmbeddingService(err.to_string()))
    }
}

/// In-memory vector store for tests and offline corpus runs.
pub struct InMemoryVectorStore {
    records: RwLock<HashMap<String, VectorRecord>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn count_for_document(&self, document_id: &str) -> usize {
        self.read()
            .values()
            .filter(|record| record.metadata.document_id == document_id)
            .count()
    }

    pub fn get(&self, vector_id: &str) -> Option<VectorRecord> {
        self.read().get(vector_id).cloned()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, VectorRecord>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, VectorRecord>> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStoreGateway for InMemoryVectorStore {
    async fn exists(&self, document_id: &str) -> Result<bool, AppError> {
        Ok(self
            .read()
            .values()
            .any(|record| record.metadata.document_id == document_id))
    }

    async fn store(&self, record: VectorRecord) -> Result<(), AppError> {
        self.write().insert(record.vector_id.clone(), record);
        Ok(())
    }
}
