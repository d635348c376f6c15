use std::sync::Arc;

use common::{
    corpus::{chunk_metadata::ChunkMetadata, text_chunk::TextChunk},
    error::AppError,
};
use futures::StreamExt;
use state_machines::core::GuardError;
use tracing::{debug, instrument, warn};

use super::{
    context::ExpansionContext,
    report::{BatchError, BatchStage},
    state::{Annotated, Chunked, Expanded, ExpansionMachine, Ready},
};
use crate::{
    chunker::chunk_document,
    gateways::{EmbeddingGateway, VectorRecord, VectorStoreGateway},
};

#[instrument(
    level = "trace",
    skip_all,
    fields(run_id = %ctx.run_id, document_id = %ctx.manifest.document_id)
)]
pub fn chunk_stage(
    machine: ExpansionMachine<(), Ready>,
    ctx: &mut ExpansionContext<'_>,
    text: &str,
) -> Result<ExpansionMachine<(), Chunked>, AppError> {
    let chunks = chunk_document(text, &ctx.config.chunker)?;

    debug!(
        run_id = %ctx.run_id,
        document_id = %ctx.manifest.document_id,
        chunk_count = chunks.len(),
        "document chunked"
    );

    ctx.chunks = chunks;

    machine
        .chunk()
        .map_err(|(_, guard)| map_guard_error("chunk", &guard))
}

#[instrument(
    level = "trace",
    skip_all,
    fields(run_id = %ctx.run_id, document_id = %ctx.manifest.document_id)
)]
pub fn annotate_stage(
    machine: ExpansionMachine<(), Chunked>,
    ctx: &mut ExpansionContext<'_>,
) -> Result<ExpansionMachine<(), Annotated>, AppError> {
    let total_chunks = ctx.chunks.len();
    let mut annotated = Vec::with_capacity(total_chunks);
    for chunk in &ctx.chunks {
        let metadata = ChunkMetadata::from_manifest(chunk, ctx.manifest, total_chunks)?;
        annotated.push((chunk.clone(), metadata));
    }

    debug!(
        run_id = %ctx.run_id,
        document_id = %ctx.manifest.document_id,
        total_chunks,
        "chunk provenance attached"
    );

    ctx.annotated = annotated;

    machine
        .annotate()
        .map_err(|(_, guard)| map_guard_error("annotate", &guard))
}

#[instrument(
    level = "trace",
    skip_all,
    fields(run_id = %ctx.run_id, document_id = %ctx.manifest.document_id)
)]
pub async fn expand_stage(
    machine: ExpansionMachine<(), Annotated>,
    ctx: &mut ExpansionContext<'_>,
) -> Result<ExpansionMachine<(), Expanded>, AppError> {
    let batch_size = ctx.config.tuning.embed_batch_size.max(1);
    let concurrency = ctx.config.tuning.batch_concurrency.max(1);

    // Each chunk_index lands in exactly one batch, so nothing is
    // double-submitted within a run. Batch completion order is unordered;
    // chunk ordering travels in the stored metadata.
    let batches: Vec<Vec<(TextChunk, ChunkMetadata)>> = ctx
        .annotated
        .chunks(batch_size)
        .map(<[(TextChunk, ChunkMetadata)]>::to_vec)
        .collect();

    let namespace = ctx.namespace.to_owned();
    let embedder = Arc::clone(ctx.embedder);
    let store = Arc::clone(ctx.store);
    let jobs = batches.into_iter().enumerate().map(|(batch_index, batch)| {
        let embedder = Arc::clone(&embedder);
        let store = Arc::clone(&store);
        let namespace = namespace.clone();
        async move { process_batch(batch_index, batch, embedder, store, namespace).await }
    });

    let mut stream = futures::stream::iter(jobs).buffer_unordered(concurrency);
    while let Some(outcome) = stream.next().await {
        ctx.chunks_stored += outcome.stored;
        for error in &outcome.errors {
            warn!(
                run_id = %ctx.run_id,
                document_id = %ctx.manifest.document_id,
                batch_index = error.batch_index,
                stage = ?error.stage,
                message = %error.message,
                "expansion batch failed"
            );
        }
        ctx.errors.extend(outcome.errors);
    }

    machine
        .expand()
        .map_err(|(_, guard)| map_guard_error("expand", &guard))
}

struct BatchOutcome {
    stored: usize,
    errors: Vec<BatchError>,
}

async fn process_batch(
    batch_index: usize,
    batch: Vec<(TextChunk, ChunkMetadata)>,
    embedder: Arc<dyn EmbeddingGateway>,
    store: Arc<dyn VectorStoreGateway>,
    namespace: String,
) -> BatchOutcome {
    let texts: Vec<String> = batch.iter().map(|(chunk, _)| chunk.text.clone()).collect();

    let vectors = match embedder.embed(&texts).await {
        Ok(vectors) if vectors.len() == batch.len() => vectors,
        Ok(vectors) => {
            return BatchOutcome {
                stored: 0,
                errors: vec![BatchError {
                    batch_index,
                    stage: BatchStage::Embed,
                    message: format!(
                        "embedding arity mismatch: sent {}, received {}",
                        batch.len(),
                        vectors.len()
                    ),
                }],
            }
        }
        Err(err) => {
            return BatchOutcome {
                stored: 0,
                errors: vec![BatchError {
                    batch_index,
                    stage: BatchStage::Embed,
                    message: err.to_string(),
                }],
            }
        }
    };

    let mut stored = 0usize;
    let mut errors = Vec::new();
    for ((chunk, metadata), vector) in batch.into_iter().zip(vectors) {
        let record = VectorRecord {
            vector_id: metadata.vector_id(),
            vector,
            metadata,
            chunk_text: chunk.text,
            namespace: namespace.clone(),
        };
        match store.store(record).await {
            Ok(()) => stored += 1,
            Err(err) => errors.push(BatchError {
                batch_index,
                stage: BatchStage::Store,
                message: err.to_string(),
            }),
        }
    }

    BatchOutcome { stored, errors }
}

fn map_guard_error(event: &str, guard: &GuardError) -> AppError {
    AppError::InternalError(format!(
        "invalid expansion pipeline transition during {event}: {guard:?}"
    ))
}
