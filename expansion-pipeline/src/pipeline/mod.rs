mod config;
mod context;
mod report;
mod stages;
mod state;

pub use config::{ExpansionConfig, ExpansionTuning};
pub use report::{
    BatchError, BatchStage, ExpansionReport, ExpansionStatus, SKIP_REASON_DOCUMENT_EXISTS,
};

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use common::{corpus::manifest::DocumentManifest, error::AppError};
use tracing::info;
use uuid::Uuid;

use self::{
    context::ExpansionContext,
    stages::{annotate_stage, chunk_stage, expand_stage},
    state::ready,
};
use crate::gateways::{EmbeddingGateway, VectorStoreGateway};

/// End-to-end ingestion of one document: chunk, attach provenance, embed in
/// batches, store. Transient per-batch failures are summarized in the
/// returned report; only input defects and a total loss of the gateways
/// raise.
pub struct ExpansionPipeline {
    config: ExpansionConfig,
    embedder: Arc<dyn EmbeddingGateway>,
    store: Arc<dyn VectorStoreGateway>,
}

impl ExpansionPipeline {
    pub fn new(
        config: ExpansionConfig,
        embedder: Arc<dyn EmbeddingGateway>,
        store: Arc<dyn VectorStoreGateway>,
    ) -> Self {
        Self {
            config,
            embedder,
            store,
        }
    }

    #[tracing::instrument(
        skip_all,
        fields(document_id = %manifest.document_id, namespace = %namespace)
    )]
    pub async fn expand_document(
        &self,
        text: &str,
        manifest: &DocumentManifest,
        namespace: &str,
    ) -> Result<ExpansionReport, AppError> {
        manifest.validate_identity()?;

        let run_id = Uuid::new_v4().to_string();

        // Idempotency gate: a re-run over an unchanged document is a no-op.
        if self.config.skip_if_exists && self.store.exists(&manifest.document_id).await? {
            info!(
                run_id = %run_id,
                document_id = %manifest.document_id,
                "document already expanded; skipping"
            );
            return Ok(ExpansionReport {
                status: ExpansionStatus::Skipped,
                run_id,
                document_id: manifest.document_id.clone(),
                namespace: namespace.to_owned(),
                chunks_created: 0,
                chunks_stored: 0,
                skip_reason: Some(SKIP_REASON_DOCUMENT_EXISTS.to_owned()),
                errors: Vec::new(),
            });
        }

        let mut ctx = ExpansionContext::new(
            run_id,
            manifest,
            namespace,
            &self.config,
            &self.embedder,
            &self.store,
        );

        let machine = ready();
        let pipeline_started = Instant::now();

        let stage_start = Instant::now();
        let machine = chunk_stage(machine, &mut ctx, text).map_err(|err| ctx.abort(err))?;
        let chunk_duration = stage_start.elapsed();

        let stage_start = Instant::now();
        let machine = annotate_stage(machine, &mut ctx).map_err(|err| ctx.abort(err))?;
        let annotate_duration = stage_start.elapsed();

        let stage_start = Instant::now();
        let _machine = expand_stage(machine, &mut ctx)
            .await
            .map_err(|err| ctx.abort(err))?;
        let expand_duration = stage_start.elapsed();

        let total_duration = pipeline_started.elapsed();
        info!(
            run_id = %ctx.run_id,
            document_id = %ctx.manifest.document_id,
            chunks_created = ctx.chunks.len(),
            chunks_stored = ctx.chunks_stored,
            batch_errors = ctx.errors.len(),
            total_ms = Self::duration_millis(total_duration),
            chunk_ms = Self::duration_millis(chunk_duration),
            annotate_ms = Self::duration_millis(annotate_duration),
            expand_ms = Self::duration_millis(expand_duration),
            "expansion pipeline finished"
        );

        Ok(ctx.into_report())
    }

    fn duration_millis(duration: Duration) -> u64 {
        u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
    }
}
