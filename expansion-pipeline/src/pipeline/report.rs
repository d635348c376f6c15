use serde::Serialize;

/// Reason recorded when `skip_if_exists` short-circuits a run.
pub const SKIP_REASON_DOCUMENT_EXISTS: &str = "document_already_exists";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionStatus {
    Success,
    Partial,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStage {
    Embed,
    Store,
}

/// One failed batch. Transient service failures land here instead of
/// aborting the run; the caller may re-run the document (idempotently).
#[derive(Debug, Clone, Serialize)]
pub struct BatchError {
    pub batch_index: usize,
    pub stage: BatchStage,
    pub message: String,
}

/// Outcome summary for a single document expansion run.
#[derive(Debug, Clone, Serialize)]
pub struct ExpansionReport {
    pub status: ExpansionStatus,
    pub run_id: String,
    pub document_id: String,
    pub namespace: String,
    pub chunks_created: usize,
    pub chunks_stored: usize,
    pub skip_reason: Option<String>,
    pub errors: Vec<BatchError>,
}
