use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Prefix every contract version string carries, e.g. `kwanzaa.answer.v1`.
pub const VERSION_PREFIX: &str = "kwanzaa.answer.v";

/// The only major version this build of the validator accepts. Unrecognized
/// majors are rejected outright rather than best-effort parsed.
pub const SUPPORTED_MAJOR_VERSION: u64 = 1;

/// The canonical structured answer. Instances exist only as the output of a
/// successful validation; nothing mutates one afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerContract {
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persona: Option<Persona>,
    pub toggles: Toggles,
    pub answer: AnswerBody,
    pub sources: Vec<Source>,
    pub retrieval_summary: RetrievalSummary,
    pub unknowns: Unknowns,
    pub integrity: Integrity,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    Educator,
    Researcher,
    Creator,
    Builder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toggles {
    pub require_citations: bool,
    pub primary_sources_only: bool,
    pub creative_mode: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerBody {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tone: Option<Tone>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completeness: Option<Completeness>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Informative,
    Conversational,
    Scholarly,
    Celebratory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Completeness {
    Complete,
    Partial,
    InsufficientData,
}

/// One citation. `chunk_id` must trace back to a retrieved chunk in
/// `RetrievalSummary::results`; the validator enforces that link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub citation_label: String,
    pub canonical_url: String,
    pub source_org: String,
    pub year: i64,
    pub content_type: String,
    pub license: String,
    pub namespace: String,
    pub doc_id: String,
    pub chunk_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalSummary {
    pub query: String,
    pub top_k: u64,
    pub namespaces: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<Value>,
    pub mode: RetrievalMode,
    pub results: Vec<RetrievalResult>,
}

/// Distinguishes "retrieval ran and found nothing" from "retrieval never
/// ran" instead of inferring either from an empty results list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalMode {
    Performed,
    NoMatches,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub chunk_id: String,
    pub rank: u64,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

/// What the answer admits it does not know. Always present, even when every
/// list is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unknowns {
    pub unsupported_claims: Vec<String>,
    pub missing_context: Vec<String>,
    pub clarifying_questions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_of_scope: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Integrity {
    pub citation_required: bool,
    pub citations_provided: bool,
    pub retrieval_confidence: RetrievalConfidence,
    pub fallback_behavior: FallbackBehavior,
    pub safety_flags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalConfidence {
    High,
    Medium,
    Low,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackBehavior {
    NotNeeded,
    CreativeGeneration,
    Refusal,
    ClarificationRequested,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub generated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retrieval_run_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assistant_message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adapter_version: Option<String>,
}
