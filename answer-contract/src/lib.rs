//! The `kwanzaa.answer.v1` structured-answer contract: the typed model every
//! generated answer must satisfy before it reaches a client, and the
//! validator that enforces it. Validation is pure and synchronous; an
//! invalid candidate never leaves this boundary as anything but a
//! [`ContractValidationError`].

#![allow(clippy::missing_docs_in_private_items)]

pub mod error;
pub mod model;
pub mod validator;

pub use error::{ContractValidationError, ValidationErrorDetail, ValidationErrorKind};
pub use model::{
    AnswerBody, AnswerContract, Completeness, FallbackBehavior, Integrity, Persona, Provenance,
    RetrievalConfidence, RetrievalMode, RetrievalResult, RetrievalSummary, Source, Toggles, Tone,
    Unknowns, SUPPORTED_MAJOR_VERSION, VERSION_PREFIX,
};
pub use validator::{check, is_valid, validate, validate_batch, BatchValidation};
