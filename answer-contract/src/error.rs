use std::fmt;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Classification of a single validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    MissingField,
    TypeMismatch,
    Range,
    Format,
    CitationIntegrity,
    Ordering,
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::MissingField => "missing_field",
            Self::TypeMismatch => "type_mismatch",
            Self::Range => "range",
            Self::Format => "format",
            Self::CitationIntegrity => "citation_integrity",
            Self::Ordering => "ordering",
        };
        f.write_str(label)
    }
}

/// One defect found in a candidate answer. `field` is the dotted path of the
/// offending value, `location` the path of its enclosing object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationErrorDetail {
    pub field: String,
    pub message: String,
    pub kind: ValidationErrorKind,
    pub location: String,
}

impl ValidationErrorDetail {
    pub fn new(
        field: impl Into<String>,
        message: impl Into<String>,
        kind: ValidationErrorKind,
    ) -> Self {
        let field = field.into();
        let location = field
            .rsplit_once('.')
            .map_or_else(|| "$".to_owned(), |(parent, _)| parent.to_owned());
        Self {
            field,
            message: message.into(),
            kind,
            location,
        }
    }
}

impl fmt::Display for ValidationErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.field, self.kind, self.message)
    }
}

/// Rejection of a candidate answer. Carries every defect found, in document
/// order, plus the raw input for debugging; never a single message or a bare
/// boolean.
#[derive(Debug, Clone, Error)]
#[error("answer contract rejected with {} error(s): {}", .details.len(), summary(.details))]
pub struct ContractValidationError {
    pub details: Vec<ValidationErrorDetail>,
    pub raw: Value,
}

impl ContractValidationError {
    pub fn new(details: Vec<ValidationErrorDetail>, raw: Value) -> Self {
        Self { details, raw }
    }

    pub fn fields(&self) -> Vec<&str> {
        self.details.iter().map(|d| d.field.as_str()).collect()
    }

    pub fn has_kind(&self, kind: ValidationErrorKind) -> bool {
        self.details.iter().any(|d| d.kind == kind)
    }
}

fn summary(details: &[ValidationErrorDetail]) -> String {
    details
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
