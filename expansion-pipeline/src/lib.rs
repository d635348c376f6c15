#![allow(clippy::missing_docs_in_private_items)]

pub mod chunker;
pub mod gateways;
pub mod pipeline;

pub use pipeline::{
    BatchError, BatchStage, ExpansionConfig, ExpansionPipeline, ExpansionReport, ExpansionStatus,
    ExpansionTuning,
};
