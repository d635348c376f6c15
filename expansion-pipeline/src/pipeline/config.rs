use crate::chunker::ChunkerConfig;

#[derive(Debug, Clone)]
pub struct ExpansionTuning {
    pub embed_batch_size: usize,
    pub batch_concurrency: usize,
}

impl Default for ExpansionTuning {
    fn default() -> Self {
        Self {
            embed_batch_size: 32,
            batch_concurrency: 4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExpansionConfig {
    pub tuning: ExpansionTuning,
    pub chunker: ChunkerConfig,
    pub skip_if_exists: bool,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            tuning: ExpansionTuning::default(),
            chunker: ChunkerConfig::default(),
            skip_if_exists: true,
        }
    }
}
