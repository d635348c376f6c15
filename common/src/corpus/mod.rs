pub mod chunk_metadata;
pub mod manifest;
pub mod text_chunk;
