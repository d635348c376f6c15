#![allow(clippy::missing_docs_in_private_items)]

pub mod corpus;
pub mod error;
pub mod session;
pub mod utils;
