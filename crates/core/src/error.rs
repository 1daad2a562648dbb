//! Top-level error type shared across crates

use thiserror::Error;

/// Errors surfaced across crate boundaries.
///
/// Each crate defines its own error enum; this type exists so callers that
/// compose catalog, llm and agent pieces can hold one error. Every failure
/// mode has a defined fallback value somewhere upstream; nothing here is
/// fatal to the process.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Agent error: {0}")]
    Agent(String),
}

pub type Result<T> = std::result::Result<T, Error>;
