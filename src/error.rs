// src/error.rs
use thiserror::Error;

/// Errors surfaced by the search and alignment engine.
///
/// None of these are recovered locally - they always propagate to the
/// caller, matching the abort-on-failure semantics of the engine this
/// crate is modeled on (translated here into ordinary `Result`s instead
/// of a hard process abort, since Rust has no analogue to `error()`
/// longjmp-ing out of a C call).
#[derive(Debug, Error)]
pub enum TriplexError {
    #[error("unsupported byte 0x{byte:02x} at offset {pos} in input sequence")]
    BadInput { byte: u8, pos: usize },

    #[error("invalid parameters: {0}")]
    BadParameters(String),

    #[error("out of memory while allocating {0}")]
    OutOfMemory(&'static str),
}

pub type Result<T> = std::result::Result<T, TriplexError>;
