//! Internal error types
//!
//! Extraction never surfaces errors to the caller; `extract_graph` collapses
//! any internal fault into an empty graph at the public boundary. The error
//! type exists so the passes can propagate faults with `?` instead of
//! panicking mid-scan.

use thiserror::Error;

/// Internal extraction fault
#[derive(Debug, Error)]
pub enum ExtractError {
    /// A computed cursor landed outside the text or off a character boundary
    #[error("offset {offset} is not a valid position in input of length {len}")]
    InvalidOffset { offset: usize, len: usize },
}

impl ExtractError {
    pub(crate) fn invalid_offset(offset: usize, len: usize) -> Self {
        Self::InvalidOffset { offset, len }
    }
}
