//! Event decoding errors.

use thiserror::Error;

/// Why a contract event could not be decoded into a governor event.
///
/// The two variants matter operationally: most contract events on a
/// shared chain are not governance events at all, so `Format` is
/// expected, frequent, and never logged as a failure. `Parsing` means
/// the event matched a recognized governance kind but a field did not
/// have its expected shape — a protocol mismatch worth loud logging.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("event format is not valid: {0}")]
    Format(String),

    #[error("governor event parsing failed: {0}")]
    Parsing(String),
}

impl DecodeError {
    /// Whether this is the quiet not-a-governance-event case.
    pub fn is_format(&self) -> bool {
        matches!(self, DecodeError::Format(_))
    }
}
