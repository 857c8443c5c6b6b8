//! Fundamental types for the gavel governance indexer.
//!
//! This crate defines the types shared across every other crate in the
//! workspace: strkey-encoded chain addresses, the order-preserving event
//! identifier scheme, and arbitrary-precision vote tallies.

pub mod address;
pub mod event_id;
pub mod strkey;
pub mod tally;

pub use address::Address;
pub use event_id::{encode_event_id, operation_order};
pub use strkey::{StrkeyError, VersionByte};
pub use tally::{Tally, TallyError};
