//! LMDB storage backend for the gavel indexer.
//!
//! Implements the storage traits from `gavel-store` using the `heed`
//! LMDB bindings. Records are bincode-serialized; list queries are
//! served from secondary-index databases whose composite keys sort in
//! the query's required order, so a range scan is the whole query plan.

pub mod environment;
pub mod error;
pub mod store;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use store::LmdbStore;
