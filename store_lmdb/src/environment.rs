//! LMDB environment setup.

use std::path::Path;

use heed::types::{Bytes, Str};
use heed::{Database, Env, EnvOpenOptions};

use crate::LmdbError;

/// The schema version the current code writes.
///
/// A fresh database is stamped with this version. Opening a database
/// stamped with a newer version fails: it was written by newer code and
/// this build does not know its key layouts.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

const SCHEMA_VERSION_KEY: &str = "schema_version";

/// Wraps the LMDB environment and all database handles.
///
/// Primary databases are keyed by the record's natural string key;
/// `*_index` databases hold composite binary keys that sort in the order
/// the list queries need.
pub struct LmdbEnvironment {
    env: Env,
    /// event_id -> EventRecord
    pub(crate) events_db: Database<Str, Bytes>,
    /// contract_id ++ 0x00 ++ event_id -> event_id
    pub(crate) contract_events_index: Database<Bytes, Bytes>,
    /// proposal_key -> Proposal
    pub(crate) proposals_db: Database<Str, Bytes>,
    /// contract_id ++ 0x00 ++ proposal_id BE -> proposal_key
    pub(crate) contract_proposals_index: Database<Bytes, Bytes>,
    /// tx_hash -> Vote
    pub(crate) votes_db: Database<Str, Bytes>,
    /// contract_id ++ 0x00 ++ proposal_id BE ++ ledger_seq BE ++ tx_hash -> tx_hash
    pub(crate) proposal_votes_index: Database<Bytes, Bytes>,
    /// source -> Checkpoint
    pub(crate) checkpoints_db: Database<Str, Bytes>,
    /// internal bookkeeping (schema version)
    meta_db: Database<Str, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)
            .map_err(|e| LmdbError::Heed(format!("create {}: {e}", path.display())))?;

        // SAFETY: the environment directory is only opened once per
        // process; the daemon owns the data dir exclusively.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(8)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let events_db = env.create_database(&mut wtxn, Some("events"))?;
        let contract_events_index =
            env.create_database(&mut wtxn, Some("contract_events_index"))?;
        let proposals_db = env.create_database(&mut wtxn, Some("proposals"))?;
        let contract_proposals_index =
            env.create_database(&mut wtxn, Some("contract_proposals_index"))?;
        let votes_db = env.create_database(&mut wtxn, Some("votes"))?;
        let proposal_votes_index =
            env.create_database(&mut wtxn, Some("proposal_votes_index"))?;
        let checkpoints_db = env.create_database(&mut wtxn, Some("checkpoints"))?;
        let meta_db: Database<Str, Bytes> = env.create_database(&mut wtxn, Some("meta"))?;

        // Schema version check. Version 0 (absent) means a fresh database.
        let stored = match meta_db.get(&wtxn, SCHEMA_VERSION_KEY)? {
            Some(bytes) => {
                let bytes: [u8; 4] = bytes.try_into().map_err(|_| {
                    LmdbError::Serialization("schema_version has invalid width".into())
                })?;
                u32::from_be_bytes(bytes)
            }
            None => 0,
        };
        if stored > CURRENT_SCHEMA_VERSION {
            return Err(LmdbError::SchemaTooNew {
                found: stored,
                supported: CURRENT_SCHEMA_VERSION,
            });
        }
        if stored < CURRENT_SCHEMA_VERSION {
            tracing::info!(
                from = stored,
                to = CURRENT_SCHEMA_VERSION,
                "stamping database schema version"
            );
            meta_db.put(
                &mut wtxn,
                SCHEMA_VERSION_KEY,
                &CURRENT_SCHEMA_VERSION.to_be_bytes(),
            )?;
        }

        wtxn.commit()?;

        Ok(Self {
            env,
            events_db,
            contract_events_index,
            proposals_db,
            contract_proposals_index,
            votes_db,
            proposal_votes_index,
            checkpoints_db,
            meta_db,
        })
    }

    pub(crate) fn env(&self) -> &Env {
        &self.env
    }

    /// The stored schema version.
    pub fn schema_version(&self) -> Result<u32, LmdbError> {
        let rtxn = self.env.read_txn()?;
        let bytes = self
            .meta_db
            .get(&rtxn, SCHEMA_VERSION_KEY)?
            .ok_or_else(|| LmdbError::Heed("schema_version missing".into()))?;
        let bytes: [u8; 4] = bytes
            .try_into()
            .map_err(|_| LmdbError::Serialization("schema_version has invalid width".into()))?;
        Ok(u32::from_be_bytes(bytes))
    }
}
