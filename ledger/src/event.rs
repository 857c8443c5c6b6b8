//! Contract event envelopes.

use serde::{Deserialize, Serialize};

use crate::value::Val;

/// The class of an event emitted during transaction execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractEventKind {
    /// Emitted by the host system itself.
    System,
    /// Emitted by a deployed contract.
    Contract,
    /// Diagnostic-only output, not part of consensus state.
    Diagnostic,
}

/// Versioned event body. Only V0 is understood today; a backend that
/// delivers a newer encoding surfaces it as `Unsupported` and decoders
/// reject it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ContractEventBody {
    V0(ContractEventV0),
    Unsupported { version: u32 },
}

/// The V0 event body: ordered topics for routing plus one data payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContractEventV0 {
    pub topics: Vec<Val>,
    pub data: Val,
}

/// One event as recorded in a transaction's result meta.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContractEvent {
    pub kind: ContractEventKind,
    /// The emitting contract's raw id. Absent for system events.
    pub contract: Option<[u8; 32]>,
    pub body: ContractEventBody,
}

impl ContractEvent {
    /// The body, if it uses the V0 encoding.
    pub fn body_v0(&self) -> Option<&ContractEventV0> {
        match &self.body {
            ContractEventBody::V0(body) => Some(body),
            ContractEventBody::Unsupported { .. } => None,
        }
    }
}
