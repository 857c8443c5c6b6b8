//! Contract event values.

use gavel_types::Address;
use serde::{Deserialize, Serialize};

/// A value carried in a contract event topic or data payload.
///
/// This mirrors the host value model of the contract runtime, restricted
/// to the variants that appear in event envelopes. The `as_*` accessors
/// return `None` on a variant mismatch so decoders can express "this
/// field must be a symbol" as a single `?`-free check.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Val {
    Bool(bool),
    U32(u32),
    I128(i128),
    /// A short symbolic identifier (event names, map keys).
    Sym(String),
    Str(String),
    Bytes(Vec<u8>),
    Address(Address),
    Vec(Vec<Val>),
    /// An ordered list of key/value entries.
    Map(Vec<(Val, Val)>),
}

impl Val {
    pub fn as_sym(&self) -> Option<&str> {
        match self {
            Val::Sym(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Val::U32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Val::I128(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Val::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<&Address> {
        match self {
            Val::Address(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_vec(&self) -> Option<&[Val]> {
        match self {
            Val::Vec(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(Val, Val)]> {
        match self {
            Val::Map(m) => Some(m),
            _ => None,
        }
    }
}
