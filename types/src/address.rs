//! Chain addresses as they appear inside contract events.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::strkey::{self, StrkeyError, VersionByte};

/// An on-chain address: either a user account or a deployed contract.
///
/// Both kinds carry a 32-byte key and render to a strkey string
/// (`G…` for accounts, `C…` for contracts).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Address {
    Account([u8; 32]),
    Contract([u8; 32]),
}

impl Address {
    /// Render the canonical strkey form.
    pub fn to_strkey(&self) -> String {
        match self {
            Address::Account(key) => strkey::encode(VersionByte::Account, key),
            Address::Contract(key) => strkey::encode(VersionByte::Contract, key),
        }
    }

    /// Parse a strkey string back into an address.
    pub fn from_strkey(input: &str) -> Result<Self, StrkeyError> {
        let (version, payload) = strkey::decode(input)?;
        Ok(match version {
            VersionByte::Account => Address::Account(payload),
            VersionByte::Contract => Address::Contract(payload),
        })
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_strkey())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_strkey() {
        let addr = Address::Contract([1u8; 32]);
        assert_eq!(addr.to_string(), addr.to_strkey());
    }

    #[test]
    fn strkey_roundtrip_preserves_kind() {
        let account = Address::Account([5u8; 32]);
        let parsed = Address::from_strkey(&account.to_strkey()).unwrap();
        assert_eq!(parsed, account);

        let contract = Address::Contract([5u8; 32]);
        let parsed = Address::from_strkey(&contract.to_strkey()).unwrap();
        assert_eq!(parsed, contract);
    }
}
