use serde::{Deserialize, Serialize};

use crate::{LedgerError, Result};

pub const BPS_U16: u16 = 10_000;
pub const BPS_U64: u64 = 10_000;

/// Token quantity in the asset's smallest unit.
///
/// Amounts are plain unsigned integers; all arithmetic on them goes through
/// the checked helpers in [`crate::math`] (no silent wrap, no floats).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub fn new(v: u64) -> Amount {
        Amount(v)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque 32-byte account identity (participant, operator, funder, custody).
///
/// The ledger never interprets these bytes; they are whatever the asset
/// gateway uses to address accounts.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
    pub fn new(bytes: [u8; 32]) -> AccountId {
        AccountId(bytes)
    }

    /// Parses a 64-character hex string (configuration / environment input).
    pub fn from_hex(s: &str) -> Result<AccountId> {
        let bytes = hex::decode(s)
            .map_err(|e| LedgerError::ConfigError(format!("account id is not valid hex: {e}")))?;
        let arr: [u8; 32] = bytes.try_into().map_err(|_| {
            LedgerError::ConfigError("account id must be 32 bytes (64 hex characters)".into())
        })?;
        Ok(AccountId(arr))
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Identity of the staked asset, recorded at construction and exposed
/// read-only. The ledger moves this asset exclusively through the gateway.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct AssetId(pub [u8; 32]);

impl AssetId {
    pub fn new(bytes: [u8; 32]) -> AssetId {
        AssetId(bytes)
    }

    pub fn from_hex(s: &str) -> Result<AssetId> {
        let bytes = hex::decode(s)
            .map_err(|e| LedgerError::ConfigError(format!("asset id is not valid hex: {e}")))?;
        let arr: [u8; 32] = bytes.try_into().map_err(|_| {
            LedgerError::ConfigError("asset id must be 32 bytes (64 hex characters)".into())
        })?;
        Ok(AssetId(arr))
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Basis points in `[0, 10_000]` (correct-by-construction).
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Bps(u16);

impl Bps {
    pub const ZERO: Bps = Bps(0);
    pub const MAX: Bps = Bps(BPS_U16);

    /// Constructs a bounded bps value.
    ///
    /// Preconditions:
    /// - `v <= 10_000` (else returns an error; fail-closed).
    ///
    /// Postconditions:
    /// - `self.get()` is always in `[0, 10_000]` and can be used without re-checking.
    pub fn new(v: u16) -> Result<Bps> {
        if v <= BPS_U16 {
            Ok(Bps(v))
        } else {
            Err(LedgerError::ConfigError(format!(
                "bps out of range: {v} > {BPS_U16}"
            )))
        }
    }

    pub fn get(self) -> u16 {
        self.0
    }

    pub fn as_u64(self) -> u64 {
        self.0 as u64
    }
}

impl TryFrom<u16> for Bps {
    type Error = LedgerError;
    fn try_from(value: u16) -> std::result::Result<Self, Self::Error> {
        Bps::new(value)
    }
}
