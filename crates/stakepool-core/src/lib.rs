//! Custodial staking ledger.
//!
//! External participants deposit a fungible asset into a shared pool; the
//! ledger tracks each participant's principal and, on withdrawal, pays back
//! the principal in full plus a share of a separately funded reward
//! allotment. A privileged operator can halt new deposits without ever
//! blocking withdrawals.
//!
//! # Key Types
//!
//! - [`StakingLedger`]: the deposit/withdraw state machine
//! - [`AssetGateway`]: seam to the underlying asset transfer mechanism
//! - [`RewardStrategy`]: pluggable reward apportionment policy
//! - [`PoolConfig`]: deployment-time parameters
//!
//! # Atomicity
//!
//! Every call is all-or-nothing: the ledger validates, performs the gateway
//! transfer(s), and commits its records only after the gateway confirms. Any
//! error leaves balances exactly as before the call, and nested calls made
//! from inside a gateway transfer are rejected as reentrant.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod bounds;
pub mod config;
pub mod events;
pub mod invariants;
pub mod ledger;
pub mod math;
pub mod strategy;
pub mod types;

pub use bounds::RuntimeBounds;
pub use config::PoolConfig;
pub use events::{EventSink, LedgerEvent, MemorySink, TracingSink};
pub use ledger::{PoolState, StakeRecord, StakingLedger};
pub use strategy::{FixedRateBps, NoReward, ProRataRemaining, RewardStrategy};
pub use types::{AccountId, Amount, AssetId, Bps};

/// Failure reported by the asset gateway for a single transfer.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error("insufficient balance")]
    InsufficientBalance,

    #[error("insufficient allowance")]
    InsufficientAllowance,

    #[error("transfer rejected: {0}")]
    Rejected(String),
}

/// Unified error type for ledger operations.
///
/// Every error aborts the entire call with no partial state mutation; the
/// ledger offers no local recovery and surfaces all errors verbatim.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("transfer failed: {0}")]
    TransferFailed(#[from] TransferError),

    #[error("nothing staked for participant {participant}")]
    NothingStaked { participant: AccountId },

    #[error("caller {caller} is not the pool operator")]
    Unauthorized { caller: AccountId },

    #[error("reentrant call rejected: a ledger operation is already in flight")]
    Reentrant,

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("staking is paused")]
    StakingPaused,

    #[error("bounds exceeded: {0}")]
    BoundsExceeded(String),

    #[error("arithmetic overflow: {0}")]
    Overflow(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("invariant violated: {0}")]
    InvariantViolated(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Opaque interface for moving the staked/reward asset between the caller,
/// the pool's custody account, and the reward funder.
///
/// Implementations decide what an account id and the custody account mean;
/// the ledger only requires that a transfer either happens in full or fails
/// with a [`TransferError`].
pub trait AssetGateway {
    /// Pull `amount` from `owner` into `to` (custody), consuming allowance
    /// the owner granted out-of-band.
    fn transfer_from(
        &self,
        owner: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> std::result::Result<(), TransferError>;

    /// Pay `amount` out of custody to `to`.
    fn transfer(&self, to: AccountId, amount: Amount) -> std::result::Result<(), TransferError>;

    /// Read-only balance lookup (diagnostics and tests).
    fn balance_of(&self, owner: AccountId) -> Amount;
}

/// Result of a successful withdrawal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutReceipt {
    /// The participant's deposits, returned in full.
    pub principal: Amount,
    /// Apportioned reward, clamped to the remaining allotment (possibly zero).
    pub reward: Amount,
}
