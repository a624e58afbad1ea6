//! Asset Gateway Adapters
//!
//! Concrete [`stakepool_core::AssetGateway`] implementations:
//!
//! - [`InMemoryAssetLedger`]: balance/allowance accounting in memory, for
//!   tests, simulation, and local development.
//!
//! Production deployments implement the gateway trait against their real
//! asset transfer mechanism; the ledger core never depends on which one.

pub mod asset_ledger;

pub use asset_ledger::InMemoryAssetLedger;
