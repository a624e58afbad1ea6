//! Pool configuration.
//!
//! A [`PoolConfig`] captures everything fixed at deployment time: the reward
//! allotment ceiling, the staked asset, and the operator / funder / custody
//! identities. It can be assembled programmatically through the builder or
//! loaded from environment variables (prefixed with `STAKEPOOL_`).

use serde::{Deserialize, Serialize};

use crate::bounds::RuntimeBounds;
use crate::types::{AccountId, Amount, AssetId};
use crate::{LedgerError, Result};

/// Deployment-time parameters of a staking pool.
///
/// All fields are immutable for the life of the ledger. `operator` authorizes
/// pause/resume only; `funder` is the account rewards are pulled from (its
/// gateway allowance is granted out-of-band); `custody` is the pool's own
/// account on the asset ledger, where principal sits between stake and
/// withdrawal.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PoolConfig {
    pub reward_allotment: Amount,
    pub asset: AssetId,
    pub operator: AccountId,
    pub funder: AccountId,
    pub custody: AccountId,
    pub bounds: RuntimeBounds,
}

impl PoolConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PoolConfigBuilder {
        PoolConfigBuilder::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Looks for:
    /// - `STAKEPOOL_REWARD_ALLOTMENT` - reward ceiling in smallest asset units
    /// - `STAKEPOOL_ASSET` - asset id, 64 hex characters
    /// - `STAKEPOOL_OPERATOR` - operator account, 64 hex characters
    /// - `STAKEPOOL_FUNDER` - reward funder account, 64 hex characters
    /// - `STAKEPOOL_CUSTODY` - custody account, 64 hex characters
    /// - `STAKEPOOL_MAX_PARTICIPANTS` - participant-map safety bound (optional)
    pub fn from_env() -> Result<Self> {
        let var = |name: &str| -> Result<String> {
            std::env::var(name)
                .map_err(|_| LedgerError::ConfigError(format!("missing env var {name}")))
        };

        let reward_allotment = var("STAKEPOOL_REWARD_ALLOTMENT")?
            .parse::<u64>()
            .map(Amount::new)
            .map_err(|e| {
                LedgerError::ConfigError(format!("invalid STAKEPOOL_REWARD_ALLOTMENT: {e}"))
            })?;
        let asset = AssetId::from_hex(&var("STAKEPOOL_ASSET")?)?;
        let operator = AccountId::from_hex(&var("STAKEPOOL_OPERATOR")?)?;
        let funder = AccountId::from_hex(&var("STAKEPOOL_FUNDER")?)?;
        let custody = AccountId::from_hex(&var("STAKEPOOL_CUSTODY")?)?;

        let mut bounds = RuntimeBounds::default();
        if let Ok(max) = std::env::var("STAKEPOOL_MAX_PARTICIPANTS") {
            bounds.max_participants = max.parse().map_err(|e| {
                LedgerError::ConfigError(format!("invalid STAKEPOOL_MAX_PARTICIPANTS: {e}"))
            })?;
        }

        let config = PoolConfig {
            reward_allotment,
            asset,
            operator,
            funder,
            custody,
            bounds,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        self.bounds.validate()?;
        if self.custody == self.funder {
            return Err(LedgerError::ConfigError(
                "custody and funder must be distinct accounts".into(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`PoolConfig`].
#[derive(Default)]
pub struct PoolConfigBuilder {
    reward_allotment: Amount,
    asset: Option<AssetId>,
    operator: Option<AccountId>,
    funder: Option<AccountId>,
    custody: Option<AccountId>,
    bounds: Option<RuntimeBounds>,
}

impl PoolConfigBuilder {
    pub fn reward_allotment(mut self, amount: Amount) -> Self {
        self.reward_allotment = amount;
        self
    }

    pub fn asset(mut self, asset: AssetId) -> Self {
        self.asset = Some(asset);
        self
    }

    pub fn operator(mut self, operator: AccountId) -> Self {
        self.operator = Some(operator);
        self
    }

    pub fn funder(mut self, funder: AccountId) -> Self {
        self.funder = Some(funder);
        self
    }

    pub fn custody(mut self, custody: AccountId) -> Self {
        self.custody = Some(custody);
        self
    }

    pub fn max_participants(mut self, max: usize) -> Self {
        self.bounds = Some(RuntimeBounds { max_participants: max });
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<PoolConfig> {
        let require = |name: &str| LedgerError::ConfigError(format!("{name} is required"));
        let config = PoolConfig {
            reward_allotment: self.reward_allotment,
            asset: self.asset.ok_or_else(|| require("asset"))?,
            operator: self.operator.ok_or_else(|| require("operator"))?,
            funder: self.funder.ok_or_else(|| require("funder"))?,
            custody: self.custody.ok_or_else(|| require("custody"))?,
            bounds: self.bounds.unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }
}
