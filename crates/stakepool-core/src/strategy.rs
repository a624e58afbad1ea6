//! Reward apportionment strategies.
//!
//! The exact reward formula is a deployment policy, not a ledger invariant.
//! A strategy is a pure, deterministic function of the withdrawal inputs; the
//! ledger clamps whatever it returns to the remaining allotment, so the
//! ceiling invariant never depends on strategy correctness.

use crate::math::{floor_bps, mul_div_floor_u64, sub_amount};
use crate::types::{Amount, Bps};
use crate::Result;

/// Computes the reward owed to a withdrawing participant.
///
/// Preconditions:
/// - `principal <= total_staked` (pool conservation holds on entry).
/// - `reward_disbursed <= reward_allotment`.
///
/// Postconditions:
/// - Returned amount is deterministic for fixed inputs (no hidden clocks).
/// - Returned amount is monotone non-decreasing in `principal`.
///
/// The ledger additionally clamps the result so that
/// `reward_disbursed + reward <= reward_allotment`.
pub trait RewardStrategy {
    fn apportion(
        &self,
        principal: Amount,
        total_staked: Amount,
        reward_allotment: Amount,
        reward_disbursed: Amount,
    ) -> Result<Amount>;
}

/// Default policy: the withdrawing participant takes a share of the remaining
/// allotment proportional to their share of the pool,
/// `floor(remaining * principal / total_staked)`.
///
/// Each payout is at most the remaining allotment, so aggregate payouts can
/// never exceed the ceiling; a sole staker drains what is left.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProRataRemaining;

impl RewardStrategy for ProRataRemaining {
    fn apportion(
        &self,
        principal: Amount,
        total_staked: Amount,
        reward_allotment: Amount,
        reward_disbursed: Amount,
    ) -> Result<Amount> {
        if total_staked.is_zero() {
            // Conservation implies principal is zero too; nothing to share.
            return Ok(Amount::ZERO);
        }
        let remaining = sub_amount(reward_allotment, reward_disbursed)?;
        mul_div_floor_u64(remaining.get(), principal.get(), total_staked.get()).map(Amount::new)
    }
}

/// Flat-rate policy: `floor(principal * rate / 10_000)`, independent of pool
/// composition. Relies on the ledger clamp once the allotment runs low.
#[derive(Clone, Copy, Debug)]
pub struct FixedRateBps {
    rate: Bps,
}

impl FixedRateBps {
    pub fn new(rate: Bps) -> FixedRateBps {
        FixedRateBps { rate }
    }

    pub fn rate(&self) -> Bps {
        self.rate
    }
}

impl RewardStrategy for FixedRateBps {
    fn apportion(
        &self,
        principal: Amount,
        _total_staked: Amount,
        _reward_allotment: Amount,
        _reward_disbursed: Amount,
    ) -> Result<Amount> {
        floor_bps(principal, self.rate)
    }
}

/// Degenerate policy for pools deployed with no reward budget.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoReward;

impl RewardStrategy for NoReward {
    fn apportion(
        &self,
        _principal: Amount,
        _total_staked: Amount,
        _reward_allotment: Amount,
        _reward_disbursed: Amount,
    ) -> Result<Amount> {
        Ok(Amount::ZERO)
    }
}
