use crate::ledger::PoolState;
use crate::LedgerError;

/// Stable identifiers for ledger invariants (used for testing and audits).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvariantId {
    /// `total_staked` disagreed with the sum of all stake records.
    Conservation,

    /// `reward_disbursed` exceeded `reward_allotment`.
    RewardCeiling,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvariantViolation {
    pub id: InvariantId,
    pub details: String,
}

impl InvariantViolation {
    pub fn new(id: InvariantId, details: impl Into<String>) -> Self {
        Self {
            id,
            details: details.into(),
        }
    }
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.id, self.details)
    }
}

impl std::error::Error for InvariantViolation {}

impl From<InvariantViolation> for LedgerError {
    fn from(v: InvariantViolation) -> Self {
        LedgerError::InvariantViolated(v.to_string())
    }
}

/// Audits a pool snapshot against the two ledger invariants.
///
/// The sum is widened to u128 so the auditor itself cannot overflow even on
/// states a buggy commit path might have produced.
pub fn check(state: &PoolState) -> Result<(), InvariantViolation> {
    let mut sum: u128 = 0;
    for (_, record) in state.stake_records() {
        sum += record.staked_amount.get() as u128;
    }
    if sum != state.total_staked().get() as u128 {
        return Err(InvariantViolation::new(
            InvariantId::Conservation,
            format!(
                "total_staked={} but stake records sum to {}",
                state.total_staked(),
                sum
            ),
        ));
    }
    if state.reward_disbursed() > state.reward_allotment() {
        return Err(InvariantViolation::new(
            InvariantId::RewardCeiling,
            format!(
                "reward_disbursed={} exceeds reward_allotment={}",
                state.reward_disbursed(),
                state.reward_allotment()
            ),
        ));
    }
    Ok(())
}
