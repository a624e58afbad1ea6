//! The staking ledger: deposit/withdraw state machine and pause authority.
//!
//! Every mutating call follows the same shape: validate and plan under the
//! state lock, perform the gateway transfer(s) with the lock released, then
//! re-lock and commit the precomputed plan. The per-call in-flight flag is
//! the single mutual-exclusion scope; a gateway that calls back into the
//! ledger mid-transfer is rejected with [`LedgerError::Reentrant`].

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::bounds::RuntimeBounds;
use crate::config::PoolConfig;
use crate::events::{EventSink, LedgerEvent, TracingSink};
use crate::math::{add_amount, sub_amount};
use crate::strategy::RewardStrategy;
use crate::types::{AccountId, Amount, AssetId};
use crate::{AssetGateway, LedgerError, PayoutReceipt, Result};

/// Per-participant stake record.
///
/// Created lazily on first stake; persists (as zero) after withdrawal so the
/// participant can re-stake without re-admission.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StakeRecord {
    pub staked_amount: Amount,
}

/// Pool-wide accounting state (pure; no IO).
///
/// Invariants maintained by every commit:
/// - `total_staked == sum(stakes[*].staked_amount)` (conservation)
/// - `reward_disbursed <= reward_allotment` (reward ceiling)
#[derive(Clone, Debug)]
pub struct PoolState {
    stakes: BTreeMap<AccountId, StakeRecord>,
    total_staked: Amount,
    reward_allotment: Amount,
    reward_disbursed: Amount,
    paused: bool,
    operator: AccountId,
    funder: AccountId,
    custody: AccountId,
    asset: AssetId,
}

/// Precomputed stake mutation; commit is infallible once planned.
#[derive(Clone, Copy, Debug)]
pub(crate) struct StakePlan {
    participant: AccountId,
    new_record: Amount,
    new_total_staked: Amount,
}

/// Precomputed withdrawal; `reward` is already clamped to the remaining
/// allotment and `payout_total = principal + reward`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct WithdrawalPlan {
    participant: AccountId,
    principal: Amount,
    reward: Amount,
    payout_total: Amount,
    new_total_staked: Amount,
    new_reward_disbursed: Amount,
}

impl PoolState {
    pub(crate) fn new(config: &PoolConfig) -> PoolState {
        PoolState {
            stakes: BTreeMap::new(),
            total_staked: Amount::ZERO,
            reward_allotment: config.reward_allotment,
            reward_disbursed: Amount::ZERO,
            paused: false,
            operator: config.operator,
            funder: config.funder,
            custody: config.custody,
            asset: config.asset,
        }
    }

    pub fn total_staked(&self) -> Amount {
        self.total_staked
    }

    pub fn reward_allotment(&self) -> Amount {
        self.reward_allotment
    }

    pub fn reward_disbursed(&self) -> Amount {
        self.reward_disbursed
    }

    /// Reward budget still payable before the ceiling is reached.
    pub fn remaining_allotment(&self) -> Amount {
        Amount::new(
            self.reward_allotment
                .get()
                .saturating_sub(self.reward_disbursed.get()),
        )
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn operator(&self) -> AccountId {
        self.operator
    }

    pub fn funder(&self) -> AccountId {
        self.funder
    }

    pub fn custody(&self) -> AccountId {
        self.custody
    }

    pub fn asset(&self) -> AssetId {
        self.asset
    }

    pub fn stake_of(&self, participant: AccountId) -> Amount {
        self.stakes
            .get(&participant)
            .map(|r| r.staked_amount)
            .unwrap_or(Amount::ZERO)
    }

    /// Number of stake records (including zeroed ones kept for re-staking).
    pub fn participant_count(&self) -> usize {
        self.stakes.len()
    }

    pub fn stake_records(&self) -> impl Iterator<Item = (&AccountId, &StakeRecord)> {
        self.stakes.iter()
    }

    /// Validates a deposit and precomputes the resulting balances.
    ///
    /// Preconditions checked here (fail-closed, no mutation):
    /// - pool is not paused
    /// - `amount > 0`
    /// - a brand-new participant stays within `bounds.max_participants`
    /// - neither the record nor `total_staked` overflows
    pub(crate) fn plan_stake(
        &self,
        participant: AccountId,
        amount: Amount,
        bounds: RuntimeBounds,
    ) -> Result<StakePlan> {
        if self.paused {
            return Err(LedgerError::StakingPaused);
        }
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount("stake amount must be > 0".into()));
        }
        // Safety bound: caps participant-map growth. Returning participants
        // (zeroed records) already hold an entry and are not counted again.
        if !self.stakes.contains_key(&participant) && self.stakes.len() >= bounds.max_participants
        {
            return Err(LedgerError::BoundsExceeded(
                "max participants exceeded".into(),
            ));
        }
        let current = self.stake_of(participant);
        let new_record = add_amount(current, amount)?;
        let new_total_staked = add_amount(self.total_staked, amount)?;
        Ok(StakePlan {
            participant,
            new_record,
            new_total_staked,
        })
    }

    pub(crate) fn commit_stake(&mut self, plan: &StakePlan) {
        self.stakes.insert(
            plan.participant,
            StakeRecord {
                staked_amount: plan.new_record,
            },
        );
        self.total_staked = plan.new_total_staked;
    }

    /// Validates a withdrawal and precomputes principal, reward and the
    /// post-commit balances.
    ///
    /// The strategy sees `total_staked` *before* the withdrawal; its output
    /// is clamped so `reward_disbursed + reward <= reward_allotment`
    /// regardless of strategy behavior. Principal is always returned in
    /// full, even once the allotment is exhausted.
    pub(crate) fn plan_withdrawal<S: RewardStrategy>(
        &self,
        participant: AccountId,
        strategy: &S,
    ) -> Result<WithdrawalPlan> {
        let principal = self.stake_of(participant);
        if principal.is_zero() {
            return Err(LedgerError::NothingStaked { participant });
        }
        let remaining = sub_amount(self.reward_allotment, self.reward_disbursed)?;
        let proposed = strategy.apportion(
            principal,
            self.total_staked,
            self.reward_allotment,
            self.reward_disbursed,
        )?;
        let reward = proposed.min(remaining);
        let payout_total = add_amount(principal, reward)?;
        let new_total_staked = sub_amount(self.total_staked, principal)?;
        let new_reward_disbursed = add_amount(self.reward_disbursed, reward)?;
        Ok(WithdrawalPlan {
            participant,
            principal,
            reward,
            payout_total,
            new_total_staked,
            new_reward_disbursed,
        })
    }

    pub(crate) fn commit_withdrawal(&mut self, plan: &WithdrawalPlan) {
        if let Some(record) = self.stakes.get_mut(&plan.participant) {
            record.staked_amount = Amount::ZERO;
        }
        self.total_staked = plan.new_total_staked;
        self.reward_disbursed = plan.new_reward_disbursed;
    }

    pub(crate) fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }
}

/// RAII scope for the per-call reentrancy flag.
///
/// Acquired at the top of every mutating operation and released on drop, so
/// the flag is cleared on both the success and the error path.
struct CallGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> CallGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<CallGuard<'a>> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Acquire)
            .map_err(|_| LedgerError::Reentrant)?;
        Ok(CallGuard { flag })
    }
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Custodial staking ledger.
///
/// Owns the pool state, an [`AssetGateway`] for moving the staked asset, and
/// a [`RewardStrategy`] deciding reward apportionment (clamped to the funded
/// allotment). Mutating operations are all-or-nothing: state commits happen
/// strictly after gateway confirmation, and any error leaves balances exactly
/// as before the call.
pub struct StakingLedger<G: AssetGateway, S: RewardStrategy> {
    gateway: G,
    strategy: S,
    bounds: RuntimeBounds,
    state: Mutex<PoolState>,
    in_flight: AtomicBool,
    sink: Box<dyn EventSink>,
}

impl<G: AssetGateway, S: RewardStrategy> StakingLedger<G, S> {
    /// Establishes the pool from a validated configuration.
    ///
    /// The funder's gateway allowance for the reward allotment is granted
    /// out-of-band (the deploy flow approves custody before staking opens).
    pub fn new(config: PoolConfig, gateway: G, strategy: S) -> Result<Self> {
        config.validate()?;
        Ok(StakingLedger {
            gateway,
            strategy,
            bounds: config.bounds,
            state: Mutex::new(PoolState::new(&config)),
            in_flight: AtomicBool::new(false),
            sink: Box::new(TracingSink),
        })
    }

    /// Replaces the event sink (default: [`TracingSink`]).
    pub fn with_event_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    // A poisoned lock cannot expose partial state: all mutations are
    // plan-then-commit and the commit itself never panics.
    fn state(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deposits `amount` from `participant` into the pool.
    ///
    /// Effect on success: the participant's record and `total_staked` both
    /// grow by `amount`; amounts accumulate across repeated calls. Exactly
    /// one outbound gateway transfer (`participant -> custody`) is made.
    pub fn stake(&self, participant: AccountId, amount: Amount) -> Result<()> {
        let _guard = CallGuard::acquire(&self.in_flight)?;
        let (plan, custody) = {
            let state = self.state();
            (
                state.plan_stake(participant, amount, self.bounds)?,
                state.custody(),
            )
        };
        // External call between validation and commit. The in-flight flag
        // blocks any nested mutation, so the plan is still valid afterwards.
        if let Err(err) = self.gateway.transfer_from(participant, custody, amount) {
            tracing::warn!(%participant, %amount, error = %err, "stake transfer rejected");
            return Err(LedgerError::TransferFailed(err));
        }
        let total_staked = {
            let mut state = self.state();
            state.commit_stake(&plan);
            state.total_staked()
        };
        tracing::debug!(%participant, %amount, %total_staked, "stake committed");
        self.sink.record(LedgerEvent::Staked {
            participant,
            amount,
            total_staked,
        });
        Ok(())
    }

    /// Pays out the participant's full principal plus their apportioned
    /// reward, and zeroes the stake record.
    ///
    /// Callable regardless of the pause flag. Two gateway transfers are
    /// made: `funder -> custody` for the reward (skipped when zero), then
    /// `custody -> participant` for `principal + reward`. If either fails
    /// the record and the reward accounting are untouched, so the
    /// participant can retry against unchanged state.
    pub fn withdraw(&self, participant: AccountId) -> Result<PayoutReceipt> {
        let _guard = CallGuard::acquire(&self.in_flight)?;
        let (plan, custody, funder) = {
            let state = self.state();
            (
                state.plan_withdrawal(participant, &self.strategy)?,
                state.custody(),
                state.funder(),
            )
        };
        if !plan.reward.is_zero() {
            if let Err(err) = self.gateway.transfer_from(funder, custody, plan.reward) {
                tracing::warn!(%participant, reward = %plan.reward, error = %err, "reward pull rejected");
                return Err(LedgerError::TransferFailed(err));
            }
        }
        if let Err(err) = self.gateway.transfer(participant, plan.payout_total) {
            tracing::warn!(%participant, payout = %plan.payout_total, error = %err, "payout transfer rejected");
            return Err(LedgerError::TransferFailed(err));
        }
        {
            let mut state = self.state();
            state.commit_withdrawal(&plan);
        }
        tracing::debug!(
            %participant,
            principal = %plan.principal,
            reward = %plan.reward,
            "withdrawal committed"
        );
        self.sink.record(LedgerEvent::Withdrawn {
            participant,
            principal: plan.principal,
            reward: plan.reward,
        });
        Ok(PayoutReceipt {
            principal: plan.principal,
            reward: plan.reward,
        })
    }

    /// Halts new deposits. Operator-only; never blocks withdrawals.
    pub fn pause(&self, caller: AccountId) -> Result<()> {
        self.set_pause(caller, true)
    }

    /// Re-opens deposits. Operator-only.
    pub fn resume(&self, caller: AccountId) -> Result<()> {
        self.set_pause(caller, false)
    }

    fn set_pause(&self, caller: AccountId, paused: bool) -> Result<()> {
        let _guard = CallGuard::acquire(&self.in_flight)?;
        {
            let mut state = self.state();
            // Capability check at the top of the admin operation.
            if caller != state.operator() {
                return Err(LedgerError::Unauthorized { caller });
            }
            // Redundant transitions are accepted; the flag write is plain.
            state.set_paused(paused);
        }
        tracing::info!(%caller, paused, "pause flag updated");
        self.sink.record(LedgerEvent::PauseSet { by: caller, paused });
        Ok(())
    }

    pub fn is_paused(&self) -> bool {
        self.state().paused()
    }

    pub fn stake_of(&self, participant: AccountId) -> Amount {
        self.state().stake_of(participant)
    }

    pub fn total_staked(&self) -> Amount {
        self.state().total_staked()
    }

    pub fn reward_allotment(&self) -> Amount {
        self.state().reward_allotment()
    }

    pub fn reward_disbursed(&self) -> Amount {
        self.state().reward_disbursed()
    }

    pub fn remaining_allotment(&self) -> Amount {
        self.state().remaining_allotment()
    }

    pub fn operator(&self) -> AccountId {
        self.state().operator()
    }

    pub fn funder(&self) -> AccountId {
        self.state().funder()
    }

    pub fn custody(&self) -> AccountId {
        self.state().custody()
    }

    pub fn asset(&self) -> AssetId {
        self.state().asset()
    }

    pub fn participant_count(&self) -> usize {
        self.state().participant_count()
    }

    /// Runs the invariant auditor over a snapshot of the current state.
    pub fn audit(&self) -> std::result::Result<(), crate::invariants::InvariantViolation> {
        crate::invariants::check(&self.state())
    }
}
