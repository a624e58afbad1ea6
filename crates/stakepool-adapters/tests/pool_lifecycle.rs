//! Full pool lifecycle against the in-memory asset ledger: mint, approve,
//! stake, pause, withdraw, with balance-level assertions on every leg.

use stakepool_adapters::InMemoryAssetLedger;
use stakepool_core::{
    AccountId, Amount, AssetGateway, AssetId, LedgerError, NoReward, PoolConfig, ProRataRemaining,
    RewardStrategy, StakingLedger,
};

fn acct(b: u8) -> AccountId {
    AccountId([b; 32])
}

const OPERATOR: u8 = 0xA0;
const FUNDER: u8 = 0xB0;
const CUSTODY: u8 = 0xC0;

fn pool_config(allotment: u64) -> PoolConfig {
    PoolConfig::builder()
        .reward_allotment(Amount::new(allotment))
        .asset(AssetId([1; 32]))
        .operator(acct(OPERATOR))
        .funder(acct(FUNDER))
        .custody(acct(CUSTODY))
        .build()
        .expect("valid pool config")
}

/// Deploy fixture: funded participants with custody allowances, a funded and
/// approved reward funder, and a fresh ledger over the in-memory asset books.
fn deploy<S: RewardStrategy>(
    allotment: u64,
    participants: &[(u8, u64)],
    strategy: S,
) -> StakingLedger<InMemoryAssetLedger, S> {
    let custody = acct(CUSTODY);
    let asset = InMemoryAssetLedger::new(custody);
    for &(who, supply) in participants {
        asset.mint(acct(who), Amount::new(supply)).unwrap();
        asset.approve(acct(who), custody, Amount::new(supply));
    }
    asset.mint(acct(FUNDER), Amount::new(allotment)).unwrap();
    asset.approve(acct(FUNDER), custody, Amount::new(allotment));

    StakingLedger::new(pool_config(allotment), asset, strategy).expect("ledger should deploy")
}

fn total_supply(asset: &InMemoryAssetLedger, accounts: &[u8]) -> u64 {
    accounts
        .iter()
        .map(|&b| asset.balance_of(acct(b)).get())
        .sum()
}

#[test]
fn repeated_stakes_accumulate_and_withdraw_in_full() {
    // Scenario A: three unit stakes, then a single withdrawal of principal 3.
    let ledger = deploy(100, &[(1, 10)], ProRataRemaining);
    let p1 = acct(1);

    for _ in 0..3 {
        ledger.stake(p1, Amount::new(1)).unwrap();
    }
    assert_eq!(ledger.stake_of(p1), Amount::new(3));
    assert_eq!(ledger.total_staked(), Amount::new(3));
    assert_eq!(ledger.gateway().balance_of(acct(CUSTODY)), Amount::new(3));

    let receipt = ledger.withdraw(p1).unwrap();
    assert_eq!(receipt.principal, Amount::new(3));
    assert_eq!(ledger.stake_of(p1), Amount::ZERO);
    assert_eq!(ledger.total_staked(), Amount::ZERO);
    ledger.audit().unwrap();
}

#[test]
fn pause_blocks_deposits_but_withdrawals_still_pay() {
    // Scenario B: P2 staked 5 before the pause; P1's deposit is blocked but
    // P2 exits with full principal.
    let ledger = deploy(0, &[(1, 10), (2, 10)], NoReward);
    let p1 = acct(1);
    let p2 = acct(2);
    ledger.stake(p2, Amount::new(5)).unwrap();

    ledger.pause(acct(OPERATOR)).unwrap();
    assert!(ledger.is_paused());

    let err = ledger.stake(p1, Amount::new(1)).unwrap_err();
    assert!(matches!(err, LedgerError::StakingPaused));
    assert_eq!(ledger.gateway().balance_of(p1), Amount::new(10));

    let receipt = ledger.withdraw(p2).unwrap();
    assert_eq!(receipt.principal, Amount::new(5));
    assert_eq!(ledger.gateway().balance_of(p2), Amount::new(10));
}

#[test]
fn zero_allotment_returns_principal_with_no_reward() {
    // Scenario C: two participants, empty reward budget.
    let ledger = deploy(0, &[(1, 10), (2, 10)], ProRataRemaining);
    let p1 = acct(1);
    let p2 = acct(2);
    ledger.stake(p1, Amount::new(10)).unwrap();
    ledger.stake(p2, Amount::new(10)).unwrap();

    let r1 = ledger.withdraw(p1).unwrap();
    let r2 = ledger.withdraw(p2).unwrap();
    assert_eq!(r1.reward, Amount::ZERO);
    assert_eq!(r2.reward, Amount::ZERO);
    assert_eq!(r1.principal, Amount::new(10));
    assert_eq!(r2.principal, Amount::new(10));
    assert_eq!(ledger.reward_disbursed(), Amount::ZERO);
    assert_eq!(ledger.gateway().balance_of(p1), Amount::new(10));
    assert_eq!(ledger.gateway().balance_of(p2), Amount::new(10));
}

#[test]
fn pro_rata_rewards_split_and_exhaust_the_allotment() {
    let ledger = deploy(100, &[(1, 10), (2, 10)], ProRataRemaining);
    let p1 = acct(1);
    let p2 = acct(2);
    ledger.stake(p1, Amount::new(10)).unwrap();
    ledger.stake(p2, Amount::new(10)).unwrap();

    // Half the pool takes half the remaining allotment.
    let r1 = ledger.withdraw(p1).unwrap();
    assert_eq!(r1.reward, Amount::new(50));
    assert_eq!(ledger.reward_disbursed(), Amount::new(50));

    // The last staker drains what is left.
    let r2 = ledger.withdraw(p2).unwrap();
    assert_eq!(r2.reward, Amount::new(50));
    assert_eq!(ledger.reward_disbursed(), Amount::new(100));
    assert_eq!(ledger.remaining_allotment(), Amount::ZERO);

    let asset = ledger.gateway();
    assert_eq!(asset.balance_of(p1), Amount::new(60));
    assert_eq!(asset.balance_of(p2), Amount::new(60));
    assert_eq!(asset.balance_of(acct(FUNDER)), Amount::ZERO);
    assert_eq!(asset.balance_of(acct(CUSTODY)), Amount::ZERO);
    ledger.audit().unwrap();
}

#[test]
fn asset_units_are_conserved_across_the_lifecycle() {
    let ledger = deploy(100, &[(1, 10), (2, 10)], ProRataRemaining);
    let accounts = [1, 2, FUNDER, CUSTODY];
    let supply = total_supply(ledger.gateway(), &accounts);

    ledger.stake(acct(1), Amount::new(10)).unwrap();
    assert_eq!(total_supply(ledger.gateway(), &accounts), supply);

    ledger.stake(acct(2), Amount::new(4)).unwrap();
    ledger.withdraw(acct(1)).unwrap();
    assert_eq!(total_supply(ledger.gateway(), &accounts), supply);

    ledger.withdraw(acct(2)).unwrap();
    assert_eq!(total_supply(ledger.gateway(), &accounts), supply);
    ledger.audit().unwrap();
}

#[test]
fn stake_without_allowance_fails_and_changes_nothing() {
    let ledger = deploy(0, &[(1, 10)], NoReward);
    let p2 = acct(2); // never minted or approved

    let err = ledger.stake(p2, Amount::new(1)).unwrap_err();
    assert!(matches!(err, LedgerError::TransferFailed(_)));
    assert_eq!(ledger.total_staked(), Amount::ZERO);
    assert_eq!(ledger.participant_count(), 0);
    assert_eq!(ledger.gateway().balance_of(acct(CUSTODY)), Amount::ZERO);
}

#[test]
fn withdrawal_blocked_by_unapproved_funder_can_be_retried() {
    let custody = acct(CUSTODY);
    let asset = InMemoryAssetLedger::new(custody);
    asset.mint(acct(1), Amount::new(10)).unwrap();
    asset.approve(acct(1), custody, Amount::new(10));
    // Funder holds the reward budget but has not approved custody yet.
    asset.mint(acct(FUNDER), Amount::new(100)).unwrap();

    let ledger =
        StakingLedger::new(pool_config(100), asset, ProRataRemaining).expect("should deploy");
    let p1 = acct(1);
    ledger.stake(p1, Amount::new(10)).unwrap();

    let err = ledger.withdraw(p1).unwrap_err();
    assert!(matches!(err, LedgerError::TransferFailed(_)));
    assert_eq!(ledger.stake_of(p1), Amount::new(10));
    assert_eq!(ledger.reward_disbursed(), Amount::ZERO);

    // Out-of-band approval lands; the retry pays principal plus reward.
    ledger
        .gateway()
        .approve(acct(FUNDER), custody, Amount::new(100));
    let receipt = ledger.withdraw(p1).unwrap();
    assert_eq!(receipt.principal, Amount::new(10));
    assert_eq!(receipt.reward, Amount::new(100));
    assert_eq!(ledger.gateway().balance_of(p1), Amount::new(110));
    ledger.audit().unwrap();
}

#[test]
fn non_operator_cannot_flip_the_pause_flag() {
    let ledger = deploy(0, &[(1, 10)], NoReward);
    let err = ledger.pause(acct(1)).unwrap_err();
    assert!(matches!(err, LedgerError::Unauthorized { .. }));
    assert!(!ledger.is_paused());
}

#[test]
fn restaking_after_withdrawal_reuses_the_record() {
    let ledger = deploy(0, &[(1, 20)], NoReward);
    let p1 = acct(1);

    ledger.stake(p1, Amount::new(10)).unwrap();
    ledger.withdraw(p1).unwrap();
    assert_eq!(ledger.participant_count(), 1);

    ledger.stake(p1, Amount::new(7)).unwrap();
    assert_eq!(ledger.stake_of(p1), Amount::new(7));
    assert_eq!(ledger.total_staked(), Amount::new(7));
    ledger.audit().unwrap();
}
