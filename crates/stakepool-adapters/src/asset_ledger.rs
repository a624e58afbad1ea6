//! In-memory asset ledger.
//!
//! Balance and allowance accounting with the usual fungible-token semantics:
//! holders `approve` a spender for an amount, and the spender moves funds
//! with `transfer_from` until the allowance is consumed. The pool's custody
//! account is the spender for every pull the staking ledger makes.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use stakepool_core::{AccountId, Amount, AssetGateway, TransferError};

#[derive(Debug, Default)]
struct Books {
    balances: HashMap<AccountId, u64>,
    /// (owner, spender) -> remaining allowance.
    allowances: HashMap<(AccountId, AccountId), u64>,
}

impl Books {
    fn balance(&self, account: AccountId) -> u64 {
        self.balances.get(&account).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: AccountId, spender: AccountId) -> u64 {
        self.allowances.get(&(owner, spender)).copied().unwrap_or(0)
    }

    /// Moves `amount` from `from` to `to`, all checks before any write.
    fn transfer(
        &mut self,
        from: AccountId,
        to: AccountId,
        amount: u64,
    ) -> Result<(), TransferError> {
        let from_balance = self.balance(from);
        if from_balance < amount {
            return Err(TransferError::InsufficientBalance);
        }
        if from == to {
            return Ok(());
        }
        let new_to_balance = self
            .balance(to)
            .checked_add(amount)
            .ok_or_else(|| TransferError::Rejected("balance overflow".into()))?;
        self.balances.insert(from, from_balance - amount);
        self.balances.insert(to, new_to_balance);
        Ok(())
    }
}

/// An asset ledger held entirely in memory.
///
/// The custody account is fixed at construction: it is both the destination
/// of [`AssetGateway::transfer_from`] pulls and the implicit source of
/// [`AssetGateway::transfer`] payouts, mirroring how the staking pool holds
/// principal between deposit and withdrawal.
#[derive(Debug)]
pub struct InMemoryAssetLedger {
    custody: AccountId,
    books: RwLock<Books>,
}

impl InMemoryAssetLedger {
    pub fn new(custody: AccountId) -> Self {
        Self {
            custody,
            books: RwLock::new(Books::default()),
        }
    }

    pub fn custody(&self) -> AccountId {
        self.custody
    }

    // Writers never panic while holding the lock; recover the data on poison.
    fn read(&self) -> RwLockReadGuard<'_, Books> {
        self.books.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Books> {
        self.books.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Credits freshly issued units to `to` (test/simulation supply).
    pub fn mint(&self, to: AccountId, amount: Amount) -> Result<(), TransferError> {
        let mut books = self.write();
        let new_balance = books
            .balance(to)
            .checked_add(amount.get())
            .ok_or_else(|| TransferError::Rejected("balance overflow".into()))?;
        books.balances.insert(to, new_balance);
        tracing::debug!(%to, %amount, "minted");
        Ok(())
    }

    /// Sets the allowance `spender` may pull from `owner` (overwrite, not add).
    pub fn approve(&self, owner: AccountId, spender: AccountId, amount: Amount) {
        let mut books = self.write();
        books.allowances.insert((owner, spender), amount.get());
        tracing::debug!(%owner, %spender, %amount, "allowance set");
    }

    pub fn allowance(&self, owner: AccountId, spender: AccountId) -> Amount {
        Amount::new(self.read().allowance(owner, spender))
    }
}

impl AssetGateway for InMemoryAssetLedger {
    fn transfer_from(
        &self,
        owner: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<(), TransferError> {
        let mut books = self.write();
        // Balance and allowance are both checked before any write so a
        // failed pull leaves the books untouched.
        if books.balance(owner) < amount.get() {
            return Err(TransferError::InsufficientBalance);
        }
        let allowance = books.allowance(owner, self.custody);
        if allowance < amount.get() {
            return Err(TransferError::InsufficientAllowance);
        }
        books.transfer(owner, to, amount.get())?;
        books
            .allowances
            .insert((owner, self.custody), allowance - amount.get());
        tracing::debug!(%owner, %to, %amount, "transfer_from executed");
        Ok(())
    }

    fn transfer(&self, to: AccountId, amount: Amount) -> Result<(), TransferError> {
        let mut books = self.write();
        books.transfer(self.custody, to, amount.get())?;
        tracing::debug!(%to, %amount, "custody payout executed");
        Ok(())
    }

    fn balance_of(&self, owner: AccountId) -> Amount {
        Amount::new(self.read().balance(owner))
    }
}
