//! Payment-rail cash ledger.
//!
//! Tracks free balances, escrow locks, and the accrued platform fee pool.
//! The engine treats this as the all-or-nothing payment primitive: every
//! method either fully applies or fails without touching state.
//!
//! ## Cash conservation
//!
//! `sum(balances) + sum(locks) + fee_pool` only changes through
//! [`CashLedger::deposit`] (the external on-ramp); every other method is
//! zero-sum within the ledger.
//!
//! Every credit (balance, lock pot, fee pool) is checked: a credit that
//! would overflow `u64` fails with `AmountOverflow` before any leg of the
//! move has been applied. The system-wide total can still exceed `u64`
//! across accounts, so [`CashLedger::total_cash`] sums in `u128`.

use std::collections::HashMap;

use crate::error::EngineError;
use crate::types::asset::AccountId;
use crate::types::money::Money;

/// Escrow lock identity: buy-order escrow or dividend-pool funds.
///
/// Typed so order ids and pool ids can never collide in the lock table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockKey {
    /// Escrow backing a buy order
    Order(u64),
    /// Funds backing a dividend pool
    Pool(u64),
}

/// Keyed store of cash balances and escrow pots.
#[derive(Debug, Clone, Default)]
pub struct CashLedger {
    /// Free balance per account
    balances: HashMap<AccountId, Money>,

    /// Escrowed funds per lock
    locks: HashMap<LockKey, Money>,

    /// Accrued platform fees, withdrawable by the admin
    fee_pool: Money,
}

impl CashLedger {
    /// Create an empty cash ledger
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Free balance of an account
    #[inline]
    pub fn balance_of(&self, account: AccountId) -> Money {
        self.balances.get(&account).copied().unwrap_or(0)
    }

    /// Amount escrowed under a lock
    #[inline]
    pub fn locked(&self, key: LockKey) -> Money {
        self.locks.get(&key).copied().unwrap_or(0)
    }

    /// Accrued platform fees
    #[inline]
    pub fn fee_pool(&self) -> Money {
        self.fee_pool
    }

    /// Total cash in the system (conservation probe).
    ///
    /// Summed in `u128`: individual balances are capped at `u64::MAX` but
    /// their total is not.
    pub fn total_cash(&self) -> u128 {
        let balances: u128 = self.balances.values().map(|&v| v as u128).sum();
        let locked: u128 = self.locks.values().map(|&v| v as u128).sum();
        balances + locked + self.fee_pool as u128
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Credit an account from the external rail (on-ramp).
    pub fn deposit(&mut self, account: AccountId, amount: Money) -> Result<(), EngineError> {
        if amount == 0 {
            return Err(EngineError::InvalidAmount);
        }
        let balance = self.balances.entry(account).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(EngineError::AmountOverflow)?;
        Ok(())
    }

    /// Move free cash between accounts, skimming `fee` into the fee pool.
    ///
    /// The sender is debited `amount`; the receiver is credited
    /// `amount - fee`. Callers validate `fee <= amount`. Fails with
    /// `AmountOverflow` before anything moves if a credit would exceed
    /// `u64::MAX`.
    pub fn transfer_with_fee(
        &mut self,
        from: AccountId,
        to: AccountId,
        amount: Money,
        fee: Money,
    ) -> Result<(), EngineError> {
        if amount == 0 || fee > amount {
            return Err(EngineError::InvalidAmount);
        }
        let sender = self.balance_of(from);
        if sender < amount {
            return Err(EngineError::InsufficientPayment);
        }
        let receiver = if to == from {
            sender - amount
        } else {
            self.balance_of(to)
        };
        let credited = receiver
            .checked_add(amount - fee)
            .ok_or(EngineError::AmountOverflow)?;
        let fee_total = self
            .fee_pool
            .checked_add(fee)
            .ok_or(EngineError::AmountOverflow)?;

        self.balances.insert(from, sender - amount);
        self.balances.insert(to, credited);
        self.fee_pool = fee_total;
        Ok(())
    }

    /// Move free cash between accounts with no fee.
    pub fn transfer(
        &mut self,
        from: AccountId,
        to: AccountId,
        amount: Money,
    ) -> Result<(), EngineError> {
        self.transfer_with_fee(from, to, amount, 0)
    }

    /// Move free cash into an escrow lock.
    pub fn lock(
        &mut self,
        from: AccountId,
        key: LockKey,
        amount: Money,
    ) -> Result<(), EngineError> {
        if amount == 0 {
            return Err(EngineError::InvalidAmount);
        }
        let sender = self.balance_of(from);
        if sender < amount {
            return Err(EngineError::InsufficientPayment);
        }
        let pot = self
            .locked(key)
            .checked_add(amount)
            .ok_or(EngineError::AmountOverflow)?;

        self.balances.insert(from, sender - amount);
        self.locks.insert(key, pot);
        Ok(())
    }

    /// Release escrowed funds to an account, skimming `fee` into the fee
    /// pool. Partial releases leave the remainder locked. Fails with
    /// `AmountOverflow` before anything moves if a credit would exceed
    /// `u64::MAX`.
    pub fn unlock_to(
        &mut self,
        key: LockKey,
        to: AccountId,
        amount: Money,
        fee: Money,
    ) -> Result<(), EngineError> {
        if amount == 0 || fee > amount {
            return Err(EngineError::InvalidAmount);
        }
        let pot = self.locked(key);
        if pot < amount {
            return Err(EngineError::InsufficientPayment);
        }
        let credited = self
            .balance_of(to)
            .checked_add(amount - fee)
            .ok_or(EngineError::AmountOverflow)?;
        let fee_total = self
            .fee_pool
            .checked_add(fee)
            .ok_or(EngineError::AmountOverflow)?;

        if pot == amount {
            self.locks.remove(&key);
        } else {
            self.locks.insert(key, pot - amount);
        }
        self.balances.insert(to, credited);
        self.fee_pool = fee_total;
        Ok(())
    }

    /// Withdraw accrued platform fees to an account (admin path).
    pub fn withdraw_fees(&mut self, to: AccountId, amount: Money) -> Result<(), EngineError> {
        if amount == 0 {
            return Err(EngineError::InvalidAmount);
        }
        if self.fee_pool < amount {
            return Err(EngineError::InsufficientPayment);
        }
        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(EngineError::AmountOverflow)?;

        self.fee_pool -= amount;
        self.balances.insert(to, credited);
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
