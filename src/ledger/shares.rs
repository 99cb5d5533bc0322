//! Per-asset fractional share ledger.
//!
//! ## Conservation
//!
//! For every asset, `sum(balances) == issued_shares(asset)` at all times.
//! Only [`ShareLedger::issue`] increases the total, exactly once per asset;
//! every transfer is zero-sum within a single call.
//!
//! ## Holds
//!
//! Shares backing an open sell order are *held*: still owned (they count
//! toward dividend entitlement) but not spendable. A transfer only draws on
//! the available balance (`balance - held`), which is what prevents two
//! sell orders from committing the same shares.

use std::collections::HashMap;

use crate::error::EngineError;
use crate::types::asset::{AccountId, AssetId};

/// Keyed store of share balances: (asset, owner) -> shares.
///
/// Accounts are created implicitly on first credit and are never negative
/// (balances are unsigned and every debit is checked).
#[derive(Debug, Clone, Default)]
pub struct ShareLedger {
    /// Owned shares per (asset, account)
    balances: HashMap<(AssetId, AccountId), u64>,

    /// Shares earmarked for open sell orders per (asset, account)
    holds: HashMap<(AssetId, AccountId), u64>,

    /// Total minted per asset; presence marks the one-shot issuance as done
    issued: HashMap<AssetId, u64>,
}

impl ShareLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Shares owned by `owner` (including any held for open sell orders)
    #[inline]
    pub fn balance_of(&self, asset_id: AssetId, owner: AccountId) -> u64 {
        self.balances.get(&(asset_id, owner)).copied().unwrap_or(0)
    }

    /// Shares held for open sell orders
    #[inline]
    pub fn held_of(&self, asset_id: AssetId, owner: AccountId) -> u64 {
        self.holds.get(&(asset_id, owner)).copied().unwrap_or(0)
    }

    /// Shares spendable right now (`balance - held`)
    #[inline]
    pub fn available_of(&self, asset_id: AssetId, owner: AccountId) -> u64 {
        self.balance_of(asset_id, owner)
            .saturating_sub(self.held_of(asset_id, owner))
    }

    /// Total shares minted for the asset, or 0 if not yet issued
    #[inline]
    pub fn issued_shares(&self, asset_id: AssetId) -> u64 {
        self.issued.get(&asset_id).copied().unwrap_or(0)
    }

    /// Whether the one-shot issuance has happened
    #[inline]
    pub fn is_issued(&self, asset_id: AssetId) -> bool {
        self.issued.contains_key(&asset_id)
    }

    /// Sum of all balances for the asset (conservation probe; equals
    /// `issued_shares` whenever the ledger is consistent)
    pub fn total_balance(&self, asset_id: AssetId) -> u64 {
        self.balances
            .iter()
            .filter(|((aid, _), _)| *aid == asset_id)
            .map(|(_, shares)| shares)
            .sum()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Mint the asset's full share supply to the initial holder.
    ///
    /// Callable exactly once per asset; a second call fails with
    /// `AlreadyIssued`. Zero shares fail with `InvalidAmount`.
    pub fn issue(
        &mut self,
        asset_id: AssetId,
        owner: AccountId,
        shares: u64,
    ) -> Result<(), EngineError> {
        if shares == 0 {
            return Err(EngineError::InvalidAmount);
        }
        if self.issued.contains_key(&asset_id) {
            return Err(EngineError::AlreadyIssued);
        }

        self.issued.insert(asset_id, shares);
        *self.balances.entry((asset_id, owner)).or_insert(0) += shares;
        Ok(())
    }

    /// Atomically move `shares` from `from` to `to`.
    ///
    /// Fails with `InvalidAmount` on zero and `InsufficientShares` if the
    /// sender's available balance is too small. On failure nothing changes.
    pub fn transfer(
        &mut self,
        asset_id: AssetId,
        from: AccountId,
        to: AccountId,
        shares: u64,
    ) -> Result<(), EngineError> {
        if shares == 0 {
            return Err(EngineError::InvalidAmount);
        }
        if self.available_of(asset_id, from) < shares {
            return Err(EngineError::InsufficientShares);
        }

        // Both legs in one step; the debit cannot underflow after the check
        *self.balances.entry((asset_id, from)).or_insert(0) -= shares;
        *self.balances.entry((asset_id, to)).or_insert(0) += shares;
        Ok(())
    }

    /// Earmark `shares` of `owner` for an open sell order.
    ///
    /// Fails with `InsufficientShares` if the available balance is too
    /// small, which is the double-commitment guard.
    pub fn hold(
        &mut self,
        asset_id: AssetId,
        owner: AccountId,
        shares: u64,
    ) -> Result<(), EngineError> {
        if shares == 0 {
            return Err(EngineError::InvalidAmount);
        }
        if self.available_of(asset_id, owner) < shares {
            return Err(EngineError::InsufficientShares);
        }

        *self.holds.entry((asset_id, owner)).or_insert(0) += shares;
        Ok(())
    }

    /// Release a previously placed hold (cancel/expiry path).
    pub fn release_hold(
        &mut self,
        asset_id: AssetId,
        owner: AccountId,
        shares: u64,
    ) -> Result<(), EngineError> {
        let held = self.holds.entry((asset_id, owner)).or_insert(0);
        if *held < shares {
            return Err(EngineError::InsufficientShares);
        }
        *held -= shares;
        Ok(())
    }

    /// Consume a hold and transfer the shares to the counterparty in one
    /// atomic step (sell-order fill path).
    pub fn transfer_held(
        &mut self,
        asset_id: AssetId,
        from: AccountId,
        to: AccountId,
        shares: u64,
    ) -> Result<(), EngineError> {
        if shares == 0 {
            return Err(EngineError::InvalidAmount);
        }
        if self.held_of(asset_id, from) < shares || self.balance_of(asset_id, from) < shares {
            return Err(EngineError::InsufficientShares);
        }

        *self.holds.entry((asset_id, from)).or_insert(0) -= shares;
        *self.balances.entry((asset_id, from)).or_insert(0) -= shares;
        *self.balances.entry((asset_id, to)).or_insert(0) += shares;
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
