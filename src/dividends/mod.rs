//! Dividend distribution: pools, proportional entitlements, claim tracking.
//!
//! ## Snapshot semantics
//!
//! A pool's denominator (`snapshot_total_shares`) is fixed at creation
//! time from the asset's immutable total supply, so the payout can never
//! be inflated by later issuance. The numerator is the claimant's live
//! share balance at the moment of claiming: a transfer between pool
//! creation and claim shifts that pool's entitlement to the new holder.
//!
//! ## Conservation
//!
//! Entitlements use floor division, so for any pool
//! `sum(claims) + withdrawn <= total_amount`, with residual dust strictly
//! below `snapshot_total_shares` smallest units, sweepable by the admin
//! via withdraw-unclaimed.
//!
//! ## Two-phase mutation
//!
//! Claim and withdraw are split into a fallible `prepare_*` (all checks,
//! no mutation) and an infallible `commit_*`, so the engine can order the
//! cash movement between them and keep every operation all-or-nothing.

use std::collections::HashMap;

use crate::error::EngineError;
use crate::types::asset::{AccountId, AssetId};
use crate::types::money::{pro_rata, Money};

// ============================================================================
// DividendPool
// ============================================================================

/// A deposited sum of currency to be divided proportionally among an
/// asset's shareholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DividendPool {
    /// Unique pool identifier (assigned by the distributor)
    pub id: u64,

    /// Asset whose shareholders are entitled to this pool
    pub asset_id: AssetId,

    /// Total deposited amount
    pub total_amount: Money,

    /// Amount paid out to claimants so far
    pub distributed_amount: Money,

    /// Amount swept back by the admin so far
    pub withdrawn_amount: Money,

    /// Fixed entitlement denominator, taken from the asset's total share
    /// supply at creation time
    pub snapshot_total_shares: u64,

    /// Whether claims are currently accepted
    pub active: bool,

    /// Unix timestamp in milliseconds of pool creation
    pub created_at: u64,
}

impl DividendPool {
    /// Funds still escrowed in the pool
    #[inline]
    pub fn remaining(&self) -> Money {
        self.total_amount - self.distributed_amount - self.withdrawn_amount
    }
}

/// A one-time dividend withdrawal by a shareholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Claim {
    /// Amount paid out
    pub amount: Money,

    /// Unix timestamp in milliseconds of the claim
    pub claimed_at: u64,
}

// ============================================================================
// DividendDistributor
// ============================================================================

/// Per-asset dividend pools and their claim table.
///
/// The distributor never touches share balances; the engine reads them
/// from the share ledger and passes the claimant's balance in.
#[derive(Debug, Clone, Default)]
pub struct DividendDistributor {
    pools: HashMap<u64, DividendPool>,
    claims: HashMap<(u64, AccountId), Claim>,
    next_pool_id: u64,
}

impl DividendDistributor {
    /// Create an empty distributor (pool ids start at 1)
    pub fn new() -> Self {
        Self {
            pools: HashMap::new(),
            claims: HashMap::new(),
            next_pool_id: 1,
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Look up a pool by id
    #[inline]
    pub fn get(&self, pool_id: u64) -> Result<&DividendPool, EngineError> {
        self.pools.get(&pool_id).ok_or(EngineError::PoolNotFound)
    }

    /// Number of pools ever created
    #[inline]
    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    /// The claim record for `(pool, owner)`, if one exists
    #[inline]
    pub fn claim_of(&self, pool_id: u64, owner: AccountId) -> Option<&Claim> {
        self.claims.get(&(pool_id, owner))
    }

    /// Ids of all pools for an asset, oldest first
    pub fn pools_for_asset(&self, asset_id: AssetId) -> Vec<u64> {
        let mut ids: Vec<u64> = self
            .pools
            .values()
            .filter(|p| p.asset_id == asset_id)
            .map(|p| p.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Pure entitlement computation: `total * balance / snapshot`, floored.
    ///
    /// Does not consult the claim table; an already-claimed owner still
    /// gets a number here (and is rejected by [`Self::prepare_claim`]).
    pub fn claimable_amount(&self, pool_id: u64, balance: u64) -> Result<Money, EngineError> {
        let pool = self.get(pool_id)?;
        pro_rata(pool.total_amount, balance, pool.snapshot_total_shares)
            .ok_or(EngineError::InvalidAmount)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Create a pool for an asset. The engine escrows the funds before
    /// calling this. Returns the new pool id.
    pub fn create_pool(
        &mut self,
        asset_id: AssetId,
        total_amount: Money,
        snapshot_total_shares: u64,
        now: u64,
    ) -> Result<u64, EngineError> {
        if total_amount == 0 || snapshot_total_shares == 0 {
            return Err(EngineError::InvalidAmount);
        }

        let id = self.next_pool_id;
        self.next_pool_id += 1;
        self.pools.insert(
            id,
            DividendPool {
                id,
                asset_id,
                total_amount,
                distributed_amount: 0,
                withdrawn_amount: 0,
                snapshot_total_shares,
                active: true,
                created_at: now,
            },
        );
        Ok(id)
    }

    /// Validate a claim and compute its amount. No state change.
    ///
    /// Fails with `PoolInactive`, `AlreadyClaimed`, or `NothingToClaim`.
    pub fn prepare_claim(
        &self,
        pool_id: u64,
        owner: AccountId,
        balance: u64,
    ) -> Result<Money, EngineError> {
        let pool = self.get(pool_id)?;
        if !pool.active {
            return Err(EngineError::PoolInactive);
        }
        if self.claims.contains_key(&(pool_id, owner)) {
            return Err(EngineError::AlreadyClaimed);
        }

        let amount = pro_rata(pool.total_amount, balance, pool.snapshot_total_shares)
            .ok_or(EngineError::InvalidAmount)?;
        if amount == 0 {
            return Err(EngineError::NothingToClaim);
        }
        Ok(amount)
    }

    /// Record a prepared claim. Infallible by construction: callers must
    /// have run [`Self::prepare_claim`] in the same serialized operation.
    pub fn commit_claim(&mut self, pool_id: u64, owner: AccountId, amount: Money, now: u64) {
        if let Some(pool) = self.pools.get_mut(&pool_id) {
            pool.distributed_amount += amount;
        }
        self.claims.insert(
            (pool_id, owner),
            Claim {
                amount,
                claimed_at: now,
            },
        );
    }

    /// Deactivate a pool, stopping further claims.
    pub fn deactivate(&mut self, pool_id: u64) -> Result<(), EngineError> {
        let pool = self.pools.get_mut(&pool_id).ok_or(EngineError::PoolNotFound)?;
        if !pool.active {
            return Err(EngineError::PoolInactive);
        }
        pool.active = false;
        Ok(())
    }

    /// Validate an unclaimed-funds withdrawal. No state change.
    ///
    /// Fails with `InvalidAmount` if `amount` is zero or exceeds
    /// `total - distributed - withdrawn`.
    pub fn prepare_withdraw(&self, pool_id: u64, amount: Money) -> Result<(), EngineError> {
        let pool = self.get(pool_id)?;
        if amount == 0 || amount > pool.remaining() {
            return Err(EngineError::InvalidAmount);
        }
        Ok(())
    }

    /// Record a prepared withdrawal.
    pub fn commit_withdraw(&mut self, pool_id: u64, amount: Money) {
        if let Some(pool) = self.pools.get_mut(&pool_id) {
            pool.withdrawn_amount += amount;
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
