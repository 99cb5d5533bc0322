//! Asset types for fractionalized properties.
//!
//! An [`Asset`] is created once when a property is fractionalized; its
//! `total_shares` is immutable from that point on. The admin can toggle
//! `trading_enabled` and `active` without affecting share balances.

use crate::types::money::Money;

/// Identifier for a fractionalized asset
pub type AssetId = u64;

/// Identifier for an investor or admin account
pub type AccountId = u64;

/// A fractionalized property.
///
/// ## Invariants
///
/// - `total_shares > 0`, frozen at fractionalization
/// - the share ledger conserves `sum(balances) == total_shares` once issued
///
/// ## Example
///
/// ```
/// use brickshare::types::{Asset, money::to_money};
///
/// let asset = Asset::new(1, to_money("1000000.00").unwrap(), 1000, 0);
/// assert!(asset.active);
/// assert!(!asset.trading_enabled);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Unique asset identifier (assigned by the registry)
    pub id: AssetId,

    /// Total appraised value in fixed-point money
    pub total_value: Money,

    /// Total share count, immutable after fractionalization
    pub total_shares: u64,

    /// Whether peer-to-peer trading of this asset's shares is enabled
    pub trading_enabled: bool,

    /// Whether the asset is active (inactive assets reject new pools)
    pub active: bool,

    /// Unix timestamp in milliseconds when the asset was fractionalized
    pub created_at: u64,
}

impl Asset {
    /// Create a new asset record.
    ///
    /// Trading starts disabled; the admin enables it once the initial
    /// issuance has settled.
    pub fn new(id: AssetId, total_value: Money, total_shares: u64, created_at: u64) -> Self {
        Self {
            id,
            total_value,
            total_shares,
            trading_enabled: false,
            active: true,
            created_at,
        }
    }

    /// Implied value of a single share (floored)
    pub fn value_per_share(&self) -> Money {
        if self.total_shares == 0 {
            return 0;
        }
        ((self.total_value as u128) / (self.total_shares as u128)) as u64
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
