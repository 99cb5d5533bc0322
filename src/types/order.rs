//! Order types for the brickshare settlement engine.
//!
//! ## SSZ Serialization
//!
//! `Order` derives `SimpleSerialize` from ssz_rs for deterministic encoding.
//! Enum fields (`side`, `status`) are stored as raw `u8` values with typed
//! accessors, keeping the struct a fixed-size SSZ container.
//!
//! ## Order Lifecycle
//!
//! ```text
//! Open --partial fill--> Open (remaining reduced)
//! Open --full fill-----> Filled
//! Open --cancel--------> Cancelled
//! Open --expiry sweep--> Expired
//! ```
//!
//! `Filled`, `Cancelled`, and `Expired` are terminal. An order past its
//! `expires_at` may still carry `Open` status until a fill attempt rejects
//! it or a lazy-expiry sweep transitions it.

use ssz_rs::prelude::*;

use crate::types::asset::{AccountId, AssetId};
use crate::types::money::Money;

// ============================================================================
// Side enum
// ============================================================================

/// Order side: Buy or Sell
///
/// Represented as u8 for SSZ compatibility:
/// - Buy = 0
/// - Sell = 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Side {
    /// Buy order (bid) - escrows payment, wants shares
    #[default]
    Buy,
    /// Sell order (ask) - holds shares, wants payment
    Sell,
}

impl Side {
    /// Convert to u8 for serialization
    pub fn to_u8(self) -> u8 {
        match self {
            Side::Buy => 0,
            Side::Sell => 1,
        }
    }

    /// Convert from u8 for deserialization
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Side::Buy),
            1 => Some(Side::Sell),
            _ => None,
        }
    }
}

// ============================================================================
// OrderStatus enum
// ============================================================================

/// Order state machine tag.
///
/// Partially filled orders remain `Open` with a reduced `remaining`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OrderStatus {
    /// Accepting fills (subject to expiry)
    #[default]
    Open,
    /// Fully filled - terminal
    Filled,
    /// Cancelled by its owner - terminal
    Cancelled,
    /// Lapsed past `expires_at` and swept - terminal
    Expired,
}

impl OrderStatus {
    /// Convert to u8 for serialization
    pub fn to_u8(self) -> u8 {
        match self {
            OrderStatus::Open => 0,
            OrderStatus::Filled => 1,
            OrderStatus::Cancelled => 2,
            OrderStatus::Expired => 3,
        }
    }

    /// Convert from u8 for deserialization
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(OrderStatus::Open),
            1 => Some(OrderStatus::Filled),
            2 => Some(OrderStatus::Cancelled),
            3 => Some(OrderStatus::Expired),
            _ => None,
        }
    }
}

// ============================================================================
// Order struct
// ============================================================================

/// A standing offer to buy or sell a quantity of an asset's shares at a
/// fixed price, with an expiry.
///
/// ## Backing resources
///
/// - Sell orders have `remaining` shares held in the share ledger.
/// - Buy orders have `remaining * price_per_share` escrowed in the cash
///   ledger under the order's lock.
///
/// Both are released on cancel/expiry and consumed pro-rata by fills.
///
/// ## Example
///
/// ```
/// use brickshare::types::{Order, Side, money::to_money};
///
/// // Sell 100 shares of asset 1 at 5.00, valid for one hour
/// let order = Order::new(1, 1, 7, Side::Sell, 100, to_money("5.00").unwrap(), 0, 3_600_000);
/// assert_eq!(order.remaining, 100);
/// assert!(order.is_open());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct Order {
    /// Unique order identifier (assigned by the book)
    pub id: u64,

    /// Asset whose shares are offered or sought
    pub asset_id: AssetId,

    /// Account that placed the order
    pub owner: AccountId,

    /// Order side as u8 (0=Buy, 1=Sell)
    pub side_raw: u8,

    /// Original share quantity
    pub shares: u64,

    /// Remaining share quantity (decremented by partial fills)
    pub remaining: u64,

    /// Price per share in fixed-point money
    pub price_per_share: Money,

    /// Unix timestamp in milliseconds when the order was created
    pub created_at: u64,

    /// Unix timestamp in milliseconds after which fills are rejected
    pub expires_at: u64,

    /// Order status as u8 (0=Open, 1=Filled, 2=Cancelled, 3=Expired)
    pub status_raw: u8,
}

impl Order {
    /// Create a new open order.
    ///
    /// `expires_at = created_at + ttl_ms`, saturating at `u64::MAX`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u64,
        asset_id: AssetId,
        owner: AccountId,
        side: Side,
        shares: u64,
        price_per_share: Money,
        created_at: u64,
        ttl_ms: u64,
    ) -> Self {
        Self {
            id,
            asset_id,
            owner,
            side_raw: side.to_u8(),
            shares,
            remaining: shares,
            price_per_share,
            created_at,
            expires_at: created_at.saturating_add(ttl_ms),
            status_raw: OrderStatus::Open.to_u8(),
        }
    }

    /// Get the order side
    pub fn side(&self) -> Side {
        Side::from_u8(self.side_raw).unwrap_or(Side::Buy)
    }

    /// Get the order status
    pub fn status(&self) -> OrderStatus {
        OrderStatus::from_u8(self.status_raw).unwrap_or(OrderStatus::Open)
    }

    /// Set the order status
    pub fn set_status(&mut self, status: OrderStatus) {
        self.status_raw = status.to_u8();
    }

    /// Check whether the order is still open (not a terminal state)
    pub fn is_open(&self) -> bool {
        self.status() == OrderStatus::Open
    }

    /// Check whether the order has lapsed at `now`
    pub fn is_expired_at(&self, now: u64) -> bool {
        now >= self.expires_at
    }

    /// Get the filled quantity
    pub fn filled_shares(&self) -> u64 {
        self.shares.saturating_sub(self.remaining)
    }

    /// Fill a portion of this order, transitioning to `Filled` when the
    /// remaining quantity reaches zero.
    ///
    /// Returns the actual quantity filled (capped at `remaining`).
    pub fn fill(&mut self, fill_shares: u64) -> u64 {
        let actual_fill = fill_shares.min(self.remaining);
        self.remaining = self.remaining.saturating_sub(actual_fill);
        if self.remaining == 0 {
            self.set_status(OrderStatus::Filled);
        }
        actual_fill
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
