//! Order book storage.
//!
//! ## Architecture
//!
//! - **Slab**: pre-allocated storage for O(1) order operations
//! - **HashMap**: order ID to slab key mapping for O(1) lookup
//!
//! This book is an order-taking venue, not a continuous-matching CLOB:
//! fills target a specific order id, so there are no price levels and no
//! price-time queue. Fairness is first-come-first-served at the
//! transaction-serialization layer below the engine.
//!
//! Terminal orders (filled/cancelled/expired) stay in the slab, marked by
//! status, so a late fill attempt reports `OrderNotActive` instead of the
//! order silently vanishing.
//!
//! ## Memory Model
//!
//! Per slab docs (https://docs.rs/slab/0.4.11):
//! - `Slab::with_capacity(n)` pre-allocates n slots
//! - O(1) insert and lookup

use std::collections::HashMap;

use slab::Slab;

use crate::types::asset::AssetId;
use crate::types::order::Order;

/// Order storage with O(1) id lookup.
#[derive(Debug, Clone)]
pub struct OrderBook {
    /// Pre-allocated order storage
    orders: Slab<Order>,

    /// Order ID to slab key mapping
    order_index: HashMap<u64, usize>,

    /// Next order ID (monotonic, never reused even as slab keys are)
    next_order_id: u64,

    /// Number of orders currently open
    open_count: usize,
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderBook {
    /// Create a new empty book
    pub fn new() -> Self {
        Self {
            orders: Slab::new(),
            order_index: HashMap::new(),
            next_order_id: 1,
            open_count: 0,
        }
    }

    /// Create a book with pre-allocated capacity
    pub fn with_capacity(order_capacity: usize) -> Self {
        Self {
            orders: Slab::with_capacity(order_capacity),
            order_index: HashMap::with_capacity(order_capacity),
            next_order_id: 1,
            open_count: 0,
        }
    }

    // ========================================================================
    // Capacity and Size
    // ========================================================================

    /// Get the current capacity (pre-allocated slots)
    #[inline]
    pub fn capacity(&self) -> usize {
        self.orders.capacity()
    }

    /// Total number of orders ever inserted and still stored
    #[inline]
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Number of currently open orders
    #[inline]
    pub fn open_count(&self) -> usize {
        self.open_count
    }

    /// Check if the book holds no orders
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    // ========================================================================
    // Order Management
    // ========================================================================

    /// Insert an open order, assigning its id. Returns the order id.
    pub fn insert(&mut self, mut order: Order) -> u64 {
        let id = self.next_order_id;
        self.next_order_id += 1;
        order.id = id;

        debug_assert!(order.is_open());
        let key = self.orders.insert(order);
        self.order_index.insert(id, key);
        self.open_count += 1;
        id
    }

    /// Get a reference to an order by id
    #[inline]
    pub fn get(&self, order_id: u64) -> Option<&Order> {
        let key = *self.order_index.get(&order_id)?;
        self.orders.get(key)
    }

    /// Get a mutable reference to an order by id.
    ///
    /// Callers transitioning the order out of `Open` must pair this with
    /// [`OrderBook::note_closed`] to keep the open count accurate.
    #[inline]
    pub fn get_mut(&mut self, order_id: u64) -> Option<&mut Order> {
        let key = *self.order_index.get(&order_id)?;
        self.orders.get_mut(key)
    }

    /// Check if an order exists (open or terminal)
    #[inline]
    pub fn contains(&self, order_id: u64) -> bool {
        self.order_index.contains_key(&order_id)
    }

    /// Record that an open order reached a terminal state
    #[inline]
    pub fn note_closed(&mut self) {
        self.open_count = self.open_count.saturating_sub(1);
    }

    // ========================================================================
    // Scans
    // ========================================================================

    /// Ids of all open orders for an asset, oldest first
    pub fn open_orders(&self, asset_id: AssetId) -> Vec<u64> {
        let mut ids: Vec<u64> = self
            .orders
            .iter()
            .filter(|(_, o)| o.asset_id == asset_id && o.is_open())
            .map(|(_, o)| o.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Ids of open orders whose expiry has passed at `now`, oldest first.
    ///
    /// Used by the lazy-expiry sweep; the engine releases each order's
    /// backing resources before marking it expired.
    pub fn expired_open_orders(&self, now: u64) -> Vec<u64> {
        let mut ids: Vec<u64> = self
            .orders
            .iter()
            .filter(|(_, o)| o.is_open() && o.is_expired_at(now))
            .map(|(_, o)| o.id)
            .collect();
        ids.sort_unstable();
        ids
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
