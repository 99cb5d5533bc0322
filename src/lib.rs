//! # Brickshare
//!
//! Fractional real-estate ownership engine: share ledger, order-taking
//! book, and dividend distribution.
//!
//! ## Architecture
//!
//! The engine consists of:
//! - **Types**: Core data structures (Asset, Order, EventRecord, Money)
//! - **Registry**: Fractionalized properties and their admin flags
//! - **Ledger**: Share balances with holds, cash with escrow locks
//! - **OrderBook**: Slab-based order storage (order-taking, no matching)
//! - **Dividends**: Pro-rata pools with one-shot claims
//! - **Engine**: The single facade enforcing checks-effects-interactions
//!
//! ## Design Principles
//!
//! 1. **Determinism**: All operations produce identical results for identical inputs
//! 2. **No Floating Point**: All math uses fixed-point arithmetic (10^8 scaling)
//! 3. **Atomicity**: Every operation fully applies or leaves state untouched
//! 4. **Conservation**: Shares and cash are zero-sum outside mint/deposit
//! 5. **Auditability**: Exactly one event per committed transition, chained
//!    into a SHA-256 digest
//!
//! ## Example
//!
//! ```
//! use brickshare::engine::Engine;
//! use brickshare::types::money::to_money;
//!
//! const ADMIN: u64 = 1;
//! const SELLER: u64 = 2;
//! const BUYER: u64 = 3;
//! const HOUR_MS: u64 = 3_600_000;
//!
//! let mut engine = Engine::new(ADMIN);
//!
//! // Fractionalize a property into 1000 shares and mint them
//! let asset = engine
//!     .create_property(ADMIN, to_money("1000000.00").unwrap(), 1000, 0)
//!     .unwrap();
//! engine.issue_shares(ADMIN, asset, SELLER, 1000, 0).unwrap();
//! engine.enable_trading(ADMIN, asset).unwrap();
//!
//! // Peer-to-peer trade: seller lists 100 shares, buyer fills
//! engine.deposit_cash(BUYER, to_money("500.00").unwrap()).unwrap();
//! let order = engine
//!     .create_sell_order(SELLER, asset, 100, to_money("5.00").unwrap(), HOUR_MS, 1)
//!     .unwrap();
//! engine
//!     .fill_sell_order(order, BUYER, 100, to_money("500.00").unwrap(), 2)
//!     .unwrap();
//!
//! assert_eq!(engine.share_balance_of(asset, BUYER), 100);
//! // Seller receives the payment minus the 1% platform fee
//! assert_eq!(engine.cash_balance_of(SELLER), to_money("495.00").unwrap());
//! ```

// ============================================================================
// Module declarations
// ============================================================================

/// Core data types: Asset, Order, EventRecord, fixed-point Money
pub mod types;

/// Error taxonomy shared by all operations
pub mod error;

/// Property registry: fractionalized assets and admin flags
pub mod registry;

/// Share and cash ledgers
pub mod ledger;

/// Order book: slab-based order-taking storage
pub mod orderbook;

/// Dividend pools and claim tracking
pub mod dividends;

/// Settlement engine: the facade over every subsystem
pub mod engine;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use dividends::{DividendDistributor, DividendPool};
pub use engine::{Engine, DEFAULT_FEE_BPS};
pub use error::EngineError;
pub use ledger::{CashLedger, LockKey, ShareLedger};
pub use orderbook::OrderBook;
pub use registry::PropertyRegistry;
pub use types::{Asset, EventKind, EventRecord, Money, Order, OrderStatus, Side};
