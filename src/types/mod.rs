//! Core data types for the brickshare engine.
//!
//! - [`money`]: fixed-point money (u64 scaled by 10^8)
//! - [`asset`]: fractionalized assets and account identifiers
//! - [`order`]: buy/sell orders and their state machine
//! - [`event`]: the committed-transition outbox for the off-chain mirror

pub mod asset;
pub mod event;
pub mod money;
pub mod order;

pub use asset::{AccountId, Asset, AssetId};
pub use event::{EventKind, EventLog, EventRecord};
pub use money::Money;
pub use order::{Order, OrderStatus, Side};
