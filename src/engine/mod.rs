//! Settlement engine module.
//!
//! ## Architecture
//!
//! [`Engine`] is the facade over every subsystem:
//!
//! - **Registry**: fractionalized assets and admin flags
//! - **Ledgers**: share balances with holds, cash with escrow locks
//! - **Order book**: order-taking storage, no auto-matching
//! - **Dividends**: pools, proportional entitlements, claim tracking
//! - **Event log**: one SSZ record per committed transition
//!
//! All mutation goes through the engine, which enforces the
//! checks-effects-interactions ordering and emits events.

pub mod core;

pub use core::{Engine, DEFAULT_FEE_BPS};
