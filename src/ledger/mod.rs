//! Ledger module: the shared mutable state of the engine.
//!
//! ## Components
//!
//! - [`ShareLedger`]: per-asset fractional share balances with sell-order
//!   holds and the conservation invariant (`sum(balances) == issued`)
//! - [`CashLedger`]: payment-rail balances, escrow locks, and the platform
//!   fee pool
//!
//! Both are explicit keyed stores passed by handle into the components that
//! need them, never ambient globals, so tests can substitute isolated
//! instances.

pub mod cash;
pub mod shares;

pub use cash::{CashLedger, LockKey};
pub use shares::ShareLedger;
