//! Error taxonomy for the brickshare engine.
//!
//! Every fallible operation returns `Result<T, EngineError>`. An `Err`
//! guarantees that no state was mutated and no event was emitted; retrying
//! is always the caller's decision.

use thiserror::Error;

/// Typed failure for every engine operation.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    /// Caller lacks the admin capability or does not own the target
    #[error("caller is not authorized for this operation")]
    NotAuthorized,

    /// Share debit exceeds the available (unheld) balance
    #[error("insufficient share balance")]
    InsufficientShares,

    /// Cash debit exceeds the balance, or an offered payment is short
    #[error("insufficient payment")]
    InsufficientPayment,

    /// Zero or otherwise out-of-range amount
    #[error("invalid amount")]
    InvalidAmount,

    /// The order is in a terminal state (filled, cancelled, or expired)
    #[error("order is not active")]
    OrderNotActive,

    /// The order's expiry has passed
    #[error("order has expired")]
    OrderExpired,

    /// An owner may not fill their own order (cancel instead)
    #[error("self-trade is not allowed")]
    SelfTradeNotAllowed,

    /// A claim already exists for this (pool, account) pair
    #[error("dividend already claimed")]
    AlreadyClaimed,

    /// The computed entitlement is zero
    #[error("nothing to claim")]
    NothingToClaim,

    /// The dividend pool has been deactivated
    #[error("dividend pool is inactive")]
    PoolInactive,

    /// The asset has been deactivated
    #[error("asset is inactive")]
    AssetInactive,

    /// Trading is disabled for the asset
    #[error("trading is disabled for this asset")]
    TradingDisabled,

    /// The asset's share supply was already minted
    #[error("shares already issued for this asset")]
    AlreadyIssued,

    /// No asset with the given id
    #[error("asset not found")]
    AssetNotFound,

    /// No order with the given id
    #[error("order not found")]
    OrderNotFound,

    /// No dividend pool with the given id
    #[error("dividend pool not found")]
    PoolNotFound,

    /// Fixed-point arithmetic overflowed u64
    #[error("amount overflow")]
    AmountOverflow,
}
