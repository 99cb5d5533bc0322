//! Settlement engine: the single entry point for every state transition.
//!
//! ## Checks-effects-interactions
//!
//! Every operation validates all preconditions first and only then
//! mutates, so a returned `Err` means no ledger, book, or pool state
//! changed and no event was emitted. Re-validation (balance, active flag,
//! not-yet-claimed) happens inside the same call that mutates; there is
//! no gap for a double-spend or double-claim to slip through.
//!
//! ## Serialization model
//!
//! The engine performs no internal threading or locking. The hosting
//! environment serializes all mutating calls (`&mut self` enforces this in
//! process); of two competing fills, the one applied first wins and the
//! loser observes `OrderNotActive`, `InsufficientShares`, or
//! `InsufficientPayment`.

use crate::dividends::DividendDistributor;
use crate::error::EngineError;
use crate::ledger::{CashLedger, LockKey, ShareLedger};
use crate::orderbook::OrderBook;
use crate::registry::PropertyRegistry;
use crate::types::asset::{AccountId, Asset, AssetId};
use crate::types::event::{EventKind, EventLog, EventRecord};
use crate::types::money::{fee_amount, order_cost, Money, BPS_DENOM};
use crate::types::order::{Order, OrderStatus, Side};

/// Default platform fee: 100 bps (1%) on the payment leg of every fill
pub const DEFAULT_FEE_BPS: u64 = 100;

/// The fractional-share settlement engine.
///
/// Owns the property registry, both ledgers, the order book, the dividend
/// distributor, and the event outbox, and is the only writer to any of
/// them.
///
/// ## Example
///
/// ```
/// use brickshare::engine::Engine;
/// use brickshare::types::money::to_money;
///
/// const ADMIN: u64 = 1;
/// const INVESTOR: u64 = 2;
///
/// let mut engine = Engine::new(ADMIN);
/// let asset = engine
///     .create_property(ADMIN, to_money("1000000.00").unwrap(), 1000, 0)
///     .unwrap();
/// engine.issue_shares(ADMIN, asset, ADMIN, 1000, 0).unwrap();
/// engine.enable_trading(ADMIN, asset).unwrap();
///
/// assert_eq!(engine.share_balance_of(asset, ADMIN), 1000);
/// assert_eq!(engine.share_balance_of(asset, INVESTOR), 0);
/// ```
#[derive(Debug, Clone)]
pub struct Engine {
    /// Account holding the admin capability
    admin: AccountId,

    /// Platform fee in basis points, applied to the payment leg of fills
    fee_bps: u64,

    registry: PropertyRegistry,
    shares: ShareLedger,
    cash: CashLedger,
    book: OrderBook,
    dividends: DividendDistributor,
    events: EventLog,
}

impl Engine {
    /// Create an engine with the given admin account and the default fee
    pub fn new(admin: AccountId) -> Self {
        Self {
            admin,
            fee_bps: DEFAULT_FEE_BPS,
            registry: PropertyRegistry::new(),
            shares: ShareLedger::new(),
            cash: CashLedger::new(),
            book: OrderBook::new(),
            dividends: DividendDistributor::new(),
            events: EventLog::new(),
        }
    }

    /// Create an engine with pre-allocated order capacity
    pub fn with_capacity(admin: AccountId, order_capacity: usize) -> Self {
        Self {
            book: OrderBook::with_capacity(order_capacity),
            ..Self::new(admin)
        }
    }

    fn require_admin(&self, caller: AccountId) -> Result<(), EngineError> {
        if caller != self.admin {
            return Err(EngineError::NotAuthorized);
        }
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// The admin account
    #[inline]
    pub fn admin(&self) -> AccountId {
        self.admin
    }

    /// Current platform fee in basis points
    #[inline]
    pub fn fee_bps(&self) -> u64 {
        self.fee_bps
    }

    /// Look up an asset
    pub fn asset(&self, asset_id: AssetId) -> Result<&Asset, EngineError> {
        self.registry.get(asset_id)
    }

    /// Look up an order (open or terminal)
    pub fn order(&self, order_id: u64) -> Result<&Order, EngineError> {
        self.book.get(order_id).ok_or(EngineError::OrderNotFound)
    }

    /// Shares owned by `owner` (including shares held for open sell orders)
    #[inline]
    pub fn share_balance_of(&self, asset_id: AssetId, owner: AccountId) -> u64 {
        self.shares.balance_of(asset_id, owner)
    }

    /// Shares spendable right now
    #[inline]
    pub fn available_shares_of(&self, asset_id: AssetId, owner: AccountId) -> u64 {
        self.shares.available_of(asset_id, owner)
    }

    /// Free cash balance
    #[inline]
    pub fn cash_balance_of(&self, account: AccountId) -> Money {
        self.cash.balance_of(account)
    }

    /// Accrued platform fees
    #[inline]
    pub fn platform_fees(&self) -> Money {
        self.cash.fee_pool()
    }

    /// The share ledger (read-only)
    #[inline]
    pub fn shares(&self) -> &ShareLedger {
        &self.shares
    }

    /// The cash ledger (read-only)
    #[inline]
    pub fn cash(&self) -> &CashLedger {
        &self.cash
    }

    /// The order book (read-only)
    #[inline]
    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    /// The dividend distributor (read-only)
    #[inline]
    pub fn dividends(&self) -> &DividendDistributor {
        &self.dividends
    }

    /// Committed events, oldest first
    #[inline]
    pub fn events(&self) -> &[EventRecord] {
        self.events.records()
    }

    /// Chained digest over all committed events
    #[inline]
    pub fn event_digest(&self) -> [u8; 32] {
        self.events.digest()
    }

    // ========================================================================
    // Admin surface
    // ========================================================================

    /// Fractionalize a property into `total_shares` tradeable shares.
    ///
    /// Admin only. Returns the new asset id; trading starts disabled.
    pub fn create_property(
        &mut self,
        caller: AccountId,
        total_value: Money,
        total_shares: u64,
        now: u64,
    ) -> Result<AssetId, EngineError> {
        self.require_admin(caller)?;
        self.registry.fractionalize(total_value, total_shares, now)
    }

    /// Mint the asset's full share supply to the initial holder.
    ///
    /// Admin only, once per asset (`AlreadyIssued`). `shares` must equal
    /// the asset's `total_shares` since issuance is the one-shot full mint.
    pub fn issue_shares(
        &mut self,
        caller: AccountId,
        asset_id: AssetId,
        holder: AccountId,
        shares: u64,
        now: u64,
    ) -> Result<(), EngineError> {
        self.require_admin(caller)?;
        let asset = self.registry.ensure_active(asset_id)?;
        if shares != asset.total_shares {
            return Err(EngineError::InvalidAmount);
        }

        self.shares.issue(asset_id, holder, shares)?;
        self.events
            .append(EventKind::SharesIssued, asset_id, 0, holder, 0, shares, 0, now);
        Ok(())
    }

    /// Enable peer-to-peer trading for the asset (admin only)
    pub fn enable_trading(&mut self, caller: AccountId, asset_id: AssetId) -> Result<(), EngineError> {
        self.require_admin(caller)?;
        self.registry.enable_trading(asset_id)
    }

    /// Disable peer-to-peer trading for the asset (admin only)
    pub fn disable_trading(&mut self, caller: AccountId, asset_id: AssetId) -> Result<(), EngineError> {
        self.require_admin(caller)?;
        self.registry.disable_trading(asset_id)
    }

    /// Deactivate the asset (admin only)
    pub fn deactivate_asset(&mut self, caller: AccountId, asset_id: AssetId) -> Result<(), EngineError> {
        self.require_admin(caller)?;
        self.registry.deactivate(asset_id)
    }

    /// Update the platform fee (admin only, at most 10_000 bps)
    pub fn set_fee_bps(&mut self, caller: AccountId, fee_bps: u64) -> Result<(), EngineError> {
        self.require_admin(caller)?;
        if fee_bps > BPS_DENOM {
            return Err(EngineError::InvalidAmount);
        }
        self.fee_bps = fee_bps;
        Ok(())
    }

    /// Withdraw accrued platform fees to the admin account (admin only)
    pub fn withdraw_platform_fees(
        &mut self,
        caller: AccountId,
        amount: Money,
        now: u64,
    ) -> Result<(), EngineError> {
        self.require_admin(caller)?;
        self.cash.withdraw_fees(self.admin, amount)?;
        self.events.append(
            EventKind::PlatformFeesWithdrawn,
            0,
            0,
            self.admin,
            0,
            0,
            amount,
            now,
        );
        Ok(())
    }

    /// Credit an account from the external payment rail (on-ramp)
    pub fn deposit_cash(&mut self, account: AccountId, amount: Money) -> Result<(), EngineError> {
        self.cash.deposit(account, amount)
    }

    // ========================================================================
    // Order operations
    // ========================================================================

    /// Place a sell order, holding `shares` of the owner's balance.
    ///
    /// Requires the asset to be active with trading enabled, and the
    /// owner's available balance to cover `shares` (the hold is what keeps
    /// two sell orders from committing the same shares). Returns the id.
    pub fn create_sell_order(
        &mut self,
        owner: AccountId,
        asset_id: AssetId,
        shares: u64,
        price_per_share: Money,
        ttl_ms: u64,
        now: u64,
    ) -> Result<u64, EngineError> {
        self.registry.ensure_tradeable(asset_id)?;
        if shares == 0 || price_per_share == 0 || ttl_ms == 0 {
            return Err(EngineError::InvalidAmount);
        }
        // Reject orders whose full cost cannot be settled
        order_cost(price_per_share, shares).ok_or(EngineError::AmountOverflow)?;

        self.shares.hold(asset_id, owner, shares)?;
        let id = self.book.insert(Order::new(
            0,
            asset_id,
            owner,
            Side::Sell,
            shares,
            price_per_share,
            now,
            ttl_ms,
        ));
        self.events
            .append(EventKind::OrderCreated, asset_id, id, owner, 0, shares, 0, now);
        Ok(id)
    }

    /// Place a buy order, escrowing `shares * price_per_share` cash.
    ///
    /// The escrow is refunded on cancel or expiry. Returns the order id.
    pub fn create_buy_order(
        &mut self,
        owner: AccountId,
        asset_id: AssetId,
        shares: u64,
        price_per_share: Money,
        ttl_ms: u64,
        now: u64,
    ) -> Result<u64, EngineError> {
        self.registry.ensure_tradeable(asset_id)?;
        if shares == 0 || price_per_share == 0 || ttl_ms == 0 {
            return Err(EngineError::InvalidAmount);
        }
        let escrow = order_cost(price_per_share, shares).ok_or(EngineError::AmountOverflow)?;
        if self.cash.balance_of(owner) < escrow {
            return Err(EngineError::InsufficientPayment);
        }

        let id = self.book.insert(Order::new(
            0,
            asset_id,
            owner,
            Side::Buy,
            shares,
            price_per_share,
            now,
            ttl_ms,
        ));
        // Cannot fail: balance was checked above in the same serialized call
        self.cash.lock(owner, LockKey::Order(id), escrow)?;
        self.events
            .append(EventKind::OrderCreated, asset_id, id, owner, 0, shares, escrow, now);
        Ok(id)
    }

    /// Fill (part of) an open sell order.
    ///
    /// `payment` is the filler's offered payment for this leg; it must
    /// cover `shares * price_per_share` and so must the filler's cash
    /// balance. Exactly the cost is moved: shares go owner -> filler,
    /// payment goes filler -> owner minus the platform fee.
    ///
    /// Returns the gross cost settled.
    pub fn fill_sell_order(
        &mut self,
        order_id: u64,
        filler: AccountId,
        shares: u64,
        payment: Money,
        now: u64,
    ) -> Result<Money, EngineError> {
        // -- checks ----------------------------------------------------------
        let order = self.book.get(order_id).ok_or(EngineError::OrderNotFound)?;
        if order.side() != Side::Sell || !order.is_open() {
            return Err(EngineError::OrderNotActive);
        }
        if order.is_expired_at(now) {
            return Err(EngineError::OrderExpired);
        }
        if order.owner == filler {
            return Err(EngineError::SelfTradeNotAllowed);
        }
        let (asset_id, owner, price) = (order.asset_id, order.owner, order.price_per_share);
        if shares == 0 || shares > order.remaining {
            return Err(EngineError::InvalidAmount);
        }
        self.registry.ensure_tradeable(asset_id)?;

        let cost = order_cost(price, shares).ok_or(EngineError::AmountOverflow)?;
        if payment < cost || self.cash.balance_of(filler) < cost {
            return Err(EngineError::InsufficientPayment);
        }
        let fee = fee_amount(cost, self.fee_bps);

        // -- effects ---------------------------------------------------------
        // Cash leg first: it is the only leg that can still fail (credit
        // overflow) and it is atomic on its own. The share leg cannot fail
        // afterwards since the hold covers `remaining >= shares`.
        self.cash.transfer_with_fee(filler, owner, cost, fee)?;
        self.shares.transfer_held(asset_id, owner, filler, shares)?;
        let order = self.book.get_mut(order_id).ok_or(EngineError::OrderNotFound)?;
        order.fill(shares);
        if !order.is_open() {
            self.book.note_closed();
        }
        self.events
            .append(EventKind::OrderFilled, asset_id, order_id, owner, filler, shares, cost, now);
        Ok(cost)
    }

    /// Fill (part of) an open buy order.
    ///
    /// Symmetric to [`Engine::fill_sell_order`]: the filler delivers
    /// `shares` to the order owner and receives the escrowed payment for
    /// that leg minus the platform fee.
    ///
    /// Returns the gross cost settled.
    pub fn fill_buy_order(
        &mut self,
        order_id: u64,
        filler: AccountId,
        shares: u64,
        now: u64,
    ) -> Result<Money, EngineError> {
        // -- checks ----------------------------------------------------------
        let order = self.book.get(order_id).ok_or(EngineError::OrderNotFound)?;
        if order.side() != Side::Buy || !order.is_open() {
            return Err(EngineError::OrderNotActive);
        }
        if order.is_expired_at(now) {
            return Err(EngineError::OrderExpired);
        }
        if order.owner == filler {
            return Err(EngineError::SelfTradeNotAllowed);
        }
        let (asset_id, owner, price) = (order.asset_id, order.owner, order.price_per_share);
        if shares == 0 || shares > order.remaining {
            return Err(EngineError::InvalidAmount);
        }
        self.registry.ensure_tradeable(asset_id)?;

        let cost = order_cost(price, shares).ok_or(EngineError::AmountOverflow)?;
        if self.shares.available_of(asset_id, filler) < shares {
            return Err(EngineError::InsufficientShares);
        }
        if self.cash.locked(LockKey::Order(order_id)) < cost {
            return Err(EngineError::InsufficientPayment);
        }
        let fee = fee_amount(cost, self.fee_bps);

        // -- effects ---------------------------------------------------------
        // Cash leg first (see fill_sell_order); the share leg is covered by
        // the available-balance check above.
        self.cash.unlock_to(LockKey::Order(order_id), filler, cost, fee)?;
        self.shares.transfer(asset_id, filler, owner, shares)?;
        let order = self.book.get_mut(order_id).ok_or(EngineError::OrderNotFound)?;
        order.fill(shares);
        if !order.is_open() {
            self.book.note_closed();
        }
        self.events
            .append(EventKind::OrderFilled, asset_id, order_id, owner, filler, shares, cost, now);
        Ok(cost)
    }

    /// Cancel an open order, releasing its remaining hold or escrow.
    ///
    /// Only the order owner may cancel (`NotAuthorized`). Works on an
    /// order that is past its expiry but not yet swept.
    pub fn cancel_order(
        &mut self,
        order_id: u64,
        caller: AccountId,
        now: u64,
    ) -> Result<(), EngineError> {
        let order = self.book.get(order_id).ok_or(EngineError::OrderNotFound)?;
        if order.owner != caller {
            return Err(EngineError::NotAuthorized);
        }
        if !order.is_open() {
            return Err(EngineError::OrderNotActive);
        }

        self.close_order(order_id, OrderStatus::Cancelled, now)
    }

    /// Lazy-expiry sweep: transition every due open order to `Expired`,
    /// releasing holds and escrow. Callable by anyone; returns the ids of
    /// the orders expired.
    pub fn sweep_expired(&mut self, now: u64) -> Vec<u64> {
        let due = self.book.expired_open_orders(now);
        for &order_id in &due {
            // Each order was selected as open; closing cannot fail
            let _ = self.close_order(order_id, OrderStatus::Expired, now);
        }
        due
    }

    /// Release an open order's backing resources and mark it terminal.
    fn close_order(
        &mut self,
        order_id: u64,
        status: OrderStatus,
        now: u64,
    ) -> Result<(), EngineError> {
        let order = self.book.get(order_id).ok_or(EngineError::OrderNotFound)?;
        let (asset_id, owner, side, remaining) =
            (order.asset_id, order.owner, order.side(), order.remaining);

        let refund = match side {
            Side::Sell => {
                if remaining > 0 {
                    self.shares.release_hold(asset_id, owner, remaining)?;
                }
                0
            }
            Side::Buy => {
                let escrow = self.cash.locked(LockKey::Order(order_id));
                if escrow > 0 {
                    self.cash.unlock_to(LockKey::Order(order_id), owner, escrow, 0)?;
                }
                escrow
            }
        };

        let order = self.book.get_mut(order_id).ok_or(EngineError::OrderNotFound)?;
        order.set_status(status);
        self.book.note_closed();

        let kind = match status {
            OrderStatus::Expired => EventKind::OrderExpired,
            _ => EventKind::OrderCancelled,
        };
        self.events
            .append(kind, asset_id, order_id, owner, 0, remaining, refund, now);
        Ok(())
    }

    // ========================================================================
    // Dividend operations
    // ========================================================================

    /// Create a dividend pool for an asset, escrowing `amount` from the
    /// admin's cash balance. Admin only; the asset must be active.
    ///
    /// The entitlement denominator is snapshotted from the asset's total
    /// share supply at this moment. Returns the pool id.
    pub fn distribute_dividends(
        &mut self,
        caller: AccountId,
        asset_id: AssetId,
        amount: Money,
        now: u64,
    ) -> Result<u64, EngineError> {
        self.require_admin(caller)?;
        let asset = self.registry.ensure_active(asset_id)?;
        let snapshot = asset.total_shares;
        if amount == 0 {
            return Err(EngineError::InvalidAmount);
        }
        if self.cash.balance_of(caller) < amount {
            return Err(EngineError::InsufficientPayment);
        }

        let pool_id = self.dividends.create_pool(asset_id, amount, snapshot, now)?;
        // Cannot fail: balance was checked above in the same serialized call
        self.cash.lock(caller, LockKey::Pool(pool_id), amount)?;
        self.events.append(
            EventKind::DividendPoolCreated,
            asset_id,
            pool_id,
            caller,
            0,
            snapshot,
            amount,
            now,
        );
        Ok(pool_id)
    }

    /// Entitlement of `owner` in a pool, from their share balance at the
    /// moment of calling. Pure query.
    pub fn claimable_amount(&self, pool_id: u64, owner: AccountId) -> Result<Money, EngineError> {
        let pool = self.dividends.get(pool_id)?;
        let balance = self.shares.balance_of(pool.asset_id, owner);
        self.dividends.claimable_amount(pool_id, balance)
    }

    /// Claim `owner`'s entitlement from a pool, exactly once per
    /// `(pool, owner)` pair. Returns the amount paid.
    pub fn claim_dividend(
        &mut self,
        pool_id: u64,
        owner: AccountId,
        now: u64,
    ) -> Result<Money, EngineError> {
        // -- checks ----------------------------------------------------------
        let pool = self.dividends.get(pool_id)?;
        let balance = self.shares.balance_of(pool.asset_id, owner);
        let asset_id = pool.asset_id;
        let amount = self.dividends.prepare_claim(pool_id, owner, balance)?;

        // -- effects ---------------------------------------------------------
        self.cash.unlock_to(LockKey::Pool(pool_id), owner, amount, 0)?;
        self.dividends.commit_claim(pool_id, owner, amount, now);
        self.events.append(
            EventKind::DividendClaimed,
            asset_id,
            pool_id,
            owner,
            0,
            balance,
            amount,
            now,
        );
        Ok(amount)
    }

    /// Claim from several pools. Each pool is settled independently: a
    /// failure on one id does not roll back or stop the others.
    pub fn batch_claim(
        &mut self,
        pool_ids: &[u64],
        owner: AccountId,
        now: u64,
    ) -> Vec<(u64, Result<Money, EngineError>)> {
        pool_ids
            .iter()
            .map(|&pool_id| (pool_id, self.claim_dividend(pool_id, owner, now)))
            .collect()
    }

    /// Deactivate a pool, stopping further claims (admin only)
    pub fn deactivate_pool(
        &mut self,
        caller: AccountId,
        pool_id: u64,
        now: u64,
    ) -> Result<(), EngineError> {
        self.require_admin(caller)?;
        self.dividends.deactivate(pool_id)?;
        let pool = self.dividends.get(pool_id)?;
        self.events.append(
            EventKind::DividendPoolClosed,
            pool.asset_id,
            pool_id,
            caller,
            0,
            0,
            pool.remaining(),
            now,
        );
        Ok(())
    }

    /// Sweep unclaimed funds from a pool back to the admin (admin only).
    ///
    /// Fails with `InvalidAmount` if `amount` exceeds the pool's
    /// undistributed remainder. Intended for use after a claim window,
    /// once the pool is deactivated.
    pub fn withdraw_unclaimed(
        &mut self,
        caller: AccountId,
        pool_id: u64,
        amount: Money,
        now: u64,
    ) -> Result<(), EngineError> {
        self.require_admin(caller)?;
        self.dividends.prepare_withdraw(pool_id, amount)?;
        let asset_id = self.dividends.get(pool_id)?.asset_id;

        self.cash.unlock_to(LockKey::Pool(pool_id), caller, amount, 0)?;
        self.dividends.commit_withdraw(pool_id, amount);
        self.events.append(
            EventKind::DividendSwept,
            asset_id,
            pool_id,
            caller,
            0,
            0,
            amount,
            now,
        );
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::money::to_money;

    const ADMIN: AccountId = 1;
    const ALICE: AccountId = 100;
    const BOB: AccountId = 200;
    const HOUR_MS: u64 = 3_600_000;

    fn money(s: &str) -> Money {
        to_money(s).unwrap()
    }

    /// Asset with 1000 shares issued to ALICE, trading enabled,
    /// BOB funded with 10_000.00 cash.
    fn setup() -> (Engine, AssetId) {
        let mut engine = Engine::new(ADMIN);
        let asset = engine
            .create_property(ADMIN, money("1000000.00"), 1000, 0)
            .unwrap();
        engine.issue_shares(ADMIN, asset, ALICE, 1000, 0).unwrap();
        engine.enable_trading(ADMIN, asset).unwrap();
        engine.deposit_cash(BOB, money("10000.00")).unwrap();
        (engine, asset)
    }

    #[test]
    fn test_admin_gating() {
        let mut engine = Engine::new(ADMIN);

        assert_eq!(
            engine.create_property(ALICE, money("1.00"), 10, 0),
            Err(EngineError::NotAuthorized)
        );
        assert_eq!(engine.set_fee_bps(ALICE, 0), Err(EngineError::NotAuthorized));
        assert_eq!(
            engine.withdraw_platform_fees(ALICE, 1, 0),
            Err(EngineError::NotAuthorized)
        );
    }

    #[test]
    fn test_issue_requires_full_supply() {
        let mut engine = Engine::new(ADMIN);
        let asset = engine
            .create_property(ADMIN, money("1000.00"), 1000, 0)
            .unwrap();

        assert_eq!(
            engine.issue_shares(ADMIN, asset, ALICE, 999, 0),
            Err(EngineError::InvalidAmount)
        );
        engine.issue_shares(ADMIN, asset, ALICE, 1000, 0).unwrap();
        assert_eq!(
            engine.issue_shares(ADMIN, asset, BOB, 1000, 0),
            Err(EngineError::AlreadyIssued)
        );
    }

    #[test]
    fn test_sell_order_requires_trading_enabled() {
        let mut engine = Engine::new(ADMIN);
        let asset = engine
            .create_property(ADMIN, money("1000.00"), 1000, 0)
            .unwrap();
        engine.issue_shares(ADMIN, asset, ALICE, 1000, 0).unwrap();

        assert_eq!(
            engine.create_sell_order(ALICE, asset, 100, money("5.00"), HOUR_MS, 0),
            Err(EngineError::TradingDisabled)
        );
    }

    #[test]
    fn test_sell_order_holds_shares() {
        let (mut engine, asset) = setup();

        engine
            .create_sell_order(ALICE, asset, 600, money("5.00"), HOUR_MS, 0)
            .unwrap();
        assert_eq!(engine.share_balance_of(asset, ALICE), 1000);
        assert_eq!(engine.available_shares_of(asset, ALICE), 400);

        // A second order exceeding the available balance is rejected
        assert_eq!(
            engine.create_sell_order(ALICE, asset, 500, money("5.00"), HOUR_MS, 0),
            Err(EngineError::InsufficientShares)
        );
    }

    #[test]
    fn test_buy_order_escrows_cash() {
        let (mut engine, asset) = setup();

        let id = engine
            .create_buy_order(BOB, asset, 100, money("5.00"), HOUR_MS, 0)
            .unwrap();
        assert_eq!(engine.cash_balance_of(BOB), money("9500.00"));
        assert_eq!(engine.cash().locked(LockKey::Order(id)), money("500.00"));

        // Cannot escrow more than the balance
        assert_eq!(
            engine.create_buy_order(BOB, asset, 10_000, money("5.00"), HOUR_MS, 0),
            Err(EngineError::InsufficientPayment)
        );
    }

    #[test]
    fn test_fill_sell_order_with_fee() {
        let (mut engine, asset) = setup();
        let id = engine
            .create_sell_order(ALICE, asset, 100, money("5.00"), HOUR_MS, 0)
            .unwrap();

        let cost = engine
            .fill_sell_order(id, BOB, 100, money("500.00"), 10)
            .unwrap();
        assert_eq!(cost, money("500.00"));

        // Shares moved, payment moved minus 1% fee
        assert_eq!(engine.share_balance_of(asset, ALICE), 900);
        assert_eq!(engine.share_balance_of(asset, BOB), 100);
        assert_eq!(engine.cash_balance_of(ALICE), money("495.00"));
        assert_eq!(engine.cash_balance_of(BOB), money("9500.00"));
        assert_eq!(engine.platform_fees(), money("5.00"));
        assert_eq!(engine.order(id).unwrap().status(), OrderStatus::Filled);
    }

    #[test]
    fn test_fill_sell_order_partial() {
        let (mut engine, asset) = setup();
        let id = engine
            .create_sell_order(ALICE, asset, 100, money("5.00"), HOUR_MS, 0)
            .unwrap();

        engine
            .fill_sell_order(id, BOB, 40, money("200.00"), 10)
            .unwrap();

        let order = engine.order(id).unwrap();
        assert!(order.is_open());
        assert_eq!(order.remaining, 60);
        assert_eq!(engine.share_balance_of(asset, BOB), 40);
        assert_eq!(engine.shares().held_of(asset, ALICE), 60);

        // Second taker finishes the order
        engine.deposit_cash(ADMIN, money("300.00")).unwrap();
        engine
            .fill_sell_order(id, ADMIN, 60, money("300.00"), 20)
            .unwrap();
        assert_eq!(engine.order(id).unwrap().status(), OrderStatus::Filled);
        assert_eq!(engine.shares().held_of(asset, ALICE), 0);
    }

    #[test]
    fn test_fill_sell_order_insufficient_payment_atomic() {
        let (mut engine, asset) = setup();
        let id = engine
            .create_sell_order(ALICE, asset, 100, money("5.00"), HOUR_MS, 0)
            .unwrap();

        let events_before = engine.events().len();

        // Offered payment short of the cost
        assert_eq!(
            engine.fill_sell_order(id, BOB, 100, money("499.99"), 10),
            Err(EngineError::InsufficientPayment)
        );
        // Filler balance short of the cost
        engine.deposit_cash(ALICE, money("1.00")).unwrap();
        assert_eq!(
            engine.fill_sell_order(id, ADMIN, 100, money("500.00"), 10),
            Err(EngineError::InsufficientPayment)
        );

        // Order and both parties untouched, nothing emitted
        assert_eq!(engine.order(id).unwrap().remaining, 100);
        assert_eq!(engine.share_balance_of(asset, BOB), 0);
        assert_eq!(engine.cash_balance_of(BOB), money("10000.00"));
        assert_eq!(engine.events().len(), events_before);
    }

    #[test]
    fn test_fill_sell_order_credit_overflow_atomic() {
        let (mut engine, asset) = setup();
        // Seller already sits at the u64 ceiling; crediting proceeds would
        // overflow, so the whole fill must be rejected with nothing moved
        engine.deposit_cash(ALICE, u64::MAX).unwrap();
        let id = engine
            .create_sell_order(ALICE, asset, 100, money("5.00"), HOUR_MS, 0)
            .unwrap();
        let events_before = engine.events().len();

        assert_eq!(
            engine.fill_sell_order(id, BOB, 100, money("500.00"), 10),
            Err(EngineError::AmountOverflow)
        );

        assert_eq!(engine.share_balance_of(asset, ALICE), 1000);
        assert_eq!(engine.share_balance_of(asset, BOB), 0);
        assert_eq!(engine.shares().held_of(asset, ALICE), 100);
        assert_eq!(engine.cash_balance_of(ALICE), u64::MAX);
        assert_eq!(engine.cash_balance_of(BOB), money("10000.00"));
        assert_eq!(engine.order(id).unwrap().remaining, 100);
        assert_eq!(engine.events().len(), events_before);
    }

    #[test]
    fn test_fill_buy_order_credit_overflow_atomic() {
        let (mut engine, asset) = setup();
        let id = engine
            .create_buy_order(BOB, asset, 100, money("5.00"), HOUR_MS, 0)
            .unwrap();
        // The filler's balance is at the ceiling; releasing the escrow to
        // them would overflow
        engine.deposit_cash(ALICE, u64::MAX).unwrap();
        let events_before = engine.events().len();

        assert_eq!(
            engine.fill_buy_order(id, ALICE, 100, 10),
            Err(EngineError::AmountOverflow)
        );

        assert_eq!(engine.share_balance_of(asset, ALICE), 1000);
        assert_eq!(engine.share_balance_of(asset, BOB), 0);
        assert_eq!(engine.cash().locked(LockKey::Order(id)), money("500.00"));
        assert_eq!(engine.order(id).unwrap().remaining, 100);
        assert_eq!(engine.events().len(), events_before);
    }

    #[test]
    fn test_self_trade_rejected() {
        let (mut engine, asset) = setup();
        engine.deposit_cash(ALICE, money("500.00")).unwrap();
        let id = engine
            .create_sell_order(ALICE, asset, 100, money("5.00"), HOUR_MS, 0)
            .unwrap();

        assert_eq!(
            engine.fill_sell_order(id, ALICE, 100, money("500.00"), 10),
            Err(EngineError::SelfTradeNotAllowed)
        );

        let buy = engine
            .create_buy_order(ALICE, asset, 10, money("5.00"), HOUR_MS, 0)
            .unwrap();
        assert_eq!(
            engine.fill_buy_order(buy, ALICE, 10, 10),
            Err(EngineError::SelfTradeNotAllowed)
        );
    }

    #[test]
    fn test_fill_buy_order() {
        let (mut engine, asset) = setup();
        let id = engine
            .create_buy_order(BOB, asset, 100, money("5.00"), HOUR_MS, 0)
            .unwrap();

        let cost = engine.fill_buy_order(id, ALICE, 100, 10).unwrap();
        assert_eq!(cost, money("500.00"));

        assert_eq!(engine.share_balance_of(asset, BOB), 100);
        assert_eq!(engine.share_balance_of(asset, ALICE), 900);
        // Seller receives the escrow minus the 1% fee
        assert_eq!(engine.cash_balance_of(ALICE), money("495.00"));
        assert_eq!(engine.platform_fees(), money("5.00"));
        assert_eq!(engine.cash().locked(LockKey::Order(id)), 0);
        assert_eq!(engine.order(id).unwrap().status(), OrderStatus::Filled);
    }

    #[test]
    fn test_fill_buy_order_partial_keeps_escrow() {
        let (mut engine, asset) = setup();
        let id = engine
            .create_buy_order(BOB, asset, 100, money("5.00"), HOUR_MS, 0)
            .unwrap();

        engine.fill_buy_order(id, ALICE, 30, 10).unwrap();

        assert_eq!(engine.order(id).unwrap().remaining, 70);
        assert_eq!(engine.cash().locked(LockKey::Order(id)), money("350.00"));
        assert_eq!(engine.share_balance_of(asset, BOB), 30);
    }

    #[test]
    fn test_fill_buy_order_filler_needs_shares() {
        let (mut engine, asset) = setup();
        let id = engine
            .create_buy_order(BOB, asset, 100, money("5.00"), HOUR_MS, 0)
            .unwrap();

        assert_eq!(
            engine.fill_buy_order(id, ADMIN, 100, 10),
            Err(EngineError::InsufficientShares)
        );
    }

    #[test]
    fn test_wrong_side_fill_rejected() {
        let (mut engine, asset) = setup();
        let sell = engine
            .create_sell_order(ALICE, asset, 100, money("5.00"), HOUR_MS, 0)
            .unwrap();
        let buy = engine
            .create_buy_order(BOB, asset, 10, money("5.00"), HOUR_MS, 0)
            .unwrap();

        assert_eq!(
            engine.fill_buy_order(sell, BOB, 10, 10),
            Err(EngineError::OrderNotActive)
        );
        assert_eq!(
            engine.fill_sell_order(buy, ALICE, 10, money("50.00"), 10),
            Err(EngineError::OrderNotActive)
        );
    }

    #[test]
    fn test_expired_fill_then_cancel() {
        let (mut engine, asset) = setup();
        let id = engine
            .create_sell_order(ALICE, asset, 100, money("5.00"), HOUR_MS, 0)
            .unwrap();

        // Two hours later the fill is rejected
        let later = 2 * HOUR_MS;
        assert_eq!(
            engine.fill_sell_order(id, BOB, 100, money("500.00"), later),
            Err(EngineError::OrderExpired)
        );

        // Owner cancel still works and releases the hold
        engine.cancel_order(id, ALICE, later).unwrap();
        assert_eq!(engine.order(id).unwrap().status(), OrderStatus::Cancelled);
        assert_eq!(engine.available_shares_of(asset, ALICE), 1000);
    }

    #[test]
    fn test_cancel_requires_owner() {
        let (mut engine, asset) = setup();
        let id = engine
            .create_sell_order(ALICE, asset, 100, money("5.00"), HOUR_MS, 0)
            .unwrap();

        assert_eq!(engine.cancel_order(id, BOB, 10), Err(EngineError::NotAuthorized));
        engine.cancel_order(id, ALICE, 10).unwrap();
        assert_eq!(
            engine.cancel_order(id, ALICE, 10),
            Err(EngineError::OrderNotActive)
        );
    }

    #[test]
    fn test_cancel_buy_order_refunds_escrow() {
        let (mut engine, asset) = setup();
        let id = engine
            .create_buy_order(BOB, asset, 100, money("5.00"), HOUR_MS, 0)
            .unwrap();
        engine.fill_buy_order(id, ALICE, 25, 10).unwrap();

        engine.cancel_order(id, BOB, 20).unwrap();

        // 125.00 was settled, the remaining 375.00 escrow returns
        assert_eq!(engine.cash().locked(LockKey::Order(id)), 0);
        assert_eq!(engine.cash_balance_of(BOB), money("9875.00"));
    }

    #[test]
    fn test_sweep_expired_releases_resources() {
        let (mut engine, asset) = setup();
        let sell = engine
            .create_sell_order(ALICE, asset, 100, money("5.00"), HOUR_MS, 0)
            .unwrap();
        let buy = engine
            .create_buy_order(BOB, asset, 50, money("4.00"), HOUR_MS / 2, 0)
            .unwrap();

        // Nothing due yet
        assert!(engine.sweep_expired(HOUR_MS / 4).is_empty());

        let swept = engine.sweep_expired(2 * HOUR_MS);
        assert_eq!(swept, vec![sell, buy]);
        assert_eq!(engine.order(sell).unwrap().status(), OrderStatus::Expired);
        assert_eq!(engine.order(buy).unwrap().status(), OrderStatus::Expired);
        assert_eq!(engine.available_shares_of(asset, ALICE), 1000);
        assert_eq!(engine.cash_balance_of(BOB), money("10000.00"));
        assert_eq!(engine.book().open_count(), 0);
    }

    #[test]
    fn test_fee_withdrawal() {
        let (mut engine, asset) = setup();
        let id = engine
            .create_sell_order(ALICE, asset, 100, money("5.00"), HOUR_MS, 0)
            .unwrap();
        engine
            .fill_sell_order(id, BOB, 100, money("500.00"), 10)
            .unwrap();

        assert_eq!(engine.platform_fees(), money("5.00"));
        engine.withdraw_platform_fees(ADMIN, money("5.00"), 20).unwrap();
        assert_eq!(engine.platform_fees(), 0);
        assert_eq!(engine.cash_balance_of(ADMIN), money("5.00"));

        assert_eq!(
            engine.withdraw_platform_fees(ADMIN, 1, 30),
            Err(EngineError::InsufficientPayment)
        );
    }

    #[test]
    fn test_dividend_pool_lifecycle() {
        let (mut engine, asset) = setup();
        engine.deposit_cash(ADMIN, money("1000.00")).unwrap();

        // Alice sells 250 shares to Bob before the pool exists
        let id = engine
            .create_sell_order(ALICE, asset, 250, money("5.00"), HOUR_MS, 0)
            .unwrap();
        engine
            .fill_sell_order(id, BOB, 250, money("1250.00"), 10)
            .unwrap();

        let pool = engine
            .distribute_dividends(ADMIN, asset, money("1000.00"), 20)
            .unwrap();

        assert_eq!(engine.claimable_amount(pool, ALICE).unwrap(), money("750.00"));
        assert_eq!(engine.claimable_amount(pool, BOB).unwrap(), money("250.00"));

        let paid = engine.claim_dividend(pool, BOB, 30).unwrap();
        assert_eq!(paid, money("250.00"));
        assert_eq!(
            engine.claim_dividend(pool, BOB, 40),
            Err(EngineError::AlreadyClaimed)
        );
        assert_eq!(
            engine.claim_dividend(pool, ADMIN, 40),
            Err(EngineError::NothingToClaim)
        );
    }

    #[test]
    fn test_live_balance_shifts_entitlement() {
        let (mut engine, asset) = setup();
        engine.deposit_cash(ADMIN, money("1000.00")).unwrap();
        let pool = engine
            .distribute_dividends(ADMIN, asset, money("1000.00"), 0)
            .unwrap();

        // Transfer after pool creation, before claiming: the buyer's live
        // balance carries this pool's entitlement with it
        let id = engine
            .create_sell_order(ALICE, asset, 400, money("5.00"), HOUR_MS, 0)
            .unwrap();
        engine
            .fill_sell_order(id, BOB, 400, money("2000.00"), 10)
            .unwrap();

        assert_eq!(engine.claimable_amount(pool, ALICE).unwrap(), money("600.00"));
        assert_eq!(engine.claimable_amount(pool, BOB).unwrap(), money("400.00"));
    }

    #[test]
    fn test_held_shares_still_earn_dividends() {
        let (mut engine, asset) = setup();
        engine.deposit_cash(ADMIN, money("1000.00")).unwrap();
        let pool = engine
            .distribute_dividends(ADMIN, asset, money("1000.00"), 0)
            .unwrap();

        // An open sell order does not reduce entitlement
        engine
            .create_sell_order(ALICE, asset, 999, money("5.00"), HOUR_MS, 0)
            .unwrap();
        assert_eq!(engine.claimable_amount(pool, ALICE).unwrap(), money("1000.00"));
    }

    #[test]
    fn test_batch_claim_independent() {
        let (mut engine, asset) = setup();
        engine.deposit_cash(ADMIN, money("300.00")).unwrap();
        let a = engine
            .distribute_dividends(ADMIN, asset, money("100.00"), 0)
            .unwrap();
        let b = engine
            .distribute_dividends(ADMIN, asset, money("100.00"), 0)
            .unwrap();
        let c = engine
            .distribute_dividends(ADMIN, asset, money("100.00"), 0)
            .unwrap();

        // Pre-claim pool b so the batch hits AlreadyClaimed in the middle
        engine.claim_dividend(b, ALICE, 10).unwrap();

        let results = engine.batch_claim(&[a, b, c, 999], ALICE, 20);
        assert_eq!(results[0], (a, Ok(money("100.00"))));
        assert_eq!(results[1], (b, Err(EngineError::AlreadyClaimed)));
        assert_eq!(results[2], (c, Ok(money("100.00"))));
        assert_eq!(results[3], (999, Err(EngineError::PoolNotFound)));
    }

    #[test]
    fn test_pool_requires_active_asset() {
        let (mut engine, asset) = setup();
        engine.deposit_cash(ADMIN, money("100.00")).unwrap();
        engine.deactivate_asset(ADMIN, asset).unwrap();

        assert_eq!(
            engine.distribute_dividends(ADMIN, asset, money("100.00"), 0),
            Err(EngineError::AssetInactive)
        );
    }

    #[test]
    fn test_withdraw_unclaimed_sweep() {
        let (mut engine, asset) = setup();
        engine.deposit_cash(ADMIN, money("1000.00")).unwrap();
        let pool = engine
            .distribute_dividends(ADMIN, asset, money("1000.00"), 0)
            .unwrap();

        // Alice moves 400 shares to Bob; only Bob claims
        let id = engine
            .create_sell_order(ALICE, asset, 400, money("5.00"), HOUR_MS, 0)
            .unwrap();
        engine
            .fill_sell_order(id, BOB, 400, money("2000.00"), 10)
            .unwrap();
        engine.claim_dividend(pool, BOB, 20).unwrap();

        engine.deactivate_pool(ADMIN, pool, 30).unwrap();
        assert_eq!(
            engine.claim_dividend(pool, ALICE, 40),
            Err(EngineError::PoolInactive)
        );

        // 600.00 unclaimed, cap enforced
        assert_eq!(
            engine.withdraw_unclaimed(ADMIN, pool, money("600.01"), 50),
            Err(EngineError::InvalidAmount)
        );
        let admin_before = engine.cash_balance_of(ADMIN);
        engine
            .withdraw_unclaimed(ADMIN, pool, money("600.00"), 50)
            .unwrap();
        assert_eq!(
            engine.cash_balance_of(ADMIN),
            admin_before + money("600.00")
        );
        assert_eq!(engine.cash().locked(LockKey::Pool(pool)), 0);

        // The mirror can tell the window close from the funds sweep
        let tail: Vec<(EventKind, Money)> = engine
            .events()
            .iter()
            .rev()
            .take(2)
            .map(|e| (e.kind(), e.amount))
            .collect();
        assert_eq!(
            tail,
            vec![
                (EventKind::DividendSwept, money("600.00")),
                (EventKind::DividendPoolClosed, money("600.00")),
            ]
        );
    }

    #[test]
    fn test_events_emitted_once_per_transition() {
        let (mut engine, asset) = setup();
        engine.deposit_cash(ADMIN, money("100.00")).unwrap();

        let sell = engine
            .create_sell_order(ALICE, asset, 100, money("5.00"), HOUR_MS, 0)
            .unwrap();
        engine
            .fill_sell_order(sell, BOB, 100, money("500.00"), 10)
            .unwrap();
        let pool = engine
            .distribute_dividends(ADMIN, asset, money("100.00"), 20)
            .unwrap();
        engine.claim_dividend(pool, BOB, 30).unwrap();

        let kinds: Vec<EventKind> = engine.events().iter().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::SharesIssued,
                EventKind::OrderCreated,
                EventKind::OrderFilled,
                EventKind::DividendPoolCreated,
                EventKind::DividendClaimed,
            ]
        );

        // Sequence numbers are gap-free
        for (i, event) in engine.events().iter().enumerate() {
            assert_eq!(event.seq, (i + 1) as u64);
        }
    }

    #[test]
    fn test_share_conservation_across_operations() {
        let (mut engine, asset) = setup();
        engine.deposit_cash(ADMIN, money("1000.00")).unwrap();

        let sell = engine
            .create_sell_order(ALICE, asset, 500, money("5.00"), HOUR_MS, 0)
            .unwrap();
        engine
            .fill_sell_order(sell, BOB, 200, money("1000.00"), 10)
            .unwrap();
        engine.cancel_order(sell, ALICE, 20).unwrap();
        let buy = engine
            .create_buy_order(BOB, asset, 100, money("4.00"), HOUR_MS, 30)
            .unwrap();
        engine.fill_buy_order(buy, ALICE, 100, 40).unwrap();

        assert_eq!(engine.shares().total_balance(asset), 1000);
        assert_eq!(engine.shares().issued_shares(asset), 1000);
    }
}
