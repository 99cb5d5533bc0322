//! Brickshare - Binary Entry Point
//!
//! Walks one property through its full lifecycle: fractionalization,
//! issuance, a peer-to-peer trade, and a dividend round.

use brickshare::engine::Engine;
use brickshare::types::money::{from_money_trimmed, to_money};

const ADMIN: u64 = 1;
const ALICE: u64 = 100;
const BOB: u64 = 200;
const HOUR_MS: u64 = 3_600_000;

fn main() {
    println!("===========================================");
    println!("  Brickshare - Fractional Property Engine");
    println!("===========================================");
    println!();

    let mut engine = Engine::new(ADMIN);
    let mut now = 1_703_577_600_000u64; // ms

    // Fractionalize a 1,000,000.00 property into 1000 shares
    println!("Fractionalizing property...");
    let asset = engine
        .create_property(ADMIN, to_money("1000000.00").unwrap(), 1000, now)
        .expect("create property");
    engine
        .issue_shares(ADMIN, asset, ALICE, 1000, now)
        .expect("issue shares");
    engine.enable_trading(ADMIN, asset).expect("enable trading");
    println!("  Asset id: {}", asset);
    println!(
        "  Value per share: {}",
        from_money_trimmed(engine.asset(asset).expect("asset").value_per_share())
    );
    println!("  Alice holds: {} shares", engine.share_balance_of(asset, ALICE));
    println!();

    // Alice lists 100 shares at 5.00, Bob takes the whole order
    println!("Trading 100 shares at 5.00...");
    now += 1000;
    engine
        .deposit_cash(BOB, to_money("500.00").unwrap())
        .expect("deposit");
    let order = engine
        .create_sell_order(ALICE, asset, 100, to_money("5.00").unwrap(), HOUR_MS, now)
        .expect("sell order");
    now += 1000;
    let cost = engine
        .fill_sell_order(order, BOB, 100, to_money("500.00").unwrap(), now)
        .expect("fill");
    println!("  Order {} settled for {}", order, from_money_trimmed(cost));
    println!(
        "  Alice: {} shares, {} cash",
        engine.share_balance_of(asset, ALICE),
        from_money_trimmed(engine.cash_balance_of(ALICE))
    );
    println!(
        "  Bob:   {} shares, {} cash",
        engine.share_balance_of(asset, BOB),
        from_money_trimmed(engine.cash_balance_of(BOB))
    );
    println!(
        "  Platform fees accrued: {}",
        from_money_trimmed(engine.platform_fees())
    );
    println!();

    // Distribute 1000.00 of rental income and claim both entitlements
    println!("Distributing 1000.00 rental income...");
    now += 1000;
    engine
        .deposit_cash(ADMIN, to_money("1000.00").unwrap())
        .expect("fund admin");
    let pool = engine
        .distribute_dividends(ADMIN, asset, to_money("1000.00").unwrap(), now)
        .expect("create pool");
    now += 1000;
    let alice_paid = engine.claim_dividend(pool, ALICE, now).expect("alice claim");
    let bob_paid = engine.claim_dividend(pool, BOB, now).expect("bob claim");
    println!("  Alice claimed: {}", from_money_trimmed(alice_paid));
    println!("  Bob claimed:   {}", from_money_trimmed(bob_paid));
    println!();

    println!("Event log: {} events", engine.events().len());
    for event in engine.events() {
        println!(
            "  #{} {:?} asset={} subject={} shares={} amount={}",
            event.seq,
            event.kind(),
            event.asset_id,
            event.subject_id,
            event.shares,
            from_money_trimmed(event.amount)
        );
    }
    println!();
    println!("Chained digest: {}", hex::encode(engine.event_digest()));
}
