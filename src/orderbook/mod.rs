//! Order book module.
//!
//! ## Architecture
//!
//! The book is an order-taking venue with slab-based storage:
//!
//! - **Slab-based storage**: O(1) order insertion and lookup
//! - **Id index**: order id to slab key mapping
//! - **No matching queue**: fills target a specific order id, so there is
//!   no price-time priority structure to maintain
//!
//! Settlement (validation, share and cash movement, fees) lives in
//! [`crate::engine`]; the book owns storage and the order state machine.
//!
//! | Operation            | Complexity |
//! |----------------------|------------|
//! | Insert order         | O(1)       |
//! | Lookup by id         | O(1)       |
//! | Expiry sweep scan    | O(n)       |

pub mod book;

pub use book::OrderBook;
