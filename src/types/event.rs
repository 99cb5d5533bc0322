//! Event outbox for the off-chain mirror.
//!
//! Every committed state transition appends exactly one [`EventRecord`] to
//! the [`EventLog`]; failed operations append nothing. An external indexer
//! consumes the log to build query-optimized read models.
//!
//! ## Integrity
//!
//! Each record is SSZ-encoded and folded into a chained SHA-256 digest:
//!
//! ```text
//! digest_n = SHA-256(digest_{n-1} || ssz(record_n))
//! ```
//!
//! Two engines that applied the same operation sequence hold the same
//! digest, which lets a mirror verify it has not missed or reordered
//! events.

use sha2::{Digest, Sha256};
use ssz_rs::prelude::*;

use crate::types::asset::{AccountId, AssetId};
use crate::types::money::Money;

// ============================================================================
// EventKind enum
// ============================================================================

/// Discriminant for committed state transitions.
///
/// Represented as u8 for SSZ compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EventKind {
    /// Initial mint of an asset's full share supply
    #[default]
    SharesIssued,
    /// A buy or sell order entered the book
    OrderCreated,
    /// An order was partially or fully filled
    OrderFilled,
    /// An order was cancelled by its owner
    OrderCancelled,
    /// An order lapsed and its backing resources were released
    OrderExpired,
    /// A dividend pool was funded
    DividendPoolCreated,
    /// A shareholder claimed a dividend entitlement
    DividendClaimed,
    /// A dividend pool was deactivated (claim window closed)
    DividendPoolClosed,
    /// Unclaimed pool funds were swept back by the admin
    DividendSwept,
    /// Accrued platform fees were withdrawn by the admin
    PlatformFeesWithdrawn,
}

impl EventKind {
    /// Convert to u8 for serialization
    pub fn to_u8(self) -> u8 {
        match self {
            EventKind::SharesIssued => 0,
            EventKind::OrderCreated => 1,
            EventKind::OrderFilled => 2,
            EventKind::OrderCancelled => 3,
            EventKind::OrderExpired => 4,
            EventKind::DividendPoolCreated => 5,
            EventKind::DividendClaimed => 6,
            EventKind::DividendPoolClosed => 7,
            EventKind::DividendSwept => 8,
            EventKind::PlatformFeesWithdrawn => 9,
        }
    }

    /// Convert from u8 for deserialization
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(EventKind::SharesIssued),
            1 => Some(EventKind::OrderCreated),
            2 => Some(EventKind::OrderFilled),
            3 => Some(EventKind::OrderCancelled),
            4 => Some(EventKind::OrderExpired),
            5 => Some(EventKind::DividendPoolCreated),
            6 => Some(EventKind::DividendClaimed),
            7 => Some(EventKind::DividendPoolClosed),
            8 => Some(EventKind::DividendSwept),
            9 => Some(EventKind::PlatformFeesWithdrawn),
            _ => None,
        }
    }
}

// ============================================================================
// EventRecord struct
// ============================================================================

/// One committed transition, as a fixed-size SSZ container.
///
/// Field meaning depends on `kind`:
///
/// | kind                  | subject_id | account     | counterparty | shares        | amount         |
/// |-----------------------|------------|-------------|--------------|---------------|----------------|
/// | SharesIssued          | 0          | holder      | 0            | minted        | 0              |
/// | OrderCreated          | order id   | owner       | 0            | order shares  | escrowed cash  |
/// | OrderFilled           | order id   | owner       | filler       | filled shares | gross payment  |
/// | OrderCancelled        | order id   | owner       | 0            | released      | refunded cash  |
/// | OrderExpired          | order id   | owner       | 0            | released      | refunded cash  |
/// | DividendPoolCreated   | pool id    | admin       | 0            | snapshot      | pool total     |
/// | DividendClaimed       | pool id    | claimant    | 0            | balance used  | claimed amount |
/// | DividendPoolClosed    | pool id    | admin       | 0            | 0             | still escrowed |
/// | DividendSwept         | pool id    | admin       | 0            | 0             | swept amount   |
/// | PlatformFeesWithdrawn | 0          | admin       | 0            | 0             | withdrawn      |
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct EventRecord {
    /// Monotonic sequence number (gap-free, starting at 1)
    pub seq: u64,

    /// Event kind as u8
    pub kind_raw: u8,

    /// Asset the transition concerns (0 when not asset-scoped)
    pub asset_id: AssetId,

    /// Order or pool id the transition concerns (0 when none)
    pub subject_id: u64,

    /// Primary account of the transition
    pub account: AccountId,

    /// Counterparty account (0 when none)
    pub counterparty: AccountId,

    /// Share quantity moved or referenced
    pub shares: u64,

    /// Money amount moved or referenced (gross, before fees)
    pub amount: Money,

    /// Unix timestamp in milliseconds of the committing operation
    pub timestamp: u64,
}

impl EventRecord {
    /// Get the event kind
    pub fn kind(&self) -> EventKind {
        EventKind::from_u8(self.kind_raw).unwrap_or(EventKind::SharesIssued)
    }
}

// ============================================================================
// EventLog
// ============================================================================

/// Append-only outbox with a chained SHA-256 digest.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    records: Vec<EventRecord>,
    digest: [u8; 32],
    next_seq: u64,
}

impl EventLog {
    /// Create an empty log (digest all zeroes, sequence starts at 1)
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            digest: [0u8; 32],
            next_seq: 1,
        }
    }

    /// Append a record, assigning its sequence number and folding it into
    /// the digest. Called only after the corresponding state mutation has
    /// fully committed.
    #[allow(clippy::too_many_arguments)]
    pub fn append(
        &mut self,
        kind: EventKind,
        asset_id: AssetId,
        subject_id: u64,
        account: AccountId,
        counterparty: AccountId,
        shares: u64,
        amount: Money,
        timestamp: u64,
    ) -> &EventRecord {
        let record = EventRecord {
            seq: self.next_seq,
            kind_raw: kind.to_u8(),
            asset_id,
            subject_id,
            account,
            counterparty,
            shares,
            amount,
            timestamp,
        };
        self.next_seq += 1;

        // A silent fallback here would fold wrong bytes into the digest and
        // break mirror verification undetectably, so encoding failure is a
        // hard invariant violation.
        let encoded = ssz_rs::serialize(&record)
            .expect("EventRecord is a fixed-size SSZ container; encoding cannot fail");
        let mut hasher = Sha256::new();
        hasher.update(self.digest);
        hasher.update(&encoded);
        self.digest.copy_from_slice(&hasher.finalize());

        self.records.push(record);
        self.records.last().expect("record just pushed")
    }

    /// All records, oldest first
    #[inline]
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Number of committed events
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check whether any event has been committed
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Current chained digest
    #[inline]
    pub fn digest(&self) -> [u8; 32] {
        self.digest
    }

    /// Current chained digest as a hex string
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
