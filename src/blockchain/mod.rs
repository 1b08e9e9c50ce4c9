pub mod block;
pub mod model;

pub use block::{Block, BlockHeader};
pub use model::{AuthPredicate, Ledger, LedgerError, SharedLedger};

/// Smallest indivisible units per whole coin.
pub const COIN: u64 = 100_000_000;

/// Compact difficulty value stamped into every header. Recorded for wire
/// compatibility; the proof-of-work threshold itself is fixed.
pub const DIFFICULTY_BITS: u32 = 0x1f00ffff;
