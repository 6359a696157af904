//! Idempotency Keys
//!
//! Guards side-effecting operations (ride requests, charges) against replays:
//! the first claim of an operation key inside its TTL wins, every later claim
//! is reported as a duplicate. The claim is a single atomic
//! `SET key value NX EX ttl`, so concurrent claims across processes resolve to
//! exactly one winner.

pub mod gate;
pub mod types;

pub use gate::IdempotencyGate;
pub use types::{ClaimOutcome, OperationKey};
