//! Retry policy for transport failures
//!
//! Only failures that cannot have delivered the request twice are retried:
//! connection establishment errors and resets before any response byte
//! arrived. Attempts follow each other without delay; callers wanting
//! backoff wrap the call themselves.

pub mod policy;

pub use policy::{RetryDecision, RetryPolicy};
