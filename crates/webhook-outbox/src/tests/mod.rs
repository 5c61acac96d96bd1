//! Behavioural tests for the outbox.
//!
//! - `harness.rs`  - Scripted mock transport
//! - `delivery.rs` - Per-tick outcomes and limiter charging
//! - `ordering.rs` - FIFO delivery and head-of-line retry
//! - `pipeline.rs` - Background tasks end to end, on a paused clock

mod pipeline;
