//! Concurrency primitives for kvrelay
//!
//! This crate provides the two synchronisation building blocks shared by the
//! dispatcher threads:
//! - BoundedQueue: a blocking FIFO with an optional capacity and a run-time
//!   overflow policy
//! - StopToken: a cancellation token that worker loops poll and wait on

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod queue;
pub mod stop;

pub use queue::{BoundedQueue, OverflowPolicy, QueueStats};
pub use stop::StopToken;
