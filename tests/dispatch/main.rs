//! Dispatcher Integration Tests
//!
//! End-to-end behaviour of the dispatcher over the in-memory backend: retry
//! under connection failures, overflow, drain barriers, stop modes,
//! connection recycling and the blocking GET.

#[path = "../common/mod.rs"]
mod common;

mod blocking;
mod drain;
mod overflow;
mod recycling;
mod stop;
