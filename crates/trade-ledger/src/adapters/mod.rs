//! # Adapters Layer
//!
//! Concrete implementations of the outbound ports: state stores and clocks.

pub mod clock;
pub mod storage;

pub use clock::{FixedClock, SystemClock};
pub use storage::{FileStateStore, InMemoryStateStore};
