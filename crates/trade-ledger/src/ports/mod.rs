//! # Ports Layer
//!
//! Hexagonal architecture ports (interfaces) for the trade ledger.
//!
//! - **Driving Ports (Inbound)**: the API consumed by the invocation
//!   handler, the node and extension collaborators.
//! - **Driven Ports (Outbound)**: the state store, the clock and the
//!   extension SPI, implemented by adapters.

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
