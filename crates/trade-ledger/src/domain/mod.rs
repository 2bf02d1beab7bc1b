//! # Domain Layer
//!
//! Pure trade-ledger logic: entities, validation, the record codec and the
//! error taxonomy.
//!
//! ## Hexagonal Architecture
//!
//! This module contains NO I/O dependencies. All external interactions
//! are abstracted through ports in the `ports` module.

pub mod codec;
pub mod entities;
pub mod errors;
pub mod validation;
pub mod value_objects;

pub use codec::*;
pub use entities::*;
pub use errors::*;
pub use validation::*;
pub use value_objects::*;
