//! Core module wiring: errors, numeric capability, GSO access, and shared types.

pub mod error;
pub mod gso;
pub mod numeric;
pub mod types;

pub use error::*;
pub use gso::*;
pub use numeric::*;
pub use types::*;
