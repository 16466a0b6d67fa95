//! Utility types used throughout the crate:
//!
//! - [`Error`] / [`Result`] - Error handling
//! - Math type re-exports from glam

mod error;
pub mod math;

pub use error::*;
