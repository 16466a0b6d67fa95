//! Math type re-exports.
//!
//! Re-exports the `glam` types appearing in this crate's public API so
//! downstream code does not need its own glam version pin.

pub use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};
