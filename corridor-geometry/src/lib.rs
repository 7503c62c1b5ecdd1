//! Computational-geometry primitives for junction analysis.
//!
//! Everything in this crate operates on plain `geo-types` values. The
//! network's native frame is geographic (lon/lat degrees); metric work
//! happens in a node-centered planar frame (see [`frame::LocalFrame`]).

pub mod angles;
pub mod buffer;
pub mod frame;
pub mod polyline;

pub use frame::LocalFrame;
