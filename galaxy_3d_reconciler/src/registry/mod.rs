//! Type registry
//!
//! Maps declared tags to constructible native types.

mod registry;

pub use registry::{Constructor, Registry};
