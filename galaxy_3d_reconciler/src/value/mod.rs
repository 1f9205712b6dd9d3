//! Dynamic value model
//!
//! Declared props and native object fields share one representation,
//! [`Value`]. Math-like values (vectors, eulers, quaternions, colors) carry
//! [`Capabilities`] that the prop engine uses to mutate them in place.

mod value;
mod color;

pub use value::{Value, ValueCategory, Capabilities, EqualityMode, ArrayEquality, ObjectEquality, Map};
pub use color::{parse_color, color_from_hex};
