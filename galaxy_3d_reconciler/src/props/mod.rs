//! Prop engine
//!
//! Diffing of declared props against the memoized ones, and type-aware
//! application of the changes onto native objects.

mod keys;
mod diff;
mod apply;

pub use keys::{classify, is_handler_key, is_reserved, PropKind, RESERVED_KEYS, UPDATE_HOOK_KEY};
pub use diff::{diff_props, DiffOptions, PropChange, PropDiff};
pub use apply::{read_path, resolve_path, write_path, PropTarget, Segment};
pub(crate) use apply::replace_path;
