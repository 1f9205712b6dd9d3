//! Instances and the mutation API
//!
//! An [`Instance`] wraps one native object for the reconciler. The tree
//! operations (create, append, insert, remove, switch, update) live on
//! [`Root`](crate::root::Root), which owns both the instances and the
//! objects they wrap.

mod instance;
mod attach;
mod mutation;

pub use instance::{AttachFn, Attachment, DetachFn, Instance, InstanceKey, Props, UpdateHook};
pub use mutation::{UpdatePayload, PRIMITIVE_TAG};
