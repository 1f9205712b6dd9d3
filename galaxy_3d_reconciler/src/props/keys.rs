/// Prop key classification.

use crate::events::HandlerKind;

/// Keys consumed by the reconciler itself, never written to fields
pub const RESERVED_KEYS: [&str; 9] = [
    "args",
    "object",
    "attach",
    "attachArray",
    "attachObject",
    "dispose",
    "children",
    "key",
    "ref",
];

/// Post-update hook prop
pub const UPDATE_HOOK_KEY: &str = "onUpdate";

const HANDLER_PREFIXES: [&str; 5] = ["Pointer", "Click", "DoubleClick", "ContextMenu", "Wheel"];

/// What a declared prop key addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropKind {
    Reserved,
    /// `on(Pointer|Click|DoubleClick|ContextMenu|Wheel)*`; `None` for names
    /// following the convention that no handler kind matches
    Handler(Option<HandlerKind>),
    UpdateHook,
    /// Plain or dash-separated field path
    Field,
}

pub fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// Event handler naming convention
pub fn is_handler_key(key: &str) -> bool {
    key.strip_prefix("on")
        .is_some_and(|rest| HANDLER_PREFIXES.iter().any(|prefix| rest.starts_with(prefix)))
}

pub fn classify(key: &str) -> PropKind {
    if is_reserved(key) {
        PropKind::Reserved
    } else if key == UPDATE_HOOK_KEY {
        PropKind::UpdateHook
    } else if is_handler_key(key) {
        PropKind::Handler(HandlerKind::from_prop_name(key))
    } else {
        PropKind::Field
    }
}
