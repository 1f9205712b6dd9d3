/// Prop diffing: which declared props need to be (re)applied.

use crate::instance::Props;
use crate::value::{EqualityMode, Value};
use super::keys::{classify, PropKind};

/// One prop to apply
#[derive(Debug, Clone)]
pub struct PropChange {
    pub key: String,
    pub value: Value,
    pub kind: PropKind,
}

impl PropChange {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        let key = key.into();
        let kind = classify(&key);
        Self { key, value, kind }
    }
}

/// Result of a diff: changed props in application order, plus the props to memoize
#[derive(Debug, Clone, Default)]
pub struct PropDiff {
    pub memoized: Props,
    pub changes: Vec<PropChange>,
}

impl PropDiff {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn keys(&self) -> Vec<&str> {
        self.changes.iter().map(|c| c.key.as_str()).collect()
    }
}

/// Diff settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffOptions {
    /// Props missing from the new declaration are reset to their defaults
    pub reset_removed: bool,
    pub equality: EqualityMode,
}

/// Compute the changes turning `old` into `new`
///
/// Reserved keys never appear. Unchanged values are skipped. When a key
/// changes, every declared `key-*` path is re-applied after it, as are the
/// paths sharing its first segment, so a partial update never leaves a
/// stale sibling. Each key appears once, at its last position.
pub fn diff_props(new: &Props, old: &Props, options: DiffOptions) -> PropDiff {
    let mut entries: Vec<(&str, Value)> = Vec::new();
    if options.reset_removed {
        for key in old.keys() {
            if !new.contains_key(key) && !matches!(classify(key), PropKind::Reserved) {
                entries.push((key.as_str(), Value::UseDefault));
            }
        }
    }
    for (key, value) in new {
        if !matches!(classify(key), PropKind::Reserved) {
            entries.push((key.as_str(), value.clone()));
        }
    }

    let mut changes: Vec<PropChange> = Vec::new();
    for (key, value) in entries {
        if old.get(key).is_some_and(|previous| value.equals(previous, options.equality)) {
            continue;
        }
        let change = PropChange::new(key, value);
        let is_field = change.kind == PropKind::Field;
        changes.push(change);
        if !is_field {
            continue;
        }

        let pierced = format!("{}-", key);
        for (prop, value) in new {
            if prop.starts_with(&pierced) {
                changes.push(PropChange::new(prop.as_str(), value.clone()));
            }
        }
        if let Some((prefix, _)) = key.split_once('-') {
            let siblings = format!("{}-", prefix);
            for (prop, value) in new {
                if prop != key && prop.starts_with(&siblings) {
                    changes.push(PropChange::new(prop.as_str(), value.clone()));
                }
            }
        }
    }

    PropDiff { memoized: new.clone(), changes: dedupe_keep_last(changes) }
}

fn dedupe_keep_last(changes: Vec<PropChange>) -> Vec<PropChange> {
    let mut seen = rustc_hash::FxHashSet::default();
    let mut kept: Vec<PropChange> = changes
        .into_iter()
        .rev()
        .filter(|change| seen.insert(change.key.clone()))
        .collect();
    kept.reverse();
    kept
}

#[cfg(test)]
#[path = "diff_tests.rs"]
mod tests;
