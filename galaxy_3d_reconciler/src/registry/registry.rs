/// Tag name to native constructor catalogue.
///
/// Registration is additive for the registry's lifetime; there is no removal.
/// Resolution converts a declared tag to its canonical type name (first
/// character upper-cased) before lookup.

use std::cell::RefCell;
use std::rc::Rc;
use rustc_hash::FxHashMap;
use crate::error::{log_and_return_error, Error, Result};
use crate::scene::{register_builtins, NativeObject};
use crate::value::Value;

/// Builds a native object from constructor arguments (`args` prop)
pub type Constructor = Rc<dyn Fn(&[Value]) -> Result<NativeObject>>;

/// Extendable catalogue of native types
#[derive(Default)]
pub struct Registry {
    constructors: RefCell<FxHashMap<String, Constructor>>,
    /// Zero-argument instances, built lazily once per type
    defaults: RefCell<FxHashMap<String, Rc<NativeObject>>>,
}

impl Registry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in catalogue
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        register_builtins(&registry);
        registry
    }

    /// Canonical name form used as catalogue key: `mesh` -> `Mesh`
    pub fn canonical_name(tag: &str) -> String {
        let mut chars = tag.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// Merge a constructor into the catalogue
    ///
    /// A later registration under the same canonical name replaces the
    /// earlier one (and its cached default).
    pub fn register<F>(&self, name: &str, constructor: F)
    where
        F: Fn(&[Value]) -> Result<NativeObject> + 'static,
    {
        let canonical = Self::canonical_name(name);
        self.defaults.borrow_mut().remove(&canonical);
        self.constructors.borrow_mut().insert(canonical, Rc::new(constructor));
    }

    /// Merge several constructors at once
    pub fn extend(&self, entries: impl IntoIterator<Item = (String, Constructor)>) {
        for (name, constructor) in entries {
            let canonical = Self::canonical_name(&name);
            self.defaults.borrow_mut().remove(&canonical);
            self.constructors.borrow_mut().insert(canonical, constructor);
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.constructors.borrow().contains_key(&Self::canonical_name(tag))
    }

    /// Registered canonical names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.constructors.borrow().keys().cloned().collect();
        names.sort();
        names
    }

    /// Look up the constructor for a declared tag
    pub fn resolve(&self, tag: &str) -> Result<Constructor> {
        self.constructors
            .borrow()
            .get(&Self::canonical_name(tag))
            .cloned()
            .ok_or_else(|| {
                log_and_return_error("galaxy3d::Registry", Error::UnknownType(tag.to_string()))
            })
    }

    /// Resolve and run the constructor
    pub fn construct(&self, tag: &str, args: &[Value]) -> Result<NativeObject> {
        let constructor = self.resolve(tag)?;
        constructor(args)
    }

    /// Default value of `field` on a zero-argument instance of `type_name`
    ///
    /// Returns `Ok(None)` when the default instance has no such field.
    /// Fails if the type is unknown or cannot be built without arguments.
    pub fn default_field(&self, type_name: &str, field: &str) -> Result<Option<Value>> {
        let canonical = Self::canonical_name(type_name);
        let cached = self.defaults.borrow().get(&canonical).cloned();
        let object = match cached {
            Some(object) => object,
            None => {
                let object = Rc::new(self.construct(&canonical, &[])?);
                crate::engine_trace!(
                    "galaxy3d::Registry",
                    "Cached default instance for {}",
                    canonical
                );
                self.defaults.borrow_mut().insert(canonical, object.clone());
                object
            }
        };
        Ok(object.get(field).cloned())
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
