//! Key-scoped form state.
//!
//! A form value is an insertion-ordered map. [`ObjectScope`] gives one key of that map its own
//! `(value, error, set)` view: the scoped setter rebuilds the parent map with only that key
//! changed and hands it to the parent callback, so nested editors never compute paths.

use std::fmt;

use deep_types::FormError;
use indexmap::IndexMap;

/// Form value keyed by field name, in insertion order.
pub type FormObject<V> = IndexMap<String, V>;

/// A scoped update: a new value or a function of the previous one.
///
/// `None` removes the key from the parent object.
pub enum SetValue<V> {
    Replace(Option<V>),
    Update(Box<dyn FnOnce(Option<&V>) -> Option<V>>),
}

impl<V> SetValue<V> {
    pub fn update(updater: impl FnOnce(Option<&V>) -> Option<V> + 'static) -> Self {
        Self::Update(Box::new(updater))
    }

    /// Resolves the update against the previous value.
    pub fn resolve(self, previous: Option<&V>) -> Option<V> {
        match self {
            Self::Replace(value) => value,
            Self::Update(updater) => updater(previous),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for SetValue<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace(value) => f.debug_tuple("Replace").field(value).finish(),
            Self::Update(_) => f.write_str("Update(..)"),
        }
    }
}

/// Returns a copy of `object` with `key` set to the resolved update.
///
/// Existing keys keep their position; new keys are appended; removals preserve the order of
/// the remaining keys.
pub fn set_object_value<V: Clone>(object: &FormObject<V>, key: &str, value: SetValue<V>) -> FormObject<V> {
    let mut next = object.clone();
    match value.resolve(object.get(key)) {
        Some(value) => {
            next.insert(key.to_string(), value);
        }
        None => {
            next.shift_remove(key);
        }
    }
    next
}

/// One key's view of a parent form object.
pub struct ObjectScope<'a, V> {
    key: String,
    parent_value: &'a FormObject<V>,
    parent_error: Option<&'a FormError>,
    on_change: &'a mut dyn FnMut(FormObject<V>),
}

impl<'a, V: Clone> ObjectScope<'a, V> {
    pub fn new(key: impl Into<String>, parent_value: &'a FormObject<V>, on_change: &'a mut dyn FnMut(FormObject<V>)) -> Self {
        Self {
            key: key.into(),
            parent_value,
            parent_error: None,
            on_change,
        }
    }

    /// Attaches the parent's error tree; [`ObjectScope::error`] then yields this key's subtree.
    pub fn with_error(mut self, parent_error: Option<&'a FormError>) -> Self {
        self.parent_error = parent_error;
        self
    }

    pub fn name(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> Option<&'a V> {
        self.parent_value.get(&self.key)
    }

    /// Error for this key only. A missing key or a leaf parent error yields `None`.
    pub fn error(&self) -> Option<&'a FormError> {
        self.parent_error.and_then(|error| error.field(&self.key))
    }

    /// Propagates an update of this key to the parent.
    pub fn set(&mut self, value: SetValue<V>) {
        let next = set_object_value(self.parent_value, &self.key, value);
        (self.on_change)(next);
    }
}
