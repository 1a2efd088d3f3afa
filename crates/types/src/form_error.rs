//! Nested form errors.
//!
//! Errors mirror the shape of the form value: a leaf is a message, an object carries an
//! optional non-field message plus per-key children. Lookups are one key at a time and a
//! missing key means "no error".

use indexmap::IndexMap;
use serde::Serialize;

/// Error attached to a form value or one of its subtrees.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FormError {
    Message(String),
    Object(ObjectError),
}

/// Error for an object-shaped value.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ObjectError {
    /// Message about the object as a whole rather than one of its fields.
    #[serde(rename = "$internal", skip_serializing_if = "Option::is_none")]
    pub internal: Option<String>,
    #[serde(flatten)]
    pub fields: IndexMap<String, FormError>,
}

impl ObjectError {
    pub fn field(&self, key: &str) -> Option<&FormError> {
        self.fields.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.internal.is_none() && self.fields.is_empty()
    }

    /// Records `error` under `key`, replacing any previous error.
    pub fn insert(&mut self, key: impl Into<String>, error: FormError) {
        self.fields.insert(key.into(), error);
    }
}

impl FormError {
    pub fn message(text: impl Into<String>) -> Self {
        Self::Message(text.into())
    }

    /// Child error under `key`. Leaves have no children.
    pub fn field(&self, key: &str) -> Option<&FormError> {
        match self {
            Self::Message(_) => None,
            Self::Object(object) => object.field(key),
        }
    }

    /// The message describing this node itself.
    pub fn own_message(&self) -> Option<&str> {
        match self {
            Self::Message(text) => Some(text.as_str()),
            Self::Object(object) => object.internal.as_deref(),
        }
    }

    /// Number of leaf messages in this subtree, counting non-field messages.
    pub fn count(&self) -> usize {
        match self {
            Self::Message(_) => 1,
            Self::Object(object) => usize::from(object.internal.is_some()) + object.fields.values().map(FormError::count).sum::<usize>(),
        }
    }
}

/// Normalizes an error into object form.
///
/// A bare message becomes an object whose non-field message is that text, so renderers can
/// always query fields without matching on the variant first.
pub fn error_object(error: Option<&FormError>) -> Option<ObjectError> {
    match error? {
        FormError::Message(text) => Some(ObjectError {
            internal: Some(text.clone()),
            fields: IndexMap::new(),
        }),
        FormError::Object(object) => Some(object.clone()),
    }
}
