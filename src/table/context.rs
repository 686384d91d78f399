use crate::{Item, TableAttribute};
use std::sync::Arc;

/// Ambient properties applied to every item written through a [`Table`](crate::Table).
///
/// A context is an immutable snapshot. Changing it produces a new snapshot and leaves
/// tables that already hold the old one untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    values: Arc<Item>,
}

impl Context {
    pub fn new(values: Item) -> Self {
        Self {
            values: Arc::new(values),
        }
    }

    pub fn get(&self, name: &str) -> Option<&TableAttribute> {
        self.values.get(name)
    }

    pub fn values(&self) -> &Item {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// A new snapshot with `overrides` replacing same-named values.
    pub fn with(&self, overrides: Item) -> Self {
        let mut values = (*self.values).clone();
        values.extend(overrides);
        Self::new(values)
    }

    /// Shallow-merge the context into `properties`. Values already present win.
    pub fn apply_to(&self, properties: &mut Item) {
        for (name, value) in self.values.iter() {
            properties
                .entry(name.clone())
                .or_insert_with(|| value.clone());
        }
    }
}

impl From<Item> for Context {
    fn from(values: Item) -> Self {
        Self::new(values)
    }
}
