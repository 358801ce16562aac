//! Payload schemas and the event-id registry that selects them.
//!
//! The record header is self-describing but the payload is not: its layout
//! is implied by the event id. A [`SchemaRegistry`] maps event ids to a
//! [`Schema`], with an optional fallback applied to every unregistered id.

use crate::record::FieldKind;
use std::collections::HashMap;

/// Ordered list of field kinds making up a payload
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    fields: Vec<FieldKind>,
}

impl Schema {
    /// Creates a schema from the given field kinds
    pub fn new(fields: impl Into<Vec<FieldKind>>) -> Self {
        Self {
            fields: fields.into(),
        }
    }

    /// A schema with no fields; only an empty payload matches it
    pub fn empty() -> Self {
        Self::default()
    }

    /// The layout written by the stock instrumentation: a short followed by a string
    pub fn short_and_string() -> Self {
        Self::new([FieldKind::FixedInt16, FieldKind::CString])
    }

    /// Field kinds in wire order
    pub fn fields(&self) -> &[FieldKind] {
        &self.fields
    }

    /// Smallest payload that can satisfy this schema
    pub fn min_len(&self) -> usize {
        self.fields
            .iter()
            .map(|kind| kind.fixed_size().unwrap_or(1))
            .sum()
    }
}

/// Maps event ids to payload schemas
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRegistry {
    schemas: HashMap<i16, Schema>,
    fallback: Option<Schema>,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self {
            schemas: HashMap::new(),
            fallback: Some(Schema::short_and_string()),
        }
    }
}

impl SchemaRegistry {
    /// Creates a registry that decodes every event id with the default schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with no fallback: unregistered ids are rejected
    pub fn strict() -> Self {
        Self {
            schemas: HashMap::new(),
            fallback: None,
        }
    }

    /// Registers the schema for an event id
    pub fn register(mut self, event_id: i16, schema: Schema) -> Self {
        self.schemas.insert(event_id, schema);
        self
    }

    /// Sets the schema used for event ids with no registration
    pub fn fallback(mut self, schema: Option<Schema>) -> Self {
        self.fallback = schema;
        self
    }

    /// Looks up the schema for an event id
    pub fn lookup(&self, event_id: i16) -> Option<&Schema> {
        self.schemas.get(&event_id).or(self.fallback.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_registry_falls_back() {
        let registry = SchemaRegistry::new();
        assert_eq!(registry.lookup(1), Some(&Schema::short_and_string()));
        assert_eq!(registry.lookup(-42), Some(&Schema::short_and_string()));
    }

    #[test]
    fn test_strict_registry() {
        let registry = SchemaRegistry::strict().register(3, Schema::new([FieldKind::FixedInt32]));
        assert_eq!(registry.lookup(3), Some(&Schema::new([FieldKind::FixedInt32])));
        assert!(registry.lookup(1).is_none());
    }

    #[test]
    fn test_registration_overrides_fallback() {
        let registry = SchemaRegistry::new().register(7, Schema::empty());
        assert_eq!(registry.lookup(7), Some(&Schema::empty()));
        assert_eq!(registry.lookup(8), Some(&Schema::short_and_string()));
    }

    #[test]
    fn test_min_len() {
        assert_eq!(Schema::short_and_string().min_len(), 3);
        assert_eq!(Schema::empty().min_len(), 0);
    }
}
