// Message-definition IR produced by inference and consumed by codegen.
// No serde_json::Value here.

use std::fmt;
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    String,
    Int32,
    Int64,
    Uint64,
    Float,                   // value survives a round trip through f32
    Double,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum FieldType {
    Scalar(ScalarType),
    Message(String),         // reference by name into the same SchemaSet
    Opaque(&'static str),    // best-effort: the JSON type name of the value
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDecl {
    pub name: String,
    pub ty: FieldType,
    pub number: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MessageDef {
    pub name: String,
    pub fields: Vec<FieldDecl>,  // discovery order, numbers strictly increasing
}

/// Why a key produced no field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Unsupported {
    Array,
    /// Integer with no signed width that can hold it (beyond `i64`).
    UntypedInteger,
    /// Counter ran past the largest proto3 field number.
    FieldNumberExhausted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Omission {
    pub message: String,
    pub key: String,
    pub number: Option<u32>, // the number this key consumed; None once exhausted
    pub reason: Unsupported,
}

/// Flat, ordered namespace of every message discovered during one inference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaSet {
    pub messages: IndexMap<String, MessageDef>,
    pub omissions: Vec<Omission>,
    pub collisions: Vec<String>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl MessageDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), fields: Vec::new() }
    }
}

impl SchemaSet {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.messages.len() }
    pub fn is_empty(&self) -> bool { self.messages.is_empty() }

    pub fn get(&self, name: &str) -> Option<&MessageDef> {
        self.messages.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MessageDef> {
        self.messages.values()
    }

    /// Insert or replace a message. A replaced entry keeps its position.
    /// Returns `true` when an existing definition was overwritten.
    pub fn insert(&mut self, message: MessageDef) -> bool {
        self.messages.insert(message.name.clone(), message).is_some()
    }

    /// Merge `other` into `self`; entries of `other` win on name clashes.
    /// Omissions recorded against a replaced message go with it.
    pub fn merge(&mut self, other: SchemaSet) {
        for (name, message) in other.messages {
            if self.messages.insert(name.clone(), message).is_some() {
                tracing::warn!(message_name = %name, "message name collision, later definition wins");
                self.drop_omissions_of(&name);
                self.collisions.push(name);
            }
        }
        self.omissions.extend(other.omissions);
        self.collisions.extend(other.collisions);
    }

    pub(crate) fn drop_omissions_of(&mut self, name: &str) {
        self.omissions.retain(|o| o.message != name);
    }
}

impl fmt::Display for Unsupported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unsupported::Array => f.write_str("arrays are not supported"),
            Unsupported::UntypedInteger => f.write_str("integer exceeds every signed width"),
            Unsupported::FieldNumberExhausted => f.write_str("no field numbers left"),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
