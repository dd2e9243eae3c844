//! Recursive proto3 message inference over a single JSON object.
//!
//! Walk one decoded object depth-first, classify every entry, and collect a
//! flat [`SchemaSet`]: one message per object encountered, nested objects
//! referenced by name.
//!
//! Ordering rules:
//! - Fields follow the decoded key order (`serde_json/preserve_order`).
//! - Field numbers advance once per key, so skipped entries leave gaps.
//! - Messages appear in first-discovered pre-order, root first.
//! - On a message-name clash the later definition wins; the enclosing message
//!   is written after its children.
pub mod naming;
pub mod num;

use serde_json::{Map, Value};
use crate::ir::{FieldDecl, FieldType, MessageDef, Omission, ScalarType, SchemaSet, Unsupported};

pub use naming::NamingPolicy;
pub use num::NumClass;

// ------------------------------- Policy ---------------------------------- //

pub const DEFAULT_ROOT_MESSAGE: &str = "RootBuf";
pub const DEFAULT_FIRST_FIELD_NUMBER: u32 = 1;   // proto3 reserves 0
pub const LEGACY_FIRST_FIELD_NUMBER: u32 = 0;
pub const MAX_FIELD_NUMBER: u32 = 536_870_911;   // 2^29 - 1

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InferOptions {
    pub first_field_number: u32,
    pub naming: NamingPolicy,
    /// Type for integers beyond `i64`; `None` skips them.
    pub untyped_integer: Option<ScalarType>,
}

impl Default for InferOptions {
    fn default() -> Self {
        Self {
            first_field_number: DEFAULT_FIRST_FIELD_NUMBER,
            naming: NamingPolicy::default(),
            untyped_integer: None,
        }
    }
}

// ------------------------------- Classify -------------------------------- //

/// What a single object entry turns into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Kind<'a> {
    Scalar(ScalarType),
    Message(&'a Map<String, Value>),
    /// Fallback: the value's own JSON type name.
    Opaque(&'static str),
    Unsupported(Unsupported),
}

pub fn classify(v: &Value) -> Kind<'_> {
    match v {
        Value::String(_) => Kind::Scalar(ScalarType::String),
        Value::Array(_) => Kind::Unsupported(Unsupported::Array),
        Value::Object(m) => Kind::Message(m),
        Value::Number(n) => match NumClass::of(n).scalar() {
            Ok(ty) => Kind::Scalar(ty),
            Err(reason) => Kind::Unsupported(reason),
        },
        Value::Bool(_) => Kind::Opaque("bool"),
        Value::Null => Kind::Opaque("null"),
    }
}

// ------------------------------ Inference -------------------------------- //

#[derive(Clone, Debug, Default)]
pub struct Inferencer {
    options: InferOptions,
}

impl Inferencer {
    pub fn new(options: InferOptions) -> Self { Self { options } }

    pub fn options(&self) -> &InferOptions { &self.options }

    pub fn infer(&self, name: &str, object: &Map<String, Value>) -> SchemaSet {
        let mut out = SchemaSet::new();
        // reserve the slot so this message precedes its children
        out.insert(MessageDef::new(name));

        let mut message = MessageDef::new(name);
        let mut omissions = Vec::new();
        for (index, (key, value)) in object.iter().enumerate() {
            let Some(number) = self.field_number(index) else {
                omissions.push(omit(name, key, None, Unsupported::FieldNumberExhausted));
                continue;
            };
            let ty = match self.resolve(classify(value)) {
                Kind::Scalar(ty) => FieldType::Scalar(ty),
                Kind::Opaque(ty) => FieldType::Opaque(ty),
                Kind::Message(nested) => {
                    let child = self.options.naming.child_name(name, key);
                    out.merge(self.infer(&child, nested));
                    FieldType::Message(child)
                }
                Kind::Unsupported(reason) => {
                    omissions.push(omit(name, key, Some(number), reason));
                    continue;
                }
            };
            tracing::trace!(message_name = name, key = %key, number, "field");
            message.fields.push(FieldDecl { name: key.clone(), ty, number });
        }
        // a same-named descendant is replaced below, along with its omissions
        out.drop_omissions_of(name);
        out.omissions.extend(omissions);
        out.insert(message);
        out
    }

    /// `first_field_number + index`, or `None` past [`MAX_FIELD_NUMBER`].
    fn field_number(&self, index: usize) -> Option<u32> {
        u32::try_from(index)
            .ok()
            .and_then(|i| self.options.first_field_number.checked_add(i))
            .filter(|n| *n <= MAX_FIELD_NUMBER)
    }

    fn resolve<'a>(&self, kind: Kind<'a>) -> Kind<'a> {
        match (kind, self.options.untyped_integer) {
            (Kind::Unsupported(Unsupported::UntypedInteger), Some(ty)) => Kind::Scalar(ty),
            (kind, _) => kind,
        }
    }
}

fn omit(message: &str, key: &str, number: Option<u32>, reason: Unsupported) -> Omission {
    tracing::debug!(message_name = message, key, ?number, %reason, "skipping entry");
    Omission { message: message.to_string(), key: key.to_string(), number, reason }
}

/// Infer with default options.
pub fn infer(name: &str, object: &Map<String, Value>) -> SchemaSet {
    Inferencer::default().infer(name, object)
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            other => panic!("fixture must be an object: {other}"),
        }
    }

    fn field_summary(m: &MessageDef) -> Vec<(String, FieldType, u32)> {
        m.fields.iter().map(|f| (f.name.clone(), f.ty.clone(), f.number)).collect()
    }

    #[test]
    fn classify_follows_type_mapping_priority() {
        assert_eq!(classify(&json!("x")), Kind::Scalar(ScalarType::String));
        assert_eq!(classify(&json!([1])), Kind::Unsupported(Unsupported::Array));
        assert_eq!(classify(&json!(5)), Kind::Scalar(ScalarType::Int32));
        assert_eq!(classify(&json!(5_000_000_000i64)), Kind::Scalar(ScalarType::Int64));
        assert_eq!(classify(&json!(u64::MAX)), Kind::Unsupported(Unsupported::UntypedInteger));
        assert_eq!(classify(&json!(0.25)), Kind::Scalar(ScalarType::Float));
        assert_eq!(classify(&json!(0.1)), Kind::Scalar(ScalarType::Double));
        assert_eq!(classify(&json!(true)), Kind::Opaque("bool"));
        assert_eq!(classify(&json!(null)), Kind::Opaque("null"));
        assert!(matches!(classify(&json!({"a": 1})), Kind::Message(_)));
    }

    #[test]
    fn single_string_field() {
        let s = infer("RootBuf", &obj(json!({"foo": "bar"})));
        assert_eq!(s.len(), 1);
        let root = s.get("RootBuf").unwrap();
        assert_eq!(
            field_summary(root),
            vec![("foo".into(), FieldType::Scalar(ScalarType::String), 1)]
        );
    }

    #[test]
    fn nested_object_becomes_named_message() {
        let s = infer("RootBuf", &obj(json!({"a": {"b": "c"}})));
        let names: Vec<_> = s.messages.keys().map(String::as_str).collect();
        assert_eq!(names, ["RootBuf", "a"]);
        assert_eq!(
            field_summary(s.get("RootBuf").unwrap()),
            vec![("a".into(), FieldType::Message("a".into()), 1)]
        );
        assert_eq!(
            field_summary(s.get("a").unwrap()),
            vec![("b".into(), FieldType::Scalar(ScalarType::String), 1)]
        );
    }

    #[test]
    fn arrays_are_omitted_but_consume_a_number() {
        let s = infer("RootBuf", &obj(json!({"x": "a", "list": [1, 2, 3], "y": "b"})));
        let root = s.get("RootBuf").unwrap();
        let numbers: Vec<_> = root.fields.iter().map(|f| (f.name.as_str(), f.number)).collect();
        assert_eq!(numbers, [("x", 1), ("y", 3)]);
        assert_eq!(
            s.omissions,
            vec![Omission {
                message: "RootBuf".into(),
                key: "list".into(),
                number: Some(2),
                reason: Unsupported::Array,
            }]
        );
    }

    #[test]
    fn array_only_object_yields_empty_message() {
        let s = infer("RootBuf", &obj(json!({"list": [1, 2, 3]})));
        assert_eq!(s.len(), 1);
        assert!(s.get("RootBuf").unwrap().fields.is_empty());
    }

    #[test]
    fn untyped_integer_is_skipped_unless_configured() {
        let input = obj(json!({"big": u64::MAX, "n": 1}));

        let s = infer("RootBuf", &input);
        let root = s.get("RootBuf").unwrap();
        assert_eq!(root.fields.len(), 1);
        assert_eq!(root.fields[0].number, 2);
        assert_eq!(s.omissions[0].reason, Unsupported::UntypedInteger);

        let inf = Inferencer::new(InferOptions {
            untyped_integer: Some(ScalarType::Uint64),
            ..InferOptions::default()
        });
        let s = inf.infer("RootBuf", &input);
        let root = s.get("RootBuf").unwrap();
        assert_eq!(root.fields[0].ty, FieldType::Scalar(ScalarType::Uint64));
        assert!(s.omissions.is_empty());
    }

    #[test]
    fn legacy_numbering_starts_at_zero() {
        let inf = Inferencer::new(InferOptions {
            first_field_number: LEGACY_FIRST_FIELD_NUMBER,
            ..InferOptions::default()
        });
        let s = inf.infer("RootBuf", &obj(json!({"a": "x", "b": "y"})));
        let numbers: Vec<_> = s.get("RootBuf").unwrap().fields.iter().map(|f| f.number).collect();
        assert_eq!(numbers, [0, 1]);
    }

    #[test]
    fn messages_are_emitted_in_preorder() {
        let s = infer("RootBuf", &obj(json!({
            "p": {"q": {"r": "x"}},
            "s": {"t": true},
        })));
        let names: Vec<_> = s.messages.keys().map(String::as_str).collect();
        assert_eq!(names, ["RootBuf", "p", "q", "s"]);
        assert!(s.collisions.is_empty());
    }

    #[test]
    fn key_naming_collisions_are_last_write_wins() {
        let s = infer("RootBuf", &obj(json!({
            "a": {"x": "1"},
            "b": {"a": {"y": 2}},
        })));
        let names: Vec<_> = s.messages.keys().map(String::as_str).collect();
        assert_eq!(names, ["RootBuf", "a", "b"]);
        let a = s.get("a").unwrap();
        assert_eq!(a.fields.len(), 1);
        assert_eq!(a.fields[0].name, "y");
        assert_eq!(s.collisions, vec!["a".to_string()]);
    }

    #[test]
    fn enclosing_message_wins_over_same_named_child() {
        let s = infer("a", &obj(json!({"a": {"inner": "x"}, "outer": "y"})));
        assert_eq!(s.len(), 1);
        let a = s.get("a").unwrap();
        let names: Vec<_> = a.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a", "outer"]);
        assert_eq!(s.collisions, vec!["a".to_string()]);
    }

    #[test]
    fn qualified_naming_avoids_collisions() {
        let inf = Inferencer::new(InferOptions {
            naming: NamingPolicy::Qualified,
            ..InferOptions::default()
        });
        let s = inf.infer("RootBuf", &obj(json!({
            "a": {"x": "1"},
            "b": {"a": {"y": 2}},
        })));
        let names: Vec<_> = s.messages.keys().map(String::as_str).collect();
        assert_eq!(names, ["RootBuf", "RootBuf_a", "RootBuf_b", "RootBuf_b_a"]);
        assert!(s.collisions.is_empty());
        let b = s.get("RootBuf_b").unwrap();
        assert_eq!(b.fields[0].ty, FieldType::Message("RootBuf_b_a".into()));
        assert_eq!(b.fields[0].name, "a");
    }

    #[test]
    fn field_count_is_keys_minus_skipped() {
        let s = infer("RootBuf", &obj(json!({
            "s": "x", "i": 1, "f": 1.5, "b": false, "n": null,
            "arr": [], "big": u64::MAX, "o": {},
        })));
        assert_eq!(s.get("RootBuf").unwrap().fields.len(), 8 - 2);
        assert!(s.get("o").unwrap().fields.is_empty());
    }

    #[test]
    fn field_numbers_stop_at_the_proto3_maximum() {
        let inf = Inferencer::new(InferOptions {
            first_field_number: MAX_FIELD_NUMBER,
            ..InferOptions::default()
        });
        let s = inf.infer("R", &obj(json!({"a": "x", "b": "y"})));
        let root = s.get("R").unwrap();
        assert_eq!(field_summary(root), vec![
            ("a".into(), FieldType::Scalar(ScalarType::String), MAX_FIELD_NUMBER),
        ]);
        assert_eq!(s.omissions[0].key, "b");
        assert_eq!(s.omissions[0].number, None);
        assert_eq!(s.omissions[0].reason, Unsupported::FieldNumberExhausted);

        // no wrap-around even at the top of u32
        let inf = Inferencer::new(InferOptions {
            first_field_number: u32::MAX,
            ..InferOptions::default()
        });
        let s = inf.infer("R", &obj(json!({"a": "x", "b": {"c": 1}})));
        assert!(s.get("R").unwrap().fields.is_empty());
        assert_eq!(s.len(), 1, "no child message for a key without a number");
        assert_eq!(s.omissions.len(), 2);
    }

    #[test]
    fn omissions_of_replaced_messages_are_dropped() {
        // the second `a` replaces the first, so `first_list` no longer exists
        let s = infer("RootBuf", &obj(json!({
            "a": {"first_list": [1]},
            "b": {"a": {"second_list": [2], "v": "x"}},
        })));
        let keys: Vec<_> = s.omissions.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, ["second_list"]);

        // enclosing message wins over a same-named child
        let s = infer("a", &obj(json!({"a": {"inner_list": []}, "own_list": []})));
        let keys: Vec<_> = s.omissions.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, ["own_list"]);
    }

    #[test]
    fn inference_is_deterministic() {
        let input = obj(json!({"z": {"y": 1}, "a": "b", "m": [1], "k": {"j": null}}));
        assert_eq!(infer("RootBuf", &input), infer("RootBuf", &input));
    }
}
