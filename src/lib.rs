//! Infer a proto3 message schema from a JSON document.
//!
//! Pipeline: text → [`decode`] → [`inference`] → [`codegen`] → text.
//!
//! ```
//! let proto = jsonbuf::convert(r#"{"a": {"b": "c"}}"#).unwrap();
//! assert!(proto.contains("message RootBuf {\n\ta a = 1;\n}"));
//! assert!(proto.contains("message a {\n\tstring b = 1;\n}"));
//! ```
pub mod cli;
pub mod codegen;
pub mod decode;
pub mod error;
pub mod inference;
pub mod ir;
pub mod jq_exec;

use std::io::Read;
use serde_json::{Map, Value};

pub use codegen::{RenderOptions, TypeNames};
pub use error::ConvertError;
pub use inference::{InferOptions, Inferencer, NamingPolicy};
pub use ir::SchemaSet;

/// Everything one conversion needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    pub root_message: String,
    pub infer: InferOptions,
    pub render: RenderOptions,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            root_message: inference::DEFAULT_ROOT_MESSAGE.to_string(),
            infer: InferOptions::default(),
            render: RenderOptions::default(),
        }
    }
}

impl Options {
    /// Numbering from 0 and `float32`/`float64` spellings.
    pub fn legacy() -> Self {
        Self {
            infer: InferOptions {
                first_field_number: inference::LEGACY_FIRST_FIELD_NUMBER,
                ..InferOptions::default()
            },
            render: RenderOptions { type_names: TypeNames::Legacy, ..RenderOptions::default() },
            ..Self::default()
        }
    }
}

/// Rendered text plus the set it came from.
#[derive(Clone, Debug)]
pub struct Conversion {
    pub schema: SchemaSet,
    pub proto: String,
}

/// `Convert(rawJsonText)` with default options.
pub fn convert(raw: &str) -> Result<String, ConvertError> {
    convert_with(raw, &Options::default())
}

pub fn convert_with(raw: &str, options: &Options) -> Result<String, ConvertError> {
    let object = decode::decode_object(raw)?;
    Ok(convert_object(&object, options).proto)
}

pub fn convert_reader<R: Read>(reader: R, options: &Options) -> Result<String, ConvertError> {
    let object = decode::decode_object_reader(reader)?;
    Ok(convert_object(&object, options).proto)
}

/// Infer and render an already-decoded object.
pub fn convert_object(object: &Map<String, Value>, options: &Options) -> Conversion {
    let schema = Inferencer::new(options.infer.clone()).infer(&options.root_message, object);
    tracing::debug!(
        messages = schema.len(),
        omissions = schema.omissions.len(),
        collisions = schema.collisions.len(),
        "inferred schema"
    );
    let proto = codegen::render_with(&schema, &options.render);
    Conversion { schema, proto }
}
