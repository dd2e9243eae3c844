//! Text → JSON object, with JSON-path context in decode errors.
use std::io::Read;
use serde_json::{Map, Value};
use crate::error::ConvertError;

/// Decode a document of any shape.
pub fn decode_value(src: &str) -> Result<Value, ConvertError> {
    let mut de = serde_json::Deserializer::from_str(src);
    let value = serde_path_to_error::deserialize::<_, Value>(&mut de).map_err(|err| {
        let path = err.path().to_string();
        ConvertError::Decode { path, source: err.into_inner() }
    })?;
    // reject trailing characters after the document
    de.end().map_err(|source| ConvertError::Decode { path: ".".to_string(), source })?;
    Ok(value)
}

/// Decode a document whose root must be an object.
pub fn decode_object(src: &str) -> Result<Map<String, Value>, ConvertError> {
    require_object(decode_value(src)?)
}

/// Drain `reader` fully, then decode. The reader is dropped before inference starts.
pub fn decode_object_reader<R: Read>(mut reader: R) -> Result<Map<String, Value>, ConvertError> {
    let mut src = String::new();
    reader.read_to_string(&mut src)?;
    drop(reader);
    decode_object(&src)
}

pub fn require_object(value: Value) -> Result<Map<String, Value>, ConvertError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ConvertError::Shape { found: kind_name(&other) }),
    }
}

pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
