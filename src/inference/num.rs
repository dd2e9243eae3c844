use serde_json::Number;
use crate::ir::{ScalarType, Unsupported};

/// Width class of a JSON number, decided from its decoded representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumClass {
    Int32,
    Int64,
    /// Whole number no signed width can hold (only `u64` above `i64::MAX`).
    Untyped,
    Float,
    Double,
}

impl NumClass {
    pub fn of(n: &Number) -> Self {
        if let Some(i) = n.as_i64() {
            if i32::try_from(i).is_ok() { NumClass::Int32 } else { NumClass::Int64 }
        } else if n.as_u64().is_some() {
            NumClass::Untyped
        } else {
            // without `arbitrary_precision` every remaining number is an f64
            let f = n.as_f64().unwrap_or(f64::NAN);
            if fits_f32(f) { NumClass::Float } else { NumClass::Double }
        }
    }

    pub fn scalar(self) -> Result<ScalarType, Unsupported> {
        match self {
            NumClass::Int32 => Ok(ScalarType::Int32),
            NumClass::Int64 => Ok(ScalarType::Int64),
            NumClass::Untyped => Err(Unsupported::UntypedInteger),
            NumClass::Float => Ok(ScalarType::Float),
            NumClass::Double => Ok(ScalarType::Double),
        }
    }
}

/// True when `f` survives a round trip through `f32` unchanged.
fn fits_f32(f: f64) -> bool {
    let narrowed = f as f32;
    narrowed.is_finite() && f64::from(narrowed) == f
}
