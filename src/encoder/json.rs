//! [`Encode`] for `serde_json` documents.
//!
//! Anything that serializes through serde can be converted with
//! `serde_json::to_value` and then encoded. Objects become maps (keys in
//! `serde_json`'s own order), arrays become vectors and `null` encodes to nothing.

use serde_json::{Number, Value};

use super::shape::{Encode, Shape, Unsupported};

impl Encode for Value {
    fn shape(&self) -> Shape<'_> {
        match self {
            Value::Null => Shape::Ref(None),
            Value::Bool(flag) => Shape::Bool(*flag),
            Value::Number(num) => num.shape(),
            Value::String(text) => Shape::Str(text),
            Value::Array(items) => Shape::Sequence(items.iter().map(|item| item as &dyn Encode).collect()),
            Value::Object(map) => Shape::Map(
                map.iter()
                    .map(|(key, value)| (key as &dyn Encode, value as &dyn Encode))
                    .collect(),
            ),
        }
    }
}

impl Encode for Number {
    fn shape(&self) -> Shape<'_> {
        if let Some(num) = self.as_i64() {
            Shape::Int(num)
        } else if let Some(num) = self.as_u64() {
            Shape::Uint(num)
        } else if let Some(num) = self.as_f64() {
            Shape::Float(num)
        } else {
            Shape::Unsupported(Unsupported::with_detail(self))
        }
    }
}
