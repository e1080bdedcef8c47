//! JSON rendering of parsed arguments.

use crate::parser::ParsedArgs;
use crate::value::{inner_type, ArgumentValue, ValueType};
use serde_json::{json, Map, Value};

/// Convert one value to JSON, using `ty` to name enum variants.
///
/// Chars become one-character strings, absent optionals become `null`,
/// and non-finite floats become `null`.
pub fn value_to_json(value: &ArgumentValue, ty: &ValueType) -> Value {
    match value {
        ArgumentValue::Bool(b) => json!(b),
        ArgumentValue::UnsignedInt(n) => json!(n),
        ArgumentValue::SignedInt(n) | ArgumentValue::RangedInt(n) => json!(n),
        ArgumentValue::Float(f) => json!(f),
        ArgumentValue::String(s) => json!(s),
        ArgumentValue::Char(b) => json!(char::from(*b).to_string()),
        ArgumentValue::List(items) => {
            let inner = inner_type(ty).unwrap_or(ty);
            Value::Array(items.iter().map(|item| value_to_json(item, inner)).collect())
        }
        ArgumentValue::Optional(None) => Value::Null,
        ArgumentValue::Optional(Some(inner)) => value_to_json(inner, inner_type(ty).unwrap_or(ty)),
        ArgumentValue::Enum(index) => match ty {
            ValueType::Enum(variants) => match variants.get(*index) {
                Some(name) => json!(name),
                None => json!(index),
            },
            _ => json!(index),
        },
    }
}

/// Render every parsed value as a JSON object keyed by argument name.
pub fn generate_output(parsed: &ParsedArgs<'_>) -> Value {
    let mut object = Map::new();
    for (def, value) in parsed.iter() {
        object.insert(def.name.clone(), value_to_json(value, &def.value_type));
    }
    Value::Object(object)
}

/// Generate the output as a pretty-printed JSON string.
pub fn generate_output_string(parsed: &ParsedArgs<'_>) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&generate_output(parsed))
}
