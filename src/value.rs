//! Value kinds and the typed values they describe.

use serde::Deserialize;
use std::fmt;

/// The closed set of shapes an argument value can take.
///
/// `List` and `Optional` nest arbitrarily, so a definition can declare
/// e.g. a list of optional lists of strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// `true`/`false`
    Bool,
    /// Non-negative 64-bit integer
    #[serde(rename = "uint")]
    UnsignedInt,
    /// Signed 64-bit integer
    #[serde(rename = "int")]
    SignedInt,
    /// Signed integer constrained to `min..=max`
    #[serde(rename = "range")]
    RangedInt { min: i64, max: i64 },
    /// 64-bit float
    Float,
    /// Owned string (default)
    #[default]
    String,
    /// Exactly one byte
    Char,
    /// Homogeneous list of the inner kind
    List(Box<ValueType>),
    /// Value of the inner kind, or nothing
    Optional(Box<ValueType>),
    /// One of the named variants, matched case-insensitively
    Enum(Vec<String>),
}

impl ValueType {
    /// Shorthand for `ValueType::List`.
    pub fn list(inner: ValueType) -> Self {
        ValueType::List(Box::new(inner))
    }

    /// Shorthand for `ValueType::Optional`.
    pub fn optional(inner: ValueType) -> Self {
        ValueType::Optional(Box::new(inner))
    }

    /// Shorthand for `ValueType::RangedInt`.
    pub fn ranged(min: i64, max: i64) -> Self {
        ValueType::RangedInt { min, max }
    }

    /// Build an enum kind from its variant names, in declared order.
    pub fn enumeration<I, S>(variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ValueType::Enum(variants.into_iter().map(Into::into).collect())
    }

    /// Whether a flag of this kind acts as an on/off toggle.
    pub fn is_boolean(&self) -> bool {
        match self {
            ValueType::Bool => true,
            ValueType::Optional(inner) => matches!(**inner, ValueType::Bool),
            _ => false,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Bool => f.write_str("bool"),
            ValueType::UnsignedInt => f.write_str("uint"),
            ValueType::SignedInt => f.write_str("int"),
            ValueType::RangedInt { min, max } => write!(f, "int[{}..={}]", min, max),
            ValueType::Float => f.write_str("float"),
            ValueType::String => f.write_str("string"),
            ValueType::Char => f.write_str("char"),
            ValueType::List(inner) => write!(f, "list<{}>", inner),
            ValueType::Optional(inner) => write!(f, "optional<{}>", inner),
            ValueType::Enum(variants) => write!(f, "{{{}}}", variants.join("|")),
        }
    }
}

/// A parsed value, tagged with the kind it was parsed as.
///
/// Every heap payload is owned by exactly one value: a `List` owns its
/// elements and an `Optional` owns its boxed inner value. Dropping the
/// outermost value releases everything below it once.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentValue {
    Bool(bool),
    UnsignedInt(u64),
    SignedInt(i64),
    RangedInt(i64),
    Float(f64),
    String(String),
    Char(u8),
    List(Vec<ArgumentValue>),
    Optional(Option<Box<ArgumentValue>>),
    /// Index into the declared variant list.
    Enum(usize),
}

impl ArgumentValue {
    /// Wrap a value as a present optional.
    pub fn some(inner: ArgumentValue) -> Self {
        ArgumentValue::Optional(Some(Box::new(inner)))
    }

    /// Short name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ArgumentValue::Bool(_) => "bool",
            ArgumentValue::UnsignedInt(_) => "uint",
            ArgumentValue::SignedInt(_) => "int",
            ArgumentValue::RangedInt(_) => "ranged int",
            ArgumentValue::Float(_) => "float",
            ArgumentValue::String(_) => "string",
            ArgumentValue::Char(_) => "char",
            ArgumentValue::List(_) => "list",
            ArgumentValue::Optional(_) => "optional",
            ArgumentValue::Enum(_) => "enum",
        }
    }
}

/// The zero-equivalent value for a kind.
///
/// Only used when a definition opts into zero defaults; an enum falls back
/// to its first variant.
pub fn default_value(ty: &ValueType) -> ArgumentValue {
    match ty {
        ValueType::Bool => ArgumentValue::Bool(false),
        ValueType::UnsignedInt => ArgumentValue::UnsignedInt(0),
        ValueType::SignedInt => ArgumentValue::SignedInt(0),
        // Zero may sit outside the bounds; clamp so the default still matches.
        ValueType::RangedInt { min, max } => {
            let zero = if *min > 0 {
                *min
            } else if *max < 0 {
                *max
            } else {
                0
            };
            ArgumentValue::RangedInt(zero)
        }
        ValueType::Float => ArgumentValue::Float(0.0),
        ValueType::String => ArgumentValue::String(String::new()),
        ValueType::Char => ArgumentValue::Char(0),
        ValueType::List(_) => ArgumentValue::List(Vec::new()),
        ValueType::Optional(_) => ArgumentValue::Optional(None),
        ValueType::Enum(_) => ArgumentValue::Enum(0),
    }
}

/// The element kind of a list or the wrapped kind of an optional.
pub fn inner_type(ty: &ValueType) -> Option<&ValueType> {
    match ty {
        ValueType::List(inner) | ValueType::Optional(inner) => Some(inner),
        _ => None,
    }
}

/// Structural check of a value against a kind.
///
/// Ranged integers are checked against the declared bounds, so an
/// out-of-range value does not match its own kind.
pub fn value_matches_type(value: &ArgumentValue, ty: &ValueType) -> bool {
    match (value, ty) {
        (ArgumentValue::Bool(_), ValueType::Bool)
        | (ArgumentValue::UnsignedInt(_), ValueType::UnsignedInt)
        | (ArgumentValue::SignedInt(_), ValueType::SignedInt)
        | (ArgumentValue::Float(_), ValueType::Float)
        | (ArgumentValue::String(_), ValueType::String)
        | (ArgumentValue::Char(_), ValueType::Char) => true,
        (ArgumentValue::RangedInt(v), ValueType::RangedInt { min, max }) => {
            (*min..=*max).contains(v)
        }
        (ArgumentValue::List(items), ValueType::List(inner)) => {
            items.iter().all(|item| value_matches_type(item, inner))
        }
        (ArgumentValue::Optional(None), ValueType::Optional(_)) => true,
        (ArgumentValue::Optional(Some(v)), ValueType::Optional(inner)) => {
            value_matches_type(v, inner)
        }
        (ArgumentValue::Enum(index), ValueType::Enum(variants)) => *index < variants.len(),
        _ => false,
    }
}
