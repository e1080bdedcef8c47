//! Moving parsed values into the representation a definition expects.

use crate::registry::ArgumentDefinition;
use crate::value::{value_matches_type, ArgumentValue, ValueType};
use thiserror::Error;

/// Errors that can occur while coercing or looking up a value.
///
/// `TypeMismatch` means the parsed value and the requested representation
/// disagree. That is a bug in the embedding program or the engine, not a
/// problem with user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionError {
    #[error("argument '{name}' holds a {found} value, which cannot become {expected}")]
    TypeMismatch {
        name: String,
        expected: String,
        found: &'static str,
    },

    #[error("unknown argument: {0}")]
    InvalidFieldName(String),

    #[error("value of argument '{0}' was already taken")]
    Consumed(String),
}

/// Index of the chosen variant of an enum argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnumIndex(pub usize);

impl EnumIndex {
    /// The variant name as declared on `definition`.
    pub fn name<'a>(&self, definition: &'a ArgumentDefinition) -> Option<&'a str> {
        match definition.value_type {
            ValueType::Enum(ref variants) => variants.get(self.0).map(String::as_str),
            _ => None,
        }
    }
}

/// Conversion from a parsed value into a concrete Rust type.
pub trait FromArgumentValue: Sized {
    /// What the conversion accepts, for error messages.
    fn expected() -> String;

    /// Take ownership of `value`; `None` if the variant does not fit.
    fn from_argument_value(value: ArgumentValue) -> Option<Self>;
}

macro_rules! impl_from_argument_value {
    ($ty:ty, $expected:literal, $($pattern:pat => $out:expr),+ $(,)?) => {
        impl FromArgumentValue for $ty {
            fn expected() -> String {
                $expected.to_string()
            }

            fn from_argument_value(value: ArgumentValue) -> Option<Self> {
                match value {
                    $($pattern => $out,)+
                    _ => None,
                }
            }
        }
    };
}

impl_from_argument_value!(bool, "bool", ArgumentValue::Bool(b) => Some(b));
impl_from_argument_value!(u64, "u64", ArgumentValue::UnsignedInt(n) => Some(n));
impl_from_argument_value!(
    usize,
    "usize",
    ArgumentValue::UnsignedInt(n) => usize::try_from(n).ok(),
);
impl_from_argument_value!(
    i64,
    "i64",
    ArgumentValue::SignedInt(n) | ArgumentValue::RangedInt(n) => Some(n),
);
impl_from_argument_value!(
    i32,
    "i32",
    ArgumentValue::SignedInt(n) | ArgumentValue::RangedInt(n) => i32::try_from(n).ok(),
);
impl_from_argument_value!(f64, "f64", ArgumentValue::Float(f) => Some(f));
impl_from_argument_value!(String, "String", ArgumentValue::String(s) => Some(s));
impl_from_argument_value!(char, "char", ArgumentValue::Char(b) => Some(char::from(b)));
impl_from_argument_value!(EnumIndex, "enum", ArgumentValue::Enum(i) => Some(EnumIndex(i)));

impl FromArgumentValue for ArgumentValue {
    fn expected() -> String {
        "any value".to_string()
    }

    fn from_argument_value(value: ArgumentValue) -> Option<Self> {
        Some(value)
    }
}

impl<T: FromArgumentValue> FromArgumentValue for Vec<T> {
    fn expected() -> String {
        format!("Vec<{}>", T::expected())
    }

    fn from_argument_value(value: ArgumentValue) -> Option<Self> {
        match value {
            // Elements converted before a failure are dropped with the rest.
            ArgumentValue::List(items) => items.into_iter().map(T::from_argument_value).collect(),
            _ => None,
        }
    }
}

impl<T: FromArgumentValue> FromArgumentValue for Option<T> {
    fn expected() -> String {
        format!("Option<{}>", T::expected())
    }

    fn from_argument_value(value: ArgumentValue) -> Option<Self> {
        match value {
            ArgumentValue::Optional(None) => Some(None),
            ArgumentValue::Optional(Some(inner)) => T::from_argument_value(*inner).map(Some),
            _ => None,
        }
    }
}

/// Re-pack `value` into the kind declared by `definition`.
///
/// Lists are rebuilt element by element and optionals pass their inner
/// value through, both recursively. Ownership moves from `value` into the
/// result; nothing is shared.
pub fn coerce_value(
    definition: &ArgumentDefinition,
    value: ArgumentValue,
) -> Result<ArgumentValue, CoercionError> {
    repack(&definition.name, &definition.value_type, value)
}

fn repack(name: &str, ty: &ValueType, value: ArgumentValue) -> Result<ArgumentValue, CoercionError> {
    match (ty, value) {
        (ValueType::List(inner), ArgumentValue::List(items)) => {
            let mut packed = Vec::with_capacity(items.len());
            for item in items {
                packed.push(repack(name, inner, item)?);
            }
            Ok(ArgumentValue::List(packed))
        }
        (ValueType::Optional(inner), ArgumentValue::Optional(Some(boxed))) => {
            repack(name, inner, *boxed).map(ArgumentValue::some)
        }
        (ValueType::Optional(_), ArgumentValue::Optional(None)) => Ok(ArgumentValue::Optional(None)),
        (ty, value) if value_matches_type(&value, ty) => Ok(value),
        (ty, value) => Err(CoercionError::TypeMismatch {
            name: name.to_string(),
            expected: ty.to_string(),
            found: value.kind_name(),
        }),
    }
}

/// Coerce a parsed value for `definition` into the Rust type `T`.
pub fn coerce<T: FromArgumentValue>(
    definition: &ArgumentDefinition,
    value: ArgumentValue,
) -> Result<T, CoercionError> {
    let value = coerce_value(definition, value)?;
    let found = value.kind_name();
    T::from_argument_value(value).ok_or_else(|| CoercionError::TypeMismatch {
        name: definition.name.clone(),
        expected: T::expected(),
        found,
    })
}
