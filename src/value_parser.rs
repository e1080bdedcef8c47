//! Type-directed conversion of raw strings into argument values.

use crate::config::ParserConfig;
use crate::value::{ArgumentValue, ValueType};
use thiserror::Error;

/// Words accepted as `true` (case-insensitive). Anything else is `false`.
const TRUE_WORDS: [&str; 4] = ["true", "yes", "y", "1"];
/// Words recognised as an explicit `false` when peeking after a long flag.
const FALSE_WORDS: [&str; 4] = ["false", "no", "n", "0"];

/// Errors that can occur while parsing a single raw value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("invalid value '{raw}': expected {expected}")]
    InvalidValue { raw: String, expected: String },

    #[error("unclosed quote in list value '{0}'")]
    UnclosedDelimiter(String),
}

impl ValueError {
    fn invalid(raw: &str, ty: &ValueType) -> Self {
        ValueError::InvalidValue {
            raw: raw.to_string(),
            expected: ty.to_string(),
        }
    }
}

/// Parse `raw` as a value of kind `ty`.
///
/// Optionals always come back present; absence is decided by whether a
/// token was supplied at all, not by the token's content.
pub fn parse_value(
    ty: &ValueType,
    raw: &str,
    config: &ParserConfig,
) -> Result<ArgumentValue, ValueError> {
    match ty {
        ValueType::Bool => Ok(ArgumentValue::Bool(parse_bool(raw))),
        ValueType::UnsignedInt => parse_integer(raw)
            .and_then(|n| u64::try_from(n).ok())
            .map(ArgumentValue::UnsignedInt)
            .ok_or_else(|| ValueError::invalid(raw, ty)),
        ValueType::SignedInt => parse_integer(raw)
            .and_then(|n| i64::try_from(n).ok())
            .map(ArgumentValue::SignedInt)
            .ok_or_else(|| ValueError::invalid(raw, ty)),
        ValueType::RangedInt { min, max } => parse_integer(raw)
            .and_then(|n| i64::try_from(n).ok())
            .filter(|n| (*min..=*max).contains(n))
            .map(ArgumentValue::RangedInt)
            .ok_or_else(|| ValueError::invalid(raw, ty)),
        ValueType::Float => raw
            .parse::<f64>()
            .map(ArgumentValue::Float)
            .map_err(|_| ValueError::invalid(raw, ty)),
        ValueType::String => Ok(ArgumentValue::String(raw.to_string())),
        ValueType::Char => match raw.as_bytes() {
            [byte] => Ok(ArgumentValue::Char(*byte)),
            _ => Err(ValueError::invalid(raw, ty)),
        },
        ValueType::Optional(inner) => parse_value(inner, raw, config).map(ArgumentValue::some),
        ValueType::List(inner) => parse_list(inner, raw, config),
        ValueType::Enum(variants) => resolve_enum(variants, raw, config)
            .map(ArgumentValue::Enum)
            .ok_or_else(|| ValueError::invalid(raw, ty)),
    }
}

/// Permissive boolean: never fails, unknown words are `false`.
pub fn parse_bool(raw: &str) -> bool {
    TRUE_WORDS.iter().any(|word| raw.eq_ignore_ascii_case(word))
}

/// Whether `raw` reads as an explicit boolean word in either direction.
pub fn is_bool_literal(raw: &str) -> bool {
    TRUE_WORDS
        .iter()
        .chain(FALSE_WORDS.iter())
        .any(|word| raw.eq_ignore_ascii_case(word))
}

/// Parse an integer with optional sign, radix prefix and `_` separators.
///
/// Returns `None` on malformed input; range checks are left to the caller.
fn parse_integer(raw: &str) -> Option<i128> {
    let (negative, unsigned) = match raw.as_bytes().first()? {
        b'-' => (true, &raw[1..]),
        b'+' => (false, &raw[1..]),
        _ => (false, raw),
    };
    let (radix, digits) = split_radix(unsigned);

    if digits.is_empty()
        || digits.starts_with('_')
        || digits.ends_with('_')
        || digits.contains("__")
        || !digits.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
    {
        return None;
    }

    let magnitude = i128::from_str_radix(&digits.replace('_', ""), radix).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

fn split_radix(s: &str) -> (u32, &str) {
    let prefix = s.get(..2).map(str::to_ascii_lowercase);
    match prefix.as_deref() {
        Some("0x") => (16, &s[2..]),
        Some("0o") => (8, &s[2..]),
        Some("0b") => (2, &s[2..]),
        _ => (10, s),
    }
}

/// Split a list value on the item separator and parse each element.
///
/// Quotes (`"` or `'`) group characters into one element and are dropped.
/// A backslash makes the next character literal. A separator only splits
/// when the pending element is non-empty.
fn parse_list(
    inner: &ValueType,
    raw: &str,
    config: &ParserConfig,
) -> Result<ArgumentValue, ValueError> {
    let mut items = Vec::new();
    let mut buffer = String::new();
    let mut quoted = false;
    let mut escaped = false;

    for c in raw.chars() {
        let was_escaped = escaped;
        if c == '\\' && !was_escaped {
            escaped = true;
            continue;
        }
        escaped = false;

        if c == config.item_separator && !buffer.is_empty() && !quoted && !was_escaped {
            items.push(parse_value(inner, &buffer, config)?);
            buffer.clear();
        } else if (c == '"' || c == '\'') && !was_escaped {
            quoted = !quoted;
        } else {
            buffer.push(c);
        }
    }

    if quoted {
        return Err(ValueError::UnclosedDelimiter(raw.to_string()));
    }

    items.push(parse_value(inner, &buffer, config)?);
    Ok(ArgumentValue::List(items))
}

/// Resolve an enum token to a variant index.
fn resolve_enum(variants: &[String], raw: &str, config: &ParserConfig) -> Option<usize> {
    if config.allow_index_as_enum {
        if let Ok(index) = raw.parse::<usize>() {
            if index < variants.len() {
                return Some(index);
            }
        }
    }
    variants
        .iter()
        .position(|variant| variant.eq_ignore_ascii_case(raw))
}
