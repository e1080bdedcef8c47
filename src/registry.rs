//! Argument definitions and the validated registry that holds them.

use crate::config::ParserConfig;
use crate::parser::{parse_args, FromParsedArgs, ParseError, ParsedArgs};
use crate::tokenizer::is_arg_char;
use crate::value::{default_value, value_matches_type, ArgumentValue, ValueType};
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur while building a registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("argument name must not be empty")]
    EmptyName,

    #[error("duplicate argument name: {0}")]
    DuplicateName(String),

    #[error("duplicate short flag '{0}'")]
    DuplicateShort(char),

    #[error("duplicate long flag '{0}'")]
    DuplicateLong(String),

    #[error("invalid short flag '{short}' on argument '{name}': must be a letter, digit or '_'")]
    InvalidShortFlag { name: String, short: char },

    #[error("invalid long flag '{long}' on argument '{name}': must be letters, digits or '_'")]
    InvalidLongFlag { name: String, long: String },

    #[error("range on argument '{name}' is empty: min {min} > max {max}")]
    InvalidRange { name: String, min: i64, max: i64 },

    #[error("enum on argument '{0}' has no variants")]
    EmptyEnum(String),

    #[error("only one positional argument is allowed, found '{0}' and '{1}'")]
    MultiplePositionals(String, String),

    #[error("default for argument '{0}' does not match its declared type")]
    DefaultMismatch(String),

    #[error("{0} prefix must not be empty")]
    EmptyPrefix(&'static str),

    #[error("invalid {which} separator '{separator}': must not be a letter, digit or '_'")]
    InvalidSeparator { which: &'static str, separator: char },
}

/// Declarative description of one argument.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentDefinition {
    /// Unique key; also the lookup name in parsed results
    pub name: String,
    /// Short flag character (e.g., 'v' for -v)
    pub short: Option<char>,
    /// Long flag word (e.g., "verbose" for --verbose)
    pub long: Option<String>,
    /// Filled from a bare value token instead of a flag
    pub positional: bool,
    /// Help text for this argument
    pub help: Option<String>,
    /// Kind the raw value is parsed as
    pub value_type: ValueType,
    /// Value used when nothing is supplied
    pub default: Option<ArgumentValue>,
}

impl ArgumentDefinition {
    /// Start a definition with no flags, help or default.
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            short: None,
            long: None,
            positional: false,
            help: None,
            value_type,
            default: None,
        }
    }

    pub fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub fn long(mut self, long: impl Into<String>) -> Self {
        self.long = Some(long.into());
        self
    }

    pub fn positional(mut self) -> Self {
        self.positional = true;
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn default_value(mut self, value: ArgumentValue) -> Self {
        self.default = Some(value);
        self
    }

    /// Use the zero-equivalent of the declared kind as the default.
    pub fn zero_default(mut self) -> Self {
        self.default = Some(default_value(&self.value_type));
        self
    }

    /// Get the effective long flag for this argument.
    /// Returns the specified long flag, or falls back to the argument name
    /// for non-positional arguments that have no short flag.
    pub fn effective_long(&self) -> Option<&str> {
        if self.long.is_some() {
            return self.long.as_deref();
        }
        if !self.positional && self.short.is_none() {
            return Some(&self.name);
        }
        None
    }

    /// Whether a parse fails when this argument gets no value.
    pub fn is_required(&self) -> bool {
        self.default.is_none() && !matches!(self.value_type, ValueType::Optional(_))
    }
}

/// An ordered, validated list of definitions plus the parser settings.
#[derive(Debug, Clone)]
pub struct Registry {
    definitions: Vec<ArgumentDefinition>,
    config: ParserConfig,
}

impl Registry {
    /// Validate the definitions and settings and build a registry.
    pub fn new(
        definitions: Vec<ArgumentDefinition>,
        config: ParserConfig,
    ) -> Result<Self, RegistryError> {
        config.validate()?;

        let mut names = HashSet::new();
        let mut shorts = HashSet::new();
        let mut longs = HashSet::new();
        let mut positional: Option<&str> = None;

        for def in &definitions {
            if def.name.is_empty() {
                return Err(RegistryError::EmptyName);
            }
            if !names.insert(def.name.as_str()) {
                return Err(RegistryError::DuplicateName(def.name.clone()));
            }

            if let Some(short) = def.short {
                if !is_arg_char(short) {
                    return Err(RegistryError::InvalidShortFlag {
                        name: def.name.clone(),
                        short,
                    });
                }
                if !shorts.insert(short) {
                    return Err(RegistryError::DuplicateShort(short));
                }
            }

            if let Some(long) = def.effective_long() {
                if long.is_empty() || !long.chars().all(is_arg_char) {
                    return Err(RegistryError::InvalidLongFlag {
                        name: def.name.clone(),
                        long: long.to_string(),
                    });
                }
                if !longs.insert(long) {
                    return Err(RegistryError::DuplicateLong(long.to_string()));
                }
            }

            if def.positional {
                if let Some(first) = positional {
                    return Err(RegistryError::MultiplePositionals(
                        first.to_string(),
                        def.name.clone(),
                    ));
                }
                positional = Some(def.name.as_str());
            }

            validate_type(&def.name, &def.value_type)?;

            if let Some(ref default) = def.default {
                if !value_matches_type(default, &def.value_type) {
                    return Err(RegistryError::DefaultMismatch(def.name.clone()));
                }
            }
        }

        Ok(Self {
            definitions,
            config,
        })
    }

    /// Build a registry with the default parser settings.
    pub fn from_definitions(definitions: Vec<ArgumentDefinition>) -> Result<Self, RegistryError> {
        Self::new(definitions, ParserConfig::default())
    }

    pub fn definitions(&self) -> &[ArgumentDefinition] {
        &self.definitions
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Look up a definition by name.
    pub fn get(&self, name: &str) -> Option<&ArgumentDefinition> {
        self.definitions.iter().find(|def| def.name == name)
    }

    pub fn find_long(&self, long: &str) -> Option<&ArgumentDefinition> {
        self.definitions
            .iter()
            .find(|def| def.effective_long() == Some(long))
    }

    pub fn find_short(&self, short: char) -> Option<&ArgumentDefinition> {
        self.definitions.iter().find(|def| def.short == Some(short))
    }

    /// The single positional definition, if any.
    pub fn positional(&self) -> Option<&ArgumentDefinition> {
        self.definitions.iter().find(|def| def.positional)
    }

    /// Parse raw arguments against this registry.
    pub fn parse<S: AsRef<str>>(&self, args: &[S]) -> Result<ParsedArgs<'_>, ParseError> {
        parse_args(self, args)
    }

    /// Parse raw arguments straight into a typed record.
    pub fn parse_into<T: FromParsedArgs, S: AsRef<str>>(&self, args: &[S]) -> Result<T, ParseError> {
        let mut parsed = self.parse(args)?;
        Ok(T::from_parsed_args(&mut parsed)?)
    }
}

/// Check the structural invariants of a (possibly nested) kind.
fn validate_type(name: &str, ty: &ValueType) -> Result<(), RegistryError> {
    match ty {
        ValueType::RangedInt { min, max } if min > max => Err(RegistryError::InvalidRange {
            name: name.to_string(),
            min: *min,
            max: *max,
        }),
        ValueType::Enum(variants) if variants.is_empty() => {
            Err(RegistryError::EmptyEnum(name.to_string()))
        }
        ValueType::List(inner) | ValueType::Optional(inner) => validate_type(name, inner),
        _ => Ok(()),
    }
}
