//! Dispatch of tokens to definitions, completion checking, and results.

use crate::coerce::{coerce, coerce_value, CoercionError, EnumIndex, FromArgumentValue};
use crate::registry::{ArgumentDefinition, Registry};
use crate::tokenizer::{Token, Tokenizer};
use crate::value::{ArgumentValue, ValueType};
use crate::value_parser::{is_bool_literal, parse_value, ValueError};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during argument parsing.
///
/// Any error aborts the whole parse; no partial result is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid value '{raw}' for argument '{name}': expected {expected}")]
    InvalidValue {
        name: String,
        raw: String,
        expected: String,
    },

    #[error("unclosed quote in value '{raw}' for argument '{name}'")]
    UnclosedDelimiter { name: String, raw: String },

    #[error("missing value for flag: {0}")]
    MissingValue(String),

    #[error("unknown argument: {0}")]
    InvalidFieldName(String),

    #[error("missing required argument: {0}")]
    MissingArgs(String),

    #[error("internal type mismatch: {0}")]
    Contract(CoercionError),
}

impl ParseError {
    fn from_value_error(name: &str, err: ValueError) -> Self {
        match err {
            ValueError::InvalidValue { raw, expected } => ParseError::InvalidValue {
                name: name.to_string(),
                raw,
                expected,
            },
            ValueError::UnclosedDelimiter(raw) => ParseError::UnclosedDelimiter {
                name: name.to_string(),
                raw,
            },
        }
    }
}

impl From<CoercionError> for ParseError {
    fn from(err: CoercionError) -> Self {
        match err {
            CoercionError::InvalidFieldName(name) => ParseError::InvalidFieldName(name),
            other => ParseError::Contract(other),
        }
    }
}

/// Which definitions have a value so far.
///
/// Seeded `true` for definitions that can do without input (a default, or
/// an optional kind); flipped the first time a value is assigned.
#[derive(Debug, Clone)]
pub struct ParseState {
    received: HashMap<String, bool>,
}

impl ParseState {
    pub fn new(registry: &Registry) -> Self {
        let received = registry
            .definitions()
            .iter()
            .map(|def| (def.name.clone(), !def.is_required()))
            .collect();
        Self { received }
    }

    pub fn mark_received(&mut self, name: &str) {
        if let Some(flag) = self.received.get_mut(name) {
            *flag = true;
        }
    }

    pub fn is_received(&self, name: &str) -> bool {
        self.received.get(name).copied().unwrap_or(false)
    }

    /// Completion check: the first definition, in registry order, still
    /// without a value fails the parse.
    pub fn validate(&self, registry: &Registry) -> Result<(), ParseError> {
        match registry
            .definitions()
            .iter()
            .find(|def| !self.is_received(&def.name))
        {
            Some(def) => Err(ParseError::MissingArgs(def.name.clone())),
            None => Ok(()),
        }
    }
}

/// Parse command-line arguments against a registry.
///
/// Unknown flags and surplus positional values are ignored; a required
/// definition left without a value fails with `MissingArgs` after the scan.
pub fn parse_args<'r, S: AsRef<str>>(
    registry: &'r Registry,
    args: &[S],
) -> Result<ParsedArgs<'r>, ParseError> {
    Parser::new(registry).parse(args)
}

/// Internal parser state.
struct Parser<'r> {
    registry: &'r Registry,
    state: ParseState,
    values: HashMap<String, ArgumentValue>,
    supplied: HashSet<String>,
    positional_filled: bool,
}

impl<'r> Parser<'r> {
    fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            state: ParseState::new(registry),
            values: HashMap::new(),
            supplied: HashSet::new(),
            positional_filled: false,
        }
    }

    fn parse<S: AsRef<str>>(mut self, args: &[S]) -> Result<ParsedArgs<'r>, ParseError> {
        let registry = self.registry;
        let mut tokens = Tokenizer::new(args, registry.config());

        while let Some(token) = tokens.next() {
            match token {
                Token::Long { name, attached } => self.dispatch_long(name, attached, &mut tokens)?,
                Token::Short { run, raw } => self.dispatch_short(run, raw, &mut tokens)?,
                Token::Value(raw) => self.dispatch_positional(raw)?,
                Token::Terminator => debug!("flag terminator, remaining arguments are values"),
            }
        }

        self.state.validate(registry)?;
        self.apply_defaults();

        Ok(ParsedArgs {
            registry,
            values: self.values,
            supplied: self.supplied,
        })
    }

    fn dispatch_long<S: AsRef<str>>(
        &mut self,
        name: &str,
        attached: Option<&str>,
        tokens: &mut Tokenizer<'_, S>,
    ) -> Result<(), ParseError> {
        let registry = self.registry;
        let config = registry.config();

        let def = match registry.find_long(name) {
            Some(def) => def,
            // With identical prefixes an unknown long name is read as a short run.
            None if config.short_prefix == config.long_prefix => {
                let run = match attached {
                    Some(value) => format!("{}{}{}", name, config.separator, value),
                    None => name.to_string(),
                };
                let raw = format!("{}{}", config.short_prefix, run);
                return self.dispatch_short(&run, &raw, tokens);
            }
            None => {
                debug!(flag = name, "ignoring unknown long flag");
                return Ok(());
            }
        };

        let raw = match attached {
            Some(value) => value,
            None if def.value_type.is_boolean() => match tokens.peek_value() {
                Some(next) if is_bool_literal(next) => {
                    tokens.next_value();
                    next
                }
                _ => "true",
            },
            None => tokens
                .next_value()
                .ok_or_else(|| ParseError::MissingValue(format!("{}{}", config.long_prefix, name)))?,
        };

        self.assign(def, raw)
    }

    fn dispatch_short<S: AsRef<str>>(
        &mut self,
        run: &str,
        raw: &str,
        tokens: &mut Tokenizer<'_, S>,
    ) -> Result<(), ParseError> {
        let registry = self.registry;
        let config = registry.config();

        // "-5" is a negative number unless '5' is itself a registered flag.
        if let Some(first) = run.chars().next() {
            if first.is_ascii_digit() && registry.find_short(first).is_none() {
                return self.dispatch_positional(raw);
            }
        }

        for (i, c) in run.char_indices() {
            let def = match registry.find_short(c) {
                Some(def) => def,
                None => {
                    debug!(flag = %c, "ignoring unknown short flag");
                    continue;
                }
            };

            if def.value_type.is_boolean() {
                self.assign(def, "true")?;
                continue;
            }

            // A value-taking flag ends the chain and owns the rest of the run.
            let rest = &run[i + c.len_utf8()..];
            let rest = rest.strip_prefix(config.separator).unwrap_or(rest);
            let value = if !rest.is_empty() {
                rest
            } else {
                tokens
                    .next_value()
                    .ok_or_else(|| ParseError::MissingValue(format!("{}{}", config.short_prefix, c)))?
            };
            return self.assign(def, value);
        }

        Ok(())
    }

    fn dispatch_positional(&mut self, raw: &str) -> Result<(), ParseError> {
        let registry = self.registry;
        match registry.positional() {
            Some(def) if !self.positional_filled => {
                self.positional_filled = true;
                self.assign(def, raw)
            }
            _ => {
                debug!(value = raw, "ignoring surplus positional value");
                Ok(())
            }
        }
    }

    /// Parse, coerce and record one value. The last assignment wins.
    fn assign(&mut self, def: &ArgumentDefinition, raw: &str) -> Result<(), ParseError> {
        let parsed = parse_value(&def.value_type, raw, self.registry.config())
            .map_err(|err| ParseError::from_value_error(&def.name, err))?;
        let value = coerce_value(def, parsed)?;

        debug!(argument = %def.name, raw, "assigned value");
        self.state.mark_received(&def.name);
        self.supplied.insert(def.name.clone());
        self.values.insert(def.name.clone(), value);
        Ok(())
    }

    fn apply_defaults(&mut self) {
        for def in self.registry.definitions() {
            if self.values.contains_key(&def.name) {
                continue;
            }
            if let Some(ref default) = def.default {
                self.values.insert(def.name.clone(), default.clone());
            } else if matches!(def.value_type, ValueType::Optional(_)) {
                self.values
                    .insert(def.name.clone(), ArgumentValue::Optional(None));
            }
        }
    }
}

/// The complete set of values from a successful parse, keyed by name.
///
/// Every definition has a value: supplied, defaulted, or an absent optional.
#[derive(Debug, Clone)]
pub struct ParsedArgs<'r> {
    registry: &'r Registry,
    values: HashMap<String, ArgumentValue>,
    supplied: HashSet<String>,
}

impl<'r> ParsedArgs<'r> {
    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    fn definition(&self, name: &str) -> Result<&'r ArgumentDefinition, CoercionError> {
        self.registry
            .get(name)
            .ok_or_else(|| CoercionError::InvalidFieldName(name.to_string()))
    }

    /// Borrow the raw parsed value of an argument.
    pub fn value(&self, name: &str) -> Result<&ArgumentValue, CoercionError> {
        self.definition(name)?;
        self.values
            .get(name)
            .ok_or_else(|| CoercionError::Consumed(name.to_string()))
    }

    /// Get an independently owned copy of an argument's value as `T`.
    pub fn get<T: FromArgumentValue>(&self, name: &str) -> Result<T, CoercionError> {
        let definition = self.definition(name)?;
        let value = self.value(name)?.clone();
        coerce(definition, value)
    }

    /// Move an argument's value out as `T`. A second take reports `Consumed`.
    pub fn take<T: FromArgumentValue>(&mut self, name: &str) -> Result<T, CoercionError> {
        let definition = self.definition(name)?;
        let value = self
            .values
            .remove(name)
            .ok_or_else(|| CoercionError::Consumed(name.to_string()))?;
        coerce(definition, value)
    }

    /// The declared variant name of an enum argument.
    pub fn enum_name(&self, name: &str) -> Result<&'r str, CoercionError> {
        let definition = self.definition(name)?;
        let index: EnumIndex = self.get(name)?;
        index.name(definition).ok_or_else(|| CoercionError::TypeMismatch {
            name: name.to_string(),
            expected: definition.value_type.to_string(),
            found: "enum",
        })
    }

    /// Whether the value came from the command line rather than a default.
    pub fn supplied(&self, name: &str) -> bool {
        self.supplied.contains(name)
    }

    /// Definitions and their values, in registry order. Taken values are skipped.
    pub fn iter(&self) -> impl Iterator<Item = (&'r ArgumentDefinition, &ArgumentValue)> + '_ {
        self.registry
            .definitions()
            .iter()
            .filter_map(|def| self.values.get(&def.name).map(|value| (def, value)))
    }
}

/// A typed record built from parsed arguments.
pub trait FromParsedArgs: Sized {
    fn from_parsed_args(args: &mut ParsedArgs<'_>) -> Result<Self, CoercionError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;

    fn args(s: &[&str]) -> Vec<String> {
        s.iter().map(|s| s.to_string()).collect()
    }

    fn registry(definitions: Vec<ArgumentDefinition>) -> Registry {
        Registry::from_definitions(definitions).unwrap()
    }

    fn toggle(name: &str, short: char) -> ArgumentDefinition {
        ArgumentDefinition::new(name, ValueType::Bool)
            .short(short)
            .zero_default()
    }

    #[test]
    fn test_parse_long_flag_with_value() {
        let reg = registry(vec![ArgumentDefinition::new("out", ValueType::String)]);
        let parsed = reg.parse(&args(&["--out", "build.bin"])).unwrap();
        assert_eq!(parsed.get::<String>("out").unwrap(), "build.bin");
        assert!(parsed.supplied("out"));
    }

    #[test]
    fn test_parse_long_flag_attached_value() {
        let reg = registry(vec![ArgumentDefinition::new("count", ValueType::UnsignedInt)]);
        let parsed = reg.parse(&args(&["--count=0x10"])).unwrap();
        assert_eq!(parsed.get::<u64>("count").unwrap(), 16);
    }

    #[test]
    fn test_parse_chained_short_flags() {
        let reg = registry(vec![toggle("all", 'a'), toggle("long", 'l'), toggle("x", 'x')]);
        let parsed = reg.parse(&args(&["-al"])).unwrap();
        assert!(parsed.get::<bool>("all").unwrap());
        assert!(parsed.get::<bool>("long").unwrap());
        assert!(!parsed.get::<bool>("x").unwrap());
        assert!(!parsed.supplied("x"));
    }

    #[test]
    fn test_short_flag_with_value_ends_chain() {
        let reg = registry(vec![
            toggle("verbose", 'v'),
            ArgumentDefinition::new("out", ValueType::String).short('o'),
        ]);
        let parsed = reg.parse(&args(&["-vo", "file.txt"])).unwrap();
        assert!(parsed.get::<bool>("verbose").unwrap());
        assert_eq!(parsed.get::<String>("out").unwrap(), "file.txt");

        let parsed = reg.parse(&args(&["-vofile.txt"])).unwrap();
        assert_eq!(parsed.get::<String>("out").unwrap(), "file.txt");

        let parsed = reg.parse(&args(&["-o=file.txt"])).unwrap();
        assert_eq!(parsed.get::<String>("out").unwrap(), "file.txt");
    }

    #[test]
    fn test_parse_positional() {
        let reg = registry(vec![
            toggle("verbose", 'v'),
            ArgumentDefinition::new("input", ValueType::String).positional(),
        ]);
        let parsed = reg.parse(&args(&["input.txt", "-v", "extra"])).unwrap();
        assert_eq!(parsed.get::<String>("input").unwrap(), "input.txt");
        assert!(parsed.get::<bool>("verbose").unwrap());
    }

    #[test]
    fn test_terminator_passes_flag_like_values() {
        let reg = registry(vec![
            toggle("verbose", 'v'),
            ArgumentDefinition::new("input", ValueType::String).positional(),
        ]);
        let parsed = reg.parse(&args(&["--", "-v"])).unwrap();
        assert_eq!(parsed.get::<String>("input").unwrap(), "-v");
        assert!(!parsed.get::<bool>("verbose").unwrap());
    }

    #[test]
    fn test_negative_number_positional() {
        let reg = registry(vec![
            ArgumentDefinition::new("offset", ValueType::SignedInt).positional()
        ]);
        let parsed = reg.parse(&args(&["-5"])).unwrap();
        assert_eq!(parsed.get::<i64>("offset").unwrap(), -5);
    }

    #[test]
    fn test_boolean_long_flag_toggles() {
        let reg = registry(vec![
            ArgumentDefinition::new("force", ValueType::Bool).zero_default(),
            ArgumentDefinition::new("input", ValueType::String).positional(),
        ]);
        let parsed = reg.parse(&args(&["--force", "input.txt"])).unwrap();
        assert!(parsed.get::<bool>("force").unwrap());
        assert_eq!(parsed.get::<String>("input").unwrap(), "input.txt");

        let parsed = reg.parse(&args(&["--force", "no", "input.txt"])).unwrap();
        assert!(!parsed.get::<bool>("force").unwrap());
        assert_eq!(parsed.get::<String>("input").unwrap(), "input.txt");

        let parsed = reg.parse(&args(&["--force=YES", "input.txt"])).unwrap();
        assert!(parsed.get::<bool>("force").unwrap());
    }

    #[test]
    fn test_unknown_flags_are_ignored() {
        let reg = registry(vec![toggle("verbose", 'v')]);
        let parsed = reg.parse(&args(&["--unknown", "-zv", "stray"])).unwrap();
        assert!(parsed.get::<bool>("verbose").unwrap());
    }

    #[test]
    fn test_missing_required_argument() {
        let reg = registry(vec![ArgumentDefinition::new("out", ValueType::String)]);
        let result = reg.parse(&args(&[]));
        assert_eq!(result.unwrap_err(), ParseError::MissingArgs("out".to_string()));
    }

    #[test]
    fn test_missing_args_reports_first_in_registry_order() {
        let reg = registry(vec![
            ArgumentDefinition::new("first", ValueType::String),
            ArgumentDefinition::new("second", ValueType::String),
        ]);
        let result = reg.parse(&args(&["--second", "x"]));
        assert_eq!(
            result.unwrap_err(),
            ParseError::MissingArgs("first".to_string())
        );
    }

    #[test]
    fn test_missing_value_at_end_of_input() {
        let reg = registry(vec![ArgumentDefinition::new("out", ValueType::String)]);
        let result = reg.parse(&args(&["--out"]));
        assert_eq!(
            result.unwrap_err(),
            ParseError::MissingValue("--out".to_string())
        );
    }

    #[test]
    fn test_invalid_value_carries_context() {
        let reg = registry(vec![ArgumentDefinition::new(
            "level",
            ValueType::ranged(0, 3),
        )]);
        let result = reg.parse(&args(&["--level", "5"]));
        assert_eq!(
            result.unwrap_err(),
            ParseError::InvalidValue {
                name: "level".to_string(),
                raw: "5".to_string(),
                expected: "int[0..=3]".to_string(),
            }
        );
    }

    #[test]
    fn test_unclosed_delimiter_carries_context() {
        let reg = registry(vec![ArgumentDefinition::new(
            "names",
            ValueType::list(ValueType::String),
        )]);
        let result = reg.parse(&args(&["--names", "\"abc"]));
        assert_eq!(
            result.unwrap_err(),
            ParseError::UnclosedDelimiter {
                name: "names".to_string(),
                raw: "\"abc".to_string(),
            }
        );
    }

    #[test]
    fn test_defaults_and_absent_optionals() {
        let reg = registry(vec![
            ArgumentDefinition::new("out", ValueType::String)
                .default_value(ArgumentValue::String("a.out".to_string())),
            ArgumentDefinition::new("jobs", ValueType::optional(ValueType::UnsignedInt)),
        ]);
        let parsed = reg.parse(&args(&[])).unwrap();
        assert_eq!(parsed.get::<String>("out").unwrap(), "a.out");
        assert!(!parsed.supplied("out"));
        assert_eq!(parsed.get::<Option<u64>>("jobs").unwrap(), None);

        let parsed = reg.parse(&args(&["--jobs", "4"])).unwrap();
        assert_eq!(parsed.get::<Option<u64>>("jobs").unwrap(), Some(4));
    }

    #[test]
    fn test_last_value_wins() {
        let reg = registry(vec![ArgumentDefinition::new("out", ValueType::String)]);
        let parsed = reg.parse(&args(&["--out", "a", "--out=b"])).unwrap();
        assert_eq!(parsed.get::<String>("out").unwrap(), "b");
    }

    #[test]
    fn test_enum_value_and_name() {
        let reg = Registry::new(
            vec![ArgumentDefinition::new(
                "greeting",
                ValueType::enumeration(["hello", "world"]),
            )],
            ParserConfig {
                allow_index_as_enum: true,
                ..ParserConfig::default()
            },
        )
        .unwrap();
        let parsed = reg.parse(&args(&["--greeting", "1"])).unwrap();
        assert_eq!(parsed.get::<EnumIndex>("greeting").unwrap(), EnumIndex(1));
        assert_eq!(parsed.enum_name("greeting").unwrap(), "world");
    }

    #[test]
    fn test_same_prefixes_fall_back_to_short() {
        let config = ParserConfig {
            short_prefix: "-".to_string(),
            long_prefix: "-".to_string(),
            ..ParserConfig::default()
        };
        let reg = Registry::new(
            vec![
                toggle("all", 'a'),
                ArgumentDefinition::new("name", ValueType::String),
            ],
            config,
        )
        .unwrap();
        let parsed = reg.parse(&args(&["-a", "-name", "x"])).unwrap();
        assert!(parsed.get::<bool>("all").unwrap());
        assert_eq!(parsed.get::<String>("name").unwrap(), "x");
    }

    fn same_prefix_registry(definitions: Vec<ArgumentDefinition>) -> Registry {
        let config = ParserConfig {
            short_prefix: "-".to_string(),
            long_prefix: "-".to_string(),
            ..ParserConfig::default()
        };
        Registry::new(definitions, config).unwrap()
    }

    #[test]
    fn test_same_prefixes_negative_number_positional() {
        let reg = same_prefix_registry(vec![
            ArgumentDefinition::new("offset", ValueType::SignedInt).positional()
        ]);
        let parsed = reg.parse(&args(&["-5"])).unwrap();
        assert_eq!(parsed.get::<i64>("offset").unwrap(), -5);
    }

    #[test]
    fn test_same_prefixes_short_run_with_attached_value() {
        let reg = same_prefix_registry(vec![
            toggle("verbose", 'v'),
            ArgumentDefinition::new("out", ValueType::String).short('o'),
        ]);

        let parsed = reg.parse(&args(&["-ofile"])).unwrap();
        assert_eq!(parsed.get::<String>("out").unwrap(), "file");
        assert!(!parsed.get::<bool>("verbose").unwrap());

        let parsed = reg.parse(&args(&["-vofile"])).unwrap();
        assert!(parsed.get::<bool>("verbose").unwrap());
        assert_eq!(parsed.get::<String>("out").unwrap(), "file");

        let parsed = reg.parse(&args(&["-vo=file"])).unwrap();
        assert_eq!(parsed.get::<String>("out").unwrap(), "file");

        let parsed = reg.parse(&args(&["-o", "file"])).unwrap();
        assert_eq!(parsed.get::<String>("out").unwrap(), "file");
    }

    #[test]
    fn test_take_moves_value_once() {
        let reg = registry(vec![ArgumentDefinition::new(
            "tags",
            ValueType::list(ValueType::String),
        )]);
        let mut parsed = reg.parse(&args(&["--tags", "a,b"])).unwrap();
        let tags: Vec<String> = parsed.take("tags").unwrap();
        assert_eq!(tags, vec!["a", "b"]);

        let again = parsed.take::<Vec<String>>("tags");
        assert_eq!(again, Err(CoercionError::Consumed("tags".to_string())));
        assert!(parsed.value("tags").is_err());
        assert_eq!(parsed.iter().count(), 0);
    }

    #[test]
    fn test_unknown_field_name() {
        let reg = registry(vec![]);
        let parsed = reg.parse(&args(&[])).unwrap();
        assert_eq!(
            parsed.get::<bool>("nope"),
            Err(CoercionError::InvalidFieldName("nope".to_string()))
        );
        assert_eq!(
            ParseError::from(CoercionError::InvalidFieldName("nope".to_string())),
            ParseError::InvalidFieldName("nope".to_string())
        );
    }

    #[test]
    fn test_parse_state_seeding() {
        let reg = registry(vec![
            ArgumentDefinition::new("required", ValueType::String),
            ArgumentDefinition::new("maybe", ValueType::optional(ValueType::String)),
            toggle("flag", 'f'),
        ]);
        let mut state = ParseState::new(&reg);
        assert!(!state.is_received("required"));
        assert!(state.is_received("maybe"));
        assert!(state.is_received("flag"));
        assert!(state.validate(&reg).is_err());

        state.mark_received("required");
        assert!(state.is_received("required"));
        assert!(state.validate(&reg).is_ok());
    }

    #[test]
    fn test_iter_follows_registry_order() {
        let reg = registry(vec![
            toggle("b", 'b'),
            toggle("a", 'a'),
            ArgumentDefinition::new("c", ValueType::optional(ValueType::Char)),
        ]);
        let parsed = reg.parse(&args(&["-a"])).unwrap();
        let names: Vec<&str> = parsed.iter().map(|(def, _)| def.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }
}
