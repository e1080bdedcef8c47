//! Parser settings and the declarative JSON registry format.

use crate::registry::{ArgumentDefinition, Registry, RegistryError};
use crate::tokenizer::is_arg_char;
use crate::value::ValueType;
use crate::value_parser::{parse_value, ValueError};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading a JSON registry.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse JSON config: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid default for argument '{name}': {source}")]
    InvalidDefault {
        name: String,
        #[source]
        source: ValueError,
    },

    #[error("argument '{0}' sets both 'default' and 'zero_default'")]
    ConflictingDefaults(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Lexical settings for a parse. Fixed for the duration of a parse.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Separates a flag from an attached value (e.g., `--out=file`)
    pub separator: char,
    /// Prefix of short flags (default: "-")
    pub short_prefix: String,
    /// Prefix of long flags (default: "--")
    pub long_prefix: String,
    /// Separates list elements inside one value
    pub item_separator: char,
    /// Accept a variant index in place of an enum name
    pub allow_index_as_enum: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            separator: '=',
            short_prefix: "-".to_string(),
            long_prefix: "--".to_string(),
            item_separator: ',',
            allow_index_as_enum: false,
        }
    }
}

impl ParserConfig {
    /// Validate the settings.
    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.short_prefix.is_empty() {
            return Err(RegistryError::EmptyPrefix("short"));
        }
        if self.long_prefix.is_empty() {
            return Err(RegistryError::EmptyPrefix("long"));
        }
        if is_arg_char(self.separator) {
            return Err(RegistryError::InvalidSeparator {
                which: "value",
                separator: self.separator,
            });
        }
        // Quotes and backslash are structural inside list values.
        if is_arg_char(self.item_separator) || matches!(self.item_separator, '"' | '\'' | '\\') {
            return Err(RegistryError::InvalidSeparator {
                which: "item",
                separator: self.item_separator,
            });
        }
        Ok(())
    }
}

/// Configuration for a single argument.
#[derive(Debug, Clone, Deserialize)]
pub struct ArgConfig {
    /// The name of the argument (the lookup key in results)
    pub name: String,
    /// Short flag character (e.g., 'v' for -v)
    pub short: Option<char>,
    /// Long flag name (e.g., "verbose" for --verbose)
    pub long: Option<String>,
    /// Whether this argument is filled from a bare value
    #[serde(default)]
    pub positional: bool,
    /// Help text for this argument
    pub help: Option<String>,
    /// Value kind (default: string)
    #[serde(rename = "type", default)]
    pub value_type: ValueType,
    /// Default value, as it would be typed on the command line
    pub default: Option<String>,
    /// Use the zero value of the kind as the default
    #[serde(default)]
    pub zero_default: bool,
}

impl ArgConfig {
    /// Build the definition, parsing the raw default with `parser`.
    pub fn to_definition(&self, parser: &ParserConfig) -> Result<ArgumentDefinition, ConfigError> {
        let mut def = ArgumentDefinition::new(self.name.clone(), self.value_type.clone());
        def.short = self.short;
        def.long = self.long.clone();
        def.positional = self.positional;
        def.help = self.help.clone();

        match (&self.default, self.zero_default) {
            (Some(_), true) => return Err(ConfigError::ConflictingDefaults(self.name.clone())),
            (Some(raw), false) => {
                let value = parse_value(&self.value_type, raw, parser).map_err(|source| {
                    ConfigError::InvalidDefault {
                        name: self.name.clone(),
                        source,
                    }
                })?;
                def = def.default_value(value);
            }
            (None, true) => def = def.zero_default(),
            (None, false) => {}
        }

        Ok(def)
    }
}

/// Top-level configuration for a program's arguments.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Name of the program
    pub name: Option<String>,
    /// Description of the program
    pub description: Option<String>,
    /// Version of the program
    pub version: Option<String>,
    /// Lexical settings
    #[serde(default)]
    pub parser: ParserConfig,
    /// List of argument configurations
    #[serde(default)]
    pub args: Vec<ArgConfig>,
}

impl Config {
    /// Parse a JSON string into a Config.
    pub fn from_json(json: &str) -> Result<Config, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Read and parse a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Build and validate the registry described by this config.
    pub fn to_registry(&self) -> Result<Registry, ConfigError> {
        let definitions = self
            .args
            .iter()
            .map(|arg| arg.to_definition(&self.parser))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Registry::new(definitions, self.parser.clone())?)
    }

    /// Get the program name, falling back to the crate name.
    pub fn effective_name(&self) -> &str {
        self.name.as_deref().unwrap_or(env!("CARGO_PKG_NAME"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ArgumentValue;

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            "name": "pack",
            "description": "Packs files",
            "version": "1.0.0",
            "parser": {"separator": ":", "allow_index_as_enum": true},
            "args": [
                {"name": "all", "short": "a", "type": "bool", "zero_default": true},
                {"name": "out", "long": "out", "default": "build.bin", "help": "Output file"},
                {"name": "level", "type": {"range": {"min": 0, "max": 9}}, "default": "6"},
                {"name": "tags", "type": {"list": "string"}, "default": "a,b"},
                {"name": "mode", "type": {"enum": ["fast", "small"]}},
                {"name": "input", "positional": true}
            ]
        }"#;

        let config = Config::from_json(json).unwrap();
        assert_eq!(config.name, Some("pack".to_string()));
        assert_eq!(config.version, Some("1.0.0".to_string()));
        assert_eq!(config.parser.separator, ':');
        assert!(config.parser.allow_index_as_enum);
        // Unset parser fields keep their defaults
        assert_eq!(config.parser.long_prefix, "--");
        assert_eq!(config.args.len(), 6);

        let registry = config.to_registry().unwrap();
        let all = registry.get("all").unwrap();
        assert_eq!(all.short, Some('a'));
        assert_eq!(all.default, Some(ArgumentValue::Bool(false)));

        let out = registry.get("out").unwrap();
        assert_eq!(out.value_type, ValueType::String);
        assert_eq!(
            out.default,
            Some(ArgumentValue::String("build.bin".to_string()))
        );

        let level = registry.get("level").unwrap();
        assert_eq!(level.default, Some(ArgumentValue::RangedInt(6)));

        let tags = registry.get("tags").unwrap();
        assert_eq!(
            tags.default,
            Some(ArgumentValue::List(vec![
                ArgumentValue::String("a".to_string()),
                ArgumentValue::String("b".to_string()),
            ]))
        );

        assert!(registry.get("mode").unwrap().is_required());
        assert_eq!(registry.positional().unwrap().name, "input");
    }

    #[test]
    fn test_parse_minimal_config() {
        let config = Config::from_json(r#"{"name": "minimal"}"#).unwrap();
        assert!(config.description.is_none());
        assert!(config.args.is_empty());
        assert_eq!(config.parser, ParserConfig::default());
        config.to_registry().unwrap();
    }

    #[test]
    fn test_effective_name() {
        let config = Config::from_json(r#"{"name": "pack"}"#).unwrap();
        assert_eq!(config.effective_name(), "pack");

        let config = Config::from_json("{}").unwrap();
        assert_eq!(config.effective_name(), "typedargs");
    }

    #[test]
    fn test_error_on_bad_json() {
        let result = Config::from_json(r#"{"args": [{"type": "bool"}]}"#);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));

        let result = Config::from_json(r#"{"args": [{"name": "x", "type": "decimal"}]}"#);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_error_on_invalid_default() {
        let config = Config::from_json(
            r#"{"args": [{"name": "level", "type": {"range": {"min": 0, "max": 3}}, "default": "7"}]}"#,
        )
        .unwrap();
        let result = config.to_registry();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidDefault { name, source: ValueError::InvalidValue { .. } })
                if name == "level"
        ));
    }

    #[test]
    fn test_error_on_conflicting_defaults() {
        let config = Config::from_json(
            r#"{"args": [{"name": "x", "default": "1", "zero_default": true}]}"#,
        )
        .unwrap();
        assert!(matches!(
            config.to_registry(),
            Err(ConfigError::ConflictingDefaults(name)) if name == "x"
        ));
    }

    #[test]
    fn test_registry_errors_surface() {
        let config = Config::from_json(
            r#"{"args": [{"name": "dup", "short": "d"}, {"name": "dup", "short": "e"}]}"#,
        )
        .unwrap();
        assert!(matches!(
            config.to_registry(),
            Err(ConfigError::Registry(RegistryError::DuplicateName(_)))
        ));
    }

    #[test]
    fn test_default_parser_config_is_valid() {
        ParserConfig::default().validate().unwrap();
    }

    #[test]
    fn test_error_on_invalid_separators() {
        let config = ParserConfig {
            separator: 'x',
            ..ParserConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RegistryError::InvalidSeparator { which: "value", .. })
        ));

        let config = ParserConfig {
            item_separator: '"',
            ..ParserConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RegistryError::InvalidSeparator { which: "item", .. })
        ));

        let config = ParserConfig {
            short_prefix: String::new(),
            ..ParserConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RegistryError::EmptyPrefix("short"))
        ));
    }
}
