//! typedargs - declarative, type-directed command-line argument parsing.
//!
//! A caller describes its arguments as an ordered list of definitions
//! (name, flags, value kind, default). The engine classifies raw arguments
//! into flags and values, parses each value according to its declared kind,
//! and checks that every required argument received a value.

pub mod coerce;
pub mod config;
pub mod help;
pub mod output;
pub mod parser;
pub mod registry;
pub mod tokenizer;
pub mod value;
pub mod value_parser;

pub use coerce::{CoercionError, EnumIndex, FromArgumentValue};
pub use config::{ArgConfig, Config, ConfigError, ParserConfig};
pub use help::{generate_help, generate_version};
pub use output::{generate_output, generate_output_string};
pub use parser::{parse_args, FromParsedArgs, ParseError, ParsedArgs};
pub use registry::{ArgumentDefinition, Registry, RegistryError};
pub use value::{ArgumentValue, ValueType};
pub use value_parser::{parse_value, ValueError};
