//! Help and version text for a registry, rendered through Clap.
//!
//! Clap always draws flags with `-`/`--`, so custom prefixes are not
//! reflected in the rendered text.

use crate::config::Config;
use crate::output::value_to_json;
use crate::registry::{ArgumentDefinition, Registry};
use crate::value::ArgumentValue;
use clap::{Arg, ArgAction, Command};
use serde_json::Value;

/// Build a Clap Command describing the registry (for help generation only).
fn build_command(config: &Config, registry: &Registry) -> Command {
    let mut cmd = Command::new(config.effective_name().to_string())
        .disable_help_flag(true)
        .disable_version_flag(true);

    if let Some(ref version) = config.version {
        cmd = cmd.version(version.clone());
    }
    if let Some(ref description) = config.description {
        cmd = cmd.about(description.clone());
    }

    for def in registry.definitions() {
        cmd = cmd.arg(build_arg(def));
    }

    cmd
}

/// Build a Clap Arg from an ArgumentDefinition.
fn build_arg(def: &ArgumentDefinition) -> Arg {
    let mut arg = Arg::new(def.name.clone());

    if def.positional {
        arg = arg.index(1).value_name(def.name.to_uppercase());
    } else {
        if let Some(short) = def.short {
            arg = arg.short(short);
        }
        if let Some(long) = def.effective_long() {
            arg = arg.long(long.to_string());
        }
    }

    if def.value_type.is_boolean() && !def.positional {
        arg = arg.action(ArgAction::SetTrue);
    } else {
        arg = arg.action(ArgAction::Set);
        if !def.positional {
            arg = arg.value_name(def.value_type.to_string());
        }
        if let Some(ref default) = def.default {
            arg = arg.default_value(render_default(default, def));
        }
    }

    if def.is_required() {
        arg = arg.required(true);
    }

    if let Some(ref help) = def.help {
        arg = arg.help(help.clone());
    }

    arg
}

fn render_default(default: &ArgumentValue, def: &ArgumentDefinition) -> String {
    match value_to_json(default, &def.value_type) {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Generate the full help text.
pub fn generate_help(config: &Config, registry: &Registry) -> String {
    let mut cmd = build_command(config, registry);
    cmd.render_help().to_string()
}

/// Generate the version string.
pub fn generate_version(config: &Config) -> String {
    let mut version = config.effective_name().to_string();
    if let Some(ref v) = config.version {
        version.push(' ');
        version.push_str(v);
    }
    version.push('\n');
    version
}
