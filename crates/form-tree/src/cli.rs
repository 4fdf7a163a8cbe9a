//! `form-tree` command-line tool.
//!
//! Provides the logic behind the binary entry point. Documents are read from
//! stdin, results written to stdout. Every command accepts `--config <file>`
//! with a TOML [`FormConfig`].

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use form_tree_core::Identity;
use serde_json::Value;
use thiserror::Error;

use crate::config::{ConfigError, FormConfig};
use crate::context::FormContext;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("no element with identity {0}")]
    NotFound(String),
    #[error("{0} is not a component id of this form")]
    ForeignComponentId(String),
}

#[derive(Debug, Parser)]
#[command(name = "form-tree")]
#[command(about = "Inspect identity trees and convert form addresses")]
pub struct Cli {
    /// TOML form config
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Print the identity tree of a schema
    IdTree {
        /// JSON Schema file
        schema: PathBuf,
    },
    /// Add identities to the document on stdin
    Inject {
        /// JSON Schema file
        schema: PathBuf,
    },
    /// Remove injected identities from the document on stdin
    Strip {
        /// JSON Schema file
        schema: PathBuf,
    },
    /// Print the pointer of the element carrying an identity
    Find {
        /// JSON Schema file
        schema: PathBuf,
        identity: String,
    },
    /// Convert a component id to a JSON Pointer
    Pointer { component_id: String },
    /// Convert a JSON Pointer to a component id
    ComponentId { pointer: String },
}

impl Command {
    /// Whether the command consumes a document on stdin.
    pub fn reads_input(&self) -> bool {
        matches!(self, Command::Inject { .. } | Command::Strip { .. } | Command::Find { .. })
    }

    fn schema(&self) -> Option<&Path> {
        match self {
            Command::IdTree { schema }
            | Command::Inject { schema }
            | Command::Strip { schema }
            | Command::Find { schema, .. } => Some(schema),
            Command::Pointer { .. } | Command::ComponentId { .. } => None,
        }
    }
}

/// Run `command` against a prepared context. `input` is the stdin document.
pub fn execute(command: &Command, ctx: &FormContext, input: &str) -> Result<String, CliError> {
    match command {
        Command::IdTree { .. } => Ok(serde_json::to_string_pretty(&ctx.id_tree().to_json())?),
        Command::Inject { .. } => {
            let mut data: Value = serde_json::from_str(input.trim())?;
            let changed = ctx.inject_in_place(&mut data);
            tracing::debug!(changed, "inject");
            Ok(serde_json::to_string_pretty(&data)?)
        }
        Command::Strip { .. } => {
            let data: Value = serde_json::from_str(input.trim())?;
            Ok(serde_json::to_string_pretty(ctx.strip(&data).as_ref())?)
        }
        Command::Find { identity, .. } => {
            let data: Value = serde_json::from_str(input.trim())?;
            ctx.find_pointer(&data, &Identity::new(identity.as_str()))
                .ok_or_else(|| CliError::NotFound(identity.clone()))
        }
        Command::Pointer { component_id } => ctx
            .pointer(component_id)
            .ok_or_else(|| CliError::ForeignComponentId(component_id.clone())),
        Command::ComponentId { pointer } => Ok(ctx.component_id(pointer)),
    }
}

/// Load the files named by `cli` and execute its command.
pub fn run(cli: &Cli, input: &str) -> Result<String, CliError> {
    let config = match &cli.config {
        Some(path) => FormConfig::from_toml_str(&fs::read_to_string(path)?)?,
        None => FormConfig::default(),
    };
    let mut ctx = FormContext::new(config);
    if let Some(path) = cli.command.schema() {
        let schema: Value = serde_json::from_str(&fs::read_to_string(path)?)?;
        ctx.set_schema(&schema);
    }
    execute(&cli.command, &ctx, input)
}
