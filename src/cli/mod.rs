//! CLI argument parsing types.
//!
//! This module provides the command-line interface structure for the `baas`
//! binary.

use std::str::FromStr;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;

use crate::queryset::Order;
use crate::traits::Properties;

/// BaaS API command-line interface.
#[derive(Parser, Debug)]
#[command(name = "baas", about = "BaaS API CLI", version)]
pub struct Cli {
    /// Output results as JSON instead of a table.
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Instance used for `{instance}` paths.
    #[arg(long, global = true, env = "BAAS_INSTANCE")]
    pub instance: Option<String>,

    /// Log requests to stderr.
    #[arg(short, long, global = true, default_value = "false")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Get a single record.
    Get {
        /// The type of resource to get.
        entity: Entity,

        /// Lookup properties as key=value pairs.
        #[arg(required = true)]
        lookup: Vec<Pair>,
    },

    /// List records with optional filtering, ordering and page size.
    List {
        /// The type of resource to list.
        entity: Entity,

        /// Filters as key=value pairs.
        filters: Vec<Pair>,

        /// Return a single page of this many records.
        #[arg(long)]
        page_size: Option<u32>,

        /// Sort order (asc or desc).
        #[arg(long)]
        ordering: Option<Order>,

        /// Print the raw page envelope.
        #[arg(long, default_value = "false")]
        raw: bool,
    },

    /// Create a record.
    Create {
        /// The type of resource to create.
        entity: Entity,

        /// Record fields as key=value pairs.
        #[arg(required = true)]
        data: Vec<Pair>,
    },

    /// Update the record matching a lookup.
    Update {
        /// The type of resource to update.
        entity: Entity,

        /// Lookup properties as key=value pairs.
        #[arg(long = "where", required = true)]
        lookup: Vec<Pair>,

        /// Fields to change as key=value pairs.
        #[arg(long = "set", required = true)]
        fields: Vec<Pair>,
    },

    /// Delete the record(s) matching a lookup.
    Delete {
        /// The type of resource to delete.
        entity: Entity,

        /// Lookup properties as key=value pairs.
        #[arg(required = true)]
        lookup: Vec<Pair>,
    },
}

impl Command {
    /// The resource kind the command targets.
    pub fn entity(&self) -> Entity {
        match self {
            Command::Get { entity, .. }
            | Command::List { entity, .. }
            | Command::Create { entity, .. }
            | Command::Update { entity, .. }
            | Command::Delete { entity, .. } => *entity,
        }
    }
}

/// Resource kinds that can be operated on.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Entity {
    /// An instance.
    #[value(alias = "instances")]
    Instance,
    /// A data class.
    #[value(alias = "classes")]
    Class,
    /// An APNS push device.
    #[value(name = "apns-device", alias = "apns-devices", alias = "apns")]
    ApnsDevice,
    /// An instance invitation.
    #[value(alias = "invitations")]
    Invitation,
    /// An instance user.
    #[value(alias = "users")]
    User,
}

/// A `key=value` argument.
///
/// The value is read as JSON when it parses (numbers, booleans, quoted
/// strings, arrays, objects) and as a plain string otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct Pair {
    pub key: String,
    pub value: Value,
}

impl FromStr for Pair {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, raw) = s
            .split_once('=')
            .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
        if key.is_empty() {
            return Err(format!("missing key in '{s}'"));
        }
        let value =
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        Ok(Self {
            key: key.to_string(),
            value,
        })
    }
}

/// Collect pairs into a property map; later keys win.
pub fn to_properties(pairs: &[Pair]) -> Properties {
    pairs
        .iter()
        .map(|p| (p.key.clone(), p.value.clone()))
        .collect()
}

/// Line printed after a successful delete.
pub fn deleted_summary(resource: &str, json: bool) -> String {
    if json {
        serde_json::json!({ "deleted": resource }).to_string()
    } else {
        format!("Deleted {resource}")
    }
}
