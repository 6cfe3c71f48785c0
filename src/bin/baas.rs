//! BaaS API CLI binary.
//!
//! A command-line interface for interacting with the BaaS API.

use std::collections::BTreeSet;
use std::process::ExitCode;

use baasapi::cli::{deleted_summary, to_properties, Cli, Command, Entity};
use baasapi::{
    ApnsDevice, BaasClient, Class, Instance, InstanceInvitation, Model, PrettyPrint, Resource,
    User,
};
use clap::Parser;
use serde_json::Value;
use tabled::builder::Builder;

/// Columns never shown in list tables.
const HIDDEN_COLUMNS: &[&str] = &["links", "password", "metadata"];

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let client = match BaasClient::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Hint: Set BAAS_API_KEY environment variable");
            return ExitCode::FAILURE;
        }
    };
    let client = match &cli.instance {
        Some(instance) => client.with_instance(instance.clone()),
        None => client,
    };

    match run(&client, cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(client: &BaasClient, cli: Cli) -> baasapi::Result<()> {
    match cli.command.entity() {
        Entity::Instance => handle::<Instance>(client, cli.command, cli.json).await,
        Entity::Class => handle::<Class>(client, cli.command, cli.json).await,
        Entity::ApnsDevice => handle::<ApnsDevice>(client, cli.command, cli.json).await,
        Entity::Invitation => handle::<InstanceInvitation>(client, cli.command, cli.json).await,
        Entity::User => handle::<User>(client, cli.command, cli.json).await,
    }
}

async fn handle<R: Resource>(
    client: &BaasClient,
    command: Command,
    json: bool,
) -> baasapi::Result<()> {
    let query = R::please(client);

    match command {
        Command::Get { lookup, .. } => {
            let model = query.get(to_properties(&lookup)).request().await?;
            output_single(&model, json)?;
        }
        Command::List {
            filters,
            page_size,
            ordering,
            raw,
            ..
        } => {
            let mut query = query;
            if let Some(size) = page_size {
                query = query.page_size(size);
            }
            if let Some(order) = ordering {
                query = query.ordering(order);
            }

            if raw {
                let page = query.raw(to_properties(&filters)).await?;
                println!("{}", serde_json::to_string_pretty(&page)?);
            } else {
                let models = query.list(to_properties(&filters)).await?;
                output_list(&models, json)?;
            }
        }
        Command::Create { data, .. } => {
            let model = query.create(to_properties(&data)).await?;
            output_single(&model, json)?;
        }
        Command::Update { lookup, fields, .. } => {
            let model = query
                .update(to_properties(&lookup), to_properties(&fields))
                .await?;
            output_single(&model, json)?;
        }
        Command::Delete { lookup, .. } => {
            query.delete(to_properties(&lookup)).request().await?;
            println!("{}", deleted_summary(R::meta().name, json));
        }
    }
    Ok(())
}

fn output_single<R: Resource>(model: &Model<R>, json: bool) -> baasapi::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(model)?);
    } else {
        println!("{}", model.pretty_print());
    }
    Ok(())
}

fn output_list<R: Resource>(models: &[Model<R>], json: bool) -> baasapi::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(models)?);
        return Ok(());
    }

    // Scalar columns present on any record
    let columns: BTreeSet<&str> = models
        .iter()
        .flat_map(|m| m.attributes().iter())
        .filter(|(key, value)| {
            !HIDDEN_COLUMNS.iter().any(|c| *c == key.as_str())
                && !value.is_object()
                && !value.is_array()
        })
        .map(|(key, _)| key.as_str())
        .collect();

    let mut builder = Builder::default();
    builder.push_record(columns.iter().map(|c| c.to_string()));
    for model in models {
        builder.push_record(columns.iter().map(|c| match model.get(c) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }));
    }
    println!("{}", builder.build());
    println!("\n{} {}", models.len(), R::meta().plural_name);
    Ok(())
}
