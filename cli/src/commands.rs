//! Subcommand dispatch onto the core client.

use std::io::Write;

use anyhow::{Context, Result};
use cloud_core::{Client, Direction, Endpoint};
use serde_json::{Map, Value};

use crate::args::{BodyArgs, Command, ListArgs, ResourceArgs};
use crate::kv;
use crate::output::{self, OutputFormat};

/// Key wrapping one resource: `networks` -> `network`, `policies` -> `policy`.
pub fn singular(collection: &str) -> String {
    let trimmed = collection.trim_matches('/');
    if let Some(stem) = trimmed.strip_suffix("ies") {
        return format!("{stem}y");
    }
    for suffix in ["sses", "uses", "xes", "ches", "shes"] {
        if trimmed.ends_with(suffix) {
            return trimmed[..trimmed.len() - 2].to_string();
        }
    }
    trimmed.strip_suffix('s').unwrap_or(trimmed).to_string()
}

fn resource_path(collection: &str, id: &str) -> Result<String> {
    Ok(Endpoint::resolve(
        &format!("/{collection}/{{id}}"),
        &[("id", id)],
    )?)
}

/// The resource under `key`, or the whole body when it is not wrapped.
fn unwrap_resource(body: Value, key: &str) -> Value {
    match body {
        Value::Object(mut object) if object.contains_key(key) => {
            object.remove(key).unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn wrap_body(args: &BodyArgs, key: &str) -> Result<Value> {
    let fields = kv::build_body(&args.set, &args.items)?;
    let mut body = Map::new();
    body.insert(key.to_string(), Value::Object(fields));
    Ok(Value::Object(body))
}

fn print_item(out: &mut impl Write, format: OutputFormat, item: &Value) -> Result<()> {
    let text = match format {
        OutputFormat::Table => output::render_object(item),
        OutputFormat::Json => output::render_json(item),
    };
    writeln!(out, "{text}")?;
    Ok(())
}

fn print_items(
    out: &mut impl Write,
    format: OutputFormat,
    items: &[Value],
    columns: &[String],
) -> Result<()> {
    let text = match format {
        OutputFormat::Table => output::render_list(items, columns),
        OutputFormat::Json => output::render_json(&Value::Array(items.to_vec())),
    };
    writeln!(out, "{text}")?;
    Ok(())
}

fn list(client: &Client, args: &ListArgs, format: OutputFormat, out: &mut impl Write) -> Result<()> {
    let query = args
        .query
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .with_context(|| format!("expected KEY=VALUE, got {pair:?}"))
        })
        .collect::<Result<Vec<_>>>()?;
    let collection = args.collection.trim_matches('/');
    let direction = if args.reverse {
        Direction::Previous
    } else {
        Direction::Next
    };
    let pager = client
        .pager(collection, &format!("/{collection}"), &query)
        .direction(direction);

    if args.pages {
        for (index, page) in pager.enumerate() {
            let page = page?;
            tracing::debug!(page = index + 1, items = page.items.len(), "page received");
            print_items(out, format, &page.items, &args.columns)?;
        }
        return Ok(());
    }

    let items = pager.collect_all()?;
    print_items(out, format, &items, &args.columns)
}

fn show(client: &Client, args: &ResourceArgs, format: OutputFormat, out: &mut impl Write) -> Result<()> {
    let key = args
        .resource_key
        .clone()
        .unwrap_or_else(|| singular(&args.collection));
    let body = client
        .get(&resource_path(&args.collection, &args.id)?, &[])?
        .into_json();
    print_item(out, format, &unwrap_resource(body, &key))
}

fn create(
    client: &Client,
    collection: &str,
    args: &BodyArgs,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let key = args
        .resource_key
        .clone()
        .unwrap_or_else(|| singular(collection));
    let collection = collection.trim_matches('/');
    let body = client
        .post(&format!("/{collection}"), wrap_body(args, &key)?)?
        .into_json();
    print_item(out, format, &unwrap_resource(body, &key))
}

fn update(
    client: &Client,
    collection: &str,
    id: &str,
    args: &BodyArgs,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let key = args
        .resource_key
        .clone()
        .unwrap_or_else(|| singular(collection));
    let body = client
        .put(&resource_path(collection, id)?, wrap_body(args, &key)?)?
        .into_json();
    print_item(out, format, &unwrap_resource(body, &key))
}

fn delete(client: &Client, args: &ResourceArgs, out: &mut impl Write) -> Result<()> {
    client.delete(&resource_path(&args.collection, &args.id)?)?;
    writeln!(out, "Deleted {} {}", singular(&args.collection), args.id)?;
    Ok(())
}

pub fn run(command: &Command, format: OutputFormat, client: &Client, out: &mut impl Write) -> Result<()> {
    match command {
        Command::List(args) => list(client, args, format, out),
        Command::Show(args) => show(client, args, format, out),
        Command::Create(args) => create(client, &args.collection, &args.body, format, out),
        Command::Update(args) => update(client, &args.collection, &args.id, &args.body, format, out),
        Command::Delete(args) => delete(client, args, out),
    }
}
