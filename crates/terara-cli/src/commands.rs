use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use terara_query::Lexer;
use terara_store::{Catalog, Database, DatabaseConfig, Document, LockRegistry};
use terara_types::{Value, ID_FIELD};
use uuid::Uuid;

use crate::cli::*;
use crate::convert;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format.clone();
    match cli.command {
        Command::Lex(args) => cmd_lex(args, &format),
        Command::Decode(args) => cmd_decode(args, &format),
        Command::Encode(args) => cmd_encode(args, &format),
        Command::Put(args) => cmd_put(load_config(&cli.config)?, args, &format),
        Command::Get(args) => cmd_get(load_config(&cli.config)?, args, &format),
        Command::Scan(args) => cmd_scan(load_config(&cli.config)?, args, &format),
        Command::Collections(args) => cmd_collections(load_config(&cli.config)?, args, &format),
        Command::Config => cmd_config(load_config(&cli.config)?, &format),
    }
}

fn load_config(path: &Option<std::path::PathBuf>) -> anyhow::Result<DatabaseConfig> {
    match path {
        Some(path) => DatabaseConfig::from_toml_file(path)
            .with_context(|| format!("loading {}", path.display())),
        None => Ok(DatabaseConfig::default()),
    }
}

fn open(config: DatabaseConfig) -> anyhow::Result<(Database, Catalog)> {
    let db = Database::open(config)?;
    let catalog = db.catalog(Arc::new(LockRegistry::new()))?;
    Ok((db, catalog))
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_document(doc: &Document, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(&serde_json::Value::Object(convert::fields_to_json(
            doc.fields(),
        ))),
        OutputFormat::Text => {
            let id = doc.id().map(Value::to_string).unwrap_or_default();
            println!("{} {}", "id".dimmed(), id.yellow().bold());
            for (key, value) in doc.fields().iter().filter(|(k, _)| k.as_str() != ID_FIELD) {
                println!("  {}: {}", key.bold(), value);
            }
            Ok(())
        }
    }
}

fn cmd_lex(args: LexArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let query = match (args.query, args.file) {
        (Some(query), _) => query,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?,
        (None, None) => bail!("provide a query or --file"),
    };

    let tokens = Lexer::new(&query).collect::<Result<Vec<_>, _>>()?;
    match format {
        OutputFormat::Json => print_json(&serde_json::to_value(&tokens)?),
        OutputFormat::Text => {
            for token in &tokens {
                println!("{}: {}", token.kind.name().cyan(), token.value);
            }
            Ok(())
        }
    }
}

fn cmd_decode(args: DecodeArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let bytes = hex::decode(args.hex.trim()).context("input is not valid hex")?;
    let (value, consumed) = terara_types::decode(&bytes)?;
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "type": value.type_name(),
            "value": convert::to_json(&value),
            "consumed": consumed,
            "trailing": bytes.len() - consumed,
        })),
        OutputFormat::Text => {
            println!("{} {}", value.type_name().cyan(), value);
            println!("  consumed {} of {} bytes", consumed.to_string().bold(), bytes.len());
            Ok(())
        }
    }
}

fn cmd_encode(args: EncodeArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let value = convert::parse(&args.json)?;
    let bytes = terara_types::encode(&value)?;
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "type": value.type_name(),
            "hex": hex::encode(&bytes),
            "len": bytes.len(),
        })),
        OutputFormat::Text => {
            println!("{}", hex::encode(&bytes));
            Ok(())
        }
    }
}

fn cmd_put(config: DatabaseConfig, args: PutArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let json: serde_json::Value =
        serde_json::from_str(&args.json).context("document is not valid JSON")?;
    let Some(object) = json.as_object() else {
        bail!("document must be a JSON object");
    };
    let fields = convert::fields_from_json(object)?;

    let (mut db, mut catalog) = open(config)?;
    let doc = db.update(|txn| {
        if catalog.collection(&args.collection).is_err() {
            catalog.create_collection(txn, &args.collection)?;
        }
        let collection = catalog.collection(&args.collection)?;
        let mut doc = collection.new_document();
        for (key, value) in fields {
            doc.set(key, value)?;
        }
        if doc.id().is_none() {
            doc.set(ID_FIELD, Value::String(Uuid::now_v7().to_string()))?;
        }
        collection.insert(txn, &mut doc)?;
        Ok(doc)
    })?;
    db.close()?;

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "collection": args.collection,
            "id": doc.id().map(convert::to_json),
        })),
        OutputFormat::Text => {
            let id = doc.id().map(Value::to_string).unwrap_or_default();
            println!(
                "{} Stored {} in {}",
                "✓".green().bold(),
                id.yellow(),
                args.collection.bold()
            );
            Ok(())
        }
    }
}

fn cmd_get(config: DatabaseConfig, args: GetArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let id = convert::parse(&args.id).context("id must be a JSON literal")?;
    let (db, catalog) = open(config)?;
    let found = db.view(|txn| catalog.collection(&args.collection)?.get(txn, &id))?;
    match found {
        Some(doc) => print_document(&doc, format),
        None => bail!("no document with id {id} in {}", args.collection),
    }
}

fn cmd_scan(config: DatabaseConfig, args: ScanArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let (db, catalog) = open(config)?;
    let docs = db.view(|txn| catalog.collection(&args.collection)?.scan(txn))?;
    match format {
        OutputFormat::Json => print_json(&serde_json::Value::Array(
            docs.iter()
                .map(|doc| serde_json::Value::Object(convert::fields_to_json(doc.fields())))
                .collect(),
        )),
        OutputFormat::Text => {
            if docs.is_empty() {
                println!("No documents in {}.", args.collection.bold());
            }
            for doc in &docs {
                print_document(doc, format)?;
            }
            Ok(())
        }
    }
}

fn cmd_collections(
    config: DatabaseConfig,
    args: CollectionsArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let (mut db, mut catalog) = open(config)?;
    match args.action {
        Some(CollectionAction::Create { name, secondary }) => {
            db.update(|txn| {
                if secondary {
                    catalog.create_secondary(txn, &name)?;
                } else {
                    catalog.create_collection(txn, &name)?;
                }
                Ok(())
            })?;
            println!("{} Created collection {}", "✓".green().bold(), name.bold());
        }
        Some(CollectionAction::Drop { name }) => {
            let removed = db.update(|txn| catalog.drop_collection(txn, &name))?;
            println!(
                "{} Dropped collection {} ({} documents)",
                "✓".green().bold(),
                name.bold(),
                removed
            );
        }
        None => match format {
            OutputFormat::Json => print_json(&serde_json::json!(catalog.names()))?,
            OutputFormat::Text if catalog.is_empty() => println!("No collections."),
            OutputFormat::Text => {
                for name in catalog.names() {
                    let marker = match catalog.collection(&name) {
                        Ok(c) if c.is_secondary() => " (secondary)".dimmed().to_string(),
                        _ => String::new(),
                    };
                    println!("  {}{}", name.bold(), marker);
                }
            }
        },
    }
    db.close()?;
    Ok(())
}

fn cmd_config(config: DatabaseConfig, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(&serde_json::to_value(&config)?),
        OutputFormat::Text => {
            print!("{}", config.to_toml_string()?);
            println!("{} {}", "# data dir:".dimmed(), config.data_dir().display());
            Ok(())
        }
    }
}
