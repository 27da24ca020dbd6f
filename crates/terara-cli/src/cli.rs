use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "terara", about = "terara: embedded document store", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Database configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Tokenize a query
    Lex(LexArgs),
    /// Decode hex-encoded codec bytes
    Decode(DecodeArgs),
    /// Encode a JSON value with the codec
    Encode(EncodeArgs),
    /// Store a JSON object as a document
    Put(PutArgs),
    /// Fetch a document by id
    Get(GetArgs),
    /// List every document in a collection
    Scan(ScanArgs),
    /// List, create, or drop collections
    Collections(CollectionsArgs),
    /// Show the effective database configuration
    Config,
}

#[derive(Args)]
pub struct LexArgs {
    /// Query text; read from --file when omitted
    pub query: Option<String>,
    #[arg(short, long, conflicts_with = "query")]
    pub file: Option<PathBuf>,
}

#[derive(Args)]
pub struct DecodeArgs {
    pub hex: String,
}

#[derive(Args)]
pub struct EncodeArgs {
    pub json: String,
}

#[derive(Args)]
pub struct PutArgs {
    pub collection: String,
    /// JSON object; an "id" is generated when missing
    pub json: String,
}

#[derive(Args)]
pub struct GetArgs {
    pub collection: String,
    /// Document id as a JSON literal, e.g. 42 or "alice"
    pub id: String,
}

#[derive(Args)]
pub struct ScanArgs {
    pub collection: String,
}

#[derive(Args)]
pub struct CollectionsArgs {
    #[command(subcommand)]
    pub action: Option<CollectionAction>,
}

#[derive(Subcommand)]
pub enum CollectionAction {
    Create {
        name: String,
        /// Register as a secondary (index) collection
        #[arg(long)]
        secondary: bool,
    },
    Drop {
        name: String,
    },
}
