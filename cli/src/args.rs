use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "cloudctl",
    version,
    about = "Command-line client for the cloud platform's REST services"
)]
pub struct Cli {
    /// Config file (default: <config dir>/cloudctl/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Service URL, overriding the configured endpoints
    #[arg(long, global = true, value_name = "URL")]
    pub endpoint: Option<String>,

    #[arg(long, global = true)]
    pub token: Option<String>,

    #[arg(long, global = true)]
    pub region: Option<String>,

    /// public, internal or admin
    #[arg(long, global = true)]
    pub endpoint_type: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long, global = true)]
    pub insecure: bool,

    /// CA bundle used to verify the server
    #[arg(long, global = true, value_name = "PATH")]
    pub cacert: Option<PathBuf>,

    /// Per-request timeout in seconds (0 disables)
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Attempts for GET/PUT/DELETE on connection failure
    #[arg(long, global = true, value_name = "N")]
    pub retries: Option<u32>,

    #[arg(long, global = true, value_name = "MS")]
    pub retry_delay_ms: Option<u64>,

    /// Service path prefix
    #[arg(long, global = true, default_value = "/v2.0")]
    pub prefix: String,

    #[arg(long, short = 'f', global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List a collection, following pagination links
    List(ListArgs),
    /// Show one resource
    Show(ResourceArgs),
    /// Create a resource
    Create(CreateArgs),
    /// Update a resource
    Update(UpdateArgs),
    /// Delete a resource
    Delete(ResourceArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Collection name, e.g. networks
    pub collection: String,

    /// Query parameter, repeatable
    #[arg(long = "query", short = 'q', value_name = "KEY=VALUE")]
    pub query: Vec<String>,

    /// Column to show, repeatable
    #[arg(long = "column", short = 'c', value_name = "NAME")]
    pub columns: Vec<String>,

    /// Print each page as it arrives instead of one table
    #[arg(long)]
    pub pages: bool,

    /// Follow "previous" links instead of "next"
    #[arg(long)]
    pub reverse: bool,
}

#[derive(Args, Debug)]
pub struct ResourceArgs {
    pub collection: String,
    pub id: String,

    /// Key wrapping the resource in responses (default: singular collection)
    #[arg(long)]
    pub resource_key: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct BodyArgs {
    /// Body field, repeatable
    #[arg(long = "set", short = 's', value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Object appended to an array field, repeatable
    #[arg(long = "item", value_name = "FIELD:KEY=VALUE[,KEY=VALUE]")]
    pub items: Vec<String>,

    /// Key wrapping the resource in requests and responses
    #[arg(long)]
    pub resource_key: Option<String>,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    pub collection: String,

    #[command(flatten)]
    pub body: BodyArgs,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    pub collection: String,
    pub id: String,

    #[command(flatten)]
    pub body: BodyArgs,
}
