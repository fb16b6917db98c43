use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "storecodes",
    about = "Stores and their discount codes, kept consistent in one SQLite ledger",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Ledger database file. Created on first use.
    #[arg(long, global = true, env = "STORECODES_DB", default_value = "storecodes.sqlite3")]
    pub db: PathBuf,

    /// trace|debug|info|warn|error. Defaults by build mode.
    #[arg(long, global = true, env = "STORECODES_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Absolute directory for rotating log files. Logging is off when unset.
    #[arg(long, global = true, env = "STORECODES_LOG_DIR")]
    pub log_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// List every store
    ListStores,
    /// Show one store
    GetStore(IdArgs),
    /// Create a store
    AddStore(StoreArgs),
    /// Replace a store's title and type
    UpdateStore(UpdateStoreArgs),
    /// Delete a store and all of its discount codes
    DeleteStore(IdArgs),
    /// List the discount codes of one store
    ListCodes(IdArgs),
    /// Create a discount code for a store
    AddCode(AddCodeArgs),
    /// Show one discount code
    GetCode(IdArgs),
    /// Delete one discount code
    DeleteCode(IdArgs),
    /// Check counters, ownership and titles across the ledger
    Audit,
}

#[derive(Args)]
pub struct IdArgs {
    pub id: String,
}

#[derive(Args)]
pub struct StoreArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long = "type")]
    pub kind: Option<String>,
}

#[derive(Args)]
pub struct UpdateStoreArgs {
    pub id: String,
    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Args)]
pub struct AddCodeArgs {
    pub store_id: String,
    #[arg(long)]
    pub value: String,
}
