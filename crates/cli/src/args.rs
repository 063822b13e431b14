//! Command-line arguments

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// LedgerLink - command-line client for the ledger service
#[derive(Parser, Debug)]
#[command(name = "ledgerlink")]
#[command(author = "LedgerLink Team")]
#[command(version)]
#[command(about = "Query and edit ledger records over the signed API", long_about = None)]
pub struct Cli {
    /// Configuration file (JSON or TOML). Without it, LEDGERLINK_* variables
    /// are tried first, then ledgerlink.{json,toml} / config.{json,toml}.
    #[arg(long = "config", global = true, env = "LEDGERLINK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines on stderr
    #[arg(long = "json-logs", global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the OAuth handshake: obtain a request token and print the
    /// authorization URL
    Authorize {
        /// Callback URL (defaults to the configured one)
        #[arg(long)]
        callback: Option<String>,
    },

    /// Finish the OAuth handshake: exchange the verifier for an access token
    Exchange {
        #[arg(long)]
        request_token: String,
        #[arg(long)]
        request_token_secret: String,
        #[arg(long)]
        verifier: String,
        /// Realm (company) the user authorized
        #[arg(long)]
        realm_id: Option<String>,
    },

    /// Run a query and print every matching record
    Query {
        entity_type: String,
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Read one record
    Read { entity_type: String, id: String },

    /// Create a record from a JSON object (inline or @file)
    Create {
        entity_type: String,
        #[arg(long)]
        data: String,
    },

    /// Merge a JSON object over an existing record and submit it
    Update {
        entity_type: String,
        id: String,
        #[arg(long)]
        data: String,
    },

    /// Delete a record
    Delete { entity_type: String, id: String },

    /// Every name-list collection
    Names {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Every transaction collection
    Transactions {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Fetch a named report
    Report {
        name: String,
        /// Report parameter as key=value (repeatable)
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },

    /// Print a temporary download URL for an attachment
    DownloadLink { attachment_id: String },

    /// Page through a collection on the legacy XML surface
    Legacy { resource: String, entity_type: String },

    /// Invoices billed to a customer
    CustomerInvoices { customer_id: String },

    /// Purchases charged to a customer
    CustomerPurchases { customer_id: String },
}

/// Query filter options shared by the query commands
#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Condition as "property operator value", AND-joined (repeatable)
    #[arg(long = "where", value_name = "CONDITION", conflicts_with_all = ["tail", "raw"])]
    pub conditions: Vec<String>,

    /// Raw text appended after the FROM clause
    #[arg(long, conflicts_with = "raw")]
    pub tail: Option<String>,

    /// Complete statement replacing the generated one
    #[arg(long)]
    pub raw: Option<String>,
}
