use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

#[derive(Parser, Debug)]
#[command(name = "invoicedb", about = "InvoiceDB - inward and outward invoice register")]
pub struct CliArgs {
    /// Path to config file
    #[arg(short, long, default_value = "invoicedb.toml")]
    pub config: String,

    /// Database file (overrides config file)
    #[arg(short, long)]
    pub database: Option<String>,

    /// Log level (overrides config file)
    #[arg(short, long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Record a new invoice
    Add(AddArgs),
    /// Change fields of an existing invoice
    Edit(EditArgs),
    /// Remove an invoice
    Delete { id: String },
    /// Show one invoice in full
    Show { id: String },
    /// List invoices, optionally filtered by a search expression
    List {
        /// e.g. `type:inward customer:acme date:2024-01-01..2024-01-31`.
        /// Quote the whole expression when a value has spaces, so the shell
        /// keeps the inner quotes: `list 'customer:"Acme Ltd"'`
        query: Vec<String>,
    },
    /// Export invoices to a CSV file
    ExportCsv {
        path: Option<PathBuf>,
        /// Ids of the invoices to export
        #[arg(long = "id")]
        ids: Vec<String>,
        /// Search expression selecting the invoices to export
        #[arg(short, long = "where", conflicts_with = "ids")]
        filter: Option<String>,
    },
    /// Render invoices to a PDF file
    ExportPdf {
        path: Option<PathBuf>,
        /// Ids of the invoices to render
        #[arg(long = "id")]
        ids: Vec<String>,
        /// Search expression selecting the invoices to render
        #[arg(short, long = "where", conflicts_with = "ids")]
        filter: Option<String>,
    },
    /// Show the number the next invoice of a type will receive
    NextNumber {
        #[arg(short = 't', long = "type")]
        variant: String,
    },
    /// Insert a few demonstration invoices
    Sample,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct AddArgs {
    /// inward or outward
    #[arg(short = 't', long = "type")]
    pub variant: String,

    #[arg(short, long, visible_alias = "customer")]
    pub party: String,

    /// YYYY-MM-DD, defaults to today
    #[arg(long)]
    pub date: Option<String>,

    /// Line item as `description=amount`; may be repeated
    #[arg(short, long = "item")]
    pub items: Vec<String>,

    /// Defaults to the sum of the line items
    #[arg(long)]
    pub total: Option<String>,

    #[arg(short, long)]
    pub notes: Option<String>,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct EditArgs {
    pub id: String,

    #[arg(short, long, visible_alias = "customer")]
    pub party: Option<String>,

    #[arg(long)]
    pub date: Option<String>,

    /// Replaces all line items; may be repeated
    #[arg(short, long = "item")]
    pub items: Vec<String>,

    /// Remove all line items
    #[arg(long, conflicts_with = "items")]
    pub clear_items: bool,

    #[arg(long)]
    pub total: Option<String>,

    #[arg(short, long)]
    pub notes: Option<String>,

    #[arg(long, conflicts_with = "notes")]
    pub clear_notes: bool,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_database")]
    pub database: DatabaseConfig,

    #[serde(default = "default_export")]
    pub export: ExportConfig,

    #[serde(default = "default_logging")]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Sqlite,
    Memory,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DatabaseConfig {
    #[serde(default = "default_backend")]
    pub backend: BackendKind,

    /// SQLite file, or `:memory:`
    #[serde(default = "default_database_path")]
    pub path: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ExportConfig {
    /// Where exports go when no path is given on the command line.
    #[serde(default = "default_export_directory")]
    pub directory: PathBuf,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

fn default_database() -> DatabaseConfig {
    DatabaseConfig {
        backend: default_backend(),
        path: default_database_path(),
    }
}

fn default_export() -> ExportConfig {
    ExportConfig {
        directory: default_export_directory(),
    }
}

fn default_logging() -> LoggingConfig {
    LoggingConfig {
        level: default_log_level(),
        json: false,
    }
}

fn default_backend() -> BackendKind {
    BackendKind::Sqlite
}

fn default_database_path() -> String {
    "invoices.db".to_string()
}

fn default_export_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database: default_database(),
            export: default_export(),
            logging: default_logging(),
        }
    }
}

impl Config {
    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn load(cli: &CliArgs) -> Self {
        let mut config = match std::fs::read_to_string(&cli.config) {
            Ok(contents) => Self::from_toml(&contents).unwrap_or_else(|e| {
                eprintln!("Warning: Failed to parse config file: {}", e);
                Config::default()
            }),
            Err(_) => Config::default(),
        };

        // CLI overrides
        if let Some(ref path) = cli.database {
            config.database.path = path.clone();
        }
        if let Some(ref level) = cli.log_level {
            config.logging.level = level.clone();
        }

        config
    }
}
