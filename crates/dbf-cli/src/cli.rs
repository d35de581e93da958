//! CLI argument definitions for the DBF inspector.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "dbf",
    version,
    about = "Inspect and dump dBASE / FoxPro DBF tables",
    long_about = "Inspect and dump dBASE / FoxPro DBF tables.\n\n\
                  Reads the file header and field descriptors, decodes records\n\
                  with the table's code page and resolves FoxPro memo fields."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the table header and field layout.
    Info(TableArgs),

    /// Print the table's records.
    Dump(DumpArgs),
}

/// Arguments shared by every command that opens a table.
#[derive(Args)]
pub struct TableArgs {
    /// Path to the DBF table.
    #[arg(value_name = "TABLE")]
    pub path: PathBuf,

    /// Memo file holding the table's memo fields (.fpt).
    #[arg(long = "memo", value_name = "PATH")]
    pub memo: Option<PathBuf>,

    /// Decode text with this encoding instead of the table's code page.
    #[arg(long = "encoding", value_name = "LABEL")]
    pub encoding: Option<String>,
}

#[derive(Args)]
pub struct DumpArgs {
    #[command(flatten)]
    pub table: TableArgs,

    /// Stop after this many records.
    #[arg(long = "limit", value_name = "N")]
    pub limit: Option<usize>,

    /// Leave out records marked as deleted.
    #[arg(long = "skip-deleted")]
    pub skip_deleted: bool,

    /// Output format.
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: DumpFormatArg,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum DumpFormatArg {
    Text,
    Json,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
