use std::path::PathBuf;

use clap::{Parser, Subcommand};
use gridbase_core::types::ColumnType;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Data directory holding the store and history files
    #[arg(long, global = true, default_value = "./data")]
    pub data_dir: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List tables
    Tables,

    /// Create a table
    CreateTable {
        name: String,
    },

    /// Delete a table with its columns and records
    DeleteTable {
        table: u64,
    },

    /// Print a table's columns and records
    Show {
        /// Table to show (defaults to the first table)
        #[arg(short, long)]
        table: Option<u64>,

        /// Column to sort by
        #[arg(long)]
        sort: Option<u64>,

        /// Sort descending
        #[arg(long, requires = "sort")]
        desc: bool,
    },

    /// Add a column
    AddColumn {
        name: String,

        /// Column type
        #[arg(long = "type", default_value = "text")]
        column_type: ColumnType,

        #[arg(short, long)]
        table: Option<u64>,
    },

    /// Rename a column
    RenameColumn {
        column: u64,
        name: String,
    },

    /// Delete a column and its values
    DeleteColumn {
        column: u64,
    },

    /// Change a column's type, converting stored values
    SetType {
        column: u64,
        column_type: ColumnType,
    },

    /// Move a column between positions
    MoveColumn {
        from: usize,
        to: usize,

        #[arg(short, long)]
        table: Option<u64>,
    },

    /// Add a row, optionally with values as COLUMN=VALUE
    AddRow {
        #[arg(short, long)]
        table: Option<u64>,

        #[arg(long = "set", value_parser = parse_assignment)]
        values: Vec<(u64, String)>,
    },

    /// Set one cell
    SetCell {
        record: u64,
        column: u64,
        value: String,

        #[arg(short, long)]
        table: Option<u64>,
    },

    /// Delete a row
    DeleteRow {
        record: u64,

        #[arg(short, long)]
        table: Option<u64>,
    },

    /// Renumber a table's records to 1..N
    Reindex {
        #[arg(short, long)]
        table: Option<u64>,
    },

    /// Undo the last recorded action
    Undo,

    /// Redo the last undone action
    Redo,

    /// Print the undo history
    History,

    /// Create a table from an import JSON file
    Import {
        file: PathBuf,

        /// Table name (defaults to the file stem)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Write a table as JSON
    Export {
        table: u64,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn parse_assignment(raw: &str) -> Result<(u64, String), String> {
    let (column, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected COLUMN=VALUE, got '{}'", raw))?;
    let column = column
        .trim()
        .parse()
        .map_err(|_| format!("invalid column id '{}'", column))?;
    Ok((column, value.to_string()))
}
