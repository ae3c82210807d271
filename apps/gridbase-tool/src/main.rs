//! CLI for inspecting and editing a gridbase data directory.
//!
//! Every invocation opens the data directory, runs one engine operation
//! and exits. The undo history persists between invocations.

mod cli;

use std::fs;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use gridbase_core::engine::{ImportData, UpdateOptions};
use gridbase_core::model::{RecordData, TableId};
use gridbase_core::observer::{EngineObserver, NotificationLevel};
use gridbase_core::session::SortDirection;
use gridbase_core::value::Value;
use gridbase_core::{DbConfig, Engine, Session};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

/// Prints engine notifications to stderr.
struct ConsoleObserver;

impl EngineObserver for ConsoleObserver {
    fn notify(&self, level: NotificationLevel, message: &str) {
        match level {
            NotificationLevel::Success => eprintln!("{}", message),
            NotificationLevel::Warning => eprintln!("warning: {}", message),
            NotificationLevel::Error => eprintln!("error: {}", message),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = DbConfig::with_data_dir(&cli.data_dir);
    let mut engine = Engine::open(config)
        .with_context(|| format!("Failed to open {}", cli.data_dir.display()))?
        .with_observer(Arc::new(ConsoleObserver));
    let mut session = Session::new();
    engine.load_tables(&mut session)?;

    run(cli.command, &mut engine, &mut session)
}

fn run(command: Commands, engine: &mut Engine, session: &mut Session) -> Result<()> {
    match command {
        Commands::Tables => {
            for table in session.tables() {
                println!("{}\t{}", table.id, table.name);
            }
        }
        Commands::CreateTable { name } => {
            let id = engine.create_table(session, &name)?;
            println!("{}", id);
        }
        Commands::DeleteTable { table } => engine.delete_table(session, table)?,
        Commands::Show { table, sort, desc } => {
            select(engine, session, table)?;
            if let Some(column) = sort {
                let direction = if desc {
                    SortDirection::Descending
                } else {
                    SortDirection::Ascending
                };
                session.set_sort(column, direction);
            }
            print_table(session);
        }
        Commands::AddColumn {
            name,
            column_type,
            table,
        } => {
            let table = select(engine, session, table)?;
            let id = engine.add_column(session, table, &name, column_type)?;
            println!("{}", id);
        }
        Commands::RenameColumn { column, name } => engine.rename_column(session, column, &name)?,
        Commands::DeleteColumn { column } => engine.delete_column(session, column)?,
        Commands::SetType {
            column,
            column_type,
        } => {
            let change = engine.update_column_type(session, column, column_type)?;
            println!("{}", serde_json::to_string_pretty(&change)?);
        }
        Commands::MoveColumn { from, to, table } => {
            select(engine, session, table)?;
            engine.move_column(session, from, to)?;
        }
        Commands::AddRow { table, values } => {
            select(engine, session, table)?;
            let id = if values.is_empty() {
                engine.add_row(session)?
            } else {
                let data: RecordData = values
                    .into_iter()
                    .map(|(column, value)| (column, Value::from(value)))
                    .collect();
                engine.add_row_with_data(session, data)?
            };
            println!("{}", id);
        }
        Commands::SetCell {
            record,
            column,
            value,
            table,
        } => {
            select(engine, session, table)?;
            engine.update_cell(
                session,
                record,
                column,
                Value::from(value),
                UpdateOptions::default(),
            )?;
        }
        Commands::DeleteRow { record, table } => {
            select(engine, session, table)?;
            engine.delete_record(session, record)?;
        }
        Commands::Reindex { table } => {
            select(engine, session, table)?;
            let count = engine.reindex_records(session)?;
            println!("{}", count);
        }
        Commands::Undo => {
            if !engine.undo(session)? {
                eprintln!("Nothing to undo");
            }
        }
        Commands::Redo => {
            if !engine.redo(session)? {
                eprintln!("Nothing to redo");
            }
        }
        Commands::History => {
            let history = engine.history();
            for (index, action) in history.actions().iter().enumerate() {
                let marker = if index as i64 == history.cursor() { "*" } else { " " };
                println!("{} {}\t{}", marker, index, action.describe());
            }
        }
        Commands::Import { file, name } => {
            let contents = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let data: ImportData = serde_json::from_str(&contents)
                .with_context(|| format!("Invalid import file {}", file.display()))?;
            let name = match name {
                Some(name) => name,
                None => file
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .context("Import file has no name; pass --name")?,
            };
            let id = engine.import_table(session, &name, &data)?;
            println!("{}", id);
        }
        Commands::Export { table, output } => {
            let export = engine.export_table(table)?;
            let json = serde_json::to_string_pretty(&export)?;
            match output {
                Some(path) => fs::write(&path, json)
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => println!("{}", json),
            }
        }
    }
    Ok(())
}

/// Makes `table` current when given, and returns the current table.
fn select(engine: &mut Engine, session: &mut Session, table: Option<TableId>) -> Result<TableId> {
    if let Some(table) = table {
        engine.switch_table(session, table)?;
    }
    match session.current_table_id() {
        Some(id) => Ok(id),
        None => bail!("No tables yet; create one with create-table"),
    }
}

fn print_table(session: &Session) {
    let header: Vec<String> = std::iter::once("id".to_string())
        .chain(
            session
                .columns()
                .iter()
                .map(|column| format!("{} [{}:{}]", column.name, column.id, column.column_type)),
        )
        .collect();
    println!("{}", header.join("\t"));

    for record in session.sorted_records() {
        let row: Vec<String> = std::iter::once(record.id.to_string())
            .chain(session.columns().iter().map(|column| {
                record
                    .value(column.id)
                    .map(Value::to_text)
                    .unwrap_or_default()
            }))
            .collect();
        println!("{}", row.join("\t"));
    }
}
