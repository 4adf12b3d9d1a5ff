//! Mock command CLI handler.

use crate::datagen::FakeSynthesizer;
use crate::db::{Database, IndexConstraints};
use crate::error::MockError;
use crate::mocker::{MockConfig, MockOutcome, MockReport, Mocker, Prompt, SkipPolicy};
use crate::schema::{catalog_for, SqlDialect};
use anyhow::Context;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;
use tracing::info;

pub struct MockArgs {
    pub database: PathBuf,
    pub rows: Option<usize>,
    pub tables: Option<Vec<String>>,
    pub schema: Option<String>,
    pub exclude: Vec<String>,
    pub dialect: Option<String>,
    pub config: Option<PathBuf>,
    pub ignore_constraints: bool,
    pub yes: bool,
    pub seed: Option<u64>,
    pub atomic_skip: bool,
    pub batch_rows: Option<usize>,
    pub backup_dir: Option<PathBuf>,
    pub progress: bool,
    pub dry_run: bool,
    pub json: bool,
}

/// Yes/no prompt on the terminal. Ctrl-C and Ctrl-D count as "no".
struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn confirm(&mut self, question: &str) -> Result<bool, MockError> {
        let mut editor = DefaultEditor::new().map_err(|e| MockError::Prompt {
            source: Box::new(e),
        })?;
        match editor.readline(&format!("{} [y/N] ", question)) {
            Ok(answer) => Ok(is_yes(&answer)),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(false),
            Err(e) => Err(MockError::Prompt {
                source: Box::new(e),
            }),
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

pub fn run(args: MockArgs) -> anyhow::Result<()> {
    let dialect = args
        .dialect
        .map(|d| d.parse::<SqlDialect>())
        .transpose()
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    let config = MockConfig::builder()
        .config_file(args.config)
        .rows(args.rows)
        .tables(args.tables)
        .schema(args.schema)
        .exclude(args.exclude)
        .dialect(dialect)
        .ignore_constraints(args.ignore_constraints)
        .auto_confirm(args.yes)
        .seed(args.seed)
        .skip_policy(args.atomic_skip.then_some(SkipPolicy::Atomic))
        .batch_rows(args.batch_rows)
        .backup_dir(args.backup_dir)
        .progress(args.progress)
        .dry_run(args.dry_run)
        .build()?;

    let database = Database::open(&args.database)?;
    let catalog = catalog_for(config.dialect, database.connection());
    let tables = config.selection.apply(
        catalog
            .tables()
            .with_context(|| format!("Failed to list tables in {}", database.location()))?,
        &config.exclude,
    );
    info!(
        "Mocking {} ({} dialect, {} rows per table)",
        database.location(),
        config.dialect,
        config.rows
    );

    let mut synthesizer = FakeSynthesizer::new(config.seed);
    let mut constraints = IndexConstraints::new(database.connection(), config.backup_dir.clone());
    let mut prompt = TerminalPrompt;

    let report = {
        let mut mocker = Mocker::new(
            config,
            catalog.as_ref(),
            &database,
            &mut synthesizer,
            &mut constraints,
            &mut prompt,
        );
        mocker.run(&tables)
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, constraints.backup_file());
    }

    if let MockOutcome::Aborted { stage, reason } = &report.outcome {
        if args.json {
            if let Some(file) = constraints.backup_file() {
                eprintln!("DDL backup: {}", file.display());
            }
        }
        anyhow::bail!("Mocking failed during {}: {}", stage, reason);
    }
    Ok(())
}

fn print_report(report: &MockReport, backup_file: Option<&std::path::Path>) {
    match &report.outcome {
        MockOutcome::NothingToDo => {
            println!("No tables to mock.");
            return;
        }
        MockOutcome::Declined => {
            println!("Nothing was written.");
            return;
        }
        MockOutcome::NoEligibleColumns => {
            println!("No columns available to mock.");
            return;
        }
        MockOutcome::Planned => {
            println!("Dry run, nothing was written.");
            println!();
            println!("Tables to load:");
            for collection in &report.planned {
                println!(
                    "  {}: {}",
                    collection.table,
                    collection.column_names().join(", ")
                );
            }
            for table in &report.sequence_only_tables {
                println!("  {}: (default values)", table);
            }
            for table in &report.excluded_tables {
                println!("  {}: (excluded, nothing to mock)", table);
            }
            return;
        }
        MockOutcome::Completed | MockOutcome::Aborted { .. } => {}
    }

    println!();
    println!("Mock Statistics:");
    println!("  Tables requested: {}", report.tables_requested);
    println!("  Tables processed: {}", report.tables_processed);
    println!("  Rows committed: {}", report.rows_committed);
    if !report.sequence_only_tables.is_empty() {
        println!(
            "  Sequence-only tables: {}",
            report.sequence_only_tables.join(", ")
        );
    }
    println!("  Elapsed time: {:.3}s", report.duration_secs);
    if let Some(file) = backup_file {
        println!("  DDL backup: {}", file.display());
    }

    if !report.skipped_tables.is_empty() {
        println!();
        println!("Skipped tables (unsupported data types):");
        for skipped in &report.skipped_tables {
            println!(
                "  {}: column {} ({}), {} rows kept",
                skipped.table, skipped.column, skipped.datatype, skipped.rows_committed
            );
        }
    }
}
