mod mock;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sql-mocker")]
#[command(version)]
#[command(about = "Fill database tables with synthetic rows", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load mock rows into the tables of a database
    Mock {
        /// Database file to mock (created if missing)
        database: PathBuf,

        /// Rows to generate per table [default: 10]
        #[arg(short, long)]
        rows: Option<usize>,

        /// Only mock specific tables (comma-separated, `table` or `schema.table`)
        #[arg(short, long, conflicts_with = "schema")]
        tables: Option<String>,

        /// Only mock tables in this schema
        #[arg(short, long)]
        schema: Option<String>,

        /// Exclude specific tables (comma-separated)
        #[arg(short, long)]
        exclude: Option<String>,

        /// Catalog dialect: postgres or greenplum [default: postgres]
        #[arg(short, long)]
        dialect: Option<String>,

        /// YAML config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Leave constraints in place while loading
        #[arg(long)]
        ignore_constraints: bool,

        /// Do not ask for confirmation
        #[arg(short = 'y', long)]
        yes: bool,

        /// Random seed for reproducible values
        #[arg(long)]
        seed: Option<u64>,

        /// Commit nothing for a table that has to be skipped
        #[arg(long)]
        atomic_skip: bool,

        /// Rows per bulk commit [default: 1000]
        #[arg(long)]
        batch_rows: Option<usize>,

        /// Directory for DDL backups
        #[arg(long)]
        backup_dir: Option<PathBuf>,

        /// Show progress during mocking
        #[arg(short, long)]
        progress: bool,

        /// Classify tables without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Output results as JSON
        #[arg(long)]
        json: bool,

        /// Verbose logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Log to stderr. `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn split_list(list: Option<String>) -> Option<Vec<String>> {
    list.map(|l| {
        l.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Mock {
            database,
            rows,
            tables,
            schema,
            exclude,
            dialect,
            config,
            ignore_constraints,
            yes,
            seed,
            atomic_skip,
            batch_rows,
            backup_dir,
            progress,
            dry_run,
            json,
            verbose,
        } => {
            init_logging(verbose);
            mock::run(mock::MockArgs {
                database,
                rows,
                tables: split_list(tables),
                schema,
                exclude: split_list(exclude).unwrap_or_default(),
                dialect,
                config,
                ignore_constraints,
                yes,
                seed,
                atomic_skip,
                batch_rows,
                backup_dir,
                progress: progress && !json,
                dry_run,
                json,
            })
        }
        Commands::Completions { shell } => {
            generate(
                shell,
                &mut Cli::command(),
                "sql-mocker",
                &mut io::stdout(),
            );
            Ok(())
        }
    }
}
