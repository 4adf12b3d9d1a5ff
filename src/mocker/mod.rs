//! Mock orchestration: classify tables, relax constraints, load synthetic
//! rows table by table, fill sequence-only tables, restore constraints and
//! report skipped tables.
//!
//! This module provides:
//! - Column classification (`classify`)
//! - Row synthesis per table (`synth`)
//! - CSV bulk-load encoding and per-table commit (`copy`)
//! - Default-value loading for sequence-only tables (`sequence`)
//! - The `Mocker` state machine tying them together
//!
//! The run is strictly sequential: one table at a time, one row at a
//! time. Fatal errors never escape [`Mocker::run`]; they end the run with
//! [`MockOutcome::Aborted`].

mod classify;
mod config;
mod copy;
mod sequence;
mod synth;

pub use classify::{
    classify_table, classify_tables, is_sequence_backed, Classification, ClassifiedTables,
    TableCollection, SEQUENCE_DEFAULT_PREFIX,
};
pub use config::{
    default_backup_dir, MockConfig, MockConfigBuilder, MockYamlConfig, SkipPolicy,
    DEFAULT_BATCH_ROWS, DEFAULT_ROWS,
};
pub use copy::{load_table, CopyPayload, LoadOptions, TableCommitter, TableLoad, DELIMITER, QUOTE};
pub use sequence::load_sequence_only;
pub use synth::{Row, RowSynthesizer, SynthFailure};

use crate::datagen::ValueSynthesizer;
use crate::db::{ConstraintManager, Target};
use crate::error::MockError;
use crate::progress::Progress;
use crate::schema::{ColumnSource, TableDescriptor};
use ahash::AHashSet;
use serde::Serialize;
use std::fmt;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Asks the operator whether to continue.
pub trait Prompt {
    fn confirm(&mut self, question: &str) -> Result<bool, MockError>;
}

/// Stages of a run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MockStage {
    Entry,
    Confirmation,
    Classification,
    ConstraintRemoval,
    Load,
    SequenceLoad,
    ConstraintRestore,
    Report,
}

impl fmt::Display for MockStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MockStage::Entry => "entry",
            MockStage::Confirmation => "confirmation",
            MockStage::Classification => "classification",
            MockStage::ConstraintRemoval => "constraint removal",
            MockStage::Load => "load",
            MockStage::SequenceLoad => "sequence-only load",
            MockStage::ConstraintRestore => "constraint restore",
            MockStage::Report => "report",
        };
        f.write_str(name)
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MockOutcome {
    /// No tables were given
    NothingToDo,
    /// The operator declined the confirmation prompt
    Declined,
    /// No table has a column to synthesize
    NoEligibleColumns,
    /// Dry run: classification only
    Planned,
    /// Every stage ran
    Completed,
    /// A fatal error stopped the run
    Aborted { stage: MockStage, reason: String },
}

/// A table abandoned because of an unsupported datatype
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedTable {
    pub table: String,
    pub column: String,
    pub datatype: String,
    pub rows_committed: usize,
}

/// Tables skipped during a run, each recorded once, in skip order
#[derive(Debug, Default)]
pub struct SkippedTables {
    entries: Vec<SkippedTable>,
    seen: AHashSet<String>,
}

impl SkippedTables {
    /// Record a skip. Returns false if the table was already recorded.
    pub fn record(&mut self, entry: SkippedTable) -> bool {
        if !self.seen.insert(entry.table.clone()) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.table.clone()).collect()
    }

    pub fn entries(&self) -> &[SkippedTable] {
        &self.entries
    }
}

/// Per-table load statistics
#[derive(Debug, Clone, Serialize)]
pub struct TableMockStats {
    pub table: String,
    pub rows_requested: usize,
    #[serde(flatten)]
    pub load: TableLoad,
}

/// Result of a run
#[derive(Debug, Clone, Serialize)]
pub struct MockReport {
    #[serde(flatten)]
    pub outcome: MockOutcome,
    /// Tables handed to the run
    pub tables_requested: usize,
    /// Tables loaded or attempted, sequence-only tables included
    pub tables_processed: usize,
    /// Rows written across all tables
    pub rows_committed: u64,
    /// Tables classified for literal loading
    pub planned: Vec<TableCollection>,
    pub sequence_only_tables: Vec<String>,
    pub excluded_tables: Vec<String>,
    pub skipped_tables: Vec<SkippedTable>,
    pub table_stats: Vec<TableMockStats>,
    pub duration_secs: f64,
}

impl MockReport {
    fn new(tables_requested: usize) -> Self {
        Self {
            outcome: MockOutcome::NothingToDo,
            tables_requested,
            tables_processed: 0,
            rows_committed: 0,
            planned: Vec::new(),
            sequence_only_tables: Vec::new(),
            excluded_tables: Vec::new(),
            skipped_tables: Vec::new(),
            table_stats: Vec::new(),
            duration_secs: 0.0,
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self.outcome, MockOutcome::Aborted { .. })
    }
}

type StageResult<T> = Result<T, (MockStage, MockError)>;

fn at(stage: MockStage) -> impl FnOnce(MockError) -> (MockStage, MockError) {
    move |e| (stage, e)
}

fn names(tables: &[TableDescriptor]) -> Vec<String> {
    tables.iter().map(|t| t.qualified_name()).collect()
}

/// Runs the mocking pipeline over its collaborators
pub struct Mocker<'a> {
    config: MockConfig,
    catalog: &'a dyn ColumnSource,
    target: &'a dyn Target,
    synthesizer: &'a mut dyn ValueSynthesizer,
    constraints: &'a mut dyn ConstraintManager,
    prompt: &'a mut dyn Prompt,
    progress: Progress,
    skipped: SkippedTables,
    sequence_only: Vec<TableDescriptor>,
}

impl<'a> Mocker<'a> {
    pub fn new(
        config: MockConfig,
        catalog: &'a dyn ColumnSource,
        target: &'a dyn Target,
        synthesizer: &'a mut dyn ValueSynthesizer,
        constraints: &'a mut dyn ConstraintManager,
        prompt: &'a mut dyn Prompt,
    ) -> Self {
        let progress = Progress::new(config.progress);
        Self {
            config,
            catalog,
            target,
            synthesizer,
            constraints,
            prompt,
            progress,
            skipped: SkippedTables::default(),
            sequence_only: Vec::new(),
        }
    }

    pub fn config(&self) -> &MockConfig {
        &self.config
    }

    /// Mock every table in `tables`. Each call starts with empty skip and
    /// sequence-only lists.
    pub fn run(&mut self, tables: &[TableDescriptor]) -> MockReport {
        let start = Instant::now();
        self.skipped = SkippedTables::default();
        self.sequence_only = Vec::new();

        let mut report = MockReport::new(tables.len());
        report.outcome = match self.execute(tables, &mut report) {
            Ok(outcome) => outcome,
            Err((stage, e)) => {
                error!("Mocking aborted during {}: {}", stage, e);
                MockOutcome::Aborted {
                    stage,
                    reason: e.to_string(),
                }
            }
        };
        report.skipped_tables = self.skipped.entries().to_vec();
        report.sequence_only_tables = names(&self.sequence_only);
        report.duration_secs = start.elapsed().as_secs_f64();
        report
    }

    fn execute(
        &mut self,
        tables: &[TableDescriptor],
        report: &mut MockReport,
    ) -> StageResult<MockOutcome> {
        if tables.is_empty() {
            warn!("No table available to mock the data, closing the program");
            return Ok(MockOutcome::NothingToDo);
        }
        debug!("Total number of tables to mock: {}", tables.len());
        info!("Beginning the mocking process for the tables");

        if !self.config.auto_confirm && !self.config.dry_run {
            let question = format!(
                "About to load {} mock rows into each of {} tables with their constraints removed. Continue?",
                self.config.rows,
                tables.len()
            );
            if !self
                .prompt
                .confirm(&question)
                .map_err(at(MockStage::Confirmation))?
            {
                info!("Mocking declined by the operator");
                return Ok(MockOutcome::Declined);
            }
        }

        let classified = self.classify(tables).map_err(at(MockStage::Classification))?;
        report.planned = classified.collections.clone();
        report.excluded_tables = names(&classified.excluded);
        for table in &classified.excluded {
            debug!("Table {} has no columns to mock, ignoring it", table);
        }
        self.sequence_only = classified.sequence_only;

        if classified.collections.is_empty() {
            warn!("No columns available to mock the data, closing the program");
            return Ok(MockOutcome::NoEligibleColumns);
        }
        if self.config.dry_run {
            info!(
                "Dry run: {} tables to load, {} sequence-only tables",
                classified.collections.len(),
                self.sequence_only.len()
            );
            return Ok(MockOutcome::Planned);
        }

        if !self.config.ignore_constraints {
            self.constraints
                .backup()
                .map_err(at(MockStage::ConstraintRemoval))?;
            for collection in &classified.collections {
                self.constraints
                    .remove(&collection.table)
                    .map_err(at(MockStage::ConstraintRemoval))?;
            }
        }

        info!(
            "Total numbers of tables to mock: {}",
            classified.collections.len()
        );
        for collection in &classified.collections {
            let load = self
                .load_collection(collection)
                .map_err(at(MockStage::Load))?;
            report.tables_processed += 1;
            report.rows_committed += load.committed() as u64;
            report.table_stats.push(TableMockStats {
                table: collection.table.qualified_name(),
                rows_requested: self.config.rows,
                load,
            });
        }

        let inserted = load_sequence_only(
            &self.sequence_only,
            self.config.rows,
            self.target,
            &self.progress,
        )
        .map_err(at(MockStage::SequenceLoad))?;
        report.tables_processed += self.sequence_only.len();
        report.rows_committed += inserted;

        if !self.config.ignore_constraints {
            self.constraints
                .restore()
                .map_err(at(MockStage::ConstraintRestore))?;
        }

        if !self.skipped.is_empty() {
            warn!(
                "These tables are skipped since these data types are not supported: {}",
                self.skipped.names().join(",")
            );
        }
        info!(
            "Completed loading mock data to {} tables",
            report.tables_processed
        );
        Ok(MockOutcome::Completed)
    }

    /// Read every table's columns and classify them.
    fn classify(&self, tables: &[TableDescriptor]) -> Result<ClassifiedTables, MockError> {
        info!("Extracting the columns and data type information");
        let bar = self.progress.bar(
            tables.len() as u64,
            "Extracting column information from tables",
        );

        let mut classified = ClassifiedTables::default();
        for table in tables {
            let columns = self.catalog.columns(table)?;
            classified.add(table, &columns);
            bar.inc(1);
        }
        bar.finish_and_clear();
        Ok(classified)
    }

    fn load_collection(&mut self, collection: &TableCollection) -> Result<TableLoad, MockError> {
        let table = &collection.table;
        debug!("Building and loading mock data to the table {}", table);

        let bar = self
            .progress
            .bar(self.config.rows as u64, format!("Mocking Table {}", table));
        let options = LoadOptions {
            rows: self.config.rows,
            batch_rows: self.config.batch_rows,
            skip_policy: self.config.skip_policy,
        };
        let load = load_table(collection, &mut *self.synthesizer, self.target, &options, &bar)?;

        if let TableLoad::Skipped {
            committed,
            column,
            datatype,
            ..
        } = &load
        {
            self.skipped.record(SkippedTable {
                table: table.qualified_name(),
                column: column.clone(),
                datatype: datatype.clone(),
                rows_committed: *committed,
            });
            bar.abandon_with_message(format!("Skipped {}", table));
        } else {
            bar.finish();
        }
        Ok(load)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Session;
    use crate::error::SynthError;
    use crate::schema::ColumnDescriptor;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    type Events = Rc<RefCell<Vec<String>>>;

    struct FakeCatalog {
        tables: Vec<(TableDescriptor, Vec<ColumnDescriptor>)>,
    }

    impl ColumnSource for FakeCatalog {
        fn tables(&self) -> Result<Vec<TableDescriptor>, MockError> {
            Ok(self.tables.iter().map(|(t, _)| t.clone()).collect())
        }

        fn columns(&self, table: &TableDescriptor) -> Result<Vec<ColumnDescriptor>, MockError> {
            Ok(self
                .tables
                .iter()
                .find(|(t, _)| t == table)
                .map(|(_, c)| c.clone())
                .unwrap_or_default())
        }
    }

    /// `text` always works, `geometry` is unknown, `broken` is invalid,
    /// `flaky` stops being supported after `flaky_budget` values and
    /// `fragile` turns invalid after the same budget.
    struct ScriptedSynth {
        produced: usize,
        flaky_budget: usize,
    }

    impl ScriptedSynth {
        fn new() -> Self {
            Self {
                produced: 0,
                flaky_budget: usize::MAX,
            }
        }
    }

    impl ValueSynthesizer for ScriptedSynth {
        fn synthesize(&mut self, datatype: &str) -> Result<String, SynthError> {
            match datatype {
                "geometry" => Err(SynthError::Unsupported {
                    datatype: datatype.to_string(),
                }),
                "broken" => Err(SynthError::Invalid {
                    datatype: datatype.to_string(),
                    reason: "cannot be generated".to_string(),
                }),
                "flaky" if self.flaky_budget == 0 => Err(SynthError::Unsupported {
                    datatype: datatype.to_string(),
                }),
                "fragile" if self.flaky_budget == 0 => Err(SynthError::Invalid {
                    datatype: datatype.to_string(),
                    reason: "ran out of values".to_string(),
                }),
                _ => {
                    if datatype == "flaky" || datatype == "fragile" {
                        self.flaky_budget -= 1;
                    }
                    self.produced += 1;
                    Ok(format!("v{}", self.produced))
                }
            }
        }
    }

    #[derive(Default)]
    struct RecordingTarget {
        events: Events,
        commits: RefCell<Vec<(String, Vec<String>, usize)>>,
        open_sessions: Rc<Cell<usize>>,
        sessions_opened: Cell<usize>,
        fail_commit_on: Option<String>,
    }

    impl RecordingTarget {
        fn rows_committed(&self, table: &str) -> usize {
            self.commits
                .borrow()
                .iter()
                .filter(|(t, _, _)| t == table)
                .map(|(_, _, rows)| rows)
                .sum()
        }
    }

    struct RecordingSession<'t> {
        target: &'t RecordingTarget,
    }

    impl Session for RecordingSession<'_> {
        fn bulk_commit(
            &mut self,
            table: &TableDescriptor,
            columns: &[String],
            payload: &CopyPayload,
        ) -> Result<(), MockError> {
            let name = table.qualified_name();
            if self.target.fail_commit_on.as_deref() == Some(name.as_str()) {
                return Err(MockError::Commit {
                    table: name,
                    statement: "COPY".to_string(),
                    payload: payload.describe(),
                    source: "connection reset".into(),
                });
            }
            self.target
                .events
                .borrow_mut()
                .push(format!("commit {}", name));
            self.target
                .commits
                .borrow_mut()
                .push((name, columns.to_vec(), payload.rows()));
            Ok(())
        }
    }

    impl Drop for RecordingSession<'_> {
        fn drop(&mut self) {
            let open = &self.target.open_sessions;
            open.set(open.get() - 1);
        }
    }

    impl Target for RecordingTarget {
        fn open_session(&self) -> Result<Box<dyn Session + '_>, MockError> {
            self.open_sessions.set(self.open_sessions.get() + 1);
            self.sessions_opened.set(self.sessions_opened.get() + 1);
            Ok(Box::new(RecordingSession { target: self }))
        }

        fn insert_default_row(&self, table: &TableDescriptor) -> Result<(), MockError> {
            self.events
                .borrow_mut()
                .push(format!("default {}", table.qualified_name()));
            Ok(())
        }
    }

    struct RecordingConstraints {
        events: Events,
    }

    impl ConstraintManager for RecordingConstraints {
        fn backup(&mut self) -> Result<(), MockError> {
            self.events.borrow_mut().push("backup".to_string());
            Ok(())
        }

        fn remove(&mut self, table: &TableDescriptor) -> Result<(), MockError> {
            self.events
                .borrow_mut()
                .push(format!("remove {}", table.qualified_name()));
            Ok(())
        }

        fn restore(&mut self) -> Result<(), MockError> {
            self.events.borrow_mut().push("restore".to_string());
            Ok(())
        }
    }

    struct Answer {
        yes: bool,
        asked: usize,
    }

    impl Prompt for Answer {
        fn confirm(&mut self, _question: &str) -> Result<bool, MockError> {
            self.asked += 1;
            Ok(self.yes)
        }
    }

    struct Harness {
        catalog: FakeCatalog,
        target: RecordingTarget,
        synth: ScriptedSynth,
        constraints: RecordingConstraints,
        prompt: Answer,
        events: Events,
    }

    impl Harness {
        fn new(tables: Vec<(TableDescriptor, Vec<ColumnDescriptor>)>) -> Self {
            let events = Events::default();
            Self {
                catalog: FakeCatalog { tables },
                target: RecordingTarget {
                    events: events.clone(),
                    ..Default::default()
                },
                synth: ScriptedSynth::new(),
                constraints: RecordingConstraints {
                    events: events.clone(),
                },
                prompt: Answer {
                    yes: true,
                    asked: 0,
                },
                events,
            }
        }

        fn run(&mut self, config: MockConfig) -> MockReport {
            let tables = self.catalog.tables().unwrap();
            self.run_tables(config, &tables)
        }

        fn run_tables(&mut self, config: MockConfig, tables: &[TableDescriptor]) -> MockReport {
            let mut mocker = Mocker::new(
                config,
                &self.catalog,
                &self.target,
                &mut self.synth,
                &mut self.constraints,
                &mut self.prompt,
            );
            mocker.run(tables)
        }

        fn events(&self) -> Vec<String> {
            self.events.borrow().clone()
        }
    }

    fn config(rows: usize) -> MockConfig {
        MockConfig {
            rows,
            auto_confirm: true,
            ..MockConfig::default()
        }
    }

    fn table(name: &str) -> TableDescriptor {
        TableDescriptor::new("public", name)
    }

    fn serial(name: &str) -> ColumnDescriptor {
        ColumnDescriptor::new(name, "integer").with_default("nextval('seq'::regclass)")
    }

    fn text(name: &str) -> ColumnDescriptor {
        ColumnDescriptor::new(name, "text")
    }

    #[test]
    fn test_users_table_loads_name_column_only() {
        let mut h = Harness::new(vec![(table("users"), vec![serial("id"), text("name")])]);
        let report = h.run(config(3));

        assert_eq!(report.outcome, MockOutcome::Completed);
        let commits = h.target.commits.borrow().clone();
        assert_eq!(
            commits,
            vec![(
                "\"public\".\"users\"".to_string(),
                vec!["name".to_string()],
                3
            )]
        );
        assert_eq!(report.rows_committed, 3);
        assert_eq!(report.planned[0].column_names(), vec!["name"]);
    }

    #[test]
    fn test_sequence_only_table_gets_default_rows() {
        let mut h = Harness::new(vec![
            (table("users"), vec![serial("id"), text("name")]),
            (table("counter"), vec![serial("id")]),
        ]);
        let report = h.run(config(5));

        assert_eq!(report.outcome, MockOutcome::Completed);
        assert_eq!(report.sequence_only_tables, vec!["\"public\".\"counter\""]);
        assert!(report.planned.iter().all(|c| c.table != table("counter")));
        let defaults = h
            .events()
            .iter()
            .filter(|e| *e == "default \"public\".\"counter\"")
            .count();
        assert_eq!(defaults, 5);
        assert_eq!(h.target.rows_committed("\"public\".\"counter\""), 0);
        assert_eq!(report.tables_processed, 2);
        assert_eq!(report.rows_committed, 10);
    }

    #[test]
    fn test_unsupported_table_is_skipped_and_run_continues() {
        let mut h = Harness::new(vec![
            (table("orders"), vec![text("note"), ColumnDescriptor::new("shape", "geometry")]),
            (table("users"), vec![serial("id"), text("name")]),
        ]);
        let report = h.run(config(10));

        assert_eq!(report.outcome, MockOutcome::Completed);
        assert_eq!(h.target.rows_committed("\"public\".\"orders\""), 0);
        assert_eq!(h.target.rows_committed("\"public\".\"users\""), 10);
        assert_eq!(report.skipped_tables.len(), 1);
        assert_eq!(report.skipped_tables[0].table, "\"public\".\"orders\"");
        assert_eq!(report.skipped_tables[0].datatype, "geometry");
        assert_eq!(report.skipped_tables[0].rows_committed, 0);
    }

    #[test]
    fn test_skip_keeps_rows_before_the_failing_one() {
        let mut h = Harness::new(vec![(
            table("events"),
            vec![ColumnDescriptor::new("kind", "flaky")],
        )]);
        h.synth.flaky_budget = 4;
        let report = h.run(MockConfig {
            batch_rows: 3,
            ..config(10)
        });

        assert_eq!(h.target.rows_committed("\"public\".\"events\""), 4);
        assert_eq!(
            report.table_stats[0].load,
            TableLoad::Skipped {
                committed: 4,
                row: 4,
                column: "kind".to_string(),
                datatype: "flaky".to_string(),
            }
        );
        assert_eq!(report.skipped_tables.len(), 1);
    }

    #[test]
    fn test_atomic_skip_commits_nothing() {
        let mut h = Harness::new(vec![(
            table("events"),
            vec![ColumnDescriptor::new("kind", "flaky")],
        )]);
        h.synth.flaky_budget = 4;
        let report = h.run(MockConfig {
            batch_rows: 3,
            skip_policy: SkipPolicy::Atomic,
            ..config(10)
        });

        assert!(h.target.commits.borrow().is_empty());
        assert_eq!(report.skipped_tables[0].rows_committed, 0);
        assert_eq!(report.rows_committed, 0);
    }

    #[test]
    fn test_atomic_load_is_one_commit() {
        let mut h = Harness::new(vec![(table("users"), vec![text("name")])]);
        h.run(MockConfig {
            batch_rows: 2,
            skip_policy: SkipPolicy::Atomic,
            ..config(7)
        });
        assert_eq!(h.target.commits.borrow().len(), 1);
        assert_eq!(h.target.rows_committed("\"public\".\"users\""), 7);
    }

    #[test]
    fn test_fatal_error_loses_only_the_pending_batch() {
        let fragile = || {
            vec![(
                table("events"),
                vec![ColumnDescriptor::new("kind", "fragile")],
            )]
        };

        let mut per_row = Harness::new(fragile());
        per_row.synth.flaky_budget = 3;
        let report = per_row.run(MockConfig {
            batch_rows: 1,
            ..config(10)
        });
        assert!(report.is_aborted());
        assert_eq!(per_row.target.rows_committed("\"public\".\"events\""), 3);

        let mut batched = Harness::new(fragile());
        batched.synth.flaky_budget = 3;
        let report = batched.run(MockConfig {
            batch_rows: 4,
            ..config(10)
        });
        assert!(report.is_aborted());
        assert!(batched.target.commits.borrow().is_empty());
    }

    #[test]
    fn test_batches_split_commits() {
        let mut h = Harness::new(vec![(table("users"), vec![text("name")])]);
        h.run(MockConfig {
            batch_rows: 4,
            ..config(10)
        });
        let sizes: Vec<usize> = h.target.commits.borrow().iter().map(|c| c.2).collect();
        assert_eq!(sizes, vec![4, 4, 2]);
    }

    #[test]
    fn test_empty_table_list_does_nothing() {
        let mut h = Harness::new(vec![]);
        h.prompt.yes = false;
        let report = h.run_tables(
            MockConfig {
                auto_confirm: false,
                ..config(3)
            },
            &[],
        );

        assert_eq!(report.outcome, MockOutcome::NothingToDo);
        assert_eq!(h.prompt.asked, 0);
        assert!(h.events().is_empty());
    }

    #[test]
    fn test_declined_prompt_writes_nothing() {
        let mut h = Harness::new(vec![(table("users"), vec![text("name")])]);
        h.prompt.yes = false;
        let report = h.run(MockConfig {
            auto_confirm: false,
            ..config(3)
        });

        assert_eq!(report.outcome, MockOutcome::Declined);
        assert_eq!(h.prompt.asked, 1);
        assert!(h.events().is_empty());
    }

    #[test]
    fn test_auto_confirm_skips_prompt() {
        let mut h = Harness::new(vec![(table("users"), vec![text("name")])]);
        h.prompt.yes = false;
        let report = h.run(config(1));
        assert_eq!(report.outcome, MockOutcome::Completed);
        assert_eq!(h.prompt.asked, 0);
    }

    #[test]
    fn test_no_eligible_columns() {
        let mut h = Harness::new(vec![
            (table("pairs"), vec![serial("a"), serial("b")]),
            (table("counter"), vec![serial("id")]),
        ]);
        let report = h.run(config(3));

        assert_eq!(report.outcome, MockOutcome::NoEligibleColumns);
        assert_eq!(report.excluded_tables, vec!["\"public\".\"pairs\""]);
        assert!(h.events().is_empty());
    }

    #[test]
    fn test_constraint_lifecycle_order() {
        let mut h = Harness::new(vec![
            (table("a"), vec![text("x")]),
            (table("b"), vec![text("y")]),
            (table("c"), vec![serial("id")]),
        ]);
        h.run(config(1));

        assert_eq!(
            h.events(),
            vec![
                "backup",
                "remove \"public\".\"a\"",
                "remove \"public\".\"b\"",
                "commit \"public\".\"a\"",
                "commit \"public\".\"b\"",
                "default \"public\".\"c\"",
                "restore",
            ]
        );
    }

    #[test]
    fn test_ignore_constraints_leaves_them_alone() {
        let mut h = Harness::new(vec![(table("a"), vec![text("x")])]);
        let report = h.run(MockConfig {
            ignore_constraints: true,
            ..config(2)
        });

        assert_eq!(report.outcome, MockOutcome::Completed);
        assert_eq!(h.events(), vec!["commit \"public\".\"a\""]);
    }

    #[test]
    fn test_commit_failure_aborts_before_restore() {
        let mut h = Harness::new(vec![
            (table("a"), vec![text("x")]),
            (table("b"), vec![text("y")]),
            (table("c"), vec![text("z")]),
        ]);
        h.target.fail_commit_on = Some("\"public\".\"b\"".to_string());
        let report = h.run(config(2));

        match &report.outcome {
            MockOutcome::Aborted { stage, reason } => {
                assert_eq!(*stage, MockStage::Load);
                assert!(reason.contains("\"public\".\"b\""));
                assert!(reason.contains("connection reset"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(report.is_aborted());
        assert_eq!(h.target.rows_committed("\"public\".\"c\""), 0);
        assert!(!h.events().contains(&"restore".to_string()));
        assert_eq!(h.target.open_sessions.get(), 0);
    }

    #[test]
    fn test_invalid_datatype_aborts_run() {
        let mut h = Harness::new(vec![
            (table("a"), vec![ColumnDescriptor::new("x", "broken")]),
            (table("b"), vec![text("y")]),
        ]);
        let report = h.run(config(2));

        assert!(matches!(
            report.outcome,
            MockOutcome::Aborted {
                stage: MockStage::Load,
                ..
            }
        ));
        assert!(report.skipped_tables.is_empty());
        assert!(h.target.commits.borrow().is_empty());
    }

    #[test]
    fn test_one_session_per_table_released() {
        let mut h = Harness::new(vec![
            (table("a"), vec![text("x")]),
            (table("b"), vec![ColumnDescriptor::new("g", "geometry")]),
            (table("c"), vec![text("z")]),
        ]);
        h.run(config(3));

        assert_eq!(h.target.sessions_opened.get(), 3);
        assert_eq!(h.target.open_sessions.get(), 0);
    }

    #[test]
    fn test_each_run_starts_fresh() {
        let mut h = Harness::new(vec![
            (table("orders"), vec![ColumnDescriptor::new("shape", "geometry")]),
            (table("counter"), vec![serial("id")]),
        ]);
        let tables = h.catalog.tables().unwrap();
        let mut mocker = Mocker::new(
            config(1),
            &h.catalog,
            &h.target,
            &mut h.synth,
            &mut h.constraints,
            &mut h.prompt,
        );
        let first = mocker.run(&tables);
        let second = mocker.run(&tables);

        assert_eq!(first.skipped_tables.len(), 1);
        assert_eq!(second.skipped_tables.len(), 1);
        assert_eq!(second.sequence_only_tables.len(), 1);
    }

    #[test]
    fn test_dry_run_plans_without_writing() {
        let mut h = Harness::new(vec![
            (table("users"), vec![serial("id"), text("name")]),
            (table("counter"), vec![serial("id")]),
        ]);
        let report = h.run(MockConfig {
            dry_run: true,
            auto_confirm: false,
            ..config(3)
        });

        assert_eq!(report.outcome, MockOutcome::Planned);
        assert_eq!(report.planned.len(), 1);
        assert_eq!(report.sequence_only_tables.len(), 1);
        assert_eq!(h.prompt.asked, 0);
        assert!(h.events().is_empty());
    }

    #[test]
    fn test_skipped_tables_recorded_once() {
        let mut skipped = SkippedTables::default();
        let entry = SkippedTable {
            table: "\"public\".\"orders\"".to_string(),
            column: "shape".to_string(),
            datatype: "geometry".to_string(),
            rows_committed: 0,
        };
        assert!(skipped.record(entry.clone()));
        assert!(!skipped.record(entry));
        assert_eq!(skipped.len(), 1);
    }

    #[test]
    fn test_report_serializes_outcome_inline() {
        let mut h = Harness::new(vec![(
            table("orders"),
            vec![ColumnDescriptor::new("shape", "geometry")],
        )]);
        let report = h.run(config(1));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcome"], "completed");
        assert_eq!(json["table_stats"][0]["status"], "skipped");
        assert_eq!(json["skipped_tables"][0]["datatype"], "geometry");
    }
}
