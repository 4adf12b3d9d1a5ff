//! Configuration types for the mocker.

use crate::error::MockError;
use crate::schema::{SqlDialect, TableSelection};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Rows generated per table when nothing else is configured
pub const DEFAULT_ROWS: usize = 10;

/// Rows per bulk commit when nothing else is configured
pub const DEFAULT_BATCH_ROWS: usize = 1000;

/// What happens to rows already committed when a table is skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipPolicy {
    /// Rows built before the failing row stay in the table
    #[default]
    KeepPartial,
    /// The table is committed in one payload at the end, or not at all
    Atomic,
}

/// Runtime configuration for a mocking run
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Rows to generate per table
    pub rows: usize,
    /// Leave constraints alone: no backup, removal or restore
    pub ignore_constraints: bool,
    /// Skip the confirmation prompt
    pub auto_confirm: bool,
    /// Catalog flavor used for introspection
    pub dialect: SqlDialect,
    /// Partial-load handling for skipped tables
    pub skip_policy: SkipPolicy,
    /// Rows per bulk commit
    pub batch_rows: usize,
    /// Random seed for reproducible values
    pub seed: Option<u64>,
    /// Show progress bars
    pub progress: bool,
    /// Classify only, write nothing
    pub dry_run: bool,
    /// Tables to mock
    pub selection: TableSelection,
    /// Tables never mocked
    pub exclude: Vec<String>,
    /// Where DDL backups are written
    pub backup_dir: PathBuf,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            ignore_constraints: false,
            auto_confirm: false,
            dialect: SqlDialect::default(),
            skip_policy: SkipPolicy::default(),
            batch_rows: DEFAULT_BATCH_ROWS,
            seed: None,
            progress: false,
            dry_run: false,
            selection: TableSelection::All,
            exclude: Vec::new(),
            backup_dir: default_backup_dir(),
        }
    }
}

/// `<local data dir>/sql-mocker/backups`, or under the temp dir if the
/// platform has no data dir.
pub fn default_backup_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("sql-mocker")
        .join("backups")
}

impl MockConfig {
    /// Create a new builder
    pub fn builder() -> MockConfigBuilder {
        MockConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), MockError> {
        if self.rows == 0 {
            return Err(MockError::Config("rows must be at least 1".to_string()));
        }
        if self.batch_rows == 0 {
            return Err(MockError::Config(
                "batch rows must be at least 1".to_string(),
            ));
        }
        if let TableSelection::Tables(tables) = &self.selection {
            if tables.is_empty() {
                return Err(MockError::Config("table list is empty".to_string()));
            }
        }
        Ok(())
    }
}

/// Builder for MockConfig
#[derive(Default)]
pub struct MockConfigBuilder {
    config_file: Option<PathBuf>,
    rows: Option<usize>,
    ignore_constraints: bool,
    auto_confirm: bool,
    dialect: Option<SqlDialect>,
    skip_policy: Option<SkipPolicy>,
    batch_rows: Option<usize>,
    seed: Option<u64>,
    progress: bool,
    dry_run: bool,
    tables: Option<Vec<String>>,
    schema: Option<String>,
    exclude: Vec<String>,
    backup_dir: Option<PathBuf>,
}

impl MockConfigBuilder {
    pub fn config_file(mut self, path: Option<PathBuf>) -> Self {
        self.config_file = path;
        self
    }

    pub fn rows(mut self, rows: Option<usize>) -> Self {
        self.rows = rows;
        self
    }

    pub fn ignore_constraints(mut self, ignore: bool) -> Self {
        self.ignore_constraints = ignore;
        self
    }

    pub fn auto_confirm(mut self, auto_confirm: bool) -> Self {
        self.auto_confirm = auto_confirm;
        self
    }

    pub fn dialect(mut self, dialect: Option<SqlDialect>) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn skip_policy(mut self, policy: Option<SkipPolicy>) -> Self {
        self.skip_policy = policy;
        self
    }

    pub fn batch_rows(mut self, batch_rows: Option<usize>) -> Self {
        self.batch_rows = batch_rows;
        self
    }

    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn tables(mut self, tables: Option<Vec<String>>) -> Self {
        self.tables = tables;
        self
    }

    pub fn schema(mut self, schema: Option<String>) -> Self {
        self.schema = schema;
        self
    }

    pub fn exclude(mut self, exclude: Vec<String>) -> Self {
        self.exclude = exclude;
        self
    }

    pub fn backup_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.backup_dir = dir;
        self
    }

    /// Build the MockConfig. CLI values win over the YAML file.
    pub fn build(self) -> Result<MockConfig, MockError> {
        let yaml = match self.config_file {
            Some(ref path) => MockYamlConfig::load(path)?,
            None => MockYamlConfig::default(),
        };

        let tables = self.tables.or(yaml.tables);
        let schema = self.schema.or(yaml.schema);
        let selection = match (tables, schema) {
            (Some(tables), _) => TableSelection::Tables(tables),
            (None, Some(schema)) => TableSelection::Schema(schema),
            (None, None) => TableSelection::All,
        };

        let mut exclude = yaml.exclude.unwrap_or_default();
        exclude.extend(self.exclude);

        let config = MockConfig {
            rows: self.rows.or(yaml.rows).unwrap_or(DEFAULT_ROWS),
            ignore_constraints: self.ignore_constraints
                || yaml.ignore_constraints.unwrap_or(false),
            auto_confirm: self.auto_confirm || yaml.auto_confirm.unwrap_or(false),
            dialect: self.dialect.or(yaml.dialect).unwrap_or_default(),
            skip_policy: self.skip_policy.or(yaml.skip_policy).unwrap_or_default(),
            batch_rows: self
                .batch_rows
                .or(yaml.batch_rows)
                .unwrap_or(DEFAULT_BATCH_ROWS),
            seed: self.seed.or(yaml.seed),
            progress: self.progress,
            dry_run: self.dry_run,
            selection,
            exclude,
            backup_dir: self
                .backup_dir
                .or(yaml.backup_dir)
                .unwrap_or_else(default_backup_dir),
        };
        config.validate()?;
        Ok(config)
    }
}

/// YAML configuration file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MockYamlConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialect: Option<SqlDialect>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_constraints: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_confirm: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_policy: Option<SkipPolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_rows: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Mock every table in this schema
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Mock only these tables (`table` or `schema.table`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tables: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_dir: Option<PathBuf>,
}

impl MockYamlConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self, MockError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| MockError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        serde_yaml_ng::from_str(&content)
            .map_err(|e| MockError::Config(format!("cannot parse {}: {}", path.display(), e)))
    }
}
