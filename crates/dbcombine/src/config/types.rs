//! Configuration type definitions.

use serde::{Deserialize, Serialize};

/// Default rows per INSERT statement.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source database (read-only).
    pub source: DatabaseConfig,

    /// Target database (created if missing).
    pub target: DatabaseConfig,

    /// Combine behavior configuration.
    #[serde(default)]
    pub combine: CombineConfig,
}

/// Location of one database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// File path or `sqlite:` connection string.
    pub location: String,
}

impl DatabaseConfig {
    /// Create a database config from a location.
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }
}

/// Combine behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CombineConfig {
    /// Rows per INSERT statement (default: 500).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,

    /// Tables to include (glob patterns). Empty means all tables.
    #[serde(default)]
    pub include_tables: Vec<String>,

    /// Tables to exclude (glob patterns).
    #[serde(default)]
    pub exclude_tables: Vec<String>,

    /// Report what would be merged without writing to the target.
    #[serde(default)]
    pub dry_run: bool,
}

impl CombineConfig {
    pub fn get_batch_size(&self) -> usize {
        self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE)
    }

    /// Check a table name against the include/exclude patterns.
    ///
    /// Exclusion wins over inclusion. Matching is case-insensitive.
    pub fn includes_table(&self, name: &str) -> bool {
        let included = self.include_tables.is_empty()
            || self.include_tables.iter().any(|p| glob_match(p, name));
        included && !self.exclude_tables.iter().any(|p| glob_match(p, name))
    }
}

/// Match `name` against a glob pattern supporting `*` and `?`.
fn glob_match(pattern: &str, name: &str) -> bool {
    let p: Vec<char> = pattern.to_lowercase().chars().collect();
    let n: Vec<char> = name.to_lowercase().chars().collect();

    let (mut pi, mut ni) = (0, 0);
    let mut star: Option<usize> = None;
    let mut mark = 0;

    while ni < n.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == n[ni]) {
            pi += 1;
            ni += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some(pi);
            mark = ni;
            pi += 1;
        } else if let Some(s) = star {
            pi = s + 1;
            mark += 1;
            ni = mark;
        } else {
            return false;
        }
    }

    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}
