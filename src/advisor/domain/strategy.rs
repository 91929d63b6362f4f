//! Strategy document proposed by the advisor.

use serde::{Deserialize, Serialize};

/// Codec used when a table strategy names none.
pub const DEFAULT_COMPRESSION: &str = "ZSTD";

/// Compression codecs the target storage accepts.
pub const SUPPORTED_CODECS: &[&str] = &["ZSTD", "SNAPPY", "GZIP", "LZ4", "ZLIB", "NONE"];

/// Upper bound on partition columns per table.
pub const MAX_PARTITION_COLUMNS: usize = 2;

/// Upper bound on cluster columns per table.
pub const MAX_CLUSTER_COLUMNS: usize = 4;

/// Physical layout strategy for the tables of one request.
///
/// # Examples
///
/// ```
/// use sqlagent::advisor::domain::StrategyDocument;
///
/// let document: StrategyDocument = serde_json::from_str(
///     r#"{"tables": [{"table_name": "orders", "partition_columns": ["order_date"]}]}"#,
/// )
/// .expect("valid strategy");
/// assert_eq!(document.tables[0].compression, "ZSTD");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyDocument {
    /// Per-table layout choices.
    pub tables: Vec<TableStrategy>,
    /// Extra migration statements, run after the generated copies.
    #[serde(default)]
    pub migrations: Vec<MigrationProposal>,
}

impl StrategyDocument {
    /// Finds the strategy for a table by its unqualified name.
    #[must_use]
    pub fn for_table(&self, table: &str) -> Option<&TableStrategy> {
        self.tables
            .iter()
            .find(|strategy| strategy.unqualified_name().eq_ignore_ascii_case(table))
    }
}

/// Layout choices for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStrategy {
    /// Table name, optionally qualified.
    pub table_name: String,
    /// Columns to partition by.
    #[serde(default)]
    pub partition_columns: Vec<String>,
    /// Columns to cluster (sort) by.
    #[serde(default)]
    pub cluster_columns: Vec<String>,
    /// Storage compression codec.
    #[serde(default = "default_compression")]
    pub compression: String,
    /// Free-text explanation from the advisor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

impl TableStrategy {
    /// Returns the last dot-separated part of the table name.
    #[must_use]
    pub fn unqualified_name(&self) -> &str {
        self.table_name
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .trim_matches(|c| matches!(c, '"' | '`'))
    }
}

/// Extra migration statement proposed by the advisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationProposal {
    /// SQL text.
    pub statement: String,
}

fn default_compression() -> String {
    DEFAULT_COMPRESSION.to_owned()
}
