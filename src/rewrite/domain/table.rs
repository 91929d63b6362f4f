//! Table names, column specifications, and the per-task table catalog.

use super::{RewriteDomainError, RewriteTier};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

const MAX_NAME_PARTS: usize = 3;

/// Dotted table reference with one to three parts.
///
/// Parts are stored without surrounding quotes. A three-part name is
/// `catalog.schema.table`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableName {
    parts: Vec<String>,
}

impl TableName {
    /// Creates a table name from its dotted parts.
    ///
    /// # Errors
    ///
    /// Returns [`RewriteDomainError::EmptyTableName`] when no part is given
    /// or a part is blank, and [`RewriteDomainError::TooManyNameParts`] when
    /// more than three parts are given.
    pub fn from_parts<I, S>(parts: I) -> Result<Self, RewriteDomainError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cleaned: Vec<String> = parts
            .into_iter()
            .map(|part| strip_quotes(&part.into()))
            .collect();
        if cleaned.is_empty() || cleaned.iter().any(String::is_empty) {
            return Err(RewriteDomainError::EmptyTableName);
        }
        if cleaned.len() > MAX_NAME_PARTS {
            return Err(RewriteDomainError::TooManyNameParts(cleaned.join(".")));
        }
        Ok(Self { parts: cleaned })
    }

    /// Parses a dotted, optionally quoted name such as `"hive"."sales".orders`.
    ///
    /// # Errors
    ///
    /// Returns [`RewriteDomainError`] under the same conditions as
    /// [`Self::from_parts`].
    pub fn parse(raw: &str) -> Result<Self, RewriteDomainError> {
        Self::from_parts(raw.trim().split('.'))
    }

    /// Creates a fully qualified `catalog.schema.table` name.
    #[must_use]
    pub fn qualified(
        catalog: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            parts: vec![catalog.into(), schema.into(), table.into()],
        }
    }

    /// Returns the name parts in order.
    #[must_use]
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Returns the bare table part.
    #[must_use]
    pub fn table(&self) -> &str {
        self.parts.last().map_or("", String::as_str)
    }

    /// Returns the schema part when the name has at least two parts.
    #[must_use]
    pub fn schema(&self) -> Option<&str> {
        self.parts.iter().rev().nth(1).map(String::as_str)
    }

    /// Returns the catalog part of a fully qualified name.
    #[must_use]
    pub fn catalog(&self) -> Option<&str> {
        if self.is_fully_qualified() {
            self.parts.first().map(String::as_str)
        } else {
            None
        }
    }

    /// Returns `true` for `catalog.schema.table` names.
    #[must_use]
    pub fn is_fully_qualified(&self) -> bool {
        self.parts.len() == MAX_NAME_PARTS
    }

    /// Returns the case-insensitive catalog lookup key.
    #[must_use]
    pub fn lookup_key(&self) -> String {
        self.table().to_ascii_lowercase()
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.parts.join("."))
    }
}

fn strip_quotes(part: &str) -> String {
    part.trim()
        .trim_matches(|c| matches!(c, '"' | '`' | '[' | ']'))
        .to_owned()
}

/// Column name and normalised type text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnSpec {
    name: String,
    data_type: String,
}

impl ColumnSpec {
    /// Creates a column specification.
    ///
    /// The type text is upper-cased and its whitespace normalised so the
    /// structural and pattern tiers describe the same type identically.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: &str) -> Self {
        Self {
            name: strip_quotes(&name.into()),
            data_type: normalize_type(data_type),
        }
    }

    /// Returns the column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the normalised type text.
    #[must_use]
    pub fn data_type(&self) -> &str {
        &self.data_type
    }
}

/// Normalises SQL type text: upper case, single spaces, and no spaces
/// around `(`, `)`, `,`, `<` or `>`.
fn normalize_type(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;
    for ch in raw.trim().chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        let is_delimiter = matches!(ch, '(' | ')' | ',' | '<' | '>');
        if pending_space && !is_delimiter && !out.is_empty() && !out.ends_with(['(', ',', '<']) {
            out.push(' ');
        }
        pending_space = false;
        out.push(ch.to_ascii_uppercase());
    }
    out
}

/// Immutable description of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetadata {
    name: TableName,
    columns: Vec<ColumnSpec>,
    partition_columns: BTreeSet<String>,
    cluster_columns: BTreeSet<String>,
    tier: RewriteTier,
}

impl TableMetadata {
    /// Creates metadata with no partitioning or clustering.
    #[must_use]
    pub const fn new(name: TableName, columns: Vec<ColumnSpec>, tier: RewriteTier) -> Self {
        Self {
            name,
            columns,
            partition_columns: BTreeSet::new(),
            cluster_columns: BTreeSet::new(),
            tier,
        }
    }

    /// Sets the partition columns (stored lower-case).
    #[must_use]
    pub fn with_partition_columns(mut self, columns: impl IntoIterator<Item = String>) -> Self {
        self.partition_columns = lowercase_set(columns);
        self
    }

    /// Sets the cluster columns (stored lower-case).
    #[must_use]
    pub fn with_cluster_columns(mut self, columns: impl IntoIterator<Item = String>) -> Self {
        self.cluster_columns = lowercase_set(columns);
        self
    }

    /// Returns the table name as written in the statement.
    #[must_use]
    pub const fn name(&self) -> &TableName {
        &self.name
    }

    /// Returns the columns in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Returns the column names in declaration order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(ColumnSpec::name)
    }

    /// Returns `true` when the table declares the column (case-insensitive).
    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.columns
            .iter()
            .any(|spec| spec.name().eq_ignore_ascii_case(column))
    }

    /// Returns the partition columns.
    #[must_use]
    pub const fn partition_columns(&self) -> &BTreeSet<String> {
        &self.partition_columns
    }

    /// Returns the cluster columns.
    #[must_use]
    pub const fn cluster_columns(&self) -> &BTreeSet<String> {
        &self.cluster_columns
    }

    /// Returns the tier that produced this metadata.
    #[must_use]
    pub const fn tier(&self) -> RewriteTier {
        self.tier
    }
}

fn lowercase_set(columns: impl IntoIterator<Item = String>) -> BTreeSet<String> {
    columns
        .into_iter()
        .map(|column| strip_quotes(&column).to_ascii_lowercase())
        .filter(|column| !column.is_empty())
        .collect()
}

/// Table metadata keyed by case-insensitive bare table name.
///
/// Insertion order is preserved so generated statements are deterministic.
/// A later definition of the same table replaces the earlier one in place.
/// Lookups ignore catalog and schema, so `a.x.users` and `a.y.users` share
/// one entry and a reference to either resolves to the last definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableCatalog {
    tables: Vec<TableMetadata>,
    index: HashMap<String, usize>,
}

impl TableCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a table definition.
    pub fn insert(&mut self, metadata: TableMetadata) {
        let key = metadata.name().lookup_key();
        let existing = self.index.get(&key).copied();
        if let Some(slot) = existing.and_then(|position| self.tables.get_mut(position)) {
            *slot = metadata;
            return;
        }
        self.index.insert(key, self.tables.len());
        self.tables.push(metadata);
    }

    /// Looks up a table by bare name.
    #[must_use]
    pub fn get(&self, table: &str) -> Option<&TableMetadata> {
        self.index
            .get(&table.to_ascii_lowercase())
            .and_then(|position| self.tables.get(*position))
    }

    /// Looks up a table by any-part name, ignoring its qualifiers.
    #[must_use]
    pub fn resolve(&self, name: &TableName) -> Option<&TableMetadata> {
        self.get(name.table())
    }

    /// Iterates tables in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &TableMetadata> {
        self.tables.iter()
    }

    /// Returns the number of tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns `true` when no table is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl FromIterator<TableMetadata> for TableCatalog {
    fn from_iter<T: IntoIterator<Item = TableMetadata>>(iter: T) -> Self {
        let mut catalog = Self::new();
        for metadata in iter {
            catalog.insert(metadata);
        }
        catalog
    }
}
