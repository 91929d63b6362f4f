//! Artefact assembly and validation.

use super::policy::denied_rule;
use crate::artifact::domain::{
    AssemblyError, OptimizationResult, RewrittenQuery, Section, SqlStatement,
};
use crate::rewrite::domain::{OPTIMIZED_SCHEMA_PREFIX, TableName, TargetLocation};
use crate::rewrite::services::{compile_pattern, parse, table_name};
use regex::Regex;
use sqlparser::ast::Statement;
use std::sync::LazyLock;
use tracing::warn;

const EXCERPT_CHARS: usize = 150;

const QUALIFIED: &str = r#"((?:[`"]?[\w$]+[`"]?\s*\.\s*){0,2}[`"]?[\w$]+[`"]?)"#;

static CREATE_TABLE_TARGET: LazyLock<Regex> = LazyLock::new(|| {
    compile_pattern(&format!(
        r"(?is)^\s*CREATE\s+TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?{QUALIFIED}"
    ))
});

static INSERT_TARGET: LazyLock<Regex> = LazyLock::new(|| {
    compile_pattern(&format!(r"(?is)^\s*INSERT\s+(?:INTO\s+)?{QUALIFIED}"))
});

static CREATE_SCHEMA: LazyLock<Regex> =
    LazyLock::new(|| compile_pattern(r"(?is)^\s*CREATE\s+SCHEMA\b"));

static READ_ONLY: LazyLock<Regex> =
    LazyLock::new(|| compile_pattern(r"(?is)^\s*(?:\(\s*)*(?:SELECT|WITH)\b"));

static OPTIMIZED_PATH: LazyLock<Regex> =
    LazyLock::new(|| compile_pattern(r"(?i)\b\w+\.optimized\w*\.\w+"));

static READS_TABLES: LazyLock<Regex> = LazyLock::new(|| compile_pattern(r"(?i)\b(?:FROM|JOIN)\b"));

/// Target of a statement that writes a table.
enum WriteTarget {
    Table(TableName),
    Unqualified,
    ReadOnly,
    Other,
}

/// Assembles artefacts for one target location and validates them.
#[derive(Debug, Clone)]
pub struct ArtifactAssembler {
    target: TargetLocation,
}

impl ArtifactAssembler {
    /// Creates an assembler for a target location.
    #[must_use]
    pub const fn new(target: TargetLocation) -> Self {
        Self { target }
    }

    /// Returns the target location.
    #[must_use]
    pub const fn target(&self) -> &TargetLocation {
        &self.target
    }

    /// Assembles and validates an artefact.
    ///
    /// Checks run in order: the deny-list over every statement, query id
    /// fidelity against `expected_ids`, the schema statement, then path
    /// qualification of tables and migrations. Queries that still read
    /// unoptimised paths are only logged.
    ///
    /// # Errors
    ///
    /// Returns the first [`AssemblyError`] found.
    pub fn assemble(
        &self,
        ddl: Vec<String>,
        migrations: Vec<String>,
        queries: Vec<RewrittenQuery>,
        expected_ids: &[String],
    ) -> Result<OptimizationResult, AssemblyError> {
        let result = OptimizationResult {
            ddl: ddl.into_iter().map(SqlStatement::new).collect(),
            migrations: migrations.into_iter().map(SqlStatement::new).collect(),
            queries,
        };
        check_policy(&result)?;
        check_query_ids(&result.queries, expected_ids)?;
        self.check_schema_statement(&result.ddl)?;
        self.check_table_paths(&result.ddl)?;
        self.check_migration_paths(&result.migrations)?;
        warn_unqualified_queries(&result.queries);
        Ok(result)
    }

    fn check_schema_statement(&self, ddl: &[SqlStatement]) -> Result<(), AssemblyError> {
        let creates_schema = ddl.first().is_some_and(|first| {
            parse(&first.statement).map_or_else(
                |_| CREATE_SCHEMA.is_match(&first.statement),
                |statements| matches!(statements.as_slice(), [Statement::CreateSchema { .. }]),
            )
        });
        if creates_schema {
            Ok(())
        } else {
            Err(AssemblyError::MissingSchemaStatement {
                expected: self.target.to_string(),
            })
        }
    }

    fn check_table_paths(&self, ddl: &[SqlStatement]) -> Result<(), AssemblyError> {
        for (index, item) in ddl.iter().enumerate().skip(1) {
            let in_target = match create_table_target(&item.statement) {
                WriteTarget::Table(name) => self.is_target_path(&name),
                WriteTarget::Unqualified | WriteTarget::ReadOnly | WriteTarget::Other => false,
            };
            if !in_target {
                return Err(self.unqualified(Section::Ddl, index, &item.statement));
            }
        }
        Ok(())
    }

    fn check_migration_paths(&self, migrations: &[SqlStatement]) -> Result<(), AssemblyError> {
        for (index, item) in migrations.iter().enumerate() {
            match insert_target(&item.statement) {
                WriteTarget::ReadOnly => {}
                WriteTarget::Table(name) if self.is_target_path(&name) => {}
                WriteTarget::Table(_) | WriteTarget::Unqualified => {
                    return Err(self.unqualified(Section::Migrations, index, &item.statement));
                }
                WriteTarget::Other => {
                    return Err(AssemblyError::UnexpectedMigration {
                        index,
                        excerpt: excerpt(&item.statement),
                    });
                }
            }
        }
        Ok(())
    }

    fn is_target_path(&self, name: &TableName) -> bool {
        let catalog_matches = name
            .catalog()
            .is_some_and(|catalog| catalog.eq_ignore_ascii_case(self.target.catalog()));
        let schema_optimized = name
            .schema()
            .is_some_and(TargetLocation::is_optimized_schema);
        catalog_matches && schema_optimized
    }

    fn unqualified(&self, section: Section, index: usize, statement: &str) -> AssemblyError {
        AssemblyError::UnqualifiedPath {
            section,
            index,
            expected: format!("{}.{OPTIMIZED_SCHEMA_PREFIX}*", self.target.catalog()),
            excerpt: excerpt(statement),
        }
    }
}

fn check_policy(result: &OptimizationResult) -> Result<(), AssemblyError> {
    let sections = [
        (Section::Ddl, &result.ddl),
        (Section::Migrations, &result.migrations),
    ];
    for (section, statements) in sections {
        for (index, item) in statements.iter().enumerate() {
            if let Some(rule) = denied_rule(&item.statement) {
                return Err(AssemblyError::PolicyViolation {
                    section,
                    index,
                    rule,
                });
            }
        }
    }
    for (index, item) in result.queries.iter().enumerate() {
        if let Some(rule) = denied_rule(&item.query) {
            return Err(AssemblyError::PolicyViolation {
                section: Section::Queries,
                index,
                rule,
            });
        }
    }
    Ok(())
}

fn check_query_ids(queries: &[RewrittenQuery], expected: &[String]) -> Result<(), AssemblyError> {
    let produced: Vec<&String> = queries.iter().map(|query| &query.queryid).collect();
    if produced.iter().copied().eq(expected.iter()) {
        return Ok(());
    }
    Err(AssemblyError::QueryIdMismatch {
        expected: expected.to_vec(),
        produced: produced.into_iter().cloned().collect(),
    })
}

fn warn_unqualified_queries(queries: &[RewrittenQuery]) {
    for (index, item) in queries.iter().enumerate() {
        if READS_TABLES.is_match(&item.query) && !OPTIMIZED_PATH.is_match(&item.query) {
            warn!(
                index,
                queryid = %item.queryid,
                "query does not reference an optimised table path"
            );
        }
    }
}

fn create_table_target(sql: &str) -> WriteTarget {
    let Ok(statements) = parse(sql) else {
        return pattern_target(&CREATE_TABLE_TARGET, sql);
    };
    match statements.as_slice() {
        [Statement::CreateTable(create)] => qualified_target(table_name(&create.name).ok()),
        _ => WriteTarget::Other,
    }
}

fn insert_target(sql: &str) -> WriteTarget {
    let Ok(statements) = parse(sql) else {
        if READ_ONLY.is_match(sql) {
            return WriteTarget::ReadOnly;
        }
        return pattern_target(&INSERT_TARGET, sql);
    };
    match statements.as_slice() {
        [Statement::Insert(insert)] => qualified_target(table_name(&insert.table_name).ok()),
        [Statement::Query(_)] => WriteTarget::ReadOnly,
        _ => WriteTarget::Other,
    }
}

fn qualified_target(name: Option<TableName>) -> WriteTarget {
    match name {
        Some(found) if found.is_fully_qualified() => WriteTarget::Table(found),
        Some(_) | None => WriteTarget::Unqualified,
    }
}

fn pattern_target(pattern: &Regex, sql: &str) -> WriteTarget {
    let Some(captured) = pattern.captures(sql).and_then(|captures| captures.get(1)) else {
        return WriteTarget::Other;
    };
    qualified_target(TableName::from_parts(captured.as_str().split('.').map(str::trim)).ok())
}

fn excerpt(statement: &str) -> String {
    statement.chars().take(EXCERPT_CHARS).collect()
}
