//! Target schema and migration rendering.

use crate::advisor::domain::{DEFAULT_COMPRESSION, StrategyDocument, TableStrategy};
use crate::rewrite::domain::{TableCatalog, TableMetadata, TableName, TargetLocation};

const STORAGE_FORMAT: &str = "ICEBERG";

/// Quotes an identifier unless it is a plain word.
#[must_use]
pub fn quote_identifier(identifier: &str) -> String {
    let mut chars = identifier.chars();
    let plain = chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
    if plain {
        identifier.to_owned()
    } else {
        format!("\"{}\"", identifier.replace('"', "\"\""))
    }
}

fn quote_name(name: &TableName) -> String {
    name.parts()
        .iter()
        .map(|part| quote_identifier(part))
        .collect::<Vec<_>>()
        .join(".")
}

fn string_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn array_property(key: &str, columns: &[&str]) -> Option<String> {
    if columns.is_empty() {
        return None;
    }
    let items: Vec<String> = columns.iter().map(|column| string_literal(column)).collect();
    Some(format!("{key} = ARRAY[{}]", items.join(", ")))
}

/// Keeps the strategy columns the table actually has, using the table's
/// own spelling.
fn existing_columns<'a>(table: &'a TableMetadata, requested: &[String]) -> Vec<&'a str> {
    let mut kept: Vec<&str> = Vec::new();
    for column in requested {
        let found = table
            .column_names()
            .find(|name| name.eq_ignore_ascii_case(column));
        if let Some(name) = found.filter(|name| !kept.contains(name)) {
            kept.push(name);
        }
    }
    kept
}

/// Renders the statement creating the target schema.
#[must_use]
pub fn render_schema_statement(target: &TargetLocation) -> String {
    format!(
        "CREATE SCHEMA IF NOT EXISTS {}.{}",
        quote_identifier(target.catalog()),
        quote_identifier(target.schema())
    )
}

/// Renders the `CREATE TABLE` for one table in the target schema.
///
/// Partition and cluster columns the table lacks are dropped. Tables
/// without a strategy keep no layout and the default codec.
#[must_use]
pub fn render_table_ddl(
    table: &TableMetadata,
    strategy: Option<&TableStrategy>,
    target: &TargetLocation,
) -> String {
    let columns: Vec<String> = table
        .columns()
        .iter()
        .map(|column| format!("{} {}", quote_identifier(column.name()), column.data_type()))
        .collect();
    let codec = strategy
        .map(|chosen| chosen.compression.trim().to_ascii_uppercase())
        .filter(|codec| !codec.is_empty())
        .unwrap_or_else(|| DEFAULT_COMPRESSION.to_owned());
    let partition = strategy
        .map(|chosen| existing_columns(table, &chosen.partition_columns))
        .unwrap_or_default();
    let cluster = strategy
        .map(|chosen| existing_columns(table, &chosen.cluster_columns))
        .unwrap_or_default();

    let mut properties = vec![
        format!("format = {}", string_literal(STORAGE_FORMAT)),
        format!("compression_codec = {}", string_literal(&codec)),
    ];
    properties.extend(array_property("partitioning", &partition));
    properties.extend(array_property("clustering", &cluster));

    format!(
        "CREATE TABLE {} (\n  {}\n) WITH (\n  {}\n)",
        quote_name(&target.qualify(table.name().table())),
        columns.join(",\n  "),
        properties.join(",\n  ")
    )
}

/// Renders the full target DDL: schema creation, then one table per
/// catalog entry in catalog order.
#[must_use]
pub fn render_target_ddl(
    catalog: &TableCatalog,
    strategy: &StrategyDocument,
    target: &TargetLocation,
) -> Vec<String> {
    std::iter::once(render_schema_statement(target))
        .chain(catalog.iter().map(|table| {
            render_table_ddl(table, strategy.for_table(table.name().table()), target)
        }))
        .collect()
}

/// Renders the statement copying a source table into the target schema.
#[must_use]
pub fn render_copy_migration(table: &TableMetadata, target: &TargetLocation) -> String {
    let columns: Vec<String> = table
        .column_names()
        .map(quote_identifier)
        .collect();
    let column_list = columns.join(", ");
    format!(
        "INSERT INTO {} ({column_list}) SELECT {column_list} FROM {}",
        quote_name(&target.qualify(table.name().table())),
        quote_name(table.name())
    )
}

/// Renders one copy per catalog table followed by the advisor's extra
/// migrations.
#[must_use]
pub fn render_migrations(
    catalog: &TableCatalog,
    strategy: &StrategyDocument,
    target: &TargetLocation,
) -> Vec<String> {
    catalog
        .iter()
        .map(|table| render_copy_migration(table, target))
        .chain(
            strategy
                .migrations
                .iter()
                .map(|migration| migration.statement.trim().to_owned()),
        )
        .collect()
}
