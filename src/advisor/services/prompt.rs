//! Prompt rendering with `minijinja`.

use crate::advisor::domain::{
    ColumnSummary, MAX_CLUSTER_COLUMNS, MAX_PARTITION_COLUMNS, QuerySummary, RepairRequest,
    SUPPORTED_CODECS, StatisticsByTable, StrategyContext, StrategyPrompt, TableSummary,
};
use crate::rewrite::domain::TableCatalog;
use minijinja::Environment;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

const STRATEGY_TEMPLATE: &str = r#"You are a data layout specialist. Propose a storage strategy for the tables below.
New tables will be created in {{ target }}.

{% for table in tables -%}
Table: {{ table.name }}
Row count: {{ table.row_count if table.row_count is not none else "unknown" }}
Size: {{ table.size_bytes if table.size_bytes is not none else "unknown" }} bytes
Columns:
{% for column in table.columns -%}
- {{ column.name }} {{ column.data_type }} (distinct: {{ column.distinct_values if column.distinct_values is not none else "unknown" }})
{% endfor %}
{% endfor -%}
Workload:
{% for query in queries -%}
- [{{ query.queryid }}] x{{ query.runquantity }}: {{ query.query }}
{% else -%}
- none
{% endfor %}
Return JSON in exactly this shape:
{"tables": [{"table_name": "<table>", "partition_columns": ["<column>"], "cluster_columns": ["<column>"], "compression": "ZSTD", "rationale": "<short reason>"}], "migrations": [{"statement": "INSERT INTO {{ target }}.<table> ..."}]}

Rules:
- At most {{ max_partition }} partition columns per table; prefer date or timestamp columns with many distinct values.
- At most {{ max_cluster }} cluster columns per table; prefer columns used in joins and filters.
- Only use tables and columns listed above.
- Supported codecs: {{ codecs | join(", ") }}.
- "migrations" is optional; use it only for extra statements that write into {{ target }}.
- Return ONLY valid JSON.
{% if repair %}
REPAIR REQUIRED: your previous output was rejected.
Issues detected:
{% for issue in repair.issues -%}
- {{ issue }}
{% endfor %}
{%- if repair.kind == "json_syntax" %}
JSON SYNTAX:
- Remove every trailing comma before } or ]
- Use double quotes for strings
- Do not wrap the answer in markdown or add comments
- Start with { and end with }
{% else %}
SCHEMA:
- Keep the exact field names shown above
- Name only tables and columns listed above
- Respect the column limits and the codec list
- Migrations must insert into {{ target }}.<table>
{% endif %}
Previous invalid output (first 800 chars):
{{ repair.previous_output }}
{% endif %}"#;

/// Errors returned while rendering prompts.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PromptError {
    /// The template engine rejected the template or its context.
    #[error("failed to render advisor prompt for attempt {attempt}: {reason}")]
    TemplateRender {
        /// Attempt being rendered.
        attempt: u32,
        /// Template engine message.
        reason: String,
    },
}

#[derive(Serialize)]
struct PromptView<'a> {
    target: &'a str,
    tables: &'a [TableSummary],
    queries: &'a [QuerySummary],
    repair: Option<&'a RepairRequest>,
    max_partition: usize,
    max_cluster: usize,
    codecs: &'a [&'a str],
}

/// Summarises catalog tables for the prompt, merging any statistics.
#[must_use]
pub fn summarise_tables(catalog: &TableCatalog, statistics: &StatisticsByTable) -> Vec<TableSummary> {
    catalog
        .iter()
        .map(|table| {
            let figures = statistics.get(&table.name().lookup_key());
            TableSummary {
                name: table.name().to_string(),
                columns: table
                    .columns()
                    .iter()
                    .map(|column| ColumnSummary {
                        name: column.name().to_owned(),
                        data_type: column.data_type().to_owned(),
                        distinct_values: figures
                            .and_then(|stats| stats.distinct_count(column.name())),
                    })
                    .collect(),
                row_count: figures.and_then(|stats| stats.row_count()),
                size_bytes: figures.and_then(|stats| stats.size_bytes()),
            }
        })
        .collect()
}

/// Renders the prompt for one attempt.
///
/// # Errors
///
/// Returns [`PromptError::TemplateRender`] when rendering fails.
pub fn render_prompt(
    context: Arc<StrategyContext>,
    attempt: u32,
    repair: Option<RepairRequest>,
) -> Result<StrategyPrompt, PromptError> {
    let environment = Environment::new();
    let view = PromptView {
        target: &context.target,
        tables: &context.tables,
        queries: &context.queries,
        repair: repair.as_ref(),
        max_partition: MAX_PARTITION_COLUMNS,
        max_cluster: MAX_CLUSTER_COLUMNS,
        codecs: SUPPORTED_CODECS,
    };
    let text = environment
        .render_str(STRATEGY_TEMPLATE, view)
        .map_err(|error| PromptError::TemplateRender {
            attempt,
            reason: error.to_string(),
        })?;
    Ok(StrategyPrompt::new(context, attempt, repair, text))
}
