//! Structural tier: rewrites backed by a full SQL parse.
//!
//! Every transformation here walks the parsed AST with the `sqlparser`
//! visitors, so nested queries, joins, and CTE bodies are covered without
//! textual matching.

use crate::rewrite::domain::{
    ColumnSpec, RewriteNote, RewriteTier, TableCatalog, TableMetadata, TableName,
    TargetLocation, TierFailure,
};
use sqlparser::ast::{
    CreateTable, Expr, Function, GroupByExpr, Ident, JoinConstraint, JoinOperator, ObjectName,
    Query, Select, SelectItem, SetExpr, SqlOption, Statement, TableFactor, TableWithJoins, Value,
    Visit, VisitMut, Visitor, VisitorMut, WildcardAdditionalOptions, visit_expressions,
};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use std::collections::{BTreeSet, HashSet};
use std::convert::Infallible;
use std::ops::ControlFlow;

const AGGREGATE_FUNCTIONS: &[&str] = &[
    "count",
    "count_if",
    "sum",
    "avg",
    "min",
    "max",
    "array_agg",
    "string_agg",
    "listagg",
    "approx_distinct",
    "approx_percentile",
    "stddev",
    "variance",
    "bool_and",
    "bool_or",
    "arbitrary",
    "any_value",
];

const PARTITION_OPTION_KEYS: &[&str] = &["partitioning", "partitioned_by"];
const CLUSTER_OPTION_KEYS: &[&str] = &["clustering", "sorted_by", "bucketed_by"];

/// Parses SQL text into statements with the generic dialect.
pub(crate) fn parse(sql: &str) -> Result<Vec<Statement>, TierFailure> {
    Parser::parse_sql(&GenericDialect {}, sql).map_err(|err| TierFailure::Parser(err.to_string()))
}

fn parse_single(sql: &str) -> Result<Statement, TierFailure> {
    let mut statements = parse(sql)?;
    if statements.len() != 1 {
        return Err(TierFailure::StatementCount(statements.len()));
    }
    statements.pop().ok_or(TierFailure::StatementCount(0))
}

/// Extracts metadata for every `CREATE TABLE` with a column list.
///
/// Other statements in the text are ignored.
pub(crate) fn table_metadata(sql: &str) -> Result<Vec<TableMetadata>, TierFailure> {
    let tables: Vec<TableMetadata> = parse(sql)?
        .iter()
        .filter_map(|statement| match statement {
            Statement::CreateTable(create) if !create.columns.is_empty() => {
                Some(describe_create_table(create))
            }
            _ => None,
        })
        .collect::<Result<_, _>>()?;
    if tables.is_empty() {
        return Err(TierFailure::NotCreateTable);
    }
    Ok(tables)
}

fn describe_create_table(create: &CreateTable) -> Result<TableMetadata, TierFailure> {
    let name = table_name(&create.name)?;
    let columns = create
        .columns
        .iter()
        .map(|column| ColumnSpec::new(column.name.value.as_str(), &column.data_type.to_string()))
        .collect();
    let (partition, cluster) = layout_options(&create.with_options);
    Ok(TableMetadata::new(name, columns, RewriteTier::Structural)
        .with_partition_columns(partition)
        .with_cluster_columns(cluster))
}

/// Converts a parsed object name into a domain table name.
pub(crate) fn table_name(name: &ObjectName) -> Result<TableName, TierFailure> {
    TableName::from_parts(name.0.iter().map(|ident| ident.value.as_str()))
        .map_err(|_| TierFailure::MissingTableName)
}

fn layout_options(options: &[SqlOption]) -> (Vec<String>, Vec<String>) {
    let mut partition = Vec::new();
    let mut cluster = Vec::new();
    for option in options {
        let SqlOption::KeyValue { key, value } = option else {
            continue;
        };
        let key_name = key.value.to_ascii_lowercase();
        if PARTITION_OPTION_KEYS.contains(&key_name.as_str()) {
            partition = string_list(value);
        } else if CLUSTER_OPTION_KEYS.contains(&key_name.as_str()) {
            cluster = string_list(value);
        }
    }
    (partition, cluster)
}

fn string_list(expr: &Expr) -> Vec<String> {
    match expr {
        Expr::Array(array) => array.elem.iter().filter_map(literal_text).collect(),
        other => literal_text(other).into_iter().collect(),
    }
}

fn literal_text(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Value(Value::SingleQuotedString(text) | Value::DoubleQuotedString(text)) => {
            Some(text.clone())
        }
        Expr::Identifier(ident) => Some(ident.value.clone()),
        _ => None,
    }
}

/// Inputs shared by every structural query rewrite of one task.
pub(crate) struct QueryContext<'a> {
    pub(crate) catalog: &'a TableCatalog,
    pub(crate) target: &'a TargetLocation,
    pub(crate) row_limit: u64,
}

/// Rewrites one statement structurally.
///
/// Queries receive star expansion, a row bound, path repointing, and layout
/// diagnostics. Other statements only have their table paths repointed.
pub(crate) fn rewrite_statement(
    sql: &str,
    context: &QueryContext<'_>,
) -> Result<(String, Vec<RewriteNote>), TierFailure> {
    let mut statement = parse_single(sql)?;
    let mut rewriter = StructuralRewriter {
        context,
        expand_stars: matches!(statement, Statement::Query(_)),
        cte_names: HashSet::new(),
        notes: Vec::new(),
    };
    let ControlFlow::Continue(()) = VisitMut::visit(&mut statement, &mut rewriter);
    let mut notes = rewriter.notes;

    if let Statement::Query(query) = &mut statement {
        if bound_rows(query, context.row_limit) {
            notes.push(RewriteNote::RowLimitAppended {
                limit: context.row_limit,
            });
        }
        let mut inspector = LayoutInspector {
            catalog: context.catalog,
            notes: Vec::new(),
        };
        let ControlFlow::Continue(()) = Visit::visit(&**query, &mut inspector);
        notes.extend(inspector.notes);
    }
    Ok((statement.to_string(), notes))
}

struct StructuralRewriter<'a> {
    context: &'a QueryContext<'a>,
    expand_stars: bool,
    cte_names: HashSet<String>,
    notes: Vec<RewriteNote>,
}

impl StructuralRewriter<'_> {
    fn repoint(&mut self, relation: &mut ObjectName) {
        let from = relation.to_string();
        let [catalog, schema, _table] = relation.0.as_mut_slice() else {
            return;
        };
        if TargetLocation::is_optimized_schema(&schema.value) {
            return;
        }
        *catalog = Ident::new(self.context.target.catalog());
        *schema = Ident::new(self.context.target.schema());
        self.notes.push(RewriteNote::PathRepointed {
            from,
            to: relation.to_string(),
        });
    }

    fn expand_star(&mut self, select: &mut Select) {
        let [SelectItem::Wildcard(options)] = select.projection.as_slice() else {
            return;
        };
        if !is_plain_wildcard(options) {
            return;
        }
        let [
            TableWithJoins {
                relation: TableFactor::Table { name, .. },
                joins,
            },
        ] = select.from.as_slice()
        else {
            return;
        };
        if !joins.is_empty() || self.is_cte_reference(name) {
            return;
        }
        let Some(metadata) = self.context.catalog.get(last_ident(name)) else {
            return;
        };
        if metadata.columns().is_empty() {
            return;
        }
        select.projection = metadata
            .column_names()
            .map(|column| SelectItem::UnnamedExpr(Expr::Identifier(column_ident(column))))
            .collect();
        self.notes.push(RewriteNote::StarExpanded {
            table: metadata.name().table().to_owned(),
        });
    }

    fn is_cte_reference(&self, name: &ObjectName) -> bool {
        name.0.len() == 1 && self.cte_names.contains(&last_ident(name).to_ascii_lowercase())
    }
}

impl VisitorMut for StructuralRewriter<'_> {
    type Break = Infallible;

    fn pre_visit_query(&mut self, query: &mut Query) -> ControlFlow<Self::Break> {
        if let Some(with) = &query.with {
            self.cte_names.extend(
                with.cte_tables
                    .iter()
                    .map(|cte| cte.alias.name.value.to_ascii_lowercase()),
            );
        }
        if self.expand_stars {
            for_each_select_mut(&mut query.body, &mut |select| self.expand_star(select));
        }
        ControlFlow::Continue(())
    }

    fn pre_visit_relation(&mut self, relation: &mut ObjectName) -> ControlFlow<Self::Break> {
        self.repoint(relation);
        ControlFlow::Continue(())
    }
}

fn is_plain_wildcard(options: &WildcardAdditionalOptions) -> bool {
    options.opt_ilike.is_none()
        && options.opt_exclude.is_none()
        && options.opt_except.is_none()
        && options.opt_replace.is_none()
        && options.opt_rename.is_none()
}

fn last_ident(name: &ObjectName) -> &str {
    name.0.last().map_or("", |ident| ident.value.as_str())
}

fn column_ident(column: &str) -> Ident {
    let plain = column
        .chars()
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && column.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
    if plain {
        Ident::new(column)
    } else {
        Ident::with_quote('"', column)
    }
}

fn for_each_select(set: &SetExpr, f: &mut impl FnMut(&Select)) {
    match set {
        SetExpr::Select(select) => f(select),
        SetExpr::SetOperation { left, right, .. } => {
            for_each_select(left, f);
            for_each_select(right, f);
        }
        _ => {}
    }
}

fn for_each_select_mut(set: &mut SetExpr, f: &mut impl FnMut(&mut Select)) {
    match set {
        SetExpr::Select(select) => f(select),
        SetExpr::SetOperation { left, right, .. } => {
            for_each_select_mut(left, f);
            for_each_select_mut(right, f);
        }
        _ => {}
    }
}

/// Appends `LIMIT row_limit` to an unbounded, non-aggregating query.
fn bound_rows(query: &mut Query, row_limit: u64) -> bool {
    if query.limit.is_some()
        || query.fetch.is_some()
        || !query.limit_by.is_empty()
        || is_aggregating(query)
    {
        return false;
    }
    query.limit = Some(Expr::Value(Value::Number(row_limit.to_string(), false)));
    true
}

/// Returns `true` when any part of the query groups or aggregates rows.
pub(crate) fn is_aggregating(query: &Query) -> bool {
    Visit::visit(query, &mut AggregateProbe).is_break()
}

struct AggregateProbe;

impl Visitor for AggregateProbe {
    type Break = ();

    fn pre_visit_query(&mut self, query: &Query) -> ControlFlow<Self::Break> {
        let mut grouped = false;
        for_each_select(&query.body, &mut |select| grouped |= is_grouped(select));
        if grouped {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }

    fn pre_visit_expr(&mut self, expr: &Expr) -> ControlFlow<Self::Break> {
        match expr {
            Expr::Function(function) if is_aggregate(function) => ControlFlow::Break(()),
            _ => ControlFlow::Continue(()),
        }
    }
}

fn is_grouped(select: &Select) -> bool {
    let has_group_by = match &select.group_by {
        GroupByExpr::All(_) => true,
        GroupByExpr::Expressions(exprs, _) => !exprs.is_empty(),
    };
    has_group_by || select.having.is_some()
}

fn is_aggregate(function: &Function) -> bool {
    function.over.is_none()
        && AGGREGATE_FUNCTIONS.contains(&last_ident(&function.name).to_ascii_lowercase().as_str())
}

struct LayoutInspector<'a> {
    catalog: &'a TableCatalog,
    notes: Vec<RewriteNote>,
}

impl<'a> LayoutInspector<'a> {
    fn inspect(&mut self, select: &Select) {
        let filters = select
            .selection
            .as_ref()
            .map(column_refs)
            .unwrap_or_default();
        for table in &select.from {
            self.check_partition(&table.relation, &filters);
            for join in &table.joins {
                self.check_partition(&join.relation, &filters);
                if let Some(JoinConstraint::On(condition)) = join_constraint(&join.join_operator) {
                    self.check_cluster(&join.relation, &column_refs(condition));
                }
            }
        }
    }

    fn relation_metadata(&self, factor: &TableFactor) -> Option<&'a TableMetadata> {
        match factor {
            TableFactor::Table { name, .. } => self.catalog.get(last_ident(name)),
            _ => None,
        }
    }

    fn check_partition(&mut self, factor: &TableFactor, filters: &BTreeSet<String>) {
        let Some(metadata) = self.relation_metadata(factor) else {
            return;
        };
        if metadata.partition_columns().is_empty() {
            return;
        }
        let used = metadata
            .partition_columns()
            .iter()
            .any(|column| filters.contains(column));
        self.notes.push(RewriteNote::PartitionFilter {
            table: metadata.name().table().to_owned(),
            used,
        });
    }

    fn check_cluster(&mut self, factor: &TableFactor, join_keys: &BTreeSet<String>) {
        let Some(metadata) = self.relation_metadata(factor) else {
            return;
        };
        if metadata.cluster_columns().is_empty() {
            return;
        }
        let aligned = metadata
            .cluster_columns()
            .iter()
            .any(|column| join_keys.contains(column));
        self.notes.push(RewriteNote::ClusterJoin {
            table: metadata.name().table().to_owned(),
            aligned,
        });
    }
}

impl Visitor for LayoutInspector<'_> {
    type Break = Infallible;

    fn pre_visit_query(&mut self, query: &Query) -> ControlFlow<Self::Break> {
        for_each_select(&query.body, &mut |select| self.inspect(select));
        ControlFlow::Continue(())
    }
}

const fn join_constraint(operator: &JoinOperator) -> Option<&JoinConstraint> {
    match operator {
        JoinOperator::Inner(constraint)
        | JoinOperator::LeftOuter(constraint)
        | JoinOperator::RightOuter(constraint)
        | JoinOperator::FullOuter(constraint)
        | JoinOperator::Semi(constraint)
        | JoinOperator::LeftSemi(constraint)
        | JoinOperator::RightSemi(constraint)
        | JoinOperator::Anti(constraint)
        | JoinOperator::LeftAnti(constraint)
        | JoinOperator::RightAnti(constraint)
        | JoinOperator::AsOf { constraint, .. } => Some(constraint),
        JoinOperator::CrossJoin | JoinOperator::CrossApply | JoinOperator::OuterApply => None,
    }
}

/// Collects lower-cased column names referenced by an expression.
fn column_refs(expr: &Expr) -> BTreeSet<String> {
    let mut refs = BTreeSet::new();
    let ControlFlow::Continue(()) = visit_expressions(expr, |node| {
        match node {
            Expr::Identifier(ident) => {
                refs.insert(ident.value.to_ascii_lowercase());
            }
            Expr::CompoundIdentifier(parts) => {
                if let Some(last) = parts.last() {
                    refs.insert(last.value.to_ascii_lowercase());
                }
            }
            _ => {}
        }
        ControlFlow::<Infallible>::Continue(())
    });
    refs
}
