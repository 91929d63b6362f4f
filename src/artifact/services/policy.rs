//! Statement deny-list.

use crate::artifact::domain::DenyRule;
use crate::rewrite::services::{compile_pattern, parse};
use regex::Regex;
use sqlparser::ast::{ObjectType, Statement};
use std::sync::LazyLock;

static KEYWORD_RULES: LazyLock<Vec<(Regex, DenyRule)>> = LazyLock::new(|| {
    vec![
        (
            compile_pattern(r"(?i)^\s*(?:GRANT|REVOKE)\b"),
            DenyRule::Authorization,
        ),
        (
            compile_pattern(r"(?i)^\s*(?:CREATE|ALTER|DROP)\s+(?:ROLE|USER)\b"),
            DenyRule::RoleManagement,
        ),
        (
            compile_pattern(r"(?i)^\s*CREATE\s+(?:OR\s+REPLACE\s+)?MATERIALIZED\s+VIEW\b"),
            DenyRule::MaterializedView,
        ),
    ]
});

/// Returns the deny rule a statement text breaks, if any.
///
/// Text the parser accepts is judged per statement, by kind and then by the
/// leading keywords of that statement alone, so `;` inside literals never
/// starts a new statement. Text it rejects is judged by leading keywords,
/// one `;`-separated segment at a time.
#[must_use]
pub fn denied_rule(sql: &str) -> Option<DenyRule> {
    parse(sql).map_or_else(
        |_| sql.split(';').find_map(leading_rule),
        |statements| {
            statements.iter().find_map(|statement| {
                statement_rule(statement).or_else(|| leading_rule(&statement.to_string()))
            })
        },
    )
}

const fn statement_rule(statement: &Statement) -> Option<DenyRule> {
    match statement {
        Statement::Grant { .. } | Statement::Revoke { .. } => Some(DenyRule::Authorization),
        Statement::CreateRole { .. }
        | Statement::AlterRole { .. }
        | Statement::Drop {
            object_type: ObjectType::Role,
            ..
        } => Some(DenyRule::RoleManagement),
        Statement::CreateView {
            materialized: true, ..
        } => Some(DenyRule::MaterializedView),
        _ => None,
    }
}

fn leading_rule(statement: &str) -> Option<DenyRule> {
    KEYWORD_RULES
        .iter()
        .find(|(pattern, _)| pattern.is_match(statement))
        .map(|(_, rule)| *rule)
}
