//! Metadata building and query rewriting services.

mod metadata;
mod pattern;
mod query;
mod structural;

pub use metadata::{MetadataReport, SkippedStatement, build_catalog, describe_tables};
pub use query::QueryRewriter;

pub(crate) use pattern::compile as compile_pattern;
pub(crate) use structural::{is_aggregating, parse, table_name};

#[cfg(test)]
pub(crate) use pattern::table_metadata as pattern_table_metadata;
#[cfg(test)]
pub(crate) use structural::table_metadata as structural_table_metadata;
