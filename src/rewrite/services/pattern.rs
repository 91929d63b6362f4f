//! Pattern tier: fallback handling for statements the parser rejects.
//!
//! Table definitions are recovered with a quote-tolerant name pattern and a
//! nesting-aware scan of the column list. Queries only receive a row bound.

use crate::rewrite::domain::{ColumnSpec, RewriteTier, TableMetadata, TableName, TierFailure};
use regex::Regex;
use std::sync::LazyLock;

const CONSTRAINT_KEYWORDS: &[&str] = &[
    "PRIMARY",
    "FOREIGN",
    "CONSTRAINT",
    "CHECK",
    "UNIQUE",
    "KEY",
    "INDEX",
    "LIKE",
    "PERIOD",
];

const COLUMN_OPTION_KEYWORDS: &[&str] = &[
    "NOT",
    "NULL",
    "DEFAULT",
    "PRIMARY",
    "REFERENCES",
    "COMMENT",
    "UNIQUE",
    "CHECK",
    "COLLATE",
    "GENERATED",
    "AUTO_INCREMENT",
    "CONSTRAINT",
];

const TYPE_CONSTRUCTORS: &[&str] = &["ARRAY", "MAP", "STRUCT", "ROW"];

/// Compiles a pattern literal owned by this crate.
#[expect(
    clippy::expect_used,
    reason = "patterns are string literals exercised by the unit tests"
)]
pub(crate) fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static pattern compiles")
}

static CREATE_TABLE: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r#"(?is)\bCREATE\s+(?:OR\s+REPLACE\s+)?(?:(?:TEMP|TEMPORARY|EXTERNAL|TRANSIENT)\s+)*TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?((?:[`"\[]?[\w$]+[`"\]]?\s*\.\s*){0,2}[`"\[]?[\w$]+[`"\]]?)\s*\("#,
    )
});

static PARTITION_PROPERTY: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?is)\b(?:partitioning|partitioned_by)\s*=\s*ARRAY\s*\[([^\]]*)\]")
});

static CLUSTER_PROPERTY: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?is)\b(?:clustering|sorted_by|bucketed_by)\s*=\s*ARRAY\s*\[([^\]]*)\]")
});

static QUERY_START: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?is)^\s*(?:\(\s*)*(?:SELECT|WITH)\b"));

static ROW_BOUND: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)\b(?:LIMIT|FETCH)\b"));

static AGGREGATION: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)\bGROUP\s+BY\b|\bHAVING\b|\b(?:COUNT|SUM|AVG|MIN|MAX)\s*\(")
});

/// Extracts metadata for every `CREATE TABLE` found in the text.
pub(crate) fn table_metadata(sql: &str) -> Result<Vec<TableMetadata>, TierFailure> {
    let mut tables = Vec::new();
    let mut last_failure = TierFailure::MissingTableName;
    for captures in CREATE_TABLE.captures_iter(sql) {
        let (Some(whole), Some(raw_name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let Ok(name) = TableName::from_parts(raw_name.as_str().split('.')) else {
            continue;
        };
        let Some(body) = sql.get(whole.end()..) else {
            continue;
        };
        let Some((entries, close)) = scan_list(body) else {
            last_failure = TierFailure::MissingColumnList;
            continue;
        };
        let columns: Vec<ColumnSpec> = entries.into_iter().filter_map(column_from_entry).collect();
        if columns.is_empty() {
            last_failure = TierFailure::MissingColumnList;
            continue;
        }
        let tail = body.get(close..).unwrap_or_default();
        let properties = tail
            .find(';')
            .and_then(|end| tail.get(..end))
            .unwrap_or(tail);
        tables.push(
            TableMetadata::new(name, columns, RewriteTier::Pattern)
                .with_partition_columns(property_list(&PARTITION_PROPERTY, properties))
                .with_cluster_columns(property_list(&CLUSTER_PROPERTY, properties)),
        );
    }
    if tables.is_empty() {
        return Err(last_failure);
    }
    Ok(tables)
}

fn property_list(pattern: &Regex, properties: &str) -> Vec<String> {
    pattern
        .captures(properties)
        .and_then(|captures| captures.get(1))
        .map(|items| {
            items
                .as_str()
                .split(',')
                .map(|item| item.trim().trim_matches(|c| matches!(c, '\'' | '"')).to_owned())
                .filter(|item| !item.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn column_from_entry(entry: &str) -> Option<ColumnSpec> {
    let trimmed = entry.trim();
    let (name, rest) = split_column_name(trimmed)?;
    if CONSTRAINT_KEYWORDS.contains(&name.to_ascii_uppercase().as_str()) {
        return None;
    }
    let type_words: Vec<&str> = split_top_level_words(rest)
        .into_iter()
        .take_while(|word| !COLUMN_OPTION_KEYWORDS.contains(&word.to_ascii_uppercase().as_str()))
        .collect();
    if type_words.is_empty() {
        return None;
    }
    Some(ColumnSpec::new(name, &type_words.join(" ")))
}

fn split_column_name(entry: &str) -> Option<(&str, &str)> {
    let mut chars = entry.char_indices();
    let (_, first) = chars.next()?;
    let closing = match first {
        '"' => Some('"'),
        '`' => Some('`'),
        '[' => Some(']'),
        _ => None,
    };
    let end = match closing {
        Some(quote) => chars
            .find(|(_, ch)| *ch == quote)
            .map(|(offset, ch)| offset + ch.len_utf8())?,
        None => entry.find(char::is_whitespace).unwrap_or(entry.len()),
    };
    Some((entry.get(..end)?, entry.get(end..)?.trim_start()))
}

/// Position of a character relative to the nesting tracked so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    TopLevel,
    Nested,
    Unmatched,
}

/// Tracks parenthesis, bracket, type-angle, and quote nesting one
/// character at a time.
///
/// `<` only opens a level directly after a type constructor such as
/// `ARRAY` or `MAP`, so comparisons inside `CHECK` or `DEFAULT` clauses do
/// not unbalance the scan.
#[derive(Debug, Default)]
struct Nesting {
    closers: Vec<char>,
    quote: Option<char>,
    word: String,
    after_space: bool,
}

impl Nesting {
    fn feed(&mut self, ch: char) -> Position {
        let position = self.classify(ch);
        self.track_word(ch);
        position
    }

    fn classify(&mut self, ch: char) -> Position {
        if let Some(open) = self.quote {
            if ch == open {
                self.quote = None;
            }
            return Position::Nested;
        }
        match ch {
            '\'' | '"' | '`' => {
                self.quote = Some(ch);
                Position::Nested
            }
            '(' => self.open(')'),
            '[' => self.open(']'),
            '<' if self.after_type_constructor() => self.open('>'),
            ')' | ']' | '>' if self.closers.last() == Some(&ch) => {
                self.closers.pop();
                Position::Nested
            }
            ')' | ']' if self.closers.is_empty() => Position::Unmatched,
            _ if self.closers.is_empty() => Position::TopLevel,
            _ => Position::Nested,
        }
    }

    fn open(&mut self, closer: char) -> Position {
        self.closers.push(closer);
        Position::Nested
    }

    fn after_type_constructor(&self) -> bool {
        TYPE_CONSTRUCTORS
            .iter()
            .any(|constructor| self.word.eq_ignore_ascii_case(constructor))
    }

    fn track_word(&mut self, ch: char) {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            if self.after_space {
                self.word.clear();
            }
            self.word.push(ch);
            self.after_space = false;
        } else if ch.is_whitespace() {
            self.after_space = true;
        } else {
            self.word.clear();
            self.after_space = false;
        }
    }
}

/// Splits a column-list body at top-level commas.
///
/// Returns the entries and the byte offset of the closing parenthesis, or
/// `None` when the list never closes.
fn scan_list(body: &str) -> Option<(Vec<&str>, usize)> {
    let mut nesting = Nesting::default();
    let mut entries = Vec::new();
    let mut start = 0;
    for (offset, ch) in body.char_indices() {
        match nesting.feed(ch) {
            Position::Unmatched if ch == ')' => {
                entries.push(body.get(start..offset)?);
                return Some((entries, offset));
            }
            Position::TopLevel if ch == ',' => {
                entries.push(body.get(start..offset)?);
                start = offset + ch.len_utf8();
            }
            _ => {}
        }
    }
    None
}

/// Splits text at top-level whitespace, keeping nested groups intact.
fn split_top_level_words(text: &str) -> Vec<&str> {
    let mut nesting = Nesting::default();
    let mut words = Vec::new();
    let mut start: Option<usize> = None;
    for (offset, ch) in text.char_indices() {
        let position = nesting.feed(ch);
        if ch.is_whitespace() && position == Position::TopLevel {
            if let Some(begin) = start.take() {
                words.extend(text.get(begin..offset));
            }
        } else if start.is_none() {
            start = Some(offset);
        }
    }
    if let Some(begin) = start {
        words.extend(text.get(begin..));
    }
    words
}

/// Appends `LIMIT row_limit` to an unbounded, non-aggregating query.
///
/// Returns `None` when the text is not a query, already bounds its rows,
/// or aggregates.
pub(crate) fn append_row_limit(sql: &str, row_limit: u64) -> Option<String> {
    let body = sql.trim_end().trim_end_matches(';').trim_end();
    if !QUERY_START.is_match(body) || ROW_BOUND.is_match(body) || AGGREGATION.is_match(body) {
        return None;
    }
    Some(format!("{body}\nLIMIT {row_limit}"))
}
