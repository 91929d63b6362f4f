//! Target catalog and schema naming.

use crate::rewrite::domain::{OPTIMIZED_SCHEMA_PREFIX, TableCatalog};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Schemas whose tables never decide the target catalog.
pub const SYSTEM_SCHEMAS: &[&str] = &["information_schema", "pg_catalog", "sys"];

const FINGERPRINT_BYTES: usize = 4;

/// Reads the `catalog=` parameter of a connection URL.
#[must_use]
pub fn catalog_from_url_parameter(url: &str) -> Option<String> {
    let (_, query) = url.split_once('?')?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("catalog"))
        .map(|(_, value)| value.trim())
        .filter(|value| is_identifier(value))
        .map(ToOwned::to_owned)
}

/// Reads the last path segment of a connection URL.
///
/// `jdbc:trino://host:8080/hive?user=etl` yields `hive`.
#[must_use]
pub fn catalog_from_url_path(url: &str) -> Option<String> {
    let address = url.split(['?', '#']).next().unwrap_or_default();
    let after_scheme = address
        .rsplit_once("://")
        .map_or(address, |(_, rest)| rest);
    let (_, path) = after_scheme.split_once('/')?;
    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .filter(|segment| is_identifier(segment))
        .map(ToOwned::to_owned)
}

/// Takes the catalog of the first fully qualified table outside the
/// system schemas.
#[must_use]
pub fn catalog_from_schema(catalog: &TableCatalog) -> Option<String> {
    catalog
        .iter()
        .map(|table| table.name())
        .filter(|name| {
            name.schema().is_some_and(|schema| {
                !SYSTEM_SCHEMAS
                    .iter()
                    .any(|system| system.eq_ignore_ascii_case(schema))
            })
        })
        .find_map(|name| name.catalog())
        .map(ToOwned::to_owned)
}

/// Resolves the catalog the optimised schema is created in.
///
/// Sources in order: the URL `catalog=` parameter, the first qualified
/// schema table, the last URL path segment, then `default_catalog`.
#[must_use]
pub fn resolve_catalog(url: &str, catalog: &TableCatalog, default_catalog: &str) -> String {
    if let Some(found) = catalog_from_url_parameter(url) {
        debug!(catalog = %found, "target catalog taken from url parameter");
        return found;
    }
    if let Some(found) = catalog_from_schema(catalog) {
        debug!(catalog = %found, "target catalog taken from schema statements");
        return found;
    }
    if let Some(found) = catalog_from_url_path(url) {
        debug!(catalog = %found, "target catalog taken from url path");
        return found;
    }
    default_catalog.to_owned()
}

/// Builds the optimised schema name for a request.
///
/// The name is `optimized_<YYYYMMDDHHMMSS>_<8 hex>` where the hex digits
/// start the SHA-256 digest of `fingerprint`.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use sqlagent::artifact::services::target_schema_name;
///
/// let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
/// let name = target_schema_name(at, b"request");
/// assert!(name.starts_with("optimized_20240309140500_"));
/// assert_eq!(name.len(), "optimized_20240309140500_".len() + 8);
/// ```
#[must_use]
pub fn target_schema_name(submitted_at: DateTime<Utc>, fingerprint: &[u8]) -> String {
    let digest = Sha256::digest(fingerprint);
    let short_hash: String = digest
        .iter()
        .take(FINGERPRINT_BYTES)
        .map(|byte| format!("{byte:02x}"))
        .collect();
    format!(
        "{OPTIMIZED_SCHEMA_PREFIX}_{}_{short_hash}",
        submitted_at.format("%Y%m%d%H%M%S")
    )
}

fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}
