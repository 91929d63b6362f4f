//! Artefact generation and validation services.

mod assembler;
mod ddl;
mod naming;
mod policy;

pub use assembler::ArtifactAssembler;
pub use ddl::{
    quote_identifier, render_copy_migration, render_migrations, render_schema_statement,
    render_table_ddl, render_target_ddl,
};
pub use naming::{
    SYSTEM_SCHEMAS, catalog_from_schema, catalog_from_url_parameter, catalog_from_url_path,
    resolve_catalog, target_schema_name,
};
pub use policy::denied_rule;
