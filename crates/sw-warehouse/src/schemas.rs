//! `DuckDB` DDL for the tables syncwatch reads and writes.
//!
//! In production these tables are owned by other systems. The DDL here
//! documents the expected shape and is used to provision local warehouses
//! and test fixtures.

use sw_core::TableRef;
use sw_core::table_ref::quote_ident;

/// Column type of a bronze watermark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatermarkType {
    /// `TIMESTAMPTZ`
    Zoned,
    /// `TIMESTAMP`
    Naive,
}

impl WatermarkType {
    const fn sql(self) -> &'static str {
        match self {
            Self::Zoned => "TIMESTAMPTZ",
            Self::Naive => "TIMESTAMP",
        }
    }
}

/// `CREATE SCHEMA` for the table's catalog.schema.
#[must_use]
pub fn create_schema(table: &TableRef) -> String {
    format!(
        "CREATE SCHEMA IF NOT EXISTS {}.{};",
        quote_ident(&table.project),
        quote_ident(&table.dataset)
    )
}

/// Central metadata table listing replicated tables.
#[must_use]
pub fn create_metadata_table(table: &TableRef) -> String {
    format!(
        "{schema}
CREATE TABLE IF NOT EXISTS {name} (
    table_name TEXT NOT NULL,
    endpoint TEXT,
    active BOOLEAN DEFAULT TRUE,
    silver_use_bronze BOOLEAN DEFAULT FALSE,
    PRIMARY KEY (table_name)
);",
        schema = create_schema(table),
        name = table.quoted()
    )
}

/// Per-environment tenant registry.
#[must_use]
pub fn create_registry_table(table: &TableRef) -> String {
    format!(
        "{schema}
CREATE TABLE IF NOT EXISTS {name} (
    company_id BIGINT NOT NULL,
    company_name TEXT NOT NULL,
    company_project_id TEXT NOT NULL,
    company_fivetran_status BOOLEAN DEFAULT TRUE,
    PRIMARY KEY (company_id)
);",
        schema = create_schema(table),
        name = table.quoted()
    )
}

/// Central consolidated store keyed by (`company_id`, `table_name`).
#[must_use]
pub fn create_consolidated_table(table: &TableRef) -> String {
    format!(
        "{schema}
CREATE TABLE IF NOT EXISTS {name} (
    company_id BIGINT NOT NULL,
    table_name TEXT NOT NULL,
    last_etl_synced TIMESTAMPTZ,
    row_count BIGINT,
    updated_at TIMESTAMPTZ,
    PRIMARY KEY (company_id, table_name)
);",
        schema = create_schema(table),
        name = table.quoted()
    )
}

/// A bronze table with a single payload column and the watermark column.
#[must_use]
pub fn create_bronze_table(table: &TableRef, watermark_column: &str, kind: WatermarkType) -> String {
    format!(
        "{schema}
CREATE TABLE IF NOT EXISTS {name} (
    id BIGINT,
    {column} {ty}
);",
        schema = create_schema(table),
        name = table.quoted(),
        column = quote_ident(watermark_column),
        ty = kind.sql()
    )
}
