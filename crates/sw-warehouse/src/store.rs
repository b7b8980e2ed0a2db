//! `DuckDB` implementation of [`Warehouse`].

use std::sync::{Arc, Mutex};

use chrono::{DateTime, SecondsFormat, Utc};
use duckdb::types::{TimeUnit, Value};
use duckdb::{Connection, params, params_from_iter};
use sw_config::WarehouseConfig;
use sw_core::table_ref::quote_ident;
use sw_core::{
    ConsolidatedRecord, ConsolidatedUpdate, MergeOutcome, MonitoredTable, TableRef, Tenant,
    TenantId, Watermark,
};

use crate::{Warehouse, WarehouseError, WatermarkSummary};

const ZONED_TYPE: &str = "TIMESTAMP WITH TIME ZONE";

/// `DuckDB` warehouse with one attached catalog per storage project.
///
/// Cloning is cheap; clones share the same database instance.
#[derive(Clone)]
pub struct DuckWarehouse {
    conn: Arc<Mutex<Connection>>,
}

impl DuckWarehouse {
    /// Open the warehouse described by `config` and attach its catalogs.
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError::DuckDb`] if the database cannot be opened or
    /// a catalog cannot be attached.
    pub fn open(config: &WarehouseConfig) -> Result<Self, WarehouseError> {
        let target = config.connection_string();
        let conn = if target == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(&target)?
        };
        let warehouse = Self::from_connection(conn);

        for (name, path) in &config.attach {
            warehouse.attach(name, path, config.read_only)?;
        }

        tracing::debug!(
            motherduck = config.uses_motherduck(),
            catalogs = config.attach.len(),
            "warehouse opened"
        );
        Ok(warehouse)
    }

    /// Open an empty in-memory warehouse (for testing).
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError::DuckDb`] if `DuckDB` cannot start.
    pub fn open_in_memory() -> Result<Self, WarehouseError> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Attach a database file (or `md:` URL) as catalog `name`.
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError::DuckDb`] if the attach fails.
    pub fn attach(&self, name: &str, path: &str, read_only: bool) -> Result<(), WarehouseError> {
        let mode = if read_only { " (READ_ONLY)" } else { "" };
        let sql = format!(
            "ATTACH IF NOT EXISTS '{}' AS {}{mode}",
            path.replace('\'', "''"),
            quote_ident(name)
        );
        self.execute_batch(&sql)?;
        tracing::debug!(catalog = name, read_only, "catalog attached");
        Ok(())
    }

    /// Attach an empty in-memory catalog named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError::DuckDb`] if the attach fails.
    pub fn attach_in_memory(&self, name: &str) -> Result<(), WarehouseError> {
        self.attach(name, ":memory:", false)
    }

    /// Run a batch of statements synchronously.
    ///
    /// Used to provision tables and fixtures; engine reads go through
    /// [`Warehouse`].
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError::DuckDb`] if any statement fails.
    pub fn execute_batch(&self, sql: &str) -> Result<(), WarehouseError> {
        let conn = self.lock()?;
        conn.execute_batch(sql)?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, WarehouseError> {
        self.conn
            .lock()
            .map_err(|_| WarehouseError::Other("warehouse connection lock poisoned".into()))
    }

    /// Run `f` on the blocking pool with its own connection handle.
    async fn run<T, F>(&self, f: F) -> Result<T, WarehouseError>
    where
        F: FnOnce(&Connection) -> Result<T, WarehouseError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.lock()?.try_clone()?;
        tokio::task::spawn_blocking(move || f(&conn))
            .await
            .map_err(|e| WarehouseError::Task(e.to_string()))?
    }
}

impl std::fmt::Debug for DuckWarehouse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckWarehouse").finish_non_exhaustive()
    }
}

impl Warehouse for DuckWarehouse {
    async fn table_exists(&self, table: &TableRef) -> Result<bool, WarehouseError> {
        let table = table.clone();
        self.run(move |conn| {
            let count: i64 = conn
                .query_row(
                    "SELECT count(*) FROM information_schema.tables
                     WHERE table_catalog = ? AND table_schema = ? AND table_name = ?",
                    params![table.project, table.dataset, table.table],
                    |row| row.get(0),
                )
                .map_err(WarehouseError::classify)?;
            Ok(count > 0)
        })
        .await
    }

    async fn row_count(&self, table: &TableRef) -> Result<u64, WarehouseError> {
        let sql = format!("SELECT count(*) FROM {}", table.quoted());
        self.run(move |conn| {
            let count: i64 = conn
                .query_row(&sql, [], |row| row.get(0))
                .map_err(WarehouseError::classify)?;
            Ok(to_u64(count))
        })
        .await
    }

    async fn watermark_summary(
        &self,
        table: &TableRef,
        column: &str,
    ) -> Result<WatermarkSummary, WarehouseError> {
        let column = quote_ident(column);
        let sql = format!(
            "SELECT MAX({column}), count(*), typeof(MAX({column}))
             FROM {} WHERE {column} IS NOT NULL",
            table.quoted()
        );
        self.run(move |conn| {
            let (value, count, type_name): (Value, i64, String) = conn
                .query_row(&sql, [], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
                .map_err(WarehouseError::classify)?;
            Ok(WatermarkSummary {
                max: watermark_from_value(value, &type_name)?,
                count: to_u64(count),
            })
        })
        .await
    }

    async fn column_exists(&self, table: &TableRef, column: &str) -> Result<bool, WarehouseError> {
        let table = table.clone();
        let column = column.to_string();
        self.run(move |conn| {
            let count: i64 = conn
                .query_row(
                    "SELECT count(*) FROM information_schema.columns
                     WHERE table_catalog = ? AND table_schema = ? AND table_name = ?
                       AND column_name = ?",
                    params![table.project, table.dataset, table.table, column],
                    |row| row.get(0),
                )
                .map_err(WarehouseError::classify)?;
            Ok(count > 0)
        })
        .await
    }

    async fn monitored_tables(
        &self,
        source: &TableRef,
    ) -> Result<Vec<MonitoredTable>, WarehouseError> {
        let sql = format!(
            "SELECT table_name, coalesce(active, FALSE), coalesce(silver_use_bronze, FALSE)
             FROM {} WHERE endpoint IS NOT NULL
             ORDER BY table_name",
            source.quoted()
        );
        self.run(move |conn| {
            let mut stmt = conn.prepare(&sql).map_err(WarehouseError::classify)?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(MonitoredTable {
                        name: row.get(0)?,
                        active: row.get(1)?,
                        include_in_scan: row.get(2)?,
                    })
                })
                .map_err(WarehouseError::classify)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
    }

    async fn tenant_registry(&self, registry: &TableRef) -> Result<Vec<Tenant>, WarehouseError> {
        let sql = format!(
            "SELECT CAST(company_id AS BIGINT), company_name, company_project_id,
                    coalesce(company_fivetran_status, FALSE)
             FROM {}",
            registry.quoted()
        );
        self.run(move |conn| {
            let mut stmt = conn.prepare(&sql).map_err(WarehouseError::classify)?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(Tenant {
                        id: TenantId(row.get(0)?),
                        name: row.get(1)?,
                        storage_ref: row.get(2)?,
                        active: row.get(3)?,
                    })
                })
                .map_err(WarehouseError::classify)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
    }

    async fn tenant_locations(
        &self,
        registry: &TableRef,
        ids: &[TenantId],
    ) -> Result<Vec<(TenantId, String)>, WarehouseError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT CAST(company_id AS BIGINT), company_project_id
             FROM {}
             WHERE company_fivetran_status = TRUE AND company_id IN ({placeholders})
             ORDER BY company_id",
            registry.quoted()
        );
        let ids: Vec<i64> = ids.iter().map(|id| id.get()).collect();
        self.run(move |conn| {
            let mut stmt = conn.prepare(&sql).map_err(WarehouseError::classify)?;
            let rows = stmt
                .query_map(params_from_iter(ids.iter()), |row| {
                    Ok((TenantId(row.get(0)?), row.get(1)?))
                })
                .map_err(WarehouseError::classify)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
    }

    async fn consolidated_pairs(
        &self,
        store: &TableRef,
        tables: &[String],
    ) -> Result<Vec<(TenantId, String)>, WarehouseError> {
        if tables.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; tables.len()].join(", ");
        let sql = format!(
            "SELECT DISTINCT CAST(company_id AS BIGINT) AS company_id, table_name
             FROM {}
             WHERE table_name IN ({placeholders})
             ORDER BY company_id, table_name",
            store.quoted()
        );
        let tables = tables.to_vec();
        self.run(move |conn| {
            let mut stmt = conn.prepare(&sql).map_err(WarehouseError::classify)?;
            let rows = stmt
                .query_map(params_from_iter(tables.iter()), |row| {
                    Ok((TenantId(row.get(0)?), row.get(1)?))
                })
                .map_err(WarehouseError::classify)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
    }

    async fn merge_consolidated(
        &self,
        store: &TableRef,
        update: &ConsolidatedUpdate,
    ) -> Result<MergeOutcome, WarehouseError> {
        let sql = format!(
            "UPDATE {}
             SET last_etl_synced = CAST(? AS TIMESTAMPTZ),
                 row_count = ?,
                 updated_at = CAST(? AS TIMESTAMPTZ)
             WHERE company_id = ? AND table_name = ?",
            store.quoted()
        );
        let watermark = update.last_etl_synced.as_ref().map(watermark_literal);
        let row_count = i64::try_from(update.row_count).unwrap_or(i64::MAX);
        let updated_at = update.updated_at.to_rfc3339_opts(SecondsFormat::Micros, true);
        let company_id = update.company_id.get();
        let table_name = update.table_name.clone();

        self.run(move |conn| {
            let affected = conn
                .execute(
                    &sql,
                    params![watermark, row_count, updated_at, company_id, table_name],
                )
                .map_err(WarehouseError::classify)?;
            Ok(if affected == 0 {
                MergeOutcome::NoMatch
            } else {
                MergeOutcome::Updated
            })
        })
        .await
    }

    async fn consolidated_record(
        &self,
        store: &TableRef,
        company_id: TenantId,
        table_name: &str,
    ) -> Result<Option<ConsolidatedRecord>, WarehouseError> {
        let sql = format!(
            "SELECT last_etl_synced, typeof(last_etl_synced), row_count, updated_at
             FROM {}
             WHERE company_id = ? AND table_name = ?",
            store.quoted()
        );
        let table_name = table_name.to_string();
        self.run(move |conn| {
            let mut stmt = conn.prepare(&sql).map_err(WarehouseError::classify)?;
            let mut rows = stmt
                .query(params![company_id.get(), table_name])
                .map_err(WarehouseError::classify)?;
            let Some(row) = rows.next()? else {
                return Ok(None);
            };

            let synced: Value = row.get(0)?;
            let synced_type: String = row.get(1)?;
            let row_count: Option<i64> = row.get(2)?;
            let updated_at: Value = row.get(3)?;

            Ok(Some(ConsolidatedRecord {
                company_id,
                table_name: table_name.clone(),
                last_etl_synced: watermark_from_value(synced, &synced_type)?,
                row_count: row_count.map(to_u64),
                updated_at: utc_from_value(updated_at)?,
            }))
        })
        .await
    }
}

fn to_u64(count: i64) -> u64 {
    u64::try_from(count).unwrap_or(0)
}

const fn to_micros(unit: TimeUnit, raw: i64) -> i64 {
    match unit {
        TimeUnit::Second => raw.saturating_mul(1_000_000),
        TimeUnit::Millisecond => raw.saturating_mul(1_000),
        TimeUnit::Microsecond => raw,
        TimeUnit::Nanosecond => raw / 1_000,
    }
}

/// Convert an aggregate value to a watermark.
///
/// `TIMESTAMPTZ` values are UTC instants; plain `TIMESTAMP` values are
/// wall-clock readings and stay naive.
fn watermark_from_value(value: Value, type_name: &str) -> Result<Option<Watermark>, WarehouseError> {
    match value {
        Value::Null => Ok(None),
        Value::Timestamp(unit, raw) => {
            let micros = to_micros(unit, raw);
            let watermark = if type_name.eq_ignore_ascii_case(ZONED_TYPE) {
                Watermark::from_utc_micros(micros)
            } else {
                Watermark::from_naive_micros(micros)
            };
            watermark
                .map(Some)
                .ok_or_else(|| WarehouseError::Other(format!("timestamp out of range: {raw}")))
        }
        Value::Text(text) => text
            .parse::<Watermark>()
            .map(Some)
            .map_err(|e| WarehouseError::Other(e.to_string())),
        other => Err(WarehouseError::Other(format!(
            "unsupported watermark type {type_name}: {other:?}"
        ))),
    }
}

fn utc_from_value(value: Value) -> Result<Option<DateTime<Utc>>, WarehouseError> {
    match value {
        Value::Null => Ok(None),
        Value::Timestamp(unit, raw) => DateTime::<Utc>::from_timestamp_micros(to_micros(unit, raw))
            .map(Some)
            .ok_or_else(|| WarehouseError::Other(format!("timestamp out of range: {raw}"))),
        other => Err(WarehouseError::Other(format!(
            "unsupported timestamp value: {other:?}"
        ))),
    }
}

/// String form bound to `CAST(? AS TIMESTAMPTZ)`.
///
/// Naive values carry no offset and are read in the session time zone.
fn watermark_literal(watermark: &Watermark) -> String {
    match watermark {
        Watermark::Zoned(ts) => ts.to_rfc3339_opts(SecondsFormat::Micros, false),
        Watermark::Naive(ts) => ts.format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
    }
}
