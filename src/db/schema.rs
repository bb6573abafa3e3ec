//! Schema introspection module.
//!
//! Lists the tables of the connected database and describes a table's
//! columns for SQLite, PostgreSQL, and MySQL.
//!
//! # Architecture
//!
//! SQL queries are organized in the `queries` submodule with constants for each
//! database type. Database-specific implementations are in their respective
//! submodules (postgres, mysql, sqlite), each providing the same interface.
//!
//! Each call borrows one pooled connection for its metadata query and
//! returns it when the call finishes, whether or not the query succeeded.
//! Nothing is cached: every call reflects the live schema.

use crate::db::pool::{DbPool, acquire};
use crate::error::DbResult;
use crate::models::{ColumnDescriptor, DatabaseType, KeyRole};
use tracing::debug;

/// Schema inspector for database introspection.
pub struct SchemaInspector;

impl SchemaInspector {
    /// Names of the tables and views in the current database/schema, sorted.
    pub async fn list_tables(pool: &DbPool) -> DbResult<Vec<String>> {
        impl_db_dispatch!(pool, {
            MySql(p) => mysql::list_tables(p).await,
            Postgres(p) => postgres::list_tables(p).await,
            SQLite(p) => sqlite::list_tables(p).await,
        })
    }

    /// Columns of `table_name` in ordinal order.
    ///
    /// An unknown table yields an empty list.
    pub async fn describe_columns(
        pool: &DbPool,
        table_name: &str,
    ) -> DbResult<Vec<ColumnDescriptor>> {
        impl_db_dispatch!(pool, {
            MySql(p) => mysql::describe_columns(p, table_name).await,
            Postgres(p) => postgres::describe_columns(p, table_name).await,
            SQLite(p) => sqlite::describe_columns(p, table_name).await,
        })
    }
}

// =============================================================================
// SQL Queries
// =============================================================================

mod queries {
    pub mod mysql {
        pub const LIST_TABLES: &str = r#"
            SELECT CONVERT(TABLE_NAME USING utf8mb4) AS TABLE_NAME
            FROM information_schema.TABLES
            WHERE TABLE_SCHEMA = DATABASE()
            ORDER BY TABLE_NAME
        "#;

        pub const DESCRIBE_COLUMNS: &str = r#"
            SELECT
                CONVERT(c.COLUMN_NAME USING utf8mb4) AS COLUMN_NAME,
                CONVERT(c.COLUMN_TYPE USING utf8mb4) AS COLUMN_TYPE,
                CONVERT(c.IS_NULLABLE USING utf8mb4) AS IS_NULLABLE,
                CONVERT(c.COLUMN_KEY USING utf8mb4) AS COLUMN_KEY,
                CONVERT(c.COLUMN_DEFAULT USING utf8mb4) AS COLUMN_DEFAULT,
                CONVERT(c.EXTRA USING utf8mb4) AS EXTRA,
                EXISTS (
                    SELECT 1 FROM information_schema.KEY_COLUMN_USAGE k
                    WHERE k.TABLE_SCHEMA = c.TABLE_SCHEMA
                      AND k.TABLE_NAME = c.TABLE_NAME
                      AND k.COLUMN_NAME = c.COLUMN_NAME
                      AND k.REFERENCED_TABLE_NAME IS NOT NULL
                ) AS IS_FOREIGN
            FROM information_schema.COLUMNS c
            WHERE c.TABLE_SCHEMA = DATABASE() AND c.TABLE_NAME = ?
            ORDER BY c.ORDINAL_POSITION
        "#;
    }

    pub mod postgres {
        pub const LIST_TABLES: &str = r#"
            SELECT table_name::text AS table_name
            FROM information_schema.tables
            WHERE table_schema = current_schema()
              AND table_type IN ('BASE TABLE', 'VIEW')
            ORDER BY table_name
        "#;

        pub const DESCRIBE_COLUMNS: &str = r#"
            SELECT
                c.column_name::text AS column_name,
                c.data_type::text AS data_type,
                (c.is_nullable = 'YES') AS is_nullable,
                c.column_default::text AS column_default,
                CASE
                    WHEN c.is_identity = 'YES' THEN 'identity'
                    WHEN c.is_generated = 'ALWAYS' THEN 'generated'
                    ELSE ''
                END AS extra,
                COALESCE((
                    SELECT string_agg(tc.constraint_type::text, ',')
                    FROM information_schema.key_column_usage kcu
                    JOIN information_schema.table_constraints tc
                      ON tc.constraint_name = kcu.constraint_name
                     AND tc.constraint_schema = kcu.constraint_schema
                     AND tc.table_name = kcu.table_name
                    WHERE kcu.table_schema = c.table_schema
                      AND kcu.table_name = c.table_name
                      AND kcu.column_name = c.column_name
                ), '') AS constraint_types
            FROM information_schema.columns c
            WHERE c.table_schema = current_schema() AND c.table_name = $1
            ORDER BY c.ordinal_position
        "#;
    }

    pub mod sqlite {
        pub const LIST_TABLES: &str = r#"
            SELECT name FROM sqlite_master
            WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%'
            ORDER BY name
        "#;

        /// `hidden`: 1 = hidden virtual-table column, 2 = virtual generated,
        /// 3 = stored generated.
        pub const DESCRIBE_COLUMNS: &str = r#"
            SELECT
                c.name AS name,
                c.type AS type,
                c."notnull" AS not_null,
                c.dflt_value AS dflt_value,
                c.pk AS pk,
                c.hidden AS hidden,
                EXISTS (
                    SELECT 1 FROM pragma_foreign_key_list(?1) f
                    WHERE f."from" = c.name
                ) AS is_foreign,
                EXISTS (
                    SELECT 1 FROM pragma_index_list(?1) il
                    JOIN pragma_index_info(il.name) ii
                    WHERE il."unique" = 1
                      AND il.origin != 'pk'
                      AND ii.name = c.name
                      AND (SELECT COUNT(*) FROM pragma_index_info(il.name)) = 1
                ) AS is_unique
            FROM pragma_table_xinfo(?1) c
            WHERE c.hidden != 1
            ORDER BY c.cid
        "#;
    }
}

// =============================================================================
// Database-Specific Implementations
// =============================================================================

mod mysql {
    use super::*;
    use sqlx::mysql::MySqlRow;
    use sqlx::{MySqlPool, Row};

    pub async fn list_tables(pool: &MySqlPool) -> DbResult<Vec<String>> {
        let mut conn = acquire(pool, DatabaseType::MySQL).await?;
        let rows = sqlx::query(queries::mysql::LIST_TABLES)
            .fetch_all(&mut *conn)
            .await?;

        let tables: Vec<String> = rows
            .iter()
            .map(|row| get_string(row, "TABLE_NAME"))
            .filter(|name| !name.is_empty())
            .collect();
        debug!(count = tables.len(), "Listed MySQL tables");
        Ok(tables)
    }

    pub async fn describe_columns(
        pool: &MySqlPool,
        table_name: &str,
    ) -> DbResult<Vec<ColumnDescriptor>> {
        let mut conn = acquire(pool, DatabaseType::MySQL).await?;
        let rows = sqlx::query(queries::mysql::DESCRIBE_COLUMNS)
            .bind(table_name)
            .fetch_all(&mut *conn)
            .await?;

        let columns: Vec<ColumnDescriptor> = rows
            .iter()
            .map(|row| {
                let column_key = get_string(row, "COLUMN_KEY");
                ColumnDescriptor {
                    name: get_string(row, "COLUMN_NAME"),
                    declared_type: get_string(row, "COLUMN_TYPE"),
                    nullable: get_string(row, "IS_NULLABLE").eq_ignore_ascii_case("YES"),
                    key_role: KeyRole::from_flags(
                        column_key == "PRI",
                        column_key == "UNI",
                        get_flag(row, "IS_FOREIGN"),
                    ),
                    default_value: get_optional_string(row, "COLUMN_DEFAULT"),
                    extra: get_string(row, "EXTRA"),
                }
            })
            .collect();
        debug!(table = %table_name, count = columns.len(), "Described MySQL table");
        Ok(columns)
    }

    /// Safely get a string from a MySQL row.
    /// MySQL may return VARBINARY instead of VARCHAR depending on charset configuration.
    fn get_string(row: &MySqlRow, column: &str) -> String {
        get_optional_string(row, column).unwrap_or_default()
    }

    fn get_optional_string(row: &MySqlRow, column: &str) -> Option<String> {
        row.try_get::<Option<String>, _>(column)
            .ok()
            .flatten()
            .or_else(|| {
                row.try_get::<Option<Vec<u8>>, _>(column)
                    .ok()
                    .flatten()
                    .and_then(|bytes| String::from_utf8(bytes).ok())
            })
    }

    /// EXISTS yields BIGINT on MySQL 8 and INT on some MariaDB builds.
    fn get_flag(row: &MySqlRow, column: &str) -> bool {
        if let Ok(v) = row.try_get::<i64, _>(column) {
            return v != 0;
        }
        if let Ok(v) = row.try_get::<i32, _>(column) {
            return v != 0;
        }
        row.try_get::<bool, _>(column).unwrap_or(false)
    }
}

mod postgres {
    use super::*;
    use sqlx::{PgPool, Row};

    pub async fn list_tables(pool: &PgPool) -> DbResult<Vec<String>> {
        let mut conn = acquire(pool, DatabaseType::PostgreSQL).await?;
        let rows = sqlx::query(queries::postgres::LIST_TABLES)
            .fetch_all(&mut *conn)
            .await?;

        let tables = rows
            .iter()
            .map(|row| row.try_get::<String, _>("table_name"))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = tables.len(), "Listed PostgreSQL tables");
        Ok(tables)
    }

    pub async fn describe_columns(
        pool: &PgPool,
        table_name: &str,
    ) -> DbResult<Vec<ColumnDescriptor>> {
        let mut conn = acquire(pool, DatabaseType::PostgreSQL).await?;
        let rows = sqlx::query(queries::postgres::DESCRIBE_COLUMNS)
            .bind(table_name)
            .fetch_all(&mut *conn)
            .await?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            let constraints: String = row.try_get("constraint_types")?;
            let has = |kind: &str| constraints.split(',').any(|c| c == kind);
            columns.push(ColumnDescriptor {
                name: row.try_get("column_name")?,
                declared_type: row.try_get("data_type")?,
                nullable: row.try_get("is_nullable")?,
                key_role: KeyRole::from_flags(
                    has("PRIMARY KEY"),
                    has("UNIQUE"),
                    has("FOREIGN KEY"),
                ),
                default_value: row.try_get("column_default")?,
                extra: row.try_get("extra")?,
            });
        }
        debug!(table = %table_name, count = columns.len(), "Described PostgreSQL table");
        Ok(columns)
    }
}

mod sqlite {
    use super::*;
    use sqlx::{Row, SqlitePool};

    pub async fn list_tables(pool: &SqlitePool) -> DbResult<Vec<String>> {
        let mut conn = acquire(pool, DatabaseType::SQLite).await?;
        let rows = sqlx::query(queries::sqlite::LIST_TABLES)
            .fetch_all(&mut *conn)
            .await?;

        let tables = rows
            .iter()
            .map(|row| row.try_get::<String, _>("name"))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = tables.len(), "Listed SQLite tables");
        Ok(tables)
    }

    pub async fn describe_columns(
        pool: &SqlitePool,
        table_name: &str,
    ) -> DbResult<Vec<ColumnDescriptor>> {
        let mut conn = acquire(pool, DatabaseType::SQLite).await?;
        let rows = sqlx::query(queries::sqlite::DESCRIBE_COLUMNS)
            .bind(table_name)
            .fetch_all(&mut *conn)
            .await?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            let not_null: i64 = row.try_get("not_null")?;
            let pk: i64 = row.try_get("pk")?;
            let hidden: i64 = row.try_get("hidden")?;
            let is_foreign: i64 = row.try_get("is_foreign")?;
            let is_unique: i64 = row.try_get("is_unique")?;

            let extra = match hidden {
                2 => "VIRTUAL GENERATED",
                3 => "STORED GENERATED",
                _ => "",
            };

            columns.push(ColumnDescriptor {
                name: row.try_get("name")?,
                declared_type: row.try_get("type")?,
                nullable: not_null == 0 && pk == 0,
                key_role: KeyRole::from_flags(pk > 0, is_unique != 0, is_foreign != 0),
                default_value: row.try_get("dflt_value")?,
                extra: extra.to_string(),
            });
        }
        debug!(table = %table_name, count = columns.len(), "Described SQLite table");
        Ok(columns)
    }
}
