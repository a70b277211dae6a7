//! Schema Introspection
//!
//! Reads column, primary key and foreign key metadata back from the store
//! and compares it to declared table schemas.
//!
//! PostgreSQL is read through `information_schema`, SQLite through its
//! `pragma_*` table-valued functions. Identifiers are reported upper-cased
//! so that results compare the same regardless of how the store folds case.
//!
//! # Usage
//!
//! ```rust,ignore
//! let actual = SchemaIntrospector::columns(&mut conn, "doctor").await?;
//! let drift = SchemaDiff::compare("doctor", &DoctorTableSchema::expected_columns(), &actual);
//! assert!(drift.is_empty());
//! ```

use super::connect::Connection;
use crate::config::Dialect;
use crate::Result;
use std::fmt;
use tracing::debug;

/// SQL column type, normalized across stores
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Integer,
    Varchar,
    Decimal,
    /// Any other type, upper-cased as reported
    Other(String),
}

impl ColumnType {
    /// Normalize a declared or reported type name
    ///
    /// Length, precision and scale are ignored: `VARCHAR(255)` is `Varchar`,
    /// `DECIMAL(12,2)` and PostgreSQL's `numeric` are both `Decimal`.
    pub fn from_declared(type_name: &str) -> Self {
        let upper = type_name.trim().to_uppercase();
        let base = upper.split('(').next().unwrap_or("").trim();

        match base {
            "INT" | "INTEGER" | "INT4" => ColumnType::Integer,
            "VARCHAR" | "CHARACTER VARYING" => ColumnType::Varchar,
            "DECIMAL" | "NUMERIC" => ColumnType::Decimal,
            _ => ColumnType::Other(upper),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Integer => write!(f, "INTEGER"),
            ColumnType::Varchar => write!(f, "VARCHAR"),
            ColumnType::Decimal => write!(f, "DECIMAL"),
            ColumnType::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Expected column, as declared by a table schema
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    /// Column name (upper-case)
    pub name: String,
    pub sql_type: ColumnType,
    /// PRIMARY KEY constraint
    pub primary_key: bool,
    /// FOREIGN KEY target as (table, column), upper-case
    pub references: Option<(String, String)>,
}

impl ColumnDefinition {
    /// Create new column definition
    pub fn new(name: impl Into<String>, sql_type: ColumnType) -> Self {
        Self {
            name: name.into().to_uppercase(),
            sql_type,
            primary_key: false,
            references: None,
        }
    }

    /// Mark column as PRIMARY KEY
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Mark column as referencing another table's column
    pub fn references(mut self, table: &str, column: &str) -> Self {
        self.references = Some((table.to_uppercase(), column.to_uppercase()));
        self
    }
}

/// Actual column from database introspection
#[derive(Debug, Clone, PartialEq)]
pub struct ActualColumn {
    /// Column name (upper-case)
    pub name: String,
    /// Type name exactly as the store reports it
    pub type_name: String,
    pub sql_type: ColumnType,
}

/// Foreign key constraint read back from the store
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ForeignKey {
    pub column: String,
    pub ref_table: String,
    pub ref_column: String,
}

impl fmt::Display for ForeignKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}.{}", self.column, self.ref_table, self.ref_column)
    }
}

/// Difference between expected and actual column metadata
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaDrift {
    /// Declared column missing from database
    MissingColumn { table: String, column: String },
    /// Column present in database but not declared
    UnexpectedColumn { table: String, column: String },
    /// Column type mismatch
    TypeMismatch {
        table: String,
        column: String,
        expected: ColumnType,
        actual: String,
    },
}

impl fmt::Display for SchemaDrift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaDrift::MissingColumn { table, column } => {
                write!(f, "missing column {}.{}", table, column)
            }
            SchemaDrift::UnexpectedColumn { table, column } => {
                write!(f, "unexpected column {}.{}", table, column)
            }
            SchemaDrift::TypeMismatch { table, column, expected, actual } => write!(
                f,
                "{}.{} expected type {}, found {}",
                table, column, expected, actual
            ),
        }
    }
}

/// Schema introspection - read actual database schema
pub struct SchemaIntrospector;

impl SchemaIntrospector {
    /// Read columns of a table, in declaration order
    pub async fn columns(conn: &mut Connection, table_name: &str) -> Result<Vec<ActualColumn>> {
        let sql = match conn.dialect() {
            Dialect::Postgres => {
                r#"
                SELECT CAST(column_name AS TEXT), CAST(data_type AS TEXT)
                FROM information_schema.columns
                WHERE table_schema = current_schema() AND table_name = $1
                ORDER BY ordinal_position
                "#
            }
            Dialect::Sqlite => "SELECT name, type FROM pragma_table_info(?) ORDER BY cid",
        };

        let rows: Vec<(String, String)> = sqlx::query_as(sql)
            .bind(table_name)
            .fetch_all(conn.inner())
            .await?;

        let columns: Vec<ActualColumn> = rows
            .into_iter()
            .map(|(name, type_name)| ActualColumn {
                name: name.to_uppercase(),
                sql_type: ColumnType::from_declared(&type_name),
                type_name,
            })
            .collect();

        debug!("Introspected {} columns of '{}'", columns.len(), table_name);
        Ok(columns)
    }

    /// Read primary key column names, in key order
    pub async fn primary_key(conn: &mut Connection, table_name: &str) -> Result<Vec<String>> {
        let sql = match conn.dialect() {
            Dialect::Postgres => {
                r#"
                SELECT CAST(kcu.column_name AS TEXT)
                FROM information_schema.table_constraints tc
                JOIN information_schema.key_column_usage kcu
                  ON tc.constraint_name = kcu.constraint_name
                 AND tc.table_schema = kcu.table_schema
                 AND tc.table_name = kcu.table_name
                WHERE tc.constraint_type = 'PRIMARY KEY'
                  AND tc.table_schema = current_schema()
                  AND tc.table_name = $1
                ORDER BY kcu.ordinal_position
                "#
            }
            Dialect::Sqlite => "SELECT name FROM pragma_table_info(?) WHERE pk > 0 ORDER BY pk",
        };

        let names: Vec<String> = sqlx::query_scalar(sql)
            .bind(table_name)
            .fetch_all(conn.inner())
            .await?;

        Ok(names.into_iter().map(|n| n.to_uppercase()).collect())
    }

    /// Read foreign key constraints, sorted by column
    pub async fn foreign_keys(conn: &mut Connection, table_name: &str) -> Result<Vec<ForeignKey>> {
        let sql = match conn.dialect() {
            Dialect::Postgres => {
                r#"
                SELECT CAST(kcu.column_name AS TEXT),
                       CAST(ccu.table_name AS TEXT),
                       CAST(ccu.column_name AS TEXT)
                FROM information_schema.table_constraints tc
                JOIN information_schema.key_column_usage kcu
                  ON tc.constraint_name = kcu.constraint_name
                 AND tc.table_schema = kcu.table_schema
                JOIN information_schema.constraint_column_usage ccu
                  ON tc.constraint_name = ccu.constraint_name
                 AND tc.table_schema = ccu.table_schema
                WHERE tc.constraint_type = 'FOREIGN KEY'
                  AND tc.table_schema = current_schema()
                  AND tc.table_name = $1
                "#
            }
            Dialect::Sqlite => {
                r#"SELECT "from", "table", "to" FROM pragma_foreign_key_list(?)"#
            }
        };

        let rows: Vec<(String, String, String)> = sqlx::query_as(sql)
            .bind(table_name)
            .fetch_all(conn.inner())
            .await?;

        let mut keys: Vec<ForeignKey> = rows
            .into_iter()
            .map(|(column, ref_table, ref_column)| ForeignKey {
                column: column.to_uppercase(),
                ref_table: ref_table.to_uppercase(),
                ref_column: ref_column.to_uppercase(),
            })
            .collect();
        keys.sort();

        Ok(keys)
    }

    /// Check if table exists
    pub async fn table_exists(conn: &mut Connection, table_name: &str) -> Result<bool> {
        let sql = match conn.dialect() {
            Dialect::Postgres => {
                r#"
                SELECT COUNT(*) FROM information_schema.tables
                WHERE table_schema = current_schema() AND table_name = $1
                "#
            }
            Dialect::Sqlite => {
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?"
            }
        };

        let count: i64 = sqlx::query_scalar(sql)
            .bind(table_name)
            .fetch_one(conn.inner())
            .await?;

        Ok(count > 0)
    }
}

/// Schema comparison - detect drift between expected and actual
pub struct SchemaDiff;

impl SchemaDiff {
    /// Compare expected columns to actual database columns
    ///
    /// The comparison is an exact set comparison on (name, type): every
    /// declared column must be present with a matching type and no extra
    /// column may exist.
    pub fn compare(
        table_name: &str,
        expected: &[ColumnDefinition],
        actual: &[ActualColumn],
    ) -> Vec<SchemaDrift> {
        let table = table_name.to_uppercase();
        let mut drift = Vec::new();

        for expected_col in expected {
            match actual.iter().find(|c| c.name == expected_col.name) {
                Some(actual_col) if actual_col.sql_type != expected_col.sql_type => {
                    drift.push(SchemaDrift::TypeMismatch {
                        table: table.clone(),
                        column: expected_col.name.clone(),
                        expected: expected_col.sql_type.clone(),
                        actual: actual_col.type_name.clone(),
                    });
                }
                Some(_) => {}
                None => drift.push(SchemaDrift::MissingColumn {
                    table: table.clone(),
                    column: expected_col.name.clone(),
                }),
            }
        }

        for actual_col in actual {
            if !expected.iter().any(|c| c.name == actual_col.name) {
                drift.push(SchemaDrift::UnexpectedColumn {
                    table: table.clone(),
                    column: actual_col.name.clone(),
                });
            }
        }

        drift
    }
}
