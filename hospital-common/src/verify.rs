//! Verification of seeded data and table metadata
//!
//! Every check returns `Error::Database` when the store could not answer and
//! `Error::Mismatch` when it answered with something other than expected.

use crate::db::connect::Connection;
use crate::db::fixtures::seed_table;
use crate::db::introspect::{SchemaDiff, SchemaIntrospector};
use crate::db::models::{Entity, Treatment};
use crate::db::table_schemas::TableSchema;
use crate::{Mismatch, Result};
use sqlx::Connection as _;
use tracing::{debug, info};

/// Insert fixture rows and check the affected-row total
pub async fn verify_seed<E: Entity>(conn: &mut Connection, rows: &[E]) -> Result<u64> {
    let affected = seed_table(conn, rows).await?;
    let expected = rows.len() as u64;

    if affected != expected {
        return Err(Mismatch::RowCount {
            table: E::TABLE.to_string(),
            expected,
            actual: affected,
        }
        .into());
    }

    info!("Inserted {} rows into {}", affected, E::TABLE);
    Ok(affected)
}

/// Read back all rows in ascending id order and compare to fixtures
pub async fn verify_rows<E: Entity>(conn: &mut Connection, expected: &[E]) -> Result<()> {
    let actual: Vec<E> = sqlx::query_as(E::SELECT_SQL)
        .fetch_all(conn.inner())
        .await?;

    compare_rows(expected, &actual)?;
    info!("Verified {} rows of {}", actual.len(), E::TABLE);
    Ok(())
}

/// Compare rows position by position, column by column
///
/// Reports the first difference found. Overlapping rows are compared before
/// the row counts, so a wrong value is reported ahead of a missing row.
pub fn compare_rows<E: Entity>(expected: &[E], actual: &[E]) -> Result<()> {
    for (position, (exp, act)) in expected.iter().zip(actual).enumerate() {
        if exp.id() != act.id() {
            return Err(Mismatch::RowOrder {
                table: E::TABLE.to_string(),
                position,
                expected_id: exp.id(),
                actual_id: act.id(),
            }
            .into());
        }

        let columns = E::COLUMNS.iter().zip(exp.values()).zip(act.values());
        for ((column, exp_value), act_value) in columns {
            if exp_value != act_value {
                return Err(Mismatch::Value {
                    table: E::TABLE.to_string(),
                    id: exp.id(),
                    column: column.to_string(),
                    expected: exp_value.to_string(),
                    actual: act_value.to_string(),
                }
                .into());
            }
        }
    }

    if expected.len() != actual.len() {
        return Err(Mismatch::RowCount {
            table: E::TABLE.to_string(),
            expected: expected.len() as u64,
            actual: actual.len() as u64,
        }
        .into());
    }

    Ok(())
}

/// Compare column, primary key and foreign key metadata to the declared schema
pub async fn verify_metadata<T: TableSchema>(conn: &mut Connection) -> Result<()> {
    let table = T::table_name();

    let actual = SchemaIntrospector::columns(conn, table).await?;
    let drift = SchemaDiff::compare(table, &T::expected_columns(), &actual);
    if !drift.is_empty() {
        return Err(Mismatch::Schema {
            table: table.to_string(),
            details: drift.iter().map(ToString::to_string).collect(),
        }
        .into());
    }

    let expected_pk = T::expected_primary_key();
    let actual_pk = SchemaIntrospector::primary_key(conn, table).await?;
    if actual_pk != expected_pk {
        return Err(Mismatch::PrimaryKey {
            table: table.to_string(),
            expected: expected_pk,
            actual: actual_pk,
        }
        .into());
    }

    let expected_fks = T::expected_foreign_keys();
    let actual_fks = SchemaIntrospector::foreign_keys(conn, table).await?;
    if actual_fks != expected_fks {
        return Err(Mismatch::ForeignKey {
            table: table.to_string(),
            expected: expected_fks.iter().map(ToString::to_string).collect(),
            actual: actual_fks.iter().map(ToString::to_string).collect(),
        }
        .into());
    }

    info!(
        "Verified metadata of {} ({} columns, primary key {:?})",
        table,
        actual.len(),
        actual_pk
    );
    Ok(())
}

/// Check that the store rejects a treatment pointing at a missing doctor
///
/// The probe insert runs in a transaction that is always rolled back, so the
/// seeded data is untouched whether or not the store enforces the key.
pub async fn verify_foreign_key_enforcement(conn: &mut Connection) -> Result<()> {
    let probe = Treatment {
        id: 9999,
        name: "Orphaned treatment".to_string(),
        doctor_fk: 9999,
        patient_fk: 1,
        outcome: None,
    };

    let mut tx = conn.inner().begin().await?;
    let result = sqlx::query(&probe.insert_sql()).execute(&mut *tx).await;
    tx.rollback().await?;

    match result {
        Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
            debug!("Dangling doctor_fk rejected: {}", db_err);
            info!("Verified foreign key enforcement on treatment");
            Ok(())
        }
        Err(e) => Err(e.into()),
        Ok(_) => Err(Mismatch::ConstraintNotEnforced {
            table: Treatment::TABLE.to_string(),
            constraint: "treatment_fk_doctor".to_string(),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fixtures::{doctors, patients};
    use crate::db::models::Patient;
    use crate::Error;

    #[test]
    fn test_compare_rows_identical() {
        assert!(compare_rows(&doctors(), &doctors()).is_ok());
    }

    #[test]
    fn test_compare_rows_reports_value_difference() {
        let mut actual = patients();
        actual[1].name = "Sir Albert Humbug".to_string();

        let err = compare_rows(&patients(), &actual).unwrap_err();
        match err {
            Error::Mismatch(Mismatch::Value { table, id, column, expected, actual }) => {
                assert_eq!(table, "patient");
                assert_eq!(id, 2);
                assert_eq!(column, "name");
                assert_eq!(expected, "Sir Albert Humbug McMiller");
                assert_eq!(actual, "Sir Albert Humbug");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_compare_rows_salary_exact() {
        let mut actual = doctors();
        actual[0].salary = "10000000.01".parse().unwrap();

        let err = compare_rows(&doctors(), &actual).unwrap_err();
        assert!(matches!(
            err,
            Error::Mismatch(Mismatch::Value { ref column, .. }) if column == "salary"
        ));
    }

    #[test]
    fn test_compare_rows_missing_row() {
        let actual: Vec<Patient> = patients().into_iter().take(2).collect();

        let err = compare_rows(&patients(), &actual).unwrap_err();
        assert!(matches!(
            err,
            Error::Mismatch(Mismatch::RowCount { expected: 3, actual: 2, .. })
        ));
    }

    #[test]
    fn test_compare_rows_gap_in_ids() {
        let mut actual = patients();
        actual.remove(1);

        let err = compare_rows(&patients(), &actual).unwrap_err();
        assert!(matches!(
            err,
            Error::Mismatch(Mismatch::RowOrder { position: 1, expected_id: 2, actual_id: 3, .. })
        ));
    }
}
