//! Schema creation and teardown
//!
//! Creation order is doctor, patient, treatment. Teardown drops treatment
//! first so that its foreign keys never point at a dropped table.

use super::connect::Connection;
use crate::{Error, Result};
use tracing::{info, warn};

/// Tables in creation order
pub const TABLES: [&str; 3] = ["doctor", "patient", "treatment"];

/// Tables in drop order
pub const DROP_ORDER: [&str; 3] = ["treatment", "doctor", "patient"];

const DOCTOR_DDL: &str = r#"
    CREATE TABLE doctor (
        id INT CONSTRAINT doctors_pk PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        occupation VARCHAR(255) NOT NULL,
        salary DECIMAL(12,2) NOT NULL
    )
"#;

const PATIENT_DDL: &str = r#"
    CREATE TABLE patient (
        id INT CONSTRAINT patient_pk PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        salary DECIMAL(12,2) NOT NULL
    )
"#;

const TREATMENT_DDL: &str = r#"
    CREATE TABLE treatment (
        id INT CONSTRAINT treatment_pk PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        doctor_fk INT NOT NULL,
        patient_fk INT NOT NULL,
        outcome VARCHAR(255),
        CONSTRAINT treatment_fk_doctor FOREIGN KEY (doctor_fk) REFERENCES doctor(id),
        CONSTRAINT treatment_fk_patient FOREIGN KEY (patient_fk) REFERENCES patient(id)
    )
"#;

/// Create the doctor, patient and treatment tables
///
/// On failure, tables already created by this call are dropped again before
/// the error is returned, so pre-existing tables are never touched.
pub async fn create_schema(conn: &mut Connection) -> Result<()> {
    let ddl = [DOCTOR_DDL, PATIENT_DDL, TREATMENT_DDL];
    let mut created: Vec<&str> = Vec::new();

    for (table, sql) in TABLES.into_iter().zip(ddl) {
        if let Err(e) = sqlx::query(sql).execute(conn.inner()).await {
            warn!("Failed to create table {}: {}", table, e);
            for done in created.iter().rev() {
                // drop_table logs its own failure; the CREATE error is returned
                if drop_table(conn, done).await.is_err() {
                    warn!("Table {} left behind after failed create", done);
                }
            }
            return Err(e.into());
        }
        created.push(table);
    }

    info!("Created tables: {}", TABLES.join(", "));
    Ok(())
}

async fn drop_table(conn: &mut Connection, table: &str) -> Result<()> {
    let sql = format!("DROP TABLE {}", table);
    match sqlx::query(&sql).execute(conn.inner()).await {
        Ok(_) => {
            info!("Dropped table {}", table);
            Ok(())
        }
        Err(e) => {
            warn!("Failed to drop table {}: {}", table, e);
            Err(e.into())
        }
    }
}

/// Drop all tables, best effort
///
/// Each DROP is attempted even if an earlier one failed. Failures are logged
/// and returned for reporting; they never abort teardown.
pub async fn drop_schema(conn: &mut Connection) -> Vec<Error> {
    let mut failures = Vec::new();

    for table in DROP_ORDER {
        if let Err(e) = drop_table(conn, table).await {
            failures.push(e);
        }
    }

    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::db::connect::connect;
    use crate::db::introspect::SchemaIntrospector;

    async fn setup_test_db() -> Connection {
        let config = DatabaseConfig::new("sqlite::memory:").unwrap();
        connect(&config).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_drop_schema() {
        let mut conn = setup_test_db().await;

        create_schema(&mut conn).await.unwrap();
        for table in TABLES {
            assert!(
                SchemaIntrospector::table_exists(&mut conn, table).await.unwrap(),
                "table {} should exist",
                table
            );
        }

        let failures = drop_schema(&mut conn).await;
        assert!(failures.is_empty(), "unexpected teardown failures: {:?}", failures);
        for table in TABLES {
            assert!(!SchemaIntrospector::table_exists(&mut conn, table).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_create_schema_twice_fails() {
        let mut conn = setup_test_db().await;

        create_schema(&mut conn).await.unwrap();
        let result = create_schema(&mut conn).await;
        assert!(matches!(result, Err(Error::Database(_))));
    }

    #[tokio::test]
    async fn test_failed_create_leaves_existing_tables_alone() {
        let mut conn = setup_test_db().await;

        // A foreign patient table makes the second CREATE fail
        sqlx::query("CREATE TABLE patient (ward TEXT)")
            .execute(conn.inner())
            .await
            .unwrap();

        assert!(create_schema(&mut conn).await.is_err());
        assert!(!SchemaIntrospector::table_exists(&mut conn, "doctor").await.unwrap());
        assert!(SchemaIntrospector::table_exists(&mut conn, "patient").await.unwrap());
    }

    #[tokio::test]
    async fn test_drop_schema_without_tables_reports_each_failure() {
        let mut conn = setup_test_db().await;

        let failures = drop_schema(&mut conn).await;
        assert_eq!(failures.len(), DROP_ORDER.len());
    }
}
