//! Table Schema Definitions
//!
//! Expected metadata for each table, independent of the DDL in `schema.rs`.
//! Metadata verification reads the store's view of a table and compares it
//! against these declarations.

use crate::db::introspect::{ColumnDefinition, ColumnType, ForeignKey};

/// Defines expected schema for a database table
pub trait TableSchema {
    /// Table name in database
    fn table_name() -> &'static str;

    /// Expected column definitions
    fn expected_columns() -> Vec<ColumnDefinition>;

    /// Expected primary key column names, in key order
    fn expected_primary_key() -> Vec<String> {
        Self::expected_columns()
            .into_iter()
            .filter(|c| c.primary_key)
            .map(|c| c.name)
            .collect()
    }

    /// Expected foreign keys, sorted by column
    fn expected_foreign_keys() -> Vec<ForeignKey> {
        let mut keys: Vec<ForeignKey> = Self::expected_columns()
            .into_iter()
            .filter_map(|c| {
                c.references.map(|(ref_table, ref_column)| ForeignKey {
                    column: c.name,
                    ref_table,
                    ref_column,
                })
            })
            .collect();
        keys.sort();
        keys
    }
}

pub struct DoctorTableSchema;

impl TableSchema for DoctorTableSchema {
    fn table_name() -> &'static str {
        "doctor"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("id", ColumnType::Integer).primary_key(),
            ColumnDefinition::new("name", ColumnType::Varchar),
            ColumnDefinition::new("occupation", ColumnType::Varchar),
            ColumnDefinition::new("salary", ColumnType::Decimal),
        ]
    }
}

pub struct PatientTableSchema;

impl TableSchema for PatientTableSchema {
    fn table_name() -> &'static str {
        "patient"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("id", ColumnType::Integer).primary_key(),
            ColumnDefinition::new("name", ColumnType::Varchar),
            ColumnDefinition::new("salary", ColumnType::Decimal),
        ]
    }
}

pub struct TreatmentTableSchema;

impl TableSchema for TreatmentTableSchema {
    fn table_name() -> &'static str {
        "treatment"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("id", ColumnType::Integer).primary_key(),
            ColumnDefinition::new("name", ColumnType::Varchar),
            ColumnDefinition::new("doctor_fk", ColumnType::Integer).references("doctor", "id"),
            ColumnDefinition::new("patient_fk", ColumnType::Integer).references("patient", "id"),
            // nullable
            ColumnDefinition::new("outcome", ColumnType::Varchar),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_key_is_id_everywhere() {
        assert_eq!(DoctorTableSchema::expected_primary_key(), vec!["ID"]);
        assert_eq!(PatientTableSchema::expected_primary_key(), vec!["ID"]);
        assert_eq!(TreatmentTableSchema::expected_primary_key(), vec!["ID"]);
    }

    #[test]
    fn test_treatment_foreign_keys() {
        let keys: Vec<String> = TreatmentTableSchema::expected_foreign_keys()
            .iter()
            .map(ToString::to_string)
            .collect();

        assert_eq!(keys, vec!["DOCTOR_FK -> DOCTOR.ID", "PATIENT_FK -> PATIENT.ID"]);
        assert!(DoctorTableSchema::expected_foreign_keys().is_empty());
    }

    #[test]
    fn test_column_names_upper_case() {
        let names: Vec<String> = DoctorTableSchema::expected_columns()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["ID", "NAME", "OCCUPATION", "SALARY"]);
    }
}
