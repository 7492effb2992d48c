//! SQLite-backed implementation of [`RiskStore`].

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags, OptionalExtension, Transaction, types::FromSql};
use thiserror::Error;

use super::RiskStore;
use crate::{
    Dimension, ExposureRecord, JobProfile, JobRisk, NormalizedRisk, RawJobFeatures, RubricRow,
};

/// Schema for raw and derived tables. Every statement is idempotent.
pub const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS provinces (
    code TEXT PRIMARY KEY,
    name TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS ethnicities (
    code TEXT PRIMARY KEY,
    name TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS province_risk_raw (
    province_code TEXT PRIMARY KEY,
    exposure_value REAL NOT NULL
);
CREATE TABLE IF NOT EXISTS ethnicity_risk_raw (
    ethnicity_code TEXT PRIMARY KEY,
    exposure_value REAL NOT NULL
);
CREATE TABLE IF NOT EXISTS jobs (
    job_id TEXT PRIMARY KEY,
    title TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS job_titles (
    job_id TEXT NOT NULL,
    title TEXT NOT NULL,
    PRIMARY KEY (job_id, title)
);
CREATE TABLE IF NOT EXISTS job_features_raw (
    job_id TEXT PRIMARY KEY,
    features_json TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS ability_skill_rubric_raw (
    name TEXT NOT NULL,
    substitution_index REAL,
    complementarity_index REAL
);
CREATE TABLE IF NOT EXISTS province_risk (
    province_code TEXT PRIMARY KEY,
    risk REAL NOT NULL
);
CREATE TABLE IF NOT EXISTS ethnicity_risk (
    ethnicity_code TEXT PRIMARY KEY,
    risk REAL NOT NULL
);
CREATE TABLE IF NOT EXISTS job_profile (
    job_id TEXT PRIMARY KEY,
    pcs_share REAL NOT NULL
);
CREATE TABLE IF NOT EXISTS job_risk (
    job_id TEXT PRIMARY KEY,
    risk REAL NOT NULL
);
";

/// Error raised when reading or writing risk tables.
#[derive(Debug, Error)]
pub enum SqliteRiskStoreError {
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path}: {source}")]
    OpenDatabase {
        /// Location of the SQLite database on disk.
        path: PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Applying the schema failed.
    #[error("failed to apply risk schema: {source}")]
    Schema {
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Preparing or executing a statement failed.
    #[error("failed to {operation}: {source}")]
    Query {
        /// Description of the failed operation.
        operation: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
}

/// Create every raw and derived table that does not exist yet.
pub fn initialise_schema(connection: &Connection) -> Result<(), SqliteRiskStoreError> {
    connection
        .execute_batch(SCHEMA_SQL)
        .map_err(|source| SqliteRiskStoreError::Schema { source })
}

/// Risk tables persisted in a single SQLite database.
#[derive(Debug)]
pub struct SqliteRiskStore {
    connection: Connection,
}

impl SqliteRiskStore {
    /// Open (creating if needed) a database and ensure the schema exists.
    pub fn open<P: AsRef<Path>>(database_path: P) -> Result<Self, SqliteRiskStoreError> {
        let database_path = database_path.as_ref();
        let connection =
            Connection::open(database_path).map_err(|source| SqliteRiskStoreError::OpenDatabase {
                path: database_path.to_path_buf(),
                source,
            })?;
        initialise_schema(&connection)?;
        Ok(Self { connection })
    }

    /// Open an existing database for lookups only.
    ///
    /// Replace operations on a read-only store fail with
    /// [`SqliteRiskStoreError::Query`].
    pub fn open_read_only<P: AsRef<Path>>(database_path: P) -> Result<Self, SqliteRiskStoreError> {
        let database_path = database_path.as_ref();
        let connection =
            Connection::open_with_flags(database_path, OpenFlags::SQLITE_OPEN_READ_ONLY).map_err(
                |source| SqliteRiskStoreError::OpenDatabase {
                    path: database_path.to_path_buf(),
                    source,
                },
            )?;
        Ok(Self { connection })
    }

    /// Wrap an existing connection, ensuring the schema exists.
    pub fn from_connection(connection: Connection) -> Result<Self, SqliteRiskStoreError> {
        initialise_schema(&connection)?;
        Ok(Self { connection })
    }

    /// Borrow the underlying connection.
    pub const fn connection(&self) -> &Connection {
        &self.connection
    }

    fn begin(&mut self) -> Result<Transaction<'_>, SqliteRiskStoreError> {
        self.connection
            .transaction()
            .map_err(|source| query_error("begin replace transaction", source))
    }

    fn lookup<T: FromSql>(
        &self,
        operation: &'static str,
        sql: &str,
        key: &str,
    ) -> Result<Option<T>, SqliteRiskStoreError> {
        self.connection
            .query_row(sql, [key], |row| row.get(0))
            .optional()
            .map_err(|source| query_error(operation, source))
    }
}

impl RiskStore for SqliteRiskStore {
    type Error = SqliteRiskStoreError;

    fn exposures(&self, dimension: Dimension) -> Result<Vec<ExposureRecord>, Self::Error> {
        let sql = format!(
            "SELECT {key}, exposure_value FROM {raw} ORDER BY {key}",
            key = dimension.key_column(),
            raw = dimension.raw_table(),
        );
        let mut statement = self
            .connection
            .prepare(&sql)
            .map_err(|source| query_error("prepare exposure selection", source))?;
        let rows = statement
            .query_map([], |row| Ok(ExposureRecord::new(row.get::<_, String>(0)?, row.get(1)?)))
            .map_err(|source| query_error("query exposures", source))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|source| query_error("read exposure row", source))
    }

    fn job_features(&self) -> Result<Vec<RawJobFeatures>, Self::Error> {
        let mut statement = self
            .connection
            .prepare("SELECT job_id, features_json FROM job_features_raw ORDER BY job_id")
            .map_err(|source| query_error("prepare job feature selection", source))?;
        let rows = statement
            .query_map([], |row| {
                Ok(RawJobFeatures::new(
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                ))
            })
            .map_err(|source| query_error("query job features", source))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|source| query_error("read job feature row", source))
    }

    fn rubric_rows(&self) -> Result<Vec<RubricRow>, Self::Error> {
        let mut statement = self
            .connection
            .prepare(
                "SELECT name, substitution_index, complementarity_index
                 FROM ability_skill_rubric_raw ORDER BY rowid",
            )
            .map_err(|source| query_error("prepare rubric selection", source))?;
        let rows = statement
            .query_map([], |row| {
                Ok(RubricRow {
                    name: row.get(0)?,
                    substitution_index: row.get(1)?,
                    complementarity_index: row.get(2)?,
                })
            })
            .map_err(|source| query_error("query rubric", source))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|source| query_error("read rubric row", source))
    }

    fn replace_dimension_risk(
        &mut self,
        dimension: Dimension,
        rows: &[NormalizedRisk],
    ) -> Result<(), Self::Error> {
        let transaction = self.begin()?;
        transaction
            .execute(&format!("DELETE FROM {}", dimension.output_table()), [])
            .map_err(|source| query_error("clear normalised dimension", source))?;
        {
            let mut insert = transaction
                .prepare(&format!(
                    "INSERT INTO {} ({}, risk) VALUES (?1, ?2)",
                    dimension.output_table(),
                    dimension.key_column()
                ))
                .map_err(|source| query_error("prepare normalised insert", source))?;
            for row in rows {
                insert
                    .execute((row.key.as_str(), row.risk))
                    .map_err(|source| query_error("insert normalised risk", source))?;
            }
        }
        transaction
            .commit()
            .map_err(|source| query_error("commit normalised dimension", source))
    }

    fn replace_job_outputs(
        &mut self,
        profiles: &[JobProfile],
        risks: &[JobRisk],
    ) -> Result<(), Self::Error> {
        let transaction = self.begin()?;
        transaction
            .execute_batch("DELETE FROM job_profile; DELETE FROM job_risk;")
            .map_err(|source| query_error("clear job outputs", source))?;
        {
            let mut insert_profile = transaction
                .prepare("INSERT INTO job_profile (job_id, pcs_share) VALUES (?1, ?2)")
                .map_err(|source| query_error("prepare job profile insert", source))?;
            for profile in profiles {
                insert_profile
                    .execute((profile.job_id.as_str(), profile.pcs_share))
                    .map_err(|source| query_error("insert job profile", source))?;
            }
            let mut insert_risk = transaction
                .prepare("INSERT INTO job_risk (job_id, risk) VALUES (?1, ?2)")
                .map_err(|source| query_error("prepare job risk insert", source))?;
            for risk in risks {
                insert_risk
                    .execute((risk.job_id.as_str(), risk.risk))
                    .map_err(|source| query_error("insert job risk", source))?;
            }
        }
        transaction
            .commit()
            .map_err(|source| query_error("commit job outputs", source))
    }

    fn dimension_risk(&self, dimension: Dimension, key: &str) -> Result<Option<f64>, Self::Error> {
        self.lookup(
            "look up derived risk",
            &format!(
                "SELECT risk FROM {} WHERE {} = ?1",
                dimension.output_table(),
                dimension.key_column()
            ),
            key,
        )
    }

    fn job_risk(&self, job_id: &str) -> Result<Option<f64>, Self::Error> {
        self.lookup(
            "look up derived risk",
            "SELECT risk FROM job_risk WHERE job_id = ?1",
            job_id,
        )
    }

    fn pcs_share(&self, job_id: &str) -> Result<Option<f64>, Self::Error> {
        self.lookup(
            "look up derived risk",
            "SELECT pcs_share FROM job_profile WHERE job_id = ?1",
            job_id,
        )
    }

    fn dimension_name(
        &self,
        dimension: Dimension,
        code: &str,
    ) -> Result<Option<String>, Self::Error> {
        self.lookup(
            "look up display name",
            &format!("SELECT name FROM {} WHERE code = ?1", dimension.lookup_table()),
            code,
        )
    }

    fn job_title(&self, job_id: &str) -> Result<Option<String>, Self::Error> {
        self.lookup(
            "look up job title",
            "SELECT title FROM job_titles WHERE job_id = ?1 ORDER BY title LIMIT 1",
            job_id,
        )
    }
}

const fn query_error(operation: &'static str, source: rusqlite::Error) -> SqliteRiskStoreError {
    SqliteRiskStoreError::Query { operation, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn temp_dir() -> TempDir {
        TempDir::new().expect("create temp dir")
    }

    fn seeded_store(dir: &TempDir) -> SqliteRiskStore {
        let store = SqliteRiskStore::open(dir.path().join("risk.db")).expect("open store");
        store
            .connection()
            .execute_batch(
                "INSERT INTO province_risk_raw VALUES ('QC', 20.0), ('ON', 10), ('AB', 30.0);
                 INSERT INTO job_features_raw VALUES ('0012', '{\"Monitoring\": 5}');
                 INSERT INTO job_features_raw VALUES ('0011', '{\"Repairing\": 5}');
                 INSERT INTO ability_skill_rubric_raw VALUES ('Repairing', 5, 1);
                 INSERT INTO ability_skill_rubric_raw VALUES ('Monitoring', NULL, 2);
                 INSERT INTO ability_skill_rubric_raw VALUES ('repairing', 1, 5);",
            )
            .expect("seed raw tables");
        store
    }

    #[rstest]
    fn reads_exposures_in_key_order(temp_dir: TempDir) {
        let store = seeded_store(&temp_dir);
        let rows = store.exposures(Dimension::Province).expect("read exposures");
        let keys: Vec<_> = rows.iter().map(|row| row.key.as_str()).collect();
        assert_eq!(keys, ["AB", "ON", "QC"]);
        assert_eq!(rows[1].exposure_value, 10.0);
        assert!(store
            .exposures(Dimension::Ethnicity)
            .expect("read empty dimension")
            .is_empty());
    }

    #[rstest]
    fn reads_rubric_in_insertion_order(temp_dir: TempDir) {
        let store = seeded_store(&temp_dir);
        let rows = store.rubric_rows().expect("read rubric");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].substitution_index, None);
        assert_eq!(rows[2].name, "repairing");
    }

    #[rstest]
    fn reads_job_features(temp_dir: TempDir) {
        let store = seeded_store(&temp_dir);
        let rows = store.job_features().expect("read job features");
        assert_eq!(rows[0], RawJobFeatures::new("0011", "{\"Repairing\": 5}"));
    }

    #[rstest]
    fn replace_is_delete_then_insert(temp_dir: TempDir) {
        let mut store = seeded_store(&temp_dir);
        store
            .replace_dimension_risk(
                Dimension::Province,
                &[NormalizedRisk::new("ON", 0.0), NormalizedRisk::new("AB", 1.0)],
            )
            .expect("first replace");
        store
            .replace_dimension_risk(Dimension::Province, &[NormalizedRisk::new("QC", 0.5)])
            .expect("second replace");

        assert_eq!(store.dimension_risk(Dimension::Province, "ON").expect("lookup"), None);
        assert_eq!(
            store.dimension_risk(Dimension::Province, "QC").expect("lookup"),
            Some(0.5)
        );
        let count: i64 = store
            .connection()
            .query_row("SELECT COUNT(*) FROM province_risk", [], |row| row.get(0))
            .expect("count rows");
        assert_eq!(count, 1);
    }

    #[rstest]
    fn job_outputs_round_trip(temp_dir: TempDir) {
        let mut store = seeded_store(&temp_dir);
        store
            .replace_job_outputs(
                &[JobProfile::new("0011", 1.0), JobProfile::new("0012", 0.0)],
                &[JobRisk::new("0011", 0.0), JobRisk::new("0012", 1.0)],
            )
            .expect("replace job outputs");
        assert_eq!(store.pcs_share("0011").expect("lookup"), Some(1.0));
        assert_eq!(store.job_risk("0012").expect("lookup"), Some(1.0));
        assert_eq!(store.job_risk("9999").expect("lookup"), None);
    }

    #[rstest]
    fn names_resolve_from_lookup_tables(temp_dir: TempDir) {
        let store = seeded_store(&temp_dir);
        store
            .connection()
            .execute_batch(
                "INSERT INTO provinces VALUES ('QC', 'Quebec');
                 INSERT INTO ethnicities VALUES ('SA', 'South Asian');
                 INSERT INTO job_titles VALUES ('0012', 'Office clerks'), ('0012', 'Clerks');",
            )
            .expect("seed lookup tables");
        assert_eq!(
            store.dimension_name(Dimension::Province, "QC").expect("lookup"),
            Some("Quebec".to_owned())
        );
        assert_eq!(
            store.dimension_name(Dimension::Ethnicity, "SA").expect("lookup"),
            Some("South Asian".to_owned())
        );
        assert_eq!(store.dimension_name(Dimension::Province, "SA").expect("lookup"), None);
        assert_eq!(store.job_title("0012").expect("lookup"), Some("Clerks".to_owned()));
        assert_eq!(store.job_title("0011").expect("lookup"), None);
    }

    #[rstest]
    fn duplicate_keys_roll_back_the_replace(temp_dir: TempDir) {
        let mut store = seeded_store(&temp_dir);
        store
            .replace_job_outputs(&[JobProfile::new("0011", 0.3)], &[JobRisk::new("0011", 0.7)])
            .expect("initial replace");

        let err = store
            .replace_job_outputs(
                &[JobProfile::new("0012", 0.1), JobProfile::new("0012", 0.2)],
                &[],
            )
            .expect_err("duplicate primary key should fail");
        assert!(matches!(err, SqliteRiskStoreError::Query { .. }));

        assert_eq!(store.pcs_share("0011").expect("lookup"), Some(0.3));
        assert_eq!(store.job_risk("0011").expect("lookup"), Some(0.7));
    }

    #[rstest]
    fn read_only_store_rejects_writes(temp_dir: TempDir) {
        let path = temp_dir.path().join("risk.db");
        drop(SqliteRiskStore::open(&path).expect("create database"));
        let mut store = SqliteRiskStore::open_read_only(&path).expect("open read-only");
        let err = store
            .replace_job_outputs(&[], &[])
            .expect_err("read-only writes should fail");
        assert!(matches!(err, SqliteRiskStoreError::Query { .. }));
    }

    #[rstest]
    fn opening_missing_read_only_database_fails(temp_dir: TempDir) {
        let err = SqliteRiskStore::open_read_only(temp_dir.path().join("absent.db"))
            .expect_err("missing database");
        assert!(matches!(err, SqliteRiskStoreError::OpenDatabase { .. }));
    }
}
