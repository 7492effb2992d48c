//! Loaders that replace raw table contents from CSV sources.
//!
//! Each loader parses its source completely before touching the database,
//! then clears and refills its tables inside one transaction.

use std::collections::BTreeSet;

use camino::Utf8Path;
use cap_std::fs_utf8;
use log::{info, warn};
use pathbuilder_core::{Dimension, RawJobFeatures, RubricRow};
use pathbuilder_fs::open_utf8_file;
use rusqlite::{Connection, Statement, Transaction};
use serde::Serialize;

use crate::{
    error::{LoadError, SourceError},
    sources::{
        ExposureSourceRow, JobTitle, read_exposures, read_job_features, read_jobs, read_rubric,
    },
};

/// Rows written by [`load_jobs`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JobCounts {
    /// Rows written to `jobs`.
    pub jobs: usize,
    /// Rows written to `job_titles`.
    pub job_titles: usize,
}

/// Replace `jobs` and `job_titles` from the jobs source at `path`.
///
/// # Errors
/// Returns [`LoadError`] when the source cannot be read or a write fails.
/// Nothing is changed when the load fails.
pub fn load_jobs(connection: &mut Connection, path: &Utf8Path) -> Result<JobCounts, LoadError> {
    let catalogue = read_source(path, read_jobs)?;
    let transaction = begin(connection, "jobs")?;
    let jobs = replace_rows(
        &transaction,
        "jobs",
        "INSERT INTO jobs (job_id, title) VALUES (?1, ?2)",
        &catalogue.jobs,
        insert_title,
    )?;
    let job_titles = replace_rows(
        &transaction,
        "job_titles",
        "INSERT INTO job_titles (job_id, title) VALUES (?1, ?2)",
        &catalogue.titles,
        insert_title,
    )?;
    commit(transaction, "jobs")?;
    Ok(JobCounts { jobs, job_titles })
}

fn insert_title(statement: &mut Statement<'_>, row: &JobTitle) -> rusqlite::Result<usize> {
    statement.execute((&row.job_id, &row.title))
}

/// Replace `job_features_raw` from the wide features source at `path`.
///
/// Only jobs already present in `jobs` are kept, so load the jobs source
/// first.
///
/// # Errors
/// Returns [`LoadError`] when the source cannot be read, the known job ids
/// cannot be queried or a write fails.
pub fn load_job_features(connection: &mut Connection, path: &Utf8Path) -> Result<usize, LoadError> {
    let parsed = read_source(path, read_job_features)?;
    let known = known_job_ids(connection)?;
    let (kept, dropped): (Vec<RawJobFeatures>, Vec<RawJobFeatures>) = parsed
        .into_iter()
        .partition(|row| known.contains(&row.job_id));
    if !dropped.is_empty() {
        warn!(
            "dropping features for {} job ids missing from jobs",
            dropped.len()
        );
    }

    let transaction = begin(connection, "job_features_raw")?;
    let written = replace_rows(
        &transaction,
        "job_features_raw",
        "INSERT INTO job_features_raw (job_id, features_json) VALUES (?1, ?2)",
        &kept,
        |statement, row| statement.execute((&row.job_id, &row.features_json)),
    )?;
    commit(transaction, "job_features_raw")?;
    Ok(written)
}

fn known_job_ids(connection: &Connection) -> Result<BTreeSet<String>, LoadError> {
    let mut statement = connection
        .prepare("SELECT job_id FROM jobs")
        .map_err(|source| LoadError::ReadJobIds { source })?;
    let ids = statement
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(|source| LoadError::ReadJobIds { source })?;
    ids.collect::<Result<BTreeSet<_>, _>>()
        .map_err(|source| LoadError::ReadJobIds { source })
}

/// Replace `ability_skill_rubric_raw` from the rubric source at `path`,
/// keeping file order.
///
/// # Errors
/// Returns [`LoadError`] when the source cannot be read or a write fails.
pub fn load_rubric(connection: &mut Connection, path: &Utf8Path) -> Result<usize, LoadError> {
    let rows = read_source(path, read_rubric)?;
    let transaction = begin(connection, "ability_skill_rubric_raw")?;
    let written = replace_rows(
        &transaction,
        "ability_skill_rubric_raw",
        "INSERT INTO ability_skill_rubric_raw \
         (name, substitution_index, complementarity_index) VALUES (?1, ?2, ?3)",
        &rows,
        |statement, row: &RubricRow| {
            statement.execute((&row.name, row.substitution_index, row.complementarity_index))
        },
    )?;
    commit(transaction, "ability_skill_rubric_raw")?;
    Ok(written)
}

/// Replace a dimension's lookup and raw exposure tables from the source at
/// `path`.
///
/// # Errors
/// Returns [`LoadError`] when the source cannot be read or a write fails.
pub fn load_exposures(
    connection: &mut Connection,
    dimension: Dimension,
    path: &Utf8Path,
) -> Result<usize, LoadError> {
    let rows = read_source(path, read_exposures)?;
    let lookup_sql = format!(
        "INSERT INTO {} (code, name) VALUES (?1, ?2)",
        dimension.lookup_table()
    );
    let raw_sql = format!(
        "INSERT INTO {} ({}, exposure_value) VALUES (?1, ?2)",
        dimension.raw_table(),
        dimension.key_column()
    );

    let transaction = begin(connection, dimension.lookup_table())?;
    replace_rows(
        &transaction,
        dimension.lookup_table(),
        &lookup_sql,
        &rows,
        |statement, row: &ExposureSourceRow| statement.execute((&row.code, &row.name)),
    )?;
    let written = replace_rows(
        &transaction,
        dimension.raw_table(),
        &raw_sql,
        &rows,
        |statement, row: &ExposureSourceRow| statement.execute((&row.code, row.exposure_value)),
    )?;
    commit(transaction, dimension.lookup_table())?;
    info!("loaded {written} {dimension} exposures from {path}");
    Ok(written)
}

fn read_source<T>(
    path: &Utf8Path,
    parse: impl FnOnce(fs_utf8::File) -> Result<T, SourceError>,
) -> Result<T, LoadError> {
    let file = open_utf8_file(path).map_err(|source| LoadError::OpenSource {
        path: path.to_path_buf(),
        source,
    })?;
    parse(file).map_err(|source| LoadError::ParseSource {
        path: path.to_path_buf(),
        source,
    })
}

fn begin<'conn>(
    connection: &'conn mut Connection,
    table: &'static str,
) -> Result<Transaction<'conn>, LoadError> {
    connection
        .transaction()
        .map_err(|source| LoadError::BeginTransaction { table, source })
}

fn commit(transaction: Transaction<'_>, table: &'static str) -> Result<(), LoadError> {
    transaction
        .commit()
        .map_err(|source| LoadError::Commit { table, source })
}

fn replace_rows<T>(
    transaction: &Transaction<'_>,
    table: &'static str,
    insert_sql: &str,
    rows: &[T],
    mut insert: impl FnMut(&mut Statement<'_>, &T) -> rusqlite::Result<usize>,
) -> Result<usize, LoadError> {
    transaction
        .execute(&format!("DELETE FROM {table}"), [])
        .map_err(|source| LoadError::ClearTable { table, source })?;
    let mut statement = transaction
        .prepare(insert_sql)
        .map_err(|source| LoadError::PrepareInsert { table, source })?;
    for (row, entry) in rows.iter().enumerate() {
        insert(&mut statement, entry)
            .map_err(|source| LoadError::PersistRow { table, row, source })?;
    }
    Ok(rows.len())
}
