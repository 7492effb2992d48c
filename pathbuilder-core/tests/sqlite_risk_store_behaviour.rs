//! Behavioural tests for `SqliteRiskStore` using rstest-bdd.

use std::cell::RefCell;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;
use pathbuilder_core::{
    Dimension, JobProfile, JobRisk, NormalizedRisk, RiskStore, SqliteRiskStore,
    SqliteRiskStoreError,
};

/// Shared state for SQLite risk store scenarios.
#[derive(Debug)]
struct RiskStoreWorld {
    temp_dir: TempDir,
    store: RefCell<Option<SqliteRiskStore>>,
    replace_error: RefCell<Option<SqliteRiskStoreError>>,
    lookup: RefCell<Option<f64>>,
}

impl RiskStoreWorld {
    fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("create temp dir"),
            store: RefCell::new(None),
            replace_error: RefCell::new(None),
            lookup: RefCell::new(None),
        }
    }

    fn with_store<T>(&self, f: impl FnOnce(&mut SqliteRiskStore) -> T) -> T {
        let mut holder = self.store.borrow_mut();
        let store = holder
            .as_mut()
            .expect("store should be opened before use");
        f(store)
    }
}

#[fixture]
fn world() -> RiskStoreWorld {
    RiskStoreWorld::new()
}

#[given("a fresh SQLite risk database")]
fn given_database(world: &RiskStoreWorld) {
    let path = world.temp_dir.path().join("risk.db");
    let store = SqliteRiskStore::open(path).expect("open store");
    world.store.replace(Some(store));
}

#[given("province risk rows for ON and QC")]
fn given_province_rows(world: &RiskStoreWorld) {
    world
        .with_store(|store| {
            store.replace_dimension_risk(
                Dimension::Province,
                &[NormalizedRisk::new("ON", 0.0), NormalizedRisk::new("QC", 1.0)],
            )
        })
        .expect("seed province risk");
}

#[given("stored job outputs for job 0011")]
fn given_job_outputs(world: &RiskStoreWorld) {
    world
        .with_store(|store| {
            store.replace_job_outputs(&[JobProfile::new("0011", 0.25)], &[JobRisk::new("0011", 0.75)])
        })
        .expect("seed job outputs");
}

#[when("I replace province risk with a single row for AB")]
fn when_replace_province(world: &RiskStoreWorld) {
    world
        .with_store(|store| {
            store.replace_dimension_risk(Dimension::Province, &[NormalizedRisk::new("AB", 0.5)])
        })
        .expect("replace province risk");
}

#[when("I replace job outputs with a duplicated job id")]
fn when_replace_duplicate(world: &RiskStoreWorld) {
    let result = world.with_store(|store| {
        store.replace_job_outputs(
            &[JobProfile::new("0012", 0.1)],
            &[JobRisk::new("0012", 0.2), JobRisk::new("0012", 0.3)],
        )
    });
    world.replace_error.replace(result.err());
}

#[when("I look up job 9999")]
fn when_lookup_unknown(world: &RiskStoreWorld) {
    let risk = world
        .with_store(|store| store.job_risk("9999"))
        .expect("lookup succeeds");
    world.lookup.replace(risk);
}

#[then("only AB has a stored province risk")]
fn then_only_ab(world: &RiskStoreWorld) {
    world.with_store(|store| {
        for key in ["ON", "QC"] {
            assert_eq!(
                store
                    .dimension_risk(Dimension::Province, key)
                    .expect("lookup"),
                None,
                "{key} should have been cleared"
            );
        }
        assert_eq!(
            store.dimension_risk(Dimension::Province, "AB").expect("lookup"),
            Some(0.5)
        );
    });
}

#[then("the replace fails with a query error")]
fn then_query_error(world: &RiskStoreWorld) {
    let binding = world.replace_error.borrow();
    let error = binding.as_ref().expect("an error should be recorded");
    assert!(matches!(error, SqliteRiskStoreError::Query { .. }));
}

#[then("job 0011 keeps its earlier outputs")]
fn then_outputs_kept(world: &RiskStoreWorld) {
    world.with_store(|store| {
        assert_eq!(store.pcs_share("0011").expect("lookup"), Some(0.25));
        assert_eq!(store.job_risk("0011").expect("lookup"), Some(0.75));
        assert_eq!(store.pcs_share("0012").expect("lookup"), None);
    });
}

#[then("no job risk is returned")]
fn then_no_risk(world: &RiskStoreWorld) {
    assert_eq!(*world.lookup.borrow(), None);
}

#[scenario(path = "tests/features/sqlite_risk_store.feature", index = 0)]
fn replacing_clears_rows(world: RiskStoreWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/sqlite_risk_store.feature", index = 1)]
fn rejected_replace_rolls_back(world: RiskStoreWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/sqlite_risk_store.feature", index = 2)]
fn unknown_job_lookup(world: RiskStoreWorld) {
    let _ = world;
}
