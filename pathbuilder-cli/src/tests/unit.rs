//! Focused unit tests covering init and recompute configuration.

use super::helpers::SourceFiles;
use super::*;
use crate::init::{InitArgs, InitConfig};
use crate::recompute::{RecomputeArgs, RecomputeConfig, execute_recompute};
use camino::Utf8PathBuf;
use rstest::rstest;
use std::fs;

fn complete_init_args() -> InitArgs {
    InitArgs {
        database: None,
        jobs: Some(Utf8PathBuf::from("jobs.csv")),
        features: Some(Utf8PathBuf::from("features.csv")),
        rubric: Some(Utf8PathBuf::from("rubric.csv")),
        provinces: Some(Utf8PathBuf::from("provinces.csv")),
        ethnicities: Some(Utf8PathBuf::from("ethnicities.csv")),
    }
}

#[rstest]
#[case(ARG_JOBS, ENV_INIT_JOBS)]
#[case(ARG_FEATURES, ENV_INIT_FEATURES)]
#[case(ARG_RUBRIC, ENV_INIT_RUBRIC)]
#[case(ARG_PROVINCES, ENV_INIT_PROVINCES)]
#[case(ARG_ETHNICITIES, ENV_INIT_ETHNICITIES)]
fn converting_init_without_required_fields_errors(
    #[case] field: &'static str,
    #[case] env_var: &'static str,
) {
    let mut args = complete_init_args();
    match field {
        ARG_JOBS => args.jobs = None,
        ARG_FEATURES => args.features = None,
        ARG_RUBRIC => args.rubric = None,
        ARG_PROVINCES => args.provinces = None,
        _ => args.ethnicities = None,
    }
    let err = InitConfig::try_from(args).expect_err("missing field should error");
    match err {
        CliError::MissingArgument {
            field: missing,
            env,
        } => {
            assert_eq!(missing, field);
            assert_eq!(env, env_var);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn init_config_defaults_the_database_path() {
    let config = InitConfig::try_from(complete_init_args()).expect("config should build");
    assert_eq!(config.database, Utf8PathBuf::from(DEFAULT_DATABASE));
    assert_eq!(config.sources.rubric, Utf8PathBuf::from("rubric.csv"));
}

#[rstest]
fn validate_sources_reports_missing_files() {
    let files = SourceFiles::new();
    let mut config = files.init_config();
    config.sources.features = files.root().join("absent.csv");
    let err = config.validate_sources().expect_err("expected failure");
    match err {
        CliError::MissingSourceFile { field, path } => {
            assert_eq!(field, ARG_FEATURES);
            assert_eq!(path, files.root().join("absent.csv"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[rstest]
fn validate_sources_rejects_directories() {
    let files = SourceFiles::new();
    let mut config = files.init_config();
    let directory = files.root().join("rubric.d");
    fs::create_dir(&directory).expect("create directory");
    config.sources.rubric = directory;
    let err = config
        .validate_sources()
        .expect_err("expected directory rejection");
    match err {
        CliError::SourcePathNotFile { field, .. } => assert_eq!(field, ARG_RUBRIC),
        other => panic!("unexpected error {other:?}"),
    }
}

#[rstest]
fn validate_sources_accepts_existing_files() {
    let files = SourceFiles::new();
    files
        .init_config()
        .validate_sources()
        .expect("every source exists");
}

#[rstest]
fn recompute_config_keeps_an_explicit_database() {
    let config = RecomputeConfig::from(RecomputeArgs {
        database: Some(Utf8PathBuf::from("var/risk.db")),
    });
    assert_eq!(config.database, Utf8PathBuf::from("var/risk.db"));
    let defaulted = RecomputeConfig::from(RecomputeArgs::default());
    assert_eq!(defaulted.database, Utf8PathBuf::from(DEFAULT_DATABASE));
}

#[rstest]
fn recompute_requires_an_existing_database() {
    let files = SourceFiles::new();
    let config = RecomputeConfig {
        database: files.root().join("missing.db"),
    };
    let mut sink = Vec::new();
    let err = execute_recompute(&config, &mut sink).expect_err("missing database should fail");
    match err {
        CliError::MissingSourceFile { field, .. } => assert_eq!(field, ARG_DATABASE),
        other => panic!("unexpected error {other:?}"),
    }
    assert!(sink.is_empty(), "nothing should be printed on failure");
}

#[rstest]
fn cli_parses_each_subcommand() {
    let init = Cli::try_parse_from([
        "pathbuilder",
        "init",
        "--jobs",
        "jobs.csv",
        "--database",
        "risk.db",
    ])
    .expect("init parses");
    match init.command {
        Command::Init(args) => {
            assert_eq!(args.jobs, Some(Utf8PathBuf::from("jobs.csv")));
            assert_eq!(args.database, Some(Utf8PathBuf::from("risk.db")));
            assert!(args.features.is_none());
        }
        other => panic!("expected init, found {other:?}"),
    }

    let recompute = Cli::try_parse_from(["pathbuilder", "recompute"]).expect("recompute parses");
    assert!(matches!(recompute.command, Command::Recompute(_)));

    let score = Cli::try_parse_from([
        "pathbuilder",
        "score",
        "--province",
        "ON",
        "--replaceability",
        "0.4",
    ])
    .expect("score parses");
    match score.command {
        Command::Score(args) => {
            assert_eq!(args.province.as_deref(), Some("ON"));
            assert_eq!(args.replaceability, Some(0.4));
        }
        other => panic!("expected score, found {other:?}"),
    }
}

#[rstest]
fn cli_rejects_unknown_subcommands() {
    let err = Cli::try_parse_from(["pathbuilder", "train"]).expect_err("unknown subcommand");
    assert_eq!(err.kind(), clap::error::ErrorKind::InvalidSubcommand);
}

#[rstest]
fn write_json_appends_a_newline() {
    let mut sink = Vec::new();
    write_json(&mut sink, &serde_json::json!({ "jobs": 2 })).expect("write json");
    let text = String::from_utf8(sink).expect("utf-8 output");
    assert_eq!(text, "{\n  \"jobs\": 2\n}\n");
}
