//! Test helpers that lay out CSV sources and seeded databases.

use crate::init::{InitConfig, execute_init};
use camino::Utf8PathBuf;
use pathbuilder_data::DataSources;
use std::fs;
use tempfile::TempDir;

pub(super) const JOBS_CSV: &str = "NOC_CODE,OASIS_LABEL\n12,Clerks\n7315,Mechanics\n";
pub(super) const FEATURES_CSV: &str = "NOC_CODE,OASIS_LABEL,Monitoring\n12,Clerks,5\n";
pub(super) const RUBRIC_CSV: &str =
    "Name,Substitution_Index,Complementarity_Index\nMonitoring,5,1\n";
pub(super) const PROVINCES_CSV: &str = "code,name,exposure_value\nON,Ontario,3\nQC,Quebec,5\n";
pub(super) const ETHNICITIES_CSV: &str = "code,name,exposure_value\nSA,South Asian,2\n";

/// Temporary directory holding one copy of every CSV source.
pub(super) struct SourceFiles {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl SourceFiles {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        let files = Self { _dir: dir, root };
        files.write("jobs.csv", JOBS_CSV);
        files.write("features.csv", FEATURES_CSV);
        files.write("rubric.csv", RUBRIC_CSV);
        files.write("provinces.csv", PROVINCES_CSV);
        files.write("ethnicities.csv", ETHNICITIES_CSV);
        files
    }

    pub(super) fn write(&self, name: &str, contents: &str) -> Utf8PathBuf {
        let path = self.root.join(name);
        fs::write(&path, contents).expect("write source file");
        path
    }

    pub(super) fn root(&self) -> &Utf8PathBuf {
        &self.root
    }

    pub(super) fn database(&self) -> Utf8PathBuf {
        self.root.join("out/pathbuilder.db")
    }

    pub(super) fn sources(&self) -> DataSources {
        DataSources {
            jobs: self.root.join("jobs.csv"),
            features: self.root.join("features.csv"),
            rubric: self.root.join("rubric.csv"),
            provinces: self.root.join("provinces.csv"),
            ethnicities: self.root.join("ethnicities.csv"),
        }
    }

    pub(super) fn init_config(&self) -> InitConfig {
        InitConfig {
            database: self.database(),
            sources: self.sources(),
        }
    }

    /// Run `init` against the sources and return the database path.
    pub(super) fn seed(&self) -> Utf8PathBuf {
        let mut sink = Vec::new();
        execute_init(&self.init_config(), &mut sink).expect("init should succeed");
        self.database()
    }
}
