//! Snapshot runner
//!
//!     Finds fixtures under a directory, scans each one and compares the rendered result with
//!     the snapshot stored next to it (`foo.test.clove` -> `foo.test.clove.snap`). In update
//!     mode the snapshots are rewritten instead of compared.
//!
//!     Fixtures are independent, so they are scanned in parallel, one scanner session per
//!     fixture over the shared repository.

use super::render::render;
use crate::config::{ScannerConfig, SnapshotConfig};
use crate::grammar::Repository;
use crate::scanner::Scanner;
use rayon::prelude::*;
use similar::TextDiff;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// What happened to one fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    /// The snapshot was written (update mode).
    Updated,
    /// No snapshot exists yet and update mode is off.
    Missing,
    /// The rendering differs; carries a unified diff from expected to actual.
    Failed { diff: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureReport {
    pub fixture: PathBuf,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub fixtures: Vec<FixtureReport>,
}

impl Report {
    pub fn passed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Passed | Outcome::Updated))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed { .. } | Outcome::Missing))
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    fn count(&self, predicate: impl Fn(&Outcome) -> bool) -> usize {
        self.fixtures
            .iter()
            .filter(|report| predicate(&report.outcome))
            .count()
    }
}

pub struct SnapshotRunner<'g> {
    repository: &'g Repository,
    scanner: ScannerConfig,
    config: SnapshotConfig,
    update: bool,
}

impl<'g> SnapshotRunner<'g> {
    pub fn new(repository: &'g Repository, scanner: ScannerConfig, config: SnapshotConfig) -> Self {
        Self {
            repository,
            scanner,
            config,
            update: false,
        }
    }

    /// Write snapshots instead of comparing against them.
    pub fn update(mut self, update: bool) -> Self {
        self.update = update;
        self
    }

    /// Where the snapshot for `fixture` lives.
    pub fn snapshot_path(&self, fixture: &Path) -> PathBuf {
        let mut name = fixture.as_os_str().to_os_string();
        name.push(&self.config.snapshot_suffix);
        PathBuf::from(name)
    }

    /// Render one fixture without touching its snapshot.
    pub fn render_fixture(&self, fixture: &Path) -> Result<String, SnapshotError> {
        let source = fs::read_to_string(fixture).map_err(|source| SnapshotError::Read {
            path: fixture.to_path_buf(),
            source,
        })?;
        let output = Scanner::with_config(self.repository, self.scanner.clone()).scan(&source, None);
        Ok(render(&source, &output.tokens))
    }

    /// Run one fixture.
    pub fn run_fixture(&self, fixture: &Path) -> Result<FixtureReport, SnapshotError> {
        let actual = self.render_fixture(fixture)?;
        let snapshot = self.snapshot_path(fixture);

        let outcome = if self.update {
            fs::write(&snapshot, &actual).map_err(|source| SnapshotError::Write {
                path: snapshot.clone(),
                source,
            })?;
            Outcome::Updated
        } else {
            match fs::read_to_string(&snapshot) {
                Ok(expected) if expected == actual => Outcome::Passed,
                Ok(expected) => Outcome::Failed {
                    diff: TextDiff::from_lines(&expected, &actual)
                        .unified_diff()
                        .header("expected", "actual")
                        .to_string(),
                },
                Err(err) if err.kind() == io::ErrorKind::NotFound => Outcome::Missing,
                Err(source) => {
                    return Err(SnapshotError::Read {
                        path: snapshot,
                        source,
                    })
                }
            }
        };

        tracing::debug!(fixture = %fixture.display(), ?outcome, "snapshot checked");
        Ok(FixtureReport {
            fixture: fixture.to_path_buf(),
            outcome,
        })
    }

    /// Discover and run every fixture under `dir`.
    pub fn run(&self, dir: &Path) -> Result<Report, SnapshotError> {
        let fixtures = discover(dir, &self.config.fixture_suffix).map_err(|source| {
            SnapshotError::Read {
                path: dir.to_path_buf(),
                source,
            }
        })?;

        let fixtures = fixtures
            .par_iter()
            .map(|fixture| self.run_fixture(fixture))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Report { fixtures })
    }
}

/// Every file under `dir` whose name ends with `suffix`, sorted.
pub fn discover(dir: &Path, suffix: &str) -> io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with(suffix))
            {
                found.push(path);
            }
        }
    }

    found.sort();
    Ok(found)
}
