//! Snapshot testing
//!
//!     Grammar regressions are caught by scanning fixture files and comparing the result
//!     against checked-in snapshots. The text format is the one `vscode-tmgrammar-snap`
//!     writes, so snapshots stay readable in review and interchangeable with that tool:
//!
//!         >val x = 1
//!         #^^^ source.clove keyword.declaration.stable.clove
//!         #   ^ source.clove
//!
//!     See [render] for the format and [runner] for discovery, comparison and updates.

pub mod render;
pub mod runner;

pub use render::render;
pub use runner::{discover, FixtureReport, Outcome, Report, SnapshotError, SnapshotRunner};
