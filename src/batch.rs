//! Project discovery and the per-file driver.
//!
//! Files are processed strictly one at a time. A failing file is reported and
//! the run moves on; nothing a single file does can abort the batch.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::ProjectError;
use crate::options::Options;
use crate::project::Project;
use crate::report::Report;
use crate::rules::Dialect;

/// Pattern shown to the operator when nothing matches.
pub const SEARCH_PATTERN: &str = "*.*proj";

/// What happened to one candidate file.
#[derive(Debug)]
pub enum FileOutcome {
    /// Extension has no rule set.
    Skipped,
    Succeeded { saved: bool },
    /// Edits from steps that completed before `error` were still saved when
    /// `saved` is set.
    Failed { saved: bool, error: ProjectError },
}

/// Tally of a whole run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub saved: usize,
}

impl BatchSummary {
    fn tally(&mut self, outcome: &FileOutcome) {
        self.processed += 1;
        match outcome {
            FileOutcome::Skipped => self.skipped += 1,
            FileOutcome::Succeeded { saved } => {
                self.succeeded += 1;
                self.saved += usize::from(*saved);
            }
            FileOutcome::Failed { saved, .. } => {
                self.failed += 1;
                self.saved += usize::from(*saved);
            }
        }
    }
}

fn is_candidate(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.to_ascii_lowercase().ends_with("proj"))
}

/// Every file under `root` whose extension ends in `proj`, in a stable order.
/// Unreadable directory entries are logged and left out.
pub fn discover(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if entry.file_type().is_file() && is_candidate(entry.path()) {
            files.push(entry.into_path());
        }
    }
    debug!(root = %root.display(), count = files.len(), "discovered project files");
    files
}

/// Load, edit and save one file. `out` receives progress lines, `err` the
/// failure lines.
pub fn process_file<O: Write, E: Write>(
    path: &Path,
    options: &Options,
    out: &mut O,
    err: &mut E,
) -> io::Result<FileOutcome> {
    writeln!(out, "\nStart to modify settings to file: {}", path.display())?;

    let Some(dialect) = Dialect::from_path(path) else {
        debug!(path = %path.display(), "no rule set for extension, skipping");
        return Ok(FileOutcome::Skipped);
    };

    let mut report = Report::new();
    let outcome = match edit(path, dialect, options, &mut report) {
        Ok(saved) => FileOutcome::Succeeded { saved },
        Err((saved, error)) => FileOutcome::Failed { saved, error },
    };

    for change in report.changes() {
        writeln!(out, "{change}")?;
    }
    match &outcome {
        FileOutcome::Failed { error, .. } => {
            warn!(path = %path.display(), error = %error, "failed to modify project");
            writeln!(err, "{error}")?;
            writeln!(err, "Failed to modify settings!")?;
        }
        _ => writeln!(out, "Successfully modified settings!")?,
    }
    Ok(outcome)
}

/// Returns whether the file was written. On failure, the flag tells whether
/// earlier steps' edits were still saved.
fn edit(
    path: &Path,
    dialect: Dialect,
    options: &Options,
    report: &mut Report,
) -> Result<bool, (bool, ProjectError)> {
    let mut project = Project::from_file(path).map_err(|e| (false, e))?;
    let applied = dialect.apply(&mut project, options, report);

    let saved = if report.needs_save() {
        project.save(path).map_err(|e| (false, e))?;
        true
    } else {
        false
    };
    applied.map(|()| saved).map_err(|e| (saved, e))
}

/// Process every project file under `root`.
pub fn run<O: Write, E: Write>(
    root: &Path,
    options: &Options,
    out: &mut O,
    err: &mut E,
) -> io::Result<BatchSummary> {
    let files = discover(root);
    let mut summary = BatchSummary::default();

    if files.is_empty() {
        writeln!(
            out,
            "Didn't find any {SEARCH_PATTERN} file under {}!",
            root.display()
        )?;
        return Ok(summary);
    }

    for path in &files {
        let outcome = process_file(path, options, out, err)?;
        summary.tally(&outcome);
    }

    info!(
        processed = summary.processed,
        succeeded = summary.succeeded,
        failed = summary.failed,
        skipped = summary.skipped,
        saved = summary.saved,
        "batch finished"
    );
    Ok(summary)
}
