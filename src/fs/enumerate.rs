//! Candidate enumeration from a fileset list.
//!
//! Expands each configured root (plain file or directory tree) into the
//! ordered candidate queue drained later by the backup session. Directory
//! markers carry a trailing slash and are pushed unconditionally; only
//! plain files go through the allow/deny policy.

use crate::filter::FilterPolicy;
use crate::report::JobReporter;
use crate::utils::errors::{EngineError, Result};
use std::path::Path;
use walkdir::WalkDir;

/// Destination for discovered candidates.
///
/// Drivers that post-process candidates (deduplication, extra checks)
/// implement this instead of wrapping the enumerator; the default queue is
/// a plain `Vec<String>`.
pub trait CandidateSink {
    fn push(&mut self, candidate: String);
}

impl CandidateSink for Vec<String> {
    fn push(&mut self, candidate: String) {
        Vec::push(self, candidate);
    }
}

/// Read the fileset list file: one backup root per line.
///
/// A missing or unreadable list file is a fatal configuration error.
pub fn read_fileset(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(EngineError::Config(format!(
            "fileset list {} does not exist",
            path.display()
        )));
    }
    let content = std::fs::read_to_string(path).map_err(|e| {
        EngineError::Config(format!(
            "could not read fileset list {}: {e}",
            path.display()
        ))
    })?;
    Ok(content.lines().map(str::to_string).collect())
}

/// Expand the configured roots into backup candidates.
///
/// Roots that are neither file nor directory (broken symlinks, devices,
/// sockets) produce nothing. A directory root gets a trailing slash and is
/// pushed before its contents.
pub fn enumerate(
    roots: &[String],
    filter: &FilterPolicy,
    reporter: &dyn JobReporter,
    sink: &mut dyn CandidateSink,
) {
    for item in roots {
        let path = Path::new(item);
        if path.is_file() && filter.is_allowed(item, reporter) {
            sink.push(item.clone());
        }
        if path.is_dir() {
            // the controller requires a trailing slash on directory names
            let marker = if item.ends_with('/') {
                item.clone()
            } else {
                format!("{item}/")
            };
            sink.push(marker);
            walk_level(path, filter, reporter, sink);
        }
    }
}

/// Walk one directory level: plain entries first (filtered), then
/// subdirectory markers (unfiltered), then descent. Symlinked directories
/// get a marker but are never descended into.
fn walk_level(
    dir: &Path,
    filter: &FilterPolicy,
    reporter: &dyn JobReporter,
    sink: &mut dyn CandidateSink,
) {
    let mut files = Vec::new();
    let mut dirs = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                reporter.debug(
                    100,
                    &format!("Skipping unreadable entry under {}: {e}", dir.display()),
                );
                continue;
            }
        };
        if entry.path().is_dir() {
            dirs.push(entry);
        } else {
            files.push(entry);
        }
    }

    for entry in &files {
        let name = entry.path().to_string_lossy().into_owned();
        if filter.is_allowed(&name, reporter) {
            sink.push(name);
        }
    }
    for entry in &dirs {
        sink.push(format!("{}/", entry.path().display()));
    }
    for entry in &dirs {
        if !entry.path_is_symlink() {
            walk_level(entry.path(), filter, reporter, sink);
        }
    }
}
