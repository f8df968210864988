//! Finding the uploaded CSV file among downloaded files.

use std::{
    error, fmt,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

use crate::common::*;

/// The file name suffix that marks a file as CSV. This is case-sensitive.
pub(crate) const CSV_SUFFIX: &str = ".csv";

/// What to do when more than one CSV file is present.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) enum LocatePolicy {
    /// Pick the first CSV file in sorted path order.
    #[default]
    FirstMatch,
    /// Fail unless there is exactly one CSV file.
    RequireUnique,
}

/// Errors that can occur while locating a CSV file.
#[derive(Debug)]
pub(crate) enum LocateError {
    /// No file under `root` ends with `.csv`.
    NoMatchingFile { root: PathBuf },
    /// More than one file ends with `.csv`, and we were asked for exactly one.
    AmbiguousMatch {
        root: PathBuf,
        candidates: Vec<PathBuf>,
    },
}

impl fmt::Display for LocateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocateError::NoMatchingFile { root } => write!(
                f,
                "no file ending in {:?} was found under {}",
                CSV_SUFFIX,
                root.display(),
            ),
            LocateError::AmbiguousMatch { root, candidates } => {
                write!(
                    f,
                    "expected exactly one file ending in {:?} under {}, found {}:",
                    CSV_SUFFIX,
                    root.display(),
                    candidates.len(),
                )?;
                for candidate in candidates {
                    write!(f, " {}", candidate.display())?;
                }
                Ok(())
            }
        }
    }
}

impl error::Error for LocateError {}

/// Recursively list every regular file beneath `root`, sorted by path.
///
/// Symlinks are followed. Directories are descended into but not listed.
pub(crate) fn list_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = vec![];
    debug!("walking {}", root.display());
    let walker = WalkDir::new(root).follow_links(true).sort_by_file_name();
    for dirent in walker {
        let dirent = dirent
            .with_context(|| format!("error listing files in {}", root.display()))?;
        trace!("found dirent {}", dirent.path().display());
        if dirent.file_type().is_file() {
            paths.push(dirent.into_path());
        }
    }
    // `sort_by_file_name` sorts siblings, but we want one total order across
    // the whole tree.
    paths.sort();
    Ok(paths)
}

/// Find the CSV file beneath `root`, using `policy` to break ties.
#[instrument(level = "debug", skip(root), fields(root = %root.display()))]
pub(crate) fn locate_csv(root: &Path, policy: LocatePolicy) -> Result<PathBuf> {
    let mut candidates = list_files(root)?
        .into_iter()
        .filter(|p| has_csv_suffix(p))
        .collect::<Vec<_>>();
    match (candidates.len(), policy) {
        (0, _) => Err(LocateError::NoMatchingFile {
            root: root.to_owned(),
        }
        .into()),
        (1, _) => Ok(candidates.remove(0)),
        (_, LocatePolicy::RequireUnique) => Err(LocateError::AmbiguousMatch {
            root: root.to_owned(),
            candidates,
        }
        .into()),
        (_, LocatePolicy::FirstMatch) => {
            let chosen = candidates.remove(0);
            warn!(
                "found {} CSV files under {}, using {} and ignoring {:?}",
                candidates.len() + 1,
                root.display(),
                chosen.display(),
                candidates,
            );
            Ok(chosen)
        }
    }
}

/// Does the file name of `path` end with [`CSV_SUFFIX`]?
fn has_csv_suffix(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.ends_with(CSV_SUFFIX))
        .unwrap_or(false)
}
