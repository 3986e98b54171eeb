//! Source tree discovery and staged file naming

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::StageError;

/// Extension of files the stager picks up.
pub const SOURCE_EXTENSION: &str = "py";
/// Extension given to annotated files handed to Cython.
pub const STAGED_EXTENSION: &str = "pyx";

/// Check if a path names a transformable source file.
pub fn is_source_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION)
}

/// Mirror of `relative` under `output_dir` with the staged extension.
pub fn staged_path(output_dir: &Path, relative: &Path) -> PathBuf {
    output_dir.join(relative).with_extension(STAGED_EXTENSION)
}

/// One source file found under the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub relative: PathBuf,
}

/// Every source file under a root directory, in visitation order.
///
/// Within a directory, files are visited before subdirectories and each group
/// is ordered by name, so two walks over an unchanged tree agree.
#[derive(Debug, Clone, Default)]
pub struct SourceTree {
    root: PathBuf,
    files: Vec<SourceFile>,
}

impl SourceTree {
    /// Walk `root` and collect every file matching [`is_source_file`].
    pub fn discover(root: &Path) -> Result<Self, StageError> {
        let mut paths = Vec::new();
        collect_files(root, &is_source_file, &mut paths)?;

        let files = paths
            .into_iter()
            .map(|path| {
                let relative = path
                    .strip_prefix(root)
                    .map_err(|_| StageError::OutsideRoot {
                        path: path.clone(),
                        root: root.to_path_buf(),
                    })?
                    .to_path_buf();
                Ok::<_, StageError>(SourceFile { path, relative })
            })
            .collect::<Result<Vec<_>, StageError>>()?;

        Ok(Self {
            root: root.to_path_buf(),
            files,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Recursively collect files under `dir` accepted by `filter`.
///
/// Symlinked directories are not descended into, so a link back up the tree
/// cannot produce the same file twice.
pub(crate) fn collect_files(
    dir: &Path,
    filter: &dyn Fn(&Path) -> bool,
    out: &mut Vec<PathBuf>,
) -> Result<(), StageError> {
    let read_dir_error = |source| StageError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_dir_error)? {
        let entry = entry.map_err(read_dir_error)?;
        let file_type = entry.file_type().map_err(read_dir_error)?;
        let path = entry.path();
        if file_type.is_dir() {
            dirs.push(path);
        } else if file_type.is_symlink() && path.is_dir() {
            debug!("skipping symlinked directory {}", path.display());
        } else if filter(&path) {
            files.push(path);
        }
    }

    files.sort();
    dirs.sort();

    out.extend(files);
    for sub in dirs {
        collect_files(&sub, filter, out)?;
    }

    Ok(())
}

/// Annotated text ready to be written into the staging area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedFile {
    pub relative: PathBuf,
    pub text: String,
}

impl AnnotatedFile {
    pub fn new(relative: impl Into<PathBuf>, text: String) -> Self {
        Self {
            relative: relative.into(),
            text,
        }
    }

    pub fn destination(&self, output_dir: &Path) -> PathBuf {
        staged_path(output_dir, &self.relative)
    }

    /// Write under `output_dir`, creating parent directories as needed.
    pub fn write_to(&self, output_dir: &Path) -> Result<PathBuf, StageError> {
        let dest = self.destination(output_dir);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|source| StageError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        fs::write(&dest, &self.text).map_err(|source| StageError::Write {
            path: dest.clone(),
            source,
        })?;

        Ok(dest)
    }
}
