//! Resolve the `--target` argument to a source directory

use std::path::{Path, PathBuf};

use pyxgen_scan::ModuleProbe;
use tracing::{debug, warn};

use crate::error::BuildError;

/// A target ready to build: where its sources live and what to call it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub source_dir: PathBuf,
    /// Directory name used under the library root.
    pub name: String,
}

/// Resolve a target given either as a directory or as an installed package.
///
/// Directories win; anything else is looked up through the probe and must be
/// a package (a module with a search location).
pub fn resolve_target<P: ModuleProbe>(target: &str, probe: &P) -> Result<ResolvedTarget, BuildError> {
    let as_path = Path::new(target);
    if as_path.is_dir() {
        return Ok(ResolvedTarget {
            source_dir: as_path.to_path_buf(),
            name: target_basename(as_path),
        });
    }

    match probe.find_spec(target) {
        Ok(Some(spec)) => match spec.package_dir() {
            Some(dir) => {
                debug!("resolved package '{}' to {}", target, dir.display());
                Ok(ResolvedTarget {
                    source_dir: dir.clone(),
                    name: target.to_string(),
                })
            }
            None => Err(BuildError::TargetNotFound(target.to_string())),
        },
        Ok(None) => Err(BuildError::TargetNotFound(target.to_string())),
        Err(e) => {
            warn!("could not look up package '{}': {}", target, e);
            Err(BuildError::TargetNotFound(target.to_string()))
        }
    }
}

/// Final path component of a target directory, resolving `.` and `..`.
pub fn target_basename(dir: &Path) -> String {
    if let Some(name) = dir.file_name() {
        return name.to_string_lossy().into_owned();
    }

    dir.canonicalize()
        .ok()
        .and_then(|full| full.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "target".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyxgen_scan::StaticProbe;

    #[test]
    fn test_directory_target() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("mypkg");
        std::fs::create_dir(&pkg).unwrap();

        let resolved = resolve_target(pkg.to_str().unwrap(), &StaticProbe::default()).unwrap();
        assert_eq!(resolved.source_dir, pkg);
        assert_eq!(resolved.name, "mypkg");
    }

    #[test]
    fn test_installed_package_target() {
        let probe = StaticProbe::new(["flatmod"]).with_package("mylib", "/site/mylib");
        let resolved = resolve_target("mylib", &probe).unwrap();
        assert_eq!(resolved.source_dir, PathBuf::from("/site/mylib"));
        assert_eq!(resolved.name, "mylib");

        // Plain modules have no directory to walk
        assert!(matches!(
            resolve_target("flatmod", &probe),
            Err(BuildError::TargetNotFound(_))
        ));
    }

    #[test]
    fn test_unknown_target() {
        let err = resolve_target("pyxgen_missing_target_xyz", &StaticProbe::default()).unwrap_err();
        assert!(matches!(err, BuildError::TargetNotFound(name) if name == "pyxgen_missing_target_xyz"));
    }

    #[test]
    fn test_basename_of_trailing_slash_and_dot() {
        assert_eq!(target_basename(Path::new("src/pkg/")), "pkg");
        let cwd = std::env::current_dir().unwrap();
        let expected = cwd.file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(target_basename(Path::new(".")), expected);
    }
}
