//! Packaging driver: build a wheel and install it

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{error, info};

use crate::backend::BuildBackend;
use crate::error::BuildError;

/// Directory the wheel builder writes into.
pub const DIST_DIR: &str = "dist";
/// Extension of a built wheel.
pub const WHEEL_EXTENSION: &str = "whl";

/// Build a wheel, then install the newest one found in `dist_dir`.
///
/// Returns the installed wheel, or `None` when the build produced nothing
/// to install; that case is logged as an error and the install is skipped.
pub fn package_and_install<B>(backend: &B, dist_dir: &Path) -> Result<Option<PathBuf>, BuildError>
where
    B: BuildBackend + ?Sized,
{
    backend.package(dist_dir).map_err(BuildError::Package)?;

    let wheel = latest_artifact(dist_dir, WHEEL_EXTENSION).map_err(|source| BuildError::Dist {
        path: dist_dir.to_path_buf(),
        source,
    })?;

    let Some(wheel) = wheel else {
        error!("No wheel found in {}!", dist_dir.display());
        return Ok(None);
    };

    backend.install(&wheel).map_err(BuildError::Install)?;
    info!("Wheel installed successfully: {}", wheel.display());
    Ok(Some(wheel))
}

/// Most recently modified file in `dir` with the given extension.
///
/// A missing directory simply has no artifacts. Ties on modification time
/// are broken by the larger file name.
pub fn latest_artifact(dir: &Path, extension: &str) -> io::Result<Option<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    let mut best: Option<(SystemTime, PathBuf)> = None;
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() || path.extension().map_or(true, |ext| ext != extension) {
            continue;
        }

        let modified = fs::metadata(&path)?.modified()?;
        let newer = match &best {
            Some((time, current)) => (modified, &path) > (*time, current),
            None => true,
        };
        if newer {
            best = Some((modified, path));
        }
    }

    Ok(best.map(|(_, path)| path))
}
