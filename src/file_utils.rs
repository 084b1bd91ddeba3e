use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use log::debug;
use tempfile::{Builder, NamedTempFile};
use crate::errors::ShiftError;

// @module: File and path utilities

// Mode requested for output files that do not exist yet; the umask applies
#[cfg(unix)]
const NEW_FILE_MODE: u32 = 0o666;

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    /// Whether two paths name the same file
    ///
    /// Identical path text always counts. Otherwise both paths are
    /// canonicalised, which catches `./a.srt` vs `a.srt` and symlinks; a path
    /// that does not exist yet can only match by text.
    pub fn same_file<P1: AsRef<Path>, P2: AsRef<Path>>(a: P1, b: P2) -> bool {
        let (a, b) = (a.as_ref(), b.as_ref());
        if a == b {
            return true;
        }
        match (fs::canonicalize(a), fs::canonicalize(b)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }

    /// Open the subtitle source, `None` meaning standard input
    pub fn open_source(path: Option<&Path>) -> Result<Box<dyn BufRead>, ShiftError> {
        match path {
            None => Ok(Box::new(BufReader::new(io::stdin()))),
            Some(path) => {
                let file = File::open(path).map_err(|source| ShiftError::OpenInput {
                    path: path.to_path_buf(),
                    source,
                })?;
                Ok(Box::new(BufReader::new(file)))
            }
        }
    }

    /// Path that writing to `destination` actually lands on
    ///
    /// Symlinks are followed, including a dangling one, so the link itself
    /// survives a commit. Paths that do not exist are returned unchanged.
    pub fn resolve_destination(destination: &Path) -> PathBuf {
        if let Ok(resolved) = fs::canonicalize(destination) {
            return resolved;
        }
        match fs::read_link(destination) {
            Ok(target) => match destination.parent() {
                Some(parent) => parent.join(target),
                None => target,
            },
            Err(_) => destination.to_path_buf(),
        }
    }

    /// Create a temporary file next to `destination`
    ///
    /// Staging in the same directory keeps the final rename on one filesystem.
    /// The staged file takes the permissions of an existing destination, or
    /// the usual permissions of a newly created file otherwise.
    pub fn stage_output(destination: &Path) -> Result<NamedTempFile, ShiftError> {
        let open_error = |source| ShiftError::OpenOutput {
            path: destination.to_path_buf(),
            source,
        };
        let dir = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let existing = fs::metadata(destination).ok().filter(|meta| meta.is_file());
        let mut builder = Builder::new();
        builder.prefix(".csub");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if existing.is_none() {
                builder.permissions(fs::Permissions::from_mode(NEW_FILE_MODE));
            }
        }

        let staged = builder.tempfile_in(&dir).map_err(open_error)?;
        if let Some(meta) = existing {
            staged
                .as_file()
                .set_permissions(meta.permissions())
                .map_err(open_error)?;
        }
        Ok(staged)
    }

    /// Move a staged file over `destination`
    pub fn commit_staged(staged: NamedTempFile, destination: &Path) -> Result<(), ShiftError> {
        staged
            .persist(destination)
            .map_err(|e| ShiftError::OpenOutput {
                path: destination.to_path_buf(),
                source: e.error,
            })?;
        debug!("Committed output to {}", destination.display());
        Ok(())
    }
}
