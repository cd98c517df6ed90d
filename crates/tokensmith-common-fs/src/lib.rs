//! File system utilities for Tokensmith.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tokensmith_common_core::{Error, ErrorCode, Result};
use walkdir::WalkDir;

pub mod path;

/// Largest token or config file we are willing to read.
pub const MAX_SOURCE_SIZE: usize = 16 * 1024 * 1024;

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

fn read_error(path: &Path, e: io::Error) -> Error {
    let (code, message) = match e.kind() {
        io::ErrorKind::NotFound => (
            ErrorCode::FILE_NOT_FOUND,
            format!("file not found: {}", path.display()),
        ),
        io::ErrorKind::PermissionDenied => (
            ErrorCode::FILE_READ_ERROR,
            format!("permission denied: {}", path.display()),
        ),
        _ => (
            ErrorCode::FILE_READ_ERROR,
            format!("failed to read file: {}", path.display()),
        ),
    };
    Error::FileSystem {
        code,
        message,
        path: Some(path.to_string_lossy().to_string()),
        source: Some(Box::new(e)),
    }
}

fn write_error(path: &Path, message: String, e: io::Error) -> Error {
    Error::FileSystem {
        code: ErrorCode::FILE_WRITE_ERROR,
        message,
        path: Some(path.to_string_lossy().to_string()),
        source: Some(Box::new(e)),
    }
}

fn too_large(path: &Path, len: u64, max_size: usize) -> Error {
    Error::FileSystem {
        code: ErrorCode::FILE_READ_ERROR,
        message: format!("file too large: {} bytes (max: {})", len, max_size),
        path: Some(path.to_string_lossy().to_string()),
        source: None,
    }
}

/// Decode file bytes as UTF-8 text, dropping a leading byte order mark.
pub fn decode_text(path: impl AsRef<Path>, bytes: Vec<u8>) -> Result<String> {
    let path = path.as_ref();
    let bytes = if bytes.starts_with(&UTF8_BOM) {
        bytes[UTF8_BOM.len()..].to_vec()
    } else {
        bytes
    };

    String::from_utf8(bytes).map_err(|e| Error::Encoding {
        message: format!("file is not valid UTF-8: {}", path.display()),
        path: path.to_string_lossy().to_string(),
        source: Some(Box::new(e)),
    })
}

/// Read a file to string with size limit.
pub fn read_to_string(path: impl AsRef<Path>, max_size: usize) -> Result<String> {
    let path = path.as_ref();

    let metadata = fs::metadata(path).map_err(|e| read_error(path, e))?;
    if metadata.len() as usize > max_size {
        return Err(too_large(path, metadata.len(), max_size));
    }

    let bytes = fs::read(path).map_err(|e| read_error(path, e))?;
    decode_text(path, bytes)
}

/// Async variant of [`read_to_string`], used for concurrent source reads.
pub async fn read_to_string_async(path: impl AsRef<Path>, max_size: usize) -> Result<String> {
    let path = path.as_ref();

    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| read_error(path, e))?;
    if metadata.len() as usize > max_size {
        return Err(too_large(path, metadata.len(), max_size));
    }

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| read_error(path, e))?;
    decode_text(path, bytes)
}

/// A written and synced temporary file waiting to replace its target.
///
/// Dropping it without calling [`StagedFile::commit`] removes the
/// temporary file and leaves the target untouched.
#[derive(Debug)]
pub struct StagedFile {
    temp_path: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl StagedFile {
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Rename the temporary file over the target.
    pub fn commit(mut self) -> Result<()> {
        fs::rename(&self.temp_path, &self.target).map_err(|e| {
            write_error(
                &self.target,
                format!("failed to rename temporary file to target: {}", self.target.display()),
                e,
            )
        })?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.temp_path);
        }
    }
}

/// Write `contents` to a temporary file next to `path`, creating parent
/// directories as needed. The target is only replaced on commit.
pub fn stage_write(path: impl AsRef<Path>, contents: &[u8]) -> Result<StagedFile> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    ensure_dir(parent)?;

    let mut temp_path = path.to_path_buf();
    if let Some(name) = path.file_name() {
        temp_path.set_file_name(format!(".{}.tmp", name.to_string_lossy()));
    } else {
        temp_path.push(".tmp");
    }

    let mut file = File::create(&temp_path).map_err(|e| {
        write_error(
            &temp_path,
            format!("failed to create temporary file: {}", temp_path.display()),
            e,
        )
    })?;
    let staged = StagedFile {
        temp_path,
        target: path.to_path_buf(),
        committed: false,
    };

    file.write_all(contents).map_err(|e| {
        write_error(
            &staged.temp_path,
            format!("failed to write to temporary file: {}", staged.temp_path.display()),
            e,
        )
    })?;

    file.sync_all().map_err(|e| {
        write_error(
            &staged.temp_path,
            format!("failed to sync temporary file: {}", staged.temp_path.display()),
            e,
        )
    })?;

    Ok(staged)
}

/// Write a file atomically via a temporary file and rename.
pub fn write_atomic(path: impl AsRef<Path>, contents: &[u8]) -> Result<()> {
    stage_write(path, contents)?.commit()
}

/// Write string to file atomically.
pub fn write_string_atomic(path: impl AsRef<Path>, contents: &str) -> Result<()> {
    write_atomic(path, contents.as_bytes())
}

/// Ensure a directory exists. An existing directory is not an error.
pub fn ensure_dir(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(path).map_err(|e| {
        write_error(path, format!("failed to create directory: {}", path.display()), e)
    })
}

/// Check if a path exists and is a directory.
pub fn is_dir(path: impl AsRef<Path>) -> bool {
    path.as_ref().is_dir()
}

/// Get the file extension as a lowercase string.
pub fn extension(path: impl AsRef<Path>) -> Option<String> {
    path.as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
}

/// Filter applied while walking a source root.
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    /// A file must match at least one include pattern.
    pub include: Vec<glob::Pattern>,
    /// A file matching any exclude pattern is dropped.
    pub exclude: Vec<glob::Pattern>,
}

impl FileFilter {
    /// Build a filter from raw glob strings.
    pub fn new<I, E>(include: I, exclude: E) -> std::result::Result<Self, glob::PatternError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        let include = include
            .into_iter()
            .map(|p| glob::Pattern::new(p.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let exclude = exclude
            .into_iter()
            .map(|p| glob::Pattern::new(p.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { include, exclude })
    }

    /// Whether a root-relative path passes the filter.
    pub fn matches(&self, relative: impl AsRef<Path>) -> bool {
        let rel = path::to_slash(relative);
        let included = self.include.is_empty() || self.include.iter().any(|p| p.matches(&rel));
        included && !self.exclude.iter().any(|p| p.matches(&rel))
    }
}

/// Recursively list the files under `root` accepted by `filter`.
///
/// Returned paths are root-relative and sorted so that every run sees the
/// same processing order.
pub fn list_files_matching(root: impl AsRef<Path>, filter: &FileFilter) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            Error::FileSystem {
                code: ErrorCode::DIR_READ_ERROR,
                message: format!("failed to read directory entry under {}", root.display()),
                path: Some(path.to_string_lossy().to_string()),
                source: Some(Box::new(e)),
            }
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let relative = match entry.path().strip_prefix(root) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) => continue,
        };

        if filter.matches(&relative) {
            files.push(relative);
        }
    }

    files.sort();
    Ok(files)
}
