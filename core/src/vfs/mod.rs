//! Virtual file access
//!
//! Modules are addressed by POSIX-style absolute paths in a rooted virtual
//! filesystem. Path arithmetic is pure string work and never touches the
//! backing store; only `exists` and `read_text` do.

mod disk;
mod memory;

pub use disk::DiskFs;
pub use memory::MemoryFs;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VfsError {
    #[error("no such file: {0}")]
    NotFound(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Read access to the files a run can import
pub trait VirtualFs: Send {
    /// Whether a regular file exists at the absolute virtual path
    fn exists(&self, path: &str) -> bool;

    /// Full text of the file at the absolute virtual path
    fn read_text(&self, path: &str) -> Result<String, VfsError>;

    fn join_path(&self, base: &str, relative: &str) -> String {
        join(base, relative)
    }

    fn dir_of(&self, path: &str) -> String {
        dirname(path)
    }
}

/* ===================== Path Arithmetic ===================== */

/// Normalise an absolute path
///
/// Empty and `.` segments are dropped, `..` pops a segment and stays at the
/// root when there is nothing left to pop.
pub fn normalize(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    format!("/{}", segments.join("/"))
}

/// Join `relative` onto `base` and normalise
///
/// An absolute `relative` is still joined onto `base`, as Node's
/// `path.join` does.
pub fn join(base: &str, relative: &str) -> String {
    normalize(&format!("{}/{}", base, relative))
}

/// Directory part of a normalised absolute path (`/` for top-level files)
pub fn dirname(path: &str) -> String {
    split(path).0
}

/// Split a path into (directory, file name)
pub fn split(path: &str) -> (String, String) {
    let normalized = normalize(path);
    match normalized.rfind('/') {
        Some(0) => ("/".to_string(), normalized[1..].to_string()),
        Some(idx) => (
            normalized[..idx].to_string(),
            normalized[idx + 1..].to_string(),
        ),
        None => ("/".to_string(), normalized),
    }
}
