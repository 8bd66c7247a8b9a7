use super::{normalize, VfsError, VirtualFs};
use std::path::{Path, PathBuf};

/// A real directory mounted at virtual `/`
///
/// Virtual paths are normalised before they are mapped, so `..` can never
/// reach above the mounted directory.
#[derive(Debug, Clone)]
pub struct DiskFs {
    root: PathBuf,
}

impl DiskFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Host path backing a virtual path
    pub fn host_path(&self, path: &str) -> PathBuf {
        let normalized = normalize(path);
        let relative = normalized.trim_start_matches('/');
        if relative.is_empty() {
            self.root.clone()
        } else {
            self.root.join(relative)
        }
    }

    /// Virtual path of a host file under the mounted directory
    pub fn virtual_path(&self, host: &Path) -> Option<String> {
        let relative = host.strip_prefix(&self.root).ok()?;
        let joined = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        Some(normalize(&joined))
    }
}

impl VirtualFs for DiskFs {
    fn exists(&self, path: &str) -> bool {
        self.host_path(path).is_file()
    }

    fn read_text(&self, path: &str) -> Result<String, VfsError> {
        let host = self.host_path(path);
        std::fs::read_to_string(&host).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => VfsError::NotFound(normalize(path)),
            _ => VfsError::Io {
                path: normalize(path),
                source,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_path_cannot_escape_root() {
        let fs = DiskFs::new("/srv/project");
        assert_eq!(fs.host_path("/../../etc/passwd"), PathBuf::from("/srv/project/etc/passwd"));
        assert_eq!(fs.host_path("/"), PathBuf::from("/srv/project"));
    }

    #[test]
    fn test_virtual_path() {
        let fs = DiskFs::new("/srv/project");
        assert_eq!(
            fs.virtual_path(Path::new("/srv/project/lib/c")),
            Some("/lib/c".to_string())
        );
        assert_eq!(fs.virtual_path(Path::new("/elsewhere")), None);
    }

    #[test]
    fn test_reads_real_files() {
        let dir = std::env::temp_dir().join(format!("cadence-diskfs-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(dir.join("lib")).unwrap();
        std::fs::write(dir.join("lib").join("c"), "module.exports = 42").unwrap();

        let fs = DiskFs::new(&dir);
        assert!(fs.exists("/lib/c"));
        assert!(!fs.exists("/lib"));
        assert_eq!(fs.read_text("/lib/c").unwrap(), "module.exports = 42");
        assert!(matches!(fs.read_text("/nope"), Err(VfsError::NotFound(_))));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
