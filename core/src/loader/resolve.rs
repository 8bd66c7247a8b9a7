//! Import resolution and the working-directory tracker

use super::LoadError;
use crate::parser::semantic_validator::check_module;
use crate::parser::{parse_module, ModuleDef};
use crate::vfs::VirtualFs;
use serde::Serialize;
use tracing::{debug, warn};

/// Engine-owned working directory
///
/// While a unit runs this equals that unit's directory. An import saves the
/// current value with `enter` and gets it back with `restore` once the
/// imported unit's result has been delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkingDir {
    current: String,
}

impl WorkingDir {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            current: initial.into(),
        }
    }

    pub fn get(&self) -> &str {
        &self.current
    }

    pub fn set(&mut self, dir: impl Into<String>) {
        self.current = dir.into();
    }

    /// Switch to `dir`, returning the directory to restore later
    pub fn enter(&mut self, dir: impl Into<String>) -> String {
        std::mem::replace(&mut self.current, dir.into())
    }

    pub fn restore(&mut self, saved: String) {
        self.current = saved;
    }
}

/// An import target that exists in the virtual filesystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub path: String,
    pub dir: String,
}

/// Resolve `specifier` against `base`
///
/// No extension probing: the joined path must name an existing file.
pub fn resolve(fs: &dyn VirtualFs, base: &str, specifier: &str) -> Result<Resolved, LoadError> {
    let path = fs.join_path(base, specifier);
    if !fs.exists(&path) {
        debug!(specifier, base, path = %path, "module not found");
        return Err(LoadError::ModuleNotFound { path });
    }
    let dir = fs.dir_of(&path);
    debug!(specifier, base, path = %path, "resolved import");
    Ok(Resolved { path, dir })
}

/// Read, parse and validate a resolved module
///
/// Validator errors fail the import like a syntax error does; warnings are
/// only logged.
pub fn load_module(fs: &dyn VirtualFs, resolved: &Resolved) -> Result<ModuleDef, LoadError> {
    let source = fs.read_text(&resolved.path).map_err(|_| LoadError::ModuleNotFound {
        path: resolved.path.clone(),
    })?;

    let module = parse_module(&source).map_err(|err| LoadError::Parse {
        path: resolved.path.clone(),
        message: err.to_string(),
    })?;

    let report = check_module(&module);
    if let Some(error) = report.first_error() {
        return Err(LoadError::Parse {
            path: resolved.path.clone(),
            message: error.to_string(),
        });
    }
    for warning in &report.warnings {
        warn!(path = %resolved.path, "{}", warning);
    }

    Ok(module)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::MemoryFs;

    #[test]
    fn test_enter_and_restore() {
        let mut cwd = WorkingDir::new("/proj");
        let saved = cwd.enter("/lib");
        assert_eq!(cwd.get(), "/lib");
        cwd.restore(saved);
        assert_eq!(cwd.get(), "/proj");
    }

    #[test]
    fn test_resolve_relative() {
        let fs = MemoryFs::new().with_file("/lib/c", "");
        let resolved = resolve(&fs, "/proj", "../lib/c").unwrap();
        assert_eq!(resolved.path, "/lib/c");
        assert_eq!(resolved.dir, "/lib");
    }

    #[test]
    fn test_resolve_missing_carries_attempted_path() {
        let fs = MemoryFs::new();
        assert_eq!(
            resolve(&fs, "/proj", "./nope"),
            Err(LoadError::ModuleNotFound {
                path: "/proj/nope".to_string()
            })
        );
    }

    #[test]
    fn test_no_extension_probing() {
        let fs = MemoryFs::new().with_file("/proj/b.js", "");
        assert!(resolve(&fs, "/proj", "./b").is_err());
    }

    #[test]
    fn test_load_module_parse_error() {
        let fs = MemoryFs::new().with_file("/bad", "let = ");
        let resolved = resolve(&fs, "/", "bad").unwrap();
        assert!(matches!(
            load_module(&fs, &resolved),
            Err(LoadError::Parse { path, .. }) if path == "/bad"
        ));
    }

    #[test]
    fn test_load_module_rejects_validator_errors() {
        let fs = MemoryFs::new().with_file("/bad", "break");
        let resolved = resolve(&fs, "/", "bad").unwrap();
        let Err(LoadError::Parse { message, .. }) = load_module(&fs, &resolved) else {
            panic!("expected a parse error");
        };
        assert!(message.contains("loop-control"));
    }

    #[test]
    fn test_load_module_rejects_bad_specifier() {
        let fs = MemoryFs::new().with_file("/bad", "let x = 1\nrequire(42)");
        let resolved = resolve(&fs, "/", "bad").unwrap();
        let Err(LoadError::Parse { message, .. }) = load_module(&fs, &resolved) else {
            panic!("expected a parse error");
        };
        assert_eq!(message, "line 2, col 9: module specifier must be a string [require-specifier]");
    }

    #[test]
    fn test_load_module_allows_warnings() {
        let fs = MemoryFs::new().with_file("/ok", "let n = './x'\nrequire(n)");
        let resolved = resolve(&fs, "/", "ok").unwrap();
        assert!(load_module(&fs, &resolved).is_ok());
    }
}
