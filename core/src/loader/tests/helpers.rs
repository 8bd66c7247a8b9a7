//! Fixtures shared by the loader tests

use crate::config::EngineConfig;
use crate::loader::{Engine, SharedBuffer, SyncLoader};
use crate::vfs::{MemoryFs, VfsError, VirtualFs};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// `/proj/a` imports `./b`, which imports `../lib/c`; `a` then imports `./d`
pub fn scenario_fs() -> MemoryFs {
    MemoryFs::new()
        .with_file(
            "/proj/a",
            r#"
                const b = require('./b')
                const d = require('./d')
                console.log('a cwd', process.cwd())
                module.exports = {b, d}
            "#,
        )
        .with_file(
            "/proj/b",
            r#"
                const c = require('../lib/c')
                console.log('b cwd', process.cwd())
                module.exports = c
            "#,
        )
        .with_file(
            "/lib/c",
            r#"
                console.log('c cwd', process.cwd())
                module.exports = 42
            "#,
        )
        .with_file("/proj/d", "process.cwd()")
}

pub fn config(slice_steps: usize, max_import_depth: usize) -> EngineConfig {
    EngineConfig {
        slice_steps,
        max_import_depth,
        ..EngineConfig::default()
    }
}

pub fn engine(fs: impl VirtualFs + 'static) -> (Engine, SharedBuffer) {
    engine_with(fs, config(4, 16))
}

pub fn engine_with(fs: impl VirtualFs + 'static, config: EngineConfig) -> (Engine, SharedBuffer) {
    let output = SharedBuffer::new();
    (Engine::with_config(fs, output.clone(), config), output)
}

pub fn sync_loader(fs: impl VirtualFs + 'static) -> (SyncLoader, SharedBuffer) {
    let output = SharedBuffer::new();
    (SyncLoader::new(fs, output.clone()), output)
}

/// Counts every call that reaches the backing store
#[derive(Debug, Clone, Default)]
pub struct FsCalls {
    pub exists: Arc<AtomicUsize>,
    pub reads: Arc<AtomicUsize>,
}

impl FsCalls {
    pub fn total(&self) -> usize {
        self.exists.load(Ordering::SeqCst) + self.reads.load(Ordering::SeqCst)
    }
}

pub struct CountingFs {
    inner: MemoryFs,
    calls: FsCalls,
}

impl CountingFs {
    pub fn new(inner: MemoryFs) -> (Self, FsCalls) {
        let calls = FsCalls::default();
        (
            Self {
                inner,
                calls: calls.clone(),
            },
            calls,
        )
    }
}

impl VirtualFs for CountingFs {
    fn exists(&self, path: &str) -> bool {
        self.calls.exists.fetch_add(1, Ordering::SeqCst);
        self.inner.exists(path)
    }

    fn read_text(&self, path: &str) -> Result<String, VfsError> {
        self.calls.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read_text(path)
    }
}
