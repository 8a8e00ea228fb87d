use anyhow::Context;
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Mutex;

/// File access for one entity, rooted at its base directory.
///
/// The engine never opens file handles directly; everything goes through
/// this capability so the core is filesystem-agnostic and testable against
/// the in-memory implementation.
#[async_trait]
pub trait Workspace: Send + Sync + fmt::Debug {
    async fn read_file(&self, path: &Utf8Path) -> anyhow::Result<String>;

    async fn write_file(&self, path: &Utf8Path, contents: &str) -> anyhow::Result<()>;
}

/// Filesystem-backed `Workspace`.
#[derive(Debug, Clone)]
pub struct FsWorkspace {
    root: Utf8PathBuf,
}

impl FsWorkspace {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn abs(&self, rel: &Utf8Path) -> Utf8PathBuf {
        if rel.is_absolute() {
            rel.to_path_buf()
        } else {
            self.root.join(rel)
        }
    }
}

#[async_trait]
impl Workspace for FsWorkspace {
    async fn read_file(&self, path: &Utf8Path) -> anyhow::Result<String> {
        let abs = self.abs(path);
        fs::read_to_string(&abs).with_context(|| format!("read {abs}"))
    }

    async fn write_file(&self, path: &Utf8Path, contents: &str) -> anyhow::Result<()> {
        let abs = self.abs(path);
        fs::write(&abs, contents).with_context(|| format!("write {abs}"))
    }
}

/// In-memory `Workspace` keeping files in a map and logging every write.
///
/// The write log is what tests assert against when checking the
/// one-write-per-physical-file guarantee.
#[derive(Debug, Default)]
pub struct MemoryWorkspace {
    inner: Mutex<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    files: BTreeMap<Utf8PathBuf, String>,
    write_log: Vec<Utf8PathBuf>,
}

impl MemoryWorkspace {
    pub fn new(files: impl IntoIterator<Item = (Utf8PathBuf, String)>) -> Self {
        Self {
            inner: Mutex::new(MemoryInner {
                files: files.into_iter().collect(),
                write_log: Vec::new(),
            }),
        }
    }

    pub fn insert(&self, path: impl Into<Utf8PathBuf>, contents: impl Into<String>) {
        let mut inner = self.inner.lock().expect("workspace lock");
        inner.files.insert(path.into(), contents.into());
    }

    pub fn get(&self, path: impl AsRef<Utf8Path>) -> Option<String> {
        let inner = self.inner.lock().expect("workspace lock");
        inner.files.get(path.as_ref()).cloned()
    }

    /// Paths written so far, in write order (duplicates kept).
    pub fn write_log(&self) -> Vec<Utf8PathBuf> {
        let inner = self.inner.lock().expect("workspace lock");
        inner.write_log.clone()
    }

    /// All files and their current contents.
    pub fn files(&self) -> BTreeMap<Utf8PathBuf, String> {
        let inner = self.inner.lock().expect("workspace lock");
        inner.files.clone()
    }
}

#[async_trait]
impl Workspace for MemoryWorkspace {
    async fn read_file(&self, path: &Utf8Path) -> anyhow::Result<String> {
        let inner = self.inner.lock().expect("workspace lock");
        inner
            .files
            .get(path)
            .cloned()
            .with_context(|| format!("read {path}: no such file"))
    }

    async fn write_file(&self, path: &Utf8Path, contents: &str) -> anyhow::Result<()> {
        let mut inner = self.inner.lock().expect("workspace lock");
        inner.files.insert(path.to_path_buf(), contents.to_string());
        inner.write_log.push(path.to_path_buf());
        Ok(())
    }
}
