use crate::index::{Partition, PartitionDirectory};
use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Locations of the artifacts an index build leaves behind.
#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn docs(&self) -> PathBuf { self.root.join("docs.json") }
    pub fn directory(&self) -> PathBuf { self.root.join("index_dir.json") }
    /// Partition files are named relative to the index root.
    pub fn partition(&self, name: &str) -> PathBuf { self.root.join(name) }

    pub fn partition_source(&self) -> FsPartitionSource {
        FsPartitionSource::new(&self.root)
    }
}

/// Where partition artifacts come from. Loads must be idempotent: the cache may load the same
/// partition twice under contention and keeps whichever copy lands first.
pub trait PartitionSource: Send + Sync {
    fn load(&self, name: &str) -> Result<Partition>;
}

/// Reads partition JSON files from a directory on disk.
#[derive(Debug, Clone)]
pub struct FsPartitionSource {
    paths: IndexPaths,
}

impl FsPartitionSource {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { paths: IndexPaths::new(root) }
    }
}

impl PartitionSource for FsPartitionSource {
    fn load(&self, name: &str) -> Result<Partition> {
        load_partition(&self.paths.partition(name))
    }
}

/// Partitions held in memory, for embedding an index built elsewhere and for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryPartitions {
    partitions: HashMap<String, Partition>,
}

impl MemoryPartitions {
    pub fn new() -> Self { Self::default() }

    pub fn with(mut self, name: impl Into<String>, partition: Partition) -> Self {
        self.partitions.insert(name.into(), partition);
        self
    }
}

impl PartitionSource for MemoryPartitions {
    fn load(&self, name: &str) -> Result<Partition> {
        self.partitions.get(name).cloned().ok_or_else(|| anyhow!("no partition named {name}"))
    }
}

pub(crate) fn read_text(path: &Path) -> Result<String> {
    let mut f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut buf = String::new();
    f.read_to_string(&mut buf).with_context(|| format!("reading {}", path.display()))?;
    Ok(buf)
}

pub fn load_directory(paths: &IndexPaths) -> Result<PartitionDirectory> {
    let path = paths.directory();
    let buf = read_text(&path)?;
    let dir = serde_json::from_str(&buf).with_context(|| format!("parsing {}", path.display()))?;
    Ok(dir)
}

pub fn load_partition(path: &Path) -> Result<Partition> {
    let buf = read_text(path)?;
    let partition = serde_json::from_str(&buf).with_context(|| format!("parsing {}", path.display()))?;
    Ok(partition)
}
