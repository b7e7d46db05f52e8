// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File(Vec<u8>),
    Dir(Vec<String>), // List of child names
    Symlink(PathBuf),
}

/// Same limit as Linux's ELOOP.
const MAX_LINK_HOPS: usize = 40;

/// In-memory filesystem for tests.
///
/// Clones share the same tree, so a test can keep a handle and mutate files
/// (e.g. grow a recording) while the engine holds another.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
}

fn parent_of(path: &Path) -> Option<&Path> {
    path.parent().map(|p| if p.as_os_str().is_empty() { Path::new(".") } else { p })
}

fn child_name(path: &Path) -> Option<String> {
    path.file_name().and_then(|n| n.to_str()).map(str::to_string)
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut files = HashMap::new();
        // Ensure root exists
        files.insert(PathBuf::from("."), MockEntry::Dir(Vec::new()));

        Self {
            files: Arc::new(Mutex::new(files)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, MockEntry>> {
        self.files.lock().unwrap()
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let mut files = self.lock();
        Self::insert_file(&mut files, path.as_ref(), content.into());
    }

    /// Add a file of `size` zero bytes; handy for recordings whose content
    /// is irrelevant.
    pub fn add_sized_file(&self, path: impl AsRef<Path>, size: usize) {
        self.add_file(path, vec![0u8; size]);
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut files = self.lock();
        Self::ensure_dir_entry(&mut files, path.as_ref());
    }

    /// Create a symbolic link at `path` pointing at the absolute `target`.
    pub fn add_symlink(&self, path: impl AsRef<Path>, target: impl AsRef<Path>) {
        let mut files = self.lock();
        let path = path.as_ref();
        files.insert(path.to_path_buf(), MockEntry::Symlink(target.as_ref().to_path_buf()));
        Self::link_to_parent(&mut files, path);
    }

    /// Grow an existing file by `extra` bytes, as a recorder would.
    pub fn grow(&self, path: impl AsRef<Path>, extra: usize) {
        let mut files = self.lock();
        if let Some(MockEntry::File(content)) = files.get_mut(path.as_ref()) {
            content.extend(std::iter::repeat(0u8).take(extra));
        }
    }

    pub fn remove(&self, path: impl AsRef<Path>) {
        let mut files = self.lock();
        Self::detach(&mut files, path.as_ref());
    }

    /// Lines of a text file, or an empty list when it doesn't exist.
    pub fn lines(&self, path: impl AsRef<Path>) -> Vec<String> {
        self.read_to_string(path.as_ref())
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn insert_file(files: &mut HashMap<PathBuf, MockEntry>, path: &Path, content: Vec<u8>) {
        files.insert(path.to_path_buf(), MockEntry::File(content));
        Self::link_to_parent(files, path);
    }

    fn link_to_parent(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        let Some(parent) = parent_of(path) else {
            return;
        };
        if parent == path {
            return;
        }
        Self::ensure_dir_entry(files, parent);
        if let (Some(MockEntry::Dir(children)), Some(name)) = (files.get_mut(parent), child_name(path)) {
            if !children.contains(&name) {
                children.push(name);
            }
        }
    }

    fn ensure_dir_entry(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        if files.contains_key(path) {
            return;
        }
        files.insert(path.to_path_buf(), MockEntry::Dir(Vec::new()));
        Self::link_to_parent(files, path);
    }

    /// Follow symlinks in every component of `path`, like the kernel does.
    fn resolve(files: &HashMap<PathBuf, MockEntry>, path: &Path) -> Option<PathBuf> {
        let mut hops = 0;
        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            while let Some(MockEntry::Symlink(target)) = files.get(&current) {
                hops += 1;
                if hops > MAX_LINK_HOPS {
                    return None;
                }
                current = target.clone();
            }
        }
        Some(current)
    }

    fn entry<'m>(files: &'m HashMap<PathBuf, MockEntry>, path: &Path) -> Option<&'m MockEntry> {
        files.get(&Self::resolve(files, path)?)
    }

    fn detach(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) -> Option<MockEntry> {
        let entry = files.remove(path)?;
        if let (Some(parent), Some(name)) = (parent_of(path), child_name(path)) {
            if let Some(MockEntry::Dir(children)) = files.get_mut(parent) {
                children.retain(|c| c != &name);
            }
        }
        Some(entry)
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let files = self.lock();
        match Self::entry(&files, path) {
            Some(MockEntry::File(content)) => {
                String::from_utf8(content.clone()).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
            }
            Some(MockEntry::Dir(_)) => Err(anyhow!("Is a directory: {:?}", path)),
            _ => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let mut files = self.lock();
        if let Some(MockEntry::Dir(_)) = files.get(path) {
            return Err(anyhow!("Is a directory: {:?}", path));
        }
        Self::insert_file(&mut files, path, contents.to_vec());
        Ok(())
    }

    fn append(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let mut files = self.lock();
        match files.get_mut(path) {
            Some(MockEntry::File(existing)) => existing.extend_from_slice(contents),
            Some(MockEntry::Dir(_)) => return Err(anyhow!("Is a directory: {:?}", path)),
            Some(MockEntry::Symlink(_)) => {
                return Err(anyhow!("Appending through a symlink is not supported in mock: {:?}", path));
            }
            None => Self::insert_file(&mut files, path, contents.to_vec()),
        }
        Ok(())
    }

    fn create_new(&self, path: &Path, contents: &[u8]) -> Result<bool> {
        let mut files = self.lock();
        if files.contains_key(path) {
            return Ok(false);
        }
        Self::insert_file(&mut files, path, contents.to_vec());
        Ok(true)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let mut files = self.lock();
        match Self::detach(&mut files, from) {
            Some(MockEntry::File(content)) => {
                Self::insert_file(&mut files, to, content);
                Ok(())
            }
            Some(link @ MockEntry::Symlink(_)) => {
                files.insert(to.to_path_buf(), link);
                Self::link_to_parent(&mut files, to);
                Ok(())
            }
            Some(dir @ MockEntry::Dir(_)) => {
                files.insert(from.to_path_buf(), dir);
                Err(anyhow!("Cannot rename a directory in mock: {:?}", from))
            }
            None => Err(anyhow!("File not found: {:?}", from)),
        }
    }

    fn remove_file(&self, path: &Path) -> Result<bool> {
        let mut files = self.lock();
        match files.get(path) {
            Some(MockEntry::File(_) | MockEntry::Symlink(_)) => {
                Self::detach(&mut files, path);
                Ok(true)
            }
            Some(MockEntry::Dir(_)) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Ok(false),
        }
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let mut files = self.lock();
        if let Some(MockEntry::File(_)) = files.get(path) {
            return Err(anyhow!("Not a directory: {:?}", path));
        }
        Self::ensure_dir_entry(&mut files, path);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        Self::entry(&self.lock(), path).is_some()
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(Self::entry(&self.lock(), path), Some(MockEntry::File(_)))
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(Self::entry(&self.lock(), path), Some(MockEntry::Dir(_)))
    }

    fn is_symlink(&self, path: &Path) -> bool {
        matches!(self.lock().get(path), Some(MockEntry::Symlink(_)))
    }

    fn file_size(&self, path: &Path) -> Result<u64> {
        match Self::entry(&self.lock(), path) {
            Some(MockEntry::File(content)) => Ok(content.len() as u64),
            Some(MockEntry::Dir(_)) => Ok(0),
            _ => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let files = self.lock();
        match Self::entry(&files, path) {
            Some(MockEntry::Dir(children)) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}
