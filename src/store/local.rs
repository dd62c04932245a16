use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::Store;
use crate::error::{NgffError, StoreError};

/// A zarr hierarchy in a local directory.
#[derive(Clone, Debug)]
pub struct LocalStore {
    root: PathBuf,
    uri: String,
}

impl LocalStore {
    /// Opens a directory as a store.
    ///
    /// # Errors
    /// Returns [`NgffError::StoreUnreachable`] if `root` is not a directory.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, NgffError> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(NgffError::StoreUnreachable {
                uri: root.display().to_string(),
                message: if root.exists() {
                    "not a directory".to_string()
                } else {
                    "no such directory".to_string()
                },
            });
        }
        Ok(Self {
            root: root.to_path_buf(),
            uri: root.display().to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> PathBuf {
        key.split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |path, part| path.join(part))
    }
}

impl Store for LocalStore {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.resolve(key);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            // A file standing where a directory is expected also means "absent".
            Err(e) if e.kind() == ErrorKind::NotFound || !path.exists() => Ok(None),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn list_children(&self, path: &str) -> Result<Option<Vec<String>>, StoreError> {
        let dir = self.resolve(path);
        if !dir.is_dir() {
            return Ok(Some(Vec::new()));
        }
        let mut children = Vec::new();
        for entry in WalkDir::new(&dir)
            .follow_links(true)
            .min_depth(1)
            .max_depth(1)
        {
            let entry = entry.map_err(|e| StoreError::Io {
                key: path.to_string(),
                source: e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("directory walk failed")),
            })?;
            if entry.file_type().is_dir() {
                children.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        children.sort();
        Ok(Some(children))
    }

    fn fs_path(&self, path: &str) -> String {
        self.resolve(path).display().to_string()
    }
}
