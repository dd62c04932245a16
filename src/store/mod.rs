//! Read-only access to hierarchical zarr stores.
//!
//! A [`Store`] only needs to answer "give me the bytes under this key"; the
//! zarr v2/v3 node layout is resolved on top of that by [`open_node`]. No
//! array chunk is ever read.

mod cache;
#[cfg(feature = "remote")]
mod http;
mod local;
mod memory;
mod node;

pub use cache::CachedStore;
#[cfg(feature = "remote")]
pub use http::HttpStore;
pub use local::LocalStore;
pub use memory::MemoryStore;
pub use node::{open_node, ArrayMeta, DataType, DataTypeClass, NodeType, ZarrNode};

use std::time::Duration;

use crate::error::{NgffError, StoreError};

/// A read-only key/value view of a zarr hierarchy.
///
/// Keys are `/`-separated paths relative to the store root, such as
/// `A/1/zarr.json`.
pub trait Store: Send + Sync {
    /// Display form of the store root.
    fn uri(&self) -> &str;

    /// Reads the bytes stored under `key`, or `Ok(None)` if there are none.
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Names of the child nodes under `path`, if the store can list them.
    fn list_children(&self, _path: &str) -> Result<Option<Vec<String>>, StoreError> {
        Ok(None)
    }

    /// The physical location of a node, for reports.
    fn fs_path(&self, path: &str) -> String {
        let root = self.uri().trim_end_matches('/');
        if path.is_empty() {
            root.to_string()
        } else {
            format!("{}/{}", root, path)
        }
    }
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn uri(&self) -> &str {
        (**self).uri()
    }

    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).read(key)
    }

    fn list_children(&self, path: &str) -> Result<Option<Vec<String>>, StoreError> {
        (**self).list_children(path)
    }

    fn fs_path(&self, path: &str) -> String {
        (**self).fs_path(path)
    }
}

/// Store connection settings.
#[derive(Clone, Debug)]
pub struct StoreOptions {
    /// Per-request timeout for remote stores.
    pub timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

/// Opens the store a URI points at.
///
/// Local paths and `file://` URIs open a [`LocalStore`]; `http://` and
/// `https://` open a cached [`HttpStore`] when the `remote` feature is on.
///
/// # Errors
/// Returns an error for unsupported schemes, missing local roots, and remote
/// URIs in builds without the `remote` feature.
pub fn open_store(uri: &str, options: &StoreOptions) -> Result<Box<dyn Store>, NgffError> {
    if uri.starts_with("http://") || uri.starts_with("https://") {
        return open_remote(uri, options);
    }
    if let Some(path) = uri.strip_prefix("file://") {
        return Ok(Box::new(LocalStore::open(path)?));
    }
    if has_scheme(uri) {
        return Err(NgffError::InvalidUri(uri.to_string()));
    }
    Ok(Box::new(LocalStore::open(uri)?))
}

#[cfg(feature = "remote")]
fn open_remote(uri: &str, options: &StoreOptions) -> Result<Box<dyn Store>, NgffError> {
    Ok(Box::new(CachedStore::new(HttpStore::open(uri, options)?)))
}

#[cfg(not(feature = "remote"))]
fn open_remote(uri: &str, _options: &StoreOptions) -> Result<Box<dyn Store>, NgffError> {
    Err(NgffError::RemoteUnsupported(uri.to_string()))
}

/// `s3://bucket`, `gs://x` and similar, but not `C:\data`.
fn has_scheme(uri: &str) -> bool {
    match uri.split_once("://") {
        Some((scheme, _)) => {
            scheme.len() > 1
                && scheme
                    .chars()
                    .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '+' | '-' | '.'))
        }
        None => false,
    }
}

/// Joins a relative reference onto a node path, resolving `.` and `..`.
///
/// Returns `None` when the result would escape the store root.
pub fn join_path(base: &str, relative: &str) -> Option<String> {
    let mut parts: Vec<&str> = base.split('/').filter(|p| !p.is_empty()).collect();
    for segment in relative.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            name => parts.push(name),
        }
    }
    Some(parts.join("/"))
}

/// The key of a file inside a node.
pub fn node_key(path: &str, file: &str) -> String {
    if path.is_empty() {
        file.to_string()
    } else {
        format!("{}/{}", path, file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_resolves_relative_references() {
        assert_eq!(join_path("", "0").as_deref(), Some("0"));
        assert_eq!(join_path("A/1", "0").as_deref(), Some("A/1/0"));
        assert_eq!(join_path("img/labels/cells", "../../").as_deref(), Some("img"));
        assert_eq!(join_path("img", "./labels").as_deref(), Some("img/labels"));
        assert_eq!(join_path("img", "../..").as_deref(), None);
    }

    #[test]
    fn node_keys() {
        assert_eq!(node_key("", "zarr.json"), "zarr.json");
        assert_eq!(node_key("A/1", ".zattrs"), "A/1/.zattrs");
    }

    #[test]
    fn unsupported_schemes_are_rejected() {
        assert!(matches!(
            open_store("s3://bucket/plate.zarr", &StoreOptions::default()),
            Err(NgffError::InvalidUri(_))
        ));
    }

    #[cfg(not(feature = "remote"))]
    #[test]
    fn http_requires_remote_feature() {
        assert!(matches!(
            open_store("https://example.org/image.zarr", &StoreOptions::default()),
            Err(NgffError::RemoteUnsupported(_))
        ));
    }

    #[test]
    fn file_uri_opens_local_store() {
        let dir = tempfile::tempdir().unwrap();
        let uri = format!("file://{}", dir.path().display());
        let store = open_store(&uri, &StoreOptions::default()).unwrap();
        assert!(store.read("zarr.json").unwrap().is_none());
    }
}
