use tracing::debug;

use super::{Store, StoreOptions};
use crate::error::{NgffError, StoreError};

/// A zarr hierarchy served over HTTP(S).
///
/// 404 and 403 responses mean "absent" (object stores answer 403 for
/// missing keys without list permission). HTTP cannot list children.
#[derive(Debug)]
pub struct HttpStore {
    base: url::Url,
    uri: String,
    agent: ureq::Agent,
}

impl HttpStore {
    /// Prepares a store rooted at `uri`. No request is made yet.
    ///
    /// # Errors
    /// Returns [`NgffError::InvalidUri`] if `uri` is not a valid URL.
    pub fn open(uri: &str, options: &StoreOptions) -> Result<Self, NgffError> {
        let trimmed = uri.trim_end_matches('/');
        let base = url::Url::parse(&format!("{}/", trimmed))
            .map_err(|_| NgffError::InvalidUri(uri.to_string()))?;

        let config = ureq::Agent::config_builder()
            .timeout_global(Some(options.timeout))
            .build();
        let agent: ureq::Agent = config.into();

        Ok(Self {
            base,
            uri: trimmed.to_string(),
            agent,
        })
    }
}

impl Store for HttpStore {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let url = self.base.join(key).map_err(|e| StoreError::Unreachable {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        debug!(url = %url, "GET");

        match self.agent.get(url.as_str()).call() {
            Ok(mut response) => response
                .body_mut()
                .read_to_vec()
                .map(Some)
                .map_err(|e| transport_error(key, e)),
            Err(ureq::Error::StatusCode(404 | 403)) => Ok(None),
            Err(e) => Err(transport_error(key, e)),
        }
    }
}

fn transport_error(key: &str, error: ureq::Error) -> StoreError {
    match error {
        ureq::Error::Timeout(_) => StoreError::Timeout {
            key: key.to_string(),
        },
        other => StoreError::Unreachable {
            key: key.to_string(),
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_trailing_slash() {
        let store =
            HttpStore::open("https://example.org/data/image.zarr", &StoreOptions::default())
                .unwrap();
        assert_eq!(store.uri(), "https://example.org/data/image.zarr");
        assert_eq!(
            store.base.join("0/zarr.json").unwrap().as_str(),
            "https://example.org/data/image.zarr/0/zarr.json"
        );
        assert_eq!(
            store.fs_path("A/1"),
            "https://example.org/data/image.zarr/A/1"
        );
    }
}
