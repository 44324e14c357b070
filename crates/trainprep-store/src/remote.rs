//! Object-store reader for `abfs://`, `abfss://` and `az://` URIs.
//!
//! Compiled only with the `abfs` feature. Without it, remote URIs fail with
//! [`StoreError::DependencyMissing`] instead of a generic I/O error.

use crate::StoreError;
use crate::read::Part;

#[cfg(feature = "abfs")]
pub(crate) fn read_remote(uri: &str) -> Result<Vec<Part>, StoreError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| StoreError::read(uri, e))?;
    runtime.block_on(azure::fetch(uri))
}

#[cfg(not(feature = "abfs"))]
pub(crate) fn read_remote(uri: &str) -> Result<Vec<Part>, StoreError> {
    Err(StoreError::DependencyMissing {
        adapter: "object_store (azure)",
        feature: "abfs",
        uri: uri.to_string(),
    })
}

/// Object key below the container, e.g. `abfs://c@acct.dfs.core.windows.net/a/b` → `a/b`.
#[cfg_attr(not(feature = "abfs"), allow(dead_code))]
fn object_key(uri: &str) -> &str {
    let rest = uri.split_once("://").map_or(uri, |(_, rest)| rest);
    rest.split_once('/')
        .map_or("", |(_, key)| key)
        .trim_end_matches('/')
}

#[cfg(feature = "abfs")]
mod azure {
    use futures::TryStreamExt;
    use object_store::ObjectStore;
    use object_store::azure::MicrosoftAzureBuilder;
    use object_store::path::Path as ObjectPath;
    use tracing::{debug, info};

    use super::object_key;
    use crate::StoreError;
    use crate::read::{Part, decode};

    /// Fetch one object, or every `.parquet` object below a prefix, sorted by key.
    ///
    /// Credentials and account settings are taken from `AZURE_*` environment variables.
    pub(super) async fn fetch(uri: &str) -> Result<Vec<Part>, StoreError> {
        let store = MicrosoftAzureBuilder::from_env()
            .with_url(uri)
            .build()
            .map_err(|e| StoreError::read(uri, e))?;
        let key = ObjectPath::parse(object_key(uri)).map_err(|e| StoreError::read(uri, e))?;

        let locations = if key.as_ref().ends_with(".parquet") {
            vec![key]
        } else {
            let metas: Vec<_> = store
                .list(Some(&key))
                .try_collect()
                .await
                .map_err(|e| StoreError::read(uri, e))?;
            let mut locations: Vec<ObjectPath> = metas
                .into_iter()
                .map(|m| m.location)
                .filter(|l| {
                    l.filename().is_some_and(|name| {
                        name.ends_with(".parquet")
                            && !name.starts_with('.')
                            && !name.starts_with('_')
                    })
                })
                .collect();
            locations.sort_by(|a, b| a.as_ref().cmp(b.as_ref()));
            locations
        };

        if locations.is_empty() {
            return Err(StoreError::InputNotFound(uri.to_string()));
        }

        let mut parts = Vec::with_capacity(locations.len());
        for location in locations {
            let label = location.to_string();
            let bytes = match store.get(&location).await {
                Ok(result) => result.bytes().await.map_err(|e| StoreError::read(&label, e))?,
                Err(object_store::Error::NotFound { .. }) => {
                    return Err(StoreError::InputNotFound(uri.to_string()));
                }
                Err(e) => return Err(StoreError::read(&label, e)),
            };
            debug!(object = %label, bytes = bytes.len(), "fetched object");
            parts.push(decode(bytes, label)?);
        }
        info!(uri, objects = parts.len(), "fetched remote parquet");
        Ok(parts)
    }
}
