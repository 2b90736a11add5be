//! Loading the two raw collections from JSON files.

use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::debug;

use crate::error::LoadError;
use crate::model::{RawSubscription, RawUser};

pub fn load_subscriptions(path: &Path) -> Result<Vec<RawSubscription>, LoadError> {
    load_array(path)
}

pub fn load_users(path: &Path) -> Result<Vec<RawUser>, LoadError> {
    load_array(path)
}

fn load_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, LoadError> {
    if !path.exists() {
        return Err(LoadError::Missing {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let rows: Vec<T> = serde_json::from_str(&content).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), rows = rows.len(), "loaded collection");
    Ok(rows)
}
