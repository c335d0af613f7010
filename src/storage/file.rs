use crate::error::Result;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Reads a JSON document, treating a missing file as `T::default()`.
pub(crate) async fn load_json<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    match tokio::fs::read(path).await {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(T::default()),
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(e.into()),
    }
}

/// Writes to a sibling temp file and renames it over `path`.
pub(crate) async fn save_json<T>(path: &Path, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let bytes = serde_json::to_vec_pretty(value)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");

    tokio::fs::write(&tmp, &bytes).await?;
    tokio::fs::rename(&tmp, path).await?;

    debug!(path = %path.display(), bytes = bytes.len(), "Saved JSON file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let value: Vec<u32> = load_json(&dir.path().join("nope.json")).await.unwrap();
        assert!(value.is_empty());
    }

    #[tokio::test]
    async fn test_save_creates_directories_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data.json");

        let mut value = BTreeMap::new();
        value.insert("BTCUSDT".to_string(), true);
        save_json(&path, &value).await.unwrap();

        let loaded: BTreeMap<String, bool> = load_json(&path).await.unwrap();
        assert_eq!(loaded, value);
        assert!(!dir.path().join("nested").join("data.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();
        assert!(load_json::<Vec<u32>>(&path).await.is_err());
    }
}
