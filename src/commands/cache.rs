//! `cache`: inspect and clear the on-disk cache.

use crate::cache::CacheStore;
use crate::errors::AppError;

fn require(cache: Option<&CacheStore>) -> Result<&CacheStore, AppError> {
    cache.ok_or_else(|| AppError::Config("cache is disabled: no usable cache directory".to_string()))
}

pub fn path(cache: Option<&CacheStore>) -> Result<String, AppError> {
    Ok(format!("{}\n", require(cache)?.dir().display()))
}

pub fn clear(cache: Option<&CacheStore>) -> Result<String, AppError> {
    let store = require(cache)?;
    let removed = store.clear()?;
    Ok(format!(
        "Removed {} cached file{} from {}\n",
        removed,
        if removed == 1 { "" } else { "s" },
        store.dir().display()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::geo::DetectedLocation;
    use chrono::Utc;
    use tempfile::TempDir;

    #[test]
    fn test_path() {
        let tmp = TempDir::new().unwrap();
        let store = CacheStore::new(tmp.path());
        assert_eq!(path(Some(&store)).unwrap(), format!("{}\n", tmp.path().display()));
    }

    #[test]
    fn test_clear_counts_files() {
        let tmp = TempDir::new().unwrap();
        let store = CacheStore::new(tmp.path());
        let loc = DetectedLocation {
            latitude: 21.4225,
            longitude: 39.8262,
            city: "Mecca".into(),
            country: "Saudi Arabia".into(),
            timezone: "Asia/Riyadh".into(),
        };
        store.save_geo(&loc, Utc::now()).unwrap();

        let out = clear(Some(&store)).unwrap();
        assert_eq!(out, format!("Removed 1 cached file from {}\n", tmp.path().display()));
        assert!(store.load_geo(Utc::now()).is_none());
        assert!(clear(Some(&store)).unwrap().starts_with("Removed 0 cached files"));
    }

    #[test]
    fn test_disabled_cache() {
        assert!(matches!(path(None), Err(AppError::Config(_))));
        assert!(matches!(clear(None), Err(AppError::Config(_))));
    }
}
