//! Dataset fetch and disk cache.
//!
//! The ATT&CK bundle is large and changes rarely, so it is cached on disk
//! and re-fetched only when the cache is older than the configured
//! expiration. A failed fetch falls back to a stale cache with a warning;
//! only when neither network nor cache can supply a document does this
//! module fail, with `Fetch`.

use chrono::{DateTime, Utc};
use std::path::Path;
use std::time::Duration;

use crate::{DatasetConfig, HistmapError, HistmapResult};

const FETCH_TIMEOUT_SECS: u64 = 30;

/// Return the raw bundle document, fetching or reading the cache as needed.
pub fn ensure_dataset(config: &DatasetConfig) -> HistmapResult<String> {
    let cache = config.cache_path.as_path();

    match cache_age_days(cache) {
        Some(age) if age <= config.expiration_days => {
            log::info!(
                "Using cached ATT&CK bundle at {} ({} days old)",
                cache.display(),
                age,
            );
            return read_cache(cache);
        }
        Some(age) => {
            log::info!(
                "Cached ATT&CK bundle is {} days old (limit {}), refreshing",
                age,
                config.expiration_days,
            );
        }
        None => {
            log::info!("No cached ATT&CK bundle at {}", cache.display());
        }
    }

    if config.offline {
        return if cache.exists() {
            log::warn!("Offline mode: using stale cached bundle");
            read_cache(cache)
        } else {
            Err(HistmapError::Fetch(format!(
                "offline mode is set and no cached bundle exists at {}",
                cache.display()
            )))
        };
    }

    match download(&config.url) {
        Ok(raw) => {
            write_cache(cache, &raw)?;
            Ok(raw)
        }
        Err(e) => {
            // A stale bundle beats no bundle. Classification still works;
            // only brand-new techniques are missing.
            if cache.exists() {
                log::warn!("Fetch failed ({}), falling back to stale cache", e);
                read_cache(cache)
            } else {
                Err(e)
            }
        }
    }
}

/// Force a re-fetch into the cache, ignoring expiration.
pub fn refresh_dataset(config: &DatasetConfig) -> HistmapResult<String> {
    if config.offline {
        return Err(HistmapError::Fetch(
            "cannot refresh the dataset in offline mode".to_string(),
        ));
    }
    let raw = download(&config.url)?;
    write_cache(config.cache_path.as_path(), &raw)?;
    Ok(raw)
}

fn download(url: &str) -> HistmapResult<String> {
    log::info!("Downloading ATT&CK bundle from {}", url);

    let agent = ureq::AgentBuilder::new()
        .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
        .build();

    let response = agent
        .get(url)
        .call()
        .map_err(|e| HistmapError::Fetch(format!("GET {} failed: {}", url, e)))?;

    let body = response
        .into_string()
        .map_err(|e| HistmapError::Fetch(format!("reading response body failed: {}", e)))?;

    log::info!("Downloaded ATT&CK bundle ({} bytes)", body.len());
    Ok(body)
}

fn read_cache(path: &Path) -> HistmapResult<String> {
    std::fs::read_to_string(path).map_err(|e| HistmapError::io(path, e))
}

fn write_cache(path: &Path, raw: &str) -> HistmapResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| HistmapError::io(parent, e))?;
        }
    }
    std::fs::write(path, raw).map_err(|e| HistmapError::io(path, e))?;
    log::info!("Cached ATT&CK bundle to {}", path.display());
    Ok(())
}

/// Age of the cache file in whole days, None if it does not exist.
fn cache_age_days(path: &Path) -> Option<i64> {
    let metadata = std::fs::metadata(path).ok()?;
    let modified = metadata.modified().ok()?;
    let modified: DateTime<Utc> = modified.into();
    Some((Utc::now() - modified).num_days())
}
