use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, anyhow};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{
    ETAG, HeaderMap, HeaderName, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

const CACHE_VERSION: u32 = 1;
const CACHE_DIR: &str = "match_replay";
const HTTP_DIR: &str = "http";

/// Sidecar stored next to each cached body.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheMeta {
    version: u32,
    url: String,
    etag: Option<String>,
    last_modified: Option<String>,
    fetched_at: u64,
}

struct CachePaths {
    body: PathBuf,
    meta: PathBuf,
}

/// GET `url` as text, revalidating against the on-disk copy with
/// ETag / Last-Modified. `Ok(None)` on 404.
///
/// Bodies are kept one file per URL (named by the URL's SHA-256) because
/// tracking files are far too large to share a single JSON cache document.
pub fn fetch_text_cached(client: &Client, url: &str) -> Result<Option<String>> {
    let paths = cache_paths(url);
    let cached = paths.as_ref().and_then(load_entry);

    let mut req = client.get(url);
    if let Some((meta, _)) = cached.as_ref() {
        if let Some(etag) = meta.etag.as_ref() {
            req = req.header(IF_NONE_MATCH, etag);
        }
        if let Some(last_modified) = meta.last_modified.as_ref() {
            req = req.header(IF_MODIFIED_SINCE, last_modified);
        }
    }

    let resp = req.send().with_context(|| format!("request {url} failed"))?;
    let status = resp.status();
    let headers = resp.headers().clone();
    if status == StatusCode::NOT_MODIFIED {
        let Some((_, body)) = cached else {
            return Err(anyhow!("received 304 without cache body for {url}"));
        };
        debug!(url, "http cache revalidated");
        return Ok(Some(body));
    }
    if status == StatusCode::NOT_FOUND {
        return Ok(None);
    }

    let body = resp.text().context("failed reading body")?;
    if !status.is_success() {
        return Err(anyhow!("http {} for {}", status, url));
    }

    let meta = CacheMeta {
        version: CACHE_VERSION,
        url: url.to_string(),
        etag: header_string(&headers, ETAG),
        last_modified: header_string(&headers, LAST_MODIFIED),
        fetched_at: system_time_to_secs(SystemTime::now()).unwrap_or_default(),
    };
    if let Some(paths) = paths.as_ref() {
        if let Err(err) = store_entry(paths, &meta, &body) {
            warn!(url, error = %err, "failed to write http cache entry");
        }
    }
    Ok(Some(body))
}

fn header_string(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

fn load_entry(paths: &CachePaths) -> Option<(CacheMeta, String)> {
    let raw = fs::read_to_string(&paths.meta).ok()?;
    let meta = serde_json::from_str::<CacheMeta>(&raw).ok()?;
    if meta.version != CACHE_VERSION {
        return None;
    }
    let body = fs::read_to_string(&paths.body).ok()?;
    Some((meta, body))
}

fn store_entry(paths: &CachePaths, meta: &CacheMeta, body: &str) -> Result<()> {
    if let Some(dir) = paths.body.parent() {
        fs::create_dir_all(dir).context("create http cache dir")?;
    }
    write_atomic(&paths.body, body).context("write http cache body")?;
    let json = serde_json::to_string(meta).context("serialize http cache meta")?;
    write_atomic(&paths.meta, &json).context("write http cache meta")?;
    Ok(())
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn cache_paths(url: &str) -> Option<CachePaths> {
    let dir = app_cache_dir()?.join(HTTP_DIR);
    let key = url_key(url);
    Some(CachePaths {
        body: dir.join(format!("{key}.body")),
        meta: dir.join(format!("{key}.json")),
    })
}

fn url_key(url: &str) -> String {
    format!("{:x}", Sha256::digest(url.as_bytes()))
}

/// `$XDG_CACHE_HOME/match_replay`, falling back to `~/.cache/match_replay`.
pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(CACHE_DIR));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

fn system_time_to_secs(time: SystemTime) -> Option<u64> {
    time.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs())
}
