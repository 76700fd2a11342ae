use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use crate::error::{ReplayError, Result};
use crate::events::{MatchEvent, parse_events_csv};
use crate::http_cache::fetch_text_cached;
use crate::http_client::http_client;
use crate::roster::{Roster, parse_match_json};
use crate::tracking::{RawTrackingRow, parse_tracking_jsonl};

const OPENDATA_COMMIT: &str = "741bdb798b0c1835057e3fa77244c1571a00e4aa";
const OPENDATA_MEDIA_BASE: &str = "https://media.githubusercontent.com/media/SkillCorner/opendata";
const OPENDATA_RAW_BASE: &str = "https://raw.githubusercontent.com/SkillCorner/opendata";

/// Where raw match data comes from. Implementations must be usable from
/// several threads; the cache calls them while holding a per-match slot.
pub trait MatchSource: Send + Sync {
    fn load_tracking(&self, match_id: &str) -> Result<Vec<RawTrackingRow>>;
    fn load_roster(&self, match_id: &str) -> Result<Roster>;
    fn load_events(&self, match_id: &str) -> Result<Vec<MatchEvent>>;
}

impl<S: MatchSource + ?Sized> MatchSource for Box<S> {
    fn load_tracking(&self, match_id: &str) -> Result<Vec<RawTrackingRow>> {
        (**self).load_tracking(match_id)
    }

    fn load_roster(&self, match_id: &str) -> Result<Roster> {
        (**self).load_roster(match_id)
    }

    fn load_events(&self, match_id: &str) -> Result<Vec<MatchEvent>> {
        (**self).load_events(match_id)
    }
}

impl<S: MatchSource + ?Sized> MatchSource for Arc<S> {
    fn load_tracking(&self, match_id: &str) -> Result<Vec<RawTrackingRow>> {
        (**self).load_tracking(match_id)
    }

    fn load_roster(&self, match_id: &str) -> Result<Roster> {
        (**self).load_roster(match_id)
    }

    fn load_events(&self, match_id: &str) -> Result<Vec<MatchEvent>> {
        (**self).load_events(match_id)
    }
}

/// Match ids are numeric; anything else would also be unsafe to splice
/// into paths and URLs.
pub fn validate_match_id(match_id: &str) -> Result<()> {
    let trimmed = match_id.trim();
    if trimmed.is_empty() {
        return Err(ReplayError::Configuration("match_id is empty".to_string()));
    }
    if !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(ReplayError::Configuration(format!(
            "match_id {match_id:?} is not numeric"
        )));
    }
    Ok(())
}

/// Reads `<root>/<id>/<id>_tracking_extrapolated.jsonl`, `<id>_match.json`
/// and `<id>_dynamic_events.csv`, the open-data repository layout.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, match_id: &str, suffix: &str) -> PathBuf {
        self.root.join(match_id).join(format!("{match_id}{suffix}"))
    }

    fn read(&self, match_id: &str, suffix: &str) -> Result<String> {
        validate_match_id(match_id)?;
        let path = self.path(match_id, suffix);
        read_file(&path)
    }
}

fn read_file(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(raw) => Ok(raw),
        Err(err) if err.kind() == ErrorKind::NotFound => Err(ReplayError::DataNotFound(format!(
            "{} does not exist",
            path.display()
        ))),
        Err(err) => Err(ReplayError::Source(
            anyhow::Error::new(err).context(format!("read {}", path.display())),
        )),
    }
}

impl MatchSource for DirSource {
    fn load_tracking(&self, match_id: &str) -> Result<Vec<RawTrackingRow>> {
        parse_tracking_jsonl(&self.read(match_id, "_tracking_extrapolated.jsonl")?)
    }

    fn load_roster(&self, match_id: &str) -> Result<Roster> {
        parse_match_json(&self.read(match_id, "_match.json")?)
    }

    fn load_events(&self, match_id: &str) -> Result<Vec<MatchEvent>> {
        parse_events_csv(&self.read(match_id, "_dynamic_events.csv")?)
    }
}

/// Fetches the SkillCorner open-data files over HTTP, with bodies cached on
/// disk between runs.
#[derive(Debug, Clone)]
pub struct HttpSource {
    tracking_base: String,
    match_base: String,
    events_base: String,
}

impl Default for HttpSource {
    fn default() -> Self {
        Self {
            tracking_base: format!("{OPENDATA_MEDIA_BASE}/{OPENDATA_COMMIT}/data/matches"),
            match_base: format!("{OPENDATA_RAW_BASE}/{OPENDATA_COMMIT}/data/matches"),
            events_base: format!("{OPENDATA_RAW_BASE}/refs/heads/master/data/matches"),
        }
    }
}

impl HttpSource {
    /// All three files under one base URL laid out as `<base>/<id>/<file>`.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        Self {
            tracking_base: base.clone(),
            match_base: base.clone(),
            events_base: base,
        }
    }

    fn fetch(&self, base: &str, match_id: &str, suffix: &str) -> Result<String> {
        validate_match_id(match_id)?;
        let url = format!("{base}/{match_id}/{match_id}{suffix}");
        let client = http_client()?;
        fetch_text_cached(client, &url)
            .with_context(|| format!("fetch {url}"))?
            .ok_or_else(|| ReplayError::DataNotFound(format!("{url} returned 404")))
    }
}

impl MatchSource for HttpSource {
    fn load_tracking(&self, match_id: &str) -> Result<Vec<RawTrackingRow>> {
        parse_tracking_jsonl(&self.fetch(
            &self.tracking_base,
            match_id,
            "_tracking_extrapolated.jsonl",
        )?)
    }

    fn load_roster(&self, match_id: &str) -> Result<Roster> {
        parse_match_json(&self.fetch(&self.match_base, match_id, "_match.json")?)
    }

    fn load_events(&self, match_id: &str) -> Result<Vec<MatchEvent>> {
        parse_events_csv(&self.fetch(&self.events_base, match_id, "_dynamic_events.csv")?)
    }
}

#[cfg(test)]
mod tests {
    use super::{DirSource, MatchSource, validate_match_id};
    use crate::error::ReplayError;

    #[test]
    fn match_id_must_be_numeric() {
        assert!(validate_match_id("1886347").is_ok());
        assert!(matches!(
            validate_match_id(""),
            Err(ReplayError::Configuration(_))
        ));
        assert!(matches!(
            validate_match_id("../etc"),
            Err(ReplayError::Configuration(_))
        ));
    }

    #[test]
    fn missing_files_are_not_found() {
        let source = DirSource::new("/definitely/not/a/data/dir");
        let err = source.load_events("42").unwrap_err();
        assert!(matches!(err, ReplayError::DataNotFound(_)));
    }
}
