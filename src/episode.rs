use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use std::vec;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info};

use crate::cache::{MatchData, MatchDataCache};
use crate::config::RendererConfig;
use crate::error::{ReplayError, Result, Stage, StageContext};
use crate::resolve::{FrameVisualState, resolve};
use crate::style::TeamPalette;

/// Plays frame ranges of cached matches with one renderer configuration.
pub struct EpisodePlayer<'a> {
    cache: &'a MatchDataCache,
    config: RendererConfig,
}

impl<'a> EpisodePlayer<'a> {
    pub fn new(cache: &'a MatchDataCache, config: RendererConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { cache, config })
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Visual states for every sampled frame in `[start, end]`, ascending.
    pub fn play_episode(
        &self,
        match_id: &str,
        start: u32,
        end: u32,
    ) -> Result<Vec<FrameVisualState>> {
        let states = self.frames(match_id, start, end)?.collect::<Result<Vec<_>>>()?;
        info!(match_id, start, end, frames = states.len(), "episode resolved");
        Ok(states)
    }

    /// Lazy version of [`play_episode`](Self::play_episode). Range and data
    /// errors surface here; per-frame errors surface from the iterator.
    pub fn frames(&self, match_id: &str, start: u32, end: u32) -> Result<EpisodeFrames<'_>> {
        if start > end {
            return Err(ReplayError::Configuration(format!(
                "frame_start {start} is after frame_end {end}"
            )));
        }
        let data = self.cache.get_or_build(match_id)?;
        let frames: Vec<u32> = data.tracking.frames_in(start, end).collect();
        if frames.is_empty() {
            return Err(ReplayError::DataNotFound(format!(
                "match {}: no tracking frames in {start}..={end}",
                data.match_id
            )));
        }
        let palette = TeamPalette::new(&data.teams, &self.config.teams.colors);
        Ok(EpisodeFrames {
            data,
            palette,
            config: &self.config,
            frames: frames.into_iter(),
        })
    }

    pub fn play_saved_episode(&self, path: &Path) -> Result<Vec<FrameVisualState>> {
        let episode = EpisodeDescriptor::from_file(path)?;
        self.play_descriptor(&episode)
    }

    pub fn play_descriptor(&self, episode: &EpisodeDescriptor) -> Result<Vec<FrameVisualState>> {
        self.play_episode(&episode.match_id, episode.frame_start, episode.frame_end)
    }

    pub fn clear_cache(&self, match_id: Option<&str>) {
        self.cache.clear(match_id);
    }
}

/// Iterator over the resolved frames of one episode.
pub struct EpisodeFrames<'a> {
    data: Arc<MatchData>,
    palette: TeamPalette,
    config: &'a RendererConfig,
    frames: vec::IntoIter<u32>,
}

impl Iterator for EpisodeFrames<'_> {
    type Item = Result<FrameVisualState>;

    fn next(&mut self) -> Option<Self::Item> {
        for frame in self.frames.by_ref() {
            let resolved = resolve(
                &self.data.tracking,
                &self.data.index,
                frame,
                &self.palette,
                self.config,
            )
            .stage(&self.data.match_id, Stage::ResolveFrame(frame));
            match resolved {
                Ok(Some(state)) => return Some(Ok(state)),
                Ok(None) => debug!(frame, "frame has no tracking rows, skipping"),
                Err(err) => return Some(Err(err)),
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.frames.len()))
    }
}

/// A saved frame range, as written by annotation tools:
/// `{"episode_data": {"match_id": ..., "frame_start": ..., "frame_end": ...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeDescriptor {
    #[serde(deserialize_with = "match_id_from_any")]
    pub match_id: String,
    pub frame_start: u32,
    pub frame_end: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation_data: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SavedEpisode {
    episode_data: EpisodeDescriptor,
}

impl EpisodeDescriptor {
    pub fn new(match_id: impl Into<String>, frame_start: u32, frame_end: u32) -> Self {
        Self {
            match_id: match_id.into(),
            frame_start,
            frame_end,
            annotation_data: None,
        }
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let saved: SavedEpisode = serde_json::from_str(raw)
            .map_err(|err| ReplayError::Configuration(format!("invalid saved episode: {err}")))?;
        Ok(saved.episode_data)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(ReplayError::DataNotFound(format!(
                    "saved episode {} does not exist",
                    path.display()
                )));
            }
            Err(err) => {
                return Err(ReplayError::Source(
                    anyhow::Error::new(err).context(format!("read {}", path.display())),
                ));
            }
        };
        Self::from_json(&raw)
    }

    /// The wrapped `episode_data` document.
    pub fn to_json(&self) -> Result<String> {
        let saved = SavedEpisode {
            episode_data: self.clone(),
        };
        serde_json::to_string_pretty(&saved)
            .map_err(|err| ReplayError::Source(anyhow::Error::new(err)))
    }
}

fn match_id_from_any<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MatchId {
        Number(u64),
        Text(String),
    }

    Ok(match MatchId::deserialize(deserializer)? {
        MatchId::Number(id) => id.to_string(),
        MatchId::Text(id) => id.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::EpisodeDescriptor;
    use crate::error::ReplayError;

    #[test]
    fn descriptor_accepts_numeric_and_text_ids() {
        let numeric = EpisodeDescriptor::from_json(
            r#"{"episode_data": {"match_id": 1886347, "frame_start": 100, "frame_end": 160}}"#,
        )
        .unwrap();
        let text = EpisodeDescriptor::from_json(
            r#"{"episode_data": {"match_id": "1886347", "frame_start": 100, "frame_end": 160,
                "annotation_data": {"shapes": []}}}"#,
        )
        .unwrap();
        assert_eq!(numeric.match_id, "1886347");
        assert_eq!(text.match_id, "1886347");
        assert!(numeric.annotation_data.is_none());
        assert!(text.annotation_data.is_some());
    }

    #[test]
    fn descriptor_without_wrapper_is_rejected() {
        let err = EpisodeDescriptor::from_json(r#"{"match_id": 1, "frame_start": 1, "frame_end": 2}"#)
            .unwrap_err();
        assert!(matches!(err, ReplayError::Configuration(_)));
    }

    #[test]
    fn descriptor_json_keeps_wrapper() {
        let json = EpisodeDescriptor::new("42", 5, 9).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["episode_data"]["frame_end"], 9);
        assert_eq!(EpisodeDescriptor::from_json(&json).unwrap().match_id, "42");
    }
}
