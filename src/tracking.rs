use chrono::{NaiveTime, Timelike};
use rayon::prelude::*;
use serde::Deserialize;

use crate::error::{ReplayError, Result};

/// Ball reading for one frame. Copied onto every player row of that frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BallReading {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub is_detected: Option<bool>,
}

/// One player at one frame, before the roster join.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTrackingRow {
    pub frame: u32,
    pub timestamp: Option<String>,
    pub period: Option<u8>,
    pub player_id: u64,
    pub x: f64,
    pub y: f64,
    pub is_detected: Option<bool>,
    pub ball: BallReading,
    pub possession_player_id: Option<u64>,
    pub possession_group: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FrameLine {
    frame: u32,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    period: Option<u8>,
    #[serde(default)]
    ball_data: Option<BallData>,
    #[serde(default)]
    possession: Option<PossessionData>,
    #[serde(default)]
    player_data: Vec<PlayerData>,
}

#[derive(Debug, Deserialize)]
struct BallData {
    #[serde(default)]
    x: Option<f64>,
    #[serde(default)]
    y: Option<f64>,
    #[serde(default)]
    z: Option<f64>,
    #[serde(default)]
    is_detected: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct PossessionData {
    #[serde(default)]
    player_id: Option<u64>,
    #[serde(default)]
    group: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlayerData {
    player_id: u64,
    #[serde(default)]
    x: Option<f64>,
    #[serde(default)]
    y: Option<f64>,
    #[serde(default)]
    is_detected: Option<bool>,
}

/// Parses the newline-delimited frame objects and explodes `player_data`
/// into one row per (frame, player). Row order follows input line order.
pub fn parse_tracking_jsonl(raw: &str) -> Result<Vec<RawTrackingRow>> {
    let lines: Vec<(usize, &str)> = raw
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .collect();

    let frames = lines
        .par_iter()
        .map(|(idx, line)| {
            serde_json::from_str::<FrameLine>(line).map_err(|err| {
                ReplayError::DataIntegrity(format!("tracking line {}: {err}", idx + 1))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut rows = Vec::with_capacity(frames.iter().map(|f| f.player_data.len()).sum());
    for frame in frames {
        rows.extend(explode_frame(frame));
    }
    Ok(rows)
}

fn explode_frame(frame: FrameLine) -> impl Iterator<Item = RawTrackingRow> {
    let FrameLine {
        frame: frame_num,
        timestamp,
        period,
        ball_data,
        possession,
        player_data,
    } = frame;
    let ball = ball_data
        .map(|b| BallReading {
            x: b.x,
            y: b.y,
            z: b.z,
            is_detected: b.is_detected,
        })
        .unwrap_or_default();
    let (possession_player_id, possession_group) = possession
        .map(|p| (p.player_id, p.group))
        .unwrap_or((None, None));

    // Players without a position cannot be drawn.
    player_data.into_iter().filter_map(move |player| {
        let (Some(x), Some(y)) = (player.x, player.y) else {
            return None;
        };
        Some(RawTrackingRow {
            frame: frame_num,
            timestamp: timestamp.clone(),
            period,
            player_id: player.player_id,
            x,
            y,
            is_detected: player.is_detected,
            ball: ball.clone(),
            possession_player_id,
            possession_group: possession_group.clone(),
        })
    })
}

/// Seconds since period start for a tracking timestamp like `00:01:23.40`.
pub fn timestamp_seconds(raw: &str) -> Option<f64> {
    let t = NaiveTime::parse_from_str(raw.trim(), "%H:%M:%S%.f").ok()?;
    Some(t.num_seconds_from_midnight() as f64 + t.nanosecond() as f64 / 1e9)
}
