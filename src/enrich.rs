use std::collections::{BTreeMap, HashSet};
use std::ops::Range;

use serde::Serialize;
use tracing::debug;

use crate::error::{ReplayError, Result};
use crate::roster::{PlayDirection, Roster};
use crate::tracking::RawTrackingRow;

/// Direction assumed when the period is neither 1 nor 2.
pub const DEFAULT_DIRECTION: PlayDirection = PlayDirection::LeftToRight;

/// One player's position at one frame, joined with roster metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackingSample {
    pub frame: u32,
    pub timestamp: Option<String>,
    pub period: Option<u8>,
    pub player_id: u64,
    pub x: f64,
    pub y: f64,
    pub short_name: String,
    pub number: Option<u32>,
    pub team_name: String,
    pub is_home: bool,
    pub is_gk: bool,
    pub direction_1st_half: PlayDirection,
    pub direction_2nd_half: PlayDirection,
    pub ball_x: Option<f64>,
    pub ball_y: Option<f64>,
    pub possession_player_id: Option<u64>,
    pub possession_group: Option<String>,
}

impl TrackingSample {
    pub fn direction_for_period(&self) -> PlayDirection {
        match self.period {
            Some(1) => self.direction_1st_half,
            Some(2) => self.direction_2nd_half,
            _ => DEFAULT_DIRECTION,
        }
    }
}

/// Enriched tracking table for one match, keyed by `(frame, player_id)`.
#[derive(Debug, Clone)]
pub struct EnrichedTracking {
    match_id: String,
    match_name: String,
    rows: Vec<TrackingSample>,
    frames: BTreeMap<u32, Range<usize>>,
    players: HashSet<u64>,
    dropped_rows: usize,
}

impl EnrichedTracking {
    pub fn match_id(&self) -> &str {
        &self.match_id
    }

    pub fn match_name(&self) -> &str {
        &self.match_name
    }

    pub fn rows(&self) -> &[TrackingSample] {
        &self.rows
    }

    /// Rows for one frame, ordered by player id. Empty when the frame was
    /// not sampled.
    pub fn rows_for_frame(&self, frame: u32) -> &[TrackingSample] {
        self.frames
            .get(&frame)
            .map(|range| &self.rows[range.clone()])
            .unwrap_or(&[])
    }

    /// Sampled frame numbers inside `[start, end]`, ascending.
    pub fn frames_in(&self, start: u32, end: u32) -> impl Iterator<Item = u32> + '_ {
        self.frames
            .range(start..=end.max(start))
            .map(|(frame, _)| *frame)
            .filter(move |frame| *frame <= end)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn first_frame(&self) -> Option<u32> {
        self.frames.keys().next().copied()
    }

    pub fn last_frame(&self) -> Option<u32> {
        self.frames.keys().next_back().copied()
    }

    /// Whether the player appears anywhere in the joined table.
    pub fn has_player(&self, player_id: u64) -> bool {
        self.players.contains(&player_id)
    }

    /// Tracking rows whose player was not on the roster.
    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }

    /// Distinct team names, sorted.
    pub fn team_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.rows.iter().map(|r| r.team_name.clone()).collect();
        names.sort();
        names.dedup();
        names
    }
}

/// Inner join of tracking rows with the roster on player id.
///
/// Rows for players absent from the roster are dropped. Fails with
/// `DataNotFound` when nothing survives the join.
pub fn enrich(match_id: &str, rows: Vec<RawTrackingRow>, roster: &Roster) -> Result<EnrichedTracking> {
    let total = rows.len();
    let mut joined: Vec<TrackingSample> = rows
        .into_iter()
        .filter_map(|row| {
            let entry = roster.get(row.player_id)?;
            Some(TrackingSample {
                frame: row.frame,
                timestamp: row.timestamp,
                period: row.period,
                player_id: row.player_id,
                x: row.x,
                y: row.y,
                short_name: entry.short_name.clone(),
                number: entry.number,
                team_name: entry.team_name.clone(),
                is_home: entry.is_home,
                is_gk: entry.is_gk,
                direction_1st_half: entry.direction_1st_half,
                direction_2nd_half: entry.direction_2nd_half,
                ball_x: row.ball.x,
                ball_y: row.ball.y,
                possession_player_id: row.possession_player_id,
                possession_group: row.possession_group,
            })
        })
        .collect();
    let dropped_rows = total - joined.len();
    if dropped_rows > 0 {
        debug!(match_id, dropped_rows, "dropped tracking rows without roster entry");
    }
    if joined.is_empty() {
        return Err(ReplayError::DataNotFound(format!(
            "no rostered tracking rows for match {match_id}"
        )));
    }

    // Stable sort keeps the first reading of a duplicated (frame, player).
    joined.sort_by_key(|r| (r.frame, r.player_id));
    joined.dedup_by_key(|r| (r.frame, r.player_id));

    let mut frames = BTreeMap::new();
    let mut start = 0usize;
    while start < joined.len() {
        let frame = joined[start].frame;
        let end = start + joined[start..].iter().take_while(|r| r.frame == frame).count();
        frames.insert(frame, start..end);
        start = end;
    }

    let players = joined.iter().map(|r| r.player_id).collect();

    Ok(EnrichedTracking {
        match_id: match_id.to_string(),
        match_name: roster.meta.match_name(),
        rows: joined,
        frames,
        players,
        dropped_rows,
    })
}
