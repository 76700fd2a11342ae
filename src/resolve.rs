use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use crate::config::RendererConfig;
use crate::enrich::{EnrichedTracking, TrackingSample};
use crate::error::{ReplayError, Result};
use crate::events::MatchEvent;
use crate::frame_index::{FrameEventIndex, FrameEvents};
use crate::roster::PlayDirection;
use crate::style::{
    Emphasis, LineStyle, Marker, PlayerTags, TeamPalette, ball_marker, player_markers,
    run_path_style, run_start_marker,
};
use crate::tracking::timestamp_seconds;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerVisual {
    pub player_id: u64,
    pub short_name: String,
    pub number: Option<u32>,
    pub team_name: String,
    pub is_gk: bool,
    pub position: Point,
    pub tags: PlayerTags,
    pub emphasis: Emphasis,
    pub markers: Vec<Marker>,
}

impl PlayerVisual {
    pub fn is_regular(&self) -> bool {
        self.tags.is_regular()
    }
}

/// Segment from where an off-ball run started to where the runner is now.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    pub player_id: u64,
    pub event_id: String,
    pub direction: PlayDirection,
    pub start: Point,
    pub current: Point,
    pub start_marker: Marker,
    pub path: LineStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BallVisual {
    pub position: Point,
    pub marker: Marker,
}

/// Everything a renderer needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameVisualState {
    pub frame: u32,
    pub period: Option<u8>,
    pub timestamp: Option<String>,
    /// `timestamp` in seconds since period start.
    pub clock_seconds: Option<f64>,
    pub possession_player_id: Option<u64>,
    pub players: Vec<PlayerVisual>,
    pub ball: Option<BallVisual>,
    pub trajectories: Vec<Trajectory>,
}

impl FrameVisualState {
    pub fn player(&self, player_id: u64) -> Option<&PlayerVisual> {
        self.players.iter().find(|p| p.player_id == player_id)
    }

    pub fn title(&self) -> String {
        let timestamp = self.timestamp.as_deref().unwrap_or("N/A");
        let period = self
            .period
            .map(|p| p.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        format!(
            "Frame: {} | Timestamp : {} | Period: {}",
            self.frame, timestamp, period
        )
    }
}

/// Player ids carried by the events active in one frame.
#[derive(Debug, Clone, Default, PartialEq)]
struct TagSets {
    possession: Option<u64>,
    passing: HashSet<u64>,
    engagement: HashSet<u64>,
    runs: HashSet<u64>,
}

impl TagSets {
    fn from_events(events: &FrameEvents) -> Result<Self> {
        // First possession event by input order wins.
        let possession = events
            .player_possession
            .first()
            .map(|e| required_player(e))
            .transpose()?;
        Ok(Self {
            possession,
            passing: player_set(&events.passing_options)?,
            engagement: player_set(&events.on_ball_engagements)?,
            runs: player_set(&events.off_ball_runs)?,
        })
    }

    fn tags_for(&self, player_id: u64) -> PlayerTags {
        PlayerTags {
            possession: self.possession == Some(player_id),
            passing_option: self.passing.contains(&player_id),
            engaged: self.engagement.contains(&player_id),
            running: self.runs.contains(&player_id),
        }
    }
}

fn required_player(event: &MatchEvent) -> Result<u64> {
    event.player_id.ok_or_else(|| {
        ReplayError::DataIntegrity(format!(
            "{} event {} has no player_id",
            event.event_type, event.event_id
        ))
    })
}

fn player_set(events: &[Arc<MatchEvent>]) -> Result<HashSet<u64>> {
    events.iter().map(|e| required_player(e)).collect()
}

/// Derives the visual state of `frame`.
///
/// `Ok(None)` means the frame has no tracking rows; callers skip it.
pub fn resolve(
    tracking: &EnrichedTracking,
    index: &FrameEventIndex,
    frame: u32,
    palette: &TeamPalette,
    config: &RendererConfig,
) -> Result<Option<FrameVisualState>> {
    let rows = tracking.rows_for_frame(frame);
    let Some(first) = rows.first() else {
        return Ok(None);
    };

    let events = index.get(frame);
    let sets = TagSets::from_events(events)?;

    let players = rows
        .iter()
        .map(|row| {
            let tags = sets.tags_for(row.player_id);
            PlayerVisual {
                player_id: row.player_id,
                short_name: row.short_name.clone(),
                number: row.number,
                team_name: row.team_name.clone(),
                is_gk: row.is_gk,
                position: Point { x: row.x, y: row.y },
                tags,
                emphasis: tags.emphasis(),
                markers: player_markers(&tags, row.is_gk, palette.color(&row.team_name), config),
            }
        })
        .collect();

    let trajectories = if config.players.events.off_ball_runs.enabled {
        run_trajectories(tracking, rows, &events.off_ball_runs, config)?
    } else {
        Vec::new()
    };

    let ball = rows
        .iter()
        .find_map(|r| {
            Some(Point {
                x: r.ball_x?,
                y: r.ball_y?,
            })
        })
        .map(|position| BallVisual {
            position,
            marker: ball_marker(config),
        });

    Ok(Some(FrameVisualState {
        frame,
        period: first.period,
        timestamp: first.timestamp.clone(),
        clock_seconds: first.timestamp.as_deref().and_then(timestamp_seconds),
        possession_player_id: sets.possession,
        players,
        ball,
        trajectories,
    }))
}

fn run_trajectories(
    tracking: &EnrichedTracking,
    rows: &[TrackingSample],
    runs: &[Arc<MatchEvent>],
    config: &RendererConfig,
) -> Result<Vec<Trajectory>> {
    let mut out = Vec::with_capacity(runs.len());
    for run in runs {
        let player_id = required_player(run)?;
        // Rows are sorted by player id within a frame.
        let Ok(pos) = rows.binary_search_by_key(&player_id, |r| r.player_id) else {
            if !tracking.has_player(player_id) {
                return Err(ReplayError::DataIntegrity(format!(
                    "off_ball_run {} references player {player_id} outside the roster join",
                    run.event_id
                )));
            }
            continue;
        };
        let runner = &rows[pos];
        let (Some(x_start), Some(y_start)) = (run.x_start, run.y_start) else {
            return Err(ReplayError::DataIntegrity(format!(
                "off_ball_run {} has no start coordinate",
                run.event_id
            )));
        };
        let direction = runner.direction_for_period();
        out.push(Trajectory {
            player_id,
            event_id: run.event_id.clone(),
            direction,
            start: run_start(x_start, y_start, direction),
            current: Point {
                x: runner.x,
                y: runner.y,
            },
            start_marker: run_start_marker(config),
            path: run_path_style(config),
        });
    }
    Ok(out)
}

/// Event coordinates are recorded attacking left to right; mirror them
/// when the runner's team attacks the other way in this period.
pub fn run_start(x_start: f64, y_start: f64, direction: PlayDirection) -> Point {
    match direction {
        PlayDirection::RightToLeft => Point {
            x: -x_start,
            y: -y_start,
        },
        PlayDirection::LeftToRight => Point {
            x: x_start,
            y: y_start,
        },
    }
}
