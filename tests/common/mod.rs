#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use match_replay::error::Result;
use match_replay::events::MatchEvent;
use match_replay::roster::{Roster, parse_match_json};
use match_replay::source::MatchSource;
use match_replay::tracking::{BallReading, RawTrackingRow};

pub const FIXTURE_MATCH: &str = "1886347";

pub fn fixture_dir() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push("data");
    path
}

pub fn read_fixture(name: &str) -> String {
    let path = fixture_dir().join(FIXTURE_MATCH).join(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

/// Home team 100 (players 7, 8; 1 in goal) plays left to right in the
/// first half. Away team 200 (players 11, 22) the other way.
pub const ROSTER_JSON: &str = r#"{
    "id": 42,
    "home_team": {"id": 100, "name": "Home"},
    "away_team": {"id": 200, "name": "Away"},
    "home_team_side": ["left_to_right", "right_to_left"],
    "players": [
        {"id": 1, "short_name": "Keeper", "number": 1, "team_id": 100,
         "start_time": "00:00:00", "player_role": {"acronym": "GK"}},
        {"id": 7, "short_name": "Seven", "number": 7, "team_id": 100,
         "start_time": "00:00:00"},
        {"id": 8, "short_name": "Eight", "number": 8, "team_id": 100,
         "start_time": "00:00:00"},
        {"id": 11, "short_name": "Eleven", "number": 11, "team_id": 200,
         "start_time": "00:00:00"},
        {"id": 22, "short_name": "TwentyTwo", "number": 22, "team_id": 200,
         "start_time": "00:00:00"}
    ]
}"#;

pub fn roster() -> Roster {
    parse_match_json(ROSTER_JSON).expect("roster should parse")
}

pub fn row(frame: u32, period: u8, player_id: u64, x: f64, y: f64) -> RawTrackingRow {
    RawTrackingRow {
        frame,
        timestamp: Some(format!("00:00:{:02}.00", frame % 60)),
        period: Some(period),
        player_id,
        x,
        y,
        is_detected: Some(true),
        ball: BallReading {
            x: Some(1.0),
            y: Some(2.0),
            z: Some(0.0),
            is_detected: Some(true),
        },
        possession_player_id: None,
        possession_group: None,
    }
}

/// Every rostered outfield player plus the keeper at each frame.
pub fn frames(frames: impl IntoIterator<Item = u32>, period: u8) -> Vec<RawTrackingRow> {
    frames
        .into_iter()
        .flat_map(|f| {
            [1u64, 7, 8, 11, 22]
                .into_iter()
                .map(move |p| row(f, period, p, p as f64, -(p as f64)))
        })
        .collect()
}

/// Serves fixed data for match "42" only.
pub struct MemorySource {
    pub tracking: Vec<RawTrackingRow>,
    pub events: Vec<MatchEvent>,
}

impl MemorySource {
    pub fn new(tracking: Vec<RawTrackingRow>, events: Vec<MatchEvent>) -> Self {
        Self { tracking, events }
    }

    fn check(&self, match_id: &str) -> Result<()> {
        if match_id == "42" {
            Ok(())
        } else {
            Err(match_replay::ReplayError::DataNotFound(format!(
                "no match {match_id}"
            )))
        }
    }
}

impl MatchSource for MemorySource {
    fn load_tracking(&self, match_id: &str) -> Result<Vec<RawTrackingRow>> {
        self.check(match_id)?;
        Ok(self.tracking.clone())
    }

    fn load_roster(&self, match_id: &str) -> Result<Roster> {
        self.check(match_id)?;
        parse_match_json(ROSTER_JSON)
    }

    fn load_events(&self, match_id: &str) -> Result<Vec<MatchEvent>> {
        self.check(match_id)?;
        Ok(self.events.clone())
    }
}
