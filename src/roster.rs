use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ReplayError, Result};

/// Seconds assumed for a missing start/end time of play (90:00).
pub const DEFAULT_TIME_OF_PLAY_SECS: i64 = 90 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayDirection {
    LeftToRight,
    RightToLeft,
}

impl PlayDirection {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim() {
            "left_to_right" => Ok(PlayDirection::LeftToRight),
            "right_to_left" => Ok(PlayDirection::RightToLeft),
            other => Err(ReplayError::DataIntegrity(format!(
                "unknown play direction {other:?}"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlayDirection::LeftToRight => "left_to_right",
            PlayDirection::RightToLeft => "right_to_left",
        }
    }
}

impl fmt::Display for PlayDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchMeta {
    pub match_id: Option<u64>,
    pub home_team: Team,
    pub away_team: Team,
    pub home_team_score: Option<u32>,
    pub away_team_score: Option<u32>,
    pub date_time: Option<String>,
    /// Side the home team attacks towards in the first and second half.
    pub home_team_side: (PlayDirection, PlayDirection),
}

impl MatchMeta {
    pub fn match_name(&self) -> String {
        format!("{} vs {}", self.home_team.name, self.away_team.name)
    }
}

/// Static per-player metadata for one match, with derived team and
/// direction fields resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub player_id: u64,
    pub short_name: String,
    pub number: Option<u32>,
    pub team_id: u64,
    pub team_name: String,
    pub is_home: bool,
    pub role_acronym: Option<String>,
    pub role_name: Option<String>,
    pub position_group: Option<String>,
    pub is_gk: bool,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub total_time: i64,
    pub direction_1st_half: PlayDirection,
    pub direction_2nd_half: PlayDirection,
}

#[derive(Debug, Clone)]
pub struct Roster {
    pub meta: MatchMeta,
    players: Vec<RosterEntry>,
    by_id: HashMap<u64, usize>,
}

impl Roster {
    pub fn new(meta: MatchMeta, players: Vec<RosterEntry>) -> Self {
        let by_id = players
            .iter()
            .enumerate()
            .map(|(idx, p)| (p.player_id, idx))
            .collect();
        Self {
            meta,
            players,
            by_id,
        }
    }

    pub fn get(&self, player_id: u64) -> Option<&RosterEntry> {
        self.by_id.get(&player_id).map(|idx| &self.players[*idx])
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct RawMatch {
    #[serde(default)]
    id: Option<u64>,
    home_team: RawTeam,
    away_team: RawTeam,
    home_team_side: RawSides,
    #[serde(default)]
    home_team_score: Option<u32>,
    #[serde(default)]
    away_team_score: Option<u32>,
    #[serde(default)]
    date_time: Option<String>,
    #[serde(default)]
    players: Vec<RawPlayer>,
}

#[derive(Debug, Deserialize)]
struct RawTeam {
    id: u64,
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawSides {
    List(Vec<String>),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct RawPlayer {
    id: u64,
    #[serde(default)]
    short_name: Option<String>,
    #[serde(default)]
    number: Option<u32>,
    team_id: u64,
    #[serde(default)]
    start_time: Option<String>,
    #[serde(default)]
    end_time: Option<String>,
    #[serde(default)]
    player_role: Option<RawRole>,
}

#[derive(Debug, Deserialize)]
struct RawRole {
    #[serde(default)]
    acronym: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    position_group: Option<String>,
}

/// Parses the match metadata document and keeps only players who took
/// part (a start or end time of play is present).
pub fn parse_match_json(raw: &str) -> Result<Roster> {
    let parsed: RawMatch = serde_json::from_str(raw.trim())
        .map_err(|err| ReplayError::DataIntegrity(format!("invalid match json: {err}")))?;

    let home_team_side = match &parsed.home_team_side {
        RawSides::List(items) => side_pair_from_parts(items.iter().map(String::as_str))?,
        RawSides::Text(text) => parse_side_pair(text)?,
    };
    let meta = MatchMeta {
        match_id: parsed.id,
        home_team: Team {
            id: parsed.home_team.id,
            name: parsed.home_team.name,
        },
        away_team: Team {
            id: parsed.away_team.id,
            name: parsed.away_team.name,
        },
        home_team_score: parsed.home_team_score,
        away_team_score: parsed.away_team_score,
        date_time: parsed.date_time,
        home_team_side,
    };

    let mut players = Vec::with_capacity(parsed.players.len());
    for p in parsed.players {
        if p.start_time.is_none() && p.end_time.is_none() {
            continue;
        }
        players.push(build_entry(&meta, p)?);
    }
    Ok(Roster::new(meta, players))
}

fn build_entry(meta: &MatchMeta, p: RawPlayer) -> Result<RosterEntry> {
    let total_time =
        time_to_seconds(p.end_time.as_deref())? - time_to_seconds(p.start_time.as_deref())?;
    let is_home = p.team_id == meta.home_team.id;
    let team_name = if is_home {
        meta.home_team.name.clone()
    } else {
        meta.away_team.name.clone()
    };
    let (home_1st, home_2nd) = meta.home_team_side;
    let (direction_1st_half, direction_2nd_half) = if is_home {
        (home_1st, home_2nd)
    } else {
        (home_2nd, home_1st)
    };
    let role = p.player_role.unwrap_or(RawRole {
        acronym: None,
        name: None,
        position_group: None,
    });
    let is_gk = role.acronym.as_deref() == Some("GK");

    Ok(RosterEntry {
        player_id: p.id,
        short_name: p.short_name.unwrap_or_default(),
        number: p.number,
        team_id: p.team_id,
        team_name,
        is_home,
        role_acronym: role.acronym,
        role_name: role.name,
        position_group: role.position_group,
        is_gk,
        start_time: p.start_time,
        end_time: p.end_time,
        total_time,
        direction_1st_half,
        direction_2nd_half,
    })
}

/// `HH:MM:SS` to seconds. A missing value counts as 90:00.
pub fn time_to_seconds(raw: Option<&str>) -> Result<i64> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_TIME_OF_PLAY_SECS);
    };
    let parts = raw
        .trim()
        .split(':')
        .map(|part| part.trim().parse::<i64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| ReplayError::DataIntegrity(format!("invalid time of play {raw:?}")))?;
    let [h, m, s] = parts.as_slice() else {
        return Err(ReplayError::DataIntegrity(format!(
            "invalid time of play {raw:?}"
        )));
    };
    Ok(h * 3600 + m * 60 + s)
}

/// Parses the bracketed form `['left_to_right', 'right_to_left']` into the
/// home team's side for each half.
pub fn parse_side_pair(raw: &str) -> Result<(PlayDirection, PlayDirection)> {
    let inner = raw.trim().trim_start_matches('[').trim_end_matches(']');
    side_pair_from_parts(inner.split(',').map(|s| s.trim().trim_matches(|c: char| c == '\'' || c == '"')))
}

fn side_pair_from_parts<'a>(
    parts: impl Iterator<Item = &'a str>,
) -> Result<(PlayDirection, PlayDirection)> {
    let parts: Vec<&str> = parts.collect();
    let [first, second] = parts.as_slice() else {
        return Err(ReplayError::DataIntegrity(format!(
            "expected two home team sides, got {}",
            parts.len()
        )));
    };
    Ok((PlayDirection::parse(first)?, PlayDirection::parse(second)?))
}
