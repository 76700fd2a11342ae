use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use crate::error::{ReplayError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventType {
    PlayerPossession,
    PassingOption,
    OnBallEngagement,
    OffBallRun,
    Other(String),
}

impl EventType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "player_possession" => EventType::PlayerPossession,
            "passing_option" => EventType::PassingOption,
            "on_ball_engagement" => EventType::OnBallEngagement,
            "off_ball_run" => EventType::OffBallRun,
            other => EventType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventType::PlayerPossession => "player_possession",
            EventType::PassingOption => "passing_option",
            EventType::OnBallEngagement => "on_ball_engagement",
            EventType::OffBallRun => "off_ball_run",
            EventType::Other(other) => other,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EventType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A tactical occurrence spanning the inclusive frame interval
/// `[frame_start, frame_end]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchEvent {
    pub event_id: String,
    pub event_type: EventType,
    pub frame_start: u32,
    pub frame_end: u32,
    pub player_id: Option<u64>,
    pub x_start: Option<f64>,
    pub y_start: Option<f64>,
    pub associated_player_possession_event_id: Option<String>,
    pub end_type: Option<String>,
    pub lead_to_shot: Option<bool>,
    pub lead_to_goal: Option<bool>,
}

impl MatchEvent {
    pub fn new(
        event_id: impl Into<String>,
        event_type: EventType,
        frame_start: u32,
        frame_end: u32,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_type,
            frame_start,
            frame_end,
            player_id: None,
            x_start: None,
            y_start: None,
            associated_player_possession_event_id: None,
            end_type: None,
            lead_to_shot: None,
            lead_to_goal: None,
        }
    }

    pub fn with_player(mut self, player_id: u64) -> Self {
        self.player_id = Some(player_id);
        self
    }

    pub fn with_start(mut self, x: f64, y: f64) -> Self {
        self.x_start = Some(x);
        self.y_start = Some(y);
        self
    }

    pub fn with_possession_event(mut self, event_id: impl Into<String>) -> Self {
        self.associated_player_possession_event_id = Some(event_id.into());
        self
    }

    pub fn spans(&self, frame: u32) -> bool {
        self.frame_start <= frame && frame <= self.frame_end
    }
}

#[derive(Debug, Deserialize)]
struct RawEventRow {
    #[serde(default)]
    event_id: Option<String>,
    #[serde(default)]
    event_type: Option<String>,
    #[serde(default)]
    frame_start: Option<String>,
    #[serde(default)]
    frame_end: Option<String>,
    #[serde(default)]
    player_id: Option<String>,
    #[serde(default)]
    x_start: Option<String>,
    #[serde(default)]
    y_start: Option<String>,
    #[serde(default)]
    associated_player_possession_event_id: Option<String>,
    #[serde(default)]
    end_type: Option<String>,
    #[serde(default)]
    lead_to_shot: Option<String>,
    #[serde(default)]
    lead_to_goal: Option<String>,
}

/// Parses the dynamic-events CSV. Columns not listed on [`MatchEvent`] are
/// ignored. Interval ordering is checked later, when the frame index is
/// built.
pub fn parse_events_csv(raw: &str) -> Result<Vec<MatchEvent>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(raw.as_bytes());

    let mut out = Vec::new();
    for (idx, record) in reader.deserialize::<RawEventRow>().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        let row = record
            .map_err(|err| ReplayError::DataIntegrity(format!("events line {line}: {err}")))?;
        out.push(event_from_row(row, line)?);
    }
    Ok(out)
}

fn event_from_row(row: RawEventRow, line: usize) -> Result<MatchEvent> {
    let event_type = non_empty(row.event_type)
        .map(|s| EventType::parse(&s))
        .ok_or_else(|| ReplayError::DataIntegrity(format!("events line {line}: missing event_type")))?;
    let frame_start = required_frame(row.frame_start.as_deref(), "frame_start", line)?;
    let frame_end = required_frame(row.frame_end.as_deref(), "frame_end", line)?;

    Ok(MatchEvent {
        event_id: non_empty(row.event_id).unwrap_or_else(|| format!("line-{line}")),
        event_type,
        frame_start,
        frame_end,
        player_id: parse_whole(row.player_id.as_deref())
            .and_then(|v| u64::try_from(v).ok()),
        x_start: parse_float(row.x_start.as_deref()),
        y_start: parse_float(row.y_start.as_deref()),
        associated_player_possession_event_id: non_empty(
            row.associated_player_possession_event_id,
        ),
        end_type: non_empty(row.end_type),
        lead_to_shot: parse_flag(row.lead_to_shot.as_deref()),
        lead_to_goal: parse_flag(row.lead_to_goal.as_deref()),
    })
}

fn required_frame(raw: Option<&str>, column: &str, line: usize) -> Result<u32> {
    parse_whole(raw)
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| {
            ReplayError::DataIntegrity(format!(
                "events line {line}: invalid {column} {:?}",
                raw.unwrap_or_default()
            ))
        })
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn parse_float(raw: Option<&str>) -> Option<f64> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Integers written by a float column come out as `"12.0"`.
fn parse_whole(raw: Option<&str>) -> Option<i64> {
    let trimmed = raw?.trim();
    if let Ok(v) = trimmed.parse::<i64>() {
        return Some(v);
    }
    let v = parse_float(Some(trimmed))?;
    (v.fract() == 0.0).then_some(v as i64)
}

fn parse_flag(raw: Option<&str>) -> Option<bool> {
    match raw?.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "1.0" => Some(true),
        "false" | "0" | "0.0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{EventType, parse_events_csv, parse_flag, parse_whole};

    #[test]
    fn parses_rows_and_ignores_extra_columns() {
        let raw = "\
event_id,event_type,frame_start,frame_end,player_id,x_start,y_start,associated_player_possession_event_id,end_type,lead_to_shot,lead_to_goal,team_shortname
1_0,player_possession,10,20,7,,,,pass,True,False,AUC
1_1,passing_option,12,18,9.0,,,1_0,,,,AUC
1_2,off_ball_run,11,19,9,10.5,-5.25,1_0,,,,AUC
1_3,something_new,1,2,,,,,,,,AUC
";
        let events = parse_events_csv(raw).expect("valid csv");
        assert_eq!(events.len(), 4);
        assert_eq!(events[0].event_type, EventType::PlayerPossession);
        assert_eq!(events[0].lead_to_shot, Some(true));
        assert_eq!(events[0].lead_to_goal, Some(false));
        assert_eq!(events[1].player_id, Some(9));
        assert_eq!(
            events[1].associated_player_possession_event_id.as_deref(),
            Some("1_0")
        );
        assert_eq!(events[2].x_start, Some(10.5));
        assert_eq!(events[2].y_start, Some(-5.25));
        assert_eq!(events[3].event_type, EventType::Other("something_new".to_string()));
        assert_eq!(events[3].player_id, None);
    }

    #[test]
    fn missing_frame_is_rejected() {
        let raw = "event_id,event_type,frame_start,frame_end\n1_0,player_possession,,20\n";
        let err = parse_events_csv(raw).unwrap_err();
        assert!(err.to_string().contains("events line 2"));
    }

    #[test]
    fn lenient_scalars() {
        assert_eq!(parse_whole(Some("12.0")), Some(12));
        assert_eq!(parse_whole(Some("12.5")), None);
        assert_eq!(parse_flag(Some("FALSE")), Some(false));
        assert_eq!(parse_flag(Some("")), None);
    }
}
