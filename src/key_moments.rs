use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::episode::EpisodeDescriptor;
use crate::error::{ReplayError, Result, Stage, StageContext};
use crate::events::{EventType, MatchEvent};
use crate::source::MatchSource;

/// Event fields that can be aggregated per sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventColumn {
    FrameStart,
    FrameEnd,
    PlayerId,
    LeadToShot,
    LeadToGoal,
}

impl EventColumn {
    pub fn as_str(self) -> &'static str {
        match self {
            EventColumn::FrameStart => "frame_start",
            EventColumn::FrameEnd => "frame_end",
            EventColumn::PlayerId => "player_id",
            EventColumn::LeadToShot => "lead_to_shot",
            EventColumn::LeadToGoal => "lead_to_goal",
        }
    }

    /// Flags read as 0/1.
    fn read(self, event: &MatchEvent) -> Option<f64> {
        let flag = |v: Option<bool>| v.map(|b| if b { 1.0 } else { 0.0 });
        match self {
            EventColumn::FrameStart => Some(f64::from(event.frame_start)),
            EventColumn::FrameEnd => Some(f64::from(event.frame_end)),
            EventColumn::PlayerId => event.player_id.map(|id| id as f64),
            EventColumn::LeadToShot => flag(event.lead_to_shot),
            EventColumn::LeadToGoal => flag(event.lead_to_goal),
        }
    }
}

impl fmt::Display for EventColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    Min,
    Max,
    First,
    Last,
    Count,
    Sum,
    Any,
}

impl Aggregation {
    /// Yields one of the input values rather than a derived quantity.
    pub fn is_positional(self) -> bool {
        matches!(
            self,
            Aggregation::Min | Aggregation::Max | Aggregation::First | Aggregation::Last
        )
    }

    /// Missing values are skipped, as a dataframe group-by would.
    fn apply(self, values: &[f64]) -> Option<f64> {
        match self {
            Aggregation::Min => values.iter().copied().reduce(f64::min),
            Aggregation::Max => values.iter().copied().reduce(f64::max),
            Aggregation::First => values.first().copied(),
            Aggregation::Last => values.last().copied(),
            Aggregation::Count => Some(values.len() as f64),
            Aggregation::Sum => Some(values.iter().sum()),
            Aggregation::Any => Some(if values.iter().any(|v| *v != 0.0) { 1.0 } else { 0.0 }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyMomentsConfig {
    pub match_id: String,
    pub start_buffer: u32,
    pub end_buffer: u32,
    pub aggregations: Vec<(EventColumn, Aggregation)>,
}

impl KeyMomentsConfig {
    pub fn new(match_id: impl Into<String>) -> Self {
        Self {
            match_id: match_id.into(),
            start_buffer: 0,
            end_buffer: 0,
            aggregations: Vec::new(),
        }
    }

    pub fn with_buffers(mut self, start_buffer: u32, end_buffer: u32) -> Self {
        self.start_buffer = start_buffer;
        self.end_buffer = end_buffer;
        self
    }

    pub fn aggregate(mut self, column: EventColumn, aggregation: Aggregation) -> Self {
        self.aggregations.push((column, aggregation));
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.match_id.trim().is_empty() {
            return Err(ReplayError::Configuration("match_id cannot be empty".to_string()));
        }
        if self.aggregations.is_empty() {
            return Err(ReplayError::Configuration(
                "column aggregations cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedValue {
    pub column: EventColumn,
    pub aggregation: Aggregation,
    pub value: Option<f64>,
}

/// One group of events sharing a sequence id, with buffered frame bounds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyMoment {
    pub match_id: String,
    pub sequence_id: String,
    pub frame_start: Option<u32>,
    pub frame_end: Option<u32>,
    pub values: Vec<AggregatedValue>,
}

impl KeyMoment {
    pub fn value(&self, column: EventColumn, aggregation: Aggregation) -> Option<f64> {
        self.values
            .iter()
            .find(|v| v.column == column && v.aggregation == aggregation)
            .and_then(|v| v.value)
    }

    /// Needs both frame bounds to have been aggregated.
    pub fn episode(&self) -> Result<EpisodeDescriptor> {
        let (Some(start), Some(end)) = (self.frame_start, self.frame_end) else {
            return Err(ReplayError::Configuration(format!(
                "key moment {} has no frame_start/frame_end aggregation",
                self.sequence_id
            )));
        };
        Ok(EpisodeDescriptor::new(self.match_id.clone(), start, end))
    }
}

/// Groups events by `sequence` (groups ordered by sequence id, events in
/// input order), then aggregates the configured columns. Events whose
/// sequence is `None` are left out.
pub fn find_key_moments<F>(
    events: &[Arc<MatchEvent>],
    config: &KeyMomentsConfig,
    sequence: F,
) -> Result<Vec<KeyMoment>>
where
    F: Fn(&MatchEvent) -> Option<String>,
{
    config.validate()?;

    let mut groups: BTreeMap<String, Vec<&MatchEvent>> = BTreeMap::new();
    for event in events {
        let Some(id) = sequence(event) else {
            continue;
        };
        groups.entry(id).or_default().push(event);
    }
    if groups.is_empty() {
        return Err(ReplayError::DataNotFound(format!(
            "match {}: no events left after sequencing",
            config.match_id
        )));
    }

    let moments = groups
        .into_iter()
        .map(|(sequence_id, members)| build_moment(config, sequence_id, &members))
        .collect();
    Ok(moments)
}

fn build_moment(config: &KeyMomentsConfig, sequence_id: String, members: &[&MatchEvent]) -> KeyMoment {
    let values: Vec<AggregatedValue> = config
        .aggregations
        .iter()
        .map(|&(column, aggregation)| {
            let column_values: Vec<f64> = members.iter().filter_map(|e| column.read(e)).collect();
            AggregatedValue {
                column,
                aggregation,
                value: aggregation.apply(&column_values),
            }
        })
        .collect();

    // Only order-preserving aggregations can serve as frame bounds.
    let bound = |column| {
        values
            .iter()
            .find(|v| v.column == column && v.aggregation.is_positional())
            .and_then(|v| v.value)
    };
    let frame_start = bound(EventColumn::FrameStart)
        .map(|start| (start - f64::from(config.start_buffer)).max(0.0) as u32);
    let frame_end = bound(EventColumn::FrameEnd)
        .map(|end| (end as u32).saturating_add(config.end_buffer));

    KeyMoment {
        match_id: config.match_id.clone(),
        sequence_id,
        frame_start,
        frame_end,
        values,
    }
}

/// Possession events key on their own id, everything else on the
/// possession it is attached to.
pub fn by_possession_chain(event: &MatchEvent) -> Option<String> {
    match event.event_type {
        EventType::PlayerPossession => Some(event.event_id.clone()),
        _ => event.associated_player_possession_event_id.clone(),
    }
}

/// Loads a match's events from `source` and runs [`find_key_moments`].
pub struct KeyMomentsFinder<'a> {
    source: &'a dyn MatchSource,
}

impl<'a> KeyMomentsFinder<'a> {
    pub fn new(source: &'a dyn MatchSource) -> Self {
        Self { source }
    }

    pub fn find<F>(&self, config: &KeyMomentsConfig, sequence: F) -> Result<Vec<KeyMoment>>
    where
        F: Fn(&MatchEvent) -> Option<String>,
    {
        config.validate()?;
        let match_id = config.match_id.trim();
        let events: Vec<Arc<MatchEvent>> = self
            .source
            .load_events(match_id)
            .stage(match_id, Stage::LoadEvents)?
            .into_iter()
            .map(Arc::new)
            .collect();
        if events.is_empty() {
            return Err(ReplayError::DataNotFound(format!(
                "no events data found for match {match_id}"
            )));
        }
        find_key_moments(&events, config, sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::Aggregation;

    #[test]
    fn aggregations_skip_missing_values() {
        let values = [3.0, 1.0, 2.0];
        assert_eq!(Aggregation::Min.apply(&values), Some(1.0));
        assert_eq!(Aggregation::Max.apply(&values), Some(3.0));
        assert_eq!(Aggregation::First.apply(&values), Some(3.0));
        assert_eq!(Aggregation::Last.apply(&values), Some(2.0));
        assert_eq!(Aggregation::Count.apply(&values), Some(3.0));
        assert_eq!(Aggregation::Sum.apply(&values), Some(6.0));
        assert_eq!(Aggregation::Any.apply(&[0.0, 0.0]), Some(0.0));
        assert_eq!(Aggregation::Min.apply(&[]), None);
        assert_eq!(Aggregation::Count.apply(&[]), Some(0.0));
        assert!(Aggregation::First.is_positional());
        assert!(!Aggregation::Count.is_positional());
        assert!(!Aggregation::Sum.is_positional());
    }
}
