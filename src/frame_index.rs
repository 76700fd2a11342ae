use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{ReplayError, Result};
use crate::events::{EventType, MatchEvent};

/// Events active at one frame, split by category, each list in input order.
#[derive(Debug, Clone, Default)]
pub struct FrameEvents {
    pub player_possession: Vec<Arc<MatchEvent>>,
    pub passing_options: Vec<Arc<MatchEvent>>,
    pub on_ball_engagements: Vec<Arc<MatchEvent>>,
    pub off_ball_runs: Vec<Arc<MatchEvent>>,
}

impl FrameEvents {
    /// The list an event type lands in; `None` for uncategorized types.
    pub fn category(&self, event_type: &EventType) -> Option<&[Arc<MatchEvent>]> {
        match event_type {
            EventType::PlayerPossession => Some(&self.player_possession),
            EventType::PassingOption => Some(&self.passing_options),
            EventType::OnBallEngagement => Some(&self.on_ball_engagements),
            EventType::OffBallRun => Some(&self.off_ball_runs),
            EventType::Other(_) => None,
        }
    }

    fn category_mut(&mut self, event_type: &EventType) -> Option<&mut Vec<Arc<MatchEvent>>> {
        match event_type {
            EventType::PlayerPossession => Some(&mut self.player_possession),
            EventType::PassingOption => Some(&mut self.passing_options),
            EventType::OnBallEngagement => Some(&mut self.on_ball_engagements),
            EventType::OffBallRun => Some(&mut self.off_ball_runs),
            EventType::Other(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.player_possession.len()
            + self.passing_options.len()
            + self.on_ball_engagements.len()
            + self.off_ball_runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Frame number to the events whose interval contains it.
///
/// Each event is stored once and referenced from every frame it spans, so
/// each frame during playback costs one hash lookup.
#[derive(Debug, Clone, Default)]
pub struct FrameEventIndex {
    frames: HashMap<u32, FrameEvents>,
    empty: FrameEvents,
    indexed_events: usize,
}

impl FrameEventIndex {
    /// Expands every categorized event over `[frame_start, frame_end]`.
    /// Any event with `frame_start > frame_end` fails the whole build.
    pub fn build(events: &[Arc<MatchEvent>]) -> Result<Self> {
        if let Some(bad) = events.iter().find(|e| e.frame_start > e.frame_end) {
            return Err(ReplayError::DataIntegrity(format!(
                "event {} ({}) has frame_start {} > frame_end {}",
                bad.event_id, bad.event_type, bad.frame_start, bad.frame_end
            )));
        }

        let mut frames: HashMap<u32, FrameEvents> = HashMap::new();
        let mut indexed_events = 0usize;
        for event in events {
            if matches!(event.event_type, EventType::Other(_)) {
                continue;
            }
            indexed_events += 1;
            for frame in event.frame_start..=event.frame_end {
                if let Some(list) = frames.entry(frame).or_default().category_mut(&event.event_type) {
                    list.push(Arc::clone(event));
                }
            }
        }

        Ok(Self {
            frames,
            empty: FrameEvents::default(),
            indexed_events,
        })
    }

    /// Events at `frame`. A frame nobody spans yields all-empty lists.
    pub fn get(&self, frame: u32) -> &FrameEvents {
        self.frames.get(&frame).unwrap_or(&self.empty)
    }

    /// Number of frames with at least one event.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Number of categorized events that were expanded.
    pub fn indexed_events(&self) -> usize {
        self.indexed_events
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::FrameEventIndex;
    use crate::events::{EventType, MatchEvent};

    #[test]
    fn uncategorized_events_are_not_indexed() {
        let events = vec![
            Arc::new(MatchEvent::new("a", EventType::Other("pressure".into()), 1, 3)),
            Arc::new(MatchEvent::new("b", EventType::PassingOption, 2, 2).with_player(4)),
        ];
        let index = FrameEventIndex::build(&events).expect("valid intervals");
        assert_eq!(index.indexed_events(), 1);
        assert_eq!(index.frame_count(), 1);
        assert!(index.get(1).is_empty());
        assert_eq!(index.get(2).passing_options.len(), 1);
    }

    #[test]
    fn single_frame_interval_is_inclusive() {
        let events = vec![Arc::new(
            MatchEvent::new("p", EventType::PlayerPossession, 5, 5).with_player(1),
        )];
        let index = FrameEventIndex::build(&events).expect("valid intervals");
        assert_eq!(index.get(5).player_possession.len(), 1);
        assert!(index.get(4).is_empty());
        assert!(index.get(6).is_empty());
    }
}
