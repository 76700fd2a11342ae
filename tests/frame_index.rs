mod common;

use std::sync::Arc;

use match_replay::error::ReplayError;
use match_replay::events::{EventType, MatchEvent, parse_events_csv};
use match_replay::frame_index::FrameEventIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use common::read_fixture;

const TYPES: [EventType; 4] = [
    EventType::PlayerPossession,
    EventType::PassingOption,
    EventType::OnBallEngagement,
    EventType::OffBallRun,
];

#[test]
fn every_event_is_listed_exactly_inside_its_interval() {
    let mut rng = StdRng::seed_from_u64(7);
    let events: Vec<Arc<MatchEvent>> = (0..200)
        .map(|i| {
            let start = rng.gen_range(0..500u32);
            let end = start + rng.gen_range(0..40u32);
            let event_type = TYPES[i % TYPES.len()].clone();
            Arc::new(MatchEvent::new(format!("e{i}"), event_type, start, end).with_player(i as u64))
        })
        .collect();
    let index = FrameEventIndex::build(&events).expect("valid intervals");

    for event in &events {
        for frame in event.frame_start.saturating_sub(3)..=event.frame_end + 3 {
            let listed = index
                .get(frame)
                .category(&event.event_type)
                .expect("categorized type")
                .iter()
                .any(|e| Arc::ptr_eq(e, event));
            assert_eq!(
                listed,
                event.spans(frame),
                "event {} at frame {frame}",
                event.event_id
            );
        }
    }
}

#[test]
fn lists_keep_input_order() {
    let events = vec![
        Arc::new(MatchEvent::new("b", EventType::PassingOption, 1, 4).with_player(2)),
        Arc::new(MatchEvent::new("a", EventType::PassingOption, 2, 3).with_player(1)),
    ];
    let index = FrameEventIndex::build(&events).expect("valid intervals");
    let ids: Vec<&str> = index
        .get(2)
        .passing_options
        .iter()
        .map(|e| e.event_id.as_str())
        .collect();
    assert_eq!(ids, vec!["b", "a"]);
}

#[test]
fn inverted_interval_fails_the_build() {
    let events = vec![
        Arc::new(MatchEvent::new("ok", EventType::PlayerPossession, 1, 2).with_player(1)),
        Arc::new(MatchEvent::new("bad", EventType::PlayerPossession, 20, 10).with_player(7)),
    ];
    let err = FrameEventIndex::build(&events).unwrap_err();
    match err {
        ReplayError::DataIntegrity(msg) => assert!(msg.contains("bad")),
        other => panic!("expected DataIntegrity, got {other:?}"),
    }
}

#[test]
fn indexes_fixture_events() {
    let events: Vec<Arc<MatchEvent>> = parse_events_csv(&read_fixture("1886347_dynamic_events.csv"))
        .expect("fixture should parse")
        .into_iter()
        .map(Arc::new)
        .collect();
    assert_eq!(events.len(), 6);
    assert_eq!(events[5].event_type, EventType::Other("pressing_chain".to_string()));

    let index = FrameEventIndex::build(&events).expect("valid intervals");
    assert_eq!(index.indexed_events(), 5);

    let frame_11 = index.get(11);
    assert_eq!(frame_11.player_possession.len(), 1);
    assert_eq!(frame_11.passing_options.len(), 1);
    assert_eq!(frame_11.on_ball_engagements.len(), 1);
    assert_eq!(frame_11.off_ball_runs.len(), 1);

    let frame_15 = index.get(15);
    assert!(frame_15.player_possession.is_empty());
    assert_eq!(frame_15.off_ball_runs[0].event_id, "run1");
    assert!(index.get(21).is_empty());
}
