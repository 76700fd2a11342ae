mod common;

use match_replay::enrich::enrich;
use match_replay::error::ReplayError;
use match_replay::roster::{PlayDirection, parse_match_json};
use match_replay::tracking::parse_tracking_jsonl;

use common::{read_fixture, roster, row};

#[test]
fn joins_fixture_tracking_with_roster() {
    let rows = parse_tracking_jsonl(&read_fixture("1886347_tracking_extrapolated.jsonl"))
        .expect("fixture should parse");
    // Player 22 has no position in frame 11.
    assert_eq!(rows.len(), 16);

    let roster = parse_match_json(&read_fixture("1886347_match.json")).expect("roster");
    assert_eq!(roster.len(), 4);

    let tracking = enrich("1886347", rows, &roster).expect("join should succeed");
    assert_eq!(tracking.match_name(), "Alpha FC vs Beta United");
    assert_eq!(tracking.dropped_rows(), 1);
    assert!(!tracking.has_player(555));
    assert_eq!(tracking.frames_in(0, 100).collect::<Vec<_>>(), vec![10, 11, 12, 20]);
    assert_eq!(tracking.team_names(), vec!["Alpha FC", "Beta United"]);

    let frame_10 = tracking.rows_for_frame(10);
    let ids: Vec<u64> = frame_10.iter().map(|r| r.player_id).collect();
    assert_eq!(ids, vec![1, 7, 11, 22]);
    assert!(frame_10[0].is_gk);
    assert_eq!(frame_10[0].ball_x, Some(0.5));

    let wing = &frame_10[2];
    assert_eq!(wing.team_name, "Beta United");
    assert_eq!(wing.direction_1st_half, PlayDirection::RightToLeft);
    assert_eq!(wing.direction_for_period(), PlayDirection::RightToLeft);

    let wing_second_half = tracking
        .rows_for_frame(20)
        .iter()
        .find(|r| r.player_id == 11)
        .expect("player 11 at frame 20");
    assert_eq!(wing_second_half.direction_for_period(), PlayDirection::LeftToRight);
}

#[test]
fn duplicate_readings_keep_the_first() {
    let rows = vec![
        row(5, 1, 7, 1.0, 1.0),
        row(5, 1, 7, 9.0, 9.0),
        row(4, 1, 11, 2.0, 2.0),
    ];
    let tracking = enrich("42", rows, &roster()).expect("join");
    let frame_5 = tracking.rows_for_frame(5);
    assert_eq!(frame_5.len(), 1);
    assert_eq!(frame_5[0].x, 1.0);
    assert_eq!(tracking.first_frame(), Some(4));
    assert_eq!(tracking.last_frame(), Some(5));
}

#[test]
fn unknown_period_uses_default_direction() {
    let mut raw = row(3, 1, 11, 0.0, 0.0);
    raw.period = None;
    let tracking = enrich("42", vec![raw], &roster()).expect("join");
    assert_eq!(
        tracking.rows_for_frame(3)[0].direction_for_period(),
        PlayDirection::LeftToRight
    );
}

#[test]
fn nothing_rostered_is_not_found() {
    let err = enrich("42", vec![row(1, 1, 555, 0.0, 0.0)], &roster()).unwrap_err();
    assert!(matches!(err, ReplayError::DataNotFound(_)));
}

#[test]
fn inverted_frame_range_is_empty() {
    let tracking = enrich("42", common::frames(0..5, 1), &roster()).expect("join");
    assert_eq!(tracking.frames_in(4, 1).count(), 0);
    assert!(tracking.rows_for_frame(99).is_empty());
}
