use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

use match_replay::config::RendererConfig;
use match_replay::enrich::{EnrichedTracking, enrich};
use match_replay::events::{EventType, MatchEvent};
use match_replay::frame_index::FrameEventIndex;
use match_replay::resolve::resolve;
use match_replay::roster::{Roster, parse_match_json};
use match_replay::style::TeamPalette;
use match_replay::tracking::{BallReading, RawTrackingRow, parse_tracking_jsonl};

const FRAMES: u32 = 3_000;
const PLAYERS: u64 = 22;

fn roster() -> Roster {
    let players: Vec<String> = (1..=PLAYERS)
        .map(|id| {
            let team = if id <= 11 { 100 } else { 200 };
            let role = if id == 1 || id == 12 { "GK" } else { "CM" };
            format!(
                r#"{{"id": {id}, "short_name": "P{id}", "number": {id}, "team_id": {team},
                    "start_time": "00:00:00", "player_role": {{"acronym": "{role}"}}}}"#
            )
        })
        .collect();
    let raw = format!(
        r#"{{"id": 1, "home_team": {{"id": 100, "name": "Home"}},
            "away_team": {{"id": 200, "name": "Away"}},
            "home_team_side": ["left_to_right", "right_to_left"],
            "players": [{}]}}"#,
        players.join(",")
    );
    parse_match_json(&raw).expect("valid roster")
}

fn tracking_rows(rng: &mut StdRng) -> Vec<RawTrackingRow> {
    let mut rows = Vec::with_capacity((FRAMES as usize) * PLAYERS as usize);
    for frame in 0..FRAMES {
        let ball = BallReading {
            x: Some(rng.gen_range(-52.0..52.0)),
            y: Some(rng.gen_range(-34.0..34.0)),
            z: Some(0.0),
            is_detected: Some(true),
        };
        for player_id in 1..=PLAYERS {
            rows.push(RawTrackingRow {
                frame,
                timestamp: Some("00:10:00.00".to_string()),
                period: Some(if frame < FRAMES / 2 { 1 } else { 2 }),
                player_id,
                x: rng.gen_range(-52.0..52.0),
                y: rng.gen_range(-34.0..34.0),
                is_detected: Some(true),
                ball: ball.clone(),
                possession_player_id: None,
                possession_group: None,
            });
        }
    }
    rows
}

fn events(rng: &mut StdRng) -> Vec<Arc<MatchEvent>> {
    let types = [
        EventType::PlayerPossession,
        EventType::PassingOption,
        EventType::OnBallEngagement,
        EventType::OffBallRun,
    ];
    (0..2_000)
        .map(|i| {
            let start = rng.gen_range(0..FRAMES - 60);
            let end = start + rng.gen_range(0..60);
            let event = MatchEvent::new(format!("e{i}"), types[i % types.len()].clone(), start, end)
                .with_player(rng.gen_range(1..=PLAYERS))
                .with_start(rng.gen_range(-52.0..52.0), rng.gen_range(-34.0..34.0));
            Arc::new(event)
        })
        .collect()
}

fn prepared() -> (EnrichedTracking, Vec<Arc<MatchEvent>>) {
    let mut rng = StdRng::seed_from_u64(26);
    let tracking = enrich("1", tracking_rows(&mut rng), &roster()).expect("join");
    (tracking, events(&mut rng))
}

fn bench_index_build(c: &mut Criterion) {
    let (_, events) = prepared();
    c.bench_function("frame_index_build", |b| {
        b.iter(|| {
            let index = FrameEventIndex::build(black_box(&events)).unwrap();
            black_box(index.frame_count());
        })
    });
}

fn bench_enrich(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(26);
    let rows = tracking_rows(&mut rng);
    let roster = roster();
    c.bench_function("enrich_join", |b| {
        b.iter(|| {
            let tracking = enrich("1", black_box(rows.clone()), &roster).unwrap();
            black_box(tracking.frame_count());
        })
    });
}

fn bench_resolve_episode(c: &mut Criterion) {
    let (tracking, events) = prepared();
    let index = FrameEventIndex::build(&events).unwrap();
    let config = RendererConfig::default();
    let palette = TeamPalette::new(&tracking.team_names(), &config.teams.colors);
    c.bench_function("resolve_250_frames", |b| {
        b.iter(|| {
            for frame in 1_000..1_250 {
                let state = resolve(&tracking, &index, black_box(frame), &palette, &config).unwrap();
                black_box(state);
            }
        })
    });
}

fn bench_tracking_parse(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(26);
    let lines: Vec<String> = (0..500)
        .map(|frame| {
            let players: Vec<String> = (1..=PLAYERS)
                .map(|id| {
                    format!(
                        r#"{{"player_id": {id}, "x": {:.2}, "y": {:.2}, "is_detected": true}}"#,
                        rng.gen_range(-52.0f64..52.0),
                        rng.gen_range(-34.0f64..34.0)
                    )
                })
                .collect();
            format!(
                r#"{{"frame": {frame}, "timestamp": "00:00:10.00", "period": 1, "ball_data": {{"x": 1.0, "y": 2.0, "z": 0.0, "is_detected": true}}, "possession": {{"player_id": null, "group": null}}, "player_data": [{}]}}"#,
                players.join(",")
            )
        })
        .collect();
    let raw = lines.join("\n");
    c.bench_function("tracking_jsonl_parse", |b| {
        b.iter(|| {
            let rows = parse_tracking_jsonl(black_box(&raw)).unwrap();
            black_box(rows.len());
        })
    });
}

criterion_group!(
    perf,
    bench_index_build,
    bench_enrich,
    bench_resolve_episode,
    bench_tracking_parse
);
criterion_main!(perf);
