use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use match_replay::cache::MatchDataCache;
use match_replay::config::RendererConfig;
use match_replay::episode::{EpisodeDescriptor, EpisodePlayer};
use match_replay::key_moments::{
    Aggregation, EventColumn, KeyMomentsConfig, KeyMomentsFinder, by_possession_chain,
};
use match_replay::resolve::FrameVisualState;
use match_replay::source::{DirSource, HttpSource, MatchSource};

/// Frame-by-frame replay of tracked soccer matches
#[derive(Parser, Debug)]
#[command(name = "match_replay", version, about)]
struct Cli {
    /// Local open-data checkout; matches are fetched over HTTP when unset
    #[arg(long, env = "REPLAY_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a frame range of one match
    Episode {
        #[arg(long)]
        match_id: String,
        #[arg(long)]
        start: u32,
        #[arg(long)]
        end: u32,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Resolve an episode saved as `{"episode_data": {...}}`
    Saved {
        #[arg(long)]
        episode: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// List possession chains that led to a shot
    Moments {
        #[arg(long)]
        match_id: String,
        #[arg(long, default_value_t = 0)]
        start_buffer: u32,
        #[arg(long, default_value_t = 0)]
        end_buffer: u32,
        /// Print saved-episode documents instead of summaries
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Renderer config patch (JSON)
    #[arg(long, env = "REPLAY_RENDERER_CONFIG")]
    config: Option<PathBuf>,
    /// One JSON object per frame
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Episode {
            match_id,
            start,
            end,
            output,
        } => {
            let cache = MatchDataCache::new(source(cli.data_dir.as_ref()));
            let player = player(&cache, &output)?;
            let states = player.play_episode(&match_id, start, end)?;
            print_states(&states, output.json)
        }
        Command::Saved { episode, output } => {
            let descriptor = EpisodeDescriptor::from_file(&episode)?;
            info!(
                match_id = %descriptor.match_id,
                start = descriptor.frame_start,
                end = descriptor.frame_end,
                "playing saved episode"
            );
            let cache = MatchDataCache::new(source(cli.data_dir.as_ref()));
            let player = player(&cache, &output)?;
            let states = player.play_descriptor(&descriptor)?;
            print_states(&states, output.json)
        }
        Command::Moments {
            match_id,
            start_buffer,
            end_buffer,
            json,
        } => {
            let source = source(cli.data_dir.as_ref());
            let config = KeyMomentsConfig::new(match_id)
                .with_buffers(start_buffer, end_buffer)
                .aggregate(EventColumn::FrameStart, Aggregation::Min)
                .aggregate(EventColumn::FrameEnd, Aggregation::Max)
                .aggregate(EventColumn::LeadToShot, Aggregation::Any)
                .aggregate(EventColumn::LeadToGoal, Aggregation::Any);
            let moments = KeyMomentsFinder::new(source.as_ref())
                .find(&config, by_possession_chain)?;

            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            for moment in moments
                .iter()
                .filter(|m| m.value(EventColumn::LeadToShot, Aggregation::Any) == Some(1.0))
            {
                let goal = shot_flag(moment.value(EventColumn::LeadToGoal, Aggregation::Any));
                if json {
                    writeln!(out, "{}", moment.episode()?.to_json()?)?;
                } else {
                    writeln!(
                        out,
                        "{}  frames {}-{}  goal={}",
                        moment.sequence_id,
                        fmt_frame(moment.frame_start),
                        fmt_frame(moment.frame_end),
                        goal
                    )?;
                }
            }
            out.flush()?;
            Ok(())
        }
    }
}

fn source(data_dir: Option<&PathBuf>) -> Box<dyn MatchSource> {
    match data_dir {
        Some(dir) => Box::new(DirSource::new(dir.clone())),
        None => Box::new(HttpSource::default()),
    }
}

fn player<'a>(cache: &'a MatchDataCache, output: &OutputArgs) -> Result<EpisodePlayer<'a>> {
    let config = RendererConfig::load(output.config.as_deref())?;
    EpisodePlayer::new(cache, config).context("invalid renderer config")
}

fn print_states(states: &[FrameVisualState], json: bool) -> Result<()> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for state in states {
        if json {
            serde_json::to_writer(&mut out, state).context("serialize frame")?;
            writeln!(out)?;
            continue;
        }
        let highlighted = state.players.iter().filter(|p| !p.is_regular()).count();
        let possession = state
            .possession_player_id
            .and_then(|id| state.player(id))
            .map(|p| p.short_name.as_str())
            .unwrap_or("-");
        writeln!(
            out,
            "{}  players={} highlighted={} runs={} possession={}",
            state.title(),
            state.players.len(),
            highlighted,
            state.trajectories.len(),
            possession
        )?;
    }
    out.flush()?;
    Ok(())
}

fn fmt_frame(frame: Option<u32>) -> String {
    frame.map(|f| f.to_string()).unwrap_or_else(|| "?".to_string())
}

fn shot_flag(value: Option<f64>) -> bool {
    value == Some(1.0)
}
