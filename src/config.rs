//! Typed renderer configuration.
//!
//! Defaults live in `Default` impls. User files carry a partial
//! [`RendererConfigPatch`] that is deep-merged over the defaults: every value
//! present in the patch wins, every absent value keeps the default.

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{ReplayError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct RendererConfig {
    pub players: PlayersConfig,
    pub ball: BallStyle,
    pub teams: TeamsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct PlayersConfig {
    pub styling: PlayerStyling,
    pub events: EventStyles,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerStyling {
    pub size: f64,
    pub alpha: f64,
    pub edge_color: String,
    pub edge_width: f64,
    pub z_order: i32,
}

impl Default for PlayerStyling {
    fn default() -> Self {
        Self {
            size: 14.0,
            alpha: 0.95,
            edge_color: "white".to_string(),
            edge_width: 1.5,
            z_order: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventStyles {
    pub possession: PossessionStyle,
    pub passing_options: HighlightStyle,
    pub on_ball_engagement: HighlightStyle,
    pub off_ball_runs: RunStyle,
}

impl Default for EventStyles {
    fn default() -> Self {
        Self {
            possession: PossessionStyle::default(),
            passing_options: HighlightStyle {
                enabled: true,
                edge_color: "yellow".to_string(),
                edge_width: 2.5,
                z_order: 11,
            },
            on_ball_engagement: HighlightStyle {
                enabled: true,
                edge_color: "black".to_string(),
                edge_width: 2.5,
                z_order: 11,
            },
            off_ball_runs: RunStyle::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighlightStyle {
    pub enabled: bool,
    pub edge_color: String,
    pub edge_width: f64,
    pub z_order: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PossessionStyle {
    pub enabled: bool,
    pub edge_color: String,
    pub edge_width: f64,
    pub size_multiplier: f64,
    pub z_order: i32,
}

impl Default for PossessionStyle {
    fn default() -> Self {
        Self {
            enabled: true,
            edge_color: "white".to_string(),
            edge_width: 3.0,
            size_multiplier: 1.3,
            z_order: 12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunStyle {
    pub enabled: bool,
    pub path_color: String,
    pub path_dash: String,
    pub path_width: f64,
    pub path_z_order: i32,
    pub alpha: f64,
    pub z_order: i32,
}

impl Default for RunStyle {
    fn default() -> Self {
        Self {
            enabled: true,
            path_color: "#E5BA21".to_string(),
            path_dash: "dash".to_string(),
            path_width: 2.0,
            path_z_order: 8,
            alpha: 0.55,
            z_order: 9,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BallStyle {
    pub color: String,
    pub size: f64,
    pub edge_color: String,
    pub edge_width: f64,
    pub z_order: i32,
}

impl Default for BallStyle {
    fn default() -> Self {
        Self {
            color: "white".to_string(),
            size: 8.0,
            edge_color: "black".to_string(),
            edge_width: 2.0,
            z_order: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamsConfig {
    pub colors: Vec<String>,
}

impl Default for TeamsConfig {
    fn default() -> Self {
        Self {
            colors: vec!["#084D42".to_string(), "#E51717".to_string()],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RendererConfigPatch {
    pub players: Option<PlayersPatch>,
    pub ball: Option<BallPatch>,
    pub teams: Option<TeamsPatch>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlayersPatch {
    pub styling: Option<PlayerStylingPatch>,
    pub events: Option<EventStylesPatch>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlayerStylingPatch {
    pub size: Option<f64>,
    pub alpha: Option<f64>,
    #[serde(alias = "edgecolors")]
    pub edge_color: Option<String>,
    pub edge_width: Option<f64>,
    pub z_order: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EventStylesPatch {
    pub possession: Option<PossessionPatch>,
    pub passing_options: Option<HighlightPatch>,
    pub on_ball_engagement: Option<HighlightPatch>,
    pub off_ball_runs: Option<RunPatch>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HighlightPatch {
    pub enabled: Option<bool>,
    pub edge_color: Option<String>,
    pub edge_width: Option<f64>,
    pub z_order: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PossessionPatch {
    pub enabled: Option<bool>,
    pub edge_color: Option<String>,
    pub edge_width: Option<f64>,
    pub size_multiplier: Option<f64>,
    pub z_order: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunPatch {
    pub enabled: Option<bool>,
    pub path_color: Option<String>,
    #[serde(alias = "path_style")]
    pub path_dash: Option<String>,
    pub path_width: Option<f64>,
    pub path_z_order: Option<i32>,
    pub alpha: Option<f64>,
    pub z_order: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BallPatch {
    pub color: Option<String>,
    pub size: Option<f64>,
    pub edge_color: Option<String>,
    pub edge_width: Option<f64>,
    pub z_order: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TeamsPatch {
    pub colors: Option<Vec<String>>,
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

impl RendererConfig {
    /// Defaults, optionally overlaid with the patch stored at `path`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(path) = path {
            config.merge(RendererConfigPatch::from_file(path)?);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn merged(mut self, patch: RendererConfigPatch) -> Self {
        self.merge(patch);
        self
    }

    pub fn merge(&mut self, patch: RendererConfigPatch) {
        if let Some(players) = patch.players {
            if let Some(styling) = players.styling {
                let s = &mut self.players.styling;
                set(&mut s.size, styling.size);
                set(&mut s.alpha, styling.alpha);
                set(&mut s.edge_color, styling.edge_color);
                set(&mut s.edge_width, styling.edge_width);
                set(&mut s.z_order, styling.z_order);
            }
            if let Some(events) = players.events {
                self.players.events.merge(events);
            }
        }
        if let Some(ball) = patch.ball {
            let b = &mut self.ball;
            set(&mut b.color, ball.color);
            set(&mut b.size, ball.size);
            set(&mut b.edge_color, ball.edge_color);
            set(&mut b.edge_width, ball.edge_width);
            set(&mut b.z_order, ball.z_order);
        }
        if let Some(teams) = patch.teams {
            set(&mut self.teams.colors, teams.colors);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.teams.colors.is_empty() {
            return Err(ReplayError::Configuration(
                "teams.colors must not be empty".to_string(),
            ));
        }
        if self.players.styling.size <= 0.0 {
            return Err(ReplayError::Configuration(
                "players.styling.size must be positive".to_string(),
            ));
        }
        if self.players.events.possession.size_multiplier <= 0.0 {
            return Err(ReplayError::Configuration(
                "players.events.possession.size_multiplier must be positive".to_string(),
            ));
        }
        if self.ball.size <= 0.0 {
            return Err(ReplayError::Configuration(
                "ball.size must be positive".to_string(),
            ));
        }
        for (name, alpha) in [
            ("players.styling.alpha", self.players.styling.alpha),
            ("players.events.off_ball_runs.alpha", self.players.events.off_ball_runs.alpha),
        ] {
            if !(0.0..=1.0).contains(&alpha) {
                return Err(ReplayError::Configuration(format!(
                    "{name} must be between 0.0 and 1.0"
                )));
            }
        }
        Ok(())
    }
}

impl EventStyles {
    fn merge(&mut self, patch: EventStylesPatch) {
        if let Some(p) = patch.possession {
            let s = &mut self.possession;
            set(&mut s.enabled, p.enabled);
            set(&mut s.edge_color, p.edge_color);
            set(&mut s.edge_width, p.edge_width);
            set(&mut s.size_multiplier, p.size_multiplier);
            set(&mut s.z_order, p.z_order);
        }
        if let Some(p) = patch.passing_options {
            self.passing_options.merge(p);
        }
        if let Some(p) = patch.on_ball_engagement {
            self.on_ball_engagement.merge(p);
        }
        if let Some(p) = patch.off_ball_runs {
            let s = &mut self.off_ball_runs;
            set(&mut s.enabled, p.enabled);
            set(&mut s.path_color, p.path_color);
            set(&mut s.path_dash, p.path_dash);
            set(&mut s.path_width, p.path_width);
            set(&mut s.path_z_order, p.path_z_order);
            set(&mut s.alpha, p.alpha);
            set(&mut s.z_order, p.z_order);
        }
    }
}

impl HighlightStyle {
    fn merge(&mut self, patch: HighlightPatch) {
        set(&mut self.enabled, patch.enabled);
        set(&mut self.edge_color, patch.edge_color);
        set(&mut self.edge_width, patch.edge_width);
        set(&mut self.z_order, patch.z_order);
    }
}

impl RendererConfigPatch {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|err| ReplayError::Configuration(format!("invalid renderer config: {err}")))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read renderer config {}", path.display()))?;
        Self::from_json(&raw)
    }
}
