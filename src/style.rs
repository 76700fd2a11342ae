use std::collections::HashMap;

use serde::Serialize;

use crate::config::RendererConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerShape {
    Circle,
    Square,
}

/// Which highlight a marker draws. Layers stack in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerLayer {
    Regular,
    PassingOption,
    Engagement,
    Possession,
    RunStart,
    Ball,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub layer: MarkerLayer,
    pub shape: MarkerShape,
    pub fill: String,
    pub edge_color: String,
    pub edge_width: f64,
    pub size: f64,
    pub opacity: f64,
    pub z_order: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineStyle {
    pub color: String,
    pub width: f64,
    pub dash: String,
    pub z_order: i32,
}

/// Team name to fill color. Teams are sorted by name and colored
/// round-robin, so a team keeps its color after switching sides.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamPalette {
    colors: HashMap<String, String>,
    fallback: String,
}

impl TeamPalette {
    pub fn new(teams: &[String], colors: &[String]) -> Self {
        let fallback = colors.first().cloned().unwrap_or_else(|| "grey".to_string());
        let mut sorted: Vec<&String> = teams.iter().collect();
        sorted.sort();
        sorted.dedup();
        let colors = if colors.is_empty() {
            HashMap::new()
        } else {
            sorted
                .into_iter()
                .enumerate()
                .map(|(idx, team)| (team.clone(), colors[idx % colors.len()].clone()))
                .collect()
        };
        Self { colors, fallback }
    }

    pub fn color(&self, team: &str) -> &str {
        self.colors.get(team).unwrap_or(&self.fallback)
    }
}

/// Which tag sets a player belongs to in one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlayerTags {
    pub possession: bool,
    pub passing_option: bool,
    pub engaged: bool,
    pub running: bool,
}

/// Highest-priority highlight of a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Emphasis {
    Regular,
    PassingOption,
    Engaged,
    Possession,
}

impl PlayerTags {
    /// Untagged by possession, passing option and engagement. Runs do not
    /// take a player out of the regular bucket.
    pub fn is_regular(&self) -> bool {
        !(self.possession || self.passing_option || self.engaged)
    }

    pub fn emphasis(&self) -> Emphasis {
        if self.possession {
            Emphasis::Possession
        } else if self.engaged {
            Emphasis::Engaged
        } else if self.passing_option {
            Emphasis::PassingOption
        } else {
            Emphasis::Regular
        }
    }
}

/// Marker layers for one player, bottom to top. Disabled highlight
/// categories draw nothing, which can leave a tagged player without any
/// marker.
pub fn player_markers(
    tags: &PlayerTags,
    is_gk: bool,
    team_color: &str,
    config: &RendererConfig,
) -> Vec<Marker> {
    let base = &config.players.styling;
    let events = &config.players.events;
    let shape = if is_gk {
        MarkerShape::Square
    } else {
        MarkerShape::Circle
    };
    let marker = |layer, edge_color: &str, edge_width, size, opacity, z_order| Marker {
        layer,
        shape,
        fill: team_color.to_string(),
        edge_color: edge_color.to_string(),
        edge_width,
        size,
        opacity,
        z_order,
    };

    let mut out = Vec::new();
    if tags.is_regular() {
        out.push(marker(
            MarkerLayer::Regular,
            &base.edge_color,
            base.edge_width,
            base.size,
            base.alpha,
            base.z_order,
        ));
    }
    if tags.passing_option && events.passing_options.enabled {
        let s = &events.passing_options;
        out.push(marker(
            MarkerLayer::PassingOption,
            &s.edge_color,
            s.edge_width,
            base.size,
            base.alpha,
            s.z_order,
        ));
    }
    if tags.engaged && events.on_ball_engagement.enabled {
        let s = &events.on_ball_engagement;
        out.push(marker(
            MarkerLayer::Engagement,
            &s.edge_color,
            s.edge_width,
            base.size,
            base.alpha,
            s.z_order,
        ));
    }
    if tags.possession && events.possession.enabled {
        let s = &events.possession;
        out.push(marker(
            MarkerLayer::Possession,
            &s.edge_color,
            s.edge_width,
            base.size * s.size_multiplier,
            1.0,
            s.z_order,
        ));
    }
    out
}

pub fn ball_marker(config: &RendererConfig) -> Marker {
    let b = &config.ball;
    Marker {
        layer: MarkerLayer::Ball,
        shape: MarkerShape::Circle,
        fill: b.color.clone(),
        edge_color: b.edge_color.clone(),
        edge_width: b.edge_width,
        size: b.size,
        opacity: 1.0,
        z_order: b.z_order,
    }
}

pub fn run_start_marker(config: &RendererConfig) -> Marker {
    let run = &config.players.events.off_ball_runs;
    let base = &config.players.styling;
    Marker {
        layer: MarkerLayer::RunStart,
        shape: MarkerShape::Circle,
        fill: run.path_color.clone(),
        edge_color: base.edge_color.clone(),
        edge_width: base.edge_width,
        size: base.size / 2.0,
        opacity: run.alpha,
        z_order: run.z_order,
    }
}

pub fn run_path_style(config: &RendererConfig) -> LineStyle {
    let run = &config.players.events.off_ball_runs;
    LineStyle {
        color: run.path_color.clone(),
        width: run.path_width,
        dash: run.path_dash.clone(),
        z_order: run.path_z_order,
    }
}
