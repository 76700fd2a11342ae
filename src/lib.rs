pub mod cache;
pub mod config;
pub mod enrich;
pub mod episode;
pub mod error;
pub mod events;
pub mod frame_index;
pub mod http_cache;
pub mod http_client;
pub mod key_moments;
pub mod resolve;
pub mod roster;
pub mod source;
pub mod style;
pub mod tracking;

pub use cache::{MatchData, MatchDataCache};
pub use config::RendererConfig;
pub use episode::{EpisodeDescriptor, EpisodePlayer};
pub use error::{ReplayError, Result};
pub use resolve::FrameVisualState;
pub use source::{DirSource, HttpSource, MatchSource};
