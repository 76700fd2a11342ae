use std::fmt;

use thiserror::Error;

/// Where in the per-match pipeline a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    LoadTracking,
    LoadRoster,
    LoadEvents,
    Enrich,
    IndexEvents,
    ResolveFrame(u32),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::LoadTracking => f.write_str("load tracking"),
            Stage::LoadRoster => f.write_str("load roster"),
            Stage::LoadEvents => f.write_str("load events"),
            Stage::Enrich => f.write_str("enrich tracking"),
            Stage::IndexEvents => f.write_str("index events"),
            Stage::ResolveFrame(frame) => write!(f, "resolve frame {frame}"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("data not found: {0}")]
    DataNotFound(String),

    #[error("data integrity error: {0}")]
    DataIntegrity(String),

    #[error("source error: {0:#}")]
    Source(#[from] anyhow::Error),

    #[error("match {match_id}: {stage} failed: {source}")]
    Stage {
        match_id: String,
        stage: Stage,
        #[source]
        source: Box<ReplayError>,
    },
}

impl ReplayError {
    /// Wraps the error with the match and stage it came from. Already
    /// staged errors are returned untouched so context is not doubled.
    pub fn at(self, match_id: &str, stage: Stage) -> Self {
        match self {
            staged @ ReplayError::Stage { .. } => staged,
            other => ReplayError::Stage {
                match_id: match_id.to_string(),
                stage,
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, with stage context peeled off.
    pub fn root(&self) -> &ReplayError {
        match self {
            ReplayError::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether the caller can reasonably retry with another id or range.
    pub fn is_recoverable(&self) -> bool {
        match self.root() {
            ReplayError::DataNotFound(_) => true,
            ReplayError::Source(_) => true,
            ReplayError::Configuration(_) => false,
            ReplayError::DataIntegrity(_) => false,
            ReplayError::Stage { .. } => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReplayError>;

pub trait StageContext<T> {
    fn stage(self, match_id: &str, stage: Stage) -> Result<T>;
}

impl<T, E> StageContext<T> for std::result::Result<T, E>
where
    E: Into<ReplayError>,
{
    fn stage(self, match_id: &str, stage: Stage) -> Result<T> {
        self.map_err(|err| err.into().at(match_id, stage))
    }
}

#[cfg(test)]
mod tests {
    use super::{ReplayError, Stage, StageContext};

    #[test]
    fn stage_context_wraps_once() {
        let res: Result<(), ReplayError> =
            Err(ReplayError::DataIntegrity("frame_start 20 > frame_end 10".to_string()));
        let err = res
            .stage("1886347", Stage::IndexEvents)
            .stage("1886347", Stage::Enrich)
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("match 1886347: index events failed"));
        assert!(matches!(err.root(), ReplayError::DataIntegrity(_)));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn not_found_is_recoverable() {
        let err = ReplayError::DataNotFound("no frames in 10-20".to_string())
            .at("1", Stage::ResolveFrame(10));
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("resolve frame 10"));
    }
}
