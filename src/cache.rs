use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use once_cell::sync::OnceCell;
use tracing::{debug, info};

use crate::enrich::{EnrichedTracking, enrich};
use crate::error::{ReplayError, Result, Stage, StageContext};
use crate::events::MatchEvent;
use crate::frame_index::FrameEventIndex;
use crate::source::MatchSource;

/// Everything derived from one match, built once and shared read-only.
#[derive(Debug)]
pub struct MatchData {
    pub match_id: String,
    pub tracking: EnrichedTracking,
    pub events: Vec<Arc<MatchEvent>>,
    pub index: FrameEventIndex,
    /// Team names sorted, for stable color assignment.
    pub teams: Vec<String>,
}

type Slot = Arc<OnceCell<Arc<MatchData>>>;

/// Per-match memo of [`MatchData`]. Concurrent callers asking for the same
/// match wait on one build; different matches build in parallel.
pub struct MatchDataCache {
    source: Box<dyn MatchSource>,
    slots: RwLock<HashMap<String, Slot>>,
    builds: AtomicUsize,
}

impl MatchDataCache {
    pub fn new(source: impl MatchSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            slots: RwLock::new(HashMap::new()),
            builds: AtomicUsize::new(0),
        }
    }

    pub fn get_or_build(&self, match_id: &str) -> Result<Arc<MatchData>> {
        let match_id = match_id.trim();
        if match_id.is_empty() {
            return Err(ReplayError::Configuration("match_id is empty".to_string()));
        }

        let slot = self.slot(match_id);
        let result = slot
            .get_or_try_init(|| self.build(match_id).map(Arc::new))
            .map(Arc::clone);
        if result.is_err() {
            self.evict_failed(match_id, &slot);
        }
        result
    }

    /// Number of builds started since creation. Cache hits do not count.
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    /// Drops one match, or everything when `match_id` is `None`.
    pub fn clear(&self, match_id: Option<&str>) {
        let mut slots = match self.slots.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match match_id {
            Some(id) => {
                slots.remove(id.trim());
            }
            None => slots.clear(),
        }
    }

    pub fn contains(&self, match_id: &str) -> bool {
        let slots = match self.slots.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        slots
            .get(match_id.trim())
            .is_some_and(|slot| slot.get().is_some())
    }

    /// Matches with a finished build.
    pub fn len(&self) -> usize {
        let slots = match self.slots.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        slots.values().filter(|slot| slot.get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, match_id: &str) -> Slot {
        {
            let slots = match self.slots.read() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Some(slot) = slots.get(match_id) {
                return Arc::clone(slot);
            }
        }
        let mut slots = match self.slots.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(slots.entry(match_id.to_string()).or_default())
    }

    fn evict_failed(&self, match_id: &str, slot: &Slot) {
        let mut slots = match self.slots.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Keep the slot while another caller holds it; a waiter retries the
        // build on the same cell. The map and `slot` account for two.
        if let Some(current) = slots.get(match_id) {
            if Arc::ptr_eq(current, slot)
                && Arc::strong_count(slot) == 2
                && current.get().is_none()
            {
                slots.remove(match_id);
            }
        }
    }

    fn build(&self, match_id: &str) -> Result<MatchData> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        info!(match_id, "building match data");

        let source = self.source.as_ref();
        let (tracking, (roster, events)) = rayon::join(
            || source.load_tracking(match_id),
            || {
                rayon::join(
                    || source.load_roster(match_id),
                    || source.load_events(match_id),
                )
            },
        );
        let tracking = tracking.stage(match_id, Stage::LoadTracking)?;
        let roster = roster.stage(match_id, Stage::LoadRoster)?;
        let events: Vec<Arc<MatchEvent>> = events
            .stage(match_id, Stage::LoadEvents)?
            .into_iter()
            .map(Arc::new)
            .collect();

        let raw_rows = tracking.len();
        let tracking = enrich(match_id, tracking, &roster).stage(match_id, Stage::Enrich)?;
        let index = FrameEventIndex::build(&events).stage(match_id, Stage::IndexEvents)?;
        let teams = tracking.team_names();

        debug!(
            match_id,
            raw_rows,
            dropped_rows = tracking.dropped_rows(),
            "tracking joined with roster"
        );
        info!(
            match_id,
            frames = tracking.frame_count(),
            events = events.len(),
            indexed_events = index.indexed_events(),
            indexed_frames = index.frame_count(),
            "match data ready"
        );

        Ok(MatchData {
            match_id: match_id.to_string(),
            tracking,
            events,
            index,
            teams,
        })
    }
}
