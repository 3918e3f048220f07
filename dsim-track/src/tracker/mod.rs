// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! The [`Track`] interface and the trackers that implement it.
//!
//! A simulated system logs from one thread per node, so every tracker is
//! shared as a [`Tracker`] and takes `&self` in all of its methods.

/// Include the /dev/null tracker.
pub mod dev_null;
/// Include the multi-tracker.
pub mod multi_tracker;
/// Include the text-based tracker.
pub mod text;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

pub use dev_null::DevNullTracker;
pub use multi_tracker::MultiTracker;
use regex::Regex;
pub use text::TextTracker;
use thiserror::Error;

use crate::{Id, ROOT};

/// A tracker could not be built from its configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TrackConfigError(pub String);

/// Events that every [`Tracker`] accepts.
pub trait Track {
    /// Allocate an [`Id`] no other entity or object of this tracker has.
    fn unique_id(&self) -> Id;

    /// Whether entity `id` emits events at `level`.
    fn is_entity_enabled(&self, id: Id, level: log::Level) -> bool;

    /// Register the full name of entity `id` so filters can apply to it.
    fn add_entity(&self, id: Id, entity_name: &str);

    /// Object `enter_obj` arrived at `enter_into`.
    fn enter(&self, enter_into: Id, enter_obj: Id);

    /// Object `exit_obj` left `exit_from`.
    fn exit(&self, exit_from: Id, exit_obj: Id);

    /// `created_by` created `created_obj`.
    fn create(&self, created_by: Id, created_obj: Id, num_bytes: usize, req_type: i8, name: &str);

    /// `destroyed_by` destroyed `destroyed_obj`.
    fn destroy(&self, destroyed_by: Id, destroyed_obj: Id);

    /// `connect_from` was wired to `connect_to`.
    fn connect(&self, connect_from: Id, connect_to: Id);

    /// A log message from `msg_by`.
    fn log(&self, msg_by: Id, level: log::Level, msg: std::fmt::Arguments);

    /// Flush anything buffered before the program exits.
    fn shutdown(&self);
}

/// A [`Track`] shared by every entity and every node thread.
pub type Tracker = Arc<dyn Track + Send + Sync>;

/// Create a [`Tracker`] that suppresses all track events.
#[must_use]
pub fn dev_null_tracker() -> Tracker {
    Arc::new(DevNullTracker {})
}

/// Pattern on full entity names (`top::system::node3`) and the level it sets.
struct LevelFilter {
    pattern: Regex,
    level: log::Level,
}

/// Decides which entities emit events at which level and hands out [`Id`]s.
///
/// Levels are resolved once, when an entity registers its full name. Only
/// entities whose level differs from the default are remembered, so the
/// lookup made for every event stays small even with many nodes.
pub struct EntityManager {
    default_level: log::Level,

    /// Checked in the order they were added.
    filters: Vec<LevelFilter>,

    next_id: AtomicU64,

    overrides: RwLock<HashMap<Id, log::Level>>,
}

impl EntityManager {
    /// An [`EntityManager`] with every entity at `default_level`.
    #[must_use]
    pub fn new(default_level: log::Level) -> Self {
        Self {
            default_level,
            filters: Vec::new(),
            next_id: AtomicU64::new(ROOT.0 + 1),
            overrides: RwLock::new(HashMap::new()),
        }
    }

    fn unique_id(&self) -> Id {
        Id(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn level_of(&self, id: Id) -> log::Level {
        self.overrides
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .copied()
            .unwrap_or(self.default_level)
    }

    fn is_log_enabled_at_level(&self, id: Id, level: log::Level) -> bool {
        level <= self.level_of(id)
    }

    fn add_entity(&self, id: Id, entity_name: &str) {
        let level = self.level_for_name(entity_name);
        if level != self.default_level {
            self.overrides
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(id, level);
        }
    }

    fn level_for_name(&self, entity_name: &str) -> log::Level {
        self.filters
            .iter()
            .find(|filter| filter.pattern.is_match(entity_name))
            .map_or(self.default_level, |filter| filter.level)
    }

    /// Set every entity whose full name matches `regex_str` to `level`.
    ///
    /// When several filters match a name the one added first applies.
    ///
    /// # Example
    ///
    /// ```rust
    /// use dsim_track::tracker::EntityManager;
    /// let mut manager = EntityManager::new(log::Level::Warn);
    /// manager.add_entity_level_filter(".*node0$", log::Level::Trace).unwrap();
    /// ```
    pub fn add_entity_level_filter(
        &mut self,
        regex_str: &str,
        level: log::Level,
    ) -> Result<(), TrackConfigError> {
        let pattern = Regex::new(regex_str)
            .map_err(|e| TrackConfigError(format!("Invalid entity filter {regex_str}: {e}")))?;
        self.filters.push(LevelFilter { pattern, level });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use log::Level;

    use super::*;

    const PATHS: [&str; 4] = [
        "top",
        "top::system",
        "top::system::node0",
        "top::system::node1",
    ];

    fn levels(manager: &EntityManager) -> Vec<Level> {
        PATHS.iter().map(|p| manager.level_for_name(p)).collect()
    }

    fn manager_with(default_level: Level, filters: &[(&str, Level)]) -> EntityManager {
        let mut manager = EntityManager::new(default_level);
        for (regex, level) in filters {
            manager.add_entity_level_filter(regex, *level).unwrap();
        }
        manager
    }

    #[test]
    fn default_level_without_filters() {
        let manager = manager_with(Level::Error, &[]);
        assert_eq!(levels(&manager), [Level::Error; 4]);
    }

    #[test]
    fn filters_select_by_full_name() {
        let system = manager_with(Level::Error, &[(r"::system", Level::Trace)]);
        assert_eq!(
            levels(&system),
            [Level::Error, Level::Trace, Level::Trace, Level::Trace]
        );

        let node0 = manager_with(Level::Warn, &[(r"node0$", Level::Error)]);
        assert_eq!(
            levels(&node0),
            [Level::Warn, Level::Warn, Level::Error, Level::Warn]
        );
    }

    #[test]
    fn earliest_filter_applies() {
        let manager = manager_with(
            Level::Error,
            &[
                (r"node0$", Level::Info),
                (r"::system", Level::Trace),
                (r"^top", Level::Warn),
            ],
        );
        assert_eq!(
            levels(&manager),
            [Level::Warn, Level::Trace, Level::Info, Level::Trace]
        );
    }

    #[test]
    fn registered_nodes_keep_their_level() {
        let manager = manager_with(Level::Warn, &[(r"node1$", Level::Debug)]);
        let node0 = manager.unique_id();
        let node1 = manager.unique_id();
        manager.add_entity(node0, PATHS[2]);
        manager.add_entity(node1, PATHS[3]);

        assert!(manager.is_log_enabled_at_level(node0, Level::Warn));
        assert!(!manager.is_log_enabled_at_level(node0, Level::Debug));
        assert!(manager.is_log_enabled_at_level(node1, Level::Debug));
        assert!(!manager.is_log_enabled_at_level(node1, Level::Trace));

        // Only the node that differs from the default is remembered.
        assert_eq!(manager.overrides.read().unwrap().len(), 1);
    }

    #[test]
    fn invalid_filter_is_reported() {
        let mut manager = EntityManager::new(Level::Error);
        let err = manager
            .add_entity_level_filter(r"node[", Level::Info)
            .unwrap_err();
        assert!(err.to_string().starts_with("Invalid entity filter node["));
    }

    #[test]
    fn ids_start_after_root() {
        let manager = EntityManager::new(Level::Error);
        let ids: Vec<Id> = (0..3).map(|_| manager.unique_id()).collect();
        assert_eq!(ids, [Id(ROOT.0 + 1), Id(ROOT.0 + 2), Id(ROOT.0 + 3)]);
    }
}
