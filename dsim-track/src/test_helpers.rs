// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Record track events in memory so tests can check them.
//!
//! Each test creates its own [`TestTracker`] with [`test_init`](crate::test_init),
//! so tests can run in parallel. Events reach the tracker in whatever order
//! the node threads produce them, but the events of any one entity keep
//! their order; [`TestTracker::lines_by`] gives those.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use regex::Regex;

use crate::{Id, Track};

/// One event as text, and the entity that emitted it.
struct Recorded {
    by: Id,
    line: String,
}

/// A tracker that keeps every event in memory.
pub struct TestTracker {
    recorded: Mutex<Vec<Recorded>>,
    names: Mutex<HashMap<String, Id>>,
    next_id: AtomicU64,
}

impl TestTracker {
    /// A tracker whose first allocated [`Id`] is `initial_id`.
    #[must_use]
    pub fn new(initial_id: u64) -> Self {
        Self {
            recorded: Mutex::new(Vec::new()),
            names: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(initial_id),
        }
    }

    fn recorded(&self) -> MutexGuard<'_, Vec<Recorded>> {
        self.recorded.lock().unwrap()
    }

    fn record(&self, by: Id, line: String) {
        println!("{line}");
        self.recorded().push(Recorded { by, line });
    }

    /// Number of recorded events matching `regex_str`.
    #[must_use]
    pub fn count_matching(&self, regex_str: &str) -> usize {
        let re = Regex::new(regex_str).unwrap();
        self.recorded()
            .iter()
            .filter(|event| re.is_match(&event.line))
            .count()
    }

    /// Events emitted by entity `id`, oldest first.
    #[must_use]
    pub fn lines_by(&self, id: Id) -> Vec<String> {
        self.recorded()
            .iter()
            .filter(|event| event.by == id)
            .map(|event| event.line.clone())
            .collect()
    }

    /// The [`Id`] of the entity registered as `full_name`.
    #[must_use]
    pub fn entity_id(&self, full_name: &str) -> Option<Id> {
        self.names.lock().unwrap().get(full_name).copied()
    }
}

impl Track for TestTracker {
    fn unique_id(&self) -> Id {
        Id(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn is_entity_enabled(&self, _id: Id, _level: log::Level) -> bool {
        true
    }

    fn add_entity(&self, id: Id, entity_name: &str) {
        self.names
            .lock()
            .unwrap()
            .insert(entity_name.to_string(), id);
    }

    fn enter(&self, id: Id, item: Id) {
        self.record(id, format!("{id}: {item} entered"));
    }

    fn exit(&self, id: Id, item: Id) {
        self.record(id, format!("{id}: {item} exited"));
    }

    fn create(&self, created_by: Id, id: Id, num_bytes: usize, req_type: i8, name: &str) {
        self.record(
            created_by,
            format!("{created_by}: created {id}, {name}, {req_type}, {num_bytes} bytes"),
        );
    }

    fn destroy(&self, destroyed_by: Id, id: Id) {
        self.record(destroyed_by, format!("{destroyed_by}: destroyed {id}"));
    }

    fn connect(&self, connect_from: Id, connect_to: Id) {
        self.record(connect_from, format!("{connect_from}: connect to {connect_to}"));
    }

    fn log(&self, id: Id, level: log::Level, msg: std::fmt::Arguments) {
        self.record(id, format!("{id}:{level}: {msg}"));
    }

    fn shutdown(&self) {}
}

/// Create a [`TestTracker`] whose first [`Id`] is `start_id`.
///
/// Gives back the tracker twice: as the concrete [`TestTracker`] for checking
/// and as a [`Tracker`](crate::Tracker) for the code under test.
///
/// # Examples
///
/// ```
/// use dsim_track::test_helpers;
///
/// let (test_tracker, tracker) = dsim_track::test_init!(10);
/// let top = dsim_track::entity::toplevel(&tracker, "top");
/// test_helpers::check_and_clear(&test_tracker, &["0: created 10, top, 0, 0 bytes"]);
/// assert_eq!(test_tracker.entity_id("top"), Some(top.id));
/// ```
#[macro_export]
macro_rules! test_init {
    ($start_id:expr) => {{
        let test_tracker = std::sync::Arc::new($crate::test_helpers::TestTracker::new($start_id));
        let tracker: $crate::Tracker = test_tracker.clone();
        (test_tracker, tracker)
    }};
}

/// Assert that the events recorded so far match `expected`, one regular
/// expression per event in order, then forget them.
pub fn check_and_clear(tracker: &TestTracker, expected: &[&str]) {
    let recorded = std::mem::take(&mut *tracker.recorded());
    let lines: Vec<&str> = recorded.iter().map(|event| event.line.as_str()).collect();
    assert_eq!(
        lines.len(),
        expected.len(),
        "recorded {lines:?}, expected {expected:?}"
    );
    for (line, pattern) in lines.iter().zip(expected) {
        let re = Regex::new(pattern).unwrap();
        assert!(re.is_match(line), "{line:?} does not match {pattern:?}");
    }
}

/// Forget every event recorded so far.
pub fn clear(tracker: &TestTracker) {
    tracker.recorded().clear();
}
