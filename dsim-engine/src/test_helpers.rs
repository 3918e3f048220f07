// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Helpers shared by the tests of this crate and the crates built on it.

use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use dsim_track::entity::{Entity, toplevel};
use dsim_track::tracker::{EntityManager, TextTracker, dev_null_tracker};
use dsim_track::{Tracker, Writer};

use crate::config::Config;
use crate::system::DistributedSystem;
use crate::types::SimResult;

const TRACE_FOLDER: &str = "traces";

/// Log file for the test running on this thread.
///
/// The test harness names each test thread after its test, so tests in the
/// same file running in parallel get a file each.
#[must_use]
pub fn trace_path(full_filepath: &str) -> PathBuf {
    let stem = Path::new(full_filepath)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("test");
    let name = match thread::current().name() {
        Some(test) if test != "main" => format!("{stem}-{}", test.replace("::", "-")),
        _ => stem.to_string(),
    };
    Path::new(TRACE_FOLDER).join(format!("{name}.log"))
}

/// Create a tracker that appends to [trace_path].
///
/// Falls back to a tracker that discards everything if the file cannot be
/// opened.
#[must_use]
pub fn create_tracker(full_filepath: &str) -> Tracker {
    if fs::create_dir_all(TRACE_FOLDER).is_err() {
        return dev_null_tracker();
    }
    let Ok(file) = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(trace_path(full_filepath))
    else {
        return dev_null_tracker();
    };

    let writer: Writer = Box::new(BufWriter::new(file));
    let entity_manager = EntityManager::new(log::Level::Warn);
    let tracker: Tracker = Arc::new(TextTracker::new(entity_manager, writer));
    tracker
}

/// Create the top-level entity for a test.
#[must_use]
pub fn start_test(full_filepath: &str) -> Arc<Entity> {
    toplevel(&create_tracker(full_filepath), "top")
}

/// Create a system of `number_of_nodes` nodes without any delays.
pub fn start_system(full_filepath: &str, number_of_nodes: usize) -> SimResult<DistributedSystem> {
    let top = start_test(full_filepath);
    DistributedSystem::new(&top, &Config::with_nodes(number_of_nodes))
}

/// Run `system` on a separate thread and panic if it takes longer than
/// `timeout`.
///
/// The system is handed back together with the result of the run.
pub fn run_with_watchdog(
    mut system: DistributedSystem,
    timeout: Duration,
) -> (DistributedSystem, SimResult) {
    let (tx, rx) = crossbeam_channel::bounded(1);
    thread::spawn(move || {
        let result = system.run();
        let _ = tx.send((system, result));
    });

    match rx.recv_timeout(timeout) {
        Ok(finished) => finished,
        Err(_) => panic!("watchdog: system did not finish within {timeout:?}"),
    }
}
