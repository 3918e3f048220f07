// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

pub use log;

use crate::tracker::{EntityManager, Track};
use crate::{Id, SharedWriter, Writer};

/// A simple text logger to output messages to a Writer.
///
/// Each event is written as a single line while holding the writer lock so
/// lines from different node threads never interleave.
pub struct TextTracker {
    entity_manager: EntityManager,

    /// Writer to which all _log_ events will be written.
    writer: SharedWriter,
}

impl TextTracker {
    /// Create a new [`TextTracker`] with an [`EntityManager`].
    pub fn new(entity_manager: EntityManager, writer: Writer) -> Self {
        Self {
            entity_manager,
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    fn write_line(&self, line: std::fmt::Arguments) {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        // A failing sink must not take a simulation down with it.
        let _ = writeln!(writer, "{line}");
    }
}

/// Implementation for each [`Track`] event
impl Track for TextTracker {
    fn unique_id(&self) -> Id {
        self.entity_manager.unique_id()
    }

    fn is_entity_enabled(&self, id: Id, level: log::Level) -> bool {
        self.entity_manager.is_log_enabled_at_level(id, level)
    }

    fn add_entity(&self, id: Id, entity_name: &str) {
        self.entity_manager.add_entity(id, entity_name);
    }

    fn enter(&self, id: Id, object: Id) {
        self.write_line(format_args!("{id}: enter {object}"));
    }

    fn exit(&self, id: Id, object: Id) {
        self.write_line(format_args!("{id}: exit {object}"));
    }

    fn create(&self, created_by: Id, id: Id, num_bytes: usize, req_type: i8, name: &str) {
        self.write_line(format_args!(
            "{created_by}: created {id}, {name}, {req_type}, {num_bytes} bytes"
        ));
    }

    fn destroy(&self, destroyed_by: Id, id: Id) {
        self.write_line(format_args!("{destroyed_by}: destroyed {id}"));
    }

    fn connect(&self, connect_from: Id, connect_to: Id) {
        self.write_line(format_args!("{connect_from}: connect to {connect_to}"));
    }

    fn log(&self, id: Id, level: log::Level, msg: std::fmt::Arguments) {
        self.write_line(format_args!("{id}:{level}: {msg}"));
    }

    fn shutdown(&self) {
        let _ = self
            .writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush();
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::entity::toplevel;
    use crate::{Tracker, info, trace};

    /// A writer that appends to a shared buffer the test can inspect.
    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writes_enabled_messages_only() {
        let capture = Capture::default();
        let tracker: Tracker = Arc::new(TextTracker::new(
            EntityManager::new(log::Level::Info),
            Box::new(capture.clone()),
        ));

        let top = toplevel(&tracker, "top");
        info!(top ; "value {}", 4);
        trace!(top ; "hidden");
        tracker.shutdown();

        let text = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
        assert_eq!(text, format!("{}:INFO: value 4\n", top.id));
    }
}
