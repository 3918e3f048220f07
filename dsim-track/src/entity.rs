// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Named entities that _log_ / _trace_ events are attributed to.
//!
//! A simulation builds a tree of entities: one top-level entity, the system
//! under it and one entity per node under the system, giving names such as
//! `top::system::node3`. Filters on a tracker select entities by that full
//! name, so a single node can be traced on its own.
//!
//! Entities are shared between node threads through [`Arc`].

use std::fmt;
use std::sync::Arc;

use crate::{Id, Tracker, create, destroy};

/// Separator between the levels of a full name.
const JOIN: &str = "::";

/// A named part of a simulation with its own [`Id`].
///
/// Creating an entity registers its full name with the tracker and emits a
/// create event. Dropping it emits a destroy event.
pub struct Entity {
    /// Name of this entity within its parent.
    pub name: String,

    /// Parent entity, `None` only for the top level.
    pub parent: Option<Arc<Entity>>,

    /// Identifies this entity in every event it emits.
    pub id: Id,

    /// [`Tracker`] that receives the events of this entity.
    pub tracker: Tracker,

    full_name: String,
    index: Option<usize>,
}

impl Entity {
    fn register(
        parent: Option<Arc<Entity>>,
        tracker: Tracker,
        name: String,
        index: Option<usize>,
    ) -> Arc<Self> {
        let full_name = match &parent {
            Some(parent) => format!("{}{JOIN}{name}", parent.full_name),
            None => name.clone(),
        };
        let id = tracker.unique_id();
        tracker.add_entity(id, &full_name);

        let entity = Arc::new(Self {
            name,
            parent,
            id,
            tracker,
            full_name,
            index,
        });
        create!(entity);
        entity
    }

    /// Create an entity called `name` under `parent`.
    #[must_use]
    pub fn new(parent: &Arc<Entity>, name: &str) -> Arc<Self> {
        Self::register(
            Some(parent.clone()),
            parent.tracker.clone(),
            name.to_string(),
            None,
        )
    }

    /// Create the entity for member `index` of a numbered group, for example
    /// `node3`.
    #[must_use]
    pub fn indexed(parent: &Arc<Entity>, kind: &str, index: usize) -> Arc<Self> {
        Self::register(
            Some(parent.clone()),
            parent.tracker.clone(),
            format!("{kind}{index}"),
            Some(index),
        )
    }

    /// The names of every level down to this entity, joined by `::`.
    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Position within the group, for entities made by [`Entity::indexed`].
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        self.index
    }
}

impl Drop for Entity {
    fn drop(&mut self) {
        destroy!(self);
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.full_name, self.id)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name)
    }
}

/// Create the top-level entity. This should be the only entity without a
/// parent.
pub fn toplevel(tracker: &Tracker, name: &str) -> Arc<Entity> {
    Entity::register(None, tracker.clone(), name.to_string(), None)
}
