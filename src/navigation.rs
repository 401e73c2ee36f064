//! Side-panel navigation stack.
//!
//! A bounded history of inspected entities with browser-style back/forward
//! semantics:
//!
//! - `push` appends a new entry and discards forward history; pushing the
//!   entity already on top only reopens the panel.
//! - `back` moves the top entry onto the forward stack. With a single
//!   entry left, the panel is hidden instead and the entry stays.
//! - `next` restores the most recent forward entry.
//! - The oldest entries are evicted once the capacity is exceeded.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::directory::ResourceDirectory;
use crate::graph::TaskGraph;
use crate::models::{ResourceId, TaskId};

/// Default number of entries kept.
pub const DEFAULT_CAPACITY: usize = 20;

/// What the panel shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PanelEntry {
    ViewingTask(TaskId),
    ViewingResource(ResourceId),
    CreatingTask,
    CreatingResource,
}

impl PanelEntry {
    /// Whether both entries denote the same logical entity.
    pub fn same_entity(&self, other: &PanelEntry) -> bool {
        self == other
    }

    /// Whether the referenced entity still exists in the given snapshots.
    pub fn is_valid(&self, tasks: &TaskGraph, resources: &ResourceDirectory) -> bool {
        match self {
            PanelEntry::ViewingTask(id) => tasks.contains(*id),
            PanelEntry::ViewingResource(id) => resources.contains(*id),
            PanelEntry::CreatingTask | PanelEntry::CreatingResource => true,
        }
    }

    /// Whether this entry is a form for an entity that does not exist yet.
    pub fn is_creation(&self) -> bool {
        matches!(self, PanelEntry::CreatingTask | PanelEntry::CreatingResource)
    }
}

/// Bounded back/forward history backing the side panel.
#[derive(Debug, Clone)]
pub struct NavigationStack {
    stack: VecDeque<PanelEntry>,
    forward: Vec<PanelEntry>,
    capacity: usize,
    is_open: bool,
    is_expanded: bool,
}

impl Default for NavigationStack {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationStack {
    /// Creates an empty, closed stack with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates an empty, closed stack. A capacity of zero is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            stack: VecDeque::new(),
            forward: Vec::new(),
            capacity,
            is_open: false,
            is_expanded: false,
        }
    }

    /// Opens `entry`, recording it in the history.
    pub fn push(&mut self, entry: PanelEntry) {
        self.is_open = true;
        if self.active().is_some_and(|top| top.same_entity(&entry)) {
            return;
        }
        self.stack.push_back(entry);
        self.forward.clear();
        while self.stack.len() > self.capacity {
            self.stack.pop_front();
        }
    }

    /// Substitutes the top entry in place, or pushes onto an empty stack.
    pub fn replace(&mut self, entry: PanelEntry) {
        match self.stack.back_mut() {
            Some(top) => {
                *top = entry;
                self.is_open = true;
            }
            None => self.push(entry),
        }
    }

    /// Steps back one entry; hides the panel when at the first entry.
    pub fn pop(&mut self) {
        if self.stack.len() <= 1 {
            self.is_open = false;
            return;
        }
        if let Some(top) = self.stack.pop_back() {
            self.forward.push(top);
        }
    }

    /// Alias for [`pop`](Self::pop).
    pub fn back(&mut self) {
        self.pop();
    }

    /// Restores the most recent entry left via `back`.
    pub fn next(&mut self) {
        if let Some(entry) = self.forward.pop() {
            self.stack.push_back(entry);
            self.is_open = true;
        }
    }

    /// Clears both histories and closes the panel, optionally opening `entry`.
    pub fn reset(&mut self, entry: Option<PanelEntry>) {
        self.stack.clear();
        self.forward.clear();
        self.is_open = false;
        if let Some(entry) = entry {
            self.push(entry);
        }
    }

    /// Drops every entry (both histories) not matching `keep`.
    ///
    /// Neighbours that end up naming the same entity collapse into one.
    /// Closes the panel when nothing is left.
    pub fn retain(&mut self, mut keep: impl FnMut(&PanelEntry) -> bool) {
        let mut stack: Vec<PanelEntry> = self.stack.drain(..).filter(|e| keep(e)).collect();
        stack.dedup_by(|a, b| a.same_entity(b));
        self.stack = stack.into();

        self.forward.retain(|e| keep(e));
        self.forward.dedup_by(|a, b| a.same_entity(b));
        while let (Some(top), Some(upcoming)) = (self.stack.back(), self.forward.last()) {
            if !top.same_entity(upcoming) {
                break;
            }
            self.forward.pop();
        }
        if self.stack.is_empty() {
            self.is_open = false;
        }
    }

    /// Forgets a deleted task.
    pub fn remove_task(&mut self, id: TaskId) {
        self.retain(|e| *e != PanelEntry::ViewingTask(id));
    }

    /// Forgets a deleted resource.
    pub fn remove_resource(&mut self, id: ResourceId) {
        self.retain(|e| *e != PanelEntry::ViewingResource(id));
    }

    /// The entry currently shown.
    pub fn active(&self) -> Option<&PanelEntry> {
        self.stack.back()
    }

    /// History entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &PanelEntry> + '_ {
        self.stack.iter()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// No earlier entry to go back to.
    pub fn at_first(&self) -> bool {
        self.stack.len() <= 1
    }

    /// No forward history.
    pub fn at_last(&self) -> bool {
        self.forward.is_empty()
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn is_expanded(&self) -> bool {
        self.is_expanded
    }

    /// Hides the panel, keeping the history.
    pub fn close(&mut self) {
        self.is_open = false;
    }

    pub fn toggle_open(&mut self) {
        self.is_open = !self.is_open;
    }

    pub fn toggle_expand(&mut self) {
        self.is_expanded = !self.is_expanded;
    }
}
