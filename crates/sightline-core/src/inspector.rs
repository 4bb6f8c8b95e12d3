//! Inspection lifecycle.
//!
//! An [`Inspector`] is either idle or inspecting. Starting connects the
//! mutation tracker and stopping disconnects it. Resetting clears cached
//! records without changing state. Records already handed out stay valid.

use crate::config::EngineConfig;
use crate::dom::{DomTree, NodeId};
use crate::record::build_record;
use crate::tracker::MutationTracker;
use sightline_common::protocol::SelectionRecord;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InspectorState {
    Idle,
    Inspecting,
}

impl fmt::Display for InspectorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Inspecting => f.write_str("inspecting"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InspectorCommand {
    Start,
    Stop,
    Reset,
}

pub struct Inspector {
    state: InspectorState,
    tracker: MutationTracker,
    pending: Vec<(NodeId, u64)>,
    records: Vec<SelectionRecord>,
    config: EngineConfig,
}

impl Inspector {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            state: InspectorState::Idle,
            tracker: MutationTracker::new(&config.tracker),
            pending: Vec::new(),
            records: Vec::new(),
            config,
        }
    }

    pub fn state(&self) -> InspectorState {
        self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tracker(&self) -> &MutationTracker {
        &self.tracker
    }

    /// Records produced since the last reset, oldest first.
    pub fn records(&self) -> &[SelectionRecord] {
        &self.records
    }

    pub fn apply(&mut self, command: InspectorCommand) -> InspectorState {
        let previous = self.state;
        match (self.state, command) {
            (InspectorState::Idle, InspectorCommand::Start) => {
                self.tracker.connect();
                self.state = InspectorState::Inspecting;
            }
            (InspectorState::Inspecting, InspectorCommand::Stop) => {
                self.tracker.disconnect();
                self.pending.clear();
                self.state = InspectorState::Idle;
            }
            (_, InspectorCommand::Reset) => {
                self.records.clear();
            }
            // Start while inspecting and stop while idle change nothing.
            _ => {}
        }
        info!(from = %previous, to = %self.state, ?command, "Inspector transition");
        self.state
    }

    /// Queue a host insertion. Ignored unless inspecting.
    pub fn notify_insertion(&mut self, root: NodeId, at_ms: u64) {
        if self.state == InspectorState::Inspecting {
            self.pending.push((root, at_ms));
        }
    }

    /// Drop tracking for nodes the host removed.
    pub fn notify_removal(&mut self, nodes: &[NodeId]) {
        self.pending.retain(|(root, _)| !nodes.contains(root));
        for &node in nodes {
            self.tracker.forget(node);
        }
    }

    /// Apply queued insertions to the tracker.
    pub fn flush<D: DomTree + ?Sized>(&mut self, dom: &D) -> usize {
        let mut recorded = 0;
        for (root, at_ms) in std::mem::take(&mut self.pending) {
            if dom.is_connected(root) {
                recorded += self.tracker.record_insertion(dom, root, at_ms);
            }
        }
        recorded
    }

    /// Build a record for `node`. `None` while idle.
    pub fn select<D: DomTree + ?Sized>(
        &mut self,
        dom: &D,
        node: NodeId,
        now_ms: u64,
    ) -> Option<SelectionRecord> {
        if self.state != InspectorState::Inspecting {
            return None;
        }
        self.flush(dom);
        let record = build_record(dom, node, &self.tracker, now_ms, &self.config);
        info!(node = %record.display_name, dynamic = record.is_dynamic, "Selected element");
        self.records.push(record.clone());
        Some(record)
    }
}

/// Owns at most one [`Inspector`] per page.
pub struct InspectorHost {
    config: EngineConfig,
    inspectors: HashMap<String, Inspector>,
}

impl InspectorHost {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            inspectors: HashMap::new(),
        }
    }

    /// The page's inspector, created on first attach.
    pub fn attach(&mut self, page: &str) -> &mut Inspector {
        match self.inspectors.entry(page.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                info!(page, "Attached inspector");
                entry.insert(Inspector::new(self.config.clone()))
            }
        }
    }

    pub fn is_attached(&self, page: &str) -> bool {
        self.inspectors.contains_key(page)
    }

    pub fn get(&self, page: &str) -> Option<&Inspector> {
        self.inspectors.get(page)
    }

    pub fn detach(&mut self, page: &str) -> Option<Inspector> {
        self.inspectors.remove(page)
    }

    pub fn len(&self) -> usize {
        self.inspectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inspectors.is_empty()
    }
}
