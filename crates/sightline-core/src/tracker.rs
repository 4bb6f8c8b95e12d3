//! Insertion timestamps and the dynamic-node heuristic.

use crate::config::TrackerConfig;
use crate::dom::{DomTree, NodeId};
use crate::scoring::has_digit_run;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Wall-clock milliseconds.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: AtomicU64::new(start_ms),
        }
    }

    pub fn advance(&self, ms: u64) -> u64 {
        self.now.fetch_add(ms, Ordering::SeqCst) + ms
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Records when nodes were inserted while observation is on.
///
/// Entries are bounded by `capacity` and evicted oldest-insertion first.
/// Hosts should call [`forget`](Self::forget) or
/// [`purge_unreachable`](Self::purge_unreachable) when nodes go away.
#[derive(Debug)]
pub struct MutationTracker {
    observing: bool,
    window_ms: u64,
    capacity: usize,
    inserted_at: HashMap<NodeId, u64>,
    // May hold stale entries for re-inserted or forgotten nodes.
    order: VecDeque<(NodeId, u64)>,
}

impl MutationTracker {
    pub fn new(config: &TrackerConfig) -> Self {
        Self {
            observing: false,
            window_ms: config.dynamic_window_ms,
            capacity: config.capacity.max(1),
            inserted_at: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn connect(&mut self) {
        self.observing = true;
    }

    pub fn disconnect(&mut self) {
        self.observing = false;
    }

    pub fn is_observing(&self) -> bool {
        self.observing
    }

    /// Timestamp `root` and every element below it. Returns the number of
    /// nodes recorded, zero while disconnected.
    pub fn record_insertion<D: DomTree + ?Sized>(&mut self, dom: &D, root: NodeId, at_ms: u64) -> usize {
        if !self.observing {
            return 0;
        }

        let mut recorded = 0;
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            self.inserted_at.insert(node, at_ms);
            self.order.push_back((node, at_ms));
            recorded += 1;
            stack.extend(dom.children(node));
        }
        self.evict();
        debug!(root = root.index(), recorded, at_ms, "Recorded insertion");
        recorded
    }

    pub fn inserted_at(&self, node: NodeId) -> Option<u64> {
        self.inserted_at.get(&node).copied()
    }

    pub fn forget(&mut self, node: NodeId) {
        self.inserted_at.remove(&node);
    }

    /// Drop entries for nodes no longer attached to `dom`.
    pub fn purge_unreachable<D: DomTree + ?Sized>(&mut self, dom: &D) -> usize {
        let before = self.inserted_at.len();
        self.inserted_at.retain(|&node, _| dom.is_connected(node));
        self.compact();
        before - self.inserted_at.len()
    }

    pub fn len(&self) -> usize {
        self.inserted_at.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inserted_at.is_empty()
    }

    /// Inserted within the window before `now_ms`, or carrying a generated-looking
    /// id or class.
    pub fn is_dynamic<D: DomTree + ?Sized>(&self, dom: &D, node: NodeId, now_ms: u64) -> bool {
        if let Some(at) = self.inserted_at(node)
            && now_ms.saturating_sub(at) <= self.window_ms
        {
            return true;
        }
        dom.attribute(node, "id").is_some_and(has_digit_run)
            || dom.attribute(node, "class").is_some_and(has_digit_run)
    }

    fn evict(&mut self) {
        while self.inserted_at.len() > self.capacity {
            let Some((node, at)) = self.order.pop_front() else {
                break;
            };
            if self.inserted_at.get(&node) == Some(&at) {
                self.inserted_at.remove(&node);
            }
        }
        if self.order.len() > self.capacity * 2 {
            self.compact();
        }
    }

    fn compact(&mut self) {
        let live = &self.inserted_at;
        let mut seen = HashMap::new();
        // Keep only the newest queue entry per live node.
        for (index, (node, at)) in self.order.iter().enumerate() {
            if live.get(node) == Some(at) {
                seen.insert(*node, index);
            }
        }
        let mut index = 0;
        self.order.retain(|(node, _)| {
            let keep = seen.get(node) == Some(&index);
            index += 1;
            keep
        });
    }
}
