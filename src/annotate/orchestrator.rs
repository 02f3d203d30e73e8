//! ScanOrchestrator: page-level scanning over a `DocumentTree`
//!
//! # Design Principles
//! 1. The marker count is re-read from the document at the start of every
//!    pass; badges removed by page scripts are not trusted to still exist
//! 2. A pass only enumerates and enqueues; each element is processed later by
//!    a separate task, so the host can spread work across frames
//! 3. The idempotence guard makes task order irrelevant: whichever of two
//!    overlapping subtrees runs first wins, the other is a no-op
//!
//! # Usage
//! ```rust,ignore
//! let mut orchestrator = ScanOrchestrator::new(&ClearCostConfig::default())?;
//! orchestrator.watch(&tree);
//! orchestrator.run_pending(&mut tree);
//! // ... after the host reports a mutation
//! orchestrator.on_change_notification(&tree);
//! orchestrator.run_pending(&mut tree);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::config::ClearCostConfig;
use super::placement::{AnnotationEngine, Placement};
use super::tree::DocumentTree;
use crate::pricing::PriceError;

// =============================================================================
// Scan Session
// =============================================================================

/// Marker count and safety ceiling for the current page
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ScanSession {
    count: usize,
    ceiling: usize,
}

impl ScanSession {
    pub fn new(ceiling: usize) -> Self {
        Self { count: 0, ceiling }
    }

    /// Replace the running count with a fresh count from the document
    pub fn resync(&mut self, count: usize) {
        self.count = count;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    pub fn at_ceiling(&self) -> bool {
        self.count >= self.ceiling
    }

    pub fn check_ceiling(&self) -> Result<(), PriceError> {
        if self.at_ceiling() {
            return Err(PriceError::CeilingExceeded {
                count: self.count,
                ceiling: self.ceiling,
            });
        }
        Ok(())
    }

    pub fn record_annotation(&mut self) {
        self.count += 1;
    }
}

// =============================================================================
// Work Queue
// =============================================================================

/// FIFO of deferred per-element tasks with a single consumer
#[derive(Debug, Clone)]
pub struct WorkQueue<N> {
    tasks: VecDeque<N>,
}

impl<N> Default for WorkQueue<N> {
    fn default() -> Self {
        Self {
            tasks: VecDeque::new(),
        }
    }
}

impl<N> WorkQueue<N> {
    pub fn push(&mut self, node: N) {
        self.tasks.push_back(node);
    }

    pub fn pop(&mut self) -> Option<N> {
        self.tasks.pop_front()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

// =============================================================================
// Reports
// =============================================================================

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    /// Candidates were enqueued
    Scheduled,
    /// Marker count at or above the ceiling; nothing enqueued
    SkippedAtCeiling,
}

/// Outcome of one scan pass
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ScanReport {
    pub status: ScanStatus,
    /// Markers present when the pass started
    pub marker_count: usize,
    /// Tasks enqueued by this pass
    pub scheduled: usize,
    pub elapsed_us: u64,
}

/// Cumulative counters across passes
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ScanStats {
    pub passes: u64,
    pub skipped_passes: u64,
    pub scheduled: u64,
    pub processed: u64,
    pub annotated: u64,
    pub failures: u64,
}

// =============================================================================
// ScanOrchestrator
// =============================================================================

/// Enumerates candidate elements and feeds them to the `AnnotationEngine`
#[derive(Debug)]
pub struct ScanOrchestrator<N> {
    engine: AnnotationEngine,
    session: ScanSession,
    queue: WorkQueue<N>,
    stats: ScanStats,
    max_depth: usize,
    watching: bool,
}

impl<N: Clone + PartialEq + std::fmt::Debug> ScanOrchestrator<N> {
    pub fn new(config: &ClearCostConfig) -> Result<Self, PriceError> {
        Ok(Self::with_engine(AnnotationEngine::from_config(config)?, config))
    }

    pub fn with_engine(engine: AnnotationEngine, config: &ClearCostConfig) -> Self {
        Self {
            engine,
            session: ScanSession::new(config.max_annotations),
            queue: WorkQueue::default(),
            stats: ScanStats::default(),
            max_depth: config.max_depth,
            watching: false,
        }
    }

    pub fn engine(&self) -> &AnnotationEngine {
        &self.engine
    }

    pub fn session(&self) -> &ScanSession {
        &self.session
    }

    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    /// Tasks waiting to run
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_watching(&self) -> bool {
        self.watching
    }

    /// One scan pass: resync the count, check the ceiling, enqueue every
    /// non-empty element below the root in document order
    pub fn scan<T: DocumentTree<Node = N>>(&mut self, tree: &T) -> ScanReport {
        let start = instant::Instant::now();
        self.session.resync(tree.count_marked_nodes());
        self.stats.passes += 1;

        if self.session.at_ceiling() {
            self.stats.skipped_passes += 1;
            log::warn!(
                "Too many price tags ({} of {}), not scanning page",
                self.session.count(),
                self.session.ceiling()
            );
            return ScanReport {
                status: ScanStatus::SkippedAtCeiling,
                marker_count: self.session.count(),
                scheduled: 0,
                elapsed_us: start.elapsed().as_micros() as u64,
            };
        }

        log::info!("Scanning the page for prices...");
        let candidates = self.candidates(tree);
        let scheduled = candidates.len();
        for node in candidates {
            self.queue.push(node);
        }
        self.stats.scheduled += scheduled as u64;

        ScanReport {
            status: ScanStatus::Scheduled,
            marker_count: self.session.count(),
            scheduled,
            elapsed_us: start.elapsed().as_micros() as u64,
        }
    }

    /// Non-empty elements below the root, document order. Badge subtrees and
    /// anything deeper than `max_depth` are left out.
    fn candidates<T: DocumentTree<Node = N>>(&self, tree: &T) -> Vec<N> {
        let mut found = Vec::new();
        let mut stack: Vec<(N, usize)> = tree
            .children(&tree.root())
            .into_iter()
            .rev()
            .map(|child| (child, 1))
            .collect();

        while let Some((node, depth)) = stack.pop() {
            if !tree.is_element(&node) || tree.has_marker(&node) {
                continue;
            }
            let children = tree.children(&node);
            if children.is_empty() {
                continue;
            }
            found.push(node);
            if depth < self.max_depth {
                stack.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
            }
        }
        found
    }

    /// Run the oldest pending task. `None` when the queue is empty.
    pub fn run_next<T: DocumentTree<Node = N>>(&mut self, tree: &mut T) -> Option<Result<Placement<N>, PriceError>> {
        let node = self.queue.pop()?;
        self.stats.processed += 1;

        let result = self.engine.process(tree, &node, &mut self.session);
        match &result {
            Ok(_) => self.stats.annotated += 1,
            Err(err) if err.is_silent() => {}
            Err(err) => {
                self.stats.failures += 1;
                log::debug!("Skipped {:?}: {}", node, err);
            }
        }
        Some(result)
    }

    /// Drain the queue. Returns the number of badges inserted.
    pub fn run_pending<T: DocumentTree<Node = N>>(&mut self, tree: &mut T) -> usize {
        let mut inserted = 0;
        while let Some(result) = self.run_next(tree) {
            if result.is_ok() {
                inserted += 1;
            }
        }
        inserted
    }

    /// Initial scan, then rescan on every change notification
    pub fn watch<T: DocumentTree<Node = N>>(&mut self, tree: &T) -> ScanReport {
        self.watching = true;
        self.scan(tree)
    }

    pub fn unwatch(&mut self) {
        self.watching = false;
    }

    /// Host callback for subtree mutations. Rescans while watching.
    pub fn on_change_notification<T: DocumentTree<Node = N>>(&mut self, tree: &T) -> Option<ScanReport> {
        if !self.watching {
            return None;
        }
        Some(self.scan(tree))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ceiling() {
        let mut session = ScanSession::new(2);
        assert!(session.check_ceiling().is_ok());
        session.record_annotation();
        session.record_annotation();
        assert!(session.at_ceiling());
        assert_eq!(
            session.check_ceiling(),
            Err(PriceError::CeilingExceeded { count: 2, ceiling: 2 })
        );
        session.resync(0);
        assert!(!session.at_ceiling());
    }

    #[test]
    fn test_work_queue_is_fifo() {
        let mut queue = WorkQueue::default();
        queue.push(1);
        queue.push(2);
        queue.push(3);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), Some(3));
        assert!(queue.is_empty());
    }
}
