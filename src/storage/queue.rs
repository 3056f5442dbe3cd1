use std::collections::{HashSet, VecDeque};
use tracing::debug;

use crate::crawler::error::CrawlError;
use crate::crawler::task::Task;

/// In-memory frontier of pending page visits
///
/// Tasks are handed out first-in-first-out. A task is accepted only if no task
/// with the same unique key has been enqueued before during this run, whether
/// or not that earlier task has already been dequeued.
#[derive(Debug, Default)]
pub struct Frontier {
    /// Pending tasks in discovery order
    pending: VecDeque<Task>,

    /// Unique keys of every task ever accepted
    seen_keys: HashSet<String>,
}

impl Frontier {
    /// Create an empty frontier
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task unless its unique key was already seen
    ///
    /// Returns `true` when the task was inserted.
    pub fn enqueue(&mut self, task: Task) -> bool {
        if !self.seen_keys.insert(task.unique_key.clone()) {
            debug!("Skipping already enqueued task: {}", task.unique_key);
            return false;
        }

        debug!("Enqueued {} task: {}", task.role, task.url);
        self.pending.push_back(task);
        true
    }

    /// Take the oldest pending task
    ///
    /// Fails with [`CrawlError::EmptyFrontier`] once nothing is left.
    pub fn dequeue(&mut self) -> Result<Task, CrawlError> {
        self.pending.pop_front().ok_or(CrawlError::EmptyFrontier)
    }

    /// Number of tasks still waiting
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of distinct tasks accepted so far
    pub fn seen_count(&self) -> usize {
        self.seen_keys.len()
    }
}
