use super::api::Task;
use crate::dependencies::DepGraph;
use crate::ngtsc::file_system::AbsoluteFsPath;
use crate::packages::EntryPoint;
use std::collections::{HashMap, HashSet, VecDeque};

/// The tasks of a run, handed out so that no entry-point is compiled before its dependencies.
///
/// A task is available when no other task of its entry-point is in progress and every graph
/// dependency ordered before its entry-point has no unfinished task left. Dependencies ordered
/// after it can only come from a cycle and are not waited on.
#[derive(Debug)]
pub struct TaskQueue {
    pending: VecDeque<Task>,
    in_progress: HashSet<AbsoluteFsPath>,
    /// Unfinished (pending or in progress) tasks per entry-point.
    remaining: HashMap<AbsoluteFsPath, usize>,
    blockers: HashMap<AbsoluteFsPath, Vec<AbsoluteFsPath>>,
    dependants: HashMap<AbsoluteFsPath, Vec<AbsoluteFsPath>>,
}

impl TaskQueue {
    /// `tasks` must be in topological order of their entry-points.
    pub fn new(tasks: Vec<Task>, graph: &DepGraph<EntryPoint>) -> Self {
        let mut order: HashMap<AbsoluteFsPath, usize> = HashMap::new();
        let mut remaining: HashMap<AbsoluteFsPath, usize> = HashMap::new();
        for task in &tasks {
            let path = &task.entry_point.path;
            let next = order.len();
            order.entry(path.clone()).or_insert(next);
            *remaining.entry(path.clone()).or_default() += 1;
        }

        let mut blockers = HashMap::new();
        let mut dependants = HashMap::new();
        for (path, index) in &order {
            let earlier: Vec<AbsoluteFsPath> = graph
                .dependencies_of(path)
                .into_iter()
                .filter(|dependency| order.get(dependency).map_or(false, |i| i < index))
                .collect();
            blockers.insert(path.clone(), earlier);
            let later: Vec<AbsoluteFsPath> = graph
                .dependants_of(path)
                .into_iter()
                .filter(|dependant| order.contains_key(dependant))
                .collect();
            dependants.insert(path.clone(), later);
        }

        Self {
            pending: tasks.into(),
            in_progress: HashSet::new(),
            remaining,
            blockers,
            dependants,
        }
    }

    pub fn all_tasks_completed(&self) -> bool {
        self.pending.is_empty() && self.in_progress.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn in_progress_count(&self) -> usize {
        self.in_progress.len()
    }

    /// Take the first available task, in queue order.
    pub fn get_next_task(&mut self) -> Option<Task> {
        let index = self
            .pending
            .iter()
            .position(|task| self.is_available(&task.entry_point.path))?;
        let task = self.pending.remove(index)?;
        self.in_progress.insert(task.entry_point.path.clone());
        Some(task)
    }

    pub fn mark_as_completed(&mut self, task: &Task) {
        let path = &task.entry_point.path;
        self.in_progress.remove(path);
        if let Some(count) = self.remaining.get_mut(path) {
            *count = count.saturating_sub(1);
        }
    }

    /// Drop the remaining tasks of the failed entry-point and of everything that depends on it.
    ///
    /// Returns the dependants whose tasks were dropped.
    pub fn mark_as_failed(&mut self, task: &Task) -> Vec<EntryPoint> {
        let path = task.entry_point.path.clone();
        self.in_progress.remove(&path);

        let dependants = self.dependants.get(&path).cloned().unwrap_or_default();
        let dropped: HashSet<&AbsoluteFsPath> =
            std::iter::once(&path).chain(dependants.iter()).collect();

        let mut skipped: Vec<EntryPoint> = Vec::new();
        let mut kept = VecDeque::with_capacity(self.pending.len());
        for pending in self.pending.drain(..) {
            let pending_path = &pending.entry_point.path;
            if !dropped.contains(pending_path) {
                kept.push_back(pending);
                continue;
            }
            if pending_path != &path && !skipped.iter().any(|e| &e.path == pending_path) {
                skipped.push(pending.entry_point.clone());
            }
        }
        self.pending = kept;
        for dropped_path in dropped {
            self.remaining.insert(dropped_path.clone(), 0);
        }
        skipped
    }

    fn is_available(&self, path: &AbsoluteFsPath) -> bool {
        if self.in_progress.contains(path) {
            return false;
        }
        self.blockers.get(path).map_or(true, |blockers| {
            blockers
                .iter()
                .all(|blocker| self.remaining.get(blocker).copied().unwrap_or(0) == 0)
        })
    }
}
