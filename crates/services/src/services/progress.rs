//! Canonical subtask rollup. Every listing path that needs per-status
//! counts or completion percentages goes through these functions; nothing
//! is aggregated in SQL.

use std::collections::HashMap;

use db::{
    models::{subtask::Subtask, task::Task},
    types::TaskStatus,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct StatusCounts {
    pub total: u64,
    pub todo: u64,
    pub in_progress: u64,
    pub done: u64,
}

impl StatusCounts {
    pub fn add(&mut self, status: TaskStatus) {
        self.total += 1;
        match status {
            TaskStatus::Todo => self.todo += 1,
            TaskStatus::InProgress => self.in_progress += 1,
            TaskStatus::Done => self.done += 1,
        }
    }
}

/// Items grouped into the three board columns.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct StatusBuckets<T> {
    pub todo: Vec<T>,
    pub in_progress: Vec<T>,
    pub done: Vec<T>,
}

pub fn bucket_by_status<T>(
    items: Vec<T>,
    status_of: impl Fn(&T) -> TaskStatus,
) -> StatusBuckets<T> {
    let mut buckets = StatusBuckets {
        todo: Vec::new(),
        in_progress: Vec::new(),
        done: Vec::new(),
    };
    for item in items {
        match status_of(&item) {
            TaskStatus::Todo => buckets.todo.push(item),
            TaskStatus::InProgress => buckets.in_progress.push(item),
            TaskStatus::Done => buckets.done.push(item),
        }
    }
    buckets
}

/// Derived progress for one task. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct TaskProgress {
    pub task_id: i64,
    pub title: String,
    pub total_subtasks: u64,
    pub todo_count: u64,
    pub in_progress_count: u64,
    pub done_count: u64,
    pub completion_percentage: f64,
}

pub fn completion_percentage(done: u64, total: u64) -> f64 {
    (done as f64 / total as f64 * 100.0 * 100.0).round() / 100.0
}

/// Per-task progress for every task that has at least one subtask, ordered
/// by completion percentage descending, ties by task creation time
/// descending. Tasks without subtasks are excluded rather than reported as
/// zero percent.
pub fn summarize(tasks: &[Task], subtasks: &[Subtask]) -> Vec<TaskProgress> {
    let mut counts: HashMap<i64, StatusCounts> = HashMap::new();
    for subtask in subtasks {
        counts.entry(subtask.task_id).or_default().add(subtask.status);
    }

    let mut summary: Vec<(TaskProgress, chrono::DateTime<chrono::Utc>)> = tasks
        .iter()
        .filter_map(|task| {
            let counts = counts.get(&task.id)?;
            let progress = TaskProgress {
                task_id: task.id,
                title: task.title.clone(),
                total_subtasks: counts.total,
                todo_count: counts.todo,
                in_progress_count: counts.in_progress,
                done_count: counts.done,
                completion_percentage: completion_percentage(counts.done, counts.total),
            };
            Some((progress, task.created_at))
        })
        .collect();

    summary.sort_by(|(a, a_created), (b, b_created)| {
        b.completion_percentage
            .partial_cmp(&a.completion_percentage)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b_created.cmp(a_created))
    });

    summary.into_iter().map(|(progress, _)| progress).collect()
}
