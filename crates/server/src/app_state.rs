use db::DBService;
use services::services::{subtask::SubtaskService, task::TaskService};

/// Shared handles threaded through every route handler.
#[derive(Clone)]
pub struct AppState {
    db: DBService,
    tasks: TaskService,
    subtasks: SubtaskService,
}

impl AppState {
    pub fn new(db: DBService) -> Self {
        Self {
            tasks: TaskService::new(db.clone()),
            subtasks: SubtaskService::new(db.clone()),
            db,
        }
    }

    pub fn db(&self) -> &DBService {
        &self.db
    }

    pub fn tasks(&self) -> &TaskService {
        &self.tasks
    }

    pub fn subtasks(&self) -> &SubtaskService {
        &self.subtasks
    }
}
