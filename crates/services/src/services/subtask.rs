use db::{
    DBService, DbErr,
    models::{
        pagination::Paginated,
        subtask::{
            CreateSubtaskData, Subtask, SubtaskFilters, SubtaskWithContext, UpdateSubtaskData,
        },
        task::Task,
        user::User,
    },
    types::TaskStatus,
};
use serde::Deserialize;
use thiserror::Error;
use ts_rs::TS;

use super::{
    progress::{self, StatusBuckets, TaskProgress},
    task::clamp_pagination,
    validate::{self, FieldErrors},
};

const TITLE_MIN: usize = 1;
const TITLE_MAX: usize = 255;
const DESCRIPTION_MAX: usize = 5000;
const COMMENT_MAX: usize = 2000;

#[derive(Debug, Error)]
pub enum SubtaskServiceError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("Subtask not found")]
    SubtaskNotFound,
    #[error("Task not found")]
    TaskNotFound,
    #[error("Referenced task does not exist")]
    InvalidTaskId,
    #[error("Assigned user not found or inactive")]
    InvalidAssignee,
    #[error("No fields provided to update")]
    NoFieldsProvided,
}

/// The aliases accept the prefixed field names some clients still send
/// (`relation_task_id`, `subtask_title`, ...).
#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct CreateSubtaskRequest {
    #[serde(alias = "relation_task_id")]
    pub task_id: Option<i64>,
    #[serde(alias = "subtask_title")]
    pub title: Option<String>,
    #[serde(alias = "subtask_description")]
    pub description: Option<String>,
    pub assigned_to: Option<i64>,
    #[serde(alias = "subtask_date")]
    pub date: Option<String>,
}

/// Partial update; empty `description` or `comment` clears the column.
#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct UpdateSubtaskRequest {
    #[serde(alias = "subtask_title")]
    pub title: Option<String>,
    #[serde(alias = "subtask_description")]
    pub description: Option<String>,
    pub assigned_to: Option<i64>,
    #[serde(alias = "subtask_status")]
    pub status: Option<String>,
    #[serde(alias = "subtask_comment")]
    pub comment: Option<String>,
    #[serde(alias = "subtask_date")]
    pub date: Option<String>,
}

impl UpdateSubtaskRequest {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.assigned_to.is_none()
            && self.status.is_none()
            && self.comment.is_none()
            && self.date.is_none()
    }
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct SubtaskListQuery {
    #[serde(alias = "relation_task_id")]
    pub task_id: Option<i64>,
    #[serde(alias = "subtask_status")]
    pub status: Option<String>,
    pub assigned_to: Option<i64>,
    pub search: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Clone)]
pub struct SubtaskService {
    db: DBService,
}

impl SubtaskService {
    pub fn new(db: DBService) -> Self {
        Self { db }
    }

    /// Subtasks of one task, newest first, annotated with assignee and
    /// parent-task context. A missing parent is an error, not an empty
    /// list.
    pub async fn list_by_task(
        &self,
        task_id: i64,
    ) -> Result<Vec<SubtaskWithContext>, SubtaskServiceError> {
        let db = &self.db.pool;
        let task = Task::find_by_id(db, task_id)
            .await?
            .ok_or(SubtaskServiceError::TaskNotFound)?;

        let subtasks = Subtask::find_by_task_id(db, task_id).await?;
        let mut annotated = Vec::with_capacity(subtasks.len());
        for subtask in subtasks {
            annotated.push(
                SubtaskWithContext::resolve(db, subtask, task.title.clone(), task.created_by)
                    .await?,
            );
        }
        Ok(annotated)
    }

    pub async fn list(
        &self,
        query: SubtaskListQuery,
    ) -> Result<Paginated<Subtask>, SubtaskServiceError> {
        let db = &self.db.pool;
        let mut errors = FieldErrors::new();
        let filters = SubtaskFilters {
            task_id: validate::positive_id(&mut errors, "task_id", query.task_id),
            status: validate::parse_status(&mut errors, "status", query.status.as_deref()),
            assigned_to: validate::positive_id(&mut errors, "assigned_to", query.assigned_to),
            search: query.search.filter(|term| !term.trim().is_empty()),
        };
        if !errors.is_empty() {
            return Err(SubtaskServiceError::Validation(errors.into_vec()));
        }

        let (page, per_page) = clamp_pagination(query.page, query.limit);
        Ok(Subtask::search(db, filters, page, per_page).await?)
    }

    /// All subtasks bucketed by status, for cross-task dashboards.
    pub async fn board(&self) -> Result<StatusBuckets<Subtask>, SubtaskServiceError> {
        let subtasks = Subtask::find_all(&self.db.pool).await?;
        Ok(progress::bucket_by_status(subtasks, |subtask| {
            subtask.status
        }))
    }

    pub async fn get(&self, id: i64) -> Result<Subtask, SubtaskServiceError> {
        Subtask::find_by_id(&self.db.pool, id)
            .await?
            .ok_or(SubtaskServiceError::SubtaskNotFound)
    }

    pub async fn create(
        &self,
        request: CreateSubtaskRequest,
    ) -> Result<Subtask, SubtaskServiceError> {
        let db = &self.db.pool;
        let mut errors = FieldErrors::new();

        let task_id = match request.task_id {
            Some(value) => validate::positive_id(&mut errors, "task_id", Some(value)),
            None => {
                errors.push("task_id", "is required");
                None
            }
        };
        let title = validate::required_text(
            &mut errors,
            "title",
            request.title.as_deref(),
            TITLE_MIN,
            TITLE_MAX,
        );
        let description = validate::optional_text(
            &mut errors,
            "description",
            request.description.as_deref(),
            DESCRIPTION_MAX,
        )
        .flatten();
        let assigned_to = validate::positive_id(&mut errors, "assigned_to", request.assigned_to);
        let date = validate::parse_date(&mut errors, "date", request.date.as_deref());

        if !errors.is_empty() {
            return Err(SubtaskServiceError::Validation(errors.into_vec()));
        }
        let (task_id, title) = match (task_id, title) {
            (Some(task_id), Some(title)) => (task_id, title),
            _ => return Err(SubtaskServiceError::Validation(vec![
                "task_id and title are required".to_string(),
            ])),
        };

        // Referential checks happen before any write.
        if !Task::exists(db, task_id).await? {
            return Err(SubtaskServiceError::InvalidTaskId);
        }
        self.check_assignee(assigned_to).await?;

        let subtask = Subtask::create(
            db,
            &CreateSubtaskData {
                task_id,
                title,
                description,
                assigned_to,
                status: TaskStatus::Todo,
                comment: None,
                date,
            },
        )
        .await?;
        tracing::debug!("Created subtask {} under task {}", subtask.id, task_id);
        Ok(subtask)
    }

    pub async fn update(
        &self,
        id: i64,
        request: UpdateSubtaskRequest,
    ) -> Result<Subtask, SubtaskServiceError> {
        let db = &self.db.pool;
        if Subtask::find_by_id(db, id).await?.is_none() {
            return Err(SubtaskServiceError::SubtaskNotFound);
        }
        if request.is_empty() {
            return Err(SubtaskServiceError::NoFieldsProvided);
        }

        let mut errors = FieldErrors::new();
        let title = match request.title.as_deref() {
            Some(value) => {
                validate::required_text(&mut errors, "title", Some(value), TITLE_MIN, TITLE_MAX)
            }
            None => None,
        };
        let description = validate::optional_text(
            &mut errors,
            "description",
            request.description.as_deref(),
            DESCRIPTION_MAX,
        );
        let status = validate::parse_status(&mut errors, "status", request.status.as_deref());
        let comment = validate::optional_text(
            &mut errors,
            "comment",
            request.comment.as_deref(),
            COMMENT_MAX,
        );
        let date = validate::parse_date(&mut errors, "date", request.date.as_deref());
        let assigned_to = validate::positive_id(&mut errors, "assigned_to", request.assigned_to);

        if !errors.is_empty() {
            return Err(SubtaskServiceError::Validation(errors.into_vec()));
        }

        if request.assigned_to.is_some() {
            self.check_assignee(assigned_to).await?;
        }

        let subtask = Subtask::update(
            db,
            id,
            UpdateSubtaskData {
                title,
                description,
                assigned_to: assigned_to.map(Some),
                status,
                comment,
                date: date.map(Some),
            },
        )
        .await?;
        Ok(subtask)
    }

    pub async fn delete(&self, id: i64) -> Result<(), SubtaskServiceError> {
        let rows = Subtask::delete(&self.db.pool, id).await?;
        if rows == 0 {
            return Err(SubtaskServiceError::SubtaskNotFound);
        }
        tracing::debug!("Deleted subtask {}", id);
        Ok(())
    }

    /// Progress rollup for every task that has at least one subtask.
    pub async fn progress_summary(&self) -> Result<Vec<TaskProgress>, SubtaskServiceError> {
        let db = &self.db.pool;
        let tasks = Task::find_all(db).await?;
        let subtasks = Subtask::find_all(db).await?;
        Ok(progress::summarize(&tasks, &subtasks))
    }

    async fn check_assignee(&self, assigned_to: Option<i64>) -> Result<(), SubtaskServiceError> {
        if let Some(user_id) = assigned_to
            && User::find_active_by_id(&self.db.pool, user_id)
                .await?
                .is_none()
        {
            return Err(SubtaskServiceError::InvalidAssignee);
        }
        Ok(())
    }
}
