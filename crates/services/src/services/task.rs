use std::collections::HashMap;

use chrono::Utc;
use db::{
    DBService, DbErr, TransactionTrait,
    models::{
        pagination::Paginated,
        subtask::{CreateSubtaskData, Subtask},
        task::{
            CreateTaskData, Task, TaskFilters, TaskWithNames, TaskWithSubtasks, UpdateTaskData,
        },
        user::User,
    },
    types::{ApprovalStatus, TaskStatus},
};
use serde::Deserialize;
use thiserror::Error;
use ts_rs::TS;

use super::{
    progress::{self, StatusBuckets},
    validate::{self, FieldErrors},
};

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

const TITLE_MIN: usize = 3;
const TITLE_MAX: usize = 255;
const DESCRIPTION_MAX: usize = 1000;
const SUBTASK_TITLE_MIN: usize = 1;
const SUBTASK_TITLE_MAX: usize = 255;
const SUBTASK_DESCRIPTION_MAX: usize = 5000;

#[derive(Debug, Error)]
pub enum TaskServiceError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("Task not found")]
    TaskNotFound,
    #[error("Assigned user not found or inactive")]
    InvalidAssignee,
    #[error("No fields provided to update")]
    NoFieldsProvided,
}

/// Create payload. Enum and date fields arrive as strings so the
/// validation layer can report every bad value in one response instead of
/// failing at deserialization.
#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assigned_to: Option<i64>,
    pub priority: Option<String>,
    pub due_date: Option<String>,
    /// Optional checklist created together with the task in one
    /// transaction.
    #[serde(default)]
    pub subtasks: Vec<InlineSubtask>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct InlineSubtask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assigned_to: Option<i64>,
    pub date: Option<String>,
}

/// Partial update: absent fields keep their stored value. An empty
/// `description` clears the column.
#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assigned_to: Option<i64>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<String>,
    pub approval_status: Option<String>,
}

impl UpdateTaskRequest {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.assigned_to.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.approval_status.is_none()
    }
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct TaskListQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assigned_to: Option<i64>,
    pub created_by: Option<i64>,
    pub approval_status: Option<String>,
    pub search: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

pub fn clamp_pagination(page: Option<u64>, limit: Option<u64>) -> (u64, u64) {
    let page = page.unwrap_or(1).max(1);
    let per_page = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    (page, per_page)
}

#[derive(Clone)]
pub struct TaskService {
    db: DBService,
}

struct ValidatedSubtask {
    title: String,
    description: Option<String>,
    assigned_to: Option<i64>,
    date: Option<chrono::NaiveDate>,
}

impl TaskService {
    pub fn new(db: DBService) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        query: TaskListQuery,
    ) -> Result<Paginated<TaskWithNames>, TaskServiceError> {
        let db = &self.db.pool;
        let mut errors = FieldErrors::new();
        let filters = TaskFilters {
            status: validate::parse_status(&mut errors, "status", query.status.as_deref()),
            priority: validate::parse_priority(&mut errors, "priority", query.priority.as_deref()),
            assigned_to: validate::positive_id(&mut errors, "assigned_to", query.assigned_to),
            created_by: validate::positive_id(&mut errors, "created_by", query.created_by),
            approval_status: validate::parse_approval_status(
                &mut errors,
                "approval_status",
                query.approval_status.as_deref(),
            ),
            search: query.search.filter(|term| !term.trim().is_empty()),
        };
        if !errors.is_empty() {
            return Err(TaskServiceError::Validation(errors.into_vec()));
        }

        let (page, per_page) = clamp_pagination(query.page, query.limit);
        let result = Task::search(db, filters, page, per_page).await?;

        let items = TaskWithNames::resolve_many(db, result.items).await?;
        Ok(Paginated {
            items,
            total_items: result.total_items,
            page: result.page,
            per_page: result.per_page,
            total_pages: result.total_pages,
        })
    }

    /// Tasks grouped into board columns, each with its resolved subtasks.
    /// Unpaginated; meant for board rendering over small task counts.
    pub async fn board(&self) -> Result<StatusBuckets<TaskWithSubtasks>, TaskServiceError> {
        let db = &self.db.pool;
        let tasks = Task::find_all(db).await?;
        let with_names = TaskWithNames::resolve_many(db, tasks).await?;

        let mut by_task: HashMap<i64, Vec<Subtask>> = HashMap::new();
        for subtask in Subtask::find_all(db).await? {
            by_task.entry(subtask.task_id).or_default().push(subtask);
        }

        let items = with_names
            .into_iter()
            .map(|task| TaskWithSubtasks {
                subtasks: by_task.remove(&task.id).unwrap_or_default(),
                task,
            })
            .collect();

        Ok(progress::bucket_by_status(items, |item| item.task.status))
    }

    pub async fn get(&self, id: i64) -> Result<TaskWithNames, TaskServiceError> {
        let db = &self.db.pool;
        let task = Task::find_by_id(db, id)
            .await?
            .ok_or(TaskServiceError::TaskNotFound)?;
        Ok(TaskWithNames::resolve(db, task).await?)
    }

    /// Creates a task (and any inline subtasks) on behalf of `created_by`.
    /// All validation happens before the transaction is opened; the
    /// multi-row write commits or rolls back as a unit.
    pub async fn create(
        &self,
        request: CreateTaskRequest,
        created_by: i64,
    ) -> Result<TaskWithNames, TaskServiceError> {
        let db = &self.db.pool;
        let mut errors = FieldErrors::new();

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
        let priority =
            validate::parse_priority(&mut errors, "priority", request.priority.as_deref());
        let due_date = validate::parse_date(&mut errors, "due_date", request.due_date.as_deref());
        let assigned_to = validate::positive_id(&mut errors, "assigned_to", request.assigned_to);

        let mut subtasks = Vec::with_capacity(request.subtasks.len());
        for (index, inline) in request.subtasks.iter().enumerate() {
            subtasks.push(ValidatedSubtask {
                title: validate::required_text(
                    &mut errors,
                    &format!("subtasks[{index}].title"),
                    inline.title.as_deref(),
                    SUBTASK_TITLE_MIN,
                    SUBTASK_TITLE_MAX,
                )
                .unwrap_or_default(),
                description: validate::optional_text(
                    &mut errors,
                    &format!("subtasks[{index}].description"),
                    inline.description.as_deref(),
                    SUBTASK_DESCRIPTION_MAX,
                )
                .flatten(),
                assigned_to: validate::positive_id(
                    &mut errors,
                    &format!("subtasks[{index}].assigned_to"),
                    inline.assigned_to,
                ),
                date: validate::parse_date(
                    &mut errors,
                    &format!("subtasks[{index}].date"),
                    inline.date.as_deref(),
                ),
            });
        }

        if !errors.is_empty() {
            return Err(TaskServiceError::Validation(errors.into_vec()));
        }
        let title = title.ok_or(TaskServiceError::Validation(vec![
            "title must be provided".to_string(),
        ]))?;

        self.check_assignee(assigned_to).await?;
        for subtask in &subtasks {
            self.check_assignee(subtask.assigned_to).await?;
        }

        let tx = self.db.pool.begin().await?;
        let task = Task::create(
            &tx,
            &CreateTaskData {
                title,
                description,
                assigned_to,
                created_by,
                status: TaskStatus::Todo,
                priority: priority.unwrap_or_default(),
                due_date,
                approval_status: ApprovalStatus::Pending,
            },
        )
        .await?;
        for subtask in subtasks {
            Subtask::create(
                &tx,
                &CreateSubtaskData {
                    task_id: task.id,
                    title: subtask.title,
                    description: subtask.description,
                    assigned_to: subtask.assigned_to,
                    status: TaskStatus::Todo,
                    comment: None,
                    date: subtask.date,
                },
            )
            .await?;
        }
        tx.commit().await?;

        tracing::debug!("Created task {} for user {}", task.id, created_by);
        self.get(task.id).await
    }

    pub async fn update(
        &self,
        id: i64,
        request: UpdateTaskRequest,
        actor: i64,
    ) -> Result<TaskWithNames, TaskServiceError> {
        let db = &self.db.pool;
        if !Task::exists(db, id).await? {
            return Err(TaskServiceError::TaskNotFound);
        }
        if request.is_empty() {
            return Err(TaskServiceError::NoFieldsProvided);
        }

        let mut errors = FieldErrors::new();
        // Absent title means "keep existing"; only a supplied title is
        // checked against the length rule.
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
        let priority =
            validate::parse_priority(&mut errors, "priority", request.priority.as_deref());
        let due_date = validate::parse_date(&mut errors, "due_date", request.due_date.as_deref());
        let approval_status = validate::parse_approval_status(
            &mut errors,
            "approval_status",
            request.approval_status.as_deref(),
        );
        let assigned_to = validate::positive_id(&mut errors, "assigned_to", request.assigned_to);

        if !errors.is_empty() {
            return Err(TaskServiceError::Validation(errors.into_vec()));
        }

        if request.assigned_to.is_some() {
            self.check_assignee(assigned_to).await?;
        }

        let mut data = UpdateTaskData {
            title,
            description,
            assigned_to: assigned_to.map(Some),
            status,
            priority,
            due_date: due_date.map(Some),
            approval_status,
            ..Default::default()
        };
        // Approval transitions stamp the acting user; resetting to pending
        // clears the stamp.
        match approval_status {
            Some(ApprovalStatus::Approved) | Some(ApprovalStatus::Rejected) => {
                data.approved_by = Some(Some(actor));
                data.approval_date = Some(Some(Utc::now()));
            }
            Some(ApprovalStatus::Pending) => {
                data.approved_by = Some(None);
                data.approval_date = Some(None);
            }
            None => {}
        }

        let task = Task::update(db, id, data).await?;
        Ok(TaskWithNames::resolve(db, task).await?)
    }

    pub async fn delete(&self, id: i64) -> Result<(), TaskServiceError> {
        let rows = Task::delete(&self.db.pool, id).await?;
        if rows == 0 {
            return Err(TaskServiceError::TaskNotFound);
        }
        tracing::debug!("Deleted task {}", id);
        Ok(())
    }

    async fn check_assignee(&self, assigned_to: Option<i64>) -> Result<(), TaskServiceError> {
        if let Some(user_id) = assigned_to
            && User::find_active_by_id(&self.db.pool, user_id)
                .await?
                .is_none()
        {
            return Err(TaskServiceError::InvalidAssignee);
        }
        Ok(())
    }
}
