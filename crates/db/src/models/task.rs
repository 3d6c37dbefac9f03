use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
    sea_query::{Expr, ExprTrait, Func},
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub use crate::types::{ApprovalStatus, TaskPriority, TaskStatus};

use crate::{
    entities::task,
    models::{pagination::Paginated, subtask::Subtask, user::User},
};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: Option<i64>,
    pub created_by: i64,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
    pub approval_status: ApprovalStatus,
    pub approved_by: Option<i64>,
    pub approval_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A task with referenced users resolved to display names for rendering.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct TaskWithNames {
    #[serde(flatten)]
    #[ts(flatten)]
    pub task: Task,
    pub assigned_to_name: Option<String>,
    pub created_by_name: Option<String>,
    pub approved_by_name: Option<String>,
}

impl std::ops::Deref for TaskWithNames {
    type Target = Task;
    fn deref(&self) -> &Self::Target {
        &self.task
    }
}

/// Board payload: a task plus its resolved subtask rows.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct TaskWithSubtasks {
    #[serde(flatten)]
    #[ts(flatten)]
    pub task: TaskWithNames,
    pub subtasks: Vec<Subtask>,
}

/// Validated create payload; defaults are filled in by the service layer.
#[derive(Debug, Clone)]
pub struct CreateTaskData {
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: Option<i64>,
    pub created_by: i64,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
    pub approval_status: ApprovalStatus,
}

/// Partial update: the outer `Option` means "field supplied", the inner one
/// carries nullable columns.
#[derive(Debug, Clone, Default)]
pub struct UpdateTaskData {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub assigned_to: Option<Option<i64>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<Option<NaiveDate>>,
    pub approval_status: Option<ApprovalStatus>,
    pub approved_by: Option<Option<i64>>,
    pub approval_date: Option<Option<DateTime<Utc>>>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskFilters {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assigned_to: Option<i64>,
    pub created_by: Option<i64>,
    pub approval_status: Option<ApprovalStatus>,
    pub search: Option<String>,
}

impl TaskFilters {
    fn into_condition(self) -> Condition {
        let mut cond = Condition::all();
        if let Some(status) = self.status {
            cond = cond.add(task::Column::Status.eq(status));
        }
        if let Some(priority) = self.priority {
            cond = cond.add(task::Column::Priority.eq(priority));
        }
        if let Some(assigned_to) = self.assigned_to {
            cond = cond.add(task::Column::AssignedTo.eq(assigned_to));
        }
        if let Some(created_by) = self.created_by {
            cond = cond.add(task::Column::CreatedBy.eq(created_by));
        }
        if let Some(approval_status) = self.approval_status {
            cond = cond.add(task::Column::ApprovalStatus.eq(approval_status));
        }
        if let Some(term) = self.search {
            let pattern = super::search_pattern(&term);
            cond = cond.add(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col((task::Entity, task::Column::Title))))
                            .like(pattern.clone()),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col((
                            task::Entity,
                            task::Column::Description,
                        ))))
                        .like(pattern),
                    ),
            );
        }
        cond
    }
}

impl Task {
    fn from_model(model: task::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            assigned_to: model.assigned_to,
            created_by: model.created_by,
            status: model.status,
            priority: model.priority,
            due_date: model.due_date,
            approval_status: model.approval_status,
            approved_by: model.approved_by,
            approval_date: model.approval_date,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: i64) -> Result<Option<Self>, DbErr> {
        let record = task::Entity::find_by_id(id).one(db).await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn exists<C: ConnectionTrait>(db: &C, id: i64) -> Result<bool, DbErr> {
        Ok(task::Entity::find_by_id(id).one(db).await?.is_some())
    }

    /// All tasks, newest first. Ties on the creation instant fall back to
    /// the primary key so listing order stays deterministic.
    pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, DbErr> {
        let models = task::Entity::find()
            .order_by_desc(task::Column::CreatedAt)
            .order_by_desc(task::Column::Id)
            .all(db)
            .await?;
        Ok(models.into_iter().map(Self::from_model).collect())
    }

    pub async fn search<C: ConnectionTrait>(
        db: &C,
        filters: TaskFilters,
        page: u64,
        per_page: u64,
    ) -> Result<Paginated<Self>, DbErr> {
        let paginator = task::Entity::find()
            .filter(filters.into_condition())
            .order_by_desc(task::Column::CreatedAt)
            .order_by_desc(task::Column::Id)
            .paginate(db, per_page);

        let counts = paginator.num_items_and_pages().await?;
        let models = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok(Paginated {
            items: models.into_iter().map(Self::from_model).collect(),
            total_items: counts.number_of_items,
            page,
            per_page,
            total_pages: counts.number_of_pages,
        })
    }

    pub async fn create<C: ConnectionTrait>(db: &C, data: &CreateTaskData) -> Result<Self, DbErr> {
        let now = Utc::now();
        let active = task::ActiveModel {
            title: Set(data.title.clone()),
            description: Set(data.description.clone()),
            assigned_to: Set(data.assigned_to),
            created_by: Set(data.created_by),
            status: Set(data.status),
            priority: Set(data.priority),
            due_date: Set(data.due_date),
            approval_status: Set(data.approval_status),
            approved_by: Set(None),
            approval_date: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }

    pub async fn update<C: ConnectionTrait>(
        db: &C,
        id: i64,
        data: UpdateTaskData,
    ) -> Result<Self, DbErr> {
        let record = task::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Task not found".to_string()))?;

        let mut active: task::ActiveModel = record.into();
        if let Some(title) = data.title {
            active.title = Set(title);
        }
        if let Some(description) = data.description {
            active.description = Set(description);
        }
        if let Some(assigned_to) = data.assigned_to {
            active.assigned_to = Set(assigned_to);
        }
        if let Some(status) = data.status {
            active.status = Set(status);
        }
        if let Some(priority) = data.priority {
            active.priority = Set(priority);
        }
        if let Some(due_date) = data.due_date {
            active.due_date = Set(due_date);
        }
        if let Some(approval_status) = data.approval_status {
            active.approval_status = Set(approval_status);
        }
        if let Some(approved_by) = data.approved_by {
            active.approved_by = Set(approved_by);
        }
        if let Some(approval_date) = data.approval_date {
            active.approval_date = Set(approval_date);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(db).await?;
        Ok(Self::from_model(updated))
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: i64) -> Result<u64, DbErr> {
        let result = task::Entity::delete_many()
            .filter(task::Column::Id.eq(id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}

impl TaskWithNames {
    pub async fn resolve<C: ConnectionTrait>(db: &C, task: Task) -> Result<Self, DbErr> {
        let assigned_to_name = match task.assigned_to {
            Some(id) => User::display_name_by_id(db, id).await?,
            None => None,
        };
        let created_by_name = User::display_name_by_id(db, task.created_by).await?;
        let approved_by_name = match task.approved_by {
            Some(id) => User::display_name_by_id(db, id).await?,
            None => None,
        };
        Ok(Self {
            task,
            assigned_to_name,
            created_by_name,
            approved_by_name,
        })
    }

    pub async fn resolve_many<C: ConnectionTrait>(
        db: &C,
        tasks: Vec<Task>,
    ) -> Result<Vec<Self>, DbErr> {
        let mut resolved = Vec::with_capacity(tasks.len());
        for task in tasks {
            resolved.push(Self::resolve(db, task).await?);
        }
        Ok(resolved)
    }
}
