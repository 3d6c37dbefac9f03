use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
    sea_query::{Expr, ExprTrait, Func},
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub use crate::types::TaskStatus;

use crate::{
    entities::subtask,
    models::{pagination::Paginated, user::User},
};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Subtask {
    pub id: i64,
    pub task_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: Option<i64>,
    pub status: TaskStatus,
    pub comment: Option<String>,
    pub date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A subtask annotated with its assignee name and the parent task context
/// the checklist screens display next to each row.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct SubtaskWithContext {
    #[serde(flatten)]
    #[ts(flatten)]
    pub subtask: Subtask,
    pub assigned_to_name: Option<String>,
    pub task_title: String,
    pub task_created_by_name: Option<String>,
}

impl std::ops::Deref for SubtaskWithContext {
    type Target = Subtask;
    fn deref(&self) -> &Self::Target {
        &self.subtask
    }
}

#[derive(Debug, Clone)]
pub struct CreateSubtaskData {
    pub task_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: Option<i64>,
    pub status: TaskStatus,
    pub comment: Option<String>,
    pub date: Option<NaiveDate>,
}

/// Partial update; outer `Option` means "field supplied".
#[derive(Debug, Clone, Default)]
pub struct UpdateSubtaskData {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub assigned_to: Option<Option<i64>>,
    pub status: Option<TaskStatus>,
    pub comment: Option<Option<String>>,
    pub date: Option<Option<NaiveDate>>,
}

#[derive(Debug, Clone, Default)]
pub struct SubtaskFilters {
    pub task_id: Option<i64>,
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<i64>,
    pub search: Option<String>,
}

impl SubtaskFilters {
    fn into_condition(self) -> Condition {
        let mut cond = Condition::all();
        if let Some(task_id) = self.task_id {
            cond = cond.add(subtask::Column::TaskId.eq(task_id));
        }
        if let Some(status) = self.status {
            cond = cond.add(subtask::Column::Status.eq(status));
        }
        if let Some(assigned_to) = self.assigned_to {
            cond = cond.add(subtask::Column::AssignedTo.eq(assigned_to));
        }
        if let Some(term) = self.search {
            let pattern = super::search_pattern(&term);
            cond = cond.add(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col((
                            subtask::Entity,
                            subtask::Column::Title,
                        ))))
                        .like(pattern.clone()),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col((
                            subtask::Entity,
                            subtask::Column::Description,
                        ))))
                        .like(pattern),
                    ),
            );
        }
        cond
    }
}

impl Subtask {
    fn from_model(model: subtask::Model) -> Self {
        Self {
            id: model.id,
            task_id: model.task_id,
            title: model.title,
            description: model.description,
            assigned_to: model.assigned_to,
            status: model.status,
            comment: model.comment,
            date: model.date,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: i64) -> Result<Option<Self>, DbErr> {
        let record = subtask::Entity::find_by_id(id).one(db).await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn find_by_task_id<C: ConnectionTrait>(
        db: &C,
        task_id: i64,
    ) -> Result<Vec<Self>, DbErr> {
        let models = subtask::Entity::find()
            .filter(subtask::Column::TaskId.eq(task_id))
            .order_by_desc(subtask::Column::CreatedAt)
            .order_by_desc(subtask::Column::Id)
            .all(db)
            .await?;
        Ok(models.into_iter().map(Self::from_model).collect())
    }

    pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, DbErr> {
        let models = subtask::Entity::find()
            .order_by_desc(subtask::Column::CreatedAt)
            .order_by_desc(subtask::Column::Id)
            .all(db)
            .await?;
        Ok(models.into_iter().map(Self::from_model).collect())
    }

    pub async fn search<C: ConnectionTrait>(
        db: &C,
        filters: SubtaskFilters,
        page: u64,
        per_page: u64,
    ) -> Result<Paginated<Self>, DbErr> {
        let paginator = subtask::Entity::find()
            .filter(filters.into_condition())
            .order_by_desc(subtask::Column::CreatedAt)
            .order_by_desc(subtask::Column::Id)
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

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateSubtaskData,
    ) -> Result<Self, DbErr> {
        let now = Utc::now();
        let active = subtask::ActiveModel {
            task_id: Set(data.task_id),
            title: Set(data.title.clone()),
            description: Set(data.description.clone()),
            assigned_to: Set(data.assigned_to),
            status: Set(data.status),
            comment: Set(data.comment.clone()),
            date: Set(data.date),
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
        data: UpdateSubtaskData,
    ) -> Result<Self, DbErr> {
        let record = subtask::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Subtask not found".to_string()))?;

        let mut active: subtask::ActiveModel = record.into();
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
        if let Some(comment) = data.comment {
            active.comment = Set(comment);
        }
        if let Some(date) = data.date {
            active.date = Set(date);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(db).await?;
        Ok(Self::from_model(updated))
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: i64) -> Result<u64, DbErr> {
        let result = subtask::Entity::delete_many()
            .filter(subtask::Column::Id.eq(id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}

impl SubtaskWithContext {
    pub async fn resolve<C: ConnectionTrait>(
        db: &C,
        subtask: Subtask,
        task_title: String,
        task_created_by: i64,
    ) -> Result<Self, DbErr> {
        let assigned_to_name = match subtask.assigned_to {
            Some(id) => User::display_name_by_id(db, id).await?,
            None => None,
        };
        let task_created_by_name = User::display_name_by_id(db, task_created_by).await?;
        Ok(Self {
            subtask,
            assigned_to_name,
            task_title,
            task_created_by_name,
        })
    }
}
