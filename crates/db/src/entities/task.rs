use sea_orm::entity::prelude::*;

use crate::types::{ApprovalStatus, TaskPriority, TaskStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tasks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: Option<i64>,
    pub created_by: i64,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<Date>,
    pub approval_status: ApprovalStatus,
    pub approved_by: Option<i64>,
    pub approval_date: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
