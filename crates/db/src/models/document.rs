use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::entities::document;

/// File reference attached to a subtask. Storage mechanics live elsewhere;
/// this model only tracks the rows so cascade deletes stay observable.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Document {
    pub id: i64,
    pub subtask_id: i64,
    pub file_name: String,
    pub file_path: String,
    pub uploaded_by: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateDocumentData {
    pub subtask_id: i64,
    pub file_name: String,
    pub file_path: String,
    pub uploaded_by: i64,
}

impl Document {
    fn from_model(model: document::Model) -> Self {
        Self {
            id: model.id,
            subtask_id: model.subtask_id,
            file_name: model.file_name,
            file_path: model.file_path,
            uploaded_by: model.uploaded_by,
            created_at: model.created_at,
        }
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: i64) -> Result<Option<Self>, DbErr> {
        let record = document::Entity::find_by_id(id).one(db).await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn find_by_subtask_id<C: ConnectionTrait>(
        db: &C,
        subtask_id: i64,
    ) -> Result<Vec<Self>, DbErr> {
        let models = document::Entity::find()
            .filter(document::Column::SubtaskId.eq(subtask_id))
            .order_by_desc(document::Column::CreatedAt)
            .all(db)
            .await?;
        Ok(models.into_iter().map(Self::from_model).collect())
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateDocumentData,
    ) -> Result<Self, DbErr> {
        let active = document::ActiveModel {
            subtask_id: Set(data.subtask_id),
            file_name: Set(data.file_name.clone()),
            file_path: Set(data.file_path.clone()),
            uploaded_by: Set(data.uploaded_by),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }
}
