use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{entities::user, types::UserRole};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: UserRole,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Option<UserRole>,
}

impl User {
    fn from_model(model: user::Model) -> Self {
        Self {
            id: model.id,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            role: model.role,
            active: model.active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: i64) -> Result<Option<Self>, DbErr> {
        let record = user::Entity::find_by_id(id).one(db).await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn find_active_by_id<C: ConnectionTrait>(
        db: &C,
        id: i64,
    ) -> Result<Option<Self>, DbErr> {
        let record = user::Entity::find()
            .filter(user::Column::Id.eq(id))
            .filter(user::Column::Active.eq(true))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn find_all_active<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, DbErr> {
        let models = user::Entity::find()
            .filter(user::Column::Active.eq(true))
            .order_by_asc(user::Column::LastName)
            .order_by_asc(user::Column::FirstName)
            .all(db)
            .await?;
        Ok(models.into_iter().map(Self::from_model).collect())
    }

    /// Resolves a user id to a display name, tolerating dangling references
    /// left behind by deactivated or removed accounts.
    pub async fn display_name_by_id<C: ConnectionTrait>(
        db: &C,
        id: i64,
    ) -> Result<Option<String>, DbErr> {
        Ok(Self::find_by_id(db, id).await?.map(|u| u.display_name()))
    }

    pub async fn create<C: ConnectionTrait>(db: &C, data: &CreateUser) -> Result<Self, DbErr> {
        let now = Utc::now();
        let active = user::ActiveModel {
            first_name: Set(data.first_name.clone()),
            last_name: Set(data.last_name.clone()),
            email: Set(data.email.clone()),
            role: Set(data.role.unwrap_or_default()),
            active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }

    pub async fn set_active<C: ConnectionTrait>(
        db: &C,
        id: i64,
        active: bool,
    ) -> Result<(), DbErr> {
        let record = user::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;
        let mut model: user::ActiveModel = record.into();
        model.active = Set(active);
        model.updated_at = Set(Utc::now());
        model.update(db).await?;
        Ok(())
    }
}
