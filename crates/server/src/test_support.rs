use db::{
    DBService,
    models::user::{CreateUser, User},
};
use uuid::Uuid;

use crate::AppState;

/// Fresh application state over a throwaway SQLite file, migrated on
/// connect.
pub async fn test_state() -> AppState {
    let temp_root = std::env::temp_dir().join(format!("classtask-test-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&temp_root).unwrap();
    let db_path = temp_root.join("db.sqlite");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.to_string_lossy());
    let db = DBService::from_url(&db_url).await.unwrap();
    AppState::new(db)
}

pub async fn seed_user(db: &DBService, first_name: &str, last_name: &str) -> User {
    User::create(
        &db.pool,
        &CreateUser {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: format!("{first_name}.{last_name}@school.test").to_lowercase(),
            role: None,
        },
    )
    .await
    .unwrap()
}
