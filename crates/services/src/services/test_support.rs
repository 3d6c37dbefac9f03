use db::{
    DBService,
    models::user::{CreateUser, User},
};

pub async fn test_db() -> DBService {
    let temp_root = std::env::temp_dir().join(format!("classtask-test-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&temp_root).unwrap();
    let db_url = format!(
        "sqlite://{}?mode=rwc",
        temp_root.join("db.sqlite").to_string_lossy()
    );
    DBService::from_url(&db_url).await.unwrap()
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
