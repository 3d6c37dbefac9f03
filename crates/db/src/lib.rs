use db_migration::Migrator;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

pub use sea_orm::{DbErr, TransactionTrait};

pub mod entities;
pub mod models;
pub mod types;

#[derive(Clone)]
pub struct DBService {
    pub pool: DatabaseConnection,
}

impl DBService {
    /// Connects using `DATABASE_URL`, falling back to a SQLite file in the
    /// asset directory, and brings the schema up to date.
    pub async fn new() -> Result<DBService, DbErr> {
        let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| {
            format!(
                "sqlite://{}?mode=rwc",
                utils::assets::db_path().to_string_lossy()
            )
        });
        Self::from_url(&database_url).await
    }

    pub async fn from_url(database_url: &str) -> Result<DBService, DbErr> {
        let mut options = ConnectOptions::new(database_url);
        options.sqlx_logging(false);
        let pool = Database::connect(options).await?;
        Migrator::up(&pool, None).await?;
        Ok(DBService { pool })
    }
}
