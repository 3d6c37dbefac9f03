use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(Users::Table)
                    .col(pk_id_col(manager, Users::Id))
                    .col(ColumnDef::new(Users::FirstName).string().not_null())
                    .col(ColumnDef::new(Users::LastName).string().not_null())
                    .col(ColumnDef::new(Users::Email).string().not_null())
                    .col(
                        ColumnDef::new(Users::Role)
                            .string_len(32)
                            .not_null()
                            .default(Expr::val("staff")),
                    )
                    .col(
                        ColumnDef::new(Users::Active)
                            .boolean()
                            .not_null()
                            .default(Expr::val(true)),
                    )
                    .col(timestamp_col(Users::CreatedAt))
                    .col(timestamp_col(Users::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_users_email")
                    .table(Users::Table)
                    .col(Users::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(Tasks::Table)
                    .col(pk_id_col(manager, Tasks::Id))
                    .col(ColumnDef::new(Tasks::Title).string().not_null())
                    .col(ColumnDef::new(Tasks::Description).text())
                    .col(fk_id_nullable_col(manager, Tasks::AssignedTo))
                    .col(fk_id_col(manager, Tasks::CreatedBy))
                    .col(
                        ColumnDef::new(Tasks::Status)
                            .string_len(32)
                            .not_null()
                            .default(Expr::val("todo")),
                    )
                    .col(
                        ColumnDef::new(Tasks::Priority)
                            .string_len(32)
                            .not_null()
                            .default(Expr::val("medium")),
                    )
                    .col(ColumnDef::new(Tasks::DueDate).date())
                    .col(
                        ColumnDef::new(Tasks::ApprovalStatus)
                            .string_len(32)
                            .not_null()
                            .default(Expr::val("pending")),
                    )
                    .col(fk_id_nullable_col(manager, Tasks::ApprovedBy))
                    .col(ColumnDef::new(Tasks::ApprovalDate).timestamp())
                    .col(timestamp_col(Tasks::CreatedAt))
                    .col(timestamp_col(Tasks::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tasks_assigned_to")
                            .from(Tasks::Table, Tasks::AssignedTo)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tasks_created_by")
                            .from(Tasks::Table, Tasks::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tasks_approved_by")
                            .from(Tasks::Table, Tasks::ApprovedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_tasks_status")
                    .table(Tasks::Table)
                    .col(Tasks::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_tasks_assigned_to")
                    .table(Tasks::Table)
                    .col(Tasks::AssignedTo)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_tasks_created_at")
                    .table(Tasks::Table)
                    .col(Tasks::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(Subtasks::Table)
                    .col(pk_id_col(manager, Subtasks::Id))
                    .col(fk_id_col(manager, Subtasks::TaskId))
                    .col(ColumnDef::new(Subtasks::Title).string().not_null())
                    .col(ColumnDef::new(Subtasks::Description).text())
                    .col(fk_id_nullable_col(manager, Subtasks::AssignedTo))
                    .col(
                        ColumnDef::new(Subtasks::Status)
                            .string_len(32)
                            .not_null()
                            .default(Expr::val("todo")),
                    )
                    .col(ColumnDef::new(Subtasks::Comment).text())
                    .col(ColumnDef::new(Subtasks::Date).date())
                    .col(timestamp_col(Subtasks::CreatedAt))
                    .col(timestamp_col(Subtasks::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_subtasks_task_id")
                            .from(Subtasks::Table, Subtasks::TaskId)
                            .to(Tasks::Table, Tasks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_subtasks_assigned_to")
                            .from(Subtasks::Table, Subtasks::AssignedTo)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_subtasks_task_id")
                    .table(Subtasks::Table)
                    .col(Subtasks::TaskId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_subtasks_status")
                    .table(Subtasks::Table)
                    .col(Subtasks::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(Documents::Table)
                    .col(pk_id_col(manager, Documents::Id))
                    .col(fk_id_col(manager, Documents::SubtaskId))
                    .col(ColumnDef::new(Documents::FileName).string().not_null())
                    .col(ColumnDef::new(Documents::FilePath).string().not_null())
                    .col(fk_id_col(manager, Documents::UploadedBy))
                    .col(timestamp_col(Documents::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_documents_subtask_id")
                            .from(Documents::Table, Documents::SubtaskId)
                            .to(Subtasks::Table, Subtasks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_documents_uploaded_by")
                            .from(Documents::Table, Documents::UploadedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_documents_subtask_id")
                    .table(Documents::Table)
                    .col(Documents::SubtaskId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Documents::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Subtasks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tasks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}

fn pk_id_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.not_null().auto_increment().primary_key().to_owned()
}

fn fk_id_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.not_null().to_owned()
}

fn fk_id_nullable_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.to_owned()
}

fn timestamp_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
    FirstName,
    LastName,
    Email,
    Role,
    Active,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Tasks {
    Table,
    Id,
    Title,
    Description,
    AssignedTo,
    CreatedBy,
    Status,
    Priority,
    DueDate,
    ApprovalStatus,
    ApprovedBy,
    ApprovalDate,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Subtasks {
    Table,
    Id,
    TaskId,
    Title,
    Description,
    AssignedTo,
    Status,
    Comment,
    Date,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Documents {
    Table,
    Id,
    SubtaskId,
    FileName,
    FilePath,
    UploadedBy,
    CreatedAt,
}
