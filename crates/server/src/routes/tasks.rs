use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    http::HeaderMap,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::{
    pagination::Paginated,
    task::{Task, TaskWithNames, TaskWithSubtasks},
    user::User,
};
use services::services::{
    progress::{StatusBuckets, TaskProgress},
    task::{CreateTaskRequest, TaskListQuery, UpdateTaskRequest},
};
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError, middleware::load_task_middleware, routes::actor_id};

pub async fn get_tasks(
    State(state): State<AppState>,
    Query(query): Query<TaskListQuery>,
) -> Result<ResponseJson<ApiResponse<Paginated<TaskWithNames>>>, ApiError> {
    let page = state.tasks().list(query).await?;
    Ok(ResponseJson(ApiResponse::success(page)))
}

pub async fn get_task_board(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<StatusBuckets<TaskWithSubtasks>>>, ApiError> {
    let board = state.tasks().board().await?;
    Ok(ResponseJson(ApiResponse::success(board)))
}

pub async fn get_progress(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<TaskProgress>>>, ApiError> {
    let summary = state.subtasks().progress_summary().await?;
    Ok(ResponseJson(ApiResponse::success(summary)))
}

pub async fn get_task(
    Extension(task): Extension<Task>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<TaskWithNames>>, ApiError> {
    let task = state.tasks().get(task.id).await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn create_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<ResponseJson<ApiResponse<TaskWithNames>>, ApiError> {
    let actor = resolve_actor(&state, &headers).await?;
    let task = state.tasks().create(payload, actor).await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn update_task(
    Extension(task): Extension<Task>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<UpdateTaskRequest>,
) -> Result<ResponseJson<ApiResponse<TaskWithNames>>, ApiError> {
    let actor = resolve_actor(&state, &headers).await?;
    let task = state.tasks().update(task.id, payload, actor).await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn delete_task(
    Extension(task): Extension<Task>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    state.tasks().delete(task.id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

/// The header names the acting user; foreign keys written on their behalf
/// must point at a live account, so the id is checked here.
async fn resolve_actor(state: &AppState, headers: &HeaderMap) -> Result<i64, ApiError> {
    let actor = actor_id(headers)?;
    if User::find_active_by_id(&state.db().pool, actor)
        .await?
        .is_none()
    {
        return Err(ApiError::BadRequest(
            "X-User-Id does not match an active user".to_string(),
        ));
    }
    Ok(actor)
}

pub fn router(state: &AppState) -> Router<AppState> {
    let task_id_router = Router::new()
        .route("/", get(get_task).put(update_task).delete(delete_task))
        .layer(from_fn_with_state(state.clone(), load_task_middleware));

    let inner = Router::new()
        .route("/", get(get_tasks).post(create_task))
        .route("/kanban", get(get_task_board))
        .route("/board", get(get_task_board))
        .route("/progress", get(get_progress))
        .nest("/{task_id}", task_id_router);

    Router::new().nest("/tasks", inner)
}
