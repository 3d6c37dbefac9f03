use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::{
    pagination::Paginated,
    subtask::{Subtask, SubtaskWithContext},
};
use services::services::{
    progress::StatusBuckets,
    subtask::{CreateSubtaskRequest, SubtaskListQuery, UpdateSubtaskRequest},
};
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError, middleware::load_subtask_middleware};

pub async fn get_subtasks(
    State(state): State<AppState>,
    Query(query): Query<SubtaskListQuery>,
) -> Result<ResponseJson<ApiResponse<Paginated<Subtask>>>, ApiError> {
    let page = state.subtasks().list(query).await?;
    Ok(ResponseJson(ApiResponse::success(page)))
}

pub async fn get_subtask_board(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<StatusBuckets<Subtask>>>, ApiError> {
    let board = state.subtasks().board().await?;
    Ok(ResponseJson(ApiResponse::success(board)))
}

pub async fn get_subtasks_by_task(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
) -> Result<ResponseJson<ApiResponse<Vec<SubtaskWithContext>>>, ApiError> {
    let subtasks = state.subtasks().list_by_task(task_id).await?;
    Ok(ResponseJson(ApiResponse::success(subtasks)))
}

pub async fn get_subtask(
    Extension(subtask): Extension<Subtask>,
) -> Result<ResponseJson<ApiResponse<Subtask>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(subtask)))
}

pub async fn create_subtask(
    State(state): State<AppState>,
    Json(payload): Json<CreateSubtaskRequest>,
) -> Result<ResponseJson<ApiResponse<Subtask>>, ApiError> {
    let subtask = state.subtasks().create(payload).await?;
    Ok(ResponseJson(ApiResponse::success(subtask)))
}

pub async fn update_subtask(
    Extension(subtask): Extension<Subtask>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateSubtaskRequest>,
) -> Result<ResponseJson<ApiResponse<Subtask>>, ApiError> {
    let subtask = state.subtasks().update(subtask.id, payload).await?;
    Ok(ResponseJson(ApiResponse::success(subtask)))
}

pub async fn delete_subtask(
    Extension(subtask): Extension<Subtask>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    state.subtasks().delete(subtask.id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let subtask_id_router = Router::new()
        .route(
            "/",
            get(get_subtask).put(update_subtask).delete(delete_subtask),
        )
        .layer(from_fn_with_state(state.clone(), load_subtask_middleware));

    let inner = Router::new()
        .route("/", get(get_subtasks).post(create_subtask))
        .route("/board", get(get_subtask_board))
        .route("/by-task/{task_id}", get(get_subtasks_by_task))
        .nest("/{subtask_id}", subtask_id_router);

    Router::new().nest("/subtasks", inner)
}
