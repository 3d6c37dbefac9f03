use axum::{Router, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{AppState, routes};

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(routes::tasks::router(&state))
        .merge(routes::subtasks::router(&state))
        .merge(routes::users::router());

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::test_support::{seed_user, test_state};

    async fn setup_app() -> (Router, i64) {
        let state = test_state().await;
        let user = seed_user(state.db(), "Ada", "Lovelace").await;
        (super::router(state), user.id)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn json_request(method: &str, uri: &str, actor: Option<i64>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(actor) = actor {
            builder = builder.header("X-User-Id", actor.to_string());
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint_responds() {
        let (app, _) = setup_app().await;
        let (status, body) = send(&app, get_request("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["data"], json!("OK"));
    }

    #[tokio::test]
    async fn create_task_requires_actor_header() {
        let (app, _) = setup_app().await;
        let (status, body) = send(
            &app,
            json_request("POST", "/api/tasks", None, json!({"title": "Plan term"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], json!(false));
        assert!(body["message"].as_str().unwrap().contains("X-User-Id"));
    }

    #[tokio::test]
    async fn task_lifecycle_over_http() {
        let (app, actor) = setup_app().await;

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/tasks",
                Some(actor),
                json!({"title": "Plan term", "priority": "high"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], json!("todo"));
        assert_eq!(body["data"]["priority"], json!("high"));
        assert_eq!(body["data"]["approval_status"], json!("pending"));
        let task_id = body["data"]["id"].as_i64().unwrap();

        let (status, body) = send(&app, get_request(&format!("/api/tasks/{task_id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["created_by_name"], json!("Ada Lovelace"));

        let (status, body) = send(
            &app,
            json_request(
                "PUT",
                &format!("/api/tasks/{task_id}"),
                Some(actor),
                json!({"status": "in_progress"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], json!("in_progress"));

        let (status, body) = send(
            &app,
            json_request(
                "DELETE",
                &format!("/api/tasks/{task_id}"),
                Some(actor),
                json!({}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));

        let (status, _) = send(&app, get_request(&format!("/api/tasks/{task_id}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn validation_failures_return_every_violation() {
        let (app, actor) = setup_app().await;
        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/tasks",
                Some(actor),
                json!({"title": "ab", "priority": "urgent", "due_date": "2024-02-30"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let message = body["message"].as_str().unwrap();
        assert!(message.contains("title"));
        assert!(message.contains("priority"));
        assert!(message.contains("due_date"));
    }

    #[tokio::test]
    async fn unknown_task_returns_not_found_envelope() {
        let (app, _) = setup_app().await;
        let (status, _) = send(&app, get_request("/api/tasks/4242")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn subtask_routes_enforce_parent_references() {
        let (app, actor) = setup_app().await;

        let (status, _) = send(
            &app,
            json_request(
                "POST",
                "/api/subtasks",
                None,
                json!({"task_id": 9999, "title": "Orphan"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, get_request("/api/subtasks/by-task/9999")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/tasks",
                Some(actor),
                json!({"title": "Open house"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let task_id = body["data"]["id"].as_i64().unwrap();

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/subtasks",
                None,
                json!({"task_id": task_id, "title": "Print flyers"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], json!("todo"));

        let (status, body) = send(
            &app,
            get_request(&format!("/api/subtasks/by-task/{task_id}")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["task_title"], json!("Open house"));
    }

    #[tokio::test]
    async fn kanban_path_serves_the_board() {
        let (app, actor) = setup_app().await;
        send(
            &app,
            json_request(
                "POST",
                "/api/tasks",
                Some(actor),
                json!({"title": "Write newsletter"}),
            ),
        )
        .await;

        let (status, body) = send(&app, get_request("/api/tasks/kanban")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["todo"].as_array().unwrap().len(), 1);

        // Same view under the shorter path.
        let (status, alias_body) = send(&app, get_request("/api/tasks/board")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(alias_body, body);
    }

    #[tokio::test]
    async fn subtask_fields_accept_prefixed_names() {
        let (app, actor) = setup_app().await;
        let (_, body) = send(
            &app,
            json_request(
                "POST",
                "/api/tasks",
                Some(actor),
                json!({"title": "Open house"}),
            ),
        )
        .await;
        let task_id = body["data"]["id"].as_i64().unwrap();

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/subtasks",
                None,
                json!({
                    "relation_task_id": task_id,
                    "subtask_title": "Print flyers",
                    "subtask_description": "two hundred copies",
                    "subtask_date": "2026-09-01"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["title"], json!("Print flyers"));
        let subtask_id = body["data"]["id"].as_i64().unwrap();

        let (status, body) = send(
            &app,
            json_request(
                "PUT",
                &format!("/api/subtasks/{subtask_id}"),
                None,
                json!({"subtask_status": "done", "subtask_comment": "delivered"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], json!("done"));
        assert_eq!(body["data"]["comment"], json!("delivered"));

        let (status, body) = send(
            &app,
            get_request(&format!(
                "/api/subtasks?relation_task_id={task_id}&subtask_status=done"
            )),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total_items"], json!(1));
    }

    #[tokio::test]
    async fn progress_endpoint_reports_rollups() {
        let (app, actor) = setup_app().await;

        let (_, body) = send(
            &app,
            json_request(
                "POST",
                "/api/tasks",
                Some(actor),
                json!({
                    "title": "Festival prep",
                    "subtasks": [
                        {"title": "Book hall"},
                        {"title": "Invite parents"},
                        {"title": "Order banners"}
                    ]
                }),
            ),
        )
        .await;
        let task_id = body["data"]["id"].as_i64().unwrap();

        let (_, body) = send(
            &app,
            get_request(&format!("/api/subtasks/by-task/{task_id}")),
        )
        .await;
        let subtask_id = body["data"][0]["id"].as_i64().unwrap();
        let (status, _) = send(
            &app,
            json_request(
                "PUT",
                &format!("/api/subtasks/{subtask_id}"),
                None,
                json!({"status": "done"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, get_request("/api/tasks/progress")).await;
        assert_eq!(status, StatusCode::OK);
        let summary = body["data"].as_array().unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0]["total_subtasks"], json!(3));
        assert_eq!(summary[0]["done_count"], json!(1));
        assert_eq!(summary[0]["completion_percentage"], json!(33.33));
    }

    #[tokio::test]
    async fn users_can_be_created_and_listed() {
        let (app, _) = setup_app().await;

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/users",
                None,
                json!({
                    "first_name": "Grace",
                    "last_name": "Hopper",
                    "email": "grace.hopper@school.test",
                    "role": "teacher"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["role"], json!("teacher"));

        let (status, _) = send(
            &app,
            json_request("POST", "/api/users", None, json!({"email": "nobody"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, get_request("/api/users")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
    }
}
