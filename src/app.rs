use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{delete, get, post, put},
    Router,
};

pub fn router(state: AppState) -> Router {
    let users = Router::new()
        .route("/goals", get(handlers::list_goals).post(handlers::create_goal))
        .route(
            "/goals/:goal_id",
            put(handlers::update_goal).delete(handlers::delete_goal),
        )
        .route("/goals/:goal_id/sessions", post(handlers::log_session))
        .route("/goals/:goal_id/toggle", post(handlers::toggle_goal))
        .route("/days", get(handlers::list_days))
        .route("/days/:date", get(handlers::get_day))
        .route("/remote/goals/:date", get(handlers::remote_goals))
        .route("/hydrate", post(handlers::hydrate))
        .route("/stats", get(handlers::get_stats))
        .route("/user-stats", get(handlers::get_user_stats))
        .route("/check-in", post(handlers::check_in))
        .route("/todos", get(handlers::list_todos).post(handlers::add_todo))
        .route("/todos/:todo_id", delete(handlers::delete_todo))
        .route("/todos/:todo_id/toggle", post(handlers::toggle_todo));

    Router::new()
        .route("/api/health", get(handlers::health))
        .route(
            "/api/themes/current",
            get(handlers::get_theme).put(handlers::set_theme),
        )
        .nest("/api/users/:user_id", users)
        .with_state(state)
}
