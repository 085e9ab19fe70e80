use crate::days::today;
use crate::errors::AppError;
use crate::models::{
    CheckInResponse, DayMap, DayResponse, Goal, HealthResponse, HydrateResponse, NewGoal, NewTodo,
    SessionRequest, StatsResponse, Theme, ThemeRequest, ThemeResponse, TodoItem, UserStats,
};
use crate::state::AppState;
use crate::stats::{day_summary, TimeRange};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    #[serde(default)]
    pub range: TimeRange,
}

#[derive(Debug, Deserialize)]
pub struct GoalsQuery {
    pub date: Option<NaiveDate>,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let enabled = state.tracker.lock().await.sync().is_enabled();
    Json(HealthResponse {
        status: "OK".into(),
        message: "Goal Tracker is running".into(),
        remote_sync: if enabled { "Enabled" } else { "Disabled" }.into(),
        timestamp: Utc::now(),
    })
}

pub async fn get_theme(State(state): State<AppState>) -> Json<ThemeResponse> {
    let theme = state.tracker.lock().await.theme();
    Json(theme_response(theme))
}

pub async fn set_theme(
    State(state): State<AppState>,
    Json(payload): Json<ThemeRequest>,
) -> Result<Json<ThemeResponse>, AppError> {
    let theme = Theme::parse(payload.theme.trim())
        .ok_or_else(|| AppError::bad_request(format!("unknown theme '{}'", payload.theme)))?;
    state.tracker.lock().await.set_theme(theme)?;
    Ok(Json(theme_response(theme)))
}

/// All goals, or only those active on `?date=`.
pub async fn list_goals(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<GoalsQuery>,
) -> Json<Vec<Goal>> {
    let tracker = state.tracker.lock().await;
    let goals = match query.date {
        Some(date) => tracker.goals_for_date(&user_id, date),
        None => tracker.goals(&user_id),
    };
    Json(goals)
}

pub async fn create_goal(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(payload): Json<NewGoal>,
) -> Result<Json<Goal>, AppError> {
    let goal = state.tracker.lock().await.create_goal(&user_id, payload)?;
    Ok(Json(goal))
}

pub async fn update_goal(
    State(state): State<AppState>,
    Path((user_id, goal_id)): Path<(String, String)>,
    Json(mut goal): Json<Goal>,
) -> Result<Json<Goal>, AppError> {
    goal.id = goal_id;
    let goal = state.tracker.lock().await.update_goal(&user_id, goal)?;
    Ok(Json(goal))
}

pub async fn delete_goal(
    State(state): State<AppState>,
    Path((user_id, goal_id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    let deleted = state.tracker.lock().await.delete_goal(&user_id, &goal_id)?;
    Ok(Json(json!({ "success": true, "deleted": deleted })))
}

pub async fn log_session(
    State(state): State<AppState>,
    Path((user_id, goal_id)): Path<(String, String)>,
    Json(payload): Json<SessionRequest>,
) -> Result<Json<Goal>, AppError> {
    let goal = state
        .tracker
        .lock()
        .await
        .log_session(&user_id, &goal_id, payload)?;
    Ok(Json(goal))
}

pub async fn toggle_goal(
    State(state): State<AppState>,
    Path((user_id, goal_id)): Path<(String, String)>,
) -> Result<Json<Goal>, AppError> {
    let goal = state.tracker.lock().await.toggle_complete(&user_id, &goal_id)?;
    Ok(Json(goal))
}

pub async fn list_days(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<DayMap> {
    Json(state.tracker.lock().await.all_day_data(&user_id))
}

pub async fn get_day(
    State(state): State<AppState>,
    Path((user_id, date)): Path<(String, NaiveDate)>,
) -> Json<DayResponse> {
    let day = state.tracker.lock().await.day_data(&user_id, date);
    let summary = day_summary(&day);
    Json(DayResponse { day, summary })
}

pub async fn remote_goals(
    State(state): State<AppState>,
    Path((user_id, date)): Path<(String, NaiveDate)>,
) -> Json<Value> {
    let sync = state.tracker.lock().await.sync().clone();
    let goals = sync.goals_for_date(&user_id, date).await;
    Json(json!({ "goals": goals }))
}

/// Pulls remote day data without holding the tracker lock across the request.
pub async fn hydrate(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<HydrateResponse>, AppError> {
    let sync = state.tracker.lock().await.sync().clone();
    let pulled = sync.pull_user_data(&user_id).await;
    let days = state
        .tracker
        .lock()
        .await
        .apply_remote_days(&user_id, pulled)?;
    Ok(Json(HydrateResponse {
        hydrated: days > 0,
        days,
    }))
}

pub async fn get_stats(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<StatsQuery>,
) -> Json<StatsResponse> {
    Json(state.tracker.lock().await.stats(&user_id, today(), query.range))
}

pub async fn get_user_stats(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserStats>, AppError> {
    let (stats, _) = state.tracker.lock().await.user_stats(&user_id, Utc::now())?;
    Ok(Json(stats))
}

pub async fn check_in(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<CheckInResponse>, AppError> {
    let response = state.tracker.lock().await.check_in(&user_id, Utc::now())?;
    Ok(Json(response))
}

pub async fn list_todos(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<Vec<TodoItem>> {
    Json(state.tracker.lock().await.todos(&user_id))
}

pub async fn add_todo(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(payload): Json<NewTodo>,
) -> Result<Json<TodoItem>, AppError> {
    let todo = state.tracker.lock().await.add_todo(&user_id, payload)?;
    Ok(Json(todo))
}

pub async fn toggle_todo(
    State(state): State<AppState>,
    Path((user_id, todo_id)): Path<(String, String)>,
) -> Result<Json<TodoItem>, AppError> {
    let todo = state.tracker.lock().await.toggle_todo(&user_id, &todo_id)?;
    Ok(Json(todo))
}

pub async fn delete_todo(
    State(state): State<AppState>,
    Path((user_id, todo_id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    state.tracker.lock().await.delete_todo(&user_id, &todo_id)?;
    Ok(Json(json!({ "success": true })))
}

fn theme_response(theme: Theme) -> ThemeResponse {
    ThemeResponse {
        theme,
        name: theme.display_name().to_string(),
    }
}
