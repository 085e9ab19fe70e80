use crate::errors::StorageError;
use crate::kv::KeyValueStore;
use crate::models::{DayMap, Goal, Theme, TodoItem, UserStats};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

pub const THEME_KEY: &str = "mindful-goals-theme";

pub fn day_map_key(user_id: &str) -> String {
    format!("goal-tracker-{user_id}")
}

pub fn goals_key(user_id: &str) -> String {
    format!("goal-tracker-{user_id}-goals")
}

pub fn user_stats_key(user_id: &str) -> String {
    format!("userStats_{user_id}")
}

pub fn todos_key(user_id: &str) -> String {
    format!("todos_{user_id}")
}

fn load_json<T, S>(store: &S, key: &str) -> T
where
    T: DeserializeOwned + Default,
    S: KeyValueStore + ?Sized,
{
    match store.get(key) {
        Some(raw) => match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                error!("failed to parse stored {key}: {err}");
                T::default()
            }
        },
        None => T::default(),
    }
}

fn persist_json<T, S>(store: &mut S, key: &str, value: &T) -> Result<(), StorageError>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let payload = serde_json::to_string(value).map_err(|source| StorageError::Serialize {
        key: key.to_string(),
        source,
    })?;
    store.set(key, payload)?;
    debug!("saved {key}");
    Ok(())
}

pub fn load_day_map<S: KeyValueStore + ?Sized>(store: &S, user_id: &str) -> DayMap {
    load_json(store, &day_map_key(user_id))
}

pub fn save_day_map<S: KeyValueStore + ?Sized>(
    store: &mut S,
    days: &DayMap,
    user_id: &str,
) -> Result<(), StorageError> {
    persist_json(store, &day_map_key(user_id), days)
}

/// Reads the goal list, skipping individual records that no longer decode.
pub fn load_goals<S: KeyValueStore + ?Sized>(store: &S, user_id: &str) -> Vec<Goal> {
    let key = goals_key(user_id);
    let raw: Vec<serde_json::Value> = load_json(store, &key);
    raw.into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value::<Goal>(value) {
            Ok(goal) => Some(goal),
            Err(err) => {
                warn!("skipping malformed goal #{index} in {key}: {err}");
                None
            }
        })
        .collect()
}

pub fn save_goals<S: KeyValueStore + ?Sized>(
    store: &mut S,
    goals: &[Goal],
    user_id: &str,
) -> Result<(), StorageError> {
    persist_json(store, &goals_key(user_id), goals)
}

pub fn load_user_stats<S: KeyValueStore + ?Sized>(store: &S, user_id: &str) -> UserStats {
    load_json(store, &user_stats_key(user_id))
}

pub fn save_user_stats<S: KeyValueStore + ?Sized>(
    store: &mut S,
    stats: &UserStats,
    user_id: &str,
) -> Result<(), StorageError> {
    persist_json(store, &user_stats_key(user_id), stats)
}

pub fn load_todos<S: KeyValueStore + ?Sized>(store: &S, user_id: &str) -> Vec<TodoItem> {
    load_json(store, &todos_key(user_id))
}

pub fn save_todos<S: KeyValueStore + ?Sized>(
    store: &mut S,
    todos: &[TodoItem],
    user_id: &str,
) -> Result<(), StorageError> {
    persist_json(store, &todos_key(user_id), todos)
}

/// The theme is stored as its bare name, not JSON.
pub fn load_theme<S: KeyValueStore + ?Sized>(store: &S) -> Theme {
    match store.get(THEME_KEY) {
        Some(name) => Theme::parse(&name).unwrap_or_else(|| {
            warn!("unknown stored theme {name:?}, using default");
            Theme::default()
        }),
        None => Theme::default(),
    }
}

pub fn save_theme<S: KeyValueStore + ?Sized>(store: &mut S, theme: Theme) -> Result<(), StorageError> {
    store.set(THEME_KEY, theme.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStore;
    use crate::models::Category;
    use chrono::Utc;

    fn goal(id: &str) -> Goal {
        Goal {
            id: id.into(),
            title: "Read".into(),
            description: None,
            category: Category::Learning,
            target_hours: 1.0,
            logged_hours: 0.0,
            completed: false,
            start_date: "2024-01-10".parse().unwrap(),
            end_date: "2024-01-10".parse().unwrap(),
            is_multi_day: false,
            time_entries: Vec::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn keys_follow_storage_layout() {
        assert_eq!(day_map_key("u1"), "goal-tracker-u1");
        assert_eq!(goals_key("u1"), "goal-tracker-u1-goals");
        assert_eq!(user_stats_key("u1"), "userStats_u1");
        assert_eq!(todos_key("u1"), "todos_u1");
    }

    #[test]
    fn missing_keys_read_as_empty() {
        let store = MemoryStore::new();
        assert!(load_day_map(&store, "u1").is_empty());
        assert!(load_goals(&store, "u1").is_empty());
        assert!(load_todos(&store, "u1").is_empty());
        assert_eq!(load_user_stats(&store, "u1"), UserStats::default());
        assert_eq!(load_theme(&store), Theme::Zen);
    }

    #[test]
    fn corrupt_goal_list_reads_as_empty() {
        let mut store = MemoryStore::new();
        store.set(&goals_key("u1"), "[{\"id\": ".into()).unwrap();
        assert!(load_goals(&store, "u1").is_empty());

        store.set(&day_map_key("u1"), "not json".into()).unwrap();
        assert!(load_day_map(&store, "u1").is_empty());
    }

    #[test]
    fn malformed_goal_is_skipped_not_fatal() {
        let mut store = MemoryStore::new();
        let good = serde_json::to_value(goal("g1")).unwrap();
        let payload = serde_json::json!([good, { "id": "broken" }]).to_string();
        store.set(&goals_key("u1"), payload).unwrap();

        let goals = load_goals(&store, "u1");
        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0].id, "g1");
    }

    #[test]
    fn goal_list_is_scoped_per_user() {
        let mut store = MemoryStore::new();
        save_goals(&mut store, &[goal("g1")], "u1").unwrap();
        assert_eq!(load_goals(&store, "u1").len(), 1);
        assert!(load_goals(&store, "u2").is_empty());
    }

    #[test]
    fn unknown_theme_falls_back_to_default() {
        let mut store = MemoryStore::new();
        store.set(THEME_KEY, "neon".into()).unwrap();
        assert_eq!(load_theme(&store), Theme::Zen);

        save_theme(&mut store, Theme::Ocean).unwrap();
        assert_eq!(store.get(THEME_KEY).as_deref(), Some("ocean"));
        assert_eq!(load_theme(&store), Theme::Ocean);
    }

    #[test]
    fn quota_failure_propagates() {
        let mut store = MemoryStore::with_quota(16);
        let err = save_goals(&mut store, &[goal("g1")], "u1").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
    }
}
