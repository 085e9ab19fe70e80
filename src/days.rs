//! Per-date aggregates derived from the goal list.
//!
//! `DayData` is a materialized view: it is rebuilt from the goals whenever a
//! goal covering that date changes and is never edited on its own.

use crate::errors::StorageError;
use crate::kv::KeyValueStore;
use crate::models::{DayData, Goal};
use crate::repository::{get_goals_for_date, goals_active_on};
use crate::storage::{load_day_map, load_goals, save_day_map};
use chrono::{Duration, NaiveDate, Utc};
use tracing::debug;

/// Calendar day keys are UTC dates.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Every calendar day from `start` to `end`, inclusive. Empty if `end < start`.
pub fn date_range(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    let days = (end - start).num_days().max(-1) + 1;
    (0..days).map(move |offset| start + Duration::days(offset))
}

pub fn derive_day(date: NaiveDate, active: Vec<Goal>) -> DayData {
    let total_logged_hours = active.iter().map(|goal| goal.logged_hours_on(date)).sum();
    let completed_goals = active.iter().filter(|goal| goal.completed).count();
    DayData {
        date,
        goals: active,
        total_logged_hours,
        completed_goals,
        checked_in: None,
    }
}

/// Rebuilds and persists the aggregate for every day in `[start, end]`.
///
/// Days with no active goals and no cached entry are left absent. Returns the
/// aggregates that were written.
pub fn recompute_range<S: KeyValueStore + ?Sized>(
    store: &mut S,
    user_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<DayData>, StorageError> {
    let goals = load_goals(store, user_id);
    let mut days = load_day_map(store, user_id);
    let mut touched = Vec::new();

    for date in date_range(start, end) {
        let key = date_key(date);
        let active = goals_active_on(&goals, date);
        let existing = days.get(&key);
        if active.is_empty() && existing.is_none() {
            continue;
        }

        let mut day = derive_day(date, active);
        day.checked_in = existing.and_then(|cached| cached.checked_in);
        days.insert(key, day.clone());
        touched.push(day);
    }

    save_day_map(store, &days, user_id)?;
    debug!(user_id, %start, %end, days = touched.len(), "recomputed day aggregates");
    Ok(touched)
}

/// Cached aggregate if present, otherwise derived on the fly without writing.
pub fn get_day_data<S: KeyValueStore + ?Sized>(store: &S, date: NaiveDate, user_id: &str) -> DayData {
    load_day_map(store, user_id)
        .remove(&date_key(date))
        .unwrap_or_else(|| derive_day(date, get_goals_for_date(store, date, user_id)))
}
