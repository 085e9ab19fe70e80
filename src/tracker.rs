//! User-facing operations over goals, day aggregates and side records.
//!
//! Every goal mutation follows the same path: repository write, recompute of
//! the affected date range, then a best-effort remote mirror. Local failures
//! are returned; remote failures never are.

use crate::days::{self, get_day_data, recompute_range};
use crate::errors::StorageError;
use crate::ids::generate_id;
use crate::kv::KeyValueStore;
use crate::models::{
    Achievement, CheckInResponse, DayData, DayMap, Goal, NewGoal, NewTodo, SessionRequest,
    StatsResponse, Theme, TimeEntry, TodoItem, UserStats,
};
use crate::repository::{self, SavedGoal};
use crate::stats::{self, TimeRange};
use crate::storage;
use crate::streaks;
use crate::sync::SyncShim;
use crate::todos;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, error, info, warn};

pub struct GoalTracker {
    store: Box<dyn KeyValueStore>,
    sync: SyncShim,
}

impl GoalTracker {
    pub fn new(store: Box<dyn KeyValueStore>, sync: SyncShim) -> Self {
        Self { store, sync }
    }

    pub fn sync(&self) -> &SyncShim {
        &self.sync
    }

    pub fn goals(&self, user_id: &str) -> Vec<Goal> {
        repository::get_all_goals(&*self.store, user_id)
    }

    pub fn goals_for_date(&self, user_id: &str, date: NaiveDate) -> Vec<Goal> {
        repository::get_goals_for_date(&*self.store, date, user_id)
    }

    pub fn create_goal(&mut self, user_id: &str, new_goal: NewGoal) -> Result<Goal, StorageError> {
        let goal = new_goal.into_goal(generate_id(), Utc::now());
        let saved = self.persist_goal(user_id, goal)?;
        info!(user_id, goal_id = %saved.id, title = %saved.title, "created goal");
        Ok(saved)
    }

    /// Whole-object replace of an existing goal. `createdAt` stays as stored.
    pub fn update_goal(&mut self, user_id: &str, mut goal: Goal) -> Result<Goal, StorageError> {
        let existing = self.require_goal(user_id, &goal.id)?;
        goal.created_at = existing.created_at;
        self.persist_goal(user_id, goal)
    }

    pub fn delete_goal(&mut self, user_id: &str, goal_id: &str) -> Result<bool, StorageError> {
        let snapshot = self.store.get(&storage::goals_key(user_id));
        let Some(removed) = repository::delete_goal(&mut *self.store, goal_id, user_id)? else {
            return Ok(false);
        };
        let touched = self.recompute_or_restore(user_id, snapshot, removed.start_date, removed.end_date)?;

        self.sync.goal_deleted(goal_id, user_id);
        self.sync.days_saved(&touched, user_id);
        info!(user_id, goal_id, "deleted goal");
        Ok(true)
    }

    /// Appends a finished focus session and bumps the goal's logged hours.
    pub fn log_session(
        &mut self,
        user_id: &str,
        goal_id: &str,
        session: SessionRequest,
    ) -> Result<Goal, StorageError> {
        if session.end_time < session.start_time {
            return Err(StorageError::InvalidSession(
                "endTime is before startTime".into(),
            ));
        }
        let mut goal = self.require_goal(user_id, goal_id)?;

        let millis = (session.end_time - session.start_time).num_milliseconds();
        let duration = (millis as f64 / 60_000.0).round() as i64;
        goal.time_entries.push(TimeEntry {
            id: generate_id(),
            date: session.date,
            start_time: session.start_time,
            end_time: Some(session.end_time),
            duration,
            note: session.note.filter(|note| !note.trim().is_empty()),
        });
        goal.logged_hours += duration as f64 / 60.0;

        debug!(user_id, goal_id, duration, "logged session");
        self.persist_goal(user_id, goal)
    }

    pub fn toggle_complete(&mut self, user_id: &str, goal_id: &str) -> Result<Goal, StorageError> {
        let mut goal = self.require_goal(user_id, goal_id)?;
        goal.completed = !goal.completed;
        self.persist_goal(user_id, goal)
    }

    pub fn day_data(&self, user_id: &str, date: NaiveDate) -> DayData {
        get_day_data(&*self.store, date, user_id)
    }

    pub fn all_day_data(&self, user_id: &str) -> DayMap {
        storage::load_day_map(&*self.store, user_id)
    }

    pub fn stats(&self, user_id: &str, today: NaiveDate, range: TimeRange) -> StatsResponse {
        stats::build_stats_at(today, &self.all_day_data(user_id), range)
    }

    /// Replaces the local day map with pulled remote data. `None` leaves
    /// local storage untouched. Returns the number of days written.
    ///
    /// Only the day map is replaced; the goal list stays local, so the next
    /// goal write recomputes its range from local goals over the pulled days.
    pub fn apply_remote_days(&mut self, user_id: &str, pulled: Option<DayMap>) -> Result<usize, StorageError> {
        let Some(days) = pulled else {
            return Ok(0);
        };
        storage::save_day_map(&mut *self.store, &days, user_id)?;
        info!(user_id, days = days.len(), "hydrated day data from remote");
        Ok(days.len())
    }

    /// Streak stats with totals refreshed and achievements evaluated.
    pub fn user_stats(&mut self, user_id: &str, now: DateTime<Utc>) -> Result<(UserStats, Vec<Achievement>), StorageError> {
        let mut stats = storage::load_user_stats(&*self.store, user_id);
        let before = stats.clone();
        streaks::refresh_totals(&mut stats, &self.goals(user_id));
        let unlocked = streaks::evaluate_achievements(&mut stats, now);
        if stats != before {
            storage::save_user_stats(&mut *self.store, &stats, user_id)?;
        }
        Ok((stats, unlocked))
    }

    pub fn check_in(&mut self, user_id: &str, now: DateTime<Utc>) -> Result<CheckInResponse, StorageError> {
        let mut stats = storage::load_user_stats(&*self.store, user_id);
        if !streaks::check_in(&mut stats, now) {
            return Ok(CheckInResponse {
                checked_in: false,
                stats,
                unlocked: Vec::new(),
            });
        }

        storage::save_user_stats(&mut *self.store, &stats, user_id)?;
        self.mark_checked_in(user_id, now.date_naive())?;
        info!(user_id, streak = stats.current_streak, "checked in");

        let (stats, unlocked) = self.user_stats(user_id, now)?;
        Ok(CheckInResponse {
            checked_in: true,
            stats,
            unlocked,
        })
    }

    pub fn todos(&self, user_id: &str) -> Vec<TodoItem> {
        todos::list(&*self.store, user_id)
    }

    pub fn add_todo(&mut self, user_id: &str, todo: NewTodo) -> Result<TodoItem, StorageError> {
        todos::add(&mut *self.store, todo, user_id)
    }

    pub fn toggle_todo(&mut self, user_id: &str, todo_id: &str) -> Result<TodoItem, StorageError> {
        todos::toggle(&mut *self.store, todo_id, user_id)
    }

    pub fn delete_todo(&mut self, user_id: &str, todo_id: &str) -> Result<(), StorageError> {
        todos::delete(&mut *self.store, todo_id, user_id)
    }

    pub fn theme(&self) -> Theme {
        storage::load_theme(&*self.store)
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<(), StorageError> {
        storage::save_theme(&mut *self.store, theme)
    }

    fn require_goal(&self, user_id: &str, goal_id: &str) -> Result<Goal, StorageError> {
        repository::find_goal(&*self.store, goal_id, user_id)
            .ok_or_else(|| StorageError::GoalNotFound(goal_id.to_string()))
    }

    /// Saves `goal`, recomputes every day it covers now or covered before,
    /// and mirrors the result.
    fn persist_goal(&mut self, user_id: &str, goal: Goal) -> Result<Goal, StorageError> {
        let snapshot = self.store.get(&storage::goals_key(user_id));
        let SavedGoal { goal, previous } = repository::save_goal(&mut *self.store, goal, user_id)?;

        let (start, end) = match &previous {
            Some(old) => (
                old.start_date.min(goal.start_date),
                old.end_date.max(goal.end_date),
            ),
            None => (goal.start_date, goal.end_date),
        };
        let touched = self.recompute_or_restore(user_id, snapshot, start, end)?;

        self.sync.goal_saved(&goal, user_id, days::today(), previous.is_some());
        self.sync.days_saved(&touched, user_id);
        Ok(goal)
    }

    /// Recomputes `[start, end]`. If the day map cannot be written, the goal
    /// list goes back to `snapshot` so goals and days never disagree.
    fn recompute_or_restore(
        &mut self,
        user_id: &str,
        snapshot: Option<String>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DayData>, StorageError> {
        match recompute_range(&mut *self.store, user_id, start, end) {
            Ok(touched) => Ok(touched),
            Err(err) => {
                let key = storage::goals_key(user_id);
                let restored = match snapshot {
                    Some(raw) => self.store.set(&key, raw),
                    None => self.store.remove(&key),
                };
                if let Err(restore_err) = restored {
                    error!(user_id, "failed to restore goal list: {restore_err}");
                }
                warn!(user_id, "day aggregates not saved, goal write rolled back: {err}");
                Err(err)
            }
        }
    }

    fn mark_checked_in(&mut self, user_id: &str, date: NaiveDate) -> Result<(), StorageError> {
        let mut days = storage::load_day_map(&*self.store, user_id);
        let Some(day) = days.get_mut(&days::date_key(date)) else {
            return Ok(());
        };
        day.checked_in = Some(true);
        let day = day.clone();
        storage::save_day_map(&mut *self.store, &days, user_id)?;
        self.sync.days_saved(&[day], user_id);
        Ok(())
    }
}
