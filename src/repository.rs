use crate::errors::StorageError;
use crate::ids::generate_id;
use crate::kv::KeyValueStore;
use crate::models::Goal;
use crate::storage::{load_goals, save_goals};
use chrono::NaiveDate;
use tracing::{debug, warn};

/// Result of [`save_goal`]: the goal as persisted and the record it replaced.
#[derive(Debug, Clone)]
pub struct SavedGoal {
    pub goal: Goal,
    pub previous: Option<Goal>,
}

pub fn get_all_goals<S: KeyValueStore + ?Sized>(store: &S, user_id: &str) -> Vec<Goal> {
    load_goals(store, user_id)
}

pub fn find_goal<S: KeyValueStore + ?Sized>(store: &S, goal_id: &str, user_id: &str) -> Option<Goal> {
    load_goals(store, user_id)
        .into_iter()
        .find(|goal| goal.id == goal_id)
}

/// Upserts `goal` by id; the stored record moves to the end of the list.
///
/// An id that already belongs to a goal with a different `created_at` was
/// minted independently, so the incoming goal gets a fresh id instead of
/// overwriting the other one.
pub fn save_goal<S: KeyValueStore + ?Sized>(
    store: &mut S,
    mut goal: Goal,
    user_id: &str,
) -> Result<SavedGoal, StorageError> {
    goal.validate()?;

    let mut goals = load_goals(store, user_id);
    let collides = goals
        .iter()
        .any(|existing| existing.id == goal.id && existing.created_at != goal.created_at);
    if collides {
        let fresh = generate_id();
        warn!(old = %goal.id, new = %fresh, "goal id collision, regenerating id");
        goal.id = fresh;
    }

    let previous = goals
        .iter()
        .position(|existing| existing.id == goal.id)
        .map(|index| goals.remove(index));
    goals.push(goal.clone());

    save_goals(store, &goals, user_id)?;
    debug!(goal_id = %goal.id, total = goals.len(), updated = previous.is_some(), "saved goal");

    Ok(SavedGoal { goal, previous })
}

/// Removes the goal with `goal_id`, returning it. Unknown ids are a logged no-op.
pub fn delete_goal<S: KeyValueStore + ?Sized>(
    store: &mut S,
    goal_id: &str,
    user_id: &str,
) -> Result<Option<Goal>, StorageError> {
    let mut goals = load_goals(store, user_id);
    let Some(index) = goals.iter().position(|goal| goal.id == goal_id) else {
        warn!(goal_id, "goal not found for deletion");
        return Ok(None);
    };

    let removed = goals.remove(index);
    save_goals(store, &goals, user_id)?;
    debug!(goal_id, remaining = goals.len(), "deleted goal");
    Ok(Some(removed))
}

pub fn get_goals_for_date<S: KeyValueStore + ?Sized>(
    store: &S,
    date: NaiveDate,
    user_id: &str,
) -> Vec<Goal> {
    goals_active_on(&load_goals(store, user_id), date)
}

pub fn goals_active_on(goals: &[Goal], date: NaiveDate) -> Vec<Goal> {
    goals.iter().filter(|goal| goal.covers(date)).cloned().collect()
}
