use crate::errors::StorageError;
use crate::ids::generate_id;
use crate::kv::KeyValueStore;
use crate::models::{NewTodo, TodoItem};
use crate::storage::{load_todos, save_todos};
use chrono::Utc;

pub fn list<S: KeyValueStore + ?Sized>(store: &S, user_id: &str) -> Vec<TodoItem> {
    load_todos(store, user_id)
}

pub fn add<S: KeyValueStore + ?Sized>(
    store: &mut S,
    todo: NewTodo,
    user_id: &str,
) -> Result<TodoItem, StorageError> {
    let text = todo.text.trim();
    if text.is_empty() {
        return Err(StorageError::InvalidTodo("text must not be empty".into()));
    }

    let item = TodoItem {
        id: generate_id(),
        text: text.to_string(),
        completed: false,
        created_at: Utc::now(),
        priority: todo.priority,
    };
    let mut todos = load_todos(store, user_id);
    todos.push(item.clone());
    save_todos(store, &todos, user_id)?;
    Ok(item)
}

pub fn toggle<S: KeyValueStore + ?Sized>(
    store: &mut S,
    todo_id: &str,
    user_id: &str,
) -> Result<TodoItem, StorageError> {
    let mut todos = load_todos(store, user_id);
    let item = todos
        .iter_mut()
        .find(|item| item.id == todo_id)
        .ok_or_else(|| StorageError::TodoNotFound(todo_id.to_string()))?;
    item.completed = !item.completed;
    let toggled = item.clone();
    save_todos(store, &todos, user_id)?;
    Ok(toggled)
}

pub fn delete<S: KeyValueStore + ?Sized>(
    store: &mut S,
    todo_id: &str,
    user_id: &str,
) -> Result<(), StorageError> {
    let mut todos = load_todos(store, user_id);
    let before = todos.len();
    todos.retain(|item| item.id != todo_id);
    if todos.len() == before {
        return Err(StorageError::TodoNotFound(todo_id.to_string()));
    }
    save_todos(store, &todos, user_id)
}
