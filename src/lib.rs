pub mod app;
pub mod config;
pub mod days;
pub mod errors;
pub mod handlers;
pub mod ids;
pub mod kv;
pub mod models;
pub mod repository;
pub mod state;
pub mod stats;
pub mod storage;
pub mod streaks;
pub mod sync;
pub mod todos;
pub mod tracker;

pub use app::router;
pub use config::Config;
pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use state::AppState;
pub use sync::{RemoteClient, SyncShim};
pub use tracker::GoalTracker;
