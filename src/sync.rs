//! Best-effort mirroring of local writes to the remote goal API.
//!
//! Local storage is the source of truth for the session. Remote calls run as
//! detached tasks whose outcome is only logged.

use crate::days::date_key;
use crate::errors::SyncError;
use crate::models::{DayData, DayMap, Goal};
use chrono::NaiveDate;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::{debug, info, warn};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GoalPayload<'a> {
    #[serde(flatten)]
    goal: &'a Goal,
    user_id: &'a str,
    date: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DayDataPayload<'a> {
    #[serde(flatten)]
    day: &'a DayData,
    user_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserPayload<'a> {
    user_id: &'a str,
}

#[derive(Deserialize)]
struct GoalsResponse {
    #[serde(default)]
    goals: Vec<Goal>,
}

#[derive(Deserialize)]
struct UserDataResponse {
    #[serde(default)]
    data: DayMap,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteHealth {
    pub status: String,
    #[serde(default)]
    pub mongodb: String,
    #[serde(default)]
    pub timestamp: String,
}

/// JSON client for the remote goal API.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    client: reqwest::Client,
    base_url: Url,
}

impl RemoteClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, SyncError> {
        let raw = base_url.into();
        let base_url = Url::parse(raw.trim()).map_err(|err| SyncError::InvalidUrl(format!("{raw}: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(SyncError::InvalidUrl(raw));
        }
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// `{base}/api/{segments...}`, each segment percent-encoded on its own.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("api").extend(segments);
        }
        url
    }

    /// Upsert by `(id, userId)`.
    pub async fn save_goal(&self, goal: &Goal, user_id: &str, date: NaiveDate) -> Result<(), SyncError> {
        let payload = GoalPayload {
            goal,
            user_id,
            date: date_key(date),
        };
        let response = self.client.post(self.url(&["goals"])).json(&payload).send().await?;
        check(response)?;
        Ok(())
    }

    pub async fn goals_for_date(&self, user_id: &str, date: NaiveDate) -> Result<Vec<Goal>, SyncError> {
        let url = self.url(&["goals", user_id, date_key(date).as_str()]);
        let response = check(self.client.get(url).send().await?)?;
        let body: GoalsResponse = response.json().await?;
        Ok(body.goals)
    }

    pub async fn update_goal(&self, goal: &Goal, user_id: &str, date: NaiveDate) -> Result<(), SyncError> {
        let payload = GoalPayload {
            goal,
            user_id,
            date: date_key(date),
        };
        let url = self.url(&["goals", goal.id.as_str()]);
        check(self.client.put(url).json(&payload).send().await?)?;
        Ok(())
    }

    pub async fn delete_goal(&self, goal_id: &str, user_id: &str) -> Result<(), SyncError> {
        let url = self.url(&["goals", goal_id]);
        check(
            self.client
                .delete(url)
                .json(&UserPayload { user_id })
                .send()
                .await?,
        )?;
        Ok(())
    }

    pub async fn user_data(&self, user_id: &str) -> Result<DayMap, SyncError> {
        let url = self.url(&["user-data", user_id]);
        let response = check(self.client.get(url).send().await?)?;
        let body: UserDataResponse = response.json().await?;
        Ok(body.data)
    }

    /// Upsert by `(date, userId)`.
    pub async fn save_day_data(&self, day: &DayData, user_id: &str) -> Result<(), SyncError> {
        let payload = DayDataPayload { day, user_id };
        check(self.client.post(self.url(&["day-data"])).json(&payload).send().await?)?;
        Ok(())
    }

    pub async fn health(&self) -> Result<RemoteHealth, SyncError> {
        let response = check(self.client.get(self.url(&["health"])).send().await?)?;
        Ok(response.json().await?)
    }
}

fn check(response: reqwest::Response) -> Result<reqwest::Response, SyncError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(SyncError::Status { status })
    }
}

/// Wraps an optional [`RemoteClient`]; without one every mirror is a no-op.
#[derive(Debug, Clone, Default)]
pub struct SyncShim {
    remote: Option<RemoteClient>,
}

impl SyncShim {
    pub fn disabled() -> Self {
        Self { remote: None }
    }

    pub fn new(remote: RemoteClient) -> Self {
        Self {
            remote: Some(remote),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.remote.is_some()
    }

    fn detach<F>(&self, what: String, task: F)
    where
        F: Future<Output = Result<(), SyncError>> + Send + 'static,
    {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("{what}: no async runtime, skipping remote sync");
            return;
        };
        handle.spawn(async move {
            match task.await {
                Ok(()) => debug!("{what}: synced"),
                Err(err) => warn!("{what}: remote sync failed: {err}"),
            }
        });
    }

    pub fn goal_saved(&self, goal: &Goal, user_id: &str, today: NaiveDate, is_update: bool) {
        let Some(remote) = self.remote.clone() else {
            return;
        };
        let goal = goal.clone();
        let user_id = user_id.to_string();
        self.detach(format!("goal {}", goal.id), async move {
            if is_update {
                remote.update_goal(&goal, &user_id, today).await
            } else {
                remote.save_goal(&goal, &user_id, today).await
            }
        });
    }

    pub fn goal_deleted(&self, goal_id: &str, user_id: &str) {
        let Some(remote) = self.remote.clone() else {
            return;
        };
        let goal_id = goal_id.to_string();
        let user_id = user_id.to_string();
        self.detach(format!("delete goal {goal_id}"), async move {
            remote.delete_goal(&goal_id, &user_id).await
        });
    }

    pub fn days_saved(&self, days: &[DayData], user_id: &str) {
        let Some(remote) = &self.remote else {
            return;
        };
        for day in days {
            let remote = remote.clone();
            let day = day.clone();
            let user_id = user_id.to_string();
            self.detach(format!("day {}", day.date), async move {
                remote.save_day_data(&day, &user_id).await
            });
        }
    }

    /// Bulk pull. `None` when disabled, failed, or the remote has nothing.
    pub async fn pull_user_data(&self, user_id: &str) -> Option<DayMap> {
        let remote = self.remote.as_ref()?;
        match remote.user_data(user_id).await {
            Ok(data) if data.is_empty() => {
                info!(user_id, "no remote data, keeping local storage");
                None
            }
            Ok(data) => Some(data),
            Err(err) => {
                warn!(user_id, "failed to load remote user data: {err}");
                None
            }
        }
    }

    /// Remote read that degrades to an empty list.
    pub async fn goals_for_date(&self, user_id: &str, date: NaiveDate) -> Vec<Goal> {
        let Some(remote) = &self.remote else {
            return Vec::new();
        };
        remote.goals_for_date(user_id, date).await.unwrap_or_else(|err| {
            warn!(user_id, %date, "failed to load remote goals: {err}");
            Vec::new()
        })
    }

    /// Logs whether the remote API answers its health check.
    pub fn probe(&self) {
        let Some(remote) = self.remote.clone() else {
            return;
        };
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        handle.spawn(async move {
            match remote.health().await {
                Ok(health) => info!(
                    url = remote.base_url(),
                    status = %health.status,
                    mongodb = %health.mongodb,
                    "remote api reachable"
                ),
                Err(err) => warn!(url = remote.base_url(), "remote api health check failed: {err}"),
            }
        });
    }
}
